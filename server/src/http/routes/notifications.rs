// Status-Change Notification Stream

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio::sync::broadcast;

use crate::http::{error::ApiError, server::EngineServerState};

#[utoipa::path(
    get,
    operation_id = "notificationStream",
    path = "/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Server-sent-events stream of transaction status-change notifications"),
        (status = 409, description = "No active watch session"),
    )
)]
/// Stream Status-Change Notifications
///
/// One `transaction` event per lifecycle transition, in the shape toast
/// widgets render directly. The stream ends when the watch session is
/// replaced or torn down.
pub async fn notification_stream(
    State(state): State<EngineServerState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = state.watch_manager.active().ok_or(ApiError::NoActiveWatch)?;
    let receiver = session.reconciler.notifications();

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    let event = Event::default()
                        .event("transaction")
                        .json_data(&notification)
                        .ok()?;
                    return Some((Ok(event), receiver));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification subscriber lagged, continuing");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
