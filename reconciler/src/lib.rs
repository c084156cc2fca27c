pub mod events;
pub mod reconciler;
pub mod store;

pub use events::TransactionNotification;
pub use reconciler::EventReconciler;
pub use store::RecordStore;
