/// Asset symbol attached to a record before transfer metadata resolves.
/// Pending feeds deliver raw wei amounts, so that is what the value is
/// tagged as until the resolver reports the real asset.
pub const UNRESOLVED_ASSET: &str = "WEI";

/// Upper bound on a single metadata lookup before it is treated as failed.
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 10_000;

/// Buffered status notifications per subscriber before lagging ones drop.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;
