//! One repository per record type, implemented as associated functions over a redb transaction.

pub mod address;
pub mod block;
pub mod network_stat;
pub mod token;
pub mod token_transfer;
pub mod transaction;

/// Upper bound of items returned by time-window series regardless of the window width.
pub const WINDOW_CEILING: usize = 1000;

const HOUR_MS: u64 = 60 * 60 * 1000;

/// Start of a window of `hours` ending at `now_ms`.
pub fn cutoff(now_ms: u64, hours: u64) -> u64 {
    now_ms.saturating_sub(hours.saturating_mul(HOUR_MS))
}

pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
