//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Acknowledgement returned by the ingestion endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResponse {
    /// Number of records received
    pub count: usize,
    pub message: String,
}

impl SyncResponse {
    pub fn new(count: usize, message: impl Into<String>) -> Self {
        Self {
            count,
            message: message.into(),
        }
    }
}

/// Default trailing window of the sales history, in days
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Longest accepted sales history window, in days
pub const MAX_HISTORY_DAYS: i64 = 36_500;

/// Parse a `days` query value from its leading integer (`"7.5"` reads as 7).
///
/// Falls back to the default window when no integer leads the value, or when
/// it is not positive or longer than [`MAX_HISTORY_DAYS`].
pub fn parse_history_days(raw: Option<&str>) -> i64 {
    raw.and_then(leading_integer)
        .filter(|d| (1..=MAX_HISTORY_DAYS).contains(d))
        .unwrap_or(DEFAULT_HISTORY_DAYS)
}

fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}
