use chrono::{DateTime, Utc};

use crate::ticket::TicketPriority;

/// Gap between priority bands. Larger than any unix timestamp in seconds
/// until the year 5138, and `2 * PRIORITY_STRIDE + ts` stays below 2^53 so
/// the score is exact as an `f64` (Redis sorted-set scores are doubles).
pub const PRIORITY_STRIDE: i64 = 100_000_000_000;

/// Sort key: lower is served first.
///
/// High beats Medium beats Low; within a band, older uploads come first.
pub fn score(priority: TicketPriority, date_uploaded: DateTime<Utc>) -> i64 {
    let seconds = date_uploaded.timestamp().clamp(0, PRIORITY_STRIDE - 1);
    priority.rank() * PRIORITY_STRIDE + seconds
}
