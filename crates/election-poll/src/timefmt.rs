//! Timestamp rendering for reports and notification emails.
//!
//! Everything is stored in UTC and shifted into a single fixed display offset
//! at the edge, so exports generated on different hosts read the same.

use chrono::{DateTime, FixedOffset, Utc};

/// `3/14/2025, 9:05:00 AM`
pub fn short_datetime(ts: DateTime<Utc>, zone: FixedOffset) -> String {
    ts.with_timezone(&zone)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// `March 14, 2025 at 09:05 AM`
pub fn long_datetime(ts: DateTime<Utc>, zone: FixedOffset) -> String {
    ts.with_timezone(&zone)
        .format("%B %-d, %Y at %I:%M %p")
        .to_string()
}

/// `Fri, Mar 14, 9:05 AM`
pub fn schedule_datetime(ts: DateTime<Utc>, zone: FixedOffset) -> String {
    ts.with_timezone(&zone)
        .format("%a, %b %-d, %-I:%M %p")
        .to_string()
}

/// Parse `+01:00`, `-0530`, `Z` or `UTC` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    trimmed.parse().ok()
}
