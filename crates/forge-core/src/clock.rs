//! UTC wall-clock helpers used to stamp documents and mint commit identifiers.

use chrono::{DateTime, Utc};

/// The current UTC instant, formatted ISO-8601 (e.g. `2025-01-02T03:04:05Z`).
#[must_use]
pub fn now_iso8601() -> String {
    format_iso8601(Utc::now())
}

/// Format a UTC instant as ISO-8601 with a trailing `Z`, second precision.
#[must_use]
pub fn format_iso8601(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// The current UTC instant, formatted as a commit identifier
/// (`YYYY-MM-DD_HH-MM-SS`), second precision, as used by [`crate::commit_id`].
#[must_use]
pub fn now_commit_stamp() -> String {
    format_commit_stamp(Utc::now())
}

/// Format a UTC instant as a commit identifier stamp.
#[must_use]
pub fn format_commit_stamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d_%H-%M-%S").to_string()
}

#[cfg(test)]
#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_iso8601_with_trailing_z() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_iso8601(instant), "2025-01-02T03:04:05Z");
    }

    #[test]
    fn formats_commit_stamp() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_commit_stamp(instant), "2025-01-02_03-04-05");
    }
}
