//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Format used in snapshot file names (`20240131_235959`)
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Local wall-clock stamp for file names
pub fn file_stamp_now() -> String {
    file_stamp(&Local::now())
}

/// Render a timestamp as a file-name-safe stamp
pub fn file_stamp<Tz: chrono::TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(FILE_STAMP_FORMAT).to_string()
}
