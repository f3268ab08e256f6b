//! Utility helpers for UUID generation and timestamp formatting.

use chrono::Utc;
use uuid::Uuid;

/// Generates a random v4 UUID.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Returns the current UTC time as an ISO 8601 formatted string:
/// `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Returns the current UTC time as a short `HH:MM:SS` clock string, used
/// for human-facing log lines.
#[must_use]
pub fn clock_timestamp() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
