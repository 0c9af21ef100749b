//! Time-related utilities with clock abstraction for testability.
//!
//! Wire timestamps are local wall-clock strings (`2024-05-01 12:30:00`); session
//! bookkeeping uses Unix milliseconds.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Format used for every `timestamp` field on the wire
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;

    /// Get the current time as a wire timestamp string
    fn now_wire(&self) -> String {
        millis_to_wire_timestamp(self.now_millis())
    }
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        get_unix_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn get_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current local time as a wire timestamp
pub fn wire_timestamp() -> String {
    Local::now().format(WIRE_TIMESTAMP_FORMAT).to_string()
}

/// Convert Unix milliseconds to a local wire timestamp.
///
/// Out-of-range values fall back to the Unix epoch rather than failing.
pub fn millis_to_wire_timestamp(timestamp_millis: i64) -> String {
    let dt: DateTime<Local> = Local
        .timestamp_millis_opt(timestamp_millis)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Local));
    dt.format(WIRE_TIMESTAMP_FORMAT).to_string()
}
