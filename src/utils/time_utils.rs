use chrono::{TimeZone, Utc};

// Everything is stored as UTC Unix timestamps in seconds,
// JSON output uses RFC 3339.

pub fn current_timestamp() -> i64 {
  Utc::now().timestamp()
}

pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
  match Utc.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.to_rfc3339(),
    // Out of range for chrono, should never happen with
    // values we wrote ourselves.
    None => timestamp.to_string()
  }
}

pub fn option_timestamp_to_rfc3339(timestamp: Option<i64>) -> Option<String> {
  timestamp.map(timestamp_to_rfc3339)
}
