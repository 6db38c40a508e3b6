//! Record timestamps: RFC 3339 UTC strings at microsecond precision (the resolution of `timestamptz`).

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

pub fn format(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse(v: &Value) -> Option<DateTime<Utc>> {
    v.as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Current time truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// `now`, or one microsecond past `previous` when the clock has not moved beyond it.
pub fn after(previous: Option<&Value>) -> DateTime<Utc> {
    let now = now();
    match previous.and_then(parse) {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}
