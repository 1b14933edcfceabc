//! Monotonic-enough wall clock helpers. The scanner's logical timestamps and the
//! store's revision timestamps both key off `now_ms`; tests inject explicit
//! values instead of calling this so behavior stays deterministic.

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Buckets a timestamp to the nearest `bucket_ms` boundary, used by the
/// opportunity stable-id (1-second bucketing per the data model).
pub fn bucket_ms(ts_ms: u64, bucket_ms: u64) -> u64 {
    if bucket_ms == 0 {
        return ts_ms;
    }
    (ts_ms / bucket_ms) * bucket_ms
}
