use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Current wall-clock time in milliseconds since the Unix epoch
pub fn timestamp_ms() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    millis.min(u64::MAX as u128) as u64
}
