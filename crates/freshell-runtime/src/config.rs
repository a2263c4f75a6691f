//! Environment-variable configuration (§6). No config file, no `Config` struct: each knob is
//! read where it's needed, with a documented default.

use std::time::Duration;

/// Ring buffer capacity, `FRESHELL_MAX_SESSION_EVENTS` (default 1000).
pub fn max_session_events() -> usize {
    std::env::var("FRESHELL_MAX_SESSION_EVENTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1000)
}

/// How long a terminated session survives before the retention sweep evicts it,
/// `FRESHELL_COMPLETED_SESSION_RETENTION_MS` (default 1 800 000 ms / 30 minutes).
pub fn completed_session_retention() -> Duration {
    let ms = std::env::var("FRESHELL_COMPLETED_SESSION_RETENTION_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1_800_000);
    Duration::from_millis(ms)
}

/// The manager's retention sweep cadence (§4.7). Fixed, not env-overridable.
pub fn cleanup_interval() -> Duration {
    Duration::from_secs(5 * 60)
}
