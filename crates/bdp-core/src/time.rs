//! Tick arithmetic. Blu-ray timestamps count a 90 kHz clock.

/// Ticks per second of the disc clock.
pub const TICKS_PER_SECOND: u64 = 90_000;

/// Convert whole seconds to ticks.
pub fn secs_to_ticks(secs: u32) -> u64 {
    u64::from(secs) * TICKS_PER_SECOND
}

/// Format ticks as `HH:MM:SS.mmm`.
pub fn ticks_to_timestamp(ticks: u64) -> String {
    let secs = ticks / TICKS_PER_SECOND;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        (ticks / 90) % 1000
    )
}
