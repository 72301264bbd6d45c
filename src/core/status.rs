use chrono::NaiveTime;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Format a playback position as `HH:MM:SS.mmm`.
///
/// Negative positions (nothing loaded) show as zero. The display wraps every
/// 24 hours like a time-of-day clock.
pub fn format_clock(ms: i64) -> String {
    let ms = ms.max(0);
    let secs = (ms / 1000).rem_euclid(SECONDS_PER_DAY) as u32;
    let nanos = (ms % 1000) as u32 * 1_000_000;

    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .map(|time| time.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "00:00:00.000".to_string())
}
