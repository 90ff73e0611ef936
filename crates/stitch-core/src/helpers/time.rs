// crates/stitch-core/src/helpers/time.rs
//
// Human-readable timestamps for the player overlay and log lines.

use crate::timeline::MICROS_PER_SEC;

/// Format a timeline position as `M:SS` or `H:MM:SS`.
///
/// ```
/// use stitch_core::helpers::time::format_timecode;
/// assert_eq!(format_timecode(0),                "0:00");
/// assert_eq!(format_timecode(61_500_000),       "1:01");
/// assert_eq!(format_timecode(3_875_000_000),    "1:04:35");
/// ```
pub fn format_timecode(t_us: i64) -> String {
    let total = (t_us.max(0) / MICROS_PER_SEC) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Seconds with one decimal, for log lines: `8.0s`.
pub fn format_secs(t_us: i64) -> String {
    format!("{:.1}s", t_us as f64 / MICROS_PER_SEC as f64)
}
