//! Human-readable duration formatting
//!
//! Consistent duration display for tracks and queues across Hertz surfaces.

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;

/// Placeholder shown for tracks whose length the resolver could not report
pub const UNKNOWN_DURATION: &str = "N/A";

/// Format a single track length as `m:ss`.
///
/// Minutes are not wrapped into hours, so long mixes read `75:02`.
/// A zero length means "unknown" and renders as [`UNKNOWN_DURATION`].
///
/// # Examples
///
/// ```
/// use hertz_common::human_time::format_track_duration;
///
/// assert_eq!(format_track_duration(5), "0:05");
/// assert_eq!(format_track_duration(225), "3:45");
/// assert_eq!(format_track_duration(4502), "75:02");
/// assert_eq!(format_track_duration(0), "N/A");
/// ```
pub fn format_track_duration(seconds: u64) -> String {
    if seconds == 0 {
        return UNKNOWN_DURATION.to_string();
    }
    let minutes = seconds / SECS_PER_MINUTE;
    let secs = seconds % SECS_PER_MINUTE;
    format!("{}:{:02}", minutes, secs)
}

/// Format the summed length of a queue as `[Hh ]Mm Ss`.
///
/// The hour component is omitted below one hour.
///
/// # Examples
///
/// ```
/// use hertz_common::human_time::format_total_duration;
///
/// assert_eq!(format_total_duration(0), "0m 0s");
/// assert_eq!(format_total_duration(754), "12m 34s");
/// assert_eq!(format_total_duration(3723), "1h 2m 3s");
/// ```
pub fn format_total_duration(seconds: u64) -> String {
    let hours = seconds / SECS_PER_HOUR;
    let minutes = (seconds % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = seconds % SECS_PER_MINUTE;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

/// Format a 0.0-1.0 volume as a whole percentage
///
/// # Examples
///
/// ```
/// use hertz_common::human_time::format_volume_percent;
///
/// assert_eq!(format_volume_percent(0.5), "50%");
/// assert_eq!(format_volume_percent(1.0), "100%");
/// ```
pub fn format_volume_percent(volume: f32) -> String {
    format!("{}%", (volume.clamp(0.0, 1.0) * 100.0).round() as u32)
}
