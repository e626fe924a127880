//! Clock-style time formatting for log output

/// Format a duration in seconds as `M:SS`, or `H:MM:SS` from one hour up.
///
/// Fractional seconds are truncated; negative values (error conditions from
/// a backend) render as `0:00`.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
