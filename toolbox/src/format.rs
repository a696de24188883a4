//! Human-readable formatting helpers.

/// Format an elapsed time in seconds as `"1d 2h 3m 4.5s"`.
///
/// Leading components that are zero are omitted, so 42 seconds is `"42s"`
/// while one hour exactly is `"1h 0m 0s"`. Days are not folded into weeks.
pub fn fmt_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return format!("{seconds}s");
    }
    if seconds < 0.0 {
        return format!("-{}", fmt_time(-seconds));
    }

    let secs = seconds % 60.0;
    let minutes_total = ((seconds - secs) / 60.0).round();
    let mut result = format!("{secs}s");
    if minutes_total == 0.0 {
        return result;
    }

    let minutes = minutes_total % 60.0;
    let hours_total = ((minutes_total - minutes) / 60.0).round();
    result = format!("{minutes}m {result}");
    if hours_total == 0.0 {
        return result;
    }

    let hours = hours_total % 24.0;
    let days = ((hours_total - hours) / 24.0).round();
    result = format!("{hours}h {result}");
    if days == 0.0 {
        return result;
    }

    format!("{days}d {result}")
}
