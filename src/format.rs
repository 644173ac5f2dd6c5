//! Remaining-time formatting.

/// Formats milliseconds as zero-padded `MM:SS`.
///
/// Partial seconds are floored and negative input reads as `00:00`.
/// Minutes are not wrapped into hours, so long sessions show e.g. `120:00`.
pub fn format_minutes_seconds(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

/// Whole seconds to show for a phase countdown.
///
/// Rounds up so that `1` stays on screen until the phase actually ends.
pub fn remaining_seconds_display(ms: u64) -> u64 {
    ms.div_ceil(1000)
}
