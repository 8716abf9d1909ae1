//! Duration values in configuration files
//!
//! Accepted forms:
//! - seconds: `604800`, `1.5`
//! - clock: `hh:mm:ss`, `d.hh:mm:ss`, with optional fractional seconds

use chrono::TimeDelta;

/// Parse a configuration duration. `None` if the text is not a valid,
/// non negative duration.
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if !text.contains(':') {
        let seconds: f64 = text.parse().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        return TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64);
    }

    let (days, clock) = match text.split_once('.') {
        Some((days, rest)) if !days.contains(':') => (days.parse::<i64>().ok()?, rest),
        _ => (0, text),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if days < 0 || hours < 0 || !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    let whole = ((days * 24 + hours) * 60 + minutes) * 60;
    TimeDelta::try_milliseconds(whole * 1000 + (seconds * 1000.0).round() as i64)
}
