//! Human-friendly durations.
//!
//! `parse_duration` accepts the short forms used on the command line and in
//! the configuration file (`30d`, `12h`, `2w`); `format_duration` renders a
//! number of seconds the way the build-time report prints them.

use std::time::Duration;

use crate::error::{Error, Result};

/// Parse a duration string into a [`Duration`].
///
/// Format: number followed by unit (s, m, h, d, w).
/// Examples: "30d", "7d", "1h", "30m", "2w", "1.5d"
pub fn parse_duration(input: &str) -> Result<Duration> {
    let duration_str = input.trim().to_lowercase();
    let invalid = |message: &str| Error::Duration {
        input: input.to_string(),
        message: message.to_string(),
    };

    if duration_str.is_empty() {
        return Err(invalid("duration string cannot be empty"));
    }

    // Find the split point between number and unit
    let split_idx = duration_str
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(duration_str.len());

    if split_idx == 0 {
        return Err(invalid("duration must start with a number"));
    }

    let (number_str, unit_str) = duration_str.split_at(split_idx);
    let number: f64 = number_str
        .parse()
        .map_err(|_| invalid("invalid number"))?;

    let seconds = match unit_str.trim() {
        "s" | "sec" | "second" | "seconds" => number,
        "m" | "min" | "minute" | "minutes" => number * 60.0,
        "h" | "hr" | "hour" | "hours" => number * 3600.0,
        "d" | "day" | "days" => number * 86400.0,
        "w" | "week" | "weeks" => number * 604800.0,
        _ => return Err(invalid("unknown unit, expected one of s, m, h, d, w")),
    };

    if !seconds.is_finite() || seconds >= i64::MAX as f64 {
        return Err(invalid("duration is too large"));
    }

    Ok(Duration::from_secs(seconds as u64))
}

/// Format a number of seconds as `1d 2h 3m 4s`, omitting zero fields.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "0s".to_string();
    }

    let units = [("d", 86400), ("h", 3600), ("m", 60), ("s", 1)];
    let mut remaining = seconds;
    let mut parts = Vec::new();
    for (suffix, size) in units {
        let count = remaining / size;
        remaining %= size;
        if count > 0 {
            parts.push(format!("{}{}", count, suffix));
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("180d").unwrap(), Duration::from_secs(180 * 86400));
        assert_eq!(parse_duration("2w").unwrap(), Duration::from_secs(2 * 604800));
        assert_eq!(parse_duration("1.5d").unwrap(), Duration::from_secs(129600));
        assert_eq!(parse_duration(" 7 days ").unwrap(), Duration::from_secs(7 * 86400));
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10y").is_err());
        assert!(parse_duration("1.2.3d").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        let err = parse_duration("99999999999999999999d").unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(parse_duration("1e400s").is_err());
        assert!(parse_duration("100000w").is_ok());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(-5), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(90061), "1d 1h 1m 1s");
    }
}
