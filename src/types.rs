//! Type definitions and duration helpers

use std::time::Duration;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Upper bound for any parsed duration (one year)
const MAX_DURATION_SECS: f64 = 365.0 * 24.0 * 3600.0;

/// Parse a human duration such as `30s`, `1m30s`, `500ms`, `1h` or bare seconds
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AppError::parse("Duration cannot be empty"));
    }

    // Bare number means seconds, fractional allowed
    if let Ok(secs) = s.parse::<f64>() {
        return seconds_to_duration(secs, input);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| AppError::parse(format!("Missing unit in duration '{}'", input)))?;
        if digits_end == 0 {
            return Err(AppError::parse(format!("Invalid duration '{}'", input)));
        }
        let value: f64 = rest[..digits_end]
            .parse()
            .map_err(|_| AppError::parse(format!("Invalid number in duration '{}'", input)))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let secs = match unit {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            other => {
                return Err(AppError::parse(format!(
                    "Unknown unit '{}' in duration '{}' (use ms, s, m or h)",
                    other, input
                )))
            }
        };
        total += seconds_to_duration(secs, input)?;
    }

    Ok(total)
}

fn seconds_to_duration(secs: f64, input: &str) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 || secs > MAX_DURATION_SECS {
        return Err(AppError::parse(format!("Invalid duration '{}'", input)));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Format a duration the way it is written in scenario files
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    if millis % 1000 != 0 {
        return format!("{}ms", millis);
    }

    let mut secs = duration.as_secs();
    let mut out = String::new();
    let hours = secs / 3600;
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
        secs %= 3600;
    }
    let minutes = secs / 60;
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
        secs %= 60;
    }
    if secs > 0 {
        out.push_str(&format!("{}s", secs));
    }
    out
}

/// Serde adapter storing durations as human strings (`"30s"`)
pub mod duration_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Seconds(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => super::parse_duration(&text).map_err(de::Error::custom),
            Raw::Seconds(secs) => super::seconds_to_duration(secs, &secs.to_string()).map_err(de::Error::custom),
        }
    }
}

/// Convert a duration to fractional milliseconds
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
