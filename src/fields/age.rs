//! Relative age parsing ("5 minutes", "an hour", "just now")

use chrono::{Duration, NaiveDateTime, Utc};

/// Phrases that mean the post was created at the reference time
const NOW_PHRASES: [&str; 2] = ["just now", "moments ago"];

/// Parses relative age text into an absolute timestamp
///
/// The result is `reference - elapsed`. Returns None for empty text, a missing or
/// unknown unit, or a magnitude that is not a number.
///
/// Unit matching is by substring: anything containing `min` is minutes, `hour`
/// (or exactly `h`) is hours, `sec` (or exactly `s`) is seconds. Other
/// abbreviations such as `hr` are not recognized.
///
/// # Example
///
/// ```
/// use chrono::{Duration, NaiveDate};
/// use forum_harvest::fields::parse_age;
///
/// let now = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
/// assert_eq!(parse_age("5 minutes", now), Some(now - Duration::minutes(5)));
/// assert_eq!(parse_age("just now", now), Some(now));
/// assert_eq!(parse_age("gibberish", now), None);
/// ```
pub fn parse_age(text: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    if NOW_PHRASES.contains(&text.as_str()) {
        return Some(reference);
    }

    let mut tokens = text.split_whitespace();
    let magnitude = parse_magnitude(tokens.next()?)?;
    let unit_seconds = unit_seconds(tokens.next().unwrap_or(""))?;

    let millis = (magnitude * unit_seconds * 1000.0).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    let elapsed = Duration::try_milliseconds(millis as i64)?;
    reference.checked_sub_signed(elapsed)
}

/// Parses relative age text against the current UTC time
pub fn parse_age_now(text: &str) -> Option<NaiveDateTime> {
    parse_age(text, Utc::now().naive_utc())
}

fn parse_magnitude(token: &str) -> Option<f64> {
    match token {
        "a" | "an" => Some(1.0),
        _ => token
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0),
    }
}

fn unit_seconds(unit: &str) -> Option<f64> {
    if unit.contains("min") {
        Some(60.0)
    } else if unit.contains("hour") || unit == "h" {
        Some(3600.0)
    } else if unit.contains("sec") || unit == "s" {
        Some(1.0)
    } else {
        None
    }
}
