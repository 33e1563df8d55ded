//! Score text parsing
//!
//! Listings show scores like "4 points", "1.2k", "Vote" or a bullet placeholder
//! while the real value is hidden.

/// Unit words stripped before parsing; longer forms first so "points" never leaves an "s"
const UNIT_WORDS: [&str; 4] = ["points", "point", "votes", "vote"];

/// Rendered in place of the score while voting is still hidden
const PLACEHOLDER: &str = "•";

/// Parses a possibly abbreviated score into a non-negative integer
///
/// Returns 0 for empty, placeholder, negative or unparseable text. A trailing
/// `k` multiplies by one thousand and a trailing `m` by one million; the
/// decimal is scaled digit by digit and then truncated, so `"32.3k"` is exactly
/// 32300.
///
/// # Example
///
/// ```
/// use forum_harvest::fields::parse_score;
///
/// assert_eq!(parse_score("1.2k"), 1200);
/// assert_eq!(parse_score("4 points"), 4);
/// assert_eq!(parse_score(""), 0);
/// ```
pub fn parse_score(text: &str) -> u64 {
    let mut cleaned = text.trim().to_lowercase();
    for unit in UNIT_WORDS {
        cleaned = cleaned.replace(unit, "");
    }
    let cleaned = cleaned.trim().replace(',', "");

    if cleaned.is_empty() || cleaned == PLACEHOLDER {
        return 0;
    }

    let (number, multiplier) = if let Some(rest) = cleaned.strip_suffix('k') {
        (rest, 1_000)
    } else if let Some(rest) = cleaned.strip_suffix('m') {
        (rest, 1_000_000)
    } else {
        (cleaned.as_str(), 1)
    };

    scale_decimal(number.trim(), multiplier).unwrap_or(0)
}

/// Multiplies a plain decimal string by `multiplier`, truncating leftover fraction
///
/// Negative numbers clamp to zero. Returns None when the text is not a decimal
/// or the result overflows.
fn scale_decimal(text: &str, multiplier: u64) -> Option<u64> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    if negative {
        return Some(0);
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(multiplier)?;

    let mut place = multiplier;
    for digit in fraction.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        value = value.checked_add(u64::from(digit.to_digit(10)?) * place)?;
    }

    Some(value)
}
