//! Free-text extractors used to turn patient answers into intake fields.
//!
//! Every extractor returns `None` when it cannot read a value. Callers
//! treat that as "leave the field unset"; nothing here raises.

const YES_TOKENS: &[&str] = &["yes", "y", "true"];
const NO_TOKENS: &[&str] = &["no", "n", "false"];
const EMPTY_LIST_TOKENS: &[&str] = &["none", "no", "n/a"];
const CONFIRM_TOKENS: &[&str] = &["yes", "y", "correct", "true"];
const DURATION_KEYWORDS: &[&str] = &["day", "week", "month", "hour", "since"];
const DURATION_UNITS: &[&str] = &["day", "week", "month", "hour"];

/// Exact (trimmed, case-insensitive) match against the yes tokens.
pub fn is_yes(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    YES_TOKENS.contains(&lowered.as_str())
}

/// `Some(true)` for a yes token, `Some(false)` for a no token, else `None`.
pub fn parse_yes_no(text: &str) -> Option<bool> {
    let lowered = text.trim().to_lowercase();
    if YES_TOKENS.contains(&lowered.as_str()) {
        Some(true)
    } else if NO_TOKENS.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Summary confirmation. Trailing punctuation is ignored ("Correct." counts).
pub fn is_confirmation(text: &str) -> bool {
    let lowered = text.trim().trim_end_matches(['.', '!']).to_lowercase();
    CONFIRM_TOKENS.contains(&lowered.as_str())
}

/// Concatenates every ASCII digit in the text and reads the result as a
/// number ("7/10" reads as 710). Saturates instead of overflowing.
pub fn extract_digits(text: &str) -> Option<u32> {
    let mut seen = false;
    let value = text
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u32, |acc, d| {
            seen = true;
            acc.saturating_mul(10).saturating_add(d)
        });
    seen.then_some(value)
}

/// Comma-separated list with each item trimmed. "none", "no" and "n/a"
/// mean nothing was provided.
pub fn split_list(text: &str) -> Option<Vec<String>> {
    let lowered = text.trim().to_lowercase();
    if EMPTY_LIST_TOKENS.contains(&lowered.as_str()) {
        return None;
    }
    Some(text.split(',').map(|item| item.trim().to_string()).collect())
}

/// The trimmed text if it mentions a duration-like keyword.
pub fn duration_phrase(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    DURATION_KEYWORDS
        .iter()
        .any(|kw| lowered.contains(kw))
        .then(|| text.trim().to_string())
}

/// The first whitespace-separated all-digit token whose value is at most 10,
/// skipping a number that counts a duration unit ("for 2 days, severity 7"
/// reads as 7).
pub fn scale_token_outside_duration(text: &str) -> Option<i64> {
    let tokens: Vec<&str> = text.split_whitespace().map(trim_token).collect();
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| is_number(token))
        .filter(|(i, _)| !tokens.get(i + 1).is_some_and(|next| is_duration_unit(next)))
        .filter_map(|(_, token)| token.parse::<i64>().ok())
        .find(|value| *value <= 10)
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_ascii_alphanumeric())
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn is_duration_unit(token: &str) -> bool {
    let lowered = token.to_lowercase();
    DURATION_UNITS.iter().any(|unit| lowered.starts_with(unit))
}

/// Yes or no carried by any single word of the message ("yes, since monday").
pub fn yes_no_token(text: &str) -> Option<bool> {
    text.split_whitespace()
        .map(trim_token)
        .find_map(parse_yes_no)
}
