use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder substituted for every run of digits.
pub const NUM_TOKEN: &str = "<num>";

static RE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

// Anything that survives must be a lowercase letter, digit, space or placeholder bracket.
static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 <>]").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Reduce a free-text alert descriptor to its canonical signature.
///
/// Descriptors that differ only in embedded numbers (ticket ids, ports,
/// percentages, host suffixes) map to the same signature.
pub fn normalize(input: &str) -> String {
    // Order matters: digits collapse before punctuation is stripped
    let lowered = input.to_lowercase();
    let s = RE_DIGITS.replace_all(&lowered, NUM_TOKEN);
    let s = RE_DISALLOWED.replace_all(&s, " ");
    let s = RE_WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}
