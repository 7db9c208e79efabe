use crate::error::ExtractError;
use lazy_regex::regex;
use regex::Captures;

/// Turns a captured amount into a signed float
///
/// Accepts `1234.56`, `$1,234.56`, `-$5.00`; accounting notation `($50.00)` is negative.
pub(crate) fn parse_amount(raw: &str) -> Result<f64, ExtractError> {
    let mut cleaned = raw.trim().replace(['$', ','], "");
    let mut negative = false;

    if cleaned.contains('(') && cleaned.contains(')') {
        negative = true;
        cleaned = cleaned.replace(['(', ')'], "");
    }

    let mut s = cleaned.trim();
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    }
    // "for $12.00." style captures keep the sentence dot
    let s = s.strip_suffix('.').unwrap_or(s);

    if s.is_empty() {
        return Err(ExtractError::InvalidAmount("empty amount".into()));
    }
    if !regex!(r"^\d+(?:\.\d+)?$").is_match(s) {
        return Err(ExtractError::InvalidAmount(raw.trim().to_string()));
    }

    let value: f64 = s
        .parse()
        .map_err(|_| ExtractError::InvalidAmount(raw.trim().to_string()))?;
    if !value.is_finite() {
        return Err(ExtractError::InvalidAmount(raw.trim().to_string()));
    }

    Ok(if negative { -value } else { value })
}

/// Account suffix from a cell value such as `(...1234)`
///
/// Takes the last 4-digit run; otherwise the 4 characters before the closing one.
pub(crate) fn account_suffix(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(caps) = regex!(r"(\d{4})\D*$").captures(value) {
        return Some(caps[1].to_string());
    }

    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 5 {
        return None;
    }
    let tail: String = chars[chars.len() - 5..chars.len() - 1].iter().collect();
    Some(tail)
}

/// First capture group with non-blank text, left to right
///
/// A pattern without groups yields the whole match.
pub(crate) fn first_non_empty_group<'h>(caps: &Captures<'h>) -> Option<&'h str> {
    if caps.len() == 1 {
        return caps
            .get(0)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());
    }

    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
}

/// Collapses every whitespace run into one space and trims
pub(crate) fn squash_whitespace(s: &str) -> String {
    regex!(r"\s+").replace_all(s.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn parse_amount_handles_currency_and_thousands() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("1234").unwrap(), 1234.0);
        assert_eq!(parse_amount(" 12.5 ").unwrap(), 12.5);
    }

    #[test]
    fn parse_amount_handles_negative_forms() {
        assert_eq!(parse_amount("($50.00)").unwrap(), -50.0);
        assert_eq!(parse_amount("-$5.00").unwrap(), -5.0);
    }

    #[test]
    fn parse_amount_strips_sentence_dot() {
        assert_eq!(parse_amount("50.00.").unwrap(), 50.0);
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("$").is_err());
        assert!(parse_amount("12.3.4").is_err());
        assert!(parse_amount("Starbucks").is_err());
    }

    #[test]
    fn account_suffix_takes_trailing_digits() {
        assert_eq!(account_suffix("(...1234)").as_deref(), Some("1234"));
        assert_eq!(account_suffix("Sapphire (...9876)").as_deref(), Some("9876"));
        assert_eq!(account_suffix("...5555").as_deref(), Some("5555"));
        assert_eq!(account_suffix("ab").as_deref(), None);
    }

    #[test]
    fn first_non_empty_group_skips_unmatched_alternatives() {
        let re = Regex::new(r"(?:card \((\d{4})\)|account \((\d{4})\))").unwrap();
        let caps = re.captures("account (4321)").unwrap();
        assert_eq!(first_non_empty_group(&caps), Some("4321"));

        let plain = Regex::new(r"Direct Deposit").unwrap();
        let caps = plain.captures("a Direct Deposit b").unwrap();
        assert_eq!(first_non_empty_group(&caps), Some("Direct Deposit"));
    }

    #[test]
    fn squash_whitespace_collapses_runs() {
        assert_eq!(squash_whitespace("  a \n\t b  "), "a b");
    }
}
