use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use lazy_regex::regex;

use super::Zone;

/// One entry of the ordered format list
#[derive(Debug, Clone, Copy)]
pub(super) enum DateFormat {
    /// date and time, no zone
    Naive(&'static str),
    /// calendar date only
    DateOnly(&'static str),
    /// carries its own `%z` offset
    Zoned(&'static str),
    Rfc3339,
    Rfc2822,
}

/// Tried top to bottom, first success wins
///
/// Two-digit-year variants come before four-digit ones: `%Y` would happily read "24" as year 24.
pub(super) const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Naive("%b %d, %Y at %I:%M %p"),
    DateFormat::Naive("%B %d, %Y at %I:%M %p"),
    DateFormat::Rfc3339,
    DateFormat::Naive("%Y-%m-%dT%H:%M:%S"),
    DateFormat::Naive("%Y-%m-%dT%H:%M:%S%.f"),
    DateFormat::DateOnly("%Y-%m-%d"),
    DateFormat::DateOnly("%m/%d/%y"),
    DateFormat::DateOnly("%m/%d/%Y"),
    DateFormat::DateOnly("%b %d, %Y"),
    DateFormat::DateOnly("%B %d, %Y"),
    DateFormat::Naive("%Y-%m-%d %H:%M:%S"),
    DateFormat::Naive("%m/%d/%y %I:%M %p"),
    DateFormat::Naive("%m/%d/%Y %I:%M %p"),
    DateFormat::Rfc2822,
    DateFormat::Naive("%a, %d %b %Y %H:%M:%S"),
    DateFormat::Zoned("%Y-%m-%dT%H:%M:%S%z"),
    DateFormat::Zoned("%Y-%m-%d %H:%M:%S%z"),
    DateFormat::Zoned("%Y-%m-%d %H:%M:%S %z"),
    DateFormat::Zoned("%d/%m/%Y %H:%M:%S%z"),
    DateFormat::Zoned("%Y-%m-%dT%H:%M:%S%.f%z"),
];

/// Zone abbreviations in priority order
const ZONE_TOKENS: &[(&[&str], Tz)] = &[
    (&["ET", "EST", "EDT"], Tz::America__New_York),
    (&["CT", "CST", "CDT"], Tz::America__Chicago),
    (&["MT", "MST", "MDT"], Tz::America__Denver),
    (&["PT", "PST", "PDT"], Tz::America__Los_Angeles),
    (&["GMT", "UTC"], Tz::UTC),
];

/// Result of matching one format
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Parsed {
    /// wall-clock value; `has_time` is false for date-only formats
    Naive { value: NaiveDateTime, has_time: bool },
    Aware(DateTime<FixedOffset>),
}

impl Parsed {
    fn year(&self) -> i32 {
        match self {
            Parsed::Naive { value, .. } => value.year(),
            Parsed::Aware(dt) => dt.year(),
        }
    }
}

/// Parses `text` with the first format that accepts it
pub(super) fn parse_with_formats(text: &str) -> Option<Parsed> {
    DATE_FORMATS
        .iter()
        .filter_map(|format| parse_one(text, *format))
        // "12/30/24" read by a four-digit-year pattern
        .find(|parsed| parsed.year() >= 1000)
}

fn parse_one(text: &str, format: DateFormat) -> Option<Parsed> {
    match format {
        DateFormat::Naive(fmt) => NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .map(|value| Parsed::Naive { value, has_time: true }),
        DateFormat::DateOnly(fmt) => NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|value| Parsed::Naive { value, has_time: false }),
        DateFormat::Zoned(fmt) => DateTime::parse_from_str(text, fmt).ok().map(Parsed::Aware),
        DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(text).ok().map(Parsed::Aware),
        DateFormat::Rfc2822 => DateTime::parse_from_rfc2822(text).ok().map(Parsed::Aware),
    }
}

/// Explicit numeric offset such as `-0500` or `+05:30`
pub(super) fn find_offset(text: &str) -> Option<FixedOffset> {
    let caps = regex!(r"([+-])(\d{2}):?(\d{2})\b").captures(text)?;

    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps[3].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    let seconds = hours * 3600 + minutes * 60;
    match &caps[1] {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

/// Removes the numeric offset found by [`find_offset`]
pub(super) fn strip_offset(text: &str) -> String {
    let stripped = regex!(r"\s*[+-]\d{2}:?\d{2}\b").replace(text, "");
    stripped.trim().to_string()
}

/// Zone named by an abbreviation, or a trailing `Z` after a digit
pub(super) fn find_zone_token(text: &str) -> Option<Zone> {
    let tokens: Vec<&str> = regex!(r"\b[A-Z]{2,3}\b")
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();

    let named = ZONE_TOKENS
        .iter()
        .find(|(names, _)| names.iter().any(|n| tokens.contains(n)))
        .map(|(_, tz)| Zone::Named(*tz));

    named.or_else(|| {
        regex!(r"\dZ$")
            .is_match(text.trim_end())
            .then_some(Zone::Named(Tz::UTC))
    })
}

/// Removes zone abbreviations and a trailing `Z`, squashes whitespace
pub(super) fn strip_zone_tokens(text: &str) -> String {
    let without_names =
        regex!(r"\b(?:ET|EST|EDT|CT|CST|CDT|MT|MST|MDT|PT|PST|PDT|GMT|UTC)\b").replace_all(text, " ");
    let without_z = regex!(r"(\d)Z\s*$").replace(&without_names, "$1");

    let squashed = regex!(r"\s+").replace_all(&without_z, " ");
    squashed
        .trim_matches(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .to_string()
}

/// Drops a trailing RFC-2822 comment such as `(UTC)` or `(Pacific Standard Time)`
pub(super) fn strip_header_comment(header: &str) -> String {
    regex!(r"\s*\([^)]*\)\s*$").replace(header.trim(), "").to_string()
}
