//! Timestamp normalization.
//!
//! A date substring scraped from a body is turned into a UTC instant; the zone is
//! picked by the first rule that applies:
//!
//! 1. an explicit numeric offset inside the substring (`-0500`, `+05:30`)
//! 2. a zone abbreviation (`ET`, `PST`, `GMT`, ...) or a trailing `Z`
//! 3. the offset of the envelope `Date` header
//! 4. the local zone reported by a [`LocalTimezoneProvider`]
//! 5. UTC

mod utils;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::ExtractError;

use utils::*;

/// Zone used to interpret a wall-clock value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Named(Tz::UTC)
    }

    /// Attaches the zone to `naive`
    ///
    /// Ambiguous wall times take the earlier instant; times inside a DST gap are moved forward one hour.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Source of the process-local timezone
///
/// Injected so resolution does not depend on the machine running it.
pub trait LocalTimezoneProvider: Send + Sync + fmt::Debug {
    fn local_zone(&self) -> Option<Zone>;
}

/// Reads the operating-system zone through `iana-time-zone`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimezone;

impl LocalTimezoneProvider for SystemTimezone {
    fn local_zone(&self) -> Option<Zone> {
        let name = iana_time_zone::get_timezone().ok()?;
        match name.parse::<Tz>() {
            Ok(tz) => Some(Zone::Named(tz)),
            Err(_) => {
                debug!(zone = %name, "unknown system timezone");
                None
            }
        }
    }
}

/// Always answers with the same zone, or with none
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTimezone(pub Option<Zone>);

impl FixedTimezone {
    pub fn named(tz: Tz) -> Self {
        FixedTimezone(Some(Zone::Named(tz)))
    }
}

impl LocalTimezoneProvider for FixedTimezone {
    fn local_zone(&self) -> Option<Zone> {
        self.0
    }
}

/// Resolves scraped date text plus the envelope header into one UTC timestamp
#[derive(Debug, Clone)]
pub struct DateTimeResolver {
    local: Arc<dyn LocalTimezoneProvider>,
}

impl Default for DateTimeResolver {
    fn default() -> Self {
        Self::system()
    }
}

impl DateTimeResolver {
    pub fn new(local: Arc<dyn LocalTimezoneProvider>) -> Self {
        DateTimeResolver { local }
    }

    /// Resolver using the operating-system zone as last fallback
    pub fn system() -> Self {
        Self::new(Arc::new(SystemTimezone))
    }

    /// Resolver with a fixed fallback zone
    pub fn with_zone(tz: Tz) -> Self {
        Self::new(Arc::new(FixedTimezone::named(tz)))
    }

    /// ISO-8601 UTC text such as `2025-01-02T06:33:33+00:00`
    ///
    /// Returns `None` when neither the substring nor the envelope can be interpreted.
    pub fn resolve(&self, date_substring: Option<&str>, envelope: Option<&str>) -> Option<String> {
        self.resolve_utc(date_substring, envelope).map(to_iso_utc)
    }

    pub fn resolve_utc(&self, date_substring: Option<&str>, envelope: Option<&str>) -> Option<DateTime<Utc>> {
        self.try_resolve(date_substring, envelope).ok()
    }

    /// Like [`Self::resolve_utc`], naming the text that could not be read
    pub fn try_resolve(
        &self,
        date_substring: Option<&str>,
        envelope: Option<&str>,
    ) -> Result<DateTime<Utc>, ExtractError> {
        let envelope_dt = envelope.and_then(parse_envelope_date);

        let Some(raw) = date_substring.map(str::trim).filter(|s| !s.is_empty()) else {
            return envelope_dt
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| ExtractError::InvalidDate(format!("Date header '{}'", envelope.unwrap_or_default())));
        };

        let offset = find_offset(raw);
        let zone = offset
            .map(Zone::Fixed)
            .or_else(|| find_zone_token(raw))
            .or_else(|| envelope_dt.map(|dt| Zone::Fixed(*dt.offset())))
            .or_else(|| self.local.local_zone())
            .unwrap_or_else(Zone::utc);

        let cleaned = strip_zone_tokens(raw);
        let parsed = parse_with_formats(&cleaned)
            .or_else(|| offset.and_then(|_| parse_with_formats(&strip_offset(&cleaned))));

        let Some(parsed) = parsed else {
            return Err(ExtractError::InvalidDate(format!("'{raw}' matches no known format")));
        };

        match parsed {
            Parsed::Aware(dt) => Ok(dt.with_timezone(&Utc)),
            Parsed::Naive { value, has_time } => {
                let value = match envelope_dt {
                    // a bare date borrows the envelope's wall-clock time
                    Some(env) if !has_time && env.time() != NaiveTime::MIN => value.date().and_time(env.time()),
                    _ => value,
                };
                zone.localize(value)
                    .ok_or_else(|| ExtractError::InvalidDate(format!("'{raw}' does not exist in its zone")))
            }
        }
    }
}

/// Parses an RFC-2822 `Date` header, tolerating a trailing `(comment)`
pub fn parse_envelope_date(header: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = strip_header_comment(header);
    if cleaned.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(&cleaned)
        .ok()
        .or_else(|| DateTime::parse_from_str(&cleaned, "%a, %d %b %Y %H:%M:%S %z").ok())
        .or_else(|| DateTime::parse_from_str(&cleaned, "%d %b %Y %H:%M:%S %z").ok())
        .or_else(|| {
            debug!(header, "unparseable envelope date");
            None
        })
}

/// Renders an instant the way records store it
pub fn to_iso_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
