//! SigMF timestamps. Every instant is UTC, written with exactly six fractional
//! digits and a literal `Z`, e.g. `2025-09-20T13:05:03.250000Z`.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Timelike, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// `strftime` pattern for writing SigMF timestamps.
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

// chrono accepts a variable number of fractional digits when parsing, so the
// fixed width is enforced by the pattern first.
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

static ISO8601_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{6}Z$")
        .expect("Invalid ISO8601 regex pattern")
});

#[derive(Error, Debug)]
pub enum TimestampError {
    #[error("Timestamp {0:?} does not match YYYY-MM-DDTHH:MM:SS.ffffffZ")]
    Malformed(String),
    #[error("Timestamp {0:?} falls on a leap second")]
    LeapSecond(String),
    #[error("Timestamp {text:?} is not a valid instant")]
    OutOfRange {
        text: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Formats `instant` the SigMF way. Anything below a microsecond is dropped.
pub fn format_iso8601(instant: &DateTime<Utc>) -> String {
    instant.trunc_subsecs(6).format(ISO8601_FORMAT).to_string()
}

/// The current UTC time as a SigMF timestamp.
pub fn now_as_iso8601() -> String {
    format_iso8601(&Utc::now())
}

/// Strict parse of a SigMF timestamp. Missing fractions, a fraction of any
/// width other than six digits, offsets other than `Z` and stray whitespace
/// are all rejected.
pub fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    if !ISO8601_RE.is_match(text) {
        debug!("Rejected timestamp {:?}", text);
        return Err(TimestampError::Malformed(text.to_owned()));
    }

    let naive = NaiveDateTime::parse_from_str(text, PARSE_FORMAT).map_err(|source| {
        TimestampError::OutOfRange {
            text: text.to_owned(),
            source,
        }
    })?;

    // chrono keeps second 60 as a nanosecond value past one second
    if naive.nanosecond() >= 1_000_000_000 {
        debug!("Rejected leap second timestamp {:?}", text);
        return Err(TimestampError::LeapSecond(text.to_owned()));
    }

    Ok(naive.and_utc())
}
