//! Normalisation of the timestamp strings returned by the remote library.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Instant in time, always normalised to UTC.
pub type Timestamp = DateTime<Utc>;

/// Failure to interpret a timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// None of the supported layouts matched.
    #[error("unrecognized timestamp format: {text:?}")]
    UnrecognizedFormat {
        /// The original, unparsed input.
        text: String,
    },
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// `T` separated with fractional seconds and a `Z` or `±HH:MM` zone.
    OffsetFractional,
    /// `T` separated with whole seconds and a `Z` or `±HH:MM` zone.
    Offset,
    /// Zone-less, space separated; read as UTC.
    NaiveSpace,
    /// Zone-less, `T` separated; read as UTC.
    NaiveT,
}

const LAYOUTS: [Layout; 4] = [
    Layout::OffsetFractional,
    Layout::Offset,
    Layout::NaiveSpace,
    Layout::NaiveT,
];

const DATE_TIME_T: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_TIME_SPACE: &str = "%Y-%m-%d %H:%M:%S%.f";

impl Layout {
    fn parse(self, text: &str) -> Option<Timestamp> {
        match self {
            Layout::OffsetFractional if has_fraction(text) => zoned(text),
            Layout::Offset if !has_fraction(text) => zoned(text),
            Layout::OffsetFractional | Layout::Offset => None,
            Layout::NaiveSpace => naive(text, DATE_TIME_SPACE),
            Layout::NaiveT => naive(text, DATE_TIME_T),
        }
    }
}

fn has_fraction(text: &str) -> bool {
    text.contains('.')
}

fn zoned(text: &str) -> Option<Timestamp> {
    if let Some(stem) = text.strip_suffix('Z') {
        return naive(stem, DATE_TIME_T);
    }

    // Only a numeric `±HH:MM` designator is accepted besides `Z`.
    let sign = text.len().checked_sub(6).and_then(|at| text.as_bytes().get(at))?;
    if !matches!(sign, b'+' | b'-') {
        return None;
    }
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%:z")
        .ok()
        .map(|value| value.with_timezone(&Utc))
}

fn naive(text: &str, layout: &str) -> Option<Timestamp> {
    NaiveDateTime::parse_from_str(text, layout)
        .ok()
        .map(|value| value.and_utc())
}

/// Parse a timestamp in any of the layouts the remote API is known to emit.
///
/// Layouts are tried in order: zoned with fractional seconds, zoned without,
/// then zone-less with a space or a `T` separator (both read as UTC). The
/// first match wins. Input is matched exactly as given; surrounding
/// whitespace, lowercase designators and other near misses are rejected.
pub fn parse(text: &str) -> Result<Timestamp, ParseError> {
    let unrecognized = || ParseError::UnrecognizedFormat {
        text: text.to_string(),
    };
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        return Err(unrecognized());
    }
    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(text))
        .ok_or_else(unrecognized)
}

/// Render a timestamp as RFC 3339 with a `Z` suffix, as accepted by [`parse`].
pub fn format(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
