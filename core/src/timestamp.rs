//! Lenient parsing for incoming due dates.
//!
//! Callers send either RFC 3339 (`2024-05-01T10:00:00Z`, as produced by
//! `Date.toISOString()`) or a bare local date-time without an offset
//! (`2024-05-01T10:00:00`, optionally without seconds). Offset-less values
//! are read as UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::types::Patch;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date-time `{0}`: expected RFC 3339 or YYYY-MM-DDTHH:MM[:SS[.fff]]")]
pub struct InvalidTimestamp(pub String);

/// Parse a due date in either accepted form.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, InvalidTimestamp> {
    if let Ok(time) = raw.parse::<DateTime<FixedOffset>>() {
        return Ok(time.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc())
        .map_err(|_| InvalidTimestamp(raw.to_string()))
}

/// `deserialize_with` for a required timestamp.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

/// `deserialize_with` for an optional timestamp; `null` yields `None`.
pub fn deserialize_option<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse(&raw).map_err(de::Error::custom))
        .transpose()
}

/// `deserialize_with` for a patched timestamp. Only called when the key is
/// present, so the result is `Null` or `Value`; pair with `#[serde(default)]`.
pub fn deserialize_patch<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Patch<DateTime<Utc>>, D::Error> {
    deserialize_option(deserializer).map(Patch::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_local_forms_agree() {
        let expected = parse("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(parse("2024-05-01T10:00:00").unwrap(), expected);
        assert_eq!(parse("2024-05-01T10:00").unwrap(), expected);
        assert_eq!(parse("2024-05-01T12:00:00+02:00").unwrap(), expected);
    }

    #[test]
    fn fractional_seconds_survive_local_form() {
        let time = parse("2024-05-01T10:00:00.250").unwrap();
        assert_eq!(time, parse("2024-05-01T10:00:00.250Z").unwrap());
    }

    #[test]
    fn years_beyond_four_digits_parse() {
        let far = parse("+10000-01-01T00:00:00Z").unwrap();
        let ancient = parse("-0001-01-01T00:00:00Z").unwrap();
        assert!(ancient < far);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse("tomorrow"), Err(InvalidTimestamp("tomorrow".to_string())));
        assert!(parse("2024-05-01").is_err());
    }
}
