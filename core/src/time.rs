//! Timestamp wire format.
//!
//! LangSmith timestamps travel as `YYYY-MM-DDTHH:MM:SS`: second precision,
//! no fractional part, no zone. `LangsmithTime` always encodes exactly that.
//! Decoding also accepts the shapes the service itself emits (fractional
//! seconds, a `Z` or numeric offset) by normalizing them to naive UTC and
//! dropping the sub-second part. Anything else is an error.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// `strftime` pattern of the wire format.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A UTC timestamp with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LangsmithTime(NaiveDateTime);

impl LangsmithTime {
    /// Wraps `value`, truncated to whole seconds.
    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }

    pub fn now() -> Self {
        Utc::now().into()
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Parses a wire timestamp. See the module docs for the accepted shapes.
    pub fn parse(input: &str) -> Result<Self, chrono::ParseError> {
        let naive = match NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => naive,
            Err(naive_err) => match DateTime::parse_from_rfc3339(input) {
                Ok(zoned) => zoned.naive_utc(),
                Err(_) => return Err(naive_err),
            },
        };
        Ok(Self::from_naive(naive))
    }
}

impl From<NaiveDateTime> for LangsmithTime {
    fn from(value: NaiveDateTime) -> Self {
        Self::from_naive(value)
    }
}

impl From<DateTime<Utc>> for LangsmithTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_naive(value.naive_utc())
    }
}

impl fmt::Display for LangsmithTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl FromStr for LangsmithTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LangsmithTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LangsmithTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}
