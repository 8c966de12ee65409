//! Canonical identity for one (date, hour) cell of an event grid.
//!
//! The text form is `YYYY-MM-DD-HH`, fixed width with a zero-padded hour,
//! e.g. `2024-06-01-09`. Only the canonical form parses, so every accepted
//! string maps back to exactly one key and prints back unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const KEY_LEN: usize = 13;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotKeyError {
    #[error("slot key `{0}` is not of the form YYYY-MM-DD-HH")]
    Malformed(String),
    #[error("slot key `{0}` does not name a calendar date")]
    InvalidDate(String),
    #[error("slot key `{key}` has hour {hour}, expected 00-23")]
    InvalidHour { key: String, hour: u8 },
}

/// A bookable cell. Ordering is chronological: date first, then hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    date: NaiveDate,
    hour: u8,
}

impl SlotKey {
    /// Range membership against an event is the caller's concern; only the
    /// date and hour are combined here.
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Self { date, hour }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn parse(key: &str) -> Result<Self, SlotKeyError> {
        let malformed = || SlotKeyError::Malformed(key.to_string());

        if key.len() != KEY_LEN || !key.is_ascii() {
            return Err(malformed());
        }
        let (date_part, hour_part) = key.split_at(10);
        let hour_digits = hour_part.strip_prefix('-').ok_or_else(malformed)?;
        if !hour_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let date_shape_ok = date_part.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !date_shape_ok {
            return Err(malformed());
        }

        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map_err(|_| SlotKeyError::InvalidDate(key.to_string()))?;
        let hour: u8 = hour_digits.parse().map_err(|_| malformed())?;
        if hour > 23 {
            return Err(SlotKeyError::InvalidHour {
                key: key.to_string(),
                hour,
            });
        }
        Ok(Self { date, hour })
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.date.format(DATE_FORMAT), self.hour)
    }
}

impl FromStr for SlotKey {
    type Err = SlotKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SlotKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}
