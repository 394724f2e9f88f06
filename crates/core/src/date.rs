// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Civil dates for WU metadata.
//!
//! YAML tooling likes to coerce bare `YYYY-MM-DD` scalars into timestamps
//! and back again, which makes date fields drift between the two shapes.
//! `CivilDate` pins them: parsing accepts either form (taking the date part
//! of a timestamp), serialization always emits the bare string.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing a [`CivilDate`] fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date `{0}` (expected YYYY-MM-DD)")]
pub struct CivilDateError(pub String);

/// A calendar date with no time-of-day and no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate(NaiveDate);

impl CivilDate {
    /// Build from components. Returns `None` for out-of-range dates.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The calendar date of a UTC instant.
    pub fn from_utc(at: &DateTime<Utc>) -> Self {
        Self(at.date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CivilDate {
    type Err = CivilDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A timestamp that leaked in from a YAML round-trip is normalized
        // by keeping only its date part.
        let date_part = s
            .split_once('T')
            .or_else(|| s.split_once(' '))
            .map(|(d, _)| d)
            .unwrap_or(s);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| CivilDateError(s.to_string()))
    }
}

impl Serialize for CivilDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CivilDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "date_tests.rs"]
mod tests;
