// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Partial date/time values
//!
//! FHIR date-times may stop at any precision (`2015`, `2015-02`,
//! `2015-02-04T14:34`, ...). Two values are only ordered against each other
//! when they carry the same precision; otherwise the comparison is unknown.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FhirPathError, Result};

static DATE_TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:T(\d{2})(?::(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?(Z|[+-]\d{2}:\d{2})?)?)?)?$",
    )
    .unwrap()
});

static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})(?::(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?$")
        .unwrap()
});

/// A date-time truncated at some precision, with an optional UTC offset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialDateTime {
    text: String,
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    nanos: u32,
    offset_seconds: Option<i32>,
}

/// A time of day truncated at some precision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialTime {
    text: String,
    hour: u32,
    minute: Option<u32>,
    second: Option<u32>,
    nanos: u32,
}

fn capture_u32(captures: &regex::Captures<'_>, index: usize) -> Option<u32> {
    captures.get(index).and_then(|m| m.as_str().parse().ok())
}

fn fraction_nanos(captures: &regex::Captures<'_>, index: usize) -> u32 {
    captures
        .get(index)
        .map(|m| {
            let digits = m.as_str();
            let padded = format!("{digits:0<9}");
            padded.parse().unwrap_or(0)
        })
        .unwrap_or(0)
}

fn parse_offset(text: &str) -> Option<i32> {
    if text == "Z" {
        return Some(0);
    }
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let hours: i32 = text.get(1..3)?.parse().ok()?;
    let minutes: i32 = text.get(4..6)?.parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

fn invalid(kind: &str, text: &str) -> FhirPathError {
    FhirPathError::conversion(kind, format!("'{text}'"))
}

impl PartialDateTime {
    /// Parse the textual form (without any leading `@`)
    pub fn parse(text: &str) -> Result<Self> {
        let captures = DATE_TIME_PATTERN
            .captures(text)
            .ok_or_else(|| invalid("dateTime", text))?;

        let year: i32 = captures[1]
            .parse()
            .map_err(|_| invalid("dateTime", text))?;
        let value = Self {
            text: text.to_string(),
            year,
            month: capture_u32(&captures, 2),
            day: capture_u32(&captures, 3),
            hour: capture_u32(&captures, 4),
            minute: capture_u32(&captures, 5),
            second: capture_u32(&captures, 6),
            nanos: fraction_nanos(&captures, 7),
            offset_seconds: captures.get(8).and_then(|m| parse_offset(m.as_str())),
        };

        if let Some(month) = value.month {
            let day = value.day.unwrap_or(1);
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("dateTime", text))?;
        }
        if let Some(hour) = value.hour {
            NaiveTime::from_hms_opt(hour, value.minute.unwrap_or(0), value.second.unwrap_or(0))
                .ok_or_else(|| invalid("dateTime", text))?;
        }
        Ok(value)
    }

    /// The date of today in the local time zone, at day precision
    pub fn today() -> Self {
        let now = chrono::Local::now();
        Self {
            text: now.format("%Y-%m-%d").to_string(),
            year: now.year(),
            month: Some(now.month()),
            day: Some(now.day()),
            hour: None,
            minute: None,
            second: None,
            nanos: 0,
            offset_seconds: None,
        }
    }

    /// The current instant in the local time zone, at millisecond precision
    pub fn now() -> Self {
        let now = chrono::Local::now();
        let millis = now.timestamp_subsec_millis().min(999);
        Self {
            text: now.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            year: now.year(),
            month: Some(now.month()),
            day: Some(now.day()),
            hour: Some(now.hour()),
            minute: Some(now.minute()),
            second: Some(now.second()),
            nanos: millis * 1_000_000,
            offset_seconds: Some(now.offset().local_minus_utc()),
        }
    }

    /// The textual form this value was parsed from
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of populated components, from 1 (year) to 6 (seconds)
    pub fn precision(&self) -> usize {
        1 + [self.month, self.day, self.hour, self.minute, self.second]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    /// Whether a UTC offset was given
    pub fn has_offset(&self) -> bool {
        self.offset_seconds.is_some()
    }

    fn components(&self) -> (i32, u32, u32, u32, u32, u32, u32) {
        (
            self.year,
            self.month.unwrap_or(0),
            self.day.unwrap_or(0),
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
            self.nanos,
        )
    }

    fn to_instant(&self) -> Option<chrono::DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_seconds?)?;
        let date = NaiveDate::from_ymd_opt(self.year, self.month?, self.day?)?;
        let time = NaiveTime::from_hms_nano_opt(
            self.hour?,
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
            self.nanos,
        )?;
        offset.from_local_datetime(&date.and_time(time)).single()
    }

    /// Order two values, `None` when their precisions are incomparable
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.precision() != other.precision() {
            return None;
        }
        if self.hour.is_some() {
            match (self.to_instant(), other.to_instant()) {
                (Some(left), Some(right)) => return Some(left.cmp(&right)),
                _ if self.has_offset() != other.has_offset() => return None,
                _ => {}
            }
        }
        Some(self.components().cmp(&other.components()))
    }

    /// Equality, `None` when the precisions differ and the shared components
    /// cannot tell the values apart
    pub fn equals(&self, other: &Self) -> Option<bool> {
        if let Some(ordering) = self.compare(other) {
            return Some(ordering == Ordering::Equal);
        }
        let shared = self.precision().min(other.precision());
        if shared > 3 && self.has_offset() != other.has_offset() {
            return None;
        }
        let prefix = |dt: &Self| {
            let (year, month, day, hour, minute, second, _) = dt.components();
            [i64::from(year), month.into(), day.into(), hour.into(), minute.into(), second.into()]
        };
        if prefix(self)[..shared] != prefix(other)[..shared] {
            Some(false)
        } else {
            None
        }
    }
}

impl PartialTime {
    /// Parse the textual form (without any leading `@T`)
    pub fn parse(text: &str) -> Result<Self> {
        let captures = TIME_PATTERN
            .captures(text)
            .ok_or_else(|| invalid("time", text))?;
        let hour = capture_u32(&captures, 1).ok_or_else(|| invalid("time", text))?;
        let value = Self {
            text: text.to_string(),
            hour,
            minute: capture_u32(&captures, 2),
            second: capture_u32(&captures, 3),
            nanos: fraction_nanos(&captures, 4),
        };
        NaiveTime::from_hms_opt(hour, value.minute.unwrap_or(0), value.second.unwrap_or(0))
            .ok_or_else(|| invalid("time", text))?;
        Ok(value)
    }

    /// The textual form this value was parsed from
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of populated components, from 1 (hour) to 3 (seconds)
    pub fn precision(&self) -> usize {
        1 + usize::from(self.minute.is_some()) + usize::from(self.second.is_some())
    }

    /// Order two values, `None` when their precisions differ
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.precision() != other.precision() {
            return None;
        }
        let key = |t: &Self| (t.hour, t.minute.unwrap_or(0), t.second.unwrap_or(0), t.nanos);
        Some(key(self).cmp(&key(other)))
    }

    /// Equality, `None` when the precisions differ and the shared components
    /// cannot tell the values apart
    pub fn equals(&self, other: &Self) -> Option<bool> {
        if let Some(ordering) = self.compare(other) {
            return Some(ordering == Ordering::Equal);
        }
        let shared = self.precision().min(other.precision());
        let prefix = |t: &Self| [t.hour, t.minute.unwrap_or(0), t.second.unwrap_or(0)];
        if prefix(self)[..shared] != prefix(other)[..shared] {
            Some(false)
        } else {
            None
        }
    }
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Display for PartialTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
