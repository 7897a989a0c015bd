//! Schedule time handling.
//!
//! Timetables give times as "HH:MM:SS" relative to the midnight that starts
//! the service day. Trips running past midnight keep counting, so "25:10:00"
//! is a valid time. All arithmetic is done on whole seconds so that
//! comparisons during the search are exact.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A point in time, in whole seconds after service-day midnight.
///
/// Negative values only occur transiently in arrive-by searches that walk
/// back past midnight.
///
/// # Examples
///
/// ```
/// use transit_router::domain::Time;
///
/// let t = Time::parse("08:15:30").unwrap();
/// assert_eq!(t.secs(), 8 * 3600 + 15 * 60 + 30);
/// assert_eq!(t.to_string(), "08:15:30");
///
/// // Overnight services count past 24h
/// assert_eq!(Time::parse("25:00:00").unwrap().secs(), 90_000);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(i64);

impl Time {
    /// Service-day midnight.
    pub const ZERO: Time = Time(0);

    /// Create a time from seconds after midnight.
    pub const fn from_secs(secs: i64) -> Self {
        Time(secs)
    }

    /// Create a time from hours, minutes and seconds.
    pub const fn hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Time(hours * 3600 + minutes * 60 + seconds)
    }

    /// Seconds after midnight.
    pub const fn secs(self) -> i64 {
        self.0
    }

    /// Parse "HH:MM:SS" or "HH:MM".
    ///
    /// Hours may have one to three digits and may exceed 23.
    ///
    /// ```
    /// use transit_router::domain::Time;
    ///
    /// assert!(Time::parse("7:05:00").is_ok());
    /// assert!(Time::parse("07:05").is_ok());
    /// assert!(Time::parse("07:60:00").is_err());
    /// assert!(Time::parse("0705").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');
        let hours = parts
            .next()
            .filter(|h| !h.is_empty() && h.len() <= 3)
            .ok_or_else(|| TimeError::new("expected HH:MM[:SS] format"))?;
        let minutes = parts
            .next()
            .ok_or_else(|| TimeError::new("expected HH:MM[:SS] format"))?;
        let seconds = parts.next();
        if parts.next().is_some() {
            return Err(TimeError::new("too many components"));
        }

        let mut h = 0i64;
        for b in hours.bytes() {
            let d = (b as char)
                .to_digit(10)
                .ok_or_else(|| TimeError::new("invalid hour digits"))?;
            h = h * 10 + i64::from(d);
        }

        let m = parse_two_digits(minutes.as_bytes())
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if m > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let sec = match seconds {
            Some(sec) => parse_two_digits(sec.as_bytes())
                .ok_or_else(|| TimeError::new("invalid second digits"))?,
            None => 0,
        };
        if sec > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Time::hms(h, i64::from(m), i64::from(sec)))
    }

    /// Signed number of seconds from `earlier` to `self`.
    pub fn since(self, earlier: Time) -> i64 {
        self.0 - earlier.0
    }
}

impl Add<i64> for Time {
    type Output = Time;

    fn add(self, rhs: i64) -> Time {
        Time(self.0 + rhs)
    }
}

impl Sub<i64> for Time {
    type Output = Time;

    fn sub(self, rhs: i64) -> Time {
        Time(self.0 - rhs)
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time({self})")
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{sign}{:02}:{:02}:{:02}",
            abs / 3600,
            (abs % 3600) / 60,
            abs % 60
        )
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
