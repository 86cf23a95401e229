//! Session-relative timestamps with millisecond resolution.
//!
//! A [`Timestamp`] is an offset from the start of a recording session, written
//! as `MM:SS:LLL`. The aggregator works in fractional minutes, so this module
//! also owns the conversions between the two representations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MILLIS_PER_SECOND: u32 = 1_000;
const SECONDS_PER_MINUTE: u32 = 60;
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Added before flooring a millisecond total so binary representation error
/// (e.g. `249.99999999` for an exact 250) does not lose a millisecond.
const MILLIS_EPSILON: f64 = 1e-6;

/// Errors from parsing or constructing a [`Timestamp`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The text was not three colon-separated integers.
    #[error("invalid timestamp '{value}', expected MM:SS:LLL")]
    Format { value: String },

    /// Seconds must be below 60.
    #[error("seconds must be below 60, got {0}")]
    SecondsOutOfRange(u32),

    /// Milliseconds must be below 1000.
    #[error("milliseconds must be below 1000, got {0}")]
    MillisOutOfRange(u32),
}

/// An offset into a session, `minutes:seconds:milliseconds`.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    minutes: u32,
    seconds: u32,
    millis: u32,
}

impl Timestamp {
    /// The session start.
    pub const ZERO: Self = Self {
        minutes: 0,
        seconds: 0,
        millis: 0,
    };

    /// Creates a timestamp after checking the seconds and millisecond ranges.
    pub fn new(minutes: u32, seconds: u32, millis: u32) -> Result<Self, TimestampError> {
        if seconds >= SECONDS_PER_MINUTE {
            return Err(TimestampError::SecondsOutOfRange(seconds));
        }
        if millis >= MILLIS_PER_SECOND {
            return Err(TimestampError::MillisOutOfRange(millis));
        }
        Ok(Self {
            minutes,
            seconds,
            millis,
        })
    }

    pub const fn minutes(&self) -> u32 {
        self.minutes
    }

    pub const fn seconds(&self) -> u32 {
        self.seconds
    }

    pub const fn millis(&self) -> u32 {
        self.millis
    }

    /// Converts to fractional minutes: `minutes + seconds/60 + millis/60000`.
    pub fn as_minutes(&self) -> f64 {
        f64::from(self.minutes)
            + f64::from(self.seconds) / f64::from(SECONDS_PER_MINUTE)
            + f64::from(self.millis) / MILLIS_PER_MINUTE
    }

    /// Converts fractional minutes back to a timestamp.
    ///
    /// Each component is floored. A millisecond value ending in `99` is a
    /// rounding artifact of the float sums and is bumped to the next hundred,
    /// carrying into seconds and minutes on overflow (`01:59:999` becomes
    /// `02:00:000`). Negative and non-finite values map to [`Self::ZERO`].
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is finite and positive, total fits in u64 for any realistic session"
    )]
    pub fn from_minutes(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }

        let total_ms = value.mul_add(MILLIS_PER_MINUTE, MILLIS_EPSILON).floor() as u64;
        let mut minutes = total_ms / 60_000;
        let mut seconds = (total_ms % 60_000) / u64::from(MILLIS_PER_SECOND);
        let mut millis = total_ms % u64::from(MILLIS_PER_SECOND);

        if millis % 100 == 99 {
            millis += 1;
            if millis == u64::from(MILLIS_PER_SECOND) {
                millis = 0;
                seconds += 1;
                if seconds == u64::from(SECONDS_PER_MINUTE) {
                    seconds = 0;
                    minutes += 1;
                }
            }
        }

        Self {
            minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
            // Both are bounded by the modulo above.
            seconds: seconds as u32,
            millis: millis as u32,
        }
    }
}

/// Formats fractional minutes as `MM:SS:LLL`.
pub fn format_minutes(value: f64) -> String {
    Timestamp::from_minutes(value).to_string()
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:03}",
            self.minutes, self.seconds, self.millis
        )
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || TimestampError::Format {
            value: s.to_string(),
        };

        let mut parts = s.trim().split(':');
        let (Some(minutes), Some(seconds), Some(millis), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format_err());
        };

        let parse = |part: &str| part.parse::<u32>().map_err(|_| format_err());
        Self::new(parse(minutes)?, parse(seconds)?, parse(millis)?)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}
