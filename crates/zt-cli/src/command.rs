//! Grammar for the interactive tracking prompt.
//!
//! Each operator line parses into one [`Command`]:
//!
//! - `MM.SS[.LLL] Z`: subject entered zone `Z` (1–9)
//! - `del MM.SS[.LLL] Z`: remove the entry that started there
//! - `print`, `csv`, `overwrite`, `computetime`, `computeentry`, `help`, `exit`
//!
//! The optional millisecond group is read as an integer (`1.30.5` is 5 ms).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use zt_core::{Timestamp, TimestampError, Zone};

/// Pre-compiled regex for event lines, with an optional leading verb.
static EVENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<verb>[a-z]+)\s+)?(?P<min>\d+)\.(?P<sec>\d+)(?:\.(?P<ms>\d*))?\s+(?P<zone>[1-9])$",
    )
    .unwrap()
});

/// One parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Subject entered `zone` at `timestamp`.
    Append { timestamp: Timestamp, zone: Zone },
    /// Remove the entry that started at `timestamp` in `zone`.
    Delete { timestamp: Timestamp, zone: Zone },
    Print,
    Csv,
    Overwrite,
    ComputeTime,
    ComputeEntry,
    Help,
    Exit,
}

/// Why an operator line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    /// The line matches no command.
    Unrecognized(String),
    /// The line has event shape but the time is out of range.
    InvalidTimestamp(TimestampError),
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(line) => write!(f, "not a valid command: '{line}'"),
            Self::InvalidTimestamp(err) => write!(f, "not a valid time: {err}"),
        }
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let unrecognized = || ParseCommandError::Unrecognized(line.to_string());

        if let Some(caps) = EVENT_RE.captures(line) {
            let timestamp = event_timestamp(&caps).ok_or_else(unrecognized)??;
            let zone: Zone = caps["zone"].parse().map_err(|_| unrecognized())?;
            return match caps.name("verb").map(|m| m.as_str()) {
                None => Ok(Self::Append { timestamp, zone }),
                Some("del") => Ok(Self::Delete { timestamp, zone }),
                Some(_) => Err(unrecognized()),
            };
        }

        match line {
            "print" => Ok(Self::Print),
            "csv" => Ok(Self::Csv),
            "overwrite" => Ok(Self::Overwrite),
            "computetime" => Ok(Self::ComputeTime),
            "computeentry" => Ok(Self::ComputeEntry),
            "help" => Ok(Self::Help),
            "exit" => Ok(Self::Exit),
            _ => Err(unrecognized()),
        }
    }
}

/// Builds the timestamp from an event match.
///
/// Returns `None` when a component does not fit in `u32`.
fn event_timestamp(caps: &Captures<'_>) -> Option<Result<Timestamp, ParseCommandError>> {
    let minutes = caps["min"].parse().ok()?;
    let seconds = caps["sec"].parse().ok()?;
    let millis = match caps.name("ms").map(|m| m.as_str()) {
        None | Some("") => 0,
        Some(ms) => ms.parse().ok()?,
    };
    let timestamp = Timestamp::new(minutes, seconds, millis);
    Some(timestamp.map_err(ParseCommandError::InvalidTimestamp))
}

/// Operator help text.
pub const HELP: &str = "\
Zone tracker commands
---------------------
MM.SS[.LLL] Z      subject enters zone Z at MM:SS:LLL (milliseconds optional)
del MM.SS[.LLL] Z  delete the entry that started at that time in zone Z
print              show the session table
csv                save the session table as CSV
overwrite          reload the session from its CSV (after manual correction)
computetime        compute time spent per zone for each 5-minute bin
computeentry       compute zone entries for each 5-minute bin
help               show this guide
exit               save and leave the session
";

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn parses_append_without_millis() {
        assert_eq!(
            "3.07 4".parse::<Command>().unwrap(),
            Command::Append {
                timestamp: ts("03:07:000"),
                zone: 4,
            }
        );
    }

    #[test]
    fn parses_append_with_millis() {
        assert_eq!(
            "12.30.250 9".parse::<Command>().unwrap(),
            Command::Append {
                timestamp: ts("12:30:250"),
                zone: 9,
            }
        );
    }

    #[test]
    fn millis_group_is_an_integer() {
        assert_eq!(
            "1.30.5 2".parse::<Command>().unwrap(),
            Command::Append {
                timestamp: ts("01:30:005"),
                zone: 2,
            }
        );
        assert_eq!(
            "1.30. 2".parse::<Command>().unwrap(),
            Command::Append {
                timestamp: ts("01:30:000"),
                zone: 2,
            }
        );
    }

    #[test]
    fn parses_delete() {
        assert_eq!(
            "del 0.07 3".parse::<Command>().unwrap(),
            Command::Delete {
                timestamp: ts("00:07:000"),
                zone: 3,
            }
        );
    }

    #[test]
    fn parses_keywords() {
        let cases = [
            ("print", Command::Print),
            ("csv", Command::Csv),
            ("overwrite", Command::Overwrite),
            ("computetime", Command::ComputeTime),
            ("computeentry", Command::ComputeEntry),
            ("help", Command::Help),
            ("  exit  ", Command::Exit),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<Command>().unwrap(), expected, "{input:?}");
        }
    }

    #[test]
    fn rejects_unknown_lines() {
        for input in [
            "",
            "prnt",
            "3.07",
            "3.07 0",
            "3.07 10",
            "3:07 4",
            "add 3.07 4",
            "print 3.07 4",
            "del",
            "PRINT",
        ] {
            assert_eq!(
                input.parse::<Command>(),
                Err(ParseCommandError::Unrecognized(input.trim().to_string())),
                "{input:?}"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_seconds_and_millis() {
        assert_eq!(
            "3.75 4".parse::<Command>(),
            Err(ParseCommandError::InvalidTimestamp(
                TimestampError::SecondsOutOfRange(75)
            ))
        );
        assert_eq!(
            "3.05.1500 4".parse::<Command>(),
            Err(ParseCommandError::InvalidTimestamp(
                TimestampError::MillisOutOfRange(1500)
            ))
        );
    }

    #[test]
    fn rejects_components_too_large_for_u32() {
        assert!(matches!(
            "99999999999.00 1".parse::<Command>(),
            Err(ParseCommandError::Unrecognized(_))
        ));
    }

    #[test]
    fn error_messages_are_readable() {
        let err = "bogus".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "not a valid command: 'bogus'");
    }
}
