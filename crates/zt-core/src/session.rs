//! Recording sessions and their interval records.
//!
//! A session is the ordered log of zone entries for one subject on one
//! training day. Each entry opens an interval that stays open until the next
//! entry closes it, so the log reads as a chain of `start → end` spans with at
//! most one trailing open record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Zone identifier. The command grammar only produces 1–9.
pub type Zone = u8;

pub const ZONE_COUNT: usize = 9;

/// Zones covered by the derived matrices.
pub const ZONES: [Zone; ZONE_COUNT] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Identifies one subject's session on one training day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub subject: u32,
    pub day: u32,
}

impl SessionKey {
    pub const fn new(subject: u32, day: u32) -> Self {
        Self { subject, day }
    }
}

/// Renders as `{subject}_{day}`, the stem shared by every exported file.
impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.subject, self.day)
    }
}

/// One zone-occupancy span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub start_time: Timestamp,
    /// `None` while the subject is still in the zone.
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    pub zone: Zone,
}

impl IntervalRecord {
    /// A record for an entry that has not been closed yet.
    pub const fn open(start_time: Timestamp, zone: Zone) -> Self {
        Self {
            start_time,
            end_time: None,
            zone,
        }
    }

    pub const fn closed(start_time: Timestamp, end_time: Timestamp, zone: Zone) -> Self {
        Self {
            start_time,
            end_time: Some(end_time),
            zone,
        }
    }

    pub const fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Result of [`Session::delete_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No record started at that time in that zone. The session is unchanged.
    NotFound,
    /// Matching records were removed.
    Removed {
        /// Number of records removed (normally one).
        removed: usize,
        /// Records whose end pointed at a removed start and are open again.
        reopened: usize,
    },
}

/// The ordered interval log for one [`SessionKey`].
///
/// Records keep insertion order and are never re-sorted. Timestamps are not
/// required to be monotonic and zones are not range-checked; the operator is
/// trusted to enter what was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    key: SessionKey,
    records: Vec<IntervalRecord>,
}

impl Session {
    /// Creates an empty session.
    pub const fn new(key: SessionKey) -> Self {
        Self {
            key,
            records: Vec::new(),
        }
    }

    /// Creates a session from stored records, keeping their order.
    pub const fn with_records(key: SessionKey, records: Vec<IntervalRecord>) -> Self {
        Self { key, records }
    }

    pub const fn key(&self) -> SessionKey {
        self.key
    }

    pub fn records(&self) -> &[IntervalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records without an end time.
    pub fn open_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_open()).count()
    }

    /// Records that the subject entered `zone` at `timestamp`.
    ///
    /// If the last record is open it is closed at `timestamp` (a zero-length
    /// interval when the times are equal), then a new open record is pushed.
    pub fn append_event(&mut self, timestamp: Timestamp, zone: Zone) {
        if let Some(last) = self.records.last_mut().filter(|r| r.is_open()) {
            last.end_time = Some(timestamp);
        }
        self.records.push(IntervalRecord::open(timestamp, zone));
        tracing::debug!(key = %self.key, %timestamp, zone, "appended event");
    }

    /// Removes the event that started at `timestamp` in `zone`.
    ///
    /// Any record whose end time equals the removed start is reopened, so
    /// deleting the latest entry hands the "current" interval back to the
    /// previous one.
    pub fn delete_event(&mut self, timestamp: Timestamp, zone: Zone) -> DeleteOutcome {
        let before = self.records.len();
        self.records
            .retain(|r| !(r.start_time == timestamp && r.zone == zone));
        let removed = before - self.records.len();
        if removed == 0 {
            return DeleteOutcome::NotFound;
        }

        let mut reopened = 0;
        for record in &mut self.records {
            if record.end_time == Some(timestamp) {
                record.end_time = None;
                reopened += 1;
            }
        }

        let open = self.open_count();
        if open > 1 {
            tracing::warn!(key = %self.key, open, "session has more than one open interval");
        }
        tracing::debug!(key = %self.key, %timestamp, zone, removed, reopened, "deleted event");

        DeleteOutcome::Removed { removed, reopened }
    }

    /// Replaces every record, e.g. after a manual edit of the CSV export.
    pub fn replace_records(&mut self, records: Vec<IntervalRecord>) {
        self.records = records;
    }
}
