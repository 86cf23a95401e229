//! Core domain logic for the zone tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Timestamps: `MM:SS:LLL` session offsets and fractional-minute conversion
//! - Sessions: the ordered interval log and its append/delete rules
//! - Aggregation: time-in-zone and zone-entry matrices over 5-minute bins

mod aggregation;
pub mod session;
pub mod timestamp;

pub use aggregation::{
    AggregationConfig, BIN_COUNT, BIN_WIDTH_MINUTES, BINS, Bin, EntryMatrix, OpenIntervalPolicy,
    TimeMatrix, ZoneMatrix, compute_entry_matrix, compute_time_matrix,
};
pub use session::{DeleteOutcome, IntervalRecord, Session, SessionKey, ZONE_COUNT, ZONES, Zone};
pub use timestamp::{Timestamp, TimestampError, format_minutes};
