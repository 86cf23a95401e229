//! Interval aggregation into fixed 5-minute bins.
//!
//! Turns a session's interval records into two derived matrices over the first
//! 30 minutes of a session, one row per bin and one column per zone:
//!
//! - time matrix: total minutes spent in the zone during the bin
//! - entry matrix: number of zone entries attributed to the bin
//!
//! # Bin membership
//!
//! For a bin `[lower, upper)` and a record spanning `start → end`, three
//! clauses decide membership:
//!
//! - A: the record lies inside the bin (`start >= lower && end < upper`)
//! - B: the record is still ongoing at the upper bound (`start < upper && end >= upper`)
//! - C: the record reaches the lower bound from before (`start < lower && end >= lower`)
//!
//! The time matrix sums overlap over records matching A, B or C. The entry
//! matrix counts records matching A or B, so a record is counted in the bin
//! where it starts, or in every bin whose upper bound it spans.

use serde::{Deserialize, Serialize};

use crate::session::{IntervalRecord, ZONE_COUNT, ZONES, Zone};

/// Width of every bin in minutes.
pub const BIN_WIDTH_MINUTES: u32 = 5;

/// Number of bins; together they cover minutes `[0, 30)`.
pub const BIN_COUNT: usize = 6;

const WINDOW_END_MINUTES: f64 = 30.0;

/// A half-open window `[lower, upper)` in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bin {
    pub lower: u32,
    pub upper: u32,
}

impl Bin {
    /// Row label, e.g. `0-5m`.
    pub fn label(&self) -> String {
        format!("{}-{}m", self.lower, self.upper)
    }
}

/// The six bins in row order.
pub const BINS: [Bin; BIN_COUNT] = {
    let mut bins = [Bin { lower: 0, upper: 0 }; BIN_COUNT];
    let mut i = 0;
    let mut lower = 0;
    while i < BIN_COUNT {
        bins[i] = Bin {
            lower,
            upper: lower + BIN_WIDTH_MINUTES,
        };
        lower += BIN_WIDTH_MINUTES;
        i += 1;
    }
    bins
};

/// How records without an end time take part in aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenIntervalPolicy {
    /// Open records contribute nothing to either matrix.
    #[default]
    Exclude,
    /// Open records are treated as ending at minute 30.
    CloseAtWindowEnd,
}

/// Configuration for interval aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Handling of the still-open interval. Default: exclude it.
    #[serde(default)]
    pub open_intervals: OpenIntervalPolicy,
}

/// A bin × zone table.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMatrix<T> {
    cells: [[T; ZONE_COUNT]; BIN_COUNT],
}

/// Minutes spent per bin and zone.
pub type TimeMatrix = ZoneMatrix<f64>;

/// Entries counted per bin and zone.
pub type EntryMatrix = ZoneMatrix<usize>;

impl<T: Copy + Default> ZoneMatrix<T> {
    fn new() -> Self {
        Self {
            cells: [[T::default(); ZONE_COUNT]; BIN_COUNT],
        }
    }

    /// Cell for the bin at `bin_index` and `zone`, or `None` when either is
    /// outside the matrix.
    pub fn get(&self, bin_index: usize, zone: Zone) -> Option<T> {
        let column = zone_column(zone)?;
        self.cells.get(bin_index).map(|row| row[column])
    }

    /// Rows in bin order, each holding one cell per zone in [`ZONES`] order.
    pub fn rows(&self) -> impl Iterator<Item = (Bin, &[T; ZONE_COUNT])> {
        BINS.iter().copied().zip(self.cells.iter())
    }

    /// Sum of one zone's column.
    pub fn zone_total(&self, zone: Zone) -> Option<T>
    where
        T: std::iter::Sum<T>,
    {
        let column = zone_column(zone)?;
        Some(self.cells.iter().map(|row| row[column]).sum())
    }
}

fn zone_column(zone: Zone) -> Option<usize> {
    ZONES.iter().position(|&z| z == zone)
}

/// A record resolved to fractional minutes.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    end: f64,
    zone: Zone,
}

impl Span {
    fn within(&self, lower: f64, upper: f64) -> bool {
        self.start >= lower && self.end < upper
    }

    fn spans_upper(&self, upper: f64) -> bool {
        self.start < upper && self.end >= upper
    }

    fn reaches_lower(&self, lower: f64) -> bool {
        self.start < lower && self.end >= lower
    }

    fn touches(&self, lower: f64, upper: f64) -> bool {
        self.within(lower, upper) || self.spans_upper(upper) || self.reaches_lower(lower)
    }

    /// Minutes of overlap with `[lower, upper)`. Records whose end precedes
    /// their start contribute zero.
    fn overlap(&self, lower: f64, upper: f64) -> f64 {
        (upper.min(self.end) - lower.max(self.start)).max(0.0)
    }
}

fn spans(records: &[IntervalRecord], config: &AggregationConfig) -> Vec<Span> {
    records
        .iter()
        .filter_map(|record| {
            let end = match (record.end_time, config.open_intervals) {
                (Some(end), _) => end.as_minutes(),
                (None, OpenIntervalPolicy::Exclude) => return None,
                (None, OpenIntervalPolicy::CloseAtWindowEnd) => WINDOW_END_MINUTES,
            };
            Some(Span {
                start: record.start_time.as_minutes(),
                end,
                zone: record.zone,
            })
        })
        .collect()
}

/// Runs `cell` for every (bin, zone) pair with the spans in that zone.
fn aggregate<T, F>(spans: &[Span], mut cell: F) -> ZoneMatrix<T>
where
    T: Copy + Default,
    F: FnMut(&[&Span], f64, f64) -> T,
{
    let mut matrix = ZoneMatrix::new();
    for (column, &zone) in ZONES.iter().enumerate() {
        let in_zone: Vec<&Span> = spans.iter().filter(|s| s.zone == zone).collect();
        for (row, bin) in BINS.iter().enumerate() {
            let lower = f64::from(bin.lower);
            let upper = f64::from(bin.upper);
            matrix.cells[row][column] = cell(&in_zone, lower, upper);
        }
    }
    matrix
}

/// Computes the minutes spent in each zone during each bin.
///
/// Records outside zones 1–9 are ignored.
pub fn compute_time_matrix(records: &[IntervalRecord], config: &AggregationConfig) -> TimeMatrix {
    let spans = spans(records, config);
    tracing::debug!(
        records = records.len(),
        spans = spans.len(),
        "computing time matrix"
    );

    aggregate(&spans, |in_zone, lower, upper| {
        in_zone
            .iter()
            .filter(|s| s.touches(lower, upper))
            .map(|s| s.overlap(lower, upper))
            .sum()
    })
}

/// Counts zone entries per bin.
///
/// Records outside zones 1–9 are ignored.
pub fn compute_entry_matrix(records: &[IntervalRecord], config: &AggregationConfig) -> EntryMatrix {
    let spans = spans(records, config);
    tracing::debug!(
        records = records.len(),
        spans = spans.len(),
        "computing entry matrix"
    );

    aggregate(&spans, |in_zone, lower, upper| {
        in_zone
            .iter()
            .filter(|s| s.within(lower, upper) || s.spans_upper(upper))
            .count()
    })
}
