//! CSV exports of sessions and derived matrices.
//!
//! Every file for a session shares the `{subject}_{day}` stem:
//!
//! - `{stem}.csv`: the interval table (`start_time,end_time,zone`)
//! - `{stem}_times.csv`: the time matrix
//! - `{stem}_enters.csv`: the entry matrix
//!
//! The interval table doubles as the manual-correction path: an operator may
//! edit it and reload it with `overwrite`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use zt_core::{
    AggregationConfig, IntervalRecord, Session, SessionKey, ZONES, ZoneMatrix,
    compute_entry_matrix, compute_time_matrix, format_minutes,
};

/// The two derived matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatrixKind {
    /// Time spent per zone and bin.
    Time,
    /// Zone entries per bin.
    Entry,
}

impl MatrixKind {
    const fn file_suffix(self) -> &'static str {
        match self {
            Self::Time => "times",
            Self::Entry => "enters",
        }
    }
}

/// A matrix cell rendered as text.
pub trait MatrixCell: Copy + Default {
    fn render(self) -> String;
}

impl MatrixCell for f64 {
    fn render(self) -> String {
        format_minutes(self)
    }
}

impl MatrixCell for usize {
    fn render(self) -> String {
        self.to_string()
    }
}

/// A derived matrix with every cell rendered, ready for display or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMatrix {
    pub kind: MatrixKind,
    /// One `(bin label, cells)` pair per bin, cells in zone order.
    pub rows: Vec<(String, Vec<String>)>,
}

impl RenderedMatrix {
    fn from_matrix<T: MatrixCell>(kind: MatrixKind, matrix: &ZoneMatrix<T>) -> Self {
        let rows = matrix
            .rows()
            .map(|(bin, cells)| {
                let cells = cells.iter().map(|c| c.render()).collect();
                (bin.label(), cells)
            })
            .collect();
        Self { kind, rows }
    }

    /// Computes the matrix of `kind` for a session.
    pub fn compute(
        kind: MatrixKind,
        records: &[IntervalRecord],
        config: &AggregationConfig,
    ) -> Self {
        match kind {
            MatrixKind::Time => Self::from_matrix(kind, &compute_time_matrix(records, config)),
            MatrixKind::Entry => Self::from_matrix(kind, &compute_entry_matrix(records, config)),
        }
    }
}

/// Path of the interval table export.
pub fn session_csv_path(dir: &Path, key: SessionKey) -> PathBuf {
    dir.join(format!("{key}.csv"))
}

/// Path of a matrix export.
pub fn matrix_csv_path(dir: &Path, key: SessionKey, kind: MatrixKind) -> PathBuf {
    dir.join(format!("{key}_{}.csv", kind.file_suffix()))
}

/// Writes the interval table as CSV. Open intervals get a blank `end_time`.
pub fn write_session_csv<W: Write>(writer: W, records: &[IntervalRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv.write_record(["start_time", "end_time", "zone"])?;
    }
    for record in records {
        csv.serialize(record)
            .context("failed to write interval record")?;
    }
    csv.flush()?;
    Ok(())
}

/// Reads an interval table written by [`write_session_csv`] (possibly hand-edited).
///
/// Rows are taken as they are; no ordering or open-interval checks are made.
pub fn read_session_csv<R: io::Read>(reader: R) -> Result<Vec<IntervalRecord>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    for (idx, row) in csv.deserialize().enumerate() {
        // Header is line 1.
        let record: IntervalRecord =
            row.with_context(|| format!("invalid row on line {}", idx + 2))?;
        records.push(record);
    }
    Ok(records)
}

/// Writes a matrix as CSV: a header of zone ids, then one row per bin.
pub fn write_matrix_csv<W: Write>(writer: W, matrix: &RenderedMatrix) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let header = std::iter::once(String::new()).chain(ZONES.iter().map(ToString::to_string));
    csv.write_record(header)?;
    for (label, cells) in &matrix.rows {
        csv.write_record(std::iter::once(label).chain(cells))?;
    }
    csv.flush()?;
    Ok(())
}

/// Exports the session's interval table, returning the file written.
pub fn export_session(dir: &Path, session: &Session) -> Result<PathBuf> {
    let path = session_csv_path(dir, session.key());
    let file = create_export(&path)?;
    write_session_csv(file, session.records())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(key = %session.key(), path = %path.display(), "exported session");
    Ok(path)
}

/// Reads back the session's interval table export.
pub fn import_session(dir: &Path, key: SessionKey) -> Result<Vec<IntervalRecord>> {
    let path = session_csv_path(dir, key);
    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let records =
        read_session_csv(file).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::info!(%key, path = %path.display(), records = records.len(), "imported session");
    Ok(records)
}

/// Exports a computed matrix, returning the file written.
pub fn export_matrix(dir: &Path, key: SessionKey, matrix: &RenderedMatrix) -> Result<PathBuf> {
    let path = matrix_csv_path(dir, key, matrix.kind);
    let file = create_export(&path)?;
    write_matrix_csv(file, matrix).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(%key, kind = ?matrix.kind, path = %path.display(), "exported matrix");
    Ok(path)
}

fn create_export(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use std::io::Cursor;
    use zt_core::Timestamp;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn sample_records() -> Vec<IntervalRecord> {
        vec![
            IntervalRecord::closed(ts("00:00:000"), ts("07:00:000"), 3),
            IntervalRecord::closed(ts("07:00:000"), ts("12:00:000"), 3),
            IntervalRecord::open(ts("12:00:000"), 5),
        ]
    }

    fn to_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn session_csv_has_blank_end_for_open_interval() {
        let mut out = Vec::new();
        write_session_csv(&mut out, &sample_records()).unwrap();

        assert_snapshot!(to_string(out), @r"
        start_time,end_time,zone
        00:00:000,07:00:000,3
        07:00:000,12:00:000,3
        12:00:000,,5
        ");
    }

    #[test]
    fn empty_session_csv_keeps_header() {
        let mut out = Vec::new();
        write_session_csv(&mut out, &[]).unwrap();
        assert_eq!(to_string(out), "start_time,end_time,zone\n");
    }

    #[test]
    fn session_csv_reads_back() {
        let mut out = Vec::new();
        write_session_csv(&mut out, &sample_records()).unwrap();

        let records = read_session_csv(Cursor::new(out)).unwrap();
        assert_eq!(records, sample_records());
    }

    #[test]
    fn read_accepts_hand_edited_rows() {
        let input = "start_time, end_time, zone\n00:01:000 , 00:02:500, 4\n00:02:500,,12\n";
        let records = read_session_csv(Cursor::new(input)).unwrap();

        assert_eq!(
            records,
            vec![
                IntervalRecord::closed(ts("00:01:000"), ts("00:02:500"), 4),
                IntervalRecord::open(ts("00:02:500"), 12),
            ]
        );
    }

    #[test]
    fn read_reports_bad_row_line() {
        let input = "start_time,end_time,zone\n00:01:000,00:02:000,4\n1.30,,4\n";
        let err = read_session_csv(Cursor::new(input)).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err:#}");
    }

    #[test]
    fn time_matrix_csv() {
        let matrix = RenderedMatrix::compute(
            MatrixKind::Time,
            &sample_records(),
            &AggregationConfig::default(),
        );
        let mut out = Vec::new();
        write_matrix_csv(&mut out, &matrix).unwrap();

        assert_snapshot!(to_string(out), @r"
        ,1,2,3,4,5,6,7,8,9
        0-5m,00:00:000,00:00:000,05:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000
        5-10m,00:00:000,00:00:000,05:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000
        10-15m,00:00:000,00:00:000,02:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000
        15-20m,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000
        20-25m,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000
        25-30m,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000
        ");
    }

    #[test]
    fn entry_matrix_csv() {
        let matrix = RenderedMatrix::compute(
            MatrixKind::Entry,
            &sample_records(),
            &AggregationConfig::default(),
        );
        let mut out = Vec::new();
        write_matrix_csv(&mut out, &matrix).unwrap();

        assert_snapshot!(to_string(out), @r"
        ,1,2,3,4,5,6,7,8,9
        0-5m,0,0,1,0,0,0,0,0,0
        5-10m,0,0,1,0,0,0,0,0,0
        10-15m,0,0,0,0,0,0,0,0,0
        15-20m,0,0,0,0,0,0,0,0,0
        20-25m,0,0,0,0,0,0,0,0,0
        25-30m,0,0,0,0,0,0,0,0,0
        ");
    }

    #[test]
    fn export_paths_share_session_stem() {
        let dir = Path::new("/data");
        let key = SessionKey::new(7, 2);
        assert_eq!(session_csv_path(dir, key), dir.join("7_2.csv"));
        assert_eq!(
            matrix_csv_path(dir, key, MatrixKind::Time),
            dir.join("7_2_times.csv")
        );
        assert_eq!(
            matrix_csv_path(dir, key, MatrixKind::Entry),
            dir.join("7_2_enters.csv")
        );
    }

    #[test]
    fn export_and_import_session_files() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested");
        let key = SessionKey::new(7, 2);
        let session = Session::with_records(key, sample_records());

        let path = export_session(&dir, &session).unwrap();
        assert_eq!(path, dir.join("7_2.csv"));

        let records = import_session(&dir, key).unwrap();
        assert_eq!(records, sample_records());
    }

    #[test]
    fn import_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let err = import_session(temp.path(), SessionKey::new(1, 1)).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
