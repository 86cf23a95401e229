//! Plain-text tables for the operator terminal.

use std::fmt::Write;

use zt_core::{IntervalRecord, ZONES};

use crate::exports::RenderedMatrix;

/// Formats the interval table, one numbered row per record.
pub fn format_session(records: &[IntervalRecord]) -> String {
    let mut output = String::new();

    if records.is_empty() {
        writeln!(output, "Session is empty.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<3}  {:<10}  {:<10}  zone",
        "#", "start_time", "end_time"
    )
    .unwrap();
    for (idx, record) in records.iter().enumerate() {
        let end = record
            .end_time
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        writeln!(
            output,
            "{idx:<3}  {:<10}  {end:<10}  {}",
            record.start_time.to_string(),
            record.zone
        )
        .unwrap();
    }

    output
}

/// Formats a derived matrix with right-aligned columns sized to their content.
pub fn format_matrix(matrix: &RenderedMatrix) -> String {
    let mut output = String::new();

    let label_width = matrix
        .rows
        .iter()
        .map(|(label, _)| label.len())
        .chain(std::iter::once("bin".len()))
        .max()
        .unwrap_or_default();
    let cell_width = matrix
        .rows
        .iter()
        .flat_map(|(_, cells)| cells.iter().map(String::len))
        .max()
        .unwrap_or(1);

    write!(output, "{:<label_width$}", "bin").unwrap();
    for zone in ZONES {
        write!(output, "  {zone:>cell_width$}").unwrap();
    }
    writeln!(output).unwrap();

    for (label, cells) in &matrix.rows {
        write!(output, "{label:<label_width$}").unwrap();
        for cell in cells {
            write!(output, "  {cell:>cell_width$}").unwrap();
        }
        writeln!(output).unwrap();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use zt_core::{AggregationConfig, Timestamp};

    use crate::exports::MatrixKind;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn sample_records() -> Vec<IntervalRecord> {
        vec![
            IntervalRecord::closed(ts("00:00:000"), ts("03:30:500"), 2),
            IntervalRecord::closed(ts("03:30:500"), ts("06:00:000"), 7),
            IntervalRecord::open(ts("06:00:000"), 2),
        ]
    }

    #[test]
    fn session_table() {
        assert_snapshot!(format_session(&sample_records()), @r"
        #    start_time  end_time    zone
        0    00:00:000   03:30:500   2
        1    03:30:500   06:00:000   7
        2    06:00:000   -           2
        ");
    }

    #[test]
    fn empty_session_table() {
        assert_eq!(format_session(&[]), "Session is empty.\n");
    }

    #[test]
    fn entry_matrix_table() {
        let matrix = RenderedMatrix::compute(
            MatrixKind::Entry,
            &sample_records(),
            &AggregationConfig::default(),
        );

        assert_snapshot!(format_matrix(&matrix), @r"
        bin     1  2  3  4  5  6  7  8  9
        0-5m    0  1  0  0  0  0  1  0  0
        5-10m   0  0  0  0  0  0  0  0  0
        10-15m  0  0  0  0  0  0  0  0  0
        15-20m  0  0  0  0  0  0  0  0  0
        20-25m  0  0  0  0  0  0  0  0  0
        25-30m  0  0  0  0  0  0  0  0  0
        ");
    }

    #[test]
    fn time_matrix_rows_are_aligned() {
        let matrix = RenderedMatrix::compute(
            MatrixKind::Time,
            &sample_records(),
            &AggregationConfig::default(),
        );
        let table = format_matrix(&matrix);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|line| line.len() == lines[0].len()));
        assert!(lines[1].starts_with("0-5m  "));
        assert!(lines[1].contains("03:30:500"));
        assert!(lines[1].contains("01:29:500"));
        assert!(lines[2].contains("01:00:000"));
    }
}
