//! Compute command: derive a matrix for a stored session without the prompt.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;
use zt_core::SessionKey;
use zt_db::Database;

use crate::Config;
use crate::exports::{self, MatrixKind, RenderedMatrix};
use crate::table::format_matrix;

/// Arguments for `zt compute`.
#[derive(Debug, Clone, Copy, Args)]
pub struct ComputeArgs {
    /// Subject identifier.
    pub subject: u32,

    /// Training day.
    pub day: u32,

    /// Which matrix to compute.
    #[arg(long, value_enum, default_value_t = MatrixKind::Time)]
    pub kind: MatrixKind,
}

/// Runs the compute command, printing the table and writing the CSV export.
pub fn run<W: Write>(db: &Database, config: &Config, args: ComputeArgs, mut out: W) -> Result<()> {
    let key = SessionKey::new(args.subject, args.day);
    let Some(session) = db.load_session(key).context("failed to load session")? else {
        bail!(
            "no session stored for subject {} day {}",
            args.subject,
            args.day
        );
    };

    let matrix = RenderedMatrix::compute(args.kind, session.records(), &config.aggregation());
    write!(out, "{}", format_matrix(&matrix))?;
    let path = exports::export_matrix(&config.export_dir, key, &matrix)?;
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use zt_core::{OpenIntervalPolicy, Session};

    fn test_config(temp: &TempDir, open_intervals: OpenIntervalPolicy) -> Config {
        Config {
            database_path: temp.path().join("zt.db"),
            export_dir: temp.path().join("exports"),
            open_intervals,
        }
    }

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let mut session = Session::new(SessionKey::new(1, 2));
        session.append_event("00:00:000".parse().unwrap(), 4);
        session.append_event("27:00:000".parse().unwrap(), 6);
        db.save_session(&session).unwrap();
        db
    }

    fn args(kind: MatrixKind) -> ComputeArgs {
        ComputeArgs {
            subject: 1,
            day: 2,
            kind,
        }
    }

    #[test]
    fn test_missing_session_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp, OpenIntervalPolicy::Exclude);
        let db = Database::open_in_memory().unwrap();

        let result = run(&db, &config, args(MatrixKind::Time), Vec::new());
        assert_eq!(
            result.unwrap_err().to_string(),
            "no session stored for subject 1 day 2"
        );
    }

    #[test]
    fn test_exports_time_matrix() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp, OpenIntervalPolicy::Exclude);
        let db = seeded_db();

        let mut out = Vec::new();
        run(&db, &config, args(MatrixKind::Time), &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        let path = config.export_dir.join("1_2_times.csv");
        assert!(output.ends_with(&format!("Wrote {}\n", path.display())));
        let contents = std::fs::read_to_string(path).unwrap();
        let last = contents.lines().last().unwrap();
        assert_eq!(
            last,
            "25-30m,00:00:000,00:00:000,00:00:000,02:00:000,00:00:000,00:00:000,00:00:000,00:00:000,00:00:000"
        );
    }

    #[test]
    fn test_close_at_window_end_counts_open_interval() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp, OpenIntervalPolicy::CloseAtWindowEnd);
        let db = seeded_db();

        run(&db, &config, args(MatrixKind::Time), Vec::new()).unwrap();

        let path = config.export_dir.join("1_2_times.csv");
        let contents = std::fs::read_to_string(path).unwrap();
        let last = contents.lines().last().unwrap();
        assert_eq!(
            last,
            "25-30m,00:00:000,00:00:000,00:00:000,02:00:000,00:00:000,03:00:000,00:00:000,00:00:000,00:00:000"
        );
    }
}
