//! Track command: the interactive recording loop.
//!
//! This module implements `zt track <SUBJECT> <DAY>`, which opens (or resumes)
//! the session and executes operator commands until `exit` or end of input.
//! Every mutation is flushed to the database before the next prompt.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;
use zt_core::{DeleteOutcome, Session, SessionKey};
use zt_db::Database;

use crate::Config;
use crate::command::{Command, HELP};
use crate::exports::{self, MatrixKind, RenderedMatrix};
use crate::table::{format_matrix, format_session};

const PROMPT: &str = "> ";

/// Arguments for `zt track`.
#[derive(Debug, Clone, Copy, Args)]
pub struct TrackArgs {
    /// Subject identifier.
    pub subject: u32,

    /// Training day.
    pub day: u32,
}

impl TrackArgs {
    pub const fn key(&self) -> SessionKey {
        SessionKey::new(self.subject, self.day)
    }
}

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// An open session bound to its store and export settings.
pub struct Tracker<'a> {
    db: &'a mut Database,
    config: &'a Config,
    session: Session,
}

impl<'a> Tracker<'a> {
    /// Loads the session for `key`, registering it if it is new.
    pub fn open<W: Write>(
        db: &'a mut Database,
        config: &'a Config,
        key: SessionKey,
        out: &mut W,
    ) -> Result<Self> {
        let session = match db.load_session(key).context("failed to load session")? {
            Some(session) => {
                writeln!(out, "Resuming session {key} ({} entries).", session.len())?;
                session
            }
            None => {
                let session = db.load_or_create(key).context("failed to create session")?;
                writeln!(out, "Started session {key}.")?;
                session
            }
        };
        Ok(Self {
            db,
            config,
            session,
        })
    }

    /// Executes one command, writing operator feedback to `out`.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Append { timestamp, zone } => {
                self.session.append_event(timestamp, zone);
                self.flush()?;
                writeln!(out, "Inputting {timestamp} zone {zone}")?;
            }
            Command::Delete { timestamp, zone } => {
                match self.session.delete_event(timestamp, zone) {
                    DeleteOutcome::NotFound => {
                        writeln!(out, "Entry not in table. Please try again.")?;
                    }
                    DeleteOutcome::Removed { removed, reopened } => {
                        self.flush()?;
                        writeln!(
                            out,
                            "Deleted {timestamp} zone {zone} ({removed} removed, {reopened} reopened)"
                        )?;
                    }
                }
            }
            Command::Print => {
                write!(out, "{}", format_session(self.session.records()))?;
            }
            Command::Csv => {
                self.flush()?;
                let path = exports::export_session(&self.config.export_dir, &self.session)?;
                writeln!(out, "Wrote {}", path.display())?;
            }
            Command::Overwrite => self.overwrite(out)?,
            Command::ComputeTime => self.compute(MatrixKind::Time, out)?,
            Command::ComputeEntry => self.compute(MatrixKind::Entry, out)?,
            Command::Help => write!(out, "{HELP}")?,
            Command::Exit => {
                self.flush()?;
                writeln!(out, "Exiting session...")?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Flushes the session to the database.
    pub fn flush(&mut self) -> Result<()> {
        self.db
            .save_session(&self.session)
            .with_context(|| format!("failed to save session {}", self.session.key()))
    }

    fn overwrite<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let key = self.session.key();
        match exports::import_session(&self.config.export_dir, key) {
            Ok(records) => {
                let count = records.len();
                self.session.replace_records(records);
                self.flush()?;
                writeln!(out, "Reloaded {count} entries from the CSV export.")?;
            }
            Err(err) => {
                tracing::warn!(%key, error = %format!("{err:#}"), "overwrite failed");
                writeln!(out, "Could not reload session: {err:#}")?;
                writeln!(out, "Session unchanged.")?;
            }
        }
        Ok(())
    }

    fn compute<W: Write>(&self, kind: MatrixKind, out: &mut W) -> Result<()> {
        let matrix = RenderedMatrix::compute(
            kind,
            self.session.records(),
            &self.config.aggregation(),
        );
        write!(out, "{}", format_matrix(&matrix))?;
        let path = exports::export_matrix(&self.config.export_dir, self.session.key(), &matrix)?;
        writeln!(out, "Wrote {}", path.display())?;
        Ok(())
    }
}

/// Runs the track command, reading operator lines from `input`.
pub fn run<R: BufRead, W: Write>(
    db: &mut Database,
    config: &Config,
    args: TrackArgs,
    mut input: R,
    mut out: W,
) -> Result<()> {
    let mut tracker = Tracker::open(db, config, args.key(), &mut out)?;
    writeln!(out, "Type 'help' for commands.")?;

    let mut buf = Vec::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        buf.clear();
        if input
            .read_until(b'\n', &mut buf)
            .context("failed to read input")?
            == 0
        {
            // End of input behaves like exit.
            writeln!(out)?;
            tracker.execute(Command::Exit, &mut out)?;
            break;
        }
        // Undecodable bytes are replaced so the line is reported, not fatal.
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                tracing::debug!(?command, "executing command");
                if tracker.execute(command, &mut out)? == Flow::Exit {
                    break;
                }
            }
            Err(err) => {
                writeln!(out, "{err}. Type 'help' for commands.")?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
