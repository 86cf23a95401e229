//! Sessions command for listing stored sessions.
//!
//! This module implements `zt sessions`, which shows every subject/day pair
//! in the store with its entry count and last flush time.

use std::fmt::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use zt_db::{Database, SessionSummary};

/// Session data for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub subject: u32,
    pub day: u32,
    pub entries: usize,
    pub open: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SessionSummary> for SessionEntry {
    fn from(summary: SessionSummary) -> Self {
        Self {
            subject: summary.key.subject,
            day: summary.key.day,
            entries: summary.record_count,
            open: summary.open_count,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }
}

/// Format sessions for human-readable output.
pub fn format_sessions(entries: &[SessionEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No sessions recorded.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'zt track <subject> <day>' to start one.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:>7}  {:>3}  {:>7}  {:>4}  Updated",
        "Subject", "Day", "Entries", "Open"
    )
    .unwrap();
    writeln!(
        output,
        "───────  ───  ───────  ────  ────────────────────────"
    )
    .unwrap();

    for entry in entries {
        writeln!(
            output,
            "{:>7}  {:>3}  {:>7}  {:>4}  {}",
            entry.subject, entry.day, entry.entries, entry.open, entry.updated_at
        )
        .unwrap();
    }

    output
}

/// Format sessions as JSON.
pub fn format_sessions_json(entries: &[SessionEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Runs the sessions command.
pub fn run(db: &Database, json: bool) -> Result<()> {
    let entries: Vec<SessionEntry> = db
        .list_sessions()
        .context("failed to list sessions")?
        .into_iter()
        .map(SessionEntry::from)
        .collect();

    if json {
        println!("{}", format_sessions_json(&entries)?);
    } else {
        print!("{}", format_sessions(&entries));
    }

    Ok(())
}
