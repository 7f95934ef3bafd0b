//! Entries command: list recorded entries, most recent first.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tempo_core::format_hms;
use tempo_db::{Database, EntryWithProject};

/// One entry in `--json` output.
#[derive(Debug, Serialize)]
pub struct JsonEntry {
    pub project: String,
    pub start: String,
    pub end: String,
    pub duration_secs: i64,
    pub note: String,
}

/// Runs the entries command.
pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let entries = db.list_entries()?;

    if json {
        let entries: Vec<JsonEntry> = entries
            .iter()
            .map(|entry| JsonEntry {
                project: entry.project.clone(),
                start: entry.started_at.to_rfc3339(),
                end: entry.ended_at.to_rfc3339(),
                duration_secs: entry.duration_secs,
                note: entry.note.clone(),
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No entries recorded.")?;
        return Ok(());
    }
    for entry in &entries {
        writeln!(writer, "{}", format_entry(entry))?;
    }

    Ok(())
}

fn format_entry(entry: &EntryWithProject) -> String {
    format!(
        "{}  {:>9}  {:<20} {}",
        format_local(entry.started_at),
        format_hms(entry.duration_secs),
        entry.project,
        entry.note
    )
}

fn format_local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
