//! Export command: write all entries as delimited text.
//!
//! One row per entry in `list_entries()` order (most recent first), header
//! `Project,Start,End,Duration (sec),Note`. Start/end render as local
//! timestamps with a UTC offset so the file re-imports unambiguously.
//! Fields containing the delimiter, a quote, or a newline are quoted
//! RFC-4180 style.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use tempo_db::{Database, EntryWithProject};

/// CSV header row, matching the column order of each entry row.
pub const HEADER: &str = "Project,Start,End,Duration (sec),Note";

/// Runs the export command.
pub fn run(db: &Database, output: &Path) -> Result<()> {
    let entries = db.list_entries()?;
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    write_entries(&mut writer, &entries)?;
    writer.flush().context("failed to flush export file")?;
    println!("Exported {} entries to {}", entries.len(), output.display());
    Ok(())
}

/// Writes the header plus one row per entry.
pub fn write_entries<W: Write>(writer: &mut W, entries: &[EntryWithProject]) -> Result<()> {
    writeln!(writer, "{HEADER}")?;
    for entry in entries {
        writeln!(
            writer,
            "{},{},{},{},{}",
            csv_field(&entry.project),
            csv_field(&format_local(entry.started_at)),
            csv_field(&format_local(entry.ended_at)),
            entry.duration_secs,
            csv_field(&entry.note),
        )?;
    }
    Ok(())
}

/// Renders a UTC instant as a local timestamp with offset.
fn format_local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S %z")
        .to_string()
}

/// Quotes a field if it contains the delimiter, a quote, or a newline.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
