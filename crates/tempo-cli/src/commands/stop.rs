//! Stop command: record the running timer as an entry.

use anyhow::Result;
use tempo_core::format_hms;

use crate::App;

/// Stops the timer and reports the recorded entry.
pub fn run(app: &mut App, note: &str) -> Result<()> {
    let entry = app.stop(note)?;
    let project = app.db.project(entry.project_id)?;
    println!(
        "Recorded {} on {}",
        format_hms(entry.duration_secs),
        project.name
    );
    Ok(())
}
