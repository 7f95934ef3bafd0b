//! Status command: show the running timer and elapsed time.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use tempo_core::format_hms;

use crate::App;

/// Prints the current tracking status.
pub fn run<W: Write>(writer: &mut W, app: &App, db_path: &Path) -> Result<()> {
    run_at(writer, app, db_path, Utc::now())
}

fn run_at<W: Write>(writer: &mut W, app: &App, db_path: &Path, now: DateTime<Utc>) -> Result<()> {
    writeln!(writer, "Tempo status")?;
    writeln!(writer, "Database: {}", db_path.display())?;

    match app.active() {
        None => writeln!(writer, "No timer running.")?,
        Some(active) => {
            let project = app.db.project(active.project_id)?;
            let started_local = active.started_at.with_timezone(&Local);
            writeln!(writer, "Tracking: {}", project.name)?;
            writeln!(
                writer,
                "Started:  {}",
                started_local.format("%Y-%m-%d %H:%M:%S")
            )?;
            writeln!(writer, "Elapsed:  {}", format_hms(app.elapsed_at(now)))?;
        }
    }

    Ok(())
}

/// Re-reads and prints the elapsed time once per second.
///
/// The tick only reads; it never mutates session or store state. Runs until
/// interrupted.
pub fn watch(app: &App) -> Result<()> {
    let Some(active) = app.active() else {
        println!("No timer running.");
        return Ok(());
    };
    let project = app.db.project(active.project_id)?;
    println!("Tracking: {}", project.name);

    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "\rElapsed:  {}", format_hms(app.elapsed()))?;
        stdout.flush()?;
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}
