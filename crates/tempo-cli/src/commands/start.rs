//! Start command: begin timing a project.

use anyhow::{Context, Result};

use crate::App;

/// Resolves the project by name and starts the timer.
pub fn run(app: &mut App, name: &str) -> Result<()> {
    let project = app
        .db
        .project_by_name(name)?
        .with_context(|| format!("no project named {name:?}; run 'tempo project add {name}'"))?;
    app.start(project.id)?;
    println!("Started timer for {}", project.name);
    Ok(())
}
