//! Project management: add and list.

use std::io::Write;

use anyhow::Result;
use tempo_core::ProjectName;

use crate::App;

/// Adds a new project.
pub fn add(app: &App, name: &str) -> Result<()> {
    let name = ProjectName::new(name)?;
    let project = app.add_project(&name)?;
    println!("Added project {} (id {})", project.name, project.id);
    Ok(())
}

/// Lists projects sorted by name.
pub fn list<W: Write>(writer: &mut W, app: &App) -> Result<()> {
    let projects = app.projects()?;
    if projects.is_empty() {
        writeln!(writer, "No projects. Run 'tempo project add <name>'.")?;
        return Ok(());
    }
    for project in projects {
        writeln!(writer, "{:>4}  {}", project.id, project.name)?;
    }
    Ok(())
}
