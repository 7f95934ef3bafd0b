//! Application context: one store handle plus the session tracker.
//!
//! All user intents flow through [`App`], which makes the single-active-timer
//! invariant a property of one value instead of ambient process state. The
//! store handle is opened once at startup and released by RAII on the single
//! exit path out of `main`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use tempo_core::{ActiveSession, Project, ProjectId, ProjectName, SessionTracker, TimeEntry};
use tempo_db::Database;

use crate::Config;
use crate::session_file;

/// The application context passed to every operation.
pub struct App {
    pub db: Database,
    session: SessionTracker,
    session_path: PathBuf,
}

impl App {
    /// Opens the store and resumes any checkpointed session.
    pub fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
        let db = Database::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?;
        let session_path = session_file::session_json_path()?;
        let session = SessionTracker::resume(session_file::load(&session_path)?);
        Ok(Self {
            db,
            session,
            session_path,
        })
    }

    /// Builds a context from parts; [`open`](Self::open) is the normal entry
    /// point.
    pub fn new(db: Database, session: SessionTracker, session_path: PathBuf) -> Self {
        Self {
            db,
            session,
            session_path,
        }
    }

    /// Creates a new project.
    pub fn add_project(&self, name: &ProjectName) -> Result<Project> {
        Ok(self.db.create_project(name)?)
    }

    /// All projects, sorted by name.
    pub fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.db.list_projects()?)
    }

    /// Starts the timer for a project that must exist in the store.
    pub fn start(&mut self, project_id: ProjectId) -> Result<Project> {
        self.start_at(project_id, Utc::now())
    }

    /// Starts the timer with an explicit start instant.
    pub fn start_at(&mut self, project_id: ProjectId, now: DateTime<Utc>) -> Result<Project> {
        let project = self.db.project(project_id)?;
        self.session.start_at(project_id, now)?;
        self.checkpoint()?;
        Ok(project)
    }

    /// Stops the running timer, persisting the completed entry.
    ///
    /// The session is cleared only after the store accepts the entry; a
    /// failed insert keeps the timer running.
    pub fn stop(&mut self, note: &str) -> Result<TimeEntry> {
        self.stop_at(note, Utc::now())
    }

    /// Stops the timer against an explicit stop instant.
    pub fn stop_at(&mut self, note: &str, now: DateTime<Utc>) -> Result<TimeEntry> {
        let draft = self.session.complete_at(note, now)?;
        let entry = self.db.insert_entry(&draft)?;
        self.session.clear();
        self.checkpoint()?;
        Ok(entry)
    }

    /// The running session, if any.
    pub fn active(&self) -> Option<&ActiveSession> {
        self.session.current()
    }

    /// Elapsed seconds of the running timer; 0 when idle. Read-only.
    pub fn elapsed(&self) -> i64 {
        self.session.elapsed()
    }

    /// Elapsed seconds relative to an explicit instant.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> i64 {
        self.session.elapsed_at(now)
    }

    fn checkpoint(&self) -> Result<()> {
        match self.session.current() {
            Some(active) => session_file::save(&self.session_path, active),
            None => session_file::clear(&self.session_path),
        }
    }
}
