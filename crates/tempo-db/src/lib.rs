//! Storage layer for the tempo time tracker.
//!
//! Provides persistence for projects and time entries using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. The application is single-threaded: one handle is opened at
//! process start and released when it drops on the way out of `main`.
//!
//! # Schema
//!
//! Two relations: `projects` (small, unique names) and `entries`
//! (append-only record of completed intervals). Entries are never updated
//! or deleted once written.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC (e.g.
//! `2025-01-15T10:30:00.000Z`). This format ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use tempo_core::{
    EntryDraft, EntryId, Period, Project, ProjectId, ProjectName, TimeEntry, period_bounds,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A project with the same name already exists.
    #[error("project {name:?} already exists")]
    DuplicateProject { name: String },
    /// The referenced project does not exist.
    #[error("unknown project id {0}")]
    UnknownProject(ProjectId),
    /// Failed to parse a stored entry timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored project name failed validation.
    #[error("invalid stored project name")]
    InvalidName(#[from] tempo_core::ValidationError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A time entry joined with its project name, as listed for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryWithProject {
    pub id: EntryId,
    pub project_id: ProjectId,
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub note: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            -- Entries table: append-only record of completed intervals
            -- start_time/end_time: RFC 3339 UTC
            -- duration: whole seconds, always end - start
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration INTEGER NOT NULL,
                note TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_time);
            CREATE INDEX IF NOT EXISTS idx_entries_project ON entries(project_id);
            ",
        )?;
        Ok(())
    }

    /// Creates a project, failing if the name is already taken.
    ///
    /// Name comparison is exact and case-sensitive (the `UNIQUE` constraint
    /// uses SQLite's default BINARY collation).
    pub fn create_project(&self, name: &ProjectName) -> Result<Project, DbError> {
        let result = self.conn.execute(
            "INSERT INTO projects (name) VALUES (?)",
            params![name.as_str()],
        );
        match result {
            Ok(_) => {
                let id = ProjectId::new(self.conn.last_insert_rowid());
                tracing::debug!(id = id.get(), name = name.as_str(), "project created");
                Ok(Project {
                    id,
                    name: name.clone(),
                })
            }
            Err(err) if is_unique_violation(&err) => Err(DbError::DuplicateProject {
                name: name.as_str().to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists all projects sorted by name ascending.
    pub fn list_projects(&self) -> Result<Vec<Project>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM projects ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut projects = Vec::new();
        for row in rows {
            let (id, name) = row?;
            projects.push(Project {
                id: ProjectId::new(id),
                name: ProjectName::new(name)?,
            });
        }
        Ok(projects)
    }

    /// Looks up a project by id.
    pub fn project(&self, id: ProjectId) -> Result<Project, DbError> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM projects WHERE id = ?",
                params![id.get()],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or(DbError::UnknownProject(id))?;
        Ok(Project {
            id,
            name: ProjectName::new(name)?,
        })
    }

    /// Looks up a project by exact (case-sensitive) name.
    pub fn project_by_name(&self, name: &str) -> Result<Option<Project>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM projects WHERE name = ?",
                params![name],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, name)| {
            Ok(Project {
                id: ProjectId::new(id),
                name: ProjectName::new(name)?,
            })
        })
        .transpose()
    }

    /// Appends a completed interval as an immutable entry.
    pub fn insert_entry(&self, draft: &EntryDraft) -> Result<TimeEntry, DbError> {
        self.ensure_project_exists(draft.project_id)?;
        self.conn.execute(
            "
            INSERT INTO entries (project_id, start_time, end_time, duration, note)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                draft.project_id.get(),
                format_timestamp(draft.started_at),
                format_timestamp(draft.ended_at),
                draft.duration_secs,
                draft.note,
            ],
        )?;
        let id = EntryId::new(self.conn.last_insert_rowid());
        tracing::debug!(
            id = id.get(),
            project_id = draft.project_id.get(),
            duration_secs = draft.duration_secs,
            "entry recorded"
        );
        Ok(TimeEntry {
            id,
            project_id: draft.project_id,
            started_at: draft.started_at,
            ended_at: draft.ended_at,
            duration_secs: draft.duration_secs,
            note: draft.note.clone(),
        })
    }

    fn ensure_project_exists(&self, id: ProjectId) -> Result<(), DbError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?)",
            params![id.get()],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(DbError::UnknownProject(id))
        }
    }

    /// Lists all entries joined with their project name, ordered by start
    /// instant descending (most recent first).
    ///
    /// This ordering is the one the display and export layers rely on.
    pub fn list_entries(&self) -> Result<Vec<EntryWithProject>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT entries.id, entries.project_id, projects.name,
                   entries.start_time, entries.end_time, entries.duration, entries.note
            FROM entries JOIN projects ON entries.project_id = projects.id
            ORDER BY entries.start_time DESC, entries.id DESC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                project_id: row.get(1)?,
                project: row.get(2)?,
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                duration: row.get(5)?,
                note: row.get(6)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let row = row?;
            entries.push(EntryWithProject {
                id: EntryId::new(row.id),
                project_id: ProjectId::new(row.project_id),
                project: row.project,
                started_at: parse_timestamp(&row.start_time, row.id)?,
                ended_at: parse_timestamp(&row.end_time, row.id)?,
                duration_secs: row.duration,
                note: row.note,
            });
        }
        Ok(entries)
    }

    /// Sums entry durations over entries whose start instant falls in
    /// `[start, end)`.
    ///
    /// Returns 0 (not an error) when no entries match.
    pub fn sum_duration_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        if end <= start {
            return Ok(0);
        }
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(duration), 0) FROM entries WHERE start_time >= ? AND start_time < ?",
            params![format_timestamp(start), format_timestamp(end)],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Total seconds for a rollup period, relative to the current local
    /// calendar date.
    ///
    /// Only committed entries count; a running session never contributes.
    pub fn total_for(&self, period: Period) -> Result<i64, DbError> {
        self.total_for_on(period, Local::now().date_naive())
    }

    /// Total seconds for a rollup period, using the provided date as
    /// reference.
    pub fn total_for_on(&self, period: Period, today: NaiveDate) -> Result<i64, DbError> {
        let (start, end) = period_bounds(period, today);
        self.sum_duration_between(start, end)
    }
}

#[derive(Debug)]
struct EntryRow {
    id: i64,
    project_id: i64,
    project: String,
    start_time: String,
    end_time: String,
    duration: i64,
    note: String,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_timestamp(timestamp: &str, entry_id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            entry_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::TimeZone;
    use tempo_core::SessionTracker;

    fn db() -> Database {
        Database::open_in_memory().expect("open in-memory db")
    }

    fn project_named(db: &Database, name: &str) -> Project {
        db.create_project(&ProjectName::new(name).unwrap())
            .expect("create project")
    }

    fn draft(
        project_id: ProjectId,
        started_at: DateTime<Utc>,
        duration_secs: i64,
        note: &str,
    ) -> EntryDraft {
        EntryDraft {
            project_id,
            started_at,
            ended_at: started_at + chrono::Duration::seconds(duration_secs),
            duration_secs,
            note: note.to_string(),
        }
    }

    fn instant(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, h, m, s).unwrap()
    }

    #[test]
    fn open_in_memory_database() {
        assert!(Database::open_in_memory().is_ok());
    }

    #[test]
    fn open_on_disk_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tempo.db");

        let first = Database::open(&path).unwrap();
        project_named(&first, "Alpha");
        drop(first);

        // Re-opening must not touch existing data.
        let second = Database::open(&path).unwrap();
        let projects = second.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name.as_str(), "Alpha");
    }

    #[test]
    fn schema_matches_data_model() {
        let db = db();

        let projects_columns = table_columns(&db.conn, "projects");
        assert_eq!(projects_columns, vec!["id", "name"]);

        let entries_columns = table_columns(&db.conn, "entries");
        assert_eq!(
            entries_columns,
            vec![
                "id",
                "project_id",
                "start_time",
                "end_time",
                "duration",
                "note",
            ]
        );

        let entry_indexes = index_names(&db.conn, "entries");
        let expected: HashSet<String> = ["idx_entries_start", "idx_entries_project"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(expected.is_subset(&entry_indexes));

        let entries_foreign_keys = foreign_keys(&db.conn, "entries");
        assert_eq!(entries_foreign_keys.len(), 1);
        assert_eq!(
            entries_foreign_keys[0],
            (
                "projects".to_string(),
                "project_id".to_string(),
                "id".to_string(),
            )
        );
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    fn foreign_keys(conn: &Connection, table: &str) -> Vec<(String, String, String)> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA foreign_key_list({table})"))
            .expect("prepare foreign_key_list");
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .expect("query foreign_key_list");
        rows.map(|row| row.expect("foreign_key_list row")).collect()
    }

    #[test]
    fn create_project_assigns_distinct_ids() {
        let db = db();
        let alpha = project_named(&db, "Alpha");
        let beta = project_named(&db, "Beta");
        assert_ne!(alpha.id, beta.id);
    }

    #[test]
    fn duplicate_project_name_is_rejected() {
        let db = db();
        project_named(&db, "Alpha");

        let err = db
            .create_project(&ProjectName::new("Alpha").unwrap())
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateProject { name } if name == "Alpha"));

        // Exactly one "Alpha" survives.
        let projects = db.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name.as_str(), "Alpha");
    }

    #[test]
    fn project_names_differing_in_case_are_distinct() {
        let db = db();
        project_named(&db, "Alpha");
        project_named(&db, "alpha");
        assert_eq!(db.list_projects().unwrap().len(), 2);
    }

    #[test]
    fn list_projects_sorted_by_name() {
        let db = db();
        project_named(&db, "gamma");
        project_named(&db, "alpha");
        project_named(&db, "beta");

        let names: Vec<String> = db
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.name.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn project_lookup_by_unknown_id_fails() {
        let db = db();
        let err = db.project(ProjectId::new(99)).unwrap_err();
        assert!(matches!(err, DbError::UnknownProject(id) if id == ProjectId::new(99)));
    }

    #[test]
    fn project_lookup_by_name_is_case_sensitive() {
        let db = db();
        let alpha = project_named(&db, "Alpha");

        let found = db.project_by_name("Alpha").unwrap().unwrap();
        assert_eq!(found, alpha);
        assert!(db.project_by_name("alpha").unwrap().is_none());
    }

    #[test]
    fn insert_entry_with_unknown_project_fails_and_writes_nothing() {
        let db = db();
        let err = db
            .insert_entry(&draft(ProjectId::new(42), instant(10, 0, 0), 60, ""))
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownProject(_)));
        assert!(db.list_entries().unwrap().is_empty());
    }

    #[test]
    fn insert_entry_roundtrips_all_fields() {
        let db = db();
        let alpha = project_named(&db, "Alpha");

        let entry = db
            .insert_entry(&draft(alpha.id, instant(10, 0, 0), 125, "wrote spec"))
            .unwrap();
        assert_eq!(entry.duration_secs, 125);

        let listed = db.list_entries().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, entry.id);
        assert_eq!(listed[0].project, "Alpha");
        assert_eq!(listed[0].started_at, instant(10, 0, 0));
        assert_eq!(listed[0].ended_at, instant(10, 2, 5));
        assert_eq!(listed[0].duration_secs, 125);
        assert_eq!(listed[0].note, "wrote spec");
    }

    #[test]
    fn list_entries_most_recent_first() {
        let db = db();
        let alpha = project_named(&db, "Alpha");
        let beta = project_named(&db, "Beta");

        db.insert_entry(&draft(alpha.id, instant(8, 0, 0), 600, "early"))
            .unwrap();
        db.insert_entry(&draft(beta.id, instant(12, 0, 0), 300, "late"))
            .unwrap();
        db.insert_entry(&draft(alpha.id, instant(10, 0, 0), 900, "middle"))
            .unwrap();

        let entries = db.list_entries().unwrap();
        let notes: Vec<&str> = entries.iter().map(|e| e.note.as_str()).collect();
        assert_eq!(notes, vec!["late", "middle", "early"]);
    }

    #[test]
    fn sum_duration_between_filters_on_start_instant() {
        let db = db();
        let alpha = project_named(&db, "Alpha");

        db.insert_entry(&draft(alpha.id, instant(9, 0, 0), 600, ""))
            .unwrap();
        db.insert_entry(&draft(alpha.id, instant(11, 0, 0), 900, ""))
            .unwrap();
        db.insert_entry(&draft(alpha.id, instant(15, 0, 0), 300, ""))
            .unwrap();

        let total = db
            .sum_duration_between(instant(9, 0, 0), instant(12, 0, 0))
            .unwrap();
        assert_eq!(total, 1500);

        // The window start is inclusive, the end exclusive.
        let total = db
            .sum_duration_between(instant(11, 0, 0), instant(15, 0, 0))
            .unwrap();
        assert_eq!(total, 900);
    }

    #[test]
    fn sum_duration_with_inverted_window_is_zero() {
        let db = db();
        assert_eq!(
            db.sum_duration_between(instant(12, 0, 0), instant(9, 0, 0))
                .unwrap(),
            0
        );
    }

    #[test]
    fn totals_on_fresh_store_are_zero() {
        let db = db();
        let today = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        assert_eq!(db.total_for_on(Period::Today, today).unwrap(), 0);
        assert_eq!(db.total_for_on(Period::ThisWeek, today).unwrap(), 0);
    }

    #[test]
    fn same_day_entries_sum_into_daily_total() {
        let db = db();
        let alpha = project_named(&db, "Alpha");
        let today = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        let (day_start, _) = period_bounds(Period::Today, today);

        db.insert_entry(&draft(
            alpha.id,
            day_start + chrono::Duration::hours(1),
            600,
            "",
        ))
        .unwrap();
        db.insert_entry(&draft(
            alpha.id,
            day_start + chrono::Duration::hours(3),
            900,
            "",
        ))
        .unwrap();

        assert_eq!(db.total_for_on(Period::Today, today).unwrap(), 1500);
        assert_eq!(db.total_for_on(Period::ThisWeek, today).unwrap(), 1500);
    }

    #[test]
    fn previous_day_is_excluded_from_daily_total() {
        let db = db();
        let alpha = project_named(&db, "Alpha");
        let today = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        let (day_start, _) = period_bounds(Period::Today, today);

        db.insert_entry(&draft(alpha.id, day_start - chrono::Duration::hours(2), 600, ""))
            .unwrap();

        assert_eq!(db.total_for_on(Period::Today, today).unwrap(), 0);
        // Jan 28 is in the same ISO week as Jan 29 (Wed).
        assert_eq!(db.total_for_on(Period::ThisWeek, today).unwrap(), 600);
    }

    #[test]
    fn previous_iso_week_is_excluded_even_within_seven_days() {
        let db = db();
        let alpha = project_named(&db, "Alpha");
        // Jan 29, 2025 is a Wednesday; the week starts Monday Jan 27.
        let today = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        let (week_start, _) = period_bounds(Period::ThisWeek, today);

        // Sunday Jan 26: within the last 7 days, but before this Monday.
        db.insert_entry(&draft(
            alpha.id,
            week_start - chrono::Duration::hours(20),
            3600,
            "",
        ))
        .unwrap();

        assert_eq!(db.total_for_on(Period::ThisWeek, today).unwrap(), 0);
    }

    #[test]
    fn stopped_session_lands_first_in_listing_with_floored_duration() {
        let db = db();
        let alpha = project_named(&db, "Alpha");
        let beta = project_named(&db, "Beta");
        db.insert_entry(&draft(beta.id, instant(8, 0, 0), 60, "older"))
            .unwrap();

        let mut tracker = SessionTracker::new();
        tracker.start_at(alpha.id, instant(10, 0, 0)).unwrap();
        let draft = tracker
            .complete_at("wrote spec", instant(10, 2, 5))
            .unwrap();
        let entry = db.insert_entry(&draft).unwrap();
        tracker.clear();

        assert_eq!(entry.duration_secs, 125);
        let listed = db.list_entries().unwrap();
        assert_eq!(listed[0].id, entry.id);
        assert_eq!(listed[0].project, "Alpha");
        assert_eq!(listed[0].note, "wrote spec");
    }
}
