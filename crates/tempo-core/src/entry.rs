//! Immutable time entry records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::ProjectId;

/// An entry identifier assigned by the persistence store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A completed interval ready to be persisted.
///
/// Produced by the session tracker when a timer stops. The invariants
/// `ended_at >= started_at` and `duration_secs == ended_at - started_at`
/// (truncated to whole seconds) hold by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub project_id: ProjectId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub note: String,
}

/// A persisted, immutable time entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: EntryId,
    pub project_id: ProjectId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub note: String,
}
