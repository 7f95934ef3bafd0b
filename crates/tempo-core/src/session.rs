//! Single-active-timer session state machine.
//!
//! At most one session runs system-wide. Starting while a timer runs fails
//! with [`SessionError::AlreadyRunning`]; stopping while idle fails with
//! [`SessionError::NotRunning`]. Completing a session is split into a pure
//! [`SessionTracker::complete_at`] step and an explicit
//! [`SessionTracker::clear`] so callers can persist the resulting entry
//! before the session state is dropped — a failed insert never loses the
//! running timer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::EntryDraft;
use crate::project::ProjectId;

/// Errors from the session state machine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A timer is already running.
    #[error("a timer is already running for project {0}")]
    AlreadyRunning(ProjectId),
    /// No timer is running.
    #[error("no timer is running")]
    NotRunning,
}

/// The transient record of a currently running timer.
///
/// Never persisted to the relational store; both fields are set together or
/// the session does not exist at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub project_id: ProjectId,
    pub started_at: DateTime<Utc>,
}

/// Holds at most one active (project, start instant) pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionTracker {
    active: Option<ActiveSession>,
}

impl SessionTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Rebuilds a tracker from previously checkpointed state.
    #[must_use]
    pub const fn resume(active: Option<ActiveSession>) -> Self {
        Self { active }
    }

    /// The running session, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a timer for the given project.
    pub fn start(&mut self, project_id: ProjectId) -> Result<(), SessionError> {
        self.start_at(project_id, Utc::now())
    }

    /// Starts a timer with an explicit start instant.
    pub fn start_at(
        &mut self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if let Some(active) = &self.active {
            return Err(SessionError::AlreadyRunning(active.project_id));
        }
        self.active = Some(ActiveSession {
            project_id,
            started_at: now,
        });
        tracing::debug!(project_id = project_id.get(), "session started");
        Ok(())
    }

    /// Elapsed whole seconds of the running timer, 0 when idle.
    ///
    /// Pure read with no side effects; safe to poll at any rate for live
    /// display.
    #[must_use]
    pub fn elapsed(&self) -> i64 {
        self.elapsed_at(Utc::now())
    }

    /// Elapsed whole seconds relative to an explicit instant.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> i64 {
        self.active
            .map_or(0, |active| (now - active.started_at).num_seconds().max(0))
    }

    /// Computes the completed interval for the running timer.
    ///
    /// Does not mutate the tracker: persist the returned draft first, then
    /// [`clear`](Self::clear) once the store accepted it.
    pub fn complete(&self, note: impl Into<String>) -> Result<EntryDraft, SessionError> {
        self.complete_at(note, Utc::now())
    }

    /// Computes the completed interval against an explicit stop instant.
    pub fn complete_at(
        &self,
        note: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<EntryDraft, SessionError> {
        let active = self.active.ok_or(SessionError::NotRunning)?;
        // End never precedes start, even across clock adjustments.
        let ended_at = now.max(active.started_at);
        let duration_secs = (ended_at - active.started_at).num_seconds();
        Ok(EntryDraft {
            project_id: active.project_id,
            started_at: active.started_at,
            ended_at,
            duration_secs,
            note: note.into(),
        })
    }

    /// Clears the active session.
    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("session cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(secs_past_hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap() + chrono::Duration::seconds(i64::from(secs_past_hour))
    }

    #[test]
    fn start_records_project_and_instant() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(0)).unwrap();

        let active = tracker.current().unwrap();
        assert_eq!(active.project_id, ProjectId::new(1));
        assert_eq!(active.started_at, instant(0));
        assert!(tracker.is_running());
    }

    #[test]
    fn second_start_fails_and_keeps_first_session() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(0)).unwrap();

        let err = tracker
            .start_at(ProjectId::new(2), instant(10))
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyRunning(ProjectId::new(1)));

        let active = tracker.current().unwrap();
        assert_eq!(active.project_id, ProjectId::new(1));
        assert_eq!(active.started_at, instant(0));
    }

    #[test]
    fn elapsed_is_zero_when_idle() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.elapsed_at(instant(500)), 0);
    }

    #[test]
    fn elapsed_counts_whole_seconds() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(0)).unwrap();

        assert_eq!(tracker.elapsed_at(instant(0)), 0);
        assert_eq!(tracker.elapsed_at(instant(125)), 125);
        // Fractional seconds truncate.
        assert_eq!(
            tracker.elapsed_at(instant(125) + chrono::Duration::milliseconds(900)),
            125
        );
    }

    #[test]
    fn elapsed_clamps_clock_regression_to_zero() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(100)).unwrap();
        assert_eq!(tracker.elapsed_at(instant(50)), 0);
    }

    #[test]
    fn elapsed_is_a_pure_read() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(0)).unwrap();

        let before = tracker;
        for tick in 0..10 {
            let _ = tracker.elapsed_at(instant(tick));
        }
        assert_eq!(tracker, before);
    }

    #[test]
    fn complete_without_start_fails() {
        let tracker = SessionTracker::new();
        let err = tracker.complete_at("note", instant(0)).unwrap_err();
        assert_eq!(err, SessionError::NotRunning);
    }

    #[test]
    fn complete_computes_floored_duration() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(3), instant(0)).unwrap();

        let draft = tracker
            .complete_at(
                "wrote spec",
                instant(125) + chrono::Duration::milliseconds(700),
            )
            .unwrap();
        assert_eq!(draft.project_id, ProjectId::new(3));
        assert_eq!(draft.started_at, instant(0));
        assert_eq!(draft.duration_secs, 125);
        assert_eq!(draft.note, "wrote spec");
    }

    #[test]
    fn complete_clamps_end_to_start() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(100)).unwrap();

        let draft = tracker.complete_at("", instant(40)).unwrap();
        assert_eq!(draft.ended_at, instant(100));
        assert_eq!(draft.duration_secs, 0);
    }

    #[test]
    fn complete_leaves_session_active_until_cleared() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(0)).unwrap();

        let _ = tracker.complete_at("", instant(60)).unwrap();
        assert!(tracker.is_running());

        tracker.clear();
        assert!(!tracker.is_running());
        assert_eq!(tracker.elapsed_at(instant(120)), 0);
    }

    #[test]
    fn start_after_clear_succeeds() {
        let mut tracker = SessionTracker::new();
        tracker.start_at(ProjectId::new(1), instant(0)).unwrap();
        tracker.clear();
        tracker.start_at(ProjectId::new(2), instant(60)).unwrap();
        assert_eq!(tracker.current().unwrap().project_id, ProjectId::new(2));
    }

    #[test]
    fn active_session_serde_roundtrip() {
        let active = ActiveSession {
            project_id: ProjectId::new(7),
            started_at: instant(0),
        };
        let json = serde_json::to_string(&active).unwrap();
        let parsed: ActiveSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, active);
    }

    #[test]
    fn resumed_tracker_keeps_counting() {
        let active = ActiveSession {
            project_id: ProjectId::new(7),
            started_at: instant(0),
        };
        let tracker = SessionTracker::resume(Some(active));
        assert!(tracker.is_running());
        assert_eq!(tracker.elapsed_at(instant(300)), 300);

        let idle = SessionTracker::resume(None);
        assert!(!idle.is_running());
    }
}
