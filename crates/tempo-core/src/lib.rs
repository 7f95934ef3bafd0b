//! Core domain logic for the tempo time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Projects and entries: validated names, store-assigned identifiers
//! - Session tracking: the single-active-timer state machine
//! - Rollups: daily/weekly period boundaries and duration formatting

pub mod entry;
pub mod project;
pub mod rollup;
pub mod session;

pub use entry::{EntryDraft, EntryId, TimeEntry};
pub use project::{Project, ProjectId, ProjectName, ValidationError};
pub use rollup::{Period, format_hms, period_bounds};
pub use session::{ActiveSession, SessionError, SessionTracker};
