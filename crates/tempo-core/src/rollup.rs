//! Daily and weekly rollup boundaries.
//!
//! Totals are computed over committed entries only; a running session never
//! contributes. Boundaries are calendar-based in local time: "today" is the
//! local calendar day, "this week" starts Monday 00:00 local (ISO week).

use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A date predicate for entry rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    ThisWeek,
}

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc(local_date: NaiveDate) -> DateTime<Utc> {
    let midnight = local_date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // DST spring-forward gap at midnight is rare but possible
            // Use 1am local which is guaranteed to exist
            let one_am = local_date.and_time(NaiveTime::from_hms_opt(1, 0, 0).unwrap());
            Local
                .from_local_datetime(&one_am)
                .unwrap()
                .with_timezone(&Utc)
        }
    }
}

/// Half-open `[start, end)` UTC bounds for a period, relative to the given
/// local calendar date.
///
/// `ThisWeek` extends to next Monday; queries "through now" hold because
/// entries never start in the future.
#[must_use]
pub fn period_bounds(period: Period, today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    match period {
        Period::Today => {
            let tomorrow = today + chrono::Duration::days(1);
            (local_midnight_to_utc(today), local_midnight_to_utc(tomorrow))
        }
        Period::ThisWeek => {
            let days_since_monday = today.weekday().num_days_from_monday();
            let monday = today - chrono::Duration::days(i64::from(days_since_monday));
            let next_monday = monday + chrono::Duration::days(7);
            (
                local_midnight_to_utc(monday),
                local_midnight_to_utc(next_monday),
            )
        }
    }
}

/// Formats whole seconds as `HH:MM:SS`.
///
/// Hours widen past two digits as needed; negative values render as zero.
#[must_use]
pub fn format_hms(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
