//! Report command: daily and weekly rollups.
//!
//! Totals cover committed entries only; a running, unstopped timer never
//! counts. "Today" is the local calendar day, "this week" runs from Monday
//! 00:00 local time.

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tempo_core::{Period, format_hms};
use tempo_db::Database;

/// Computed rollup data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub today_secs: i64,
    pub week_secs: i64,
}

/// Generates report data from the database.
pub fn generate_report_data(
    db: &Database,
    today: NaiveDate,
    generated_at: DateTime<Utc>,
) -> Result<ReportData> {
    let today_secs = db.total_for_on(Period::Today, today)?;
    let week_secs = db.total_for_on(Period::ThisWeek, today)?;
    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());

    Ok(ReportData {
        generated_at,
        timezone,
        today_secs,
        week_secs,
    })
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();
    writeln!(output, "Today:     {}", format_hms(data.today_secs)).unwrap();
    writeln!(output, "This week: {}", format_hms(data.week_secs)).unwrap();
    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub timezone: String,
    pub today: JsonTotal,
    pub this_week: JsonTotal,
}

#[derive(Debug, Serialize)]
pub struct JsonTotal {
    pub seconds: i64,
    pub formatted: String,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: data.timezone.clone(),
        today: JsonTotal {
            seconds: data.today_secs,
            formatted: format_hms(data.today_secs),
        },
        this_week: JsonTotal {
            seconds: data.week_secs,
            formatted: format_hms(data.week_secs),
        },
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the report command.
pub fn run(db: &Database, json: bool) -> Result<()> {
    let data = generate_report_data(db, Local::now().date_naive(), Utc::now())?;

    if json {
        println!("{}", format_report_json(&data)?);
    } else {
        print!("{}", format_report(&data));
    }

    Ok(())
}
