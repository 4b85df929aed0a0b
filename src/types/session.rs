//! Session log and aggregate types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of the session log, shared by the parser and the appender
pub const SESSION_LOG_HEADER: [&str; 9] = [
    "date",
    "time",
    "before",
    "after",
    "hours",
    "started_date",
    "started_time",
    "youtube_link",
    "stream_number",
];

/// One logged session (a row of the session log)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Date the session ended / was logged (`YYYY-MM-DD` when well-formed)
    pub date: String,
    /// Time of day the session ended / was logged
    pub time: String,
    /// Cumulative hours before this session, as recorded by the appender
    pub before: Option<f64>,
    /// Cumulative hours after this session, as recorded by the appender
    pub after: Option<f64>,
    /// Session duration in hours (finite, >= 0)
    pub hours: f64,
    pub started_date: Option<String>,
    pub started_time: Option<String>,
    /// Recording link; `None` means no recording is available
    pub youtube_link: Option<String>,
    pub stream_number: Option<u32>,
}

impl SessionRecord {
    /// Date the session started, falling back to the logged date
    pub fn start_date(&self) -> &str {
        self.started_date.as_deref().unwrap_or(&self.date)
    }

    /// Time the session started, falling back to the logged time
    pub fn start_time(&self) -> &str {
        self.started_time.as_deref().unwrap_or(&self.time)
    }

    /// Render the record as session log fields, in `SESSION_LOG_HEADER` order
    pub fn to_log_fields(&self) -> [String; 9] {
        let opt_num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        [
            self.date.clone(),
            self.time.clone(),
            opt_num(self.before),
            opt_num(self.after),
            self.hours.to_string(),
            self.started_date.clone().unwrap_or_default(),
            self.started_time.clone().unwrap_or_default(),
            self.youtube_link.clone().unwrap_or_default(),
            self.stream_number
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ]
    }
}

/// Sessions attributed to one calendar day
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_hours: f64,
    /// Most recent first
    pub sessions: Vec<SessionRecord>,
}

/// Days attributed to one calendar month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthSummary {
    /// `YYYY-MM`
    pub month: String,
    pub total_hours: f64,
    /// Unique dates, most recent first
    pub days: Vec<DaySummary>,
}

/// One ISO week of the cumulative series
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CumulativePoint {
    /// ISO week number, 1..=52
    pub week: u32,
    /// Hours logged in this week
    pub hours: f64,
    /// Hours logged in this week and every week before it
    pub cumulative_hours: f64,
}

/// Day with the most logged hours
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub hours: f64,
}

/// Tunables for a single aggregation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Size of the recent sessions view
    pub recent_count: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { recent_count: 5 }
    }
}

/// Everything the report layer needs, computed in one pass
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateResult {
    /// Most recent month first
    pub months: Vec<MonthSummary>,
    pub total_hours: f64,
    pub total_sessions: u64,
    pub active_days: u32,
    pub average_hours_per_day: f64,
    /// Always `WEEKS_PER_SERIES` entries, week 1 first
    pub cumulative_series: Vec<CumulativePoint>,
    pub recent_sessions: Vec<SessionRecord>,
    /// Records left out because they had no usable date
    pub skipped_records: u64,
    pub peak_day: Option<PeakDay>,
}

impl AggregateResult {
    /// Largest single-day total, never below `floor`.
    /// Used as the shared bar scale across every month.
    pub fn max_day_hours(&self, floor: f64) -> f64 {
        self.months
            .iter()
            .flat_map(|m| m.days.iter())
            .map(|d| d.total_hours)
            .fold(floor, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(date: &str, time: &str, hours: f64) -> SessionRecord {
        SessionRecord {
            date: date.to_string(),
            time: time.to_string(),
            before: None,
            after: None,
            hours,
            started_date: None,
            started_time: None,
            youtube_link: None,
            stream_number: None,
        }
    }

    #[test]
    fn test_start_fields_fall_back_to_logged_fields() {
        let record = make_record("2025-01-05", "21:00:00", 1.0);
        assert_eq!(record.start_date(), "2025-01-05");
        assert_eq!(record.start_time(), "21:00:00");
    }

    #[test]
    fn test_start_fields_prefer_started_values() {
        let mut record = make_record("2025-01-06", "01:00:00", 3.0);
        record.started_date = Some("2025-01-05".into());
        record.started_time = Some("22:00:00".into());
        assert_eq!(record.start_date(), "2025-01-05");
        assert_eq!(record.start_time(), "22:00:00");
    }

    #[test]
    fn test_to_log_fields_full_row() {
        let record = SessionRecord {
            date: "2025-10-23".into(),
            time: "04:00:00".into(),
            before: Some(120.5),
            after: Some(123.0),
            hours: 2.5,
            started_date: Some("2025-10-23".into()),
            started_time: Some("01:30:00".into()),
            youtube_link: Some("https://www.youtube.com/watch?v=abcdefghijk".into()),
            stream_number: Some(42),
        };

        let fields = record.to_log_fields();
        assert_eq!(
            fields,
            [
                "2025-10-23",
                "04:00:00",
                "120.5",
                "123",
                "2.5",
                "2025-10-23",
                "01:30:00",
                "https://www.youtube.com/watch?v=abcdefghijk",
                "42",
            ]
        );
    }

    #[test]
    fn test_to_log_fields_empty_optionals() {
        let fields = make_record("2025-01-05", "21:00:00", 1.0).to_log_fields();
        assert_eq!(fields[2], "");
        assert_eq!(fields[3], "");
        assert_eq!(fields[5], "");
        assert_eq!(fields[7], "");
        assert_eq!(fields[8], "");
    }

    #[test]
    fn test_default_recent_count() {
        assert_eq!(AggregateOptions::default().recent_count, 5);
    }
}
