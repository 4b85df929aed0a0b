//! CSV session log parser
//!
//! Reads `streaming_sessions.csv` into typed [`SessionRecord`]s. Numeric
//! coercion happens here; date validation is left to the aggregator.
//! A malformed row is logged and skipped, never fatal.

use crate::types::{HourtrackError, Result, SessionRecord};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A session log row as written in the file, before coercion
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawSessionRow {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub started_date: Option<String>,
    #[serde(default)]
    pub started_time: Option<String>,
    #[serde(default)]
    pub youtube_link: Option<String>,
    #[serde(default)]
    pub stream_number: Option<String>,
}

impl RawSessionRow {
    /// Cumulative total recorded after this row; unparsable or missing -> 0
    pub fn after_hours(&self) -> f64 {
        parse_number(&self.after)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Stream sequence number; unparsable or missing -> 0
    pub fn stream_number(&self) -> u32 {
        non_empty(&self.stream_number)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

impl TryFrom<RawSessionRow> for SessionRecord {
    type Error = HourtrackError;

    fn try_from(row: RawSessionRow) -> Result<Self> {
        let hours = match non_empty(&row.hours) {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|_| HourtrackError::Parse(format!("non-numeric hours '{}'", raw)))?,
            None => return Err(HourtrackError::Parse("missing hours".into())),
        };
        if !hours.is_finite() || hours < 0.0 {
            return Err(HourtrackError::Parse(format!("invalid hours '{}'", hours)));
        }

        Ok(SessionRecord {
            date: non_empty(&row.date).unwrap_or_default().to_string(),
            time: non_empty(&row.time).unwrap_or_default().to_string(),
            before: parse_number(&row.before),
            after: parse_number(&row.after),
            hours,
            started_date: non_empty(&row.started_date).map(String::from),
            started_time: non_empty(&row.started_time).map(String::from),
            youtube_link: non_empty(&row.youtube_link).map(String::from),
            stream_number: non_empty(&row.stream_number).and_then(|s| s.parse().ok()),
        })
    }
}

/// Result of parsing a session log
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub records: Vec<SessionRecord>,
    /// Rows that could not be read or coerced
    pub skipped_rows: u64,
}

/// Parser for the CSV session log
pub struct SessionLogParser {
    path: PathBuf,
}

impl SessionLogParser {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the whole log file
    pub fn parse(&self) -> Result<ParsedLog> {
        let file = File::open(&self.path)?;
        Self::parse_reader(file)
    }

    /// Parse a session log from any reader (header row required)
    pub fn parse_reader<R: Read>(reader: R) -> Result<ParsedLog> {
        let mut parsed = ParsedLog::default();

        for (index, row) in Self::rows(reader).enumerate() {
            // Row 1 is the header
            let line = index + 2;
            let raw = match row {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(line, error = %e, "skipping unreadable session row");
                    parsed.skipped_rows += 1;
                    continue;
                }
            };

            match SessionRecord::try_from(raw) {
                Ok(record) => parsed.records.push(record),
                Err(e) => {
                    warn!(line, error = %e, "skipping malformed session row");
                    parsed.skipped_rows += 1;
                }
            }
        }

        Ok(parsed)
    }

    /// Last readable row of a log, uncoerced
    pub fn last_row<R: Read>(reader: R) -> Option<RawSessionRow> {
        Self::rows(reader).filter_map(|r| r.ok()).last()
    }

    fn rows<R: Read>(reader: R) -> impl Iterator<Item = csv::Result<RawSessionRow>> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader)
            .into_deserialize::<RawSessionRow>()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(value: &Option<String>) -> Option<f64> {
    non_empty(value).and_then(|s| s.parse().ok())
}
