//! Append tool: derive the next session log row from a video and the last row
//!
//! The row is computed by [`next_row`] (pure) and written by
//! [`SessionAppender`] under an exclusive file lock.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use fs2::FileExt;
use tracing::{info, warn};

use crate::parsers::{RawSessionRow, SessionLogParser};
use crate::services::formatting::round2;
use crate::services::metadata::{extract_video_id, VideoMetadata, VideoMetadataResolver};
use crate::types::{HourtrackError, Result, SessionRecord, SESSION_LOG_HEADER};

/// Duration assumed when no strategy could find one
pub const DEFAULT_DURATION_SECS: u64 = 3600;

/// Accepted `--end` formats (local time)
const END_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an explicit end time such as `2025-10-23T04:00:00`
pub fn parse_end_time(value: &str) -> Result<NaiveDateTime> {
    END_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| {
            HourtrackError::Parse(format!(
                "Invalid end time '{}'. Use YYYY-MM-DDTHH:MM:SS",
                value
            ))
        })
}

/// Compute the row for a session that ended at `end` and lasted `duration_secs`.
///
/// Cumulative totals continue from `last` (0 and stream 0 for an empty log).
/// Fails when the start time would fall outside the representable range.
pub fn next_row(
    last: Option<&RawSessionRow>,
    duration_secs: u64,
    end: NaiveDateTime,
    url: &str,
) -> Result<SessionRecord> {
    let started = i64::try_from(duration_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|duration| end.checked_sub_signed(duration))
        .ok_or_else(|| {
            HourtrackError::Parse(format!(
                "Video duration of {}s is out of range",
                duration_secs
            ))
        })?;
    let hours = round2(duration_secs as f64 / 3600.0);

    let before = round2(last.map(RawSessionRow::after_hours).unwrap_or(0.0));
    let after = round2(before + hours);
    let stream_number = last.map(RawSessionRow::stream_number).unwrap_or(0) + 1;

    Ok(SessionRecord {
        date: end.format("%Y-%m-%d").to_string(),
        time: end.format("%H:%M:%S").to_string(),
        before: Some(before),
        after: Some(after),
        hours,
        started_date: Some(started.format("%Y-%m-%d").to_string()),
        started_time: Some(started.format("%H:%M:%S").to_string()),
        youtube_link: Some(url.to_string()),
        stream_number: Some(stream_number),
    })
}

/// Appends sessions to a CSV session log
pub struct SessionAppender {
    path: PathBuf,
    resolver: Box<dyn VideoMetadataResolver>,
}

impl SessionAppender {
    pub fn new(path: impl Into<PathBuf>, resolver: Box<dyn VideoMetadataResolver>) -> Self {
        Self {
            path: path.into(),
            resolver,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the video, then append its session ending at `end` (default: now)
    pub fn append(&self, url: &str, end: Option<NaiveDateTime>) -> Result<SessionRecord> {
        if !self.path.exists() {
            return Err(HourtrackError::Config(format!(
                "Session log not found at {}",
                self.path.display()
            )));
        }

        let video_id = extract_video_id(url)?;
        info!(%video_id, "fetching video metadata");
        let metadata = self.resolver.resolve(&video_id)?;
        let duration_secs = Self::duration_or_default(&metadata);

        let end = end.unwrap_or_else(|| Local::now().naive_local());
        self.append_locked(url, duration_secs, end)
    }

    fn duration_or_default(metadata: &VideoMetadata) -> u64 {
        match &metadata.upload_date {
            Some(date) => info!(upload_date = %date, "video upload date"),
            None => warn!(
                today = %Local::now().date_naive(),
                "upload date not found, using today"
            ),
        }

        metadata.duration_seconds.unwrap_or_else(|| {
            warn!("duration not found, assuming 1 hour");
            DEFAULT_DURATION_SECS
        })
    }

    /// Read the last row and append the next one while holding an exclusive lock
    fn append_locked(
        &self,
        url: &str,
        duration_secs: u64,
        end: NaiveDateTime,
    ) -> Result<SessionRecord> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        FileExt::lock_exclusive(&file)?;

        let result = Self::append_to(&file, url, duration_secs, end);

        if let Err(e) = FileExt::unlock(&file) {
            warn!(error = %e, "failed to release session log lock");
        }
        result
    }

    fn append_to(
        mut file: &File,
        url: &str,
        duration_secs: u64,
        end: NaiveDateTime,
    ) -> Result<SessionRecord> {
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let last = SessionLogParser::last_row(content.as_bytes());
        let record = next_row(last.as_ref(), duration_secs, end, url)?;

        if !content.is_empty() && !content.ends_with('\n') {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if content.trim().is_empty() {
            writer.write_record(SESSION_LOG_HEADER)?;
        }
        writer.write_record(record.to_log_fields())?;
        writer.flush()?;

        info!(
            stream_number = ?record.stream_number,
            hours = record.hours,
            "appended session"
        );
        Ok(record)
    }
}
