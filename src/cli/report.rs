//! Plain-text rendering of aggregate results
//!
//! Rendering is stateless: which month/day is expanded comes in as a
//! [`Selection`] owned by the caller.

use std::io::{self, Write};

use chrono::NaiveDate;

use hourtrack::services::aggregator::parse_log_date;
use hourtrack::services::formatting::{format_bar, progress_percent};
use hourtrack::services::{format_hours, month_label};
use hourtrack::types::{AggregateResult, CumulativePoint, DaySummary, SessionRecord};

/// Bar width for day rows and the cumulative chart
const BAR_WIDTH: usize = 20;

/// Smallest day scale so a single short day doesn't fill the bar
const MIN_DAY_SCALE_HOURS: f64 = 3.0;

/// Which month and day are expanded in the month listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// `YYYY-MM`
    pub month: Option<String>,
    pub day: Option<NaiveDate>,
}

impl Selection {
    /// Build from CLI values. A day alone also selects its month.
    pub fn parse(month: Option<&str>, day: Option<&str>) -> Result<Self, String> {
        let day = match day {
            Some(raw) => Some(
                parse_log_date(raw).ok_or_else(|| format!("Invalid day '{}' (YYYY-MM-DD)", raw))?,
            ),
            None => None,
        };

        let month = match month {
            Some(raw) => {
                if parse_log_date(&format!("{}-01", raw)).is_none() {
                    return Err(format!("Invalid month '{}' (YYYY-MM)", raw));
                }
                Some(raw.to_string())
            }
            None => day.map(|d| d.format("%Y-%m").to_string()),
        };

        Ok(Self { month, day })
    }

    fn is_month_expanded(&self, month: &str) -> bool {
        self.month.as_deref() == Some(month)
    }

    /// A selected day only counts inside the expanded month
    fn is_day_expanded(&self, month: &str, day: NaiveDate) -> bool {
        self.is_month_expanded(month) && self.day == Some(day)
    }
}

/// Headline statistics. `unparsed_rows` counts log rows the parser dropped.
pub fn render_summary(
    out: &mut impl Write,
    result: &AggregateResult,
    unparsed_rows: u64,
    goal_hours: f64,
) -> io::Result<()> {
    writeln!(out, "Statistics")?;
    writeln!(
        out,
        "  Total hours     {} / {}h ({}%)",
        result.total_hours.round() as u64,
        goal_hours.round() as u64,
        progress_percent(result.total_hours, goal_hours)
    )?;
    writeln!(out, "  Sessions        {}", result.total_sessions)?;
    writeln!(out, "  Active days     {}", result.active_days)?;
    writeln!(
        out,
        "  Avg hours/day   {}",
        format_hours(result.average_hours_per_day)
    )?;
    if let Some(peak) = &result.peak_day {
        writeln!(
            out,
            "  Peak day        {} ({})",
            peak.date,
            format_hours(peak.hours)
        )?;
    }
    if result.skipped_records > 0 {
        writeln!(
            out,
            "  Skipped         {} session(s) without a valid date",
            result.skipped_records
        )?;
    }
    if unparsed_rows > 0 {
        writeln!(
            out,
            "  Unreadable      {} row(s) with missing or invalid hours",
            unparsed_rows
        )?;
    }
    Ok(())
}

/// Month list, expanding the selected month into days and the selected day into sessions
pub fn render_months(
    out: &mut impl Write,
    result: &AggregateResult,
    selection: &Selection,
) -> io::Result<()> {
    if result.months.is_empty() {
        writeln!(out, "No sessions recorded.")?;
        return Ok(());
    }

    // Shared across months so bars are comparable
    let scale = result.max_day_hours(MIN_DAY_SCALE_HOURS);

    for month in &result.months {
        let expanded = selection.is_month_expanded(&month.month);
        writeln!(
            out,
            "{} {:<16} {} hours",
            if expanded { "▾" } else { "▸" },
            month_label(&month.month),
            month.total_hours.round() as u64
        )?;
        if !expanded {
            continue;
        }

        for day in &month.days {
            let day_expanded = selection.is_day_expanded(&month.month, day.date);
            render_day(out, day, scale, day_expanded)?;
        }
    }
    Ok(())
}

fn render_day(
    out: &mut impl Write,
    day: &DaySummary,
    scale: f64,
    expanded: bool,
) -> io::Result<()> {
    writeln!(
        out,
        "  {} {}  {}  {}",
        if expanded { "▾" } else { "▸" },
        day.date,
        format_bar(day.total_hours, scale, BAR_WIDTH),
        format_hours(day.total_hours)
    )?;
    if !expanded {
        return Ok(());
    }
    for session in &day.sessions {
        writeln!(
            out,
            "      {} → {}  {:>6}  {}",
            session.start_time(),
            session.time,
            format_hours(session.hours),
            recording(session)
        )?;
    }
    Ok(())
}

/// Recent sessions view
pub fn render_recent(out: &mut impl Write, sessions: &[SessionRecord]) -> io::Result<()> {
    writeln!(out, "Recent sessions")?;
    if sessions.is_empty() {
        writeln!(out, "  (none)")?;
        return Ok(());
    }
    for session in sessions {
        writeln!(
            out,
            "  {} {}  {:>6}  {}",
            session.start_date(),
            session.start_time(),
            format_hours(session.hours),
            recording(session)
        )?;
    }
    Ok(())
}

/// Weekly cumulative progress against the goal
pub fn render_cumulative(
    out: &mut impl Write,
    series: &[CumulativePoint],
    goal_hours: f64,
) -> io::Result<()> {
    writeln!(
        out,
        "Cumulative progress (goal {}h)",
        goal_hours.round() as u64
    )?;
    for point in series {
        writeln!(
            out,
            "  W{:02}  {}  {}",
            point.week,
            format_bar(point.cumulative_hours, goal_hours, BAR_WIDTH),
            format_hours(point.cumulative_hours)
        )?;
    }
    Ok(())
}

fn recording(session: &SessionRecord) -> &str {
    session.youtube_link.as_deref().unwrap_or("no recording")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourtrack::services::Aggregator;
    use hourtrack::types::AggregateOptions;

    fn make_record(
        date: &str,
        started_time: &str,
        time: &str,
        hours: f64,
        link: Option<&str>,
    ) -> SessionRecord {
        SessionRecord {
            date: date.to_string(),
            time: time.to_string(),
            before: None,
            after: None,
            hours,
            started_date: Some(date.to_string()),
            started_time: Some(started_time.to_string()),
            youtube_link: link.map(String::from),
            stream_number: None,
        }
    }

    fn sample() -> AggregateResult {
        let records = vec![
            make_record("2025-01-05", "10:00:00", "12:30:00", 2.5, None),
            make_record(
                "2025-01-05",
                "20:00:00",
                "21:00:00",
                1.0,
                Some("https://youtu.be/abcdefghijk"),
            ),
            make_record("2025-02-01", "09:00:00", "12:00:00", 3.0, None),
        ];
        Aggregator::aggregate(&records, &AggregateOptions::default())
    }

    fn rendered(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ========== Selection tests ==========

    #[test]
    fn test_selection_day_implies_month() {
        let selection = Selection::parse(None, Some("2025-01-05")).unwrap();
        assert_eq!(selection.month.as_deref(), Some("2025-01"));
        assert_eq!(selection.day, NaiveDate::from_ymd_opt(2025, 1, 5));
    }

    #[test]
    fn test_selection_rejects_invalid_values() {
        assert!(Selection::parse(Some("January"), None).is_err());
        assert!(Selection::parse(None, Some("2025-1-5")).is_err());
    }

    #[test]
    fn test_selection_day_outside_month_not_expanded() {
        let selection = Selection::parse(Some("2025-02"), Some("2025-01-05")).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert!(!selection.is_day_expanded("2025-01", day));
        assert!(!selection.is_day_expanded("2025-02", day));
    }

    // ========== render_months() tests ==========

    #[test]
    fn test_render_months_collapsed() {
        let out = rendered(|w| render_months(w, &sample(), &Selection::default()));

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("February 2025"));
        assert!(lines[0].ends_with("3 hours"));
        assert!(lines[1].contains("January 2025"));
        assert!(lines[1].ends_with("4 hours"));
    }

    #[test]
    fn test_render_months_expanded_day_lists_sessions() {
        let selection = Selection::parse(None, Some("2025-01-05")).unwrap();

        let out = rendered(|w| render_months(w, &sample(), &selection));

        assert!(out.contains("▾ January 2025"));
        assert!(out.contains("▾ 2025-01-05"));
        assert!(out.contains("3h30"));
        assert!(out.contains("20:00:00 → 21:00:00"));
        assert!(out.contains("https://youtu.be/abcdefghijk"));
        assert!(out.contains("no recording"));
        // Most recent session first
        let evening = out.find("20:00:00").unwrap();
        let morning = out.find("10:00:00").unwrap();
        assert!(evening < morning);
    }

    #[test]
    fn test_render_months_empty() {
        let empty = Aggregator::aggregate(&[], &AggregateOptions::default());
        assert_eq!(
            rendered(|w| render_months(w, &empty, &Selection::default())),
            "No sessions recorded.\n"
        );
    }

    // ========== other renderers ==========

    #[test]
    fn test_render_summary() {
        let out = rendered(|w| render_summary(w, &sample(), 0, 1000.0));

        assert!(out.contains("Total hours     7 / 1000h (1%)"));
        assert!(out.contains("Sessions        3"));
        assert!(out.contains("Active days     2"));
        assert!(out.contains("Avg hours/day   3h15"));
        assert!(out.contains("Peak day        2025-01-05 (3h30)"));
        assert!(!out.contains("Skipped"));
        assert!(!out.contains("Unreadable"));
    }

    #[test]
    fn test_render_summary_reports_dropped_rows() {
        let mut records = vec![make_record("2025-01-05", "10:00:00", "12:00:00", 2.0, None)];
        records.push(SessionRecord {
            started_date: None,
            ..make_record("not-a-date", "10:00:00", "12:00:00", 5.0, None)
        });
        let result = Aggregator::aggregate(&records, &AggregateOptions::default());

        let out = rendered(|w| render_summary(w, &result, 2, 1000.0));

        assert!(out.contains("Skipped         1 session(s) without a valid date"));
        assert!(out.contains("Unreadable      2 row(s) with missing or invalid hours"));
    }

    #[test]
    fn test_render_recent() {
        let result = sample();
        let out = rendered(|w| render_recent(w, &result.recent_sessions));

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("2025-02-01 09:00:00"));
        assert!(lines[2].contains("2025-01-05 20:00:00"));
    }

    #[test]
    fn test_render_recent_empty() {
        assert_eq!(
            rendered(|w| render_recent(w, &[])),
            "Recent sessions\n  (none)\n"
        );
    }

    #[test]
    fn test_render_cumulative_has_every_week() {
        let result = sample();
        let out = rendered(|w| render_cumulative(w, &result.cumulative_series, 1000.0));

        assert_eq!(out.lines().count(), 53);
        assert!(out.contains("W01"));
        assert!(out.contains("W52"));
        assert!(out.lines().last().unwrap().ends_with("6h30"));
    }
}
