//! Aggregator service for computing session statistics

use crate::types::{
    AggregateOptions, AggregateResult, CumulativePoint, DaySummary, MonthSummary, PeakDay,
    SessionRecord,
};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Number of ISO weeks covered by the cumulative series
pub const WEEKS_PER_SERIES: u32 = 52;

/// A record paired with the date it is attributed to
type Bucketed<'a> = (NaiveDate, &'a SessionRecord);

/// Aggregator for computing session statistics
pub struct Aggregator;

impl Aggregator {
    /// Aggregate a snapshot of session records.
    ///
    /// Records without a usable date are left out of every total and only
    /// counted in `skipped_records`; they never abort the call.
    pub fn aggregate(records: &[SessionRecord], options: &AggregateOptions) -> AggregateResult {
        let (bucketed, skipped_records) = Self::bucket(records);
        let months = Self::group_by_month(&bucketed);

        // Totals come from the sorted grouping so input order never changes them
        let total_hours: f64 = months.iter().map(|m| m.total_hours).sum();
        let active_days = months.iter().map(|m| m.days.len()).sum::<usize>() as u32;
        let average_hours_per_day = if active_days == 0 {
            0.0
        } else {
            total_hours / active_days as f64
        };

        AggregateResult {
            cumulative_series: Self::cumulative_from_months(&months),
            recent_sessions: Self::most_recent(&bucketed, options.recent_count),
            peak_day: Self::peak_day(&months),
            months,
            total_hours,
            total_sessions: bucketed.len() as u64,
            active_days,
            average_hours_per_day,
            skipped_records,
        }
    }

    /// Date a record is grouped under: the start date when it is well-formed,
    /// otherwise the logged date, otherwise none.
    pub fn bucket_date(record: &SessionRecord) -> Option<NaiveDate> {
        record
            .started_date
            .as_deref()
            .and_then(parse_log_date)
            .or_else(|| parse_log_date(&record.date))
    }

    /// Group records by month and day (both most recent first)
    pub fn monthly(records: &[SessionRecord]) -> Vec<MonthSummary> {
        Self::group_by_month(&Self::bucket(records).0)
    }

    /// Most recent `count` records, newest first
    pub fn recent(records: &[SessionRecord], count: usize) -> Vec<SessionRecord> {
        Self::most_recent(&Self::bucket(records).0, count)
    }

    /// Dense running total of hours over ISO weeks 1..=52
    pub fn weekly_cumulative(records: &[SessionRecord]) -> Vec<CumulativePoint> {
        Self::cumulative_from_months(&Self::monthly(records))
    }

    fn bucket(records: &[SessionRecord]) -> (Vec<Bucketed<'_>>, u64) {
        let mut bucketed = Vec::with_capacity(records.len());
        let mut skipped = 0u64;

        for record in records {
            match Self::bucket_date(record) {
                Some(date) => bucketed.push((date, record)),
                None => {
                    skipped += 1;
                    debug!(
                        date = %record.date,
                        started_date = ?record.started_date,
                        "skipping session without a usable date"
                    );
                }
            }
        }

        (bucketed, skipped)
    }

    fn group_by_month(bucketed: &[Bucketed<'_>]) -> Vec<MonthSummary> {
        // BTreeMap keeps keys ordered; iterate in reverse for most recent first
        let mut by_month: BTreeMap<String, BTreeMap<NaiveDate, Vec<&SessionRecord>>> =
            BTreeMap::new();

        for (date, record) in bucketed {
            by_month
                .entry(date.format("%Y-%m").to_string())
                .or_default()
                .entry(*date)
                .or_default()
                .push(*record);
        }

        by_month
            .into_iter()
            .rev()
            .map(|(month, days)| {
                let days: Vec<DaySummary> = days
                    .into_iter()
                    .rev()
                    .map(|(date, mut sessions)| {
                        // Stable: same start time keeps log order
                        sessions.sort_by(|a, b| b.start_time().cmp(a.start_time()));
                        DaySummary {
                            date,
                            total_hours: sum_hours(sessions.iter().map(|s| s.hours)),
                            sessions: sessions.into_iter().cloned().collect(),
                        }
                    })
                    .collect();

                MonthSummary {
                    month,
                    total_hours: days.iter().map(|d| d.total_hours).sum(),
                    days,
                }
            })
            .collect()
    }

    fn most_recent(bucketed: &[Bucketed<'_>], count: usize) -> Vec<SessionRecord> {
        let mut ordered: Vec<&Bucketed<'_>> = bucketed.iter().collect();
        ordered.sort_by(|(a_date, a), (b_date, b)| {
            (b_date, b.start_time()).cmp(&(a_date, a.start_time()))
        });
        ordered
            .into_iter()
            .take(count)
            .map(|(_, record)| SessionRecord::clone(record))
            .collect()
    }

    fn cumulative_from_months(months: &[MonthSummary]) -> Vec<CumulativePoint> {
        let mut weekly = [0.0_f64; WEEKS_PER_SERIES as usize];

        // Oldest day first so each week is summed in a fixed order
        for day in months.iter().rev().flat_map(|m| m.days.iter().rev()) {
            // Long ISO years have a week 53; it shares the last bucket
            let week = day.date.iso_week().week().min(WEEKS_PER_SERIES);
            weekly[(week - 1) as usize] += day.total_hours;
        }

        let mut running = 0.0;
        (1..=WEEKS_PER_SERIES)
            .zip(weekly)
            .map(|(week, hours)| {
                running += hours;
                CumulativePoint {
                    week,
                    hours,
                    cumulative_hours: running,
                }
            })
            .collect()
    }

    /// Day with the most hours; the earliest day wins ties
    pub fn peak_day(months: &[MonthSummary]) -> Option<PeakDay> {
        let mut peak: Option<PeakDay> = None;
        for day in months.iter().rev().flat_map(|m| m.days.iter().rev()) {
            match &peak {
                Some(p) if day.total_hours <= p.hours => {}
                _ => {
                    peak = Some(PeakDay {
                        date: day.date,
                        hours: day.total_hours,
                    })
                }
            }
        }
        peak
    }
}

/// Sum hours in ascending value order, so the same values give the same total
fn sum_hours(hours: impl Iterator<Item = f64>) -> f64 {
    let mut hours: Vec<f64> = hours.collect();
    hours.sort_by(f64::total_cmp);
    hours.into_iter().sum()
}

/// Parse a strict `YYYY-MM-DD` date. Unpadded or out-of-range dates are rejected.
pub fn parse_log_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
