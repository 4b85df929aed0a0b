//! Criterion benchmarks for session aggregation

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hourtrack::parsers::SessionLogParser;
use hourtrack::services::Aggregator;
use hourtrack::types::{AggregateOptions, SessionRecord};
use std::hint::black_box;
use std::path::PathBuf;

/// One session per day over `days` days starting 2025-01-01, with a
/// second evening session every third day
fn synthetic_records(days: u32) -> Vec<SessionRecord> {
    let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let mut records = Vec::new();

    for offset in 0..days {
        let date = (start + chrono::Duration::days(offset as i64))
            .format("%Y-%m-%d")
            .to_string();
        let mut push = |started: &str, ended: &str, hours: f64| {
            records.push(SessionRecord {
                date: date.clone(),
                time: ended.to_string(),
                before: None,
                after: None,
                hours,
                started_date: Some(date.clone()),
                started_time: Some(started.to_string()),
                youtube_link: None,
                stream_number: Some(records.len() as u32 + 1),
            });
        };
        push("09:00:00", "11:30:00", 2.5);
        if offset % 3 == 0 {
            push("20:00:00", "21:15:00", 1.25);
        }
    }

    records
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let options = AggregateOptions::default();

    for days in [30u32, 365, 3650] {
        let records = synthetic_records(days);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(days), &records, |b, records| {
            b.iter(|| Aggregator::aggregate(black_box(records), black_box(&options)))
        });
    }

    group.finish();
}

fn bench_parse_fixture(c: &mut Criterion) {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sessions.csv");
    let parser = SessionLogParser::with_path(fixture);

    c.bench_function("parse_fixture", |b| {
        b.iter(|| parser.parse().expect("fixture parses"))
    });
}

criterion_group!(benches, bench_aggregate, bench_parse_fixture);
criterion_main!(benches);
