//! Throughput of the parse, ingest and tick path

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use stream_rollup::aggregation::WindowedAggregator;
use stream_rollup::record::{parse_record, ParsedRecord, RawRecord};

/// One record every `step_secs` seconds, with every tenth record two minutes late
fn create_stream(len: usize, step_secs: usize) -> Vec<RawRecord> {
    (0..len)
        .map(|i| {
            let mut secs = i * step_secs;
            if i % 10 == 0 {
                secs = secs.saturating_sub(120);
            }
            let (h, m, s) = (secs / 3600 % 24, secs / 60 % 60, secs % 60);
            RawRecord::pair(
                format!("2025-02-10 {:02}:{:02}:{:02}", h, m, s),
                format!("{}.{}", i % 97, i % 13),
            )
        })
        .collect()
}

fn benchmark_parse(c: &mut Criterion) {
    let records = create_stream(1_000, 1);
    let mut group = c.benchmark_group("parse_record");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("1000_records", |b| {
        b.iter(|| {
            for raw in &records {
                black_box(parse_record(black_box(raw)).ok());
            }
        })
    });
    group.finish();
}

fn benchmark_offer(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregator_offer");
    // step sizes set how many minutes stay open at once
    for step_secs in [1usize, 15, 60] {
        let parsed: Vec<ParsedRecord> = create_stream(10_000, step_secs)
            .iter()
            .filter_map(|raw| parse_record(raw).ok())
            .collect();
        group.throughput(Throughput::Elements(parsed.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(step_secs), &parsed, |b, parsed| {
            b.iter(|| {
                let mut agg = WindowedAggregator::new();
                let mut emitted = 0usize;
                for record in parsed {
                    emitted += agg.offer(record).emissions.len();
                }
                black_box(emitted)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_offer);
criterion_main!(benches);
