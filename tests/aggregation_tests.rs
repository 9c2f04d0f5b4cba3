use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use stream_rollup::aggregation::{AggregatorConfig, ReferenceClock, WindowedAggregator};
use stream_rollup::pipeline::{CollectingSink, PipelineConfig, StreamPipeline};
use stream_rollup::record::{parse_record, MinuteKey, RawRecord, RejectionKind};

fn sample_stream() -> Vec<RawRecord> {
    [
        ("2025-02-10 5:47:10", "0.001025318456"),
        ("2025-02-10 5:38:00", "0.001025318456"),
        ("2025-02-10 6:16:00", "0.4645070349"),
        ("2025-02-10 5:47:10", "0.001025318456"),
        ("2025-02-10 6:11:00", "0.240809372"),
        ("2025-02-10 5:47:25", "0.001025318456"),
        ("2025-02-10 5:51:00", "0.001025318456"),
        ("2025-02-10 6:07:00", "0.2016774278"),
        ("2025-02-10 5:55:00", "0.001025318456"),
        ("2025-02-10 5:56:00", "0.001025318456"),
    ]
    .into_iter()
    .map(|(ts, v)| RawRecord::pair(ts, v))
    .collect()
}

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, 10)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn key(h: u32, m: u32) -> MinuteKey {
    MinuteKey::truncate(at(h, m, 0))
}

#[test]
fn test_sample_stream_end_to_end() {
    let config = PipelineConfig::default();
    let mut pipeline = StreamPipeline::new(&config, CollectingSink::new()).unwrap();
    pipeline.run(sample_stream()).unwrap();

    let open: Vec<_> = pipeline.aggregator().open_keys().copied().collect();
    assert_eq!(open, vec![key(6, 11), key(6, 16)]);

    let (stats, sink) = pipeline.finish().unwrap();

    let mut emitted: Vec<(String, String)> = sink
        .emissions
        .iter()
        .map(|e| (e.minute.to_string(), format!("{:.6}", e.average)))
        .collect();
    emitted.sort();

    let expected: Vec<(String, String)> = [
        ("2025-02-10 05:38:00", "0.001025"),
        ("2025-02-10 05:47:00", "0.001025"),
        ("2025-02-10 05:51:00", "0.001025"),
        ("2025-02-10 05:55:00", "0.001025"),
        ("2025-02-10 05:56:00", "0.001025"),
        ("2025-02-10 06:07:00", "0.201677"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(emitted, expected);

    // the two repeats of 05:47 arrive after that minute closed
    assert_eq!(stats.rejected(RejectionKind::LateRecord), 2);
    assert_eq!(stats.accepted, 8);
    assert_eq!(stats.left_open, 2);
}

#[test]
fn test_sample_stream_emission_order() {
    let mut pipeline = StreamPipeline::new(&PipelineConfig::default(), CollectingSink::new()).unwrap();
    pipeline.run(sample_stream()).unwrap();

    let lines: Vec<String> = pipeline
        .sink()
        .emissions
        .iter()
        .map(|e| e.to_string())
        .collect();
    assert_eq!(
        lines,
        vec![
            "2025-02-10 05:38:00: Average = 0.001025",
            "2025-02-10 05:47:00: Average = 0.001025",
            "2025-02-10 05:51:00: Average = 0.001025",
            "2025-02-10 06:07:00: Average = 0.201677",
            "2025-02-10 05:55:00: Average = 0.001025",
            "2025-02-10 05:56:00: Average = 0.001025",
        ]
    );
}

#[test]
fn test_sample_stream_flush_on_end() {
    let config = PipelineConfig::builder().flush_on_end(true).build().unwrap();
    let mut pipeline = StreamPipeline::new(&config, CollectingSink::new()).unwrap();
    pipeline.run(sample_stream()).unwrap();
    let (stats, sink) = pipeline.finish().unwrap();

    assert_eq!(stats.flushed, 2);
    assert_eq!(stats.left_open, 0);
    let tail: Vec<String> = sink.emissions[6..].iter().map(|e| e.to_string()).collect();
    assert_eq!(
        tail,
        vec![
            "2025-02-10 06:11:00: Average = 0.240809",
            "2025-02-10 06:16:00: Average = 0.464507",
        ]
    );
}

#[test]
fn test_seconds_share_a_bucket() {
    let mut agg = WindowedAggregator::new();
    for (ts, v) in [
        ("2025-02-10 05:47:00", "1.0"),
        ("2025-02-10 05:47:25", "2.0"),
        ("2025-02-10 05:47:59", "6.0"),
    ] {
        let record = parse_record(&RawRecord::pair(ts, v)).unwrap();
        assert!(agg.offer(&record).emissions.is_empty());
    }
    assert_eq!(agg.open_buckets(), 1);

    let emissions = agg.flush();
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].minute, key(5, 47));
    assert_eq!(emissions[0].count, 3);
    assert!((emissions[0].average - 3.0).abs() < 1e-9);
}

#[test]
fn test_first_qualifying_tick_emits() {
    let mut agg = WindowedAggregator::new();
    agg.ingest(key(5, 0), 1.0);

    for minute in 1..=5 {
        assert!(agg.tick(at(5, minute, 0)).is_empty(), "emitted at 05:{:02}", minute);
    }
    assert!(agg.tick(at(5, 5, 30)).len() == 1);
    assert!(agg.tick(at(5, 30, 0)).is_empty());
}

#[test]
fn test_latest_record_clock_on_sample_stream() {
    let config = PipelineConfig::builder()
        .aggregator(AggregatorConfig::default().reference_clock(ReferenceClock::LatestRecord))
        .build()
        .unwrap();
    let mut pipeline = StreamPipeline::new(&config, CollectingSink::new()).unwrap();
    pipeline.run(sample_stream()).unwrap();

    let emitted: Vec<String> = pipeline
        .sink()
        .emissions
        .iter()
        .map(|e| e.minute.to_string())
        .collect();
    assert_eq!(
        emitted,
        vec![
            "2025-02-10 05:38:00",
            "2025-02-10 05:47:00",
            "2025-02-10 05:51:00",
        ]
    );
    assert_eq!(pipeline.aggregator().open_buckets(), 5);
}

#[test]
fn test_custom_buffer() {
    let config = AggregatorConfig::default().buffer_minutes(1);
    let mut agg = WindowedAggregator::with_config(config);
    agg.ingest(key(5, 0), 4.0);
    assert!(agg.tick(at(5, 1, 0)).is_empty());
    assert_eq!(agg.tick(at(5, 1, 1)).len(), 1);
}
