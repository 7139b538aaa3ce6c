use aquamon_processor::models::Properties;
use aquamon_processor::normalizer::CoordinateNormalizer;
use aquamon_processor::{RawSensorRecord, RawSeriesPoint, SamplingConfig, SeriesDownsampler};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn series(len: usize) -> Vec<RawSeriesPoint> {
    (0..len)
        .map(|i| {
            let mut fields = Properties::new();
            fields.insert("timestamp".into(), json!(i));
            RawSeriesPoint::new((i % 100) as f64 * 0.1, fields)
        })
        .collect()
}

fn bench_downsample(c: &mut Criterion) {
    let token = CancellationToken::new();
    let mut group = c.benchmark_group("downsample");

    for len in [10_000usize, 100_000, 1_000_000] {
        let points = series(len);
        let sampler = SeriesDownsampler::from_config(&SamplingConfig::new(60)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &points, |b, points| {
            b.iter(|| sampler.downsample(black_box(points), &token).unwrap())
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let token = CancellationToken::new();
    let records: Vec<RawSensorRecord> = (0..50_000)
        .map(|i| {
            let mut props = Properties::new();
            props.insert("id".into(), json!(i));
            RawSensorRecord::new(format!("6.{:03}.{:03}", i % 1000, i % 997), "106.800.000", props)
        })
        .collect();

    c.bench_function("normalize_50k", |b| {
        b.iter(|| {
            CoordinateNormalizer::default()
                .normalize(black_box(records.clone()), &token)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_downsample, bench_normalize);
criterion_main!(benches);
