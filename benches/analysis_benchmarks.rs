//! Benchmarks for stream assembly, GOP partitioning and report derivation.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features
//!
//! Uses the JSON fixtures under `tests/fixtures/`; the frame list is
//! repeated to get a realistically sized stream.

use std::hint::black_box;

use criterion::Criterion;
use serde_json::{Value, json};
use vviz::{
    AnalysisOptions, BoxNode, BoxProbe, CapturedBoxDump, CapturedFrameProbe, FrameProbe,
    ProbeResponse, Stream, Track, analysis,
};

const FFPROBE_SAMPLE: &str = "tests/fixtures/ffprobe_sample.json";
const MP4DUMP_SAMPLE: &str = "tests/fixtures/mp4dump_sample.json";

/// The fixture frames repeated `copies` times with increasing timestamps.
fn large_response(copies: i64) -> ProbeResponse {
    let sample = CapturedFrameProbe::new(FFPROBE_SAMPLE).probe().unwrap();
    let span = 21 * 200_000;
    let mut frames = Vec::new();
    for copy in 0..copies {
        for record in sample.frames() {
            let mut record = record.clone();
            if let Some(pts) = record.get("pkt_pts").and_then(Value::as_i64) {
                record.insert("pkt_pts".to_string(), json!(pts + copy * span));
            }
            frames.push(record);
        }
    }
    ProbeResponse::new(sample.streams().to_vec(), frames)
}

fn benchmark_stream_assembly(criterion: &mut Criterion) {
    let response = large_response(500);

    criterion.bench_function("assemble stream (10k frames)", |bencher| {
        bencher.iter(|| Stream::from_probe(black_box(&response), 0).unwrap());
    });
}

fn benchmark_gop_partitioning(criterion: &mut Criterion) {
    let stream = Stream::from_probe(&large_response(500), 0).unwrap();

    criterion.bench_function("partition GOPs (10k frames)", |bencher| {
        bencher.iter(|| black_box(&stream).gops().len());
    });
}

fn benchmark_track_reduction(criterion: &mut Criterion) {
    let boxes: Vec<BoxNode> = CapturedBoxDump::new(MP4DUMP_SAMPLE).dump().unwrap();

    criterion.bench_function("reduce box dump into track", |bencher| {
        bencher.iter(|| Track::from_boxes(None, black_box(&boxes)).unwrap());
    });
}

fn benchmark_report(criterion: &mut Criterion) {
    let options = AnalysisOptions::new();
    let analysis = analysis::analyze(
        &large_response(500),
        &CapturedBoxDump::new(MP4DUMP_SAMPLE),
        &options,
    )
    .unwrap();

    criterion.bench_function("derive report (10k frames)", |bencher| {
        bencher.iter(|| analysis.report(black_box(&options)).unwrap());
    });
}

criterion::criterion_group!(
    benches,
    benchmark_stream_assembly,
    benchmark_gop_partitioning,
    benchmark_track_reduction,
    benchmark_report,
);
criterion::criterion_main!(benches);
