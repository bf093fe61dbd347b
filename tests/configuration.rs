//! AnalysisOptions tests.

use vviz::{AnalysisOptions, CapturedBoxDump, CapturedFrameProbe, VvizError, analysis};

const FFPROBE_SAMPLE: &str = "tests/fixtures/ffprobe_sample.json";
const MP4DUMP_SAMPLE: &str = "tests/fixtures/mp4dump_sample.json";

// ── AnalysisOptions builder ──────────────────────────────────────

#[test]
fn options_defaults() {
    let options = AnalysisOptions::new();
    assert_eq!(options.stream_position, 0);
    assert_eq!(options.track_id, None);
    assert!(!options.clip_fragments_to_stream);
    assert_eq!(options.bitrate_window, None);
    assert_eq!(options, AnalysisOptions::default());
}

#[test]
fn options_builder_chain() {
    let options = AnalysisOptions::new()
        .with_stream_position(2)
        .with_track_id(7)
        .with_clip_fragments_to_stream(true)
        .with_bitrate_window(25);
    assert_eq!(options.stream_position, 2);
    assert_eq!(options.track_id, Some(7));
    assert!(options.clip_fragments_to_stream);
    assert_eq!(options.bitrate_window, Some(25));
}

// ── Options applied to a run ─────────────────────────────────────

#[test]
fn track_id_option_overrides_the_dump() {
    let analysis = analysis::analyze(
        &CapturedFrameProbe::new(FFPROBE_SAMPLE),
        &CapturedBoxDump::new(MP4DUMP_SAMPLE),
        &AnalysisOptions::new().with_track_id(9),
    )
    .unwrap();
    assert_eq!(analysis.track().id(), Some(9));
}

#[test]
fn stream_position_option_is_checked() {
    let result = analysis::analyze(
        &CapturedFrameProbe::new(FFPROBE_SAMPLE),
        &CapturedBoxDump::new(MP4DUMP_SAMPLE),
        &AnalysisOptions::new().with_stream_position(1),
    );
    assert!(matches!(
        result,
        Err(VvizError::StreamOutOfRange {
            position: 1,
            stream_count: 1
        })
    ));
}
