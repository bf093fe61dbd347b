//! Group of Pictures partitioning tests.
//!
//! Uses `tests/fixtures/ffprobe_sample.json`: 21 video frames at 50 fps in
//! four GOPs (`IBBBP`, `iBBPB`, `IBBPBB`, `iBBPP`).

use chrono::{DateTime, TimeDelta};
use serde_json::json;
use vviz::{
    CapturedFrameProbe, Frame, FrameProbe, FrameTiming, GroupOfPictures, Rational, Stream, gop,
};

const FFPROBE_SAMPLE: &str = "tests/fixtures/ffprobe_sample.json";

fn sample_stream() -> Stream {
    let response = CapturedFrameProbe::new(FFPROBE_SAMPLE)
        .probe()
        .expect("Failed to read probe fixture");
    Stream::from_probe(&response, 0).expect("Failed to build stream")
}

fn frames(pattern: &[(&str, u8)]) -> Vec<Frame> {
    pattern
        .iter()
        .enumerate()
        .map(|(index, (pict_type, key_frame))| {
            let record = json!({
                "pkt_pts": index as i64 * 40,
                "pkt_size": 1000,
                "key_frame": key_frame,
                "pict_type": pict_type,
                "media_type": "video",
            });
            let timing = FrameTiming::new()
                .with_frame_rate(Rational::from_integer(25))
                .with_time_base(Rational::new(1, 1000).unwrap())
                .with_position(index + 1);
            Frame::parse(record.as_object().unwrap(), timing).unwrap()
        })
        .collect()
}

#[test]
fn fixture_partitions_into_four_gops() {
    let stream = sample_stream();
    let gops = stream.gops();

    let rendered: Vec<String> = gops.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "GOP: IBBBP 5 CLOSED",
            "GOP: iBBPB 5 OPEN",
            "GOP: IBBPBB 6 CLOSED",
            "GOP: iBBPP 5 OPEN",
        ]
    );
    let positions: Vec<usize> = gops.iter().map(GroupOfPictures::position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
}

#[test]
fn gops_cover_every_frame_in_order() {
    let stream = sample_stream();
    let covered: Vec<usize> = stream
        .gops()
        .iter()
        .flat_map(|gop| gop.frames().iter().map(|frame| frame.position().unwrap()))
        .collect();
    assert_eq!(covered, (1..=21).collect::<Vec<_>>());
}

#[test]
fn gop_derived_values() {
    let stream = sample_stream();
    let gops = stream.gops();
    let first = &gops[0];

    assert_eq!(first.len(), 5);
    assert_eq!(first.size(), 617_920);
    assert_eq!(
        first.start_time().unwrap(),
        DateTime::from_timestamp_micros(0).unwrap()
    );
    // Last frame of GOP 1 starts at 0.08 s and lasts 20 ms.
    assert_eq!(
        first.end_time().unwrap(),
        DateTime::from_timestamp_micros(100_000).unwrap()
    );
    assert_eq!(first.duration().unwrap(), TimeDelta::milliseconds(100));
}

#[test]
fn gops_are_recomputed_identically() {
    let stream = sample_stream();
    assert_eq!(stream.gops(), stream.gops());
}

#[test]
fn leading_non_intra_frames_form_the_first_gop() {
    let frames = frames(&[("B", 0), ("P", 0), ("I", 1), ("B", 0)]);
    let gops = gop::partition(&frames);

    assert_eq!(gops.len(), 2);
    assert_eq!(gops[0].to_string(), "GOP: BP 2 OPEN");
    assert_eq!(gops[1].to_string(), "GOP: IB 2 CLOSED");
}

#[test]
fn every_intra_frame_starts_a_gop() {
    let frames = frames(&[("I", 1), ("I", 0), ("I", 1), ("P", 0)]);
    let gops = gop::partition(&frames);
    assert_eq!(gops.len(), 3);
    assert!(gops[0].is_closed());
    assert!(!gops[1].is_closed());
    assert!(gops[2].is_closed());
}

#[test]
fn empty_input_yields_no_gops() {
    assert!(gop::partition(&[]).is_empty());
}

#[test]
fn empty_gop_has_no_start_time() {
    let gop = GroupOfPictures::new(7);
    assert!(gop.is_empty());
    assert_eq!(gop.size(), 0);
    assert!(matches!(
        gop.start_time(),
        Err(vviz::VvizError::EmptyGroupOfPictures { position: 7 })
    ));
}

#[test]
fn statistics_summarise_lengths() {
    let statistics = sample_stream().gop_statistics();
    assert_eq!(statistics.count, 4);
    assert_eq!(statistics.closed_count, 2);
    assert_eq!(statistics.open_count(), 2);
    assert_eq!(statistics.lengths, vec![5, 5, 6, 5]);
    assert_eq!(statistics.min_length, 5);
    assert_eq!(statistics.max_length, 6);
    assert_eq!(statistics.average_length, 5.25);
}
