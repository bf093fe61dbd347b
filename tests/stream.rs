//! Stream assembly tests.

use chrono::TimeDelta;
use serde_json::{Value, json};
use vviz::{
    CapturedFrameProbe, ErrorKind, FrameKind, FrameProbe, ProbeResponse, Rational, Stream,
    StreamDescriptor, VvizError,
};

const FFPROBE_SAMPLE: &str = "tests/fixtures/ffprobe_sample.json";

fn sample_response() -> ProbeResponse {
    CapturedFrameProbe::new(FFPROBE_SAMPLE)
        .probe()
        .expect("Failed to read probe fixture")
}

fn stream_record(index: u32, avg_frame_rate: &str) -> Value {
    json!({
        "index": index,
        "width": 640,
        "height": 360,
        "avg_frame_rate": avg_frame_rate,
        "time_base": "1/90000",
    })
}

fn video_frame(stream_index: u32, pts: i64) -> Value {
    json!({
        "media_type": "video",
        "stream_index": stream_index,
        "pkt_pts": pts,
        "pkt_size": "800",
        "key_frame": 0,
        "pict_type": "P",
    })
}

fn response(value: Value) -> ProbeResponse {
    ProbeResponse::from_value(value).expect("Failed to build probe response")
}

#[test]
fn fixture_stream_properties() {
    let stream = Stream::from_probe(&sample_response(), 0).unwrap();

    assert_eq!(stream.index(), 0);
    assert_eq!((stream.width(), stream.height()), (1280, 720));
    assert_eq!(stream.frame_rate(), Some(Rational::from_integer(50)));
    assert_eq!(stream.time_base(), Rational::new(1, 10_000_000).unwrap());
    assert_eq!(stream.duration(), Some(TimeDelta::milliseconds(420)));
}

#[test]
fn only_video_frames_of_the_stream_are_kept() {
    let response = sample_response();
    assert_eq!(response.frames().len(), 23);

    let stream = Stream::from_probe(&response, 0).unwrap();
    assert_eq!(stream.frames().len(), 21);
    let positions: Vec<usize> = stream.frames().iter().filter_map(|f| f.position()).collect();
    assert_eq!(positions, (1..=21).collect::<Vec<_>>());
}

#[test]
fn frames_inherit_stream_timing() {
    let stream = Stream::from_probe(&sample_response(), 0).unwrap();
    for frame in stream.frames() {
        assert_eq!(frame.frame_rate(), stream.frame_rate());
        assert_eq!(frame.time_base(), Some(stream.time_base()));
    }
}

#[test]
fn type_queries_strict_and_non_strict() {
    let stream = Stream::from_probe(&sample_response(), 0).unwrap();

    assert_eq!(stream.frames_of_kind(FrameKind::I).len(), 4);
    assert_eq!(stream.frames_of_exact_kind(FrameKind::I).len(), 2);
    assert_eq!(stream.frames_of_exact_kind(FrameKind::Idr).len(), 2);
    assert_eq!(stream.frames_of_kind(FrameKind::Idr).len(), 2);
    assert_eq!(stream.frames_of_kind(FrameKind::P).len(), 5);
    assert_eq!(stream.frames_of_kind(FrameKind::B).len(), 12);
}

#[test]
fn stream_position_is_not_the_stream_index() {
    let response = response(json!({
        "streams": [stream_record(1, "25/1")],
        "frames": [video_frame(0, 0), video_frame(1, 3600), video_frame(1, 7200)],
    }));
    let stream = Stream::from_probe(&response, 0).unwrap();
    assert_eq!(stream.index(), 1);
    assert_eq!(stream.frames().len(), 2);
    assert_eq!(stream.frames()[0].pkt_pts(), 3600);
}

#[test]
fn unknown_frame_rate_is_left_unset() {
    let response = response(json!({
        "streams": [stream_record(0, "0/0")],
        "frames": [video_frame(0, 0)],
    }));
    let stream = Stream::from_probe(&response, 0).unwrap();
    assert_eq!(stream.frame_rate(), None);
    assert_eq!(stream.duration(), None);

    let error = stream.frames()[0].duration().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[test]
fn no_streams_is_a_data_error() {
    let error = Stream::from_probe(&ProbeResponse::default(), 0).unwrap_err();
    assert!(matches!(error, VvizError::NoStreams));
    assert_eq!(error.kind(), ErrorKind::Data);
}

#[test]
fn missing_stream_position_is_a_data_error() {
    let error = Stream::from_probe(&sample_response(), 3).unwrap_err();
    assert!(matches!(
        error,
        VvizError::StreamOutOfRange {
            position: 3,
            stream_count: 1
        }
    ));
}

#[test]
fn no_matching_frames_is_a_data_error() {
    let response = response(json!({
        "streams": [stream_record(2, "25/1")],
        "frames": [video_frame(0, 0)],
    }));
    let error = Stream::from_probe(&response, 0).unwrap_err();
    assert!(matches!(error, VvizError::NoFrames { stream_index: 2 }));
}

#[test]
fn descriptor_errors_name_the_stream() {
    let mut record = stream_record(4, "25/1");
    record.as_object_mut().unwrap().remove("time_base");
    let error = StreamDescriptor::parse(record.as_object().unwrap()).unwrap_err();
    assert_eq!(
        error.to_string(),
        "stream 4 record is missing required field `time_base`"
    );
}

#[test]
fn malformed_frame_record_fails_the_stream() {
    let mut bad = video_frame(0, 40);
    bad.as_object_mut().unwrap().remove("pkt_size");
    let response = response(json!({
        "streams": [stream_record(0, "25/1")],
        "frames": [video_frame(0, 0), bad],
    }));
    let error = Stream::from_probe(&response, 0).unwrap_err();
    assert!(
        matches!(error, VvizError::MissingField { ref entity, ref field } if entity == "frame 2" && field == "pkt_size")
    );
}
