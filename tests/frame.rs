//! Frame parsing, classification and timing tests.

use chrono::{DateTime, TimeDelta};
use serde_json::{Value, json};
use vviz::{ErrorKind, Frame, FrameKind, FrameTiming, PictureType, Rational, VvizError};

fn record(value: Value) -> vviz::Record {
    value.as_object().cloned().expect("record must be an object")
}

fn frame_record(pict_type: &str, key_frame: Value) -> vviz::Record {
    record(json!({
        "pkt_pts": 400000,
        "pkt_size": "4440",
        "key_frame": key_frame,
        "pict_type": pict_type,
        "media_type": "video",
    }))
}

fn full_timing() -> FrameTiming {
    FrameTiming::new()
        .with_frame_rate(Rational::from_integer(50))
        .with_time_base(Rational::new(1, 10_000_000).unwrap())
        .with_position(3)
}

// ── Classification ───────────────────────────────────────────────

#[test]
fn classification_table() {
    let cases = [
        ("B", json!(0), FrameKind::B),
        ("B", json!(1), FrameKind::B),
        ("P", json!(0), FrameKind::P),
        ("P", json!(1), FrameKind::P),
        ("I", json!(0), FrameKind::I),
        ("I", json!(1), FrameKind::Idr),
    ];
    for (pict_type, key_frame, expected) in cases {
        let frame = Frame::parse(&frame_record(pict_type, key_frame), FrameTiming::new()).unwrap();
        assert_eq!(frame.kind(), expected, "pict_type {pict_type}");
    }
}

#[test]
fn key_frame_accepts_booleans() {
    let frame = Frame::parse(&frame_record("I", json!(true)), FrameTiming::new()).unwrap();
    assert_eq!(frame.kind(), FrameKind::Idr);
    assert!(frame.is_key_frame());
    assert_eq!(frame.picture_type(), PictureType::I);
}

#[test]
fn idr_is_an_i_frame_only_for_non_strict_tests() {
    assert!(FrameKind::Idr.is_a(FrameKind::I));
    assert!(!FrameKind::I.is_a(FrameKind::Idr));
    assert!(!FrameKind::P.is_a(FrameKind::I));
    assert_ne!(FrameKind::Idr, FrameKind::I);
    assert!(FrameKind::I.is_intra());
    assert!(!FrameKind::B.is_intra());
}

#[test]
fn codes_and_names() {
    assert_eq!(FrameKind::Idr.code(), 'I');
    assert_eq!(FrameKind::I.code(), 'i');
    assert_eq!(FrameKind::Idr.name(), "IDRFrame");
    assert_eq!(FrameKind::B.to_string(), "B");
    assert_eq!(serde_json::to_value(FrameKind::P).unwrap(), json!("PFrame"));
}

// ── Field coercion ───────────────────────────────────────────────

#[test]
fn packet_size_accepts_strings_and_numbers() {
    let from_string = Frame::parse(&frame_record("B", json!(0)), FrameTiming::new()).unwrap();
    assert_eq!(from_string.size_in_bytes(), 4440);
    assert_eq!(from_string.size(), 35520);

    let mut numeric = frame_record("B", json!(0));
    numeric.insert("pkt_size".to_string(), json!(4440));
    let from_number = Frame::parse(&numeric, FrameTiming::new()).unwrap();
    assert_eq!(from_number.size(), 35520);
}

#[test]
fn pts_is_accepted_when_pkt_pts_is_absent() {
    let mut newer = frame_record("P", json!(0));
    newer.remove("pkt_pts");
    newer.insert("pts".to_string(), json!(1234));
    let frame = Frame::parse(&newer, FrameTiming::new()).unwrap();
    assert_eq!(frame.pkt_pts(), 1234);
}

#[test]
fn missing_fields_are_record_errors() {
    for field in ["pkt_pts", "pkt_size", "pict_type", "key_frame", "media_type"] {
        let mut incomplete = frame_record("P", json!(0));
        incomplete.remove(field);
        let error = Frame::parse(&incomplete, full_timing()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Record, "field {field}");
        match error {
            VvizError::MissingField { entity, field: name } => {
                assert_eq!(entity, "frame 3");
                assert_eq!(name, field);
            }
            other => panic!("unexpected error for {field}: {other}"),
        }
    }
}

#[test]
fn malformed_fields_are_record_errors() {
    let unknown_type = frame_record("S", json!(0));
    let error = Frame::parse(&unknown_type, FrameTiming::new()).unwrap_err();
    assert!(matches!(error, VvizError::InvalidField { ref field, .. } if field == "pict_type"));

    let mut bad_size = frame_record("B", json!(0));
    bad_size.insert("pkt_size".to_string(), json!("lots"));
    let error = Frame::parse(&bad_size, FrameTiming::new()).unwrap_err();
    assert!(matches!(error, VvizError::InvalidField { ref field, .. } if field == "pkt_size"));
}

#[test]
fn oversized_packet_is_rejected() {
    let mut oversized = frame_record("P", json!(0));
    oversized.insert("pkt_size".to_string(), json!("4611686018427387904"));
    let error = Frame::parse(&oversized, full_timing()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Record);
    assert!(matches!(error, VvizError::InvalidField { ref field, .. } if field == "pkt_size"));

    let mut largest = frame_record("P", json!(0));
    largest.insert("pkt_size".to_string(), json!(u64::MAX / 8));
    let frame = Frame::parse(&largest, full_timing()).unwrap();
    assert_eq!(frame.size(), u64::MAX / 8 * 8);
}

// ── Timing ───────────────────────────────────────────────────────

#[test]
fn derived_timing_values() {
    let frame = Frame::parse(&frame_record("B", json!(0)), full_timing()).unwrap();

    assert_eq!(frame.position(), Some(3));
    assert_eq!(frame.duration().unwrap(), TimeDelta::milliseconds(20));
    assert_eq!(frame.bitrate().unwrap(), 1_776_000.0);
    assert_eq!(
        frame.start_time().unwrap(),
        DateTime::from_timestamp_micros(40_000).unwrap()
    );
    assert_eq!(
        frame.end_time().unwrap(),
        DateTime::from_timestamp_micros(60_000).unwrap()
    );
}

#[test]
fn fractional_frame_rates_stay_exact() {
    let timing = FrameTiming::new().with_frame_rate("30000/1001".parse().unwrap());
    let frame = Frame::parse(&frame_record("P", json!(0)), timing).unwrap();
    assert_eq!(frame.duration().unwrap(), TimeDelta::microseconds(33_367));
}

#[test]
fn timing_without_context_is_a_configuration_error() {
    let mut frame = Frame::parse(&frame_record("B", json!(0)), FrameTiming::new()).unwrap();

    for error in [
        frame.duration().unwrap_err(),
        frame.bitrate().unwrap_err(),
        frame.start_time().unwrap_err(),
        frame.end_time().unwrap_err(),
    ] {
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    frame.set_time_base(Rational::new(1, 1000));
    assert!(frame.start_time().is_ok());
    assert!(matches!(
        frame.end_time(),
        Err(VvizError::MissingConfiguration { setting: "frame rate", .. })
    ));

    frame.set_frame_rate(Some(Rational::from_integer(25)));
    assert_eq!(frame.duration().unwrap(), TimeDelta::milliseconds(40));
    assert_eq!(frame.kind(), FrameKind::B);
}

#[test]
fn end_time_past_the_calendar_is_an_error() {
    let mut last_second = frame_record("I", json!(1));
    last_second.insert("pkt_pts".to_string(), json!(8_210_266_876_799_i64));
    let timing = FrameTiming::new()
        .with_frame_rate(Rational::from_integer(1))
        .with_time_base(Rational::from_integer(1))
        .with_position(1);
    let frame = Frame::parse(&last_second, timing).unwrap();

    assert!(frame.start_time().is_ok());
    let error = frame.end_time().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Data);
    assert!(matches!(error, VvizError::TimestampOutOfRange { ref entity, .. } if entity == "frame 1"));
}
