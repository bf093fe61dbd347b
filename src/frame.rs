//! Decoded-picture records.
//!
//! A [`Frame`] is built from one raw ffprobe frame record. Parsing happens in
//! two steps: the record's fields are first read into a plain
//! [`FrameFields`] value, then [`FrameKind::classify`] picks the variant from
//! `(pict_type, key_frame)`. The variant is fixed from then on.
//!
//! | `pict_type` | `key_frame` | variant |
//! |---|---|---|
//! | `B` | any | [`FrameKind::B`] |
//! | `P` | any | [`FrameKind::P`] |
//! | `I` | `0` | [`FrameKind::I`] |
//! | `I` | `1` | [`FrameKind::Idr`] |
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vviz::{Frame, FrameKind, FrameTiming, Rational};
//!
//! let record = json!({
//!     "pkt_pts": 400000,
//!     "pkt_size": "4440",
//!     "key_frame": 0,
//!     "pict_type": "B",
//!     "media_type": "video",
//! });
//! let timing = FrameTiming::new()
//!     .with_frame_rate(Rational::from_integer(50))
//!     .with_time_base(Rational::new(1, 10_000_000).unwrap());
//! let frame = Frame::parse(record.as_object().unwrap(), timing)?;
//!
//! assert_eq!(frame.kind(), FrameKind::B);
//! assert_eq!(frame.size(), 4440 * 8);
//! assert_eq!(frame.bitrate()?, 4440.0 * 8.0 * 50.0);
//! # Ok::<(), vviz::VvizError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VvizError;
use crate::rational::Rational;
use crate::record::{self, Record};
use crate::utilities::{add_delta, micros_to_datetime, micros_to_delta};

/// Picture coding type as reported by the frame inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PictureType {
    /// Intra-coded.
    I,
    /// Predicted.
    P,
    /// Bi-directionally predicted.
    B,
}

impl PictureType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "I" => Some(PictureType::I),
            "P" => Some(PictureType::P),
            "B" => Some(PictureType::B),
            _ => None,
        }
    }
}

/// The concrete variant of a [`Frame`].
///
/// [`FrameKind::Idr`] is a refinement of [`FrameKind::I`]: non-strict type
/// queries ([`FrameKind::is_a`]) treat an IDR frame as an I-frame, strict
/// ones (plain equality) do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    #[serde(rename = "BFrame")]
    B,
    #[serde(rename = "PFrame")]
    P,
    #[serde(rename = "IFrame")]
    I,
    #[serde(rename = "IDRFrame")]
    Idr,
}

impl FrameKind {
    /// Pick the variant for a `(picture_type, key_frame)` pair.
    pub fn classify(picture_type: PictureType, key_frame: bool) -> Self {
        match (picture_type, key_frame) {
            (PictureType::B, _) => FrameKind::B,
            (PictureType::P, _) => FrameKind::P,
            (PictureType::I, false) => FrameKind::I,
            (PictureType::I, true) => FrameKind::Idr,
        }
    }

    /// Non-strict type test: `true` if `self` is `other` or one of its
    /// subtypes.
    pub fn is_a(self, other: FrameKind) -> bool {
        self == other || (self == FrameKind::Idr && other == FrameKind::I)
    }

    /// Any intra frame, IDR or not. This is what opens a new GOP.
    pub fn is_intra(self) -> bool {
        self.is_a(FrameKind::I)
    }

    /// One-letter code used when printing GOP structures (`i` for a
    /// non-IDR intra frame, `I` for IDR).
    pub fn code(self) -> char {
        match self {
            FrameKind::B => 'B',
            FrameKind::P => 'P',
            FrameKind::I => 'i',
            FrameKind::Idr => 'I',
        }
    }

    /// Variant name as exposed to chart consumers.
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::B => "BFrame",
            FrameKind::P => "PFrame",
            FrameKind::I => "IFrame",
            FrameKind::Idr => "IDRFrame",
        }
    }
}

impl Display for FrameKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

/// The raw fields of one frame record, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFields {
    /// Presentation timestamp in time-base ticks.
    pub pkt_pts: i64,
    /// Packet size in bytes.
    pub pkt_size: u64,
    pub picture_type: PictureType,
    pub key_frame: bool,
    pub media_type: String,
}

impl FrameFields {
    /// Read the required fields out of a raw record.
    ///
    /// `pkt_pts` falls back to `pts` for ffprobe builds that no longer emit
    /// the former. `entity` names the record in errors.
    pub fn from_record(record: &Record, entity: &str) -> Result<Self, VvizError> {
        let pkt_pts = if record.get("pkt_pts").is_none_or(|value| value.is_null())
            && record.get("pts").is_some_and(|value| !value.is_null())
        {
            record::required_i64(record, "pts", entity)?
        } else {
            record::required_i64(record, "pkt_pts", entity)?
        };
        let pkt_size = record::required_u64_lenient(record, "pkt_size", entity)?;
        if pkt_size.checked_mul(8).is_none() {
            return Err(VvizError::InvalidField {
                entity: entity.to_string(),
                field: "pkt_size".to_string(),
                reason: format!("{pkt_size} bytes does not fit in 64 bits as a bit count"),
            });
        }
        let pict_type = record::required_str(record, "pict_type", entity)?;
        let picture_type =
            PictureType::parse(pict_type).ok_or_else(|| VvizError::InvalidField {
                entity: entity.to_string(),
                field: "pict_type".to_string(),
                reason: format!("unsupported picture type {pict_type:?}"),
            })?;
        let key_frame = record::required_flag(record, "key_frame", entity)?;
        let media_type = record::required_str(record, "media_type", entity)?.to_string();

        Ok(Self {
            pkt_pts,
            pkt_size,
            picture_type,
            key_frame,
            media_type,
        })
    }
}

/// Stream context a frame is parsed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct FrameTiming {
    /// Seconds per timestamp tick.
    pub time_base: Option<Rational>,
    /// Frames per second.
    pub frame_rate: Option<Rational>,
    /// 1-based position of the frame within its stream.
    pub position: Option<usize>,
}

impl FrameTiming {
    /// No time base, no frame rate, no position.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_base(mut self, time_base: Rational) -> Self {
        self.time_base = Some(time_base);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: Rational) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

/// One decoded picture.
///
/// Timing-derived values need stream context: [`duration`](Frame::duration)
/// and [`bitrate`](Frame::bitrate) need a frame rate,
/// [`start_time`](Frame::start_time) and [`end_time`](Frame::end_time) need a
/// time base. Requesting them without it is a
/// [`VvizError::MissingConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    fields: FrameFields,
    kind: FrameKind,
    time_base: Option<Rational>,
    frame_rate: Option<Rational>,
    position: Option<usize>,
}

impl Frame {
    /// Parse a raw frame record.
    ///
    /// # Errors
    ///
    /// [`VvizError::MissingField`] if any of `pkt_pts`, `pkt_size`,
    /// `pict_type`, `key_frame` or `media_type` is absent, and
    /// [`VvizError::InvalidField`] if one is present but mis-shaped.
    pub fn parse(record: &Record, timing: FrameTiming) -> Result<Self, VvizError> {
        let entity = match timing.position {
            Some(position) => format!("frame {position}"),
            None => "frame".to_string(),
        };
        let fields = FrameFields::from_record(record, &entity)?;
        Ok(Self::from_fields(fields, timing))
    }

    /// Build a frame from already-extracted fields.
    pub fn from_fields(fields: FrameFields, timing: FrameTiming) -> Self {
        let kind = FrameKind::classify(fields.picture_type, fields.key_frame);
        Self {
            fields,
            kind,
            time_base: timing.time_base,
            frame_rate: timing.frame_rate,
            position: timing.position,
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn fields(&self) -> &FrameFields {
        &self.fields
    }

    pub fn pkt_pts(&self) -> i64 {
        self.fields.pkt_pts
    }

    pub fn picture_type(&self) -> PictureType {
        self.fields.picture_type
    }

    pub fn is_key_frame(&self) -> bool {
        self.fields.key_frame
    }

    pub fn media_type(&self) -> &str {
        &self.fields.media_type
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn time_base(&self) -> Option<Rational> {
        self.time_base
    }

    pub fn frame_rate(&self) -> Option<Rational> {
        self.frame_rate
    }

    /// Replace the frame rate. Changes [`duration`](Frame::duration),
    /// [`bitrate`](Frame::bitrate) and [`end_time`](Frame::end_time), never
    /// the start time or the variant.
    pub fn set_frame_rate(&mut self, frame_rate: Option<Rational>) {
        self.frame_rate = frame_rate;
    }

    pub fn set_time_base(&mut self, time_base: Option<Rational>) {
        self.time_base = time_base;
    }

    /// Packet size in bytes.
    pub fn size_in_bytes(&self) -> u64 {
        self.fields.pkt_size
    }

    /// Packet size in bits.
    pub fn size(&self) -> u64 {
        self.fields.pkt_size.saturating_mul(8)
    }

    /// Display duration of the frame, `1 / frame_rate`.
    pub fn duration(&self) -> Result<TimeDelta, VvizError> {
        let period = self
            .frame_rate
            .and_then(|rate| rate.period_micros())
            .ok_or_else(|| self.missing("frame rate"))?;
        Ok(micros_to_delta(period))
    }

    /// Instantaneous bitrate in bits per second: the frame's size spread
    /// over one frame period.
    pub fn bitrate(&self) -> Result<f64, VvizError> {
        let rate = self.frame_rate.ok_or_else(|| self.missing("frame rate"))?;
        Ok(self.size() as f64 * rate.as_f64())
    }

    /// Presentation time, `pkt_pts × time_base`, as an instant on the UTC
    /// epoch clock.
    pub fn start_time(&self) -> Result<DateTime<Utc>, VvizError> {
        let time_base = self.time_base.ok_or_else(|| self.missing("time base"))?;
        micros_to_datetime(time_base.ticks_to_micros(self.fields.pkt_pts), &self.entity())
    }

    /// `start_time + duration`.
    pub fn end_time(&self) -> Result<DateTime<Utc>, VvizError> {
        let start = self.start_time()?;
        add_delta(start, self.duration()?, &self.entity())
    }

    fn entity(&self) -> String {
        match self.position {
            Some(position) => format!("frame {position}"),
            None => "frame".to_string(),
        }
    }

    fn missing(&self, setting: &'static str) -> VvizError {
        VvizError::MissingConfiguration {
            entity: self.entity(),
            setting,
        }
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.kind)
    }
}
