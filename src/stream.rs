//! Elementary video streams.
//!
//! A [`Stream`] is assembled from one ffprobe stream descriptor plus the
//! frame records that belong to it, and owns those frames in emission order.
//! GOPs are derived from the frames on demand.

use chrono::TimeDelta;
use serde_json::Value;

use crate::error::VvizError;
use crate::frame::{Frame, FrameKind, FrameTiming};
use crate::gop::{self, GroupOfPictures, GroupOfPicturesStatistics};
use crate::probe::ProbeResponse;
use crate::rational::Rational;
use crate::record::{self, Record};
use crate::utilities::micros_to_delta;

/// The per-stream fields of an ffprobe `streams` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct StreamDescriptor {
    /// Stream index within the container; frames refer to it through
    /// `stream_index`.
    pub index: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate. `None` when ffprobe reports `0/0`.
    pub frame_rate: Option<Rational>,
    /// Seconds per timestamp tick.
    pub time_base: Rational,
    /// Nominal stream duration in time-base ticks, if reported.
    pub duration_ts: Option<i64>,
}

impl StreamDescriptor {
    /// Parse a stream descriptor record.
    ///
    /// # Errors
    ///
    /// [`VvizError::MissingField`] / [`VvizError::InvalidField`] if `index`,
    /// `width`, `height`, `avg_frame_rate` or `time_base` is absent or
    /// malformed, or `duration_ts` is present but not an integer.
    pub fn parse(record: &Record) -> Result<Self, VvizError> {
        let index = record::required_u32(record, "index", "stream")?;
        let entity = format!("stream {index}");

        let width = record::required_u32(record, "width", &entity)?;
        let height = record::required_u32(record, "height", &entity)?;

        // ffprobe reports an unknown rate as "0/0".
        let frame_rate = match record::required_str(record, "avg_frame_rate", &entity)? {
            "0/0" => None,
            _ => {
                let rate = record::required_rational(record, "avg_frame_rate", &entity)?;
                (!rate.is_zero()).then_some(rate)
            }
        };
        let time_base = record::required_rational(record, "time_base", &entity)?;
        let duration_ts = match record.get("duration_ts") {
            None | Some(Value::Null) => None,
            Some(_) => Some(record::required_i64(record, "duration_ts", &entity)?),
        };

        Ok(Self {
            index,
            width,
            height,
            frame_rate,
            time_base,
            duration_ts,
        })
    }

    /// `duration_ts × time_base`.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.duration_ts
            .map(|ticks| micros_to_delta(self.time_base.ticks_to_micros(ticks)))
    }
}

/// One elementary video stream and its frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    descriptor: StreamDescriptor,
    frames: Vec<Frame>,
}

impl Stream {
    /// Build the stream at `position` in the probe's stream list, with the
    /// video frames whose `stream_index` matches that stream's `index`.
    ///
    /// `position` indexes the `streams` array, which is not necessarily the
    /// container's stream index: with `-select_streams v:0` the only entry may
    /// well carry `index: 1`.
    ///
    /// # Errors
    ///
    /// - [`VvizError::NoStreams`] if the response has no streams.
    /// - [`VvizError::StreamOutOfRange`] if `position` does not exist.
    /// - [`VvizError::NoFrames`] if no video frame matches the stream.
    /// - Any record error from the descriptor or a frame record.
    pub fn from_probe(response: &ProbeResponse, position: usize) -> Result<Self, VvizError> {
        let streams = response.streams();
        if streams.is_empty() {
            return Err(VvizError::NoStreams);
        }
        let record = streams.get(position).ok_or(VvizError::StreamOutOfRange {
            position,
            stream_count: streams.len(),
        })?;

        let descriptor = StreamDescriptor::parse(record)?;
        let frames = response.video_frames_for_stream(descriptor.index);
        Self::from_records(descriptor, frames)
    }

    /// Build a stream from a descriptor and frame records that already belong
    /// to it. Frames are numbered 1, 2, 3… in the order given.
    pub fn from_records<'a, I>(descriptor: StreamDescriptor, records: I) -> Result<Self, VvizError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        log::debug!(
            "Assembling stream {} ({}x{}, frame rate {:?}, time base {})",
            descriptor.index,
            descriptor.width,
            descriptor.height,
            descriptor.frame_rate.map(|rate| rate.to_string()),
            descriptor.time_base
        );

        let mut timing = FrameTiming::new().with_time_base(descriptor.time_base);
        if let Some(frame_rate) = descriptor.frame_rate {
            timing = timing.with_frame_rate(frame_rate);
        }

        let frames = records
            .into_iter()
            .enumerate()
            .map(|(offset, record)| Frame::parse(record, timing.with_position(offset + 1)))
            .collect::<Result<Vec<Frame>, VvizError>>()?;

        if frames.is_empty() {
            return Err(VvizError::NoFrames {
                stream_index: descriptor.index,
            });
        }
        log::info!("Stream {}: {} video frames", descriptor.index, frames.len());

        Ok(Self { descriptor, frames })
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    pub fn index(&self) -> u32 {
        self.descriptor.index
    }

    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    pub fn frame_rate(&self) -> Option<Rational> {
        self.descriptor.frame_rate
    }

    pub fn time_base(&self) -> Rational {
        self.descriptor.time_base
    }

    /// Nominal duration, `duration_ts × time_base`.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.descriptor.duration()
    }

    /// All frames, in emission order. Never empty.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frames of `kind` or one of its subtypes: asking for
    /// [`FrameKind::I`] also returns IDR frames.
    pub fn frames_of_kind(&self, kind: FrameKind) -> Vec<&Frame> {
        self.frames
            .iter()
            .filter(|frame| frame.kind().is_a(kind))
            .collect()
    }

    /// Frames of exactly `kind`: asking for [`FrameKind::I`] excludes IDR
    /// frames.
    pub fn frames_of_exact_kind(&self, kind: FrameKind) -> Vec<&Frame> {
        self.frames
            .iter()
            .filter(|frame| frame.kind() == kind)
            .collect()
    }

    /// Partition the frames into GOPs. Recomputed on every call.
    pub fn gops(&self) -> Vec<GroupOfPictures<'_>> {
        gop::partition(&self.frames)
    }

    pub fn gop_statistics(&self) -> GroupOfPicturesStatistics {
        GroupOfPicturesStatistics::from_groups(&self.gops())
    }
}
