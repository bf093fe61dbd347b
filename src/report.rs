//! Metric series and summaries handed to a
//! [`VisualizationSink`](crate::VisualizationSink).
//!
//! Everything here is plain serialisable data. Timestamps serialise as
//! RFC 3339 instants on the epoch clock (a stream starting at `pkt_pts` 0
//! starts at `1970-01-01T00:00:00Z`), durations as fractional seconds, sizes
//! in bits and bitrates in bits per second.
//!
//! Summaries also carry a `label`: hover text for chart consumers, with
//! `<br>` line breaks.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::VvizError;
use crate::fragment::Fragment;
use crate::frame::{Frame, FrameKind};
use crate::gop::{GroupOfPictures, GroupOfPicturesStatistics};
use crate::stream::Stream;
use crate::track::Track;
use crate::utilities::{delta_seconds, format_bits, format_clock, format_delta, mean};

/// One frame as a chart sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSample {
    pub position: Option<usize>,
    pub kind: FrameKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seconds.
    pub duration: f64,
    /// Bits.
    pub size: u64,
    /// Bits per second.
    pub bitrate: f64,
}

impl FrameSample {
    /// Needs both the frame rate and the time base of `frame`.
    pub fn from_frame(frame: &Frame) -> Result<Self, VvizError> {
        Ok(Self {
            position: frame.position(),
            kind: frame.kind(),
            start_time: frame.start_time()?,
            end_time: frame.end_time()?,
            duration: delta_seconds(frame.duration()?),
            size: frame.size(),
            bitrate: frame.bitrate()?,
        })
    }
}

/// Per-frame bitrate smoothed two ways: a rolling mean over a fixed number
/// of frames and the cumulative (expanding) mean.
///
/// `rolling_mean[i]` is `None` until `window` frames have been seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitrateSeries {
    /// Rolling window, in frames.
    pub window: usize,
    pub timestamps: Vec<DateTime<Utc>>,
    pub rolling_mean: Vec<Option<f64>>,
    pub cumulative_mean: Vec<f64>,
}

impl BitrateSeries {
    /// Build the series over `frames`. A `window` of 0 is treated as 1.
    pub fn from_frames(frames: &[Frame], window: usize) -> Result<Self, VvizError> {
        let window = window.max(1);
        let mut timestamps = Vec::with_capacity(frames.len());
        let mut bitrates = Vec::with_capacity(frames.len());
        for frame in frames {
            timestamps.push(frame.start_time()?);
            bitrates.push(frame.bitrate()?);
        }

        let mut rolling_mean = Vec::with_capacity(bitrates.len());
        let mut cumulative_mean = Vec::with_capacity(bitrates.len());
        let mut window_sum = 0.0;
        let mut total = 0.0;
        for (index, bitrate) in bitrates.iter().enumerate() {
            window_sum += bitrate;
            total += bitrate;
            if index >= window {
                window_sum -= bitrates[index - window];
            }
            rolling_mean.push((index + 1 >= window).then(|| window_sum / window as f64));
            cumulative_mean.push(total / (index + 1) as f64);
        }

        Ok(Self {
            window,
            timestamps,
            rolling_mean,
            cumulative_mean,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// One GOP as a chart bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GopSummary {
    pub position: usize,
    pub closed: bool,
    /// Frame codes, e.g. `IBBBP`.
    pub pattern: String,
    pub frame_count: usize,
    /// Bits.
    pub size: u64,
    pub start_time: DateTime<Utc>,
    /// Seconds.
    pub duration: f64,
    pub label: String,
}

impl GopSummary {
    /// `total` is the overall span of the analysis and only affects how
    /// times are printed in the label.
    pub fn from_gop(gop: &GroupOfPictures<'_>, total: TimeDelta) -> Result<Self, VvizError> {
        let start_time = gop.start_time()?;
        let state = if gop.is_closed() { "CLOSED" } else { "OPEN" };
        let label = format!(
            "GOP {}<br>{state}<br>{} frames<br>from {}<br>{}",
            gop.position(),
            gop.len(),
            format_clock(start_time, total),
            format_bits(gop.size() as f64, "b"),
        );

        Ok(Self {
            position: gop.position(),
            closed: gop.is_closed(),
            pattern: gop.frames().iter().map(|frame| frame.kind().code()).collect(),
            frame_count: gop.len(),
            size: gop.size(),
            start_time,
            duration: delta_seconds(gop.duration()?),
            label,
        })
    }
}

/// One fragment as a chart bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentSummary {
    pub position: usize,
    pub sample_count: u64,
    pub start_time: DateTime<Utc>,
    /// Seconds.
    pub duration: f64,
    /// Bits.
    pub size: u64,
    pub label: String,
}

impl FragmentSummary {
    pub fn from_fragment(fragment: &Fragment, total: TimeDelta) -> Result<Self, VvizError> {
        let start_time = fragment.start_time()?;
        let duration = delta_seconds(fragment.duration()?);
        let label = format!(
            "Fragment {}<br>{} samples<br>from {}<br>length <b>{duration}s</b><br>{}",
            fragment.position(),
            fragment.len(),
            format_clock(start_time, total),
            format_bits(fragment.size() as f64, "b"),
        );

        Ok(Self {
            position: fragment.position(),
            sample_count: fragment.len(),
            start_time,
            duration,
            size: fragment.size(),
            label,
        })
    }
}

/// Stream-level annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Nominal duration in seconds, if the probe reported one.
    pub duration: Option<f64>,
    pub frame_count: usize,
    /// Mean of the per-frame bitrates, bits per second.
    pub average_bitrate: f64,
    /// Start of the first frame.
    pub span_start: DateTime<Utc>,
    /// End of the last frame.
    pub span_end: DateTime<Utc>,
    pub label: String,
}

impl StreamSummary {
    pub fn from_stream(stream: &Stream) -> Result<Self, VvizError> {
        let frames = stream.frames();
        let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
            return Err(VvizError::NoFrames {
                stream_index: stream.index(),
            });
        };
        let span_start = first.start_time()?;
        let span_end = last.end_time()?;

        let bitrates = frames
            .iter()
            .map(Frame::bitrate)
            .collect::<Result<Vec<f64>, VvizError>>()?;
        let average_bitrate = mean(bitrates).unwrap_or(0.0);

        let total = analysis_span(stream)?;
        let duration = stream
            .duration()
            .map(format_delta)
            .unwrap_or_else(|| "unknown".to_string());
        let label = format!(
            "Stream<br>{}x{}<br>duration: <b>{duration}</b><br><br>\
             <i>Analysis for span <br>{} to {}</i><br>\
             avg bitrate: <b>{}</b><br>",
            stream.width(),
            stream.height(),
            format_clock(span_start, total),
            format_clock(span_end, total),
            format_bits(average_bitrate, "bps"),
        );

        Ok(Self {
            index: stream.index(),
            width: stream.width(),
            height: stream.height(),
            duration: stream.duration().map(delta_seconds),
            frame_count: frames.len(),
            average_bitrate,
            span_start,
            span_end,
            label,
        })
    }
}

/// Track-level annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: Option<u32>,
    pub time_scale: Option<u64>,
    /// Nominal duration in seconds, if the dump carried a `moov`.
    pub duration: Option<f64>,
    pub fragment_count: usize,
    /// Bits.
    pub average_fragment_size: f64,
    /// Bits.
    pub max_fragment_size: u64,
    pub label: String,
}

impl TrackSummary {
    /// Summarise the fragments of `track`.
    ///
    /// # Errors
    ///
    /// [`VvizError::NoFragments`] if the track is not fragmented.
    pub fn from_track(track: &Track) -> Result<Self, VvizError> {
        let sizes: Vec<u64> = track.fragments().iter().map(Fragment::size).collect();
        let max_fragment_size = sizes.iter().copied().max().ok_or(VvizError::NoFragments)?;
        let average_fragment_size =
            mean(sizes.iter().map(|size| *size as f64)).ok_or(VvizError::NoFragments)?;

        let label = format!(
            "avg fragment size: <b>{}</b><br>max segment size: <b>{}</b>",
            format_bits(average_fragment_size, "b"),
            format_bits(max_fragment_size as f64, "b"),
        );

        Ok(Self {
            id: track.id(),
            time_scale: track.time_scale(),
            duration: track.duration().map(delta_seconds),
            fragment_count: sizes.len(),
            average_fragment_size,
            max_fragment_size,
            label,
        })
    }
}

/// Everything a sink needs to draw one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub stream: StreamSummary,
    pub frames: Vec<FrameSample>,
    pub bitrate: BitrateSeries,
    pub gops: Vec<GopSummary>,
    pub gop_statistics: GroupOfPicturesStatistics,
    /// `None` when the file is not fragmented.
    pub track: Option<TrackSummary>,
    pub fragments: Vec<FragmentSummary>,
}

/// The overall duration used to pick the label clock format: the stream's
/// nominal duration, or the analysed frame span when there is none.
pub(crate) fn analysis_span(stream: &Stream) -> Result<TimeDelta, VvizError> {
    if let Some(duration) = stream.duration() {
        return Ok(duration);
    }
    match (stream.frames().first(), stream.frames().last()) {
        (Some(first), Some(last)) => Ok(last.end_time()? - first.start_time()?),
        _ => Ok(TimeDelta::zero()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::BitrateSeries;
    use crate::frame::{Frame, FrameTiming};
    use crate::rational::Rational;

    fn frame(pts: i64, bytes: u64) -> Frame {
        let record = json!({
            "pkt_pts": pts,
            "pkt_size": bytes.to_string(),
            "key_frame": 0,
            "pict_type": "P",
            "media_type": "video",
        });
        let timing = FrameTiming::new()
            .with_frame_rate(Rational::from_integer(2))
            .with_time_base(Rational::new(1, 1000).unwrap());
        Frame::parse(record.as_object().unwrap(), timing).unwrap()
    }

    #[test]
    fn rolling_mean_waits_for_a_full_window() {
        // Bitrates: bytes × 8 × 2.
        let frames = vec![frame(0, 10), frame(500, 20), frame(1000, 30), frame(1500, 40)];
        let series = BitrateSeries::from_frames(&frames, 2).unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(
            series.rolling_mean,
            vec![None, Some(240.0), Some(400.0), Some(560.0)]
        );
        assert_eq!(series.cumulative_mean, vec![160.0, 240.0, 320.0, 400.0]);
    }

    #[test]
    fn zero_window_behaves_like_one() {
        let frames = vec![frame(0, 10), frame(500, 20)];
        let series = BitrateSeries::from_frames(&frames, 0).unwrap();
        assert_eq!(series.window, 1);
        assert_eq!(series.rolling_mean, vec![Some(160.0), Some(320.0)]);
    }
}
