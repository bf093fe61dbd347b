//! Analysis runs.
//!
//! [`analyze`] is the run boundary: it queries both probes, assembles the
//! [`Stream`] and the [`Track`], and logs any failure once at `error` level
//! before returning it. [`run`] goes one step further and hands the derived
//! [`AnalysisReport`] to a [`VisualizationSink`].
//!
//! With the `rayon` feature, stream and track assembly run on two threads.
//!
//! # Example
//!
//! ```no_run
//! use vviz::{AnalysisOptions, FfprobeCommand, JsonSink, Mp4dumpCommand, analysis};
//!
//! let frames = FfprobeCommand::new("input.mp4");
//! let boxes = Mp4dumpCommand::new("input.mp4");
//! let mut sink = JsonSink::new(std::io::stdout()).pretty(true);
//! analysis::run(&frames, &boxes, &AnalysisOptions::new(), &mut sink)?;
//! # Ok::<(), vviz::VvizError>(())
//! ```

use crate::boxes::BoxNode;
use crate::config::AnalysisOptions;
use crate::error::VvizError;
use crate::fragment::Fragment;
use crate::gop::GroupOfPicturesStatistics;
use crate::probe::{BoxProbe, FrameProbe, ProbeResponse};
use crate::report::{
    self, AnalysisReport, BitrateSeries, FragmentSummary, FrameSample, GopSummary, StreamSummary,
    TrackSummary,
};
use crate::sink::VisualizationSink;
use crate::stream::Stream;
use crate::track::Track;
use crate::validation::{self, ValidationReport};

/// An analysed stream and the track of the same file.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    stream: Stream,
    track: Track,
}

impl Analysis {
    pub fn new(stream: Stream, track: Track) -> Self {
        Self { stream, track }
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Derive the metric series and summaries.
    ///
    /// Every frame needs a frame rate and a time base, and every fragment a
    /// time scale.
    pub fn report(&self, options: &AnalysisOptions) -> Result<AnalysisReport, VvizError> {
        let stream = &self.stream;
        let total = report::analysis_span(stream)?;

        let frames = stream
            .frames()
            .iter()
            .map(FrameSample::from_frame)
            .collect::<Result<Vec<_>, VvizError>>()?;
        let window = options.resolve_bitrate_window(stream.frame_rate());
        let bitrate = BitrateSeries::from_frames(stream.frames(), window)?;

        let groups = stream.gops();
        let gops = groups
            .iter()
            .map(|gop| GopSummary::from_gop(gop, total))
            .collect::<Result<Vec<_>, VvizError>>()?;

        let track = if self.track.is_fragmented() {
            Some(TrackSummary::from_track(&self.track)?)
        } else {
            log::warn!("No fragments found in the box dump; the file is not fragmented");
            None
        };

        let fragments = self
            .selected_fragments(options)?
            .into_iter()
            .map(|fragment| FragmentSummary::from_fragment(fragment, total))
            .collect::<Result<Vec<_>, VvizError>>()?;

        log::debug!(
            "Report: {} frame samples, {} GOPs, {} fragments",
            frames.len(),
            gops.len(),
            fragments.len()
        );

        Ok(AnalysisReport {
            stream: StreamSummary::from_stream(stream)?,
            frames,
            bitrate,
            gop_statistics: GroupOfPicturesStatistics::from_groups(&groups),
            gops,
            track,
            fragments,
        })
    }

    /// Structural checks over the stream and the track.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.stream, &self.track)
    }

    fn selected_fragments(&self, options: &AnalysisOptions) -> Result<Vec<&Fragment>, VvizError> {
        if !options.clip_fragments_to_stream {
            return Ok(self.track.fragments().iter().collect());
        }
        let frames = self.stream.frames();
        match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => self
                .track
                .fragments_between(first.start_time()?, last.end_time()?),
            _ => Ok(Vec::new()),
        }
    }
}

/// Probe, then assemble the stream and track.
///
/// # Errors
///
/// Any probe, record, data or box-layout error. The error is logged once
/// before it is returned.
pub fn analyze<F, B>(
    frame_probe: &F,
    box_probe: &B,
    options: &AnalysisOptions,
) -> Result<Analysis, VvizError>
where
    F: FrameProbe + ?Sized,
    B: BoxProbe + ?Sized,
{
    build(frame_probe, box_probe, options)
        .inspect_err(|error| log::error!("Analysis failed: {error}"))
}

/// [`analyze`], derive the report and render it into `sink`.
///
/// Returns the rendered report.
pub fn run<F, B, S>(
    frame_probe: &F,
    box_probe: &B,
    options: &AnalysisOptions,
    sink: &mut S,
) -> Result<AnalysisReport, VvizError>
where
    F: FrameProbe + ?Sized,
    B: BoxProbe + ?Sized,
    S: VisualizationSink + ?Sized,
{
    let result = build(frame_probe, box_probe, options).and_then(|analysis| {
        let report = analysis.report(options)?;
        sink.render(&report)?;
        Ok(report)
    });
    result.inspect_err(|error| log::error!("Analysis failed: {error}"))
}

fn build<F, B>(
    frame_probe: &F,
    box_probe: &B,
    options: &AnalysisOptions,
) -> Result<Analysis, VvizError>
where
    F: FrameProbe + ?Sized,
    B: BoxProbe + ?Sized,
{
    let response = frame_probe.probe()?;
    let boxes = box_probe.dump()?;
    let (stream, track) = assemble(&response, &boxes, options);
    Ok(Analysis::new(stream?, track?))
}

#[cfg(feature = "rayon")]
fn assemble(
    response: &ProbeResponse,
    boxes: &[BoxNode],
    options: &AnalysisOptions,
) -> (Result<Stream, VvizError>, Result<Track, VvizError>) {
    rayon::join(
        || Stream::from_probe(response, options.stream_position),
        || Track::from_boxes(options.track_id, boxes),
    )
}

#[cfg(not(feature = "rayon"))]
fn assemble(
    response: &ProbeResponse,
    boxes: &[BoxNode],
    options: &AnalysisOptions,
) -> (Result<Stream, VvizError>, Result<Track, VvizError>) {
    (
        Stream::from_probe(response, options.stream_position),
        Track::from_boxes(options.track_id, boxes),
    )
}
