//! Structural validation.
//!
//! [`validate`] inspects an assembled [`Stream`] and [`Track`] and returns a
//! [`ValidationReport`] describing their structure and any potential issues.
//! Unlike the analysis itself, validation never fails: problems that would
//! make a derived value impossible to compute are reported as errors.
//!
//! # Example
//!
//! ```no_run
//! use vviz::{AnalysisOptions, CapturedBoxDump, CapturedFrameProbe, analysis};
//!
//! let analysis = analysis::analyze(
//!     &CapturedFrameProbe::new("ffprobe.json"),
//!     &CapturedBoxDump::new("mp4dump.json"),
//!     &AnalysisOptions::new(),
//! )?;
//! let report = analysis.validate();
//! if !report.is_valid() {
//!     print!("{report}");
//! }
//! # Ok::<(), vviz::VvizError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::frame::FrameKind;
use crate::stream::Stream;
use crate::track::Track;

/// Summary of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Irregularities that still allow a full report.
    pub warnings: Vec<String>,
    /// Issues that will make report derivation fail.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    ///
    /// Warnings do not affect this result.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Run every check on `stream` and `track`.
pub fn validate(stream: &Stream, track: &Track) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_stream(stream, &mut report);
    check_track(track, &mut report);
    report
}

fn check_stream(stream: &Stream, report: &mut ValidationReport) {
    let frames = stream.frames();

    // ── Timing context ─────────────────────────────────────────────
    if stream.frame_rate().is_none() {
        report.errors.push(format!(
            "Stream {} has no frame rate; frame durations and bitrates cannot be computed",
            stream.index()
        ));
    }

    // ── Frame structure ────────────────────────────────────────────
    report.info.push(format!(
        "Stream {}: {}x{}, {} frames ({} IDR, {} I, {} P, {} B)",
        stream.index(),
        stream.width(),
        stream.height(),
        frames.len(),
        stream.frames_of_exact_kind(FrameKind::Idr).len(),
        stream.frames_of_exact_kind(FrameKind::I).len(),
        stream.frames_of_exact_kind(FrameKind::P).len(),
        stream.frames_of_exact_kind(FrameKind::B).len(),
    ));

    if let Some(first) = frames.first().filter(|frame| frame.kind() != FrameKind::Idr) {
        report.warnings.push(format!(
            "Stream does not start with an IDR frame (first frame is {})",
            first.kind().name()
        ));
    }

    let regressions = frames
        .windows(2)
        .filter(|pair| pair[1].pkt_pts() <= pair[0].pkt_pts())
        .count();
    if regressions > 0 {
        report.warnings.push(format!(
            "Presentation timestamps are not strictly increasing ({regressions} regressions)"
        ));
    }

    // ── GOP structure ──────────────────────────────────────────────
    let statistics = stream.gop_statistics();
    report.info.push(format!(
        "{} GOPs ({} closed), length {}..{} frames, average {:.1}",
        statistics.count,
        statistics.closed_count,
        statistics.min_length,
        statistics.max_length,
        statistics.average_length,
    ));
    if statistics.open_count() > 0 {
        report.warnings.push(format!(
            "{} of {} GOPs are open (no IDR frame)",
            statistics.open_count(),
            statistics.count
        ));
    }
}

fn check_track(track: &Track, report: &mut ValidationReport) {
    if !track.is_fragmented() {
        report
            .info
            .push("Track is not fragmented (no moof/mdat pairs)".to_string());
        return;
    }

    report.info.push(format!(
        "Track {}: {} fragments",
        track
            .id()
            .map_or_else(|| "?".to_string(), |id| id.to_string()),
        track.fragments().len()
    ));

    if track.time_scale().filter(|scale| *scale > 0).is_none() {
        report.errors.push(
            "Track has fragments but no sidx time scale; fragment timing cannot be computed"
                .to_string(),
        );
        return;
    }

    // ── Fragment continuity ────────────────────────────────────────
    for pair in track.fragments().windows(2) {
        let (Ok(end), Ok(next_start)) = (pair[0].end_time(), pair[1].start_time()) else {
            report.errors.push(format!(
                "Fragment {} timing cannot be represented",
                pair[0].position()
            ));
            continue;
        };
        if end < next_start {
            report.warnings.push(format!(
                "Gap of {}us between fragment {} and fragment {}",
                (next_start - end).num_microseconds().unwrap_or(i64::MAX),
                pair[0].position(),
                pair[1].position()
            ));
        } else if end > next_start {
            report.warnings.push(format!(
                "Fragment {} overlaps fragment {} by {}us",
                pair[0].position(),
                pair[1].position(),
                (end - next_start).num_microseconds().unwrap_or(i64::MAX)
            ));
        }
    }
}
