//! Group of Pictures reconstruction.
//!
//! [`partition`] splits an ordered frame sequence into
//! [`GroupOfPictures`] views and [`GroupOfPicturesStatistics`] summarises the
//! result. GOPs borrow their frames from the owning
//! [`Stream`](crate::Stream) and are recomputed on every call; callers that
//! need them repeatedly keep the returned vector.
//!
//! Boundary and closed-ness use different tests: any intra frame
//! (IDR or not) starts a new GOP once the current one holds frames, but only
//! an IDR frame marks a GOP as closed. A stream whose first frame is an
//! I-frame therefore never produces an empty leading GOP.
//!
//! # Example
//!
//! ```no_run
//! use vviz::{CapturedFrameProbe, FrameProbe, Stream};
//!
//! let response = CapturedFrameProbe::new("ffprobe.json").probe()?;
//! let stream = Stream::from_probe(&response, 0)?;
//! for gop in stream.gops() {
//!     println!("{gop}"); // e.g. "GOP: IBBBP 5 CLOSED"
//! }
//! # Ok::<(), vviz::VvizError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::VvizError;
use crate::frame::{Frame, FrameKind};

/// A run of frames from one intra frame up to (excluding) the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOfPictures<'a> {
    position: usize,
    frames: Vec<&'a Frame>,
    closed: bool,
}

impl<'a> GroupOfPictures<'a> {
    /// An empty, open GOP.
    pub fn new(position: usize) -> Self {
        Self {
            position,
            frames: Vec::new(),
            closed: false,
        }
    }

    /// Append a frame. Appending an IDR frame closes the GOP.
    pub fn push(&mut self, frame: &'a Frame) {
        if frame.kind() == FrameKind::Idr {
            self.closed = true;
        }
        self.frames.push(frame);
    }

    /// 1-based position within the stream.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn frames(&self) -> &[&'a Frame] {
        &self.frames
    }

    /// `true` once the GOP contains an IDR frame.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sum of frame sizes, in bits, saturating at `u64::MAX`.
    pub fn size(&self) -> u64 {
        self.frames
            .iter()
            .fold(0_u64, |total, frame| total.saturating_add(frame.size()))
    }

    /// Start time of the first frame.
    pub fn start_time(&self) -> Result<DateTime<Utc>, VvizError> {
        self.frames
            .first()
            .ok_or(VvizError::EmptyGroupOfPictures {
                position: self.position,
            })?
            .start_time()
    }

    /// End time of the last frame.
    pub fn end_time(&self) -> Result<DateTime<Utc>, VvizError> {
        self.frames
            .last()
            .ok_or(VvizError::EmptyGroupOfPictures {
                position: self.position,
            })?
            .end_time()
    }

    pub fn duration(&self) -> Result<TimeDelta, VvizError> {
        Ok(self.end_time()? - self.start_time()?)
    }
}

impl Display for GroupOfPictures<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let codes: String = self.frames.iter().map(|frame| frame.kind().code()).collect();
        let state = if self.closed { "CLOSED" } else { "OPEN" };
        write!(f, "GOP: {codes} {} {state}", self.frames.len())
    }
}

/// Split `frames` into GOPs.
///
/// A new GOP starts at every intra frame (IDR or not) provided the current
/// GOP already holds at least one frame. An empty input yields no GOPs.
pub fn partition(frames: &[Frame]) -> Vec<GroupOfPictures<'_>> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    log::debug!(
        "Partitioning {} frames into GOPs (first frame {:?})",
        frames.len(),
        first.position()
    );

    let mut groups = Vec::new();
    let mut current = GroupOfPictures::new(1);
    for frame in frames {
        if frame.kind().is_intra() && !current.is_empty() {
            let next = GroupOfPictures::new(groups.len() + 2);
            groups.push(std::mem::replace(&mut current, next));
        }
        current.push(frame);
    }
    groups.push(current);
    groups
}

/// Summary of the GOP structure of a stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOfPicturesStatistics {
    /// Number of GOPs.
    pub count: usize,
    /// Number of GOPs containing an IDR frame.
    pub closed_count: usize,
    /// The length (in frames) of each GOP, in order.
    pub lengths: Vec<usize>,
    /// Average GOP length in frames.
    pub average_length: f64,
    /// Shortest GOP observed.
    pub min_length: usize,
    /// Longest GOP observed.
    pub max_length: usize,
}

impl GroupOfPicturesStatistics {
    pub fn from_groups(groups: &[GroupOfPictures<'_>]) -> Self {
        let lengths: Vec<usize> = groups.iter().map(GroupOfPictures::len).collect();
        let average_length = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        };

        Self {
            count: groups.len(),
            closed_count: groups.iter().filter(|gop| gop.is_closed()).count(),
            average_length,
            min_length: lengths.iter().copied().min().unwrap_or(0),
            max_length: lengths.iter().copied().max().unwrap_or(0),
            lengths,
        }
    }

    /// Number of GOPs that contain no IDR frame.
    pub fn open_count(&self) -> usize {
        self.count - self.closed_count
    }
}
