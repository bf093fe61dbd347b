//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that selects what to analyse and how the
//! report is derived, without widening every function signature. Tool
//! settings (executables, stream specifiers, read intervals) live on the
//! probe builders instead.
//!
//! # Example
//!
//! ```
//! use vviz::AnalysisOptions;
//!
//! let options = AnalysisOptions::new()
//!     .with_stream_position(0)
//!     .with_track_id(1)
//!     .with_clip_fragments_to_stream(true)
//!     .with_bitrate_window(25);
//! assert_eq!(options.track_id, Some(1));
//! ```

use crate::rational::Rational;

/// Options for an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct AnalysisOptions {
    /// Entry of the probe's `streams` list to analyse. Defaults to 0.
    pub stream_position: usize,
    /// Track id. `None` adopts the `track ID` of the first fragment.
    pub track_id: Option<u32>,
    /// Keep only the fragments that overlap the analysed frames. Useful when
    /// the frame probe read a limited interval while the box dump always
    /// covers the whole file.
    pub clip_fragments_to_stream: bool,
    /// Rolling bitrate window in frames. `None` uses one second's worth of
    /// frames.
    pub bitrate_window: Option<usize>,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream_position(mut self, position: usize) -> Self {
        self.stream_position = position;
        self
    }

    pub fn with_track_id(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }

    pub fn with_clip_fragments_to_stream(mut self, clip: bool) -> Self {
        self.clip_fragments_to_stream = clip;
        self
    }

    pub fn with_bitrate_window(mut self, frames: usize) -> Self {
        self.bitrate_window = Some(frames);
        self
    }

    /// The rolling window for a stream at `frame_rate`: the configured
    /// window, else the frame rate rounded to whole frames, never below 1.
    pub(crate) fn resolve_bitrate_window(&self, frame_rate: Option<Rational>) -> usize {
        let window = self.bitrate_window.unwrap_or_else(|| {
            frame_rate
                .map(|rate| rate.as_f64().round())
                .filter(|frames| frames.is_finite() && *frames >= 1.0)
                .map_or(1, |frames| frames as usize)
        });
        window.max(1)
    }
}
