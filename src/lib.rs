//! # vviz
//!
//! Reconstruct the structure of an encoded video (frames, Groups of Pictures
//! and fragmented-MP4 fragments) from the JSON output of `ffprobe` and
//! `mp4dump`, and derive the size and bitrate timelines a chart needs.
//!
//! `vviz` never decodes video itself. Two external tools do the inspection:
//!
//! - `ffprobe -show_frames -show_streams -print_format json` lists every
//!   frame with its picture type, key-frame flag, timestamp and packet size;
//! - `mp4dump --format json` lists the container boxes, including the
//!   `moof`/`mdat` pairs of a fragmented MP4.
//!
//! Frames are typed into I, IDR, P and B variants, grouped into GOPs, and
//! placed on a UTC timeline together with the container fragments.
//!
//! ## Quick Start
//!
//! ### Inspect the GOP structure
//!
//! ```no_run
//! use vviz::{FfprobeCommand, FrameProbe, Stream};
//!
//! let response = FfprobeCommand::new("input.mp4").probe()?;
//! let stream = Stream::from_probe(&response, 0)?;
//! for gop in stream.gops() {
//!     println!("{gop}");
//! }
//! # Ok::<(), vviz::VvizError>(())
//! ```
//!
//! ### Reduce a box dump into fragments
//!
//! ```no_run
//! use vviz::{BoxProbe, Mp4dumpCommand, Track};
//!
//! let boxes = Mp4dumpCommand::new("input.mp4").dump()?;
//! let track = Track::from_boxes(None, &boxes)?;
//! for fragment in track.fragments() {
//!     println!("{} samples from {}", fragment.len(), fragment.start_time()?);
//! }
//! # Ok::<(), vviz::VvizError>(())
//! ```
//!
//! ### Produce a full report
//!
//! ```no_run
//! use vviz::{AnalysisOptions, CapturedBoxDump, CapturedFrameProbe, JsonSink, analysis};
//!
//! let mut sink = JsonSink::new(std::io::stdout());
//! analysis::run(
//!     &CapturedFrameProbe::new("ffprobe.json"),
//!     &CapturedBoxDump::new("mp4dump.json"),
//!     &AnalysisOptions::new(),
//!     &mut sink,
//! )?;
//! # Ok::<(), vviz::VvizError>(())
//! ```
//!
//! ## Logging
//!
//! The library logs through the [`log`](https://crates.io/crates/log)
//! facade and never installs a logger.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Assemble the stream and the track in parallel |
//! | `full` | Enables all of the above |

pub mod analysis;
pub mod boxes;
pub mod config;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod gop;
pub mod probe;
pub mod rational;
mod record;
pub mod report;
pub mod sink;
pub mod stream;
pub mod track;
pub mod utilities;
pub mod validation;

pub use analysis::{Analysis, analyze};
pub use boxes::BoxNode;
pub use config::AnalysisOptions;
pub use error::{ErrorKind, VvizError};
pub use fragment::Fragment;
pub use frame::{Frame, FrameFields, FrameKind, FrameTiming, PictureType};
pub use gop::{GroupOfPictures, GroupOfPicturesStatistics};
pub use probe::{
    BoxProbe, CapturedBoxDump, CapturedFrameProbe, FfprobeCommand, FrameProbe, Mp4dumpCommand,
    ProbeResponse,
};
pub use rational::{ParseRationalError, Rational};
pub use record::Record;
pub use report::{
    AnalysisReport, BitrateSeries, FragmentSummary, FrameSample, GopSummary, StreamSummary,
    TrackSummary,
};
pub use sink::{JsonSink, VisualizationSink};
pub use stream::{Stream, StreamDescriptor};
pub use track::Track;
pub use validation::ValidationReport;
