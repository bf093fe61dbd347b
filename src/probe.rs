//! Probe data sources.
//!
//! The analysis consumes two JSON documents produced by external tools:
//!
//! - the frame/stream inspection (`ffprobe -show_frames -show_streams
//!   -print_format json`), yielded by a [`FrameProbe`] as a
//!   [`ProbeResponse`];
//! - the container box dump (`mp4dump --format json`), yielded by a
//!   [`BoxProbe`] as a list of [`BoxNode`]s.
//!
//! [`FfprobeCommand`] and [`Mp4dumpCommand`] run the tools;
//! [`CapturedFrameProbe`] and [`CapturedBoxDump`] read output captured
//! earlier. A [`ProbeResponse`] is itself a [`FrameProbe`], which is handy for
//! tests and for callers that obtained the JSON some other way.
//!
//! Tool invocations are blocking, with no timeout and no retry. Any failure
//! is returned as an error and ends the run.
//!
//! # Example
//!
//! ```no_run
//! use vviz::{BoxProbe, FfprobeCommand, FrameProbe, Mp4dumpCommand};
//!
//! let frames = FfprobeCommand::new("input.mp4")
//!     .with_read_intervals("%+10")
//!     .probe()?;
//! let boxes = Mp4dumpCommand::new("input.mp4").dump()?;
//! println!("{} frame records, {} top-level boxes", frames.frames().len(), boxes.len());
//! # Ok::<(), vviz::VvizError>(())
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::boxes::{self, BoxNode};
use crate::error::VvizError;
use crate::record::Record;

/// A source of frame/stream inspection data.
pub trait FrameProbe {
    fn probe(&self) -> Result<ProbeResponse, VvizError>;
}

/// A source of container box dumps.
pub trait BoxProbe {
    fn dump(&self) -> Result<Vec<BoxNode>, VvizError>;
}

/// Parsed frame/stream inspection output.
///
/// Records are kept raw; [`Stream`](crate::Stream) and
/// [`Frame`](crate::Frame) parse the fields they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResponse {
    #[serde(default)]
    streams: Vec<Record>,
    #[serde(default)]
    frames: Vec<Record>,
}

impl ProbeResponse {
    pub fn new(streams: Vec<Record>, frames: Vec<Record>) -> Self {
        Self { streams, frames }
    }

    pub fn from_value(value: Value) -> Result<Self, VvizError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, VvizError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Stream descriptor records, in probe order.
    pub fn streams(&self) -> &[Record] {
        &self.streams
    }

    /// Frame records, in probe emission order.
    pub fn frames(&self) -> &[Record] {
        &self.frames
    }

    /// Video frame records belonging to `stream_index`, in emission order.
    ///
    /// Records without a `media_type` or `stream_index` never match.
    pub fn video_frames_for_stream(&self, stream_index: u32) -> impl Iterator<Item = &Record> {
        self.frames.iter().filter(move |record| {
            record.get("media_type").and_then(Value::as_str) == Some("video")
                && record.get("stream_index").and_then(Value::as_u64)
                    == Some(u64::from(stream_index))
        })
    }
}

impl FrameProbe for ProbeResponse {
    fn probe(&self) -> Result<ProbeResponse, VvizError> {
        Ok(self.clone())
    }
}

/// Runs `ffprobe` and parses its JSON output.
#[derive(Debug, Clone)]
#[must_use]
pub struct FfprobeCommand {
    executable: OsString,
    input: PathBuf,
    streams: String,
    read_intervals: Option<String>,
}

impl FfprobeCommand {
    /// Probe `input` with the `ffprobe` found on `PATH`, first video stream
    /// only (`-select_streams v:0`).
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            executable: OsString::from("ffprobe"),
            input: input.as_ref().to_path_buf(),
            streams: "v:0".to_string(),
            read_intervals: None,
        }
    }

    pub fn with_executable<S: Into<OsString>>(mut self, executable: S) -> Self {
        self.executable = executable.into();
        self
    }

    /// Stream specifier passed to `-select_streams`.
    pub fn with_streams<S: Into<String>>(mut self, streams: S) -> Self {
        self.streams = streams.into();
        self
    }

    /// Interval specification passed to `-read_intervals`.
    pub fn with_read_intervals<S: Into<String>>(mut self, intervals: S) -> Self {
        self.read_intervals = Some(intervals.into());
        self
    }

    /// The command that [`probe`](FrameProbe::probe) runs.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.executable);
        command.args(["-hide_banner", "-loglevel", "warning"]);
        command.arg("-select_streams").arg(&self.streams);
        if let Some(intervals) = &self.read_intervals {
            command.arg("-read_intervals").arg(intervals);
        }
        command.args(["-show_frames", "-show_streams", "-print_format", "json"]);
        command.arg(&self.input);
        command
    }
}

impl FrameProbe for FfprobeCommand {
    fn probe(&self) -> Result<ProbeResponse, VvizError> {
        log::info!(
            "Running {} to extract stream and frame information from {}",
            self.executable.to_string_lossy(),
            self.input.display()
        );
        let stdout = run_tool(self.command(), &self.executable)?;
        ProbeResponse::from_json_str(&stdout)
    }
}

/// Runs `mp4dump` and parses its JSON output.
#[derive(Debug, Clone)]
#[must_use]
pub struct Mp4dumpCommand {
    executable: OsString,
    input: PathBuf,
}

impl Mp4dumpCommand {
    /// Dump `input` with the `mp4dump` found on `PATH`.
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            executable: OsString::from("mp4dump"),
            input: input.as_ref().to_path_buf(),
        }
    }

    pub fn with_executable<S: Into<OsString>>(mut self, executable: S) -> Self {
        self.executable = executable.into();
        self
    }

    /// The command that [`dump`](BoxProbe::dump) runs.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.executable);
        command.args(["--format", "json"]);
        command.arg(&self.input);
        command
    }
}

impl BoxProbe for Mp4dumpCommand {
    fn dump(&self) -> Result<Vec<BoxNode>, VvizError> {
        log::info!(
            "Running {} to extract track and fragment information from {}",
            self.executable.to_string_lossy(),
            self.input.display()
        );
        let stdout = run_tool(self.command(), &self.executable)?;
        boxes::parse_box_list(&stdout)
    }
}

/// Reads ffprobe JSON captured to a file.
#[derive(Debug, Clone)]
pub struct CapturedFrameProbe {
    path: PathBuf,
}

impl CapturedFrameProbe {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FrameProbe for CapturedFrameProbe {
    fn probe(&self) -> Result<ProbeResponse, VvizError> {
        log::debug!("Reading captured probe output from {}", self.path.display());
        ProbeResponse::from_json_str(&fs::read_to_string(&self.path)?)
    }
}

/// Reads mp4dump JSON captured to a file.
#[derive(Debug, Clone)]
pub struct CapturedBoxDump {
    path: PathBuf,
}

impl CapturedBoxDump {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BoxProbe for CapturedBoxDump {
    fn dump(&self) -> Result<Vec<BoxNode>, VvizError> {
        log::debug!("Reading captured box dump from {}", self.path.display());
        boxes::parse_box_list(&fs::read_to_string(&self.path)?)
    }
}

fn run_tool(mut command: Command, executable: &OsString) -> Result<String, VvizError> {
    let tool = executable.to_string_lossy().into_owned();
    let output = command.output().map_err(|source| VvizError::ToolLaunch {
        tool: tool.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(VvizError::ToolFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
