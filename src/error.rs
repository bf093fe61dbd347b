//! Error types for the `vviz` crate.
//!
//! This module defines [`VvizError`], the unified error type returned by all
//! fallible operations in the crate, and [`ErrorKind`], which sorts its
//! variants into broad categories (malformed record, missing configuration,
//! missing data, unexpected box layout, external tool failure). Errors carry
//! enough context to locate the offending record: entity kind and position,
//! stream index, or box path.

use std::io::Error as IoError;

use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `vviz` operations.
///
/// Every public method that can fail returns `Result<T, VvizError>`.
/// Nothing is recovered locally: a malformed input fails the whole analysis
/// run, which logs the error once at the run boundary
/// ([`analyze`](crate::analysis::analyze)).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VvizError {
    /// A raw JSON record lacks a required field.
    #[error("{entity} record is missing required field `{field}`")]
    MissingField {
        /// The record being parsed (e.g. `"frame 12"`, `"stream 0"`).
        entity: String,
        /// Name of the absent field.
        field: String,
    },

    /// A raw JSON record carries a field with a value of the wrong shape.
    #[error("{entity} record has an invalid `{field}`: {reason}")]
    InvalidField {
        /// The record being parsed.
        entity: String,
        /// Name of the offending field.
        field: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// A derived value was requested on an entity that lacks the setting it
    /// depends on (frame rate, time base, time scale).
    #[error("{entity} has no {setting} configured")]
    MissingConfiguration {
        /// The entity the computation was requested on.
        entity: String,
        /// The missing setting.
        setting: &'static str,
    },

    /// The frame probe returned no streams at all.
    #[error("No streams found in probe response")]
    NoStreams,

    /// The requested stream position does not exist in the probe response.
    #[error("Stream {position} is out of range (probe response has {stream_count} streams)")]
    StreamOutOfRange {
        /// Requested position in the probe's stream list.
        position: usize,
        /// Number of streams in the probe response.
        stream_count: usize,
    },

    /// No video frame records matched the stream.
    #[error("No video frames found for stream {stream_index}")]
    NoFrames {
        /// The stream index frames were filtered on.
        stream_index: u32,
    },

    /// A track has no fragments where at least one was required.
    #[error("No fragments found in track")]
    NoFragments,

    /// A time-based value was requested on an empty GOP.
    #[error("GOP {position} contains no frames")]
    EmptyGroupOfPictures {
        /// Position of the empty GOP.
        position: usize,
    },

    /// A timestamp cannot be represented as a UTC instant.
    #[error("{entity} timestamp of {micros}us is out of range")]
    TimestampOutOfRange {
        /// The entity the timestamp belongs to.
        entity: String,
        /// Offset from the epoch in microseconds.
        micros: i128,
    },

    /// A box tree does not have the layout the fragment reducer relies on.
    #[error("Unexpected box layout at {path}: expected {expected}")]
    UnexpectedBoxLayout {
        /// Slash-separated path to the box that was inspected.
        path: String,
        /// What was expected to be there.
        expected: String,
    },

    /// An external tool could not be started.
    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        /// Executable that was invoked.
        tool: String,
        /// Underlying OS error.
        source: IoError,
    },

    /// An external tool ran but exited unsuccessfully.
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        /// Executable that was invoked.
        tool: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// JSON input could not be parsed, or a report could not be serialised.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),
}

/// Broad category of a [`VvizError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A raw record is missing a field or has a mis-shaped value.
    Record,
    /// A derived computation lacks its frame rate, time base or time scale.
    Configuration,
    /// Streams, frames or fragments are absent where at least one is needed.
    Data,
    /// A box tree breaks the fixed-layout assumptions of the fragment reducer.
    Structure,
    /// An external tool failed to start or exited unsuccessfully.
    Probe,
    /// File I/O or JSON (de)serialisation failed.
    Io,
}

impl VvizError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VvizError::MissingField { .. } | VvizError::InvalidField { .. } => ErrorKind::Record,
            VvizError::MissingConfiguration { .. } => ErrorKind::Configuration,
            VvizError::NoStreams
            | VvizError::StreamOutOfRange { .. }
            | VvizError::NoFrames { .. }
            | VvizError::NoFragments
            | VvizError::EmptyGroupOfPictures { .. }
            | VvizError::TimestampOutOfRange { .. } => ErrorKind::Data,
            VvizError::UnexpectedBoxLayout { .. } => ErrorKind::Structure,
            VvizError::ToolLaunch { .. } | VvizError::ToolFailed { .. } => ErrorKind::Probe,
            VvizError::IoError(_) | VvizError::JsonError(_) => ErrorKind::Io,
        }
    }
}
