//! Report consumers.

use std::io::Write;

use crate::error::VvizError;
use crate::report::AnalysisReport;

/// Receives the derived metric series of an analysis run.
///
/// Rendering (charts, HTML) is left to implementors.
pub trait VisualizationSink {
    fn render(&mut self, report: &AnalysisReport) -> Result<(), VvizError>;
}

/// Writes the report as JSON to any [`Write`] target.
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    /// Compact JSON followed by a newline.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> VisualizationSink for JsonSink<W> {
    fn render(&mut self, report: &AnalysisReport) -> Result<(), VvizError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, report)?;
        } else {
            serde_json::to_writer(&mut self.writer, report)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
