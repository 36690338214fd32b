//! Machine-readable batch reports in JSON and JSONL.
//!
//! JSON mode collects every record into one array. JSONL mode writes one
//! record per line as files finish, which keeps partial reports useful when a
//! batch is interrupted.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{BatchStats, ConversionReport};

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Single JSON array
    #[default]
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    summary: &'a BatchStats,
}

/// Streams [`ConversionReport`]s to a writer.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<ConversionReport>,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects JSON mode.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            items_written: 0,
        }
    }

    /// Record one finished file.
    pub fn write_report(&mut self, report: &ConversionReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.pending.push(report.clone()),
            OutputFormat::JsonLines => {
                self.write_line(report)?;
                self.writer.flush()?;
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Close the report. JSONL gets a trailing `{"summary": ...}` line; JSON
    /// writes the collected array.
    pub fn finish(&mut self, stats: &BatchStats) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let items = std::mem::take(&mut self.pending);
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, &items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, &items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                self.write_line(&SummaryRecord { summary: stats })?;
            }
        }
        self.writer.flush()
    }

    fn write_line<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        // JSONL is never pretty-printed
        serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        writeln!(self.writer)
    }

    /// Number of file records accepted so far.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
