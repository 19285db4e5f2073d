//! JSON-lines event files.
//!
//! Layout: the first non-blank line is a [`StreamHeader`], every following
//! non-blank line is one serialized [`Event`].
//!
//! ```text
//! {"format":"evscan-jsonl","version":1,"detector":"sidloi3"}
//! {"run":0,"number":0,"collections":{"MCParticle":{"kind":"mc_particles","entries":[...]}}}
//! {"run":0,"number":1,"collections":{...}}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use es_core::{Error, Result};

use crate::model::Event;
use crate::source::{EventSource, EventStream};

/// Format tag expected in the header line.
pub const FORMAT: &str = "evscan-jsonl";

/// Highest header version this reader understands.
pub const FORMAT_VERSION: u32 = 1;

/// First line of every event file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamHeader {
    /// Must equal [`FORMAT`].
    pub format: String,
    /// Format version.
    pub version: u32,
    /// Detector model the file was produced with, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector: Option<String>,
}

impl Default for StreamHeader {
    fn default() -> Self {
        Self { format: FORMAT.to_string(), version: FORMAT_VERSION, detector: None }
    }
}

/// [`EventSource`] reading JSON-lines files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlSource;

impl EventSource for JsonlSource {
    type Stream = JsonlReader;

    fn open(&self, path: &Path) -> Result<JsonlReader> {
        JsonlReader::open(path)
    }
}

/// Streaming reader over one JSON-lines event file.
pub struct JsonlReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    header: StreamHeader,
}

impl JsonlReader {
    /// Open `path` and parse its header line.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| Error::Open { path: path.clone(), source })?;
        let mut lines = BufReader::new(file).lines();
        let mut line = 0;

        let header_line = loop {
            line += 1;
            match lines.next() {
                Some(Ok(l)) if l.trim().is_empty() => continue,
                Some(Ok(l)) => break l,
                Some(Err(source)) => return Err(Error::Open { path, source }),
                None => {
                    return Err(Error::BadHeader { path, reason: "file is empty".into() });
                }
            }
        };

        let header: StreamHeader = serde_json::from_str(&header_line)
            .map_err(|e| Error::BadHeader { path: path.clone(), reason: e.to_string() })?;
        if header.format != FORMAT {
            return Err(Error::BadHeader {
                path,
                reason: format!("format '{}' is not '{FORMAT}'", header.format),
            });
        }
        if header.version == 0 || header.version > FORMAT_VERSION {
            return Err(Error::BadHeader {
                path,
                reason: format!("unsupported version {}", header.version),
            });
        }

        Ok(Self { path, lines, line, header })
    }

    /// Parsed header.
    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStream for JsonlReader {
    fn next_event(&mut self) -> Result<Option<Event>> {
        for l in self.lines.by_ref() {
            self.line += 1;
            let l = l.map_err(|source| Error::Read {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
            if l.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&l).map_err(|source| Error::Decode {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
            return Ok(Some(event));
        }
        Ok(None)
    }
}

/// Writer producing files [`JsonlReader`] can read back.
pub struct JsonlWriter {
    out: BufWriter<File>,
}

impl JsonlWriter {
    /// Create (truncate) `path` and write the header line.
    pub fn create(path: impl AsRef<Path>, header: &StreamHeader) -> Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut out, header)?;
        out.write_all(b"\n")?;
        Ok(Self { out })
    }

    /// Append one event.
    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Flush buffered output.
    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Write `events` to `path` with a default header.
pub fn write_events(path: impl AsRef<Path>, events: &[Event]) -> Result<()> {
    let mut w = JsonlWriter::create(path, &StreamHeader::default())?;
    for ev in events {
        w.write_event(ev)?;
    }
    w.finish()
}
