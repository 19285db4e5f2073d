//! In-memory event source with open-handle accounting.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use es_core::{Error, Result};

use crate::model::Event;
use crate::source::{EventSource, EventStream};

#[derive(Debug, Default)]
struct Gauge {
    open: AtomicUsize,
    peak: AtomicUsize,
    opened: AtomicUsize,
}

/// [`EventSource`] serving events registered under synthetic paths.
///
/// Tracks how many streams are open at once, which makes it the reference
/// source for checking pool bounds.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, Arc<[Event]>>,
    event_delay: Option<Duration>,
    gauge: Arc<Gauge>,
}

impl MemorySource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `events` under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, events: Vec<Event>) {
        self.files.insert(path.into(), events.into());
    }

    /// Sleep this long before handing out each event.
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }

    /// Streams currently open.
    pub fn open_streams(&self) -> usize {
        self.gauge.open.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open streams observed.
    pub fn peak_open_streams(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }

    /// Total successful opens.
    pub fn opened_total(&self) -> usize {
        self.gauge.opened.load(Ordering::SeqCst)
    }
}

impl EventSource for MemorySource {
    type Stream = MemoryStream;

    fn open(&self, path: &Path) -> Result<MemoryStream> {
        let events = self.files.get(path).cloned().ok_or_else(|| Error::Open {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such in-memory file"),
        })?;

        let now = self.gauge.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);
        self.gauge.opened.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryStream { events, next: 0, delay: self.event_delay, gauge: Arc::clone(&self.gauge) })
    }
}

/// Stream over one registered file. Counts as open until dropped.
pub struct MemoryStream {
    events: Arc<[Event]>,
    next: usize,
    delay: Option<Duration>,
    gauge: Arc<Gauge>,
}

impl EventStream for MemoryStream {
    fn next_event(&mut self) -> Result<Option<Event>> {
        let Some(ev) = self.events.get(self.next) else {
            return Ok(None);
        };
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        self.next += 1;
        Ok(Some(ev.clone()))
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        self.gauge.open.fetch_sub(1, Ordering::SeqCst);
    }
}
