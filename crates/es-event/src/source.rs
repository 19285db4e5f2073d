//! Event source abstraction.
//!
//! The analysis engine never parses files itself. It asks an [`EventSource`]
//! to open a path and then pulls events from the returned [`EventStream`]
//! until it is exhausted. Dropping the stream releases the underlying handle.

use std::path::Path;

use es_core::Result;

use crate::model::Event;

/// A forward-only stream of events from one input.
pub trait EventStream {
    /// Next event, or `None` once the stream is exhausted.
    fn next_event(&mut self) -> Result<Option<Event>>;
}

/// Opens event streams by path. Shared by reference across worker threads.
pub trait EventSource: Sync {
    /// Stream type produced by [`EventSource::open`].
    type Stream: EventStream;

    /// Open `path` and validate its stream header.
    fn open(&self, path: &Path) -> Result<Self::Stream>;
}

impl<S: EventSource> EventSource for &S {
    type Stream = S::Stream;

    fn open(&self, path: &Path) -> Result<Self::Stream> {
        (**self).open(path)
    }
}
