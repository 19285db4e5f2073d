//! # es-event
//!
//! Event data model and event sources for evscan.
//!
//! An event is a set of named collections (`MCParticle`, `Tracks`,
//! `PandoraPFOCollection`, `ReconClusters`, ...). Analyses pull events through
//! the [`EventSource`] / [`EventStream`] pair, so the on-disk format is a
//! detail of the source.
//!
//! ## Example
//!
//! ```no_run
//! use es_event::{EventSource, EventStream, JsonlSource};
//!
//! let mut stream = JsonlSource.open("events.jsonl".as_ref()).unwrap();
//! while let Some(ev) = stream.next_event().unwrap() {
//!     let truth = ev.mc_particles("MCParticle").unwrap();
//!     println!("event {}: {} truth particles", ev.number, truth.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod jsonl;
pub mod memory;
pub mod model;
pub mod source;

pub use jsonl::{JsonlReader, JsonlSource, JsonlWriter, StreamHeader, write_events};
pub use memory::{MemorySource, MemoryStream};
pub use model::{Cluster, Collection, Event, GEN_STATUS_FINAL, McParticle, RecoParticle, Track};
pub use source::{EventSource, EventStream};
