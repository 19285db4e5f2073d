//! # es-analysis
//!
//! The evscan engine: a bounded pool of per-file workers streaming derived
//! records to a single aggregator that owns every histogram of the run.
//!
//! - [`config`]: run options, loadable from YAML/JSON
//! - [`matcher`]: greedy nearest-angle track/truth association
//! - [`worker`]: per-file event loop
//! - [`scheduler`]: admission control and the aggregation loop
//! - [`aggregate`]: record routing and the final [`HistogramSet`]
//!
//! ## Example
//!
//! ```no_run
//! use es_analysis::{AnalysisConfig, Scheduler};
//! use es_event::JsonlSource;
//! use std::path::PathBuf;
//!
//! let config = AnalysisConfig::default();
//! let files = vec![PathBuf::from("run1.jsonl"), PathBuf::from("run2.jsonl")];
//! let report = Scheduler::new(&JsonlSource, &config).run(&files).unwrap();
//! let eta = report.histograms.get("track_eta").unwrap();
//! println!("matched tracks: {}", eta.entries());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod input;
pub mod matcher;
pub mod record;
pub mod scheduler;
pub mod worker;

pub use aggregate::{Aggregator, HistogramSet, SPECIES_AXIS};
pub use cancel::CancelToken;
pub use config::{AnalysisConfig, AnalysisKind, AxisSpec, Binning, CollectionNames, Cuts, read_config};
pub use input::{FileSet, collect_sets};
pub use matcher::{TrackMatch, TrackTruthMatcher, TruthCandidate};
pub use record::{ClusterResult, PfoResult, Record, TrackResult, TruthResult};
pub use scheduler::{RunReport, Scheduler, run_files};
pub use worker::{FileSummary, analyze_file};
