//! # es-viz
//!
//! Visualization data artifacts for evscan.
//!
//! Rendering is left to external tools; this crate only emits plot-friendly
//! JSON (parallel arrays instead of nested objects) plus the title, axis
//! labels and histogram selection a renderer needs.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Histogram-set artifact.
pub mod histograms;

/// Titles, axis labels and histogram selection per analysis mode.
pub mod plot;

pub use histograms::{
    ArtifactMeta, HistogramArtifact, HistogramsArtifact, SCHEMA_VERSION, SetArtifact,
    histograms_artifact,
};
pub use plot::{PlotHints, PlotMode};
