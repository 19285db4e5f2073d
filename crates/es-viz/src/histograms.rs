use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use es_analysis::{AnalysisConfig, RunReport};
use es_core::{Error, Result};
use es_hist::{Histogram1D, Summary};

use crate::plot::PlotHints;

/// Artifact schema identifier.
pub const SCHEMA_VERSION: &str = "evscan_histograms_v0";

#[derive(Debug, Clone, Serialize)]
pub struct HistogramsArtifact {
    pub schema_version: String,
    pub meta: ArtifactMeta,
    pub plot: PlotHints,
    pub sets: Vec<SetArtifact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    pub tool: String,
    pub tool_version: String,
    pub created_unix_ms: u128,
    pub analysis: String,
    pub threads: usize,
    pub config_sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetArtifact {
    pub label: String,
    pub files_processed: usize,
    pub events: u64,
    pub histograms: Vec<HistogramArtifact>,
}

/// One histogram as parallel per-bin arrays.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramArtifact {
    pub name: String,
    pub n_bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub bin_edges: Vec<f64>,
    pub bin_centers: Vec<f64>,
    pub bin_values: Vec<f64>,
    pub bin_entries: Vec<u64>,
    pub bin_errors: Vec<f64>,
    pub underflow: f64,
    pub overflow: f64,
    pub nan_entries: u64,
    pub summary: Summary,
}

impl HistogramArtifact {
    /// Flatten `hist` under `name`.
    pub fn from_histogram(name: &str, hist: &Histogram1D) -> Self {
        let n = hist.n_bins();
        let mut bin_centers = Vec::with_capacity(n);
        let mut bin_values = Vec::with_capacity(n);
        let mut bin_entries = Vec::with_capacity(n);
        let mut bin_errors = Vec::with_capacity(n);
        for b in hist.bins() {
            bin_centers.push(b.center);
            bin_values.push(b.value);
            bin_entries.push(b.entries);
            bin_errors.push(b.error);
        }
        Self {
            name: name.to_string(),
            n_bins: n,
            x_min: hist.x_min(),
            x_max: hist.x_max(),
            bin_edges: hist.bin_edges(),
            bin_centers,
            bin_values,
            bin_entries,
            bin_errors,
            underflow: hist.underflow().sum_w,
            overflow: hist.overflow().sum_w,
            nan_entries: hist.nan_entries(),
            summary: hist.summary(),
        }
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Validation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

/// Build the artifact for a finished run (one report per file set).
pub fn histograms_artifact(
    config: &AnalysisConfig,
    reports: &[RunReport],
    plot: PlotHints,
) -> Result<HistogramsArtifact> {
    let sets = reports
        .iter()
        .map(|r| SetArtifact {
            label: r.label.clone(),
            files_processed: r.files_processed(),
            events: r.events(),
            histograms: r
                .histograms
                .iter()
                .map(|(name, h)| HistogramArtifact::from_histogram(name, h))
                .collect(),
        })
        .collect();

    Ok(HistogramsArtifact {
        schema_version: SCHEMA_VERSION.to_string(),
        meta: ArtifactMeta {
            tool: "evscan".to_string(),
            tool_version: es_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
            analysis: config.kind.name().to_string(),
            threads: config.effective_threads(),
            config_sha256: config.fingerprint()?,
        },
        plot,
        sets,
    })
}
