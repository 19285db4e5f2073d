//! Run configuration.
//!
//! One [`AnalysisConfig`] value is built per run (defaults, then an optional
//! YAML/JSON file, then command-line overrides), validated once, and passed by
//! reference to the scheduler and every worker.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use es_core::{Error, Result};
use es_hist::{FlowPolicy, Histogram1D};

/// Which distributions a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Match tracks to truth particles; eta/pT/opening-angle distributions.
    #[default]
    TrackEfficiency,
    /// Reconstructed-particle vs truth eta distributions by charge and species.
    PfoDistribution,
    /// Calorimeter cluster eta distribution.
    ClusterDistribution,
}

impl AnalysisKind {
    /// Kebab-case name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::TrackEfficiency => "track-eff",
            AnalysisKind::PfoDistribution => "pfo-dist",
            AnalysisKind::ClusterDistribution => "cluster-dist",
        }
    }
}

/// Collection names looked up in every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionNames {
    /// Simulated particles.
    pub mc_particles: String,
    /// Reconstructed tracks.
    pub tracks: String,
    /// Reconstructed particles.
    pub pfos: String,
    /// Calorimeter clusters.
    pub clusters: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            mc_particles: "MCParticle".to_string(),
            tracks: "Tracks".to_string(),
            pfos: "PandoraPFOCollection".to_string(),
            clusters: "ReconClusters".to_string(),
        }
    }
}

/// Selection and matching thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Cuts {
    /// Largest track/truth opening angle accepted as a match, rad.
    pub max_angle: f64,
    /// Truth particles need pT strictly above this to be counted, GeV.
    pub truth_min_pt: f64,
}

impl Default for Cuts {
    fn default() -> Self {
        Self { max_angle: 0.01, truth_min_pt: 0.5 }
    }
}

/// Uniform binning of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisSpec {
    /// Number of bins.
    pub n_bins: usize,
    /// Lower edge.
    pub min: f64,
    /// Upper edge.
    pub max: f64,
}

impl AxisSpec {
    /// Axis with `n_bins` bins over `[min, max)`.
    pub const fn new(n_bins: usize, min: f64, max: f64) -> Self {
        Self { n_bins, min, max }
    }

    /// Empty histogram with this binning.
    pub fn histogram(&self, policy: FlowPolicy) -> Result<Histogram1D> {
        Ok(Histogram1D::new(self.n_bins, self.min, self.max)?.with_flow_policy(policy))
    }
}

/// Binning of every histogram axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Binning {
    /// Pseudorapidity.
    pub eta: AxisSpec,
    /// Transverse momentum, GeV.
    pub pt: AxisSpec,
    /// Track/truth opening angle, rad.
    pub angle: AxisSpec,
}

impl Default for Binning {
    fn default() -> Self {
        Self {
            eta: AxisSpec::new(50, -5.0, 5.0),
            pt: AxisSpec::new(50, 0.5, 5.0),
            angle: AxisSpec::new(50, 0.0, 0.01),
        }
    }
}

/// Options for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Distributions to produce.
    pub kind: AnalysisKind,
    /// Maximum files analysed concurrently (0 = available parallelism).
    pub threads: usize,
    /// Analyse at most this many files per file set.
    pub max_files: Option<usize>,
    /// Collection names.
    pub collections: CollectionNames,
    /// Selection thresholds.
    pub cuts: Cuts,
    /// Histogram axes.
    pub binning: Binning,
    /// Out-of-range policy, applied to every histogram of the run.
    pub flow_policy: FlowPolicy,
    /// Weight cluster fills by cluster energy instead of 1.
    pub energy_weighted: bool,
    /// Derive track/truth efficiency histograms.
    pub normalize: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            kind: AnalysisKind::default(),
            threads: 2,
            max_files: None,
            collections: CollectionNames::default(),
            cuts: Cuts::default(),
            binning: Binning::default(),
            flow_policy: FlowPolicy::default(),
            energy_weighted: false,
            normalize: false,
        }
    }
}

impl AnalysisConfig {
    /// Default configuration for `kind`.
    pub fn for_kind(kind: AnalysisKind) -> Self {
        Self { kind, ..Self::default() }
    }

    /// Concurrency limit with `0` resolved to the available parallelism.
    pub fn effective_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
        }
    }

    /// Number of files of an `available`-sized set that will be analysed.
    pub fn files_to_process(&self, available: usize) -> usize {
        match self.max_files {
            Some(m) => available.min(m),
            None => available,
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let axes =
            [("eta", &self.binning.eta), ("pt", &self.binning.pt), ("angle", &self.binning.angle)];
        for (name, axis) in axes {
            if axis.n_bins == 0 {
                return Err(Error::Validation(format!("binning.{name}: n_bins must be > 0")));
            }
            if !(axis.min.is_finite() && axis.max.is_finite() && axis.min < axis.max) {
                return Err(Error::Validation(format!(
                    "binning.{name}: need finite min < max, got [{}, {})",
                    axis.min, axis.max
                )));
            }
        }
        if !(self.cuts.max_angle.is_finite() && self.cuts.max_angle > 0.0) {
            return Err(Error::Validation(format!(
                "cuts.max_angle must be a positive angle, got {}",
                self.cuts.max_angle
            )));
        }
        if self.cuts.truth_min_pt.is_nan() {
            return Err(Error::Validation("cuts.truth_min_pt must not be NaN".into()));
        }
        let names = [
            ("mc_particles", &self.collections.mc_particles),
            ("tracks", &self.collections.tracks),
            ("pfos", &self.collections.pfos),
            ("clusters", &self.collections.clusters),
        ];
        for (field, name) in names {
            if name.is_empty() {
                return Err(Error::Validation(format!("collections.{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// SHA-256 of the canonical JSON encoding, for provenance.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut h = Sha256::new();
        h.update(&bytes);
        Ok(format!("{:x}", h.finalize()))
    }
}

/// Load a configuration file. `.json` is parsed as JSON, anything else as YAML.
pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: AnalysisConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}
