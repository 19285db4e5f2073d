//! Per-object results streamed from workers to the aggregator.
//!
//! Each record carries only what the histograms need and is moved across the
//! channel by value.

use es_core::Species;

/// A selected truth particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthResult {
    /// Pseudorapidity.
    pub eta: f64,
    /// Transverse momentum, GeV.
    pub pt: f64,
    /// Charge in units of e.
    pub charge: f32,
    /// Species from the PDG code.
    pub species: Species,
    /// Fill weight.
    pub weight: f64,
}

/// A track matched to a truth particle. Kinematics are the truth particle's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackResult {
    /// Opening angle between track and matched truth direction, rad.
    pub min_angle: f64,
    /// Truth pseudorapidity.
    pub eta: f64,
    /// Truth transverse momentum, GeV.
    pub pt: f64,
    /// Truth charge.
    pub charge: f32,
    /// Truth species.
    pub species: Species,
    /// Fill weight, the same as the matched truth particle's.
    pub weight: f64,
}

/// A reconstructed particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PfoResult {
    /// Pseudorapidity.
    pub eta: f64,
    /// Charge in units of e.
    pub charge: f32,
    /// Species from the particle-type hypothesis.
    pub species: Species,
    /// Fill weight.
    pub weight: f64,
}

/// A calorimeter cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterResult {
    /// Pseudorapidity of the cluster position.
    pub eta: f64,
    /// 1, or the cluster energy for energy-weighted runs.
    pub weight: f64,
}

/// Any result a worker can emit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    /// Selected truth particle.
    Truth(TruthResult),
    /// Matched track.
    Track(TrackResult),
    /// Reconstructed particle.
    Pfo(PfoResult),
    /// Cluster.
    Cluster(ClusterResult),
}
