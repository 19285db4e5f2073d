//! Event data model: named, typed collections of simulation and
//! reconstruction records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use es_core::{Error, Result, Vec3, Vec3f};

/// Generator status of a particle that left the generator stage ("final state").
pub const GEN_STATUS_FINAL: i32 = 1;

/// A simulated ("truth") particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McParticle {
    /// PDG particle code.
    pub pdg: i32,
    /// Generator status (1 = final state).
    pub gen_status: i32,
    /// Electric charge in units of e.
    pub charge: f32,
    /// Momentum at the production vertex, GeV.
    pub p: Vec3,
    /// Mass, GeV.
    #[serde(default)]
    pub mass: f64,
}

impl McParticle {
    /// Whether the particle is a final-state generator particle.
    pub fn is_final(&self) -> bool {
        self.gen_status == GEN_STATUS_FINAL
    }
}

/// A reconstructed track, parameterized at its reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Azimuthal angle of the momentum at the reference point.
    pub phi: f32,
    /// Tangent of the dip angle λ.
    pub tan_lambda: f32,
    /// Signed curvature, 1/mm.
    #[serde(default)]
    pub omega: f32,
    /// Transverse impact parameter, mm.
    #[serde(default)]
    pub d0: f32,
    /// Longitudinal impact parameter, mm.
    #[serde(default)]
    pub z0: f32,
}

impl Track {
    /// Azimuth, widened.
    pub fn phi(&self) -> f64 {
        f64::from(self.phi)
    }

    /// tan λ, widened.
    pub fn tan_lambda(&self) -> f64 {
        f64::from(self.tan_lambda)
    }
}

/// A reconstructed particle (particle-flow object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoParticle {
    /// Particle-type hypothesis as a PDG code.
    #[serde(rename = "type")]
    pub kind: i32,
    /// Electric charge in units of e.
    pub charge: f32,
    /// Momentum, GeV.
    pub p: Vec3f,
    /// Energy, GeV.
    #[serde(default)]
    pub energy: f32,
}

/// A calorimeter cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Energy-weighted position, mm.
    pub position: Vec3f,
    /// Deposited energy, GeV.
    pub energy: f32,
}

/// One named collection of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum Collection {
    /// Simulated particles.
    McParticles(Vec<McParticle>),
    /// Reconstructed tracks.
    Tracks(Vec<Track>),
    /// Reconstructed particles.
    RecoParticles(Vec<RecoParticle>),
    /// Calorimeter clusters.
    Clusters(Vec<Cluster>),
}

impl Collection {
    /// Record kind stored in this collection.
    pub fn kind(&self) -> &'static str {
        match self {
            Collection::McParticles(_) => "mc_particles",
            Collection::Tracks(_) => "tracks",
            Collection::RecoParticles(_) => "reco_particles",
            Collection::Clusters(_) => "clusters",
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            Collection::McParticles(v) => v.len(),
            Collection::Tracks(v) => v.len(),
            Collection::RecoParticles(v) => v.len(),
            Collection::Clusters(v) => v.len(),
        }
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One event: a run/event number and its named collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Run number.
    #[serde(default)]
    pub run: i32,
    /// Event number within the run.
    pub number: u64,
    /// Collections by name.
    pub collections: BTreeMap<String, Collection>,
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty, $kind:literal) => {
        $(#[$doc])*
        pub fn $fn_name(&self, name: &str) -> Result<&[$ty]> {
            match self.get(name)? {
                Collection::$variant(v) => Ok(v),
                other => Err(Error::TypeMismatch {
                    collection: name.to_string(),
                    expected: $kind,
                    found: other.kind(),
                }),
            }
        }
    };
}

impl Event {
    /// Empty event with the given number.
    pub fn new(number: u64) -> Self {
        Self { run: 0, number, collections: BTreeMap::new() }
    }

    /// Builder-style insert of a collection.
    pub fn with(mut self, name: impl Into<String>, collection: Collection) -> Self {
        self.collections.insert(name.into(), collection);
        self
    }

    /// Look up a collection by name.
    pub fn get(&self, name: &str) -> Result<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| Error::MissingCollection { collection: name.to_string(), event: self.number })
    }

    typed_accessor!(
        /// Simulated particles stored under `name`.
        mc_particles, McParticles, McParticle, "mc_particles"
    );
    typed_accessor!(
        /// Tracks stored under `name`.
        tracks, Tracks, Track, "tracks"
    );
    typed_accessor!(
        /// Reconstructed particles stored under `name`.
        reco_particles, RecoParticles, RecoParticle, "reco_particles"
    );
    typed_accessor!(
        /// Clusters stored under `name`.
        clusters, Clusters, Cluster, "clusters"
    );
}
