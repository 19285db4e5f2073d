//! Particle species derived from PDG particle-type codes.

use serde::{Deserialize, Serialize};

/// Coarse particle species used to split distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// e±
    Electron,
    /// π±, π0
    Pion,
    /// p, p̄
    Proton,
    /// γ
    Photon,
    /// n, n̄
    Neutron,
    /// Anything else.
    Other,
}

impl Species {
    /// All species in axis order.
    pub const ALL: [Species; 6] = [
        Species::Electron,
        Species::Pion,
        Species::Proton,
        Species::Photon,
        Species::Neutron,
        Species::Other,
    ];

    /// Classify a PDG code. Antiparticles map to the same species.
    pub fn from_pdg(pdg: i32) -> Self {
        match pdg.unsigned_abs() {
            11 => Species::Electron,
            111 | 211 => Species::Pion,
            2212 => Species::Proton,
            22 => Species::Photon,
            2112 => Species::Neutron,
            _ => Species::Other,
        }
    }

    /// Position on the species axis (`0..6`).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Species::Electron => "electron",
            Species::Pion => "pion",
            Species::Proton => "proton",
            Species::Photon => "photon",
            Species::Neutron => "neutron",
            Species::Other => "other",
        }
    }
}
