//! Greedy nearest-angle association of tracks to truth particles.
//!
//! Tracks are taken in stream order. Each one claims the remaining truth
//! candidate with the smallest opening angle, if that angle is below the
//! cutoff, and the claimed candidate leaves the pool. The assignment is
//! therefore order-dependent and not the minimum-total-angle assignment: an
//! early track can take a candidate that a later track was closer to.

use es_core::vecmath::{self, Vec3};
use es_core::Species;
use es_event::{McParticle, Track};

/// A truth particle eligible for matching, with precomputed kinematics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthCandidate {
    /// Unit momentum direction.
    pub direction: Vec3,
    /// Pseudorapidity.
    pub eta: f64,
    /// Transverse momentum, GeV.
    pub pt: f64,
    /// Charge in units of e.
    pub charge: f32,
    /// Species from the PDG code.
    pub species: Species,
}

impl TruthCandidate {
    /// Derive direction, eta and pT from a truth particle's momentum.
    pub fn from_particle(particle: &McParticle) -> Self {
        let direction = vecmath::normalize(particle.p);
        Self {
            direction,
            eta: vecmath::pseudorapidity(direction),
            pt: vecmath::transverse(particle.p),
            charge: particle.charge,
            species: Species::from_pdg(particle.pdg),
        }
    }
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackMatch {
    /// Opening angle to the matched candidate, rad.
    pub angle: f64,
    /// The candidate, now removed from the pool.
    pub candidate: TruthCandidate,
}

/// Per-event candidate pool plus the greedy matching step.
#[derive(Debug, Clone)]
pub struct TrackTruthMatcher {
    max_angle: f64,
    pool: Vec<TruthCandidate>,
}

impl TrackTruthMatcher {
    /// Empty pool accepting matches with angle `< max_angle`.
    pub fn new(max_angle: f64) -> Self {
        Self { max_angle, pool: Vec::new() }
    }

    /// Drop all candidates; call at every event boundary.
    pub fn reset(&mut self) {
        self.pool.clear();
    }

    /// Append a candidate. Pool order is insertion order.
    pub fn push(&mut self, candidate: TruthCandidate) {
        self.pool.push(candidate);
    }

    /// Candidates not yet matched in this event.
    pub fn remaining(&self) -> &[TruthCandidate] {
        &self.pool
    }

    /// Match a reconstructed track. See [`TrackTruthMatcher::match_direction`].
    pub fn match_track(&mut self, track: &Track) -> Option<TrackMatch> {
        self.match_direction(vecmath::direction_from_track(track.phi(), track.tan_lambda()))
    }

    /// Match a unit direction against the remaining pool.
    ///
    /// The closest candidate wins; on equal angles the earlier one does, and a
    /// NaN angle never wins. On success the candidate is removed, keeping the
    /// order of the others.
    pub fn match_direction(&mut self, direction: Vec3) -> Option<TrackMatch> {
        let mut best: Option<(usize, f64)> = None;
        for (i, c) in self.pool.iter().enumerate() {
            let angle = vecmath::opening_angle(direction, c.direction);
            if angle < best.map_or(f64::INFINITY, |(_, a)| a) {
                best = Some((i, angle));
            }
        }

        let (idx, angle) = best?;
        if angle >= self.max_angle {
            return None;
        }
        let candidate = self.pool.remove(idx);
        Some(TrackMatch { angle, candidate })
    }
}
