//! Routing of result records into the histograms of a run.
//!
//! The [`Aggregator`] owns every histogram and is driven from the
//! coordinating thread only. Truth, track and PFO records share one layout
//! per category: an inclusive eta histogram, charged/neutral eta split on the
//! charge, an electron-only eta histogram and a species histogram.

use std::collections::BTreeMap;

use es_core::{Result, Species};
use es_hist::{FlowPolicy, Histogram1D, ratio};

use crate::config::{AnalysisConfig, AnalysisKind, AxisSpec};
use crate::record::{ClusterResult, PfoResult, Record, TrackResult, TruthResult};

/// Binning of species histograms: one unit-wide bin per [`Species`] index.
pub const SPECIES_AXIS: AxisSpec = AxisSpec::new(Species::ALL.len(), 0.0, Species::ALL.len() as f64);

/// Named histograms produced by a run, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct HistogramSet {
    hists: BTreeMap<String, Histogram1D>,
}

impl HistogramSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace `name`.
    pub fn insert(&mut self, name: impl Into<String>, hist: Histogram1D) {
        self.hists.insert(name.into(), hist);
    }

    /// Histogram called `name`, if the run produced one.
    pub fn get(&self, name: &str) -> Option<&Histogram1D> {
        self.hists.get(name)
    }

    /// `(name, histogram)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Histogram1D)> {
        self.hists.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Histogram names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hists.keys().map(String::as_str)
    }

    /// Number of histograms.
    pub fn len(&self) -> usize {
        self.hists.len()
    }

    /// True when the set holds no histograms.
    pub fn is_empty(&self) -> bool {
        self.hists.is_empty()
    }
}

#[derive(Debug)]
struct CategoryHists {
    prefix: &'static str,
    eta: Histogram1D,
    charged_eta: Histogram1D,
    neutral_eta: Histogram1D,
    electron_eta: Histogram1D,
    species: Histogram1D,
}

impl CategoryHists {
    fn new(prefix: &'static str, eta: &AxisSpec, policy: FlowPolicy) -> Result<Self> {
        let base = eta.histogram(policy)?;
        Ok(Self {
            prefix,
            charged_eta: base.empty_like(),
            neutral_eta: base.empty_like(),
            electron_eta: base.empty_like(),
            eta: base,
            species: SPECIES_AXIS.histogram(policy)?,
        })
    }

    fn fill(&mut self, eta: f64, charge: f32, species: Species, weight: f64) {
        self.eta.fill(eta, weight);
        if charge != 0.0 {
            self.charged_eta.fill(eta, weight);
        } else {
            self.neutral_eta.fill(eta, weight);
        }
        if species == Species::Electron {
            self.electron_eta.fill(eta, weight);
        }
        self.species.fill(species.index() as f64, weight);
    }

    fn store(self, out: &mut HistogramSet) {
        let p = self.prefix;
        out.insert(format!("{p}_eta"), self.eta);
        out.insert(format!("{p}_charged_eta"), self.charged_eta);
        out.insert(format!("{p}_neutral_eta"), self.neutral_eta);
        out.insert(format!("{p}_electron_eta"), self.electron_eta);
        out.insert(format!("{p}_species"), self.species);
    }
}

#[derive(Debug)]
struct TrackingHists {
    truth_pt: Histogram1D,
    track_pt: Histogram1D,
    min_angle: Histogram1D,
}

/// Single-threaded consumer of [`Record`]s.
#[derive(Debug)]
pub struct Aggregator {
    kind: AnalysisKind,
    normalize: bool,
    truth: Option<CategoryHists>,
    reco: Option<CategoryHists>,
    tracking: Option<TrackingHists>,
    cluster_eta: Option<Histogram1D>,
    accepted: u64,
    rejected: u64,
}

impl Aggregator {
    /// Empty histograms for the configured analysis kind.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let policy = config.flow_policy;
        let eta = &config.binning.eta;
        let mut agg = Self {
            kind: config.kind,
            normalize: config.normalize,
            truth: None,
            reco: None,
            tracking: None,
            cluster_eta: None,
            accepted: 0,
            rejected: 0,
        };
        match config.kind {
            AnalysisKind::TrackEfficiency => {
                let pt = config.binning.pt.histogram(policy)?;
                agg.truth = Some(CategoryHists::new("truth", eta, policy)?);
                agg.reco = Some(CategoryHists::new("track", eta, policy)?);
                agg.tracking = Some(TrackingHists {
                    track_pt: pt.empty_like(),
                    truth_pt: pt,
                    min_angle: config.binning.angle.histogram(policy)?,
                });
            }
            AnalysisKind::PfoDistribution => {
                agg.truth = Some(CategoryHists::new("truth", eta, policy)?);
                agg.reco = Some(CategoryHists::new("pfo", eta, policy)?);
            }
            AnalysisKind::ClusterDistribution => {
                agg.cluster_eta = Some(eta.histogram(policy)?);
            }
        }
        Ok(agg)
    }

    /// Route one record. Records that do not belong to the run's analysis
    /// kind are counted and ignored.
    pub fn accept(&mut self, record: Record) {
        let routed = match record {
            Record::Truth(r) => self.on_truth(r),
            Record::Track(r) => self.on_track(r),
            Record::Pfo(r) => self.on_pfo(r),
            Record::Cluster(r) => self.on_cluster(r),
        };
        if routed {
            self.accepted += 1;
        } else {
            self.rejected += 1;
            tracing::warn!(kind = self.kind.name(), ?record, "record does not belong to this analysis");
        }
    }

    /// Records routed into histograms so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Records ignored so far.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn on_truth(&mut self, r: TruthResult) -> bool {
        let Some(truth) = self.truth.as_mut() else {
            return false;
        };
        truth.fill(r.eta, r.charge, r.species, r.weight);
        if let Some(t) = self.tracking.as_mut() {
            t.truth_pt.fill(r.pt, r.weight);
        }
        true
    }

    fn on_track(&mut self, r: TrackResult) -> bool {
        let (Some(reco), Some(t)) = (self.reco.as_mut(), self.tracking.as_mut()) else {
            return false;
        };
        reco.fill(r.eta, r.charge, r.species, r.weight);
        t.track_pt.fill(r.pt, r.weight);
        t.min_angle.fill(r.min_angle, r.weight);
        true
    }

    fn on_pfo(&mut self, r: PfoResult) -> bool {
        if self.kind != AnalysisKind::PfoDistribution {
            return false;
        }
        let Some(reco) = self.reco.as_mut() else {
            return false;
        };
        reco.fill(r.eta, r.charge, r.species, r.weight);
        true
    }

    fn on_cluster(&mut self, r: ClusterResult) -> bool {
        let Some(h) = self.cluster_eta.as_mut() else {
            return false;
        };
        h.fill(r.eta, r.weight);
        true
    }

    /// Final histogram set, with efficiency ratios for normalized tracking runs.
    pub fn finish(self) -> Result<HistogramSet> {
        let mut out = HistogramSet::new();
        if let Some(c) = self.truth {
            c.store(&mut out);
        }
        if let Some(c) = self.reco {
            c.store(&mut out);
        }
        if let Some(t) = self.tracking {
            out.insert("truth_pt", t.truth_pt);
            out.insert("track_pt", t.track_pt);
            out.insert("min_angle", t.min_angle);
        }
        if let Some(h) = self.cluster_eta {
            out.insert("cluster_eta", h);
        }

        if self.normalize && self.kind == AnalysisKind::TrackEfficiency {
            let pairs = [
                ("efficiency_eta", "track_eta", "truth_eta"),
                ("efficiency_pt", "track_pt", "truth_pt"),
            ];
            for (name, num, den) in pairs {
                if let (Some(n), Some(d)) = (out.get(num), out.get(den)) {
                    let eff = ratio(n, d)?;
                    out.insert(name, eff);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn truth(eta: f64, charge: f32, species: Species) -> Record {
        Record::Truth(TruthResult { eta, pt: 1.0, charge, species, weight: 1.0 })
    }

    #[test]
    fn tracking_layout() {
        let agg = Aggregator::new(&AnalysisConfig::default()).unwrap();
        let set = agg.finish().unwrap();
        let names: Vec<&str> = set.names().collect();
        for expected in
            ["truth_eta", "truth_charged_eta", "track_eta", "track_species", "truth_pt", "min_angle"]
        {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert!(set.get("efficiency_eta").is_none());
        assert!(set.get("cluster_eta").is_none());
        assert_eq!(set.get("track_species").unwrap().n_bins(), 6);
    }

    #[test]
    fn routing_by_charge_and_species() {
        let mut agg =
            Aggregator::new(&AnalysisConfig::for_kind(AnalysisKind::PfoDistribution)).unwrap();
        agg.accept(truth(0.1, 0.0, Species::Photon));
        agg.accept(truth(0.1, -1.0, Species::Electron));
        agg.accept(Record::Pfo(PfoResult { eta: -2.2, charge: 1.0, species: Species::Pion, weight: 1.0 }));
        let set = agg.finish().unwrap();

        assert_eq!(set.get("truth_eta").unwrap().entries(), 2);
        assert_eq!(set.get("truth_neutral_eta").unwrap().entries(), 1);
        assert_eq!(set.get("truth_charged_eta").unwrap().entries(), 1);
        assert_eq!(set.get("truth_electron_eta").unwrap().entries(), 1);
        let species = set.get("truth_species").unwrap();
        assert_eq!(species.content(Species::Electron.index()).entries, 1);
        assert_eq!(species.content(Species::Photon.index()).entries, 1);
        assert_eq!(set.get("pfo_charged_eta").unwrap().entries(), 1);
        assert_eq!(set.get("pfo_species").unwrap().content(Species::Pion.index()).entries, 1);
    }

    #[test]
    fn foreign_records_are_ignored() {
        let mut agg =
            Aggregator::new(&AnalysisConfig::for_kind(AnalysisKind::ClusterDistribution)).unwrap();
        agg.accept(truth(0.0, 1.0, Species::Pion));
        agg.accept(Record::Cluster(ClusterResult { eta: 0.0, weight: 2.5 }));
        assert_eq!(agg.accepted(), 1);
        assert_eq!(agg.rejected(), 1);
        let set = agg.finish().unwrap();
        assert_eq!(set.len(), 1);
        assert_relative_eq!(set.get("cluster_eta").unwrap().sum_w(), 2.5);
    }

    #[test]
    fn normalized_tracking_adds_efficiencies() {
        let cfg = AnalysisConfig { normalize: true, ..AnalysisConfig::default() };
        let mut agg = Aggregator::new(&cfg).unwrap();
        agg.accept(truth(0.05, 1.0, Species::Pion));
        agg.accept(truth(0.05, 1.0, Species::Pion));
        agg.accept(Record::Track(TrackResult {
            min_angle: 0.001,
            eta: 0.05,
            pt: 1.0,
            charge: 1.0,
            species: Species::Pion,
            weight: 1.0,
        }));
        let set = agg.finish().unwrap();

        let eff = set.get("efficiency_eta").unwrap();
        assert_eq!(eff.entries(), 1);
        let bin = eff.find_bin(0.05).unwrap();
        assert_relative_eq!(eff.bin(bin).value, 0.5);
        assert_eq!(set.get("efficiency_pt").unwrap().entries(), 1);
    }

    #[test]
    fn track_weight_reaches_every_tracking_histogram() {
        let mut agg = Aggregator::new(&AnalysisConfig::default()).unwrap();
        agg.accept(Record::Track(TrackResult {
            min_angle: 0.002,
            eta: -0.4,
            pt: 3.0,
            charge: -1.0,
            species: Species::Electron,
            weight: 2.5,
        }));
        let set = agg.finish().unwrap();

        for name in ["track_eta", "track_charged_eta", "track_electron_eta", "track_pt", "min_angle"] {
            assert_relative_eq!(set.get(name).unwrap().sum_w(), 2.5);
        }
        assert_relative_eq!(
            set.get("track_species").unwrap().content(Species::Electron.index()).sum_w,
            2.5
        );
    }
}
