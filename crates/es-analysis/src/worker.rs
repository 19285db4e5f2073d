//! Per-file analysis.
//!
//! A worker opens one input, walks its events and turns each selected object
//! into a [`Record`] handed to `emit`. The stream is owned by the worker's
//! stack frame, so it is closed on every exit path, including errors.

use std::path::{Path, PathBuf};

use es_core::vecmath;
use es_core::{Error, Result, Species};
use es_event::{Event, EventSource, EventStream};

use crate::cancel::CancelToken;
use crate::config::{AnalysisConfig, AnalysisKind};
use crate::matcher::{TrackTruthMatcher, TruthCandidate};
use crate::record::{ClusterResult, PfoResult, Record, TrackResult, TruthResult};

/// Counters for one analysed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    /// Input path.
    pub path: PathBuf,
    /// Events read.
    pub events: u64,
    /// Records emitted.
    pub records: u64,
    /// Tracks without a truth candidate inside the cutoff.
    pub unmatched_tracks: u64,
}

/// Analyse every event of `path`, passing records to `emit`.
///
/// `emit` failing (the consumer went away) stops the file with that error.
/// Cancellation is checked before each event.
pub fn analyze_file<S, F>(
    source: &S,
    path: &Path,
    config: &AnalysisConfig,
    cancel: &CancelToken,
    mut emit: F,
) -> Result<FileSummary>
where
    S: EventSource + ?Sized,
    F: FnMut(Record) -> Result<()>,
{
    let mut stream = source.open(path)?;
    let mut analyzer = EventAnalyzer::new(config);
    let mut summary = FileSummary { path: path.to_path_buf(), ..FileSummary::default() };

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(event) = stream.next_event()? else {
            break;
        };
        summary.events += 1;
        analyzer.process(&event, &mut summary, &mut emit)?;
    }

    tracing::debug!(
        path = %path.display(),
        events = summary.events,
        records = summary.records,
        unmatched_tracks = summary.unmatched_tracks,
        "file analysed"
    );
    Ok(summary)
}

/// Event-level logic for one analysis kind. Holds the reusable matcher pool.
struct EventAnalyzer<'a> {
    config: &'a AnalysisConfig,
    matcher: TrackTruthMatcher,
}

impl<'a> EventAnalyzer<'a> {
    fn new(config: &'a AnalysisConfig) -> Self {
        Self { config, matcher: TrackTruthMatcher::new(config.cuts.max_angle) }
    }

    fn process<F>(&mut self, event: &Event, summary: &mut FileSummary, emit: &mut F) -> Result<()>
    where
        F: FnMut(Record) -> Result<()>,
    {
        let mut send = |r: Record| {
            summary.records += 1;
            emit(r)
        };
        match self.config.kind {
            AnalysisKind::TrackEfficiency => {
                let unmatched = self.track_efficiency(event, &mut send)?;
                summary.unmatched_tracks += unmatched;
                Ok(())
            }
            AnalysisKind::PfoDistribution => self.pfo_distribution(event, &mut send),
            AnalysisKind::ClusterDistribution => self.cluster_distribution(event, &mut send),
        }
    }

    /// Returns the number of unmatched tracks.
    fn track_efficiency<F>(&mut self, event: &Event, emit: &mut F) -> Result<u64>
    where
        F: FnMut(Record) -> Result<()>,
    {
        let names = &self.config.collections;
        let truth = event.mc_particles(&names.mc_particles)?;
        let tracks = event.tracks(&names.tracks)?;

        self.matcher.reset();
        for particle in truth {
            if !particle.is_final() || particle.charge == 0.0 {
                continue;
            }
            let candidate = TruthCandidate::from_particle(particle);
            if candidate.pt > self.config.cuts.truth_min_pt {
                self.matcher.push(candidate);
                emit(Record::Truth(TruthResult {
                    eta: candidate.eta,
                    pt: candidate.pt,
                    charge: candidate.charge,
                    species: candidate.species,
                    weight: 1.0,
                }))?;
            }
        }

        let mut unmatched = 0;
        for track in tracks {
            match self.matcher.match_track(track) {
                Some(m) => emit(Record::Track(TrackResult {
                    min_angle: m.angle,
                    eta: m.candidate.eta,
                    pt: m.candidate.pt,
                    charge: m.candidate.charge,
                    species: m.candidate.species,
                    weight: 1.0,
                }))?,
                None => unmatched += 1,
            }
        }
        Ok(unmatched)
    }

    fn pfo_distribution<F>(&mut self, event: &Event, emit: &mut F) -> Result<()>
    where
        F: FnMut(Record) -> Result<()>,
    {
        let names = &self.config.collections;
        let truth = event.mc_particles(&names.mc_particles)?;
        let pfos = event.reco_particles(&names.pfos)?;

        for particle in truth.iter().filter(|p| p.is_final()) {
            let direction = vecmath::normalize(particle.p);
            emit(Record::Truth(TruthResult {
                eta: vecmath::pseudorapidity(direction),
                pt: vecmath::transverse(particle.p),
                charge: particle.charge,
                species: Species::from_pdg(particle.pdg),
                weight: 1.0,
            }))?;
        }

        for pfo in pfos {
            let direction = vecmath::normalize_f32(pfo.p);
            emit(Record::Pfo(PfoResult {
                eta: vecmath::pseudorapidity(direction),
                charge: pfo.charge,
                species: Species::from_pdg(pfo.kind),
                weight: 1.0,
            }))?;
        }
        Ok(())
    }

    fn cluster_distribution<F>(&mut self, event: &Event, emit: &mut F) -> Result<()>
    where
        F: FnMut(Record) -> Result<()>,
    {
        let clusters = event.clusters(&self.config.collections.clusters)?;
        for cluster in clusters {
            let direction = vecmath::normalize_f32(cluster.position);
            let weight = if self.config.energy_weighted { f64::from(cluster.energy) } else { 1.0 };
            emit(Record::Cluster(ClusterResult { eta: vecmath::pseudorapidity(direction), weight }))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_event::{Cluster, Collection, McParticle, MemorySource, RecoParticle, Track};

    fn particle(pdg: i32, charge: f32, p: [f64; 3]) -> McParticle {
        McParticle { pdg, gen_status: 1, charge, p, mass: 0.0 }
    }

    fn run(source: &MemorySource, config: &AnalysisConfig) -> (Result<FileSummary>, Vec<Record>) {
        let mut out = Vec::new();
        let res = analyze_file(source, Path::new("f"), config, &CancelToken::new(), |r| {
            out.push(r);
            Ok(())
        });
        (res, out)
    }

    #[test]
    fn truth_selection_for_tracking() {
        let truth = vec![
            particle(211, 1.0, [2.0, 0.0, 0.0]),
            // neutral: skipped
            particle(22, 0.0, [2.0, 0.0, 0.0]),
            // below pT threshold: skipped
            particle(211, -1.0, [0.3, 0.0, 1.0]),
            // not final state: skipped
            McParticle { gen_status: 2, ..particle(211, 1.0, [2.0, 1.0, 0.0]) },
        ];
        let mut src = MemorySource::new();
        src.insert(
            "f",
            vec![
                Event::new(0)
                    .with("MCParticle", Collection::McParticles(truth))
                    .with("Tracks", Collection::Tracks(vec![])),
            ],
        );

        let (res, records) = run(&src, &AnalysisConfig::default());
        let summary = res.unwrap();
        assert_eq!(summary.events, 1);
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], Record::Truth(TruthResult { pt, .. }) if pt == 2.0));
    }

    #[test]
    fn tracks_match_and_count_misses() {
        let truth = vec![particle(11, -1.0, [1.0, 0.0, 0.0]), particle(211, 1.0, [0.0, 1.0, 0.0])];
        let tracks = vec![
            Track { phi: 0.0, tan_lambda: 0.0, omega: 0.0, d0: 0.0, z0: 0.0 },
            Track { phi: 0.0, tan_lambda: 0.0, omega: 0.0, d0: 0.0, z0: 0.0 },
            Track { phi: -1.0, tan_lambda: 0.0, omega: 0.0, d0: 0.0, z0: 0.0 },
        ];
        let mut src = MemorySource::new();
        src.insert(
            "f",
            vec![
                Event::new(0)
                    .with("MCParticle", Collection::McParticles(truth))
                    .with("Tracks", Collection::Tracks(tracks)),
            ],
        );

        let (res, records) = run(&src, &AnalysisConfig::default());
        let summary = res.unwrap();
        assert_eq!(summary.unmatched_tracks, 2);
        let matched: Vec<&TrackResult> = records
            .iter()
            .filter_map(|r| match r {
                Record::Track(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].species, Species::Electron);
        assert_eq!(matched[0].weight, 1.0);
        assert_eq!(matched[0].min_angle, 0.0);
        assert_eq!(summary.records, 3);
    }

    #[test]
    fn candidate_pool_does_not_leak_across_events() {
        let truth = vec![particle(211, 1.0, [1.0, 0.0, 0.0])];
        let track = Track { phi: 0.0, tan_lambda: 0.0, omega: 0.0, d0: 0.0, z0: 0.0 };
        let mut src = MemorySource::new();
        src.insert(
            "f",
            vec![
                Event::new(0)
                    .with("MCParticle", Collection::McParticles(truth))
                    .with("Tracks", Collection::Tracks(vec![])),
                Event::new(1)
                    .with("MCParticle", Collection::McParticles(vec![]))
                    .with("Tracks", Collection::Tracks(vec![track])),
            ],
        );

        let (res, records) = run(&src, &AnalysisConfig::default());
        assert_eq!(res.unwrap().unmatched_tracks, 1);
        assert!(records.iter().all(|r| matches!(r, Record::Truth(_))));
    }

    #[test]
    fn pfo_records_keep_every_final_particle() {
        let truth = vec![particle(22, 0.0, [0.0, 0.1, 0.0]), particle(11, -1.0, [1.0, 0.0, 1.0])];
        let pfos = vec![RecoParticle { kind: -11, charge: 1.0, p: [0.0, 3.0, 0.0], energy: 3.0 }];
        let mut src = MemorySource::new();
        src.insert(
            "f",
            vec![
                Event::new(0)
                    .with("MCParticle", Collection::McParticles(truth))
                    .with("PandoraPFOCollection", Collection::RecoParticles(pfos)),
            ],
        );

        let cfg = AnalysisConfig::for_kind(AnalysisKind::PfoDistribution);
        let (res, records) = run(&src, &cfg);
        res.unwrap();
        assert_eq!(records.len(), 3);
        match records[2] {
            Record::Pfo(p) => {
                assert_eq!(p.species, Species::Electron);
                assert_eq!(p.eta, 0.0);
                assert_eq!(p.charge, 1.0);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn cluster_weights_follow_energy_toggle() {
        let clusters = vec![Cluster { position: [100.0, 0.0, 0.0], energy: 4.0 }];
        let mut src = MemorySource::new();
        src.insert(
            "f",
            vec![Event::new(0).with("ReconClusters", Collection::Clusters(clusters))],
        );

        let mut cfg = AnalysisConfig::for_kind(AnalysisKind::ClusterDistribution);
        let (_, records) = run(&src, &cfg);
        assert_eq!(records, vec![Record::Cluster(ClusterResult { eta: 0.0, weight: 1.0 })]);

        cfg.energy_weighted = true;
        let (_, records) = run(&src, &cfg);
        assert_eq!(records, vec![Record::Cluster(ClusterResult { eta: 0.0, weight: 4.0 })]);
    }

    #[test]
    fn missing_collection_fails_the_file_and_closes_the_stream() {
        let mut src = MemorySource::new();
        src.insert(
            "f",
            vec![Event::new(3).with("MCParticle", Collection::McParticles(vec![]))],
        );

        let (res, _) = run(&src, &AnalysisConfig::default());
        match res.unwrap_err() {
            Error::MissingCollection { collection, event } => {
                assert_eq!(collection, "Tracks");
                assert_eq!(event, 3);
            }
            other => panic!("unexpected: {other}"),
        }
        assert_eq!(src.open_streams(), 0);
    }

    #[test]
    fn consumer_hangup_stops_the_file() {
        let mut src = MemorySource::new();
        let clusters = vec![Cluster { position: [1.0, 0.0, 0.0], energy: 1.0 }; 5];
        src.insert("f", vec![Event::new(0).with("ReconClusters", Collection::Clusters(clusters))]);

        let cfg = AnalysisConfig::for_kind(AnalysisKind::ClusterDistribution);
        let mut seen = 0;
        let res = analyze_file(&src, Path::new("f"), &cfg, &CancelToken::new(), |_| {
            seen += 1;
            if seen == 2 { Err(Error::Cancelled) } else { Ok(()) }
        });
        assert!(matches!(res, Err(Error::Cancelled)));
        assert_eq!(seen, 2);
        assert_eq!(src.open_streams(), 0);
    }

    #[test]
    fn cancelled_token_stops_before_reading() {
        let mut src = MemorySource::new();
        src.insert("f", vec![Event::new(0)]);
        let token = CancelToken::new();
        token.cancel();
        let cfg = AnalysisConfig::for_kind(AnalysisKind::ClusterDistribution);
        let res = analyze_file(&src, Path::new("f"), &cfg, &token, |_| Ok(()));
        assert!(matches!(res, Err(Error::Cancelled)));
    }
}
