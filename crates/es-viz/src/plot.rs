use serde::{Deserialize, Serialize};

use es_analysis::{AnalysisConfig, AnalysisKind};

/// What the x axis of a tracking plot shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotMode {
    /// Pseudorapidity.
    #[default]
    Eta,
    /// Track/truth opening angle of matched tracks.
    MinAngle,
    /// Transverse momentum.
    Pt,
}

/// Title, axis labels and the histograms to draw, in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotHints {
    pub title: String,
    pub x_label: String,
    pub y_label: Option<String>,
    pub primary: Vec<String>,
}

impl PlotHints {
    /// Hints for a run. `mode` only matters for track-efficiency runs;
    /// `multi_set` is true when inputs were grouped by directory.
    pub fn for_run(config: &AnalysisConfig, mode: PlotMode, multi_set: bool) -> Self {
        match config.kind {
            AnalysisKind::TrackEfficiency => tracking(config.normalize, mode, multi_set),
            AnalysisKind::PfoDistribution => PlotHints {
                title: if multi_set { "PFO Comparison" } else { "PFO/Truth Comparison" }.into(),
                x_label: "eta".into(),
                y_label: Some("count".into()),
                primary: names(&["truth_charged_eta", "pfo_charged_eta", "truth_neutral_eta", "pfo_neutral_eta"]),
            },
            AnalysisKind::ClusterDistribution => PlotHints {
                title: "Cluster Distribution".into(),
                x_label: "eta".into(),
                y_label: Some(if config.energy_weighted { "energy (arb)" } else { "count" }.into()),
                primary: names(&["cluster_eta"]),
            },
        }
    }
}

fn tracking(normalize: bool, mode: PlotMode, multi_set: bool) -> PlotHints {
    let title = if normalize {
        "Tracking Efficiency"
    } else if multi_set {
        "Tracking Comparison"
    } else {
        "Tracking/Truth Comparison"
    };
    let (x_label, primary) = match (mode, normalize) {
        (PlotMode::MinAngle, _) => ("min. angular deviation", names(&["min_angle"])),
        (PlotMode::Pt, true) => ("p_T {GeV}", names(&["efficiency_pt"])),
        (PlotMode::Pt, false) => ("p_T {GeV}", names(&["truth_pt", "track_pt"])),
        (PlotMode::Eta, true) => ("eta", names(&["efficiency_eta"])),
        (PlotMode::Eta, false) => ("eta", names(&["truth_eta", "track_eta"])),
    };
    PlotHints { title: title.into(), x_label: x_label.into(), y_label: None, primary }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_titles() {
        let mut cfg = AnalysisConfig::default();
        assert_eq!(PlotHints::for_run(&cfg, PlotMode::Eta, false).title, "Tracking/Truth Comparison");
        assert_eq!(PlotHints::for_run(&cfg, PlotMode::Eta, true).title, "Tracking Comparison");
        cfg.normalize = true;
        let h = PlotHints::for_run(&cfg, PlotMode::Pt, true);
        assert_eq!(h.title, "Tracking Efficiency");
        assert_eq!(h.x_label, "p_T {GeV}");
        assert_eq!(h.primary, vec!["efficiency_pt"]);
    }

    #[test]
    fn min_angle_ignores_normalization() {
        let cfg = AnalysisConfig { normalize: true, ..AnalysisConfig::default() };
        let h = PlotHints::for_run(&cfg, PlotMode::MinAngle, false);
        assert_eq!(h.x_label, "min. angular deviation");
        assert_eq!(h.primary, vec!["min_angle"]);
    }

    #[test]
    fn cluster_y_label_follows_weighting() {
        let mut cfg = AnalysisConfig::for_kind(AnalysisKind::ClusterDistribution);
        assert_eq!(PlotHints::for_run(&cfg, PlotMode::Eta, false).y_label.as_deref(), Some("count"));
        cfg.energy_weighted = true;
        let h = PlotHints::for_run(&cfg, PlotMode::Pt, false);
        assert_eq!(h.y_label.as_deref(), Some("energy (arb)"));
        assert_eq!(h.x_label, "eta");
    }

    #[test]
    fn pfo_titles() {
        let cfg = AnalysisConfig::for_kind(AnalysisKind::PfoDistribution);
        assert_eq!(PlotHints::for_run(&cfg, PlotMode::Eta, false).title, "PFO/Truth Comparison");
        assert_eq!(PlotHints::for_run(&cfg, PlotMode::Eta, true).title, "PFO Comparison");
    }
}
