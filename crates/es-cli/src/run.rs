use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use es_analysis::{AnalysisConfig, AnalysisKind, RunReport, Scheduler, collect_sets, read_config};
use es_event::JsonlSource;
use es_hist::FlowPolicy;
use es_viz::{PlotHints, PlotMode, histograms_artifact};

/// One command-line invocation, flags already parsed.
pub(crate) struct Request {
    pub kind: AnalysisKind,
    pub inputs: Vec<PathBuf>,
    pub dirs: bool,
    pub max_files: Option<usize>,
    pub threads: Option<usize>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub flow_policy: Option<FlowPolicy>,
    pub normalize: bool,
    pub energy_weighted: bool,
    pub mode: PlotMode,
    pub summary: bool,
}

/// Defaults, then the config file, then flags.
pub(crate) fn build_config(req: &Request) -> Result<AnalysisConfig> {
    let mut cfg = match &req.config {
        Some(path) => {
            let cfg = read_config(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            if cfg.kind != req.kind {
                tracing::warn!(
                    config = cfg.kind.name(),
                    command = req.kind.name(),
                    "config file names a different analysis; using the command's"
                );
            }
            cfg
        }
        None => AnalysisConfig::default(),
    };

    cfg.kind = req.kind;
    if let Some(t) = req.threads {
        cfg.threads = t;
    }
    if req.max_files.is_some() {
        cfg.max_files = req.max_files;
    }
    if let Some(p) = req.flow_policy {
        cfg.flow_policy = p;
    }
    cfg.normalize |= req.normalize;
    cfg.energy_weighted |= req.energy_weighted;

    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

/// Label of the single set built from a plain file list.
fn default_label(cfg: &AnalysisConfig) -> &str {
    match cfg.kind {
        AnalysisKind::TrackEfficiency => cfg.collections.tracks.as_str(),
        AnalysisKind::PfoDistribution => cfg.collections.pfos.as_str(),
        AnalysisKind::ClusterDistribution => cfg.collections.clusters.as_str(),
    }
}

pub(crate) fn execute(req: Request) -> Result<()> {
    let cfg = build_config(&req)?;
    let sets = collect_sets(&req.inputs, req.dirs, default_label(&cfg))
        .context("failed to collect input files")?;
    tracing::info!(
        analysis = cfg.kind.name(),
        sets = sets.len(),
        threads = cfg.effective_threads(),
        "starting"
    );

    let reports = Scheduler::new(&JsonlSource, &cfg).run_sets(&sets).context("analysis failed")?;

    let plot = PlotHints::for_run(&cfg, req.mode, req.dirs);
    if req.summary {
        print_summary(&reports, &plot)?;
    }

    let artifact = histograms_artifact(&cfg, &reports, plot)?;
    let json = serde_json::to_string_pretty(&artifact)?;
    match &req.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary(reports: &[RunReport], plot: &PlotHints) -> Result<()> {
    let mut err = std::io::stderr().lock();
    for r in reports {
        writeln!(err, "[{}] files={} events={}", r.label, r.files_processed(), r.events())?;
        for name in &plot.primary {
            let Some(h) = r.histograms.get(name) else {
                continue;
            };
            let s = h.summary();
            writeln!(
                err,
                "  {name:<20} entries={:<8} mean={:<12.6} rms={:<12.6} underflow={} overflow={}",
                s.entries, s.mean, s.rms, s.underflow, s.overflow
            )?;
        }
    }
    Ok(())
}
