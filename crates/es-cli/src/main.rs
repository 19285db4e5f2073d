//! evscan CLI

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use es_analysis::AnalysisKind;
use es_hist::FlowPolicy;
use es_viz::PlotMode;

mod run;

#[derive(Parser)]
#[command(name = "evscan")]
#[command(about = "evscan - concurrent histogramming of particle-physics event files")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Event files, or directories with `--dirs`
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Treat inputs as directories; each one becomes a separately labelled set
    #[arg(short = 'd', long)]
    dirs: bool,

    /// Analyse at most this many files per set
    #[arg(short = 'm', long)]
    max_files: Option<usize>,

    /// Files analysed concurrently (0 = auto). Defaults to 2.
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Output file for the histogram artifact (pretty JSON). Defaults to stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Run configuration (YAML, or JSON by extension). Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Handling of values outside a histogram's range
    #[arg(long, value_enum)]
    flow_policy: Option<FlowArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    Drop,
    Fold,
}

impl From<FlowArg> for FlowPolicy {
    fn from(v: FlowArg) -> Self {
        match v {
            FlowArg::Drop => FlowPolicy::Drop,
            FlowArg::Fold => FlowPolicy::Fold,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Match tracks to truth particles; eta, pT and opening-angle distributions
    TrackEff {
        #[command(flatten)]
        input: InputArgs,

        /// Plot the minimum track/truth angle instead of eta
        #[arg(short = 'a', long, conflicts_with = "vs_pt")]
        min_angle: bool,

        /// Divide matched tracks by truth (tracking efficiency)
        #[arg(short = 'n', long)]
        normalize: bool,

        /// Plot against pT instead of eta
        #[arg(short = 'p', long)]
        vs_pt: bool,

        /// Print entries, mean and RMS of the drawn histograms to stderr
        #[arg(short = 's', long)]
        summary: bool,
    },

    /// Reconstructed-particle vs truth eta, split by charge
    PfoDist {
        #[command(flatten)]
        input: InputArgs,

        /// Print entries, mean and RMS of the drawn histograms to stderr
        #[arg(short = 's', long)]
        summary: bool,
    },

    /// Calorimeter cluster eta distribution
    ClusterDist {
        #[command(flatten)]
        input: InputArgs,

        /// Weight clusters by energy
        #[arg(short = 'e', long)]
        energy_weighted: bool,

        /// Print entries, mean and RMS of the drawn histograms to stderr
        #[arg(short = 's', long)]
        summary: bool,
    },

    /// Print version information
    Version,
}

impl InputArgs {
    fn into_request(self, kind: AnalysisKind) -> run::Request {
        run::Request {
            kind,
            inputs: self.inputs,
            dirs: self.dirs,
            max_files: self.max_files,
            threads: self.threads,
            output: self.output,
            config: self.config,
            flow_policy: self.flow_policy.map(FlowPolicy::from),
            normalize: false,
            energy_weighted: false,
            mode: PlotMode::Eta,
            summary: false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the artifact.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::TrackEff { input, min_angle, normalize, vs_pt, summary } => {
            let mode = if min_angle {
                PlotMode::MinAngle
            } else if vs_pt {
                PlotMode::Pt
            } else {
                PlotMode::Eta
            };
            run::execute(run::Request {
                normalize,
                mode,
                summary,
                ..input.into_request(AnalysisKind::TrackEfficiency)
            })
        }
        Commands::PfoDist { input, summary } => {
            run::execute(run::Request { summary, ..input.into_request(AnalysisKind::PfoDistribution) })
        }
        Commands::ClusterDist { input, energy_weighted, summary } => run::execute(run::Request {
            energy_weighted,
            summary,
            ..input.into_request(AnalysisKind::ClusterDistribution)
        }),
        Commands::Version => {
            println!("evscan {}", es_core::VERSION);
            Ok(())
        }
    }
}
