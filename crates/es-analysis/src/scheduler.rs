//! Bounded worker pool and aggregation loop.
//!
//! The coordinating thread admits at most `threads` file workers at a time.
//! Workers push records and, once their stream is closed, one completion over
//! zero-capacity channels. The coordinator waits on both with `select!`,
//! routes records into the [`Aggregator`] and admits the next file whenever a
//! completion frees a slot. The run ends when every admitted worker has
//! completed, or on the first failure.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, bounded, select};

use es_core::{Error, Result};
use es_event::EventSource;

use crate::aggregate::{Aggregator, HistogramSet};
use crate::cancel::CancelToken;
use crate::config::AnalysisConfig;
use crate::input::FileSet;
use crate::record::Record;
use crate::worker::{FileSummary, analyze_file};

/// Result of one run over one file set.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// File-set label.
    pub label: String,
    /// Final histograms.
    pub histograms: HistogramSet,
    /// Per-file counters, in completion order.
    pub files: Vec<FileSummary>,
    /// Records routed into histograms.
    pub records: u64,
}

impl RunReport {
    /// Number of files analysed.
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    /// Events read across all files.
    pub fn events(&self) -> u64 {
        self.files.iter().map(|f| f.events).sum()
    }
}

type Completion = Result<FileSummary>;

/// Runs file sets through a bounded pool of workers.
pub struct Scheduler<'a, S: EventSource + ?Sized> {
    source: &'a S,
    config: &'a AnalysisConfig,
    cancel: CancelToken,
}

impl<'a, S: EventSource + ?Sized> Scheduler<'a, S> {
    /// Scheduler reading through `source` with `config`.
    pub fn new(source: &'a S, config: &'a AnalysisConfig) -> Self {
        Self { source, config, cancel: CancelToken::new() }
    }

    /// Stop runs when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Analyse each set in turn. Stops at the first failing set.
    pub fn run_sets(&self, sets: &[FileSet]) -> Result<Vec<RunReport>> {
        sets.iter().map(|set| self.run_labelled(&set.label, &set.files)).collect()
    }

    /// Analyse `files` as one unlabelled set.
    pub fn run(&self, files: &[PathBuf]) -> Result<RunReport> {
        self.run_labelled("", files)
    }

    /// Analyse `files` under `label`.
    pub fn run_labelled(&self, label: &str, files: &[PathBuf]) -> Result<RunReport> {
        self.config.validate()?;
        let to_process = self.config.files_to_process(files.len());
        let limit = self.config.effective_threads();
        let files = &files[..to_process];
        let started = Instant::now();

        tracing::info!(label, files = to_process, threads = limit, kind = self.config.kind.name(), "run started");

        let run_cancel = self.cancel.child();
        let mut aggregator = Aggregator::new(self.config)?;
        let source = self.source;
        let config = self.config;

        let summaries = thread::scope(|scope| {
            let (record_tx, record_rx) = bounded::<Record>(0);
            let (done_tx, done_rx) = bounded::<Completion>(0);

            let worker_cancel = run_cancel.clone();
            let admit = move |i: usize| {
                let path = files[i].as_path();
                let records = record_tx.clone();
                let done = done_tx.clone();
                let token = worker_cancel.clone();
                tracing::debug!(path = %path.display(), "worker admitted");
                scope.spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        analyze_file(source, path, config, &token, |r| {
                            records.send(r).map_err(|_| Error::Cancelled)
                        })
                    }))
                    .unwrap_or_else(|payload| {
                        Err(Error::Worker { path: path.to_path_buf(), reason: panic_message(&*payload) })
                    });
                    // The coordinator may already have given up; nothing to report to.
                    let _ = done.send(outcome);
                });
            };

            let outcome = drain(&mut aggregator, record_rx, done_rx, to_process, limit, admit);
            if outcome.is_err() {
                run_cancel.cancel();
            }
            outcome
        })?;

        let records = aggregator.accepted();
        let histograms = aggregator.finish()?;
        let report = RunReport { label: label.to_string(), histograms, files: summaries, records };
        tracing::info!(
            label,
            files = report.files_processed(),
            events = report.events(),
            records,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }
}

/// Coordinator loop. Owns the receiving ends, so returning (on any path)
/// disconnects the channels and unblocks workers stuck in `send`.
fn drain<F>(
    aggregator: &mut Aggregator,
    records: Receiver<Record>,
    done: Receiver<Completion>,
    to_process: usize,
    limit: usize,
    mut admit: F,
) -> Result<Vec<FileSummary>>
where
    F: FnMut(usize),
{
    let mut submitted = 0;
    let mut finished = 0;
    let mut summaries = Vec::with_capacity(to_process);

    while submitted < to_process.min(limit) {
        admit(submitted);
        submitted += 1;
    }

    while finished < submitted {
        select! {
            recv(records) -> msg => {
                let record = msg.map_err(|_| disconnected())?;
                aggregator.accept(record);
            }
            recv(done) -> msg => {
                let summary = msg.map_err(|_| disconnected())??;
                finished += 1;
                tracing::debug!(path = %summary.path.display(), finished, submitted, "worker completed");
                summaries.push(summary);
                if submitted < to_process {
                    admit(submitted);
                    submitted += 1;
                }
            }
        }
    }
    Ok(summaries)
}

fn disconnected() -> Error {
    Error::Worker { path: PathBuf::new(), reason: "result channel disconnected".into() }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Analyse a single file set with a fresh scheduler. Convenience for callers
/// that do not need cancellation.
pub fn run_files<S: EventSource + ?Sized>(
    source: &S,
    config: &AnalysisConfig,
    files: &[impl AsRef<Path>],
) -> Result<RunReport> {
    let files: Vec<PathBuf> = files.iter().map(|p| p.as_ref().to_path_buf()).collect();
    Scheduler::new(source, config).run(&files)
}
