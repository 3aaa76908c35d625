//! Per-iteration progress reporting.
//!
//! The optimizer emits one [`ProgressRecord`] per accepted iteration to a
//! [`ProgressSink`]. [`LogSink`] renders a tab-separated table through the
//! `log` facade; [`CollectingSink`] keeps the records for later inspection.
use crate::optimization::quasi_newton::{
    traits::{Algorithm, OptimOutcome},
    types::{Cost, DiagnosticMap},
};

/// Snapshot of the optimizer after an accepted iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    /// 1-based iteration number.
    pub iteration: usize,
    pub value: Cost,
    pub grad_norm: f64,
    pub step: f64,
    /// Curvature pairs stored after this iteration's update.
    pub history_len: usize,
    pub diagnostics: DiagnosticMap,
}

/// Receiver of optimizer progress.
///
/// `begin` and `finish` default to no-ops; `record` is required.
pub trait ProgressSink {
    fn begin(&mut self, _algorithm: &Algorithm, _max_iter: usize, _diagnostic_names: &[String]) {}

    fn record(&mut self, record: &ProgressRecord);

    fn finish(&mut self, _outcome: &OptimOutcome) {}
}

/// Writes a tab-separated progress table at `info` level.
///
/// Columns: `Iteration`, `Target Function`, `Gradient Norm`, then one column
/// per diagnostic name in the order reported at `begin`.
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    columns: Vec<String>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header line for the given diagnostic columns.
    pub fn header(diagnostic_names: &[String]) -> String {
        let mut line = String::from("Iteration\tTarget Function\tGradient Norm");
        for name in diagnostic_names {
            line.push('\t');
            line.push_str(name);
        }
        line
    }

    /// One table row. Diagnostics missing from the record render as `NaN`.
    pub fn row(&self, record: &ProgressRecord) -> String {
        let mut line =
            format!("{}\t{:.6}\t{:.6}", record.iteration, record.value, record.grad_norm);
        for name in &self.columns {
            let value = record.diagnostics.get(name).copied().unwrap_or(f64::NAN);
            line.push_str(&format!("\t{value:.6}"));
        }
        line
    }
}

impl ProgressSink for LogSink {
    fn begin(&mut self, algorithm: &Algorithm, max_iter: usize, diagnostic_names: &[String]) {
        self.columns = diagnostic_names.to_vec();
        log::info!("{algorithm} minimization... max_iter={max_iter}");
        log::info!("{}", Self::header(&self.columns));
    }

    fn record(&mut self, record: &ProgressRecord) {
        log::info!("{}", self.row(record));
    }

    fn finish(&mut self, outcome: &OptimOutcome) {
        log::info!(
            "{} after {} iterations ({} evaluations): value={:.6} grad_norm={:.3e}",
            outcome.termination,
            outcome.iterations,
            outcome.evaluations,
            outcome.value,
            outcome.grad_norm
        );
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub diagnostic_names: Vec<String>,
    pub records: Vec<ProgressRecord>,
    pub finished: bool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for CollectingSink {
    fn begin(&mut self, _algorithm: &Algorithm, _max_iter: usize, diagnostic_names: &[String]) {
        self.diagnostic_names = diagnostic_names.to_vec();
    }

    fn record(&mut self, record: &ProgressRecord) {
        self.records.push(record.clone());
    }

    fn finish(&mut self, _outcome: &OptimOutcome) {
        self.finished = true;
    }
}
