//! High-level entry point for minimizing a user-provided `TargetFunction`.
//!
//! Runs the quasi-Newton loop and guarantees the objective's `finalize` hook
//! fires exactly once, whatever the outcome.
use crate::optimization::{
    errors::OptResult,
    quasi_newton::{
        progress::ProgressSink,
        run::run_quasi_newton,
        traits::{OptimOutcome, QuasiNewtonOptions, TargetFunction},
    },
};

/// Minimize `f` with BFGS or L-BFGS and a backtracking line search.
///
/// # Behavior
/// - Runs the optional gradient check, then evaluates `f` at its initialized
///   arguments (all ones unless `initialize_arguments` overwrites them).
/// - Iterates until the gradient vanishes, the line search runs out of step
///   size, the iteration cap is hit, or the cancellation token fires.
/// - Calls `f.finalize(Some(&theta_hat))` after a successful run that
///   accepted at least one iterate, and `f.finalize(None)` when the run
///   fails or never moved off its start point, exactly once either way.
/// - Forwards per-iteration records to `sink`, and the final outcome to
///   `sink.finish` on success.
///
/// # Errors
/// - `ZeroDimension`, `GradientCheckFailed`, validation errors for the
///   initial state, and any error raised by `evaluate`.
///
/// # Example
/// ```
/// use lbfgs_trainer::optimization::prelude::*;
///
/// struct Bowl;
/// impl TargetFunction for Bowl {
///     fn dimensionality(&self) -> usize {
///         2
///     }
///     fn evaluate(&mut self, x: &Theta, g: &mut Grad) -> OptResult<Cost> {
///         g.assign(&(x * 2.0));
///         Ok(x.dot(x))
///     }
/// }
///
/// let out = minimize(&mut Bowl, &QuasiNewtonOptions::default(), &mut CollectingSink::new())?;
/// assert!(out.converged());
/// # Ok::<(), OptError>(())
/// ```
pub fn minimize<F: TargetFunction + ?Sized>(
    f: &mut F, opts: &QuasiNewtonOptions, sink: &mut dyn ProgressSink,
) -> OptResult<OptimOutcome> {
    let result = run_quasi_newton(f, opts, sink);
    match &result {
        Ok(outcome) => {
            f.finalize((outcome.accepted > 0).then_some(&outcome.theta_hat));
            sink.finish(outcome);
        }
        Err(e) => {
            log::warn!("optimization failed: {e}");
            f.finalize(None);
        }
    }
    result
}
