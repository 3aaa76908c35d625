//! The quasi-Newton iteration loop.
//!
//! Drives a [`TargetFunction`] from its initialized arguments through
//! direction → line search → curvature update until one of the
//! [`TerminationReason`]s fires, and packages the final state into an
//! [`OptimOutcome`]. `finalize` is *not* called here; see `api::minimize`.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::{
        direction::{normalize, two_loop_recursion},
        history::{CurvatureHistory, HistoryUpdate},
        line_search::{LineSearchOutcome, backtrack},
        progress::{ProgressRecord, ProgressSink},
        traits::{OptimOutcome, QuasiNewtonOptions, TargetFunction, TerminationReason},
        types::{DiagnosticMap, Grad, Theta},
        validation::{validate_arguments, validate_grad, validate_value},
    },
};
use ndarray::Array1;

/// Run the optimizer loop.
///
/// # Errors
/// - Configuration errors from [`QuasiNewtonOptions::validate`], raised
///   before any evaluation.
/// - [`OptError::ZeroDimension`] for objectives without parameters.
/// - `GradientCheckFailed` when a configured gradient check fails.
/// - Validation errors for the initial point, value or gradient.
/// - Any error raised by `evaluate` during the run.
pub fn run_quasi_newton<F: TargetFunction + ?Sized>(
    f: &mut F, opts: &QuasiNewtonOptions, sink: &mut dyn ProgressSink,
) -> OptResult<OptimOutcome> {
    opts.validate()?;
    let dim = f.dimensionality();
    if dim == 0 {
        return Err(OptError::ZeroDimension);
    }
    if let Some(check) = &opts.gradient_check {
        check.verify(f)?;
    }

    let mut x: Theta = Array1::ones(dim);
    f.initialize_arguments(&mut x);
    validate_arguments(&x, dim)?;

    let mut g: Grad = Array1::zeros(dim);
    let mut value = f.evaluate(&x, &mut g)?;
    validate_value(value)?;
    validate_grad(&g, dim)?;
    let mut evaluations = 1;
    let mut grad_norm = l2_norm(&g);

    sink.begin(&opts.algorithm, opts.max_iter, &f.diagnostic_names());

    let mut history = CurvatureHistory::for_algorithm(&opts.algorithm);
    let mut iterations = 0;
    let mut accepted = 0;

    let termination = loop {
        if grad_norm <= opts.tol_grad {
            break TerminationReason::GradientVanished;
        }
        if iterations >= opts.max_iter {
            break TerminationReason::IterationLimitReached;
        }
        if opts.is_cancelled() {
            break TerminationReason::Aborted;
        }
        iterations += 1;

        let mut direction = two_loop_recursion(&g, &history);
        if opts.normalize_direction {
            normalize(&mut direction);
        }

        let step = match backtrack(
            f,
            &x,
            value,
            &g,
            &direction,
            &opts.line_search,
            opts.cancellation.as_ref(),
            &mut evaluations,
        )? {
            LineSearchOutcome::Accepted(step) => step,
            LineSearchOutcome::Exhausted { last_step } => {
                log::info!("line search exhausted at iteration {iterations}, step={last_step:.3e}");
                break TerminationReason::StepSizeExhausted;
            }
            LineSearchOutcome::Aborted => break TerminationReason::Aborted,
        };
        accepted += 1;

        let new_norm = l2_norm(&step.gradient);
        if new_norm > opts.tol_grad {
            let s = &step.arguments - &x;
            let y = &step.gradient - &g;
            match history.push(iterations, s, y) {
                HistoryUpdate::SkippedCurvature { sy } => {
                    log::debug!("skipping curvature update at iteration {iterations}: s·y={sy:e}");
                }
                HistoryUpdate::Evicted { evicted_iteration } => {
                    log::trace!("evicted curvature pair from iteration {evicted_iteration}");
                }
                HistoryUpdate::Stored => {}
            }
        }

        x = step.arguments;
        g = step.gradient;
        value = step.value;
        grad_norm = new_norm;

        let mut diagnostics = DiagnosticMap::new();
        f.report_diagnostics(&mut diagnostics);
        sink.record(&ProgressRecord {
            iteration: iterations,
            value,
            grad_norm,
            step: step.step,
            history_len: history.len(),
            diagnostics,
        });
    };

    OptimOutcome::new(
        x,
        value,
        grad_norm,
        iterations,
        accepted,
        evaluations,
        history.len(),
        termination,
    )
}

// ---- Helper Methods ----

fn l2_norm(v: &Grad) -> f64 {
    v.dot(v).sqrt()
}
