//! quasi_newton — BFGS / L-BFGS minimization with backtracking line search.
//!
//! Purpose
//! -------
//! Minimize a differentiable objective `f(θ)` supplied through the
//! [`TargetFunction`] trait, using the two-loop recursion over a
//! (bounded or unbounded) curvature history and a backtracking line search.
//!
//! Key behaviors
//! -------------
//! - [`minimize`] is the single entrypoint: it optionally runs a
//!   [`GradientCheck`], iterates until a [`TerminationReason`] fires and
//!   finalizes the objective exactly once.
//! - Directions come from [`direction::two_loop_recursion`]; with an empty
//!   history they reduce to steepest descent.
//! - [`history::CurvatureHistory`] evicts the oldest pair for L-BFGS and
//!   skips pairs whose curvature `s·y` is not safely positive.
//! - [`line_search::backtrack`] starts at step `1`, shrinks by `λ` and
//!   accepts by strict decrease or the Armijo condition.
//! - Progress flows to a [`ProgressSink`]; [`LogSink`] writes a
//!   tab-separated table through `log`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **minimizes**. Objectives that maximize return `−f`.
//! - `evaluate` is pure in its arguments and writes the full gradient.
//! - All vectors are `Array1<f64>` of length `dimensionality()`, validated
//!   for finiteness at the start of a run and on every accepted step.
//!
//! Conventions
//! -----------
//! - Soft stops (step size exhausted, iteration cap, cancellation) are
//!   reported through [`OptimOutcome::termination`], not as errors.
//! - Configuration errors surface from the validated constructors of
//!   [`QuasiNewtonOptions`], [`LineSearchOptions`] and [`GradientCheck`].
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule: convergence on quadratics in
//!   `run`, `finalize` bookkeeping in `api`, window/eviction in `history`,
//!   acceptance rules in `line_search`, detection in `gradient_check`.

pub mod api;
pub mod direction;
pub mod gradient_check;
pub mod history;
pub mod line_search;
pub mod progress;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::gradient_check::GradientCheck;
pub use self::progress::{CollectingSink, LogSink, ProgressRecord, ProgressSink};
pub use self::traits::{
    Algorithm, CancellationToken, LineSearchOptions, LineSearchRule, OptimOutcome,
    QuasiNewtonOptions, TargetFunction, TerminationReason,
};
pub use self::types::{Cost, DiagnosticMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use lbfgs_trainer::optimization::quasi_newton::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::minimize;
    pub use super::gradient_check::GradientCheck;
    pub use super::progress::{CollectingSink, LogSink, ProgressRecord, ProgressSink};
    pub use super::traits::{
        Algorithm, CancellationToken, LineSearchOptions, LineSearchRule, OptimOutcome,
        QuasiNewtonOptions, TargetFunction, TerminationReason,
    };
    pub use super::types::{Cost, DiagnosticMap, Grad, Theta};
}
