//! optimization — quasi-Newton minimizer, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for model training: a BFGS / L-BFGS
//! minimizer with backtracking line search, numerically stable transforms,
//! and a single error/result surface shared with the parallel evaluator and
//! the regression models.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **minimizing** differentiable objectives
//!   `f(θ)` (`quasi_newton`), including gradient verification, progress
//!   reporting and cooperative cancellation.
//! - Supply shared numerical primitives (`numerical_stability`) such as the
//!   max-shifted softmax and the curvature guard tolerance.
//! - Normalize configuration issues, numerical failures, worker faults and
//!   data errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer operates in an unconstrained parameter space `θ` and
//!   assumes inputs are finite once validation has passed; invalid states are
//!   reported as `OptError`, not panics.
//!
//! Conventions
//! -----------
//! - Parameters and gradients are `ndarray` aliases (`Theta`, `Grad`).
//! - Public entrypoints that can fail return `OptResult<T>`.
//! - Logging goes through the `log` facade; nothing here prints directly.
//!
//! Downstream usage
//! ----------------
//! - Models implement `TargetFunction` and call `minimize` with
//!   `QuasiNewtonOptions` and a `ProgressSink`.
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`.

pub mod errors;
pub mod numerical_stability;
pub mod quasi_newton;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use lbfgs_trainer::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::numerical_stability::prelude::*;
    pub use super::quasi_newton::prelude::*;
}
