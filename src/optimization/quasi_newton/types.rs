//! quasi_newton::types — shared numeric aliases and optimizer defaults.
//!
//! Purpose
//! -------
//! Centralize the core numeric types and default constants used by the
//! quasi-Newton driver, so the rest of the optimization code stays agnostic
//! to `ndarray` generics and shares one set of defaults.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients and scalar
//!   objective values (`Theta`, `Grad`, `Cost`).
//! - Provide the diagnostics map type written by objectives after an
//!   evaluation (`DiagnosticMap`).
//! - Expose the default constants for line search, convergence and history
//!   size, matching the values the optimizer has always shipped with.
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors are `ndarray::Array1<f64>` of equal length once a
//!   run starts.
//! - `Cost` is the value being **minimized**.
//!
//! Testing notes
//! -------------
//! - This module only defines type aliases and constants; correctness is
//!   exercised by the modules that instantiate them.
use ndarray::Array1;
use std::collections::BTreeMap;

/// Parameter vector `θ` handed to objectives.
pub type Theta = Array1<f64>;

/// Gradient vector `∇f(θ)`, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value being minimized.
pub type Cost = f64;

/// Named diagnostic scalars reported after an evaluation (e.g. `"Accuracy"`).
///
/// Ordered so progress output lists diagnostics in a stable order.
pub type DiagnosticMap = BTreeMap<String, f64>;

/// Default cap on optimizer iterations.
pub const DEFAULT_MAX_ITER: usize = 100;

/// Default history window (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_WINDOW: usize = 10;

/// Default multiplicative decay applied to a rejected step size.
pub const DEFAULT_LINE_SEARCH_DECAY: f64 = 0.6;

/// Default smallest step size tried before the line search gives up.
pub const DEFAULT_MIN_STEP: f64 = 1e-5;

/// Default gradient-norm threshold for convergence.
pub const DEFAULT_TOL_GRAD: f64 = 1e-6;

/// Default Armijo coefficient when sufficient decrease is requested.
pub const DEFAULT_ARMIJO_C: f64 = 1e-4;

/// Default number of gradient-check rounds.
pub const DEFAULT_CHECK_ROUNDS: usize = 10;

/// Default perturbation (and tolerance) of the gradient check.
pub const DEFAULT_CHECK_EPSILON: f64 = 1e-4;
