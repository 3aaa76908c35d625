//! numerical_stability — guarded transforms and shared tolerances.
//!
//! Purpose
//! -------
//! Collect the numerically stable scalar and vector transforms used by the
//! optimizer and the logistic objective, together with the small tolerances
//! that guard divisions in the quasi-Newton update.
//!
//! Key behaviors
//! -------------
//! - Provide a max-shifted softmax with a pinned reference class
//!   (`softmax_with_reference`) that also returns its log-normalizer, so
//!   large logits never overflow.
//! - Centralize `CURVATURE_EPS`, the lower bound on `s·y` that a curvature
//!   pair must exceed to enter the history, and `GENERAL_TOL`.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state; it is
//!   pure numerical helpers suitable for tight inner loops.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas on
//!   safe grids and finite output for extreme logits.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{CURVATURE_EPS, GENERAL_TOL, softmax_with_reference};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::transformations::{CURVATURE_EPS, softmax_with_reference};
}
