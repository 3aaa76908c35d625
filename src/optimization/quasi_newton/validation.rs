//! Validation helpers for quasi-Newton optimization.
//!
//! This module centralizes the consistency checks used across the optimizer
//! interface:
//!
//! - **Option checks**: [`verify_tol_grad`], [`verify_max_iter`],
//!   [`verify_decay`], [`verify_min_step`], [`verify_armijo_c`] and
//!   [`verify_epsilon`] reject non-finite or out-of-range configuration.
//! - **Vector validation**: [`validate_arguments`] and [`validate_grad`]
//!   enforce correct dimension and finite entries.
//! - **Objective values**: [`validate_value`] checks objective outputs for
//!   finiteness.
//! - **Final parameters**: [`validate_theta_hat`] ensures the reported
//!   estimate contains only finite values.
//!
//! These helpers standardize error reporting by returning domain-specific
//! [`OptError`] variants, keeping higher-level code uniform.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::types::{Grad, Theta},
};

/// Validate the gradient-norm convergence threshold.
///
/// The value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate the iteration cap.
///
/// # Errors
/// Returns [`OptError::InvalidMaxIter`] if `max_iter == 0`.
pub fn verify_max_iter(max_iter: usize) -> OptResult<()> {
    if max_iter == 0 {
        return Err(OptError::InvalidMaxIter {
            max_iter,
            reason: "Maximum iterations must be greater than zero.",
        });
    }
    Ok(())
}

/// Validate the multiplicative step decay `λ` of the backtracking search.
///
/// # Errors
/// Returns [`OptError::InvalidLineSearchDecay`] unless `0 < λ < 1`.
pub fn verify_decay(decay: f64) -> OptResult<()> {
    if !decay.is_finite() || decay <= 0.0 || decay >= 1.0 {
        return Err(OptError::InvalidLineSearchDecay {
            decay,
            reason: "Decay must lie strictly between 0 and 1.",
        });
    }
    Ok(())
}

/// Validate the minimum step size of the backtracking search.
///
/// The search always starts at a step of `1.0`, so the floor must sit below
/// it.
///
/// # Errors
/// Returns [`OptError::InvalidMinStepSize`] unless `0 < min_step < 1`.
pub fn verify_min_step(min_step: f64) -> OptResult<()> {
    if !min_step.is_finite() || min_step <= 0.0 || min_step >= 1.0 {
        return Err(OptError::InvalidMinStepSize {
            min_step,
            reason: "Minimum step size must lie strictly between 0 and 1.",
        });
    }
    Ok(())
}

/// Validate the Armijo sufficient-decrease coefficient.
///
/// # Errors
/// Returns [`OptError::InvalidSufficientDecrease`] unless `0 < c < 1`.
pub fn verify_armijo_c(c: f64) -> OptResult<()> {
    if !c.is_finite() || c <= 0.0 || c >= 1.0 {
        return Err(OptError::InvalidSufficientDecrease {
            c,
            reason: "Coefficient must lie strictly between 0 and 1.",
        });
    }
    Ok(())
}

/// Validate a finite-difference perturbation.
///
/// # Errors
/// Returns [`OptError::InvalidEpsilon`] if the value is non-finite or ≤ 0.0.
pub fn verify_epsilon(epsilon: f64) -> OptResult<()> {
    if !epsilon.is_finite() {
        return Err(OptError::InvalidEpsilon { epsilon, reason: "Epsilon must be finite." });
    }
    if epsilon <= 0.0 {
        return Err(OptError::InvalidEpsilon { epsilon, reason: "Epsilon must be positive." });
    }
    Ok(())
}

/// Validate an argument vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::ArgumentDimMismatch`] if `theta.len() != dim`.
/// - [`OptError::InvalidThetaHat`] for the first non-finite entry.
pub fn validate_arguments(theta: &Theta, dim: usize) -> OptResult<()> {
    if theta.len() != dim {
        return Err(OptError::ArgumentDimMismatch { expected: dim, found: theta.len() });
    }
    validate_theta_hat(theta)
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate that a parameter vector holds only finite values.
///
/// # Errors
/// Returns [`OptError::InvalidThetaHat`] for the first non-finite element.
pub fn validate_theta_hat(theta: &Theta) -> OptResult<()> {
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate that a scalar objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}
