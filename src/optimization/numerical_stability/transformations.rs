//! Numerical stability utilities.
//!
//! Provides safe implementations of the nonlinear transforms used by the
//! quasi-Newton driver and the multinomial logistic objective that are prone
//! to overflow/underflow in naïve form. Exponentials are always taken of
//! max-shifted arguments so `f64` arithmetic stays well-conditioned.
//!
//! # Provided items
//! - [`CURVATURE_EPS`]: lower bound on `s·y` for a curvature pair to be
//!   admitted into the quasi-Newton history.
//! - [`GENERAL_TOL`]: generic denominator guard.
//! - [`softmax_with_reference`]: class probabilities when the last class is
//!   pinned to logit `0`, plus their log-normalizer.

/// Minimum curvature `s·y` accepted by the history update.
///
/// Pairs with `s·y` at or below this value (or non-finite) would make
/// `ρ = 1 / (s·y)` blow up or flip the sign of the inverse-Hessian
/// approximation, so they are skipped.
pub const CURVATURE_EPS: f64 = 1e-10;

/// Generic guard for denominators that may degenerate to zero.
pub const GENERAL_TOL: f64 = 1e-12;

/// Softmax over `K = logits.len() + 1` classes where the last class is the
/// reference with logit `0`.
///
/// Returns the `K` probabilities, which sum to one, together with
/// `ln(1 + Σ exp(zⱼ))` so callers can form `-ln pₖ = lse − zₖ` without
/// recomputing it. The maximum `m = max(0, max zⱼ)` is factored out before
/// exponentiating.
pub fn softmax_with_reference(logits: &[f64]) -> (Vec<f64>, f64) {
    let m = logits.iter().copied().fold(0.0_f64, f64::max);
    let mut probabilities: Vec<f64> = logits.iter().map(|z| (z - m).exp()).collect();
    probabilities.push((-m).exp());
    let total: f64 = probabilities.iter().sum();
    for p in &mut probabilities {
        *p /= total;
    }
    (probabilities, m + total.ln())
}
