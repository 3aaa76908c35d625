//! quasi_newton::gradient_check — central-difference verification of analytic gradients.
//!
//! Purpose
//! -------
//! Detect objectives whose `evaluate` writes a gradient that disagrees with
//! the objective value itself, before an optimizer trusts that gradient.
//!
//! Key behaviors
//! -------------
//! - Round 0 checks the all-ones point; later rounds check uniform draws in
//!   `[0, 1)` from a `StdRng` (seeded when requested, OS entropy otherwise).
//! - Each coordinate is compared against the central difference
//!   `(f(x + εeᵢ) − f(x − εeᵢ)) / 2ε`; the first absolute deviation above
//!   `ε` fails the check.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective is pure in its arguments, so repeated evaluation at the
//!   same point is consistent.
//! - Gradient output of perturbed evaluations is discarded.
//!
//! Testing notes
//! -------------
//! - Unit tests cover a correct quadratic, a gradient that is off by a
//!   factor of two, and propagation of objective errors.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::{
        traits::TargetFunction,
        types::{DEFAULT_CHECK_EPSILON, DEFAULT_CHECK_ROUNDS, Grad, Theta},
        validation::{validate_grad, verify_epsilon},
    },
};
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Configuration of a gradient check.
///
/// Defaults: 10 rounds, `ε = 1e-4`, unseeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientCheck {
    rounds: usize,
    epsilon: f64,
    seed: Option<u64>,
}

impl GradientCheck {
    /// Create a validated gradient check.
    ///
    /// # Errors
    /// - [`OptError::InvalidRounds`] if `rounds == 0`.
    /// - [`OptError::InvalidEpsilon`] for non-finite or non-positive `epsilon`.
    pub fn new(rounds: usize, epsilon: f64, seed: Option<u64>) -> OptResult<Self> {
        if rounds == 0 {
            return Err(OptError::InvalidRounds {
                rounds,
                reason: "Gradient check needs at least one round.",
            });
        }
        verify_epsilon(epsilon)?;
        Ok(Self { rounds, epsilon, seed })
    }

    /// Same check with a fixed RNG seed, for reproducible sample points.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Compare analytic and central-difference gradients.
    ///
    /// Parameters
    /// ----------
    /// - `f`: `&mut F`
    ///   Objective under test. It is evaluated `1 + 2·dim` times per round.
    ///
    /// Returns
    /// -------
    /// `OptResult<()>`
    ///   - `Ok(())` when every coordinate of every round agrees within `ε`.
    ///
    /// Errors
    /// ------
    /// - `OptError::GradientCheckFailed`
    ///   First coordinate whose deviation exceeds `ε`, carrying the round,
    ///   the coordinate index, the central-difference estimate (`expected`),
    ///   the analytic value (`actual`) and the sampled point.
    /// - `OptError::ZeroDimension` when the objective has no parameters.
    /// - Any error returned by `evaluate`, unchanged.
    pub fn verify<F: TargetFunction + ?Sized>(&self, f: &mut F) -> OptResult<()> {
        let dim = f.dimensionality();
        if dim == 0 {
            return Err(OptError::ZeroDimension);
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut arguments: Theta = Array1::ones(dim);
        let mut gradient: Grad = Array1::zeros(dim);
        let mut scratch: Grad = Array1::zeros(dim);
        let two_eps = 2.0 * self.epsilon;

        for round in 0..self.rounds {
            if round > 0 {
                arguments.mapv_inplace(|_| rng.random::<f64>());
            }
            gradient.fill(0.0);
            f.evaluate(&arguments, &mut gradient)?;
            validate_grad(&gradient, dim)?;

            for index in 0..dim {
                let original = arguments[index];

                arguments[index] = original + self.epsilon;
                let plus = f.evaluate(&arguments, &mut scratch)?;
                arguments[index] = original - self.epsilon;
                let minus = f.evaluate(&arguments, &mut scratch)?;
                arguments[index] = original;

                let expected = (plus - minus) / two_eps;
                let actual = gradient[index];
                let deviation = (actual - expected).abs();
                if deviation.is_nan() || deviation > self.epsilon {
                    return Err(OptError::GradientCheckFailed {
                        round,
                        index,
                        expected,
                        actual,
                        arguments: arguments.to_vec(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Boolean form of [`GradientCheck::verify`].
    ///
    /// Failures (including evaluation errors) are logged at `warn` level.
    pub fn check<F: TargetFunction + ?Sized>(&self, f: &mut F) -> bool {
        match self.verify(f) {
            Ok(()) => true,
            Err(OptError::GradientCheckFailed { round, index, expected, actual, arguments }) => {
                log::warn!("Round #{}: for argument #{}", round + 1, index + 1);
                log::warn!("Expected gradient: {expected:.6}, got: {actual:.6}");
                log::warn!("Arguments: {arguments:?}");
                false
            }
            Err(e) => {
                log::warn!("gradient check aborted: {e}");
                false
            }
        }
    }
}

impl Default for GradientCheck {
    fn default() -> Self {
        Self { rounds: DEFAULT_CHECK_ROUNDS, epsilon: DEFAULT_CHECK_EPSILON, seed: None }
    }
}
