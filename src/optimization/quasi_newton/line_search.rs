//! Backtracking line search along a fixed direction.
//!
//! Starting at step `t = 1`, each trial evaluates `f(x + t·p)`; a rejected
//! trial multiplies `t` by the configured decay. The search gives up once
//! `t` drops below the minimum step. Acceptance follows [`LineSearchRule`].
//! Trial values that are not finite are rejected like any other trial.
use crate::optimization::{
    errors::OptResult,
    quasi_newton::{
        traits::{CancellationToken, LineSearchOptions, LineSearchRule, TargetFunction},
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use ndarray::Array1;

/// Point accepted by the line search together with its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedStep {
    pub step: f64,
    pub arguments: Theta,
    pub value: Cost,
    pub gradient: Grad,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineSearchOutcome {
    Accepted(AcceptedStep),
    /// Step shrank below the floor without an acceptable trial.
    Exhausted { last_step: f64 },
    /// Cancellation observed between trials.
    Aborted,
}

/// Whether a trial value passes the acceptance rule.
///
/// `slope` is the directional derivative `∇f(x)·p`.
pub fn accepts(rule: LineSearchRule, current: Cost, trial: Cost, step: f64, slope: f64) -> bool {
    if !trial.is_finite() {
        return false;
    }
    match rule {
        LineSearchRule::StrictDecrease => trial < current,
        LineSearchRule::Armijo { c } => trial < current + c * step * slope,
    }
}

/// Run the backtracking search from `arguments` along `direction`.
///
/// `evaluations` is incremented once per objective call.
///
/// # Errors
/// Rejects invalid `opts` before evaluating (a zero floor or a decay of one
/// would never terminate), propagates objective failures and rejects
/// accepted gradients that are mis-sized or non-finite.
#[allow(clippy::too_many_arguments)]
pub fn backtrack<F: TargetFunction + ?Sized>(
    f: &mut F, arguments: &Theta, value: Cost, gradient: &Grad, direction: &Theta,
    opts: &LineSearchOptions, cancellation: Option<&CancellationToken>, evaluations: &mut usize,
) -> OptResult<LineSearchOutcome> {
    opts.validate()?;
    let dim = arguments.len();
    let slope = gradient.dot(direction);
    let mut step = 1.0;
    let mut last_step = step;
    let mut trial_grad: Grad = Array1::zeros(dim);

    while step >= opts.min_step {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return Ok(LineSearchOutcome::Aborted);
        }
        let mut trial = arguments.clone();
        trial.scaled_add(step, direction);
        trial_grad.fill(0.0);
        let trial_value = f.evaluate(&trial, &mut trial_grad)?;
        *evaluations += 1;

        if accepts(opts.rule, value, trial_value, step, slope) {
            validate_grad(&trial_grad, dim)?;
            return Ok(LineSearchOutcome::Accepted(AcceptedStep {
                step,
                arguments: trial,
                value: trial_value,
                gradient: trial_grad,
            }));
        }
        log::trace!(
            step = step, trial_value = trial_value, current = value;
            "line search trial rejected"
        );
        last_step = step;
        step *= opts.decay;
    }
    Ok(LineSearchOutcome::Exhausted { last_step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::quasi_newton::types::DEFAULT_MIN_STEP;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Acceptance at full step on a convex bowl.
    // - Armijo rejecting a trial that strict decrease accepts.
    // - Exhaustion along an ascent direction and cancellation.
    // -------------------------------------------------------------------------

    /// `f(x) = Σ xᵢ²`, counting evaluations.
    struct Bowl {
        calls: usize,
    }

    impl TargetFunction for Bowl {
        fn dimensionality(&self) -> usize {
            2
        }

        fn evaluate(&mut self, arguments: &Theta, gradient: &mut Grad) -> OptResult<Cost> {
            self.calls += 1;
            gradient.assign(&(arguments * 2.0));
            Ok(arguments.dot(arguments))
        }
    }

    #[test]
    // Purpose
    // -------
    // Steepest descent with unit step on `Σ xᵢ²` from `(1, 1)` overshoots to
    // `(-1, -1)` (no decrease), so the first accepted step is `0.6`.
    //
    // Given
    // -----
    // - `x = (1, 1)`, `p = −∇f = (-2, -2)`, default options.
    //
    // Expect
    // ------
    // - Accepted at step 0.6 with `x = (-0.2, -0.2)` after two evaluations.
    fn strict_decrease_backtracks_once() {
        // Arrange
        let mut bowl = Bowl { calls: 0 };
        let x = array![1.0, 1.0];
        let g = array![2.0, 2.0];
        let p = array![-2.0, -2.0];
        let mut evals = 0;

        // Act
        let opts = LineSearchOptions::default();
        let out = backtrack(&mut bowl, &x, 2.0, &g, &p, &opts, None, &mut evals).unwrap();

        // Assert
        match out {
            LineSearchOutcome::Accepted(step) => {
                assert!((step.step - 0.6).abs() < 1e-12);
                assert!((step.arguments[0] + 0.2).abs() < 1e-12);
                assert!((step.gradient[1] + 0.4).abs() < 1e-12);
            }
            other => panic!("Expected acceptance, got {other:?}"),
        }
        assert_eq!(evals, 2);
        assert_eq!(bowl.calls, 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify that Armijo demands more than bare decrease.
    //
    // Given
    // -----
    // - Current value 1.0, trial 0.999, step 1, slope -100, `c = 1e-4`.
    //
    // Expect
    // ------
    // - Strict decrease accepts; Armijo rejects since `0.999 ≥ 1 − 0.01`.
    fn armijo_rejects_insufficient_decrease() {
        let armijo = LineSearchRule::Armijo { c: 1e-4 };

        assert!(accepts(LineSearchRule::StrictDecrease, 1.0, 0.999, 1.0, -100.0));
        assert!(!accepts(armijo, 1.0, 0.999, 1.0, -100.0));
        assert!(accepts(armijo, 1.0, 0.5, 1.0, -100.0));
        assert!(!accepts(LineSearchRule::StrictDecrease, 1.0, f64::NAN, 1.0, -1.0));
    }

    #[test]
    // Purpose
    // -------
    // An ascent direction can never decrease the bowl, so the search runs
    // out of step size.
    //
    // Given
    // -----
    // - `x = (1, 1)`, `p = +∇f`.
    //
    // Expect
    // ------
    // - `Exhausted` with the last tried step not below the floor, and one
    //   evaluation per trial down to the floor.
    fn ascent_direction_exhausts_step() {
        // Arrange
        let mut bowl = Bowl { calls: 0 };
        let x = array![1.0, 1.0];
        let g = array![2.0, 2.0];
        let mut evals = 0;
        let opts = LineSearchOptions::default();

        // Act
        let out = backtrack(&mut bowl, &x, 2.0, &g, &g, &opts, None, &mut evals).unwrap();

        // Assert
        match out {
            LineSearchOutcome::Exhausted { last_step } => {
                assert!(last_step >= DEFAULT_MIN_STEP);
                assert!(last_step * opts.decay < DEFAULT_MIN_STEP);
            }
            other => panic!("Expected exhaustion, got {other:?}"),
        }
        let expected = (DEFAULT_MIN_STEP.ln() / opts.decay.ln()).floor() as usize + 1;
        assert_eq!(evals, expected);
    }

    #[test]
    // Purpose
    // -------
    // A cancelled token stops the search before any evaluation.
    //
    // Given
    // -----
    // - A token cancelled up front.
    //
    // Expect
    // ------
    // - `Aborted` with zero evaluations.
    fn cancelled_token_aborts_before_evaluating() {
        let mut bowl = Bowl { calls: 0 };
        let token = CancellationToken::new();
        token.cancel();
        let mut evals = 0;
        let x = array![1.0, 1.0];

        let out = backtrack(
            &mut bowl,
            &x,
            2.0,
            &array![2.0, 2.0],
            &array![-2.0, -2.0],
            &LineSearchOptions::default(),
            Some(&token),
            &mut evals,
        )
        .unwrap();

        assert_eq!(out, LineSearchOutcome::Aborted);
        assert_eq!(evals, 0);
    }
}
