//! Public API surface for quasi-Newton minimization.
//!
//! - [`TargetFunction`]: trait objectives implement to be minimized.
//! - [`Algorithm`]: closed set of implemented quasi-Newton variants.
//! - [`LineSearchOptions`] and [`LineSearchRule`]: backtracking configuration.
//! - [`QuasiNewtonOptions`]: full optimizer configuration.
//! - [`CancellationToken`]: cooperative interruption of a running loop.
//! - [`OptimOutcome`] and [`TerminationReason`]: normalized run result.
//!
//! Convention: the optimizer *minimizes* `f(θ)`. Objectives that naturally
//! maximize (log-likelihoods) return the negated value, as the logistic
//! objective does with its negative log-likelihood.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::{
        gradient_check::GradientCheck,
        types::{
            Cost, DEFAULT_ARMIJO_C, DEFAULT_LBFGS_WINDOW, DEFAULT_LINE_SEARCH_DECAY,
            DEFAULT_MAX_ITER, DEFAULT_MIN_STEP, DEFAULT_TOL_GRAD, DiagnosticMap, Grad, Theta,
        },
        validation::{
            validate_theta_hat, validate_value, verify_armijo_c, verify_decay, verify_max_iter,
            verify_min_step, verify_tol_grad,
        },
    },
};
use std::{
    fmt,
    num::NonZeroUsize,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Differentiable objective driven by the optimizer.
///
/// Required:
/// - `dimensionality()`: number of free parameters (must be > 0).
/// - `evaluate(arguments, gradient)`: return `f(arguments)` and write the
///   full gradient into `gradient`. Implementations must treat `gradient` as
///   output only (it is not guaranteed to be zeroed) and must be a pure
///   function of `arguments` for fixed training data.
///
/// Optional:
/// - `initialize_arguments(buffer)`: overwrite the all-ones starting point,
///   e.g. to resume from stored parameters of matching length.
/// - `diagnostic_names()` / `report_diagnostics(sink)`: named extra metrics
///   describing the evaluation just performed.
/// - `finalize(arguments)`: called exactly once after the run ends, whether
///   it converged, stopped early or failed. `None` means no iterate was ever
///   accepted; release resources without adopting parameters.
pub trait TargetFunction {
    // Required methods
    fn dimensionality(&self) -> usize;
    fn evaluate(&mut self, arguments: &Theta, gradient: &mut Grad) -> OptResult<Cost>;

    // Optional methods
    fn initialize_arguments(&mut self, _arguments: &mut Theta) {}

    fn diagnostic_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn report_diagnostics(&self, _sink: &mut DiagnosticMap) {}

    fn finalize(&mut self, _arguments: Option<&Theta>) {}
}

/// Quasi-Newton variant used to build the inverse-Hessian approximation.
///
/// Variants:
/// - `Bfgs`: full-memory BFGS; every curvature pair is retained.
/// - `LimitedMemoryBfgs { window }`: L-BFGS keeping only the `window` most
///   recent pairs.
///
/// Only implemented variants are representable. Parsing an unknown name (for
/// example a trust-region Newton method) fails with
/// [`OptError::UnsupportedAlgorithm`] before any iteration runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Bfgs,
    LimitedMemoryBfgs { window: NonZeroUsize },
}

impl Algorithm {
    /// Build an L-BFGS variant with the given history window.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidHistoryWindow`] if `window == 0`.
    pub fn limited_memory(window: usize) -> OptResult<Self> {
        match NonZeroUsize::new(window) {
            Some(window) => Ok(Algorithm::LimitedMemoryBfgs { window }),
            None => Err(OptError::InvalidHistoryWindow {
                window,
                reason: "L-BFGS history window must be greater than zero.",
            }),
        }
    }

    /// History capacity: `None` for unbounded (full BFGS).
    pub fn history_window(&self) -> Option<usize> {
        match self {
            Algorithm::Bfgs => None,
            Algorithm::LimitedMemoryBfgs { window } => Some(window.get()),
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        let window = NonZeroUsize::new(DEFAULT_LBFGS_WINDOW).unwrap_or(NonZeroUsize::MIN);
        Algorithm::LimitedMemoryBfgs { window }
    }
}

impl FromStr for Algorithm {
    type Err = OptError;

    /// Parse an algorithm name (case-insensitive, `-`/`_` ignored).
    ///
    /// Accepts `"BFGS"` and `"L-BFGS"` / `"LBFGS"` / `"LimitedMemoryBFGS"`;
    /// the latter use [`DEFAULT_LBFGS_WINDOW`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String =
            s.chars().filter(|c| *c != '-' && *c != '_').collect::<String>().to_lowercase();
        match key.as_str() {
            "bfgs" => Ok(Algorithm::Bfgs),
            "lbfgs" | "limitedmemorybfgs" => Ok(Algorithm::default()),
            _ => Err(OptError::UnsupportedAlgorithm {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'BFGS' or 'L-BFGS'.",
            }),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Bfgs => write!(f, "BFGS"),
            Algorithm::LimitedMemoryBfgs { window } => write!(f, "L-BFGS(m={window})"),
        }
    }
}

/// Acceptance test applied to each backtracking trial.
///
/// - `StrictDecrease`: accept the first step whose value is strictly below
///   the current value.
/// - `Armijo { c }`: accept only if `f(x + t·p) < f(x) + c·t·(∇f·p)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LineSearchRule {
    #[default]
    StrictDecrease,
    Armijo { c: f64 },
}

impl LineSearchRule {
    /// Build the Armijo rule with a validated coefficient.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidSufficientDecrease`] unless `0 < c < 1`.
    pub fn armijo(c: f64) -> OptResult<Self> {
        verify_armijo_c(c)?;
        Ok(LineSearchRule::Armijo { c })
    }
}

/// Backtracking line-search configuration.
///
/// Fields:
/// - `decay`: factor `λ` applied to a rejected step (default 0.6).
/// - `min_step`: the search gives up once the step falls below this
///   (default 1e-5).
/// - `rule`: acceptance test (default [`LineSearchRule::StrictDecrease`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchOptions {
    pub decay: f64,
    pub min_step: f64,
    pub rule: LineSearchRule,
}

impl LineSearchOptions {
    /// Create validated line-search options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLineSearchDecay`] unless `0 < decay < 1`.
    /// - [`OptError::InvalidMinStepSize`] unless `0 < min_step < 1`.
    pub fn new(decay: f64, min_step: f64, rule: LineSearchRule) -> OptResult<Self> {
        let opts = Self { decay, min_step, rule };
        opts.validate()?;
        Ok(opts)
    }

    /// Re-check the fields, which are public and may have been set directly.
    ///
    /// # Errors
    /// As [`LineSearchOptions::new`], plus
    /// [`OptError::InvalidSufficientDecrease`] for an Armijo `c` outside `(0, 1)`.
    pub fn validate(&self) -> OptResult<()> {
        verify_decay(self.decay)?;
        verify_min_step(self.min_step)?;
        if let LineSearchRule::Armijo { c } = self.rule {
            verify_armijo_c(c)?;
        }
        Ok(())
    }

    /// Same defaults, with the Armijo test at [`DEFAULT_ARMIJO_C`].
    pub fn armijo() -> Self {
        Self { rule: LineSearchRule::Armijo { c: DEFAULT_ARMIJO_C }, ..Self::default() }
    }
}

impl Default for LineSearchOptions {
    fn default() -> Self {
        Self {
            decay: DEFAULT_LINE_SEARCH_DECAY,
            min_step: DEFAULT_MIN_STEP,
            rule: LineSearchRule::StrictDecrease,
        }
    }
}

/// Shared flag used to interrupt a running optimization.
///
/// Cloning yields a handle to the same flag; any handle may cancel. The
/// optimizer polls it before each iteration and between line-search trials.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `max_iter`: hard cap on iterations (default 100).
/// - `algorithm`: BFGS or L-BFGS (default L-BFGS, window 10).
/// - `tol_grad`: stop once `‖∇f‖ ≤ tol_grad` (default 1e-6).
/// - `line_search`: backtracking configuration.
/// - `normalize_direction`: scale each search direction to unit length.
/// - `gradient_check`: optional pre-flight [`GradientCheck`].
/// - `cancellation`: optional [`CancellationToken`].
#[derive(Debug, Clone)]
pub struct QuasiNewtonOptions {
    pub max_iter: usize,
    pub algorithm: Algorithm,
    pub tol_grad: f64,
    pub line_search: LineSearchOptions,
    pub normalize_direction: bool,
    pub gradient_check: Option<GradientCheck>,
    pub cancellation: Option<CancellationToken>,
}

impl QuasiNewtonOptions {
    /// Create validated optimizer options.
    ///
    /// `line_search` values are validated by [`LineSearchOptions::new`];
    /// this constructor checks the remaining scalars.
    ///
    /// # Errors
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    /// - [`OptError::InvalidTolGrad`] for non-finite or non-positive `tol_grad`.
    pub fn new(
        max_iter: usize, algorithm: Algorithm, tol_grad: f64, line_search: LineSearchOptions,
    ) -> OptResult<Self> {
        let opts = Self {
            max_iter,
            algorithm,
            tol_grad,
            line_search,
            normalize_direction: false,
            gradient_check: None,
            cancellation: None,
        };
        opts.validate()?;
        Ok(opts)
    }

    /// Re-check every scalar, including the nested line-search options.
    ///
    /// The optimizer calls this before its first evaluation, so options built
    /// as struct literals are held to the same rules as [`QuasiNewtonOptions::new`].
    ///
    /// # Errors
    /// The configuration error of the first offending field.
    pub fn validate(&self) -> OptResult<()> {
        verify_max_iter(self.max_iter)?;
        verify_tol_grad(self.tol_grad)?;
        self.line_search.validate()
    }

    pub fn with_normalized_direction(mut self, normalize: bool) -> Self {
        self.normalize_direction = normalize;
        self
    }

    pub fn with_gradient_check(mut self, check: GradientCheck) -> Self {
        self.gradient_check = Some(check);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

impl Default for QuasiNewtonOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            algorithm: Algorithm::default(),
            tol_grad: DEFAULT_TOL_GRAD,
            line_search: LineSearchOptions::default(),
            normalize_direction: false,
            gradient_check: None,
            cancellation: None,
        }
    }
}

/// Why the optimization loop stopped.
///
/// None of these are errors; each leaves a valid last iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Gradient norm reached the convergence threshold.
    GradientVanished,
    /// Backtracking shrank the step below its floor without improvement.
    StepSizeExhausted,
    /// The iteration cap was hit first.
    IterationLimitReached,
    /// A [`CancellationToken`] was triggered.
    Aborted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::GradientVanished => write!(f, "Norm of gradient reaches 0"),
            TerminationReason::StepSizeExhausted => {
                write!(f, "Step size reaches 0 during line search")
            }
            TerminationReason::IterationLimitReached => write!(f, "Maximum iterations reached"),
            TerminationReason::Aborted => write!(f, "Aborted by cancellation"),
        }
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: last accepted parameter vector (the start if none).
/// - `value`: objective value at `theta_hat`.
/// - `grad_norm`: gradient norm at `theta_hat`.
/// - `iterations`: loop iterations entered.
/// - `accepted`: iterations whose line search succeeded.
/// - `evaluations`: total objective evaluations, gradient check excluded.
/// - `history_len`: curvature pairs held when the loop stopped.
/// - `termination`: why the loop stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub grad_norm: f64,
    pub iterations: usize,
    pub accepted: usize,
    pub evaluations: usize,
    pub history_len: usize,
    pub termination: TerminationReason,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from the final loop state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` (finite entries) and
    ///   `value` (finite).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        theta_hat: Theta, value: f64, grad_norm: f64, iterations: usize, accepted: usize,
        evaluations: usize, history_len: usize, termination: TerminationReason,
    ) -> OptResult<Self> {
        validate_theta_hat(&theta_hat)?;
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            grad_norm,
            iterations,
            accepted,
            evaluations,
            history_len,
            termination,
        })
    }

    /// `true` when the run stopped on the gradient-norm criterion.
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::GradientVanished
    }
}
