//! regression — sparse multinomial logistic regression on the worker pool.
//!
//! Purpose
//! -------
//! Provide a concrete objective for the quasi-Newton driver: weighted,
//! L2-regularized multinomial logistic regression over sparse samples,
//! evaluated in parallel by `parallel::ConcurrentEvaluator`.
//!
//! Key behaviors
//! -------------
//! - `sample` defines `IndexedSample` (sparse features plus a label) and the
//!   training-set validation run before any worker is spawned.
//! - `logistic` implements the per-sample model (`MultinomialLogit`), its
//!   `TargetFunction` adapter (`LogisticObjective`) and the user-facing
//!   `LogisticRegression` with `fit`, `predict` and `probability_predict`.
//!
//! Conventions
//! -----------
//! - Feature index `0` is the bias column by convention; `with_bias` sets it.
//! - The last class is the reference class with logit fixed at `0`.

pub mod logistic;
pub mod sample;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::logistic::{
    ACCURACY, DEFAULT_REGULARIZATION, LogisticObjective, LogisticRegression, MultinomialLogit,
};
pub use self::sample::{IndexedSample, uniform_weights, validate_training_set};

pub mod prelude {
    pub use super::logistic::{LogisticRegression, MultinomialLogit};
    pub use super::sample::{IndexedSample, uniform_weights};
}
