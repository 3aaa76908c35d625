//! optimization::errors — unified error surface for the training stack.
//!
//! Every fallible operation in the crate (option construction, objective
//! evaluation, the parallel evaluator, the logistic model) reports through
//! [`OptError`] so callers match on a single enum. Soft stops of the
//! optimizer (step size exhausted, iteration cap) are *not* errors; they are
//! reported as a `TerminationReason` on the outcome.
use thiserror::Error;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptError {
    // ---- Configuration ----
    /// Algorithm name does not map to an implemented variant.
    #[error("Unsupported optimizer algorithm '{name}': {reason}")]
    UnsupportedAlgorithm { name: String, reason: &'static str },

    /// Accumulation strategy name is unknown.
    #[error("Unknown accumulation strategy '{name}': {reason}")]
    UnknownAccumulationStrategy { name: String, reason: &'static str },

    /// Gradient tolerance needs to be positive and finite.
    #[error("Invalid gradient tolerance {tol}: {reason}")]
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    #[error("Invalid maximum iterations {max_iter}: {reason}")]
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// L-BFGS history window needs to be at least 1.
    #[error("Invalid L-BFGS history window {window}: {reason}")]
    InvalidHistoryWindow { window: usize, reason: &'static str },

    /// Line-search decay needs to lie strictly inside (0, 1).
    #[error("Invalid line-search decay {decay}: {reason}")]
    InvalidLineSearchDecay { decay: f64, reason: &'static str },

    /// Minimum step size needs to lie in (0, 1).
    #[error("Invalid minimum step size {min_step}: {reason}")]
    InvalidMinStepSize { min_step: f64, reason: &'static str },

    /// Armijo coefficient needs to lie strictly inside (0, 1).
    #[error("Invalid sufficient-decrease coefficient {c}: {reason}")]
    InvalidSufficientDecrease { c: f64, reason: &'static str },

    /// Finite-difference step needs to be positive and finite.
    #[error("Invalid finite-difference epsilon {epsilon}: {reason}")]
    InvalidEpsilon { epsilon: f64, reason: &'static str },

    /// Evaluator pools need at least one worker.
    #[error("Invalid evaluator worker count {workers}: {reason}")]
    InvalidWorkerCount { workers: usize, reason: &'static str },

    /// Gradient check needs at least one round.
    #[error("Invalid number of gradient-check rounds {rounds}: {reason}")]
    InvalidRounds { rounds: usize, reason: &'static str },

    // ---- Objective ----
    /// Objective declared no free parameters.
    #[error("Objective must have at least one free parameter")]
    ZeroDimension,

    /// Argument vector length does not match the objective dimensionality.
    #[error("Argument dimension mismatch: expected {expected}, found {found}")]
    ArgumentDimMismatch { expected: usize, found: usize },

    /// Gradient dimensions do not match parameter dimensions.
    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite.
    #[error("Invalid gradient at index {index}: {value}: {reason}")]
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    /// A per-sample contribution wrote outside the gradient.
    #[error("Contribution to coordinate {coordinate} is out of range for dimension {dim}")]
    ContributionOutOfRange { coordinate: usize, dim: usize },

    /// Objective returned a non-finite value.
    #[error("Non-finite objective value: {value}")]
    NonFiniteCost { value: f64 },

    /// Final parameters must be finite.
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    // ---- Validation ----
    /// Analytic gradient disagrees with the central-difference estimate.
    #[error(
        "Gradient check failed in round {round} at argument {index}: \
         expected {expected}, got {actual}"
    )]
    GradientCheckFailed {
        round: usize,
        index: usize,
        expected: f64,
        actual: f64,
        arguments: Vec<f64>,
    },

    // ---- Parallel evaluation ----
    /// A worker failed while computing its shard; the round was abandoned.
    #[error("Worker {worker} faulted during evaluation round: {reason}")]
    WorkerFault { worker: usize, reason: String },

    /// The operating system refused to spawn a worker thread.
    #[error("Failed to spawn evaluator worker: {reason}")]
    WorkerSpawn { reason: String },

    /// The worker pool was shut down and cannot run further rounds.
    #[error("Evaluator worker pool has been stopped")]
    PoolStopped,

    // ---- Data ----
    /// Training requires at least one sample.
    #[error("Sample set is empty")]
    EmptySampleSet,

    /// Per-sample weights must line up with samples.
    #[error("Sample weight count mismatch: {samples} samples, {weights} weights")]
    SampleWeightMismatch { samples: usize, weights: usize },

    /// Per-sample weights must be finite and > 0.
    #[error("Invalid weight for sample {index}: {value}, must be finite and > 0")]
    InvalidSampleWeight { index: usize, value: f64 },

    /// Sample label is not a valid class index.
    #[error("Label {label} of sample {index} is out of range for {classes} classes")]
    LabelOutOfRange { index: usize, label: usize, classes: usize },

    /// Sample references a feature index beyond the model width.
    #[error("Feature {feature} of sample {index} is out of range for {features} features")]
    FeatureOutOfRange { index: usize, feature: usize, features: usize },

    /// Feature values need to be finite.
    #[error("Invalid value for feature {feature} of sample {index}: {value}")]
    InvalidFeatureValue { index: usize, feature: usize, value: f64 },

    // ---- Model ----
    /// Multinomial models need two classes or more.
    #[error("Logistic regression needs at least 2 classes, got {classes}")]
    TooFewClasses { classes: usize },

    /// Models need at least one feature column.
    #[error("Logistic regression needs at least 1 feature")]
    ZeroFeatures,

    /// L2 coefficient needs to be finite and non-negative.
    #[error("Invalid regularization coefficient {lambda}: {reason}")]
    InvalidRegularization { lambda: f64, reason: &'static str },

    /// Prediction requested before a successful fit.
    #[error("Model has not been fitted")]
    ModelNotFitted,
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Human-readable messages for representative variants.
    //
    // They intentionally DO NOT cover:
    // - Where each variant is raised (tested next to the raising code).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure a gradient-check failure message carries round, index and both
    // gradient values.
    //
    // Given
    // -----
    // - A `GradientCheckFailed` error with distinct numbers.
    //
    // Expect
    // ------
    // - The rendered message mentions each number.
    fn gradient_check_failed_message_mentions_location_and_values() {
        // Arrange
        let err = OptError::GradientCheckFailed {
            round: 3,
            index: 7,
            expected: 2.5,
            actual: 1.25,
            arguments: vec![0.5; 8],
        };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("round 3"));
        assert!(msg.contains("argument 7"));
        assert!(msg.contains("2.5"));
        assert!(msg.contains("1.25"));
    }

    #[test]
    // Purpose
    // -------
    // Verify that worker faults identify the worker and the reason.
    //
    // Given
    // -----
    // - A `WorkerFault` for worker 2.
    //
    // Expect
    // ------
    // - The message names the worker and repeats the reason verbatim.
    fn worker_fault_message_names_worker() {
        // Arrange
        let err = OptError::WorkerFault { worker: 2, reason: "sample 9 exploded".to_string() };

        // Act
        let msg = err.to_string();

        // Assert
        assert_eq!(msg, "Worker 2 faulted during evaluation round: sample 9 exploded");
    }
}
