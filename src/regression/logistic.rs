//! regression::logistic — L2-regularized multinomial logistic regression.
//!
//! Purpose
//! -------
//! Train a `K`-class logistic model on sparse [`IndexedSample`]s by
//! minimizing the weighted negative log-likelihood with the quasi-Newton
//! driver, evaluating the objective on a persistent worker pool.
//!
//! Key behaviors
//! -------------
//! - [`MultinomialLogit`] is the per-sample objective: `(K − 1)·F`
//!   parameters laid out class-major (`θ[j·F + f]`), the last class is the
//!   reference with logit `0`.
//! - [`LogisticObjective`] adapts a [`ConcurrentEvaluator`] to
//!   [`TargetFunction`]: it scales loss and gradient by `N`, adds the L2
//!   penalty `λ‖θ‖²`, reports `"Accuracy"` and shuts the pool down on
//!   `finalize`.
//! - [`LogisticRegression`] is the user-facing model: `fit` /
//!   `fit_uniform`, `predict` and `probability_predict`, resuming from
//!   previously fitted parameters when their length matches.
//!
//! Invariants & assumptions
//! ------------------------
//! - Labels are `< K`; feature indices are `< F`; weights are finite and
//!   positive. `fit` validates all of this before any thread is spawned.
//! - Probabilities come from a max-shifted softmax, so large logits never
//!   overflow.
//!
//! Conventions
//! -----------
//! - The predicted label is the *first* class attaining the maximum
//!   probability.
//! - Optimizer defaults for the model are full BFGS with the crate-wide
//!   tolerances.
//!
//! Testing notes
//! -------------
//! - Unit tests verify the analytic gradient with `GradientCheck`, agreement
//!   across worker counts, resume semantics, the fitted/unfitted states and
//!   accuracy on separable data.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        numerical_stability::softmax_with_reference,
        quasi_newton::{
            api::minimize,
            progress::ProgressSink,
            traits::{Algorithm, OptimOutcome, QuasiNewtonOptions, TargetFunction},
            types::{Cost, DiagnosticMap, Grad, Theta},
        },
    },
    parallel::{
        evaluator::{ConcurrentEvaluator, EvaluatorOptions},
        traits::{Contribution, SampleObjective},
    },
    regression::sample::{IndexedSample, uniform_weights, validate_features, validate_training_set},
};
use log::info;

/// Default L2 coefficient `λ`.
pub const DEFAULT_REGULARIZATION: f64 = 1.0;

/// Diagnostic key for the training accuracy.
pub const ACCURACY: &str = "Accuracy";

// ---- Shared model math ----

/// Logits `zⱼ = Σ_f θ[j·F + f]·x_f` for the `K − 1` non-reference classes.
fn logits(theta: &Theta, classes: usize, features: usize, sample: &IndexedSample) -> Vec<f64> {
    (0..classes - 1)
        .map(|j| {
            let offset = j * features;
            sample.features.iter().map(|(&f, &v)| theta[offset + f] * v).sum()
        })
        .collect()
}

/// Index of the first maximum.
pub fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

// ---- Per-sample objective ----

/// Weighted multinomial logit over a fixed training set.
#[derive(Debug, Clone)]
pub struct MultinomialLogit {
    classes: usize,
    features: usize,
    samples: Vec<IndexedSample>,
    weights: Vec<f64>,
}

impl MultinomialLogit {
    /// Validate and wrap a training set.
    ///
    /// # Errors
    /// - [`OptError::TooFewClasses`] / [`OptError::ZeroFeatures`] for a
    ///   degenerate shape.
    /// - Data errors from [`validate_training_set`].
    pub fn new(
        classes: usize, features: usize, samples: Vec<IndexedSample>, weights: Vec<f64>,
    ) -> OptResult<Self> {
        verify_shape(classes, features)?;
        validate_training_set(&samples, &weights, classes, features)?;
        Ok(Self { classes, features, samples, weights })
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn samples(&self) -> &[IndexedSample] {
        &self.samples
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl SampleObjective for MultinomialLogit {
    fn dimensionality(&self) -> usize {
        (self.classes - 1) * self.features
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn contribute(
        &self, index: usize, arguments: &Theta, out: &mut Contribution,
    ) -> OptResult<()> {
        let sample = &self.samples[index];
        let weight = self.weights[index];
        let z = logits(arguments, self.classes, self.features, sample);
        let (p, lse) = softmax_with_reference(&z);

        out.correct = argmax_first(&p) == sample.label;
        let z_label = z.get(sample.label).copied().unwrap_or(0.0);
        out.loss = weight * (lse - z_label);
        for (j, &p_j) in p.iter().enumerate().take(self.classes - 1) {
            let indicator = if sample.label == j { 1.0 } else { 0.0 };
            let multiplier = indicator - p_j;
            let offset = j * self.features;
            for (&f, &v) in &sample.features {
                out.add_gradient(offset + f, -weight * v * multiplier);
            }
        }
        Ok(())
    }
}

// ---- TargetFunction adapter ----

/// Regularized logistic objective evaluated on a worker pool.
#[derive(Debug)]
pub struct LogisticObjective {
    evaluator: ConcurrentEvaluator<MultinomialLogit>,
    regularization: Option<f64>,
    initial: Option<Theta>,
    correct: usize,
    samples: usize,
    fitted: Option<Theta>,
}

impl LogisticObjective {
    pub fn new(
        model: MultinomialLogit, options: EvaluatorOptions, regularization: Option<f64>,
    ) -> Self {
        Self {
            evaluator: ConcurrentEvaluator::new(model, options),
            regularization,
            initial: None,
            correct: 0,
            samples: 0,
            fitted: None,
        }
    }

    /// Start from `theta` instead of all ones when its length matches.
    pub fn with_initial(mut self, theta: Theta) -> Self {
        self.initial = Some(theta);
        self
    }

    pub fn evaluator(&self) -> &ConcurrentEvaluator<MultinomialLogit> {
        &self.evaluator
    }

    /// Parameters adopted by `finalize`, if any.
    pub fn take_fitted(&mut self) -> Option<Theta> {
        self.fitted.take()
    }
}

impl TargetFunction for LogisticObjective {
    fn dimensionality(&self) -> usize {
        self.evaluator.objective().dimensionality()
    }

    fn initialize_arguments(&mut self, arguments: &mut Theta) {
        if let Some(theta) = &self.initial {
            if theta.len() == arguments.len() {
                arguments.assign(theta);
                info!("Resuming training...");
            }
        }
    }

    fn evaluate(&mut self, arguments: &Theta, gradient: &mut Grad) -> OptResult<Cost> {
        let summary = self.evaluator.run_round(arguments, gradient)?;
        let n = summary.samples as f64;
        let mut value = summary.loss * n;
        *gradient *= n;
        if let Some(lambda) = self.regularization {
            value += lambda * arguments.dot(arguments);
            gradient.scaled_add(2.0 * lambda, arguments);
        }
        self.correct = summary.correct;
        self.samples = summary.samples;
        Ok(value)
    }

    fn diagnostic_names(&self) -> Vec<String> {
        vec![ACCURACY.to_string()]
    }

    fn report_diagnostics(&self, sink: &mut DiagnosticMap) {
        if self.samples > 0 {
            sink.insert(ACCURACY.to_string(), self.correct as f64 / self.samples as f64);
        }
    }

    fn finalize(&mut self, arguments: Option<&Theta>) {
        self.evaluator.shutdown();
        if let Some(theta) = arguments {
            self.fitted = Some(theta.clone());
        }
    }
}

// ---- User-facing model ----

/// Multinomial logistic regression with optional L2 regularization.
///
/// Defaults: `λ = 1.0`, evaluator defaults, full BFGS.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    classes: usize,
    features: usize,
    regularization: Option<f64>,
    evaluator: EvaluatorOptions,
    optimizer: QuasiNewtonOptions,
    thetas: Option<Theta>,
}

impl LogisticRegression {
    /// Create an unfitted model.
    ///
    /// # Errors
    /// [`OptError::TooFewClasses`] when `classes < 2`, [`OptError::ZeroFeatures`]
    /// when `features == 0`.
    pub fn new(classes: usize, features: usize) -> OptResult<Self> {
        verify_shape(classes, features)?;
        Ok(Self {
            classes,
            features,
            regularization: Some(DEFAULT_REGULARIZATION),
            evaluator: EvaluatorOptions::default(),
            optimizer: QuasiNewtonOptions { algorithm: Algorithm::Bfgs, ..Default::default() },
            thetas: None,
        })
    }

    /// Set `λ`, or disable the penalty with `None`.
    ///
    /// # Errors
    /// [`OptError::InvalidRegularization`] for a negative or non-finite `λ`.
    pub fn with_regularization(mut self, lambda: Option<f64>) -> OptResult<Self> {
        if let Some(value) = lambda {
            if !value.is_finite() || value < 0.0 {
                return Err(OptError::InvalidRegularization {
                    lambda: value,
                    reason: "Coefficient must be finite and non-negative.",
                });
            }
        }
        self.regularization = lambda;
        Ok(self)
    }

    pub fn with_evaluator(mut self, options: EvaluatorOptions) -> Self {
        self.evaluator = options;
        self
    }

    pub fn with_optimizer(mut self, options: QuasiNewtonOptions) -> Self {
        self.optimizer = options;
        self
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn dimensionality(&self) -> usize {
        (self.classes - 1) * self.features
    }

    pub fn thetas(&self) -> Option<&Theta> {
        self.thetas.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.thetas.is_some()
    }

    /// Train on weighted samples.
    ///
    /// Starts from the current parameters when the model was fitted before.
    /// When at least one iterate was accepted, the final iterate becomes the
    /// model parameters whatever the termination reason; inspect the outcome
    /// to tell them apart. A run that never left its start point (cancelled
    /// up front, or a first line search that found no decrease) leaves the
    /// parameters unchanged.
    ///
    /// # Errors
    /// Data errors, optimizer configuration errors and worker faults. The
    /// parameters are left unchanged on error.
    pub fn fit(
        &mut self, samples: &[IndexedSample], weights: &[f64], sink: &mut dyn ProgressSink,
    ) -> OptResult<OptimOutcome> {
        let model =
            MultinomialLogit::new(self.classes, self.features, samples.to_vec(), weights.to_vec())?;
        let mut objective = LogisticObjective::new(model, self.evaluator, self.regularization);
        if let Some(theta) = &self.thetas {
            objective = objective.with_initial(theta.clone());
        }
        let outcome = minimize(&mut objective, &self.optimizer, sink)?;
        if let Some(theta) = objective.take_fitted() {
            self.thetas = Some(theta);
        }
        Ok(outcome)
    }

    /// [`LogisticRegression::fit`] with uniform weights `1/N`.
    pub fn fit_uniform(
        &mut self, samples: &[IndexedSample], sink: &mut dyn ProgressSink,
    ) -> OptResult<OptimOutcome> {
        let weights = uniform_weights(samples.len());
        self.fit(samples, &weights, sink)
    }

    /// Class probabilities for `sample`, reference class last.
    ///
    /// # Errors
    /// [`OptError::ModelNotFitted`] before a successful fit; feature errors
    /// (reported with sample index `0`) for out-of-range features.
    pub fn probability_predict(&self, sample: &IndexedSample) -> OptResult<Vec<f64>> {
        let theta = self.thetas.as_ref().ok_or(OptError::ModelNotFitted)?;
        validate_features(0, sample, self.features)?;
        let z = logits(theta, self.classes, self.features, sample);
        let (p, _) = softmax_with_reference(&z);
        Ok(p)
    }

    /// Most probable class for `sample` (first maximum on ties).
    ///
    /// # Errors
    /// As [`LogisticRegression::probability_predict`].
    pub fn predict(&self, sample: &IndexedSample) -> OptResult<usize> {
        self.probability_predict(sample).map(|p| argmax_first(&p))
    }
}

fn verify_shape(classes: usize, features: usize) -> OptResult<()> {
    if classes < 2 {
        return Err(OptError::TooFewClasses { classes });
    }
    if features == 0 {
        return Err(OptError::ZeroFeatures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        optimization::quasi_newton::{gradient_check::GradientCheck, progress::CollectingSink},
        parallel::evaluator::{AccumulationStrategy, PoolState},
    };
    use approx::assert_relative_eq;
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Correctness of the analytic gradient (via GradientCheck).
    // - Identical objective values across worker counts.
    // - Resume, finalize and fitted-state semantics.
    // - Accuracy on a separable two-class problem.
    // -------------------------------------------------------------------------

    /// Three classes over bias + 3 features, deterministic values.
    fn three_class_samples() -> Vec<IndexedSample> {
        (0..12)
            .map(|i| {
                let t = i as f64;
                IndexedSample::with_bias(i % 3)
                    .feature(1, (t * 0.37).sin())
                    .feature(2, (t * 0.11).cos())
                    .feature(3, if i % 2 == 0 { 0.5 } else { -0.25 })
            })
            .collect()
    }

    fn objective(workers: usize, lambda: Option<f64>) -> LogisticObjective {
        let samples = three_class_samples();
        let weights = uniform_weights(samples.len());
        let model = MultinomialLogit::new(3, 4, samples, weights).unwrap();
        let options = EvaluatorOptions::new(workers, AccumulationStrategy::LocalMerge).unwrap();
        LogisticObjective::new(model, options, lambda)
    }

    /// Points on either side of `x = 0`, label 0 for positive `x`.
    fn separable_samples() -> Vec<IndexedSample> {
        (0..40)
            .map(|i| {
                let magnitude = 1.0 + (i % 10) as f64 / 10.0;
                let (label, x) = if i % 2 == 0 { (0, magnitude) } else { (1, -magnitude) };
                IndexedSample::with_bias(label).feature(1, x)
            })
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // The analytic gradient of the regularized objective agrees with central
    // differences.
    //
    // Given
    // -----
    // - 12 samples, 3 classes, 4 features, λ = 1, 2 workers, seeded check.
    //
    // Expect
    // ------
    // - `GradientCheck::verify` succeeds.
    fn regularized_gradient_passes_gradient_check() {
        let mut f = objective(2, Some(DEFAULT_REGULARIZATION));
        let check = GradientCheck::new(4, 1e-4, Some(5)).unwrap();

        assert!(check.verify(&mut f).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The objective does not depend on the worker count.
    //
    // Given
    // -----
    // - The same data and arguments evaluated with 1, 2 and 4 workers.
    //
    // Expect
    // ------
    // - Values and gradients equal within 1e-9 relative; accuracy equal.
    fn value_is_independent_of_worker_count() {
        // Arrange
        let arguments = Array1::from_shape_fn(8, |i| (i as f64 * 0.3).sin());
        let mut reference = objective(1, Some(1.0));
        let mut g_ref = Array1::zeros(8);
        let v_ref = reference.evaluate(&arguments, &mut g_ref).unwrap();

        for workers in [2, 4] {
            // Act
            let mut f = objective(workers, Some(1.0));
            let mut g = Array1::zeros(8);
            let v = f.evaluate(&arguments, &mut g).unwrap();

            // Assert
            assert_relative_eq!(v, v_ref, max_relative = 1e-9);
            for (a, b) in g.iter().zip(g_ref.iter()) {
                assert_relative_eq!(*a, *b, max_relative = 1e-9, epsilon = 1e-12);
            }
            let mut d = DiagnosticMap::new();
            let mut d_ref = DiagnosticMap::new();
            f.report_diagnostics(&mut d);
            reference.report_diagnostics(&mut d_ref);
            assert_eq!(d, d_ref);
        }
    }

    #[test]
    // Purpose
    // -------
    // At `θ = 0` every class is equally likely, which pins the loss.
    //
    // Given
    // -----
    // - Zero arguments, no regularization, 12 samples, 3 classes.
    //
    // Expect
    // ------
    // - Loss `= N · Σ wᵢ ln 3 = 12 ln 3`.
    fn zero_parameters_give_uniform_loss() {
        let mut f = objective(3, None);
        let mut g = Array1::zeros(8);

        let v = f.evaluate(&Array1::zeros(8), &mut g).unwrap();

        assert_relative_eq!(v, 12.0 * 3.0_f64.ln(), max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Resume copies matching parameters and ignores mismatched ones;
    // finalize stops the pool and adopts parameters only on `Some`.
    //
    // Given
    // -----
    // - Initial vectors of matching and wrong length.
    //
    // Expect
    // ------
    // - Matching vector copied, wrong one ignored; pool stopped after
    //   finalize; `take_fitted` mirrors the finalize argument.
    fn resume_and_finalize_semantics() {
        // Arrange
        let stored = Array1::from_elem(8, 0.5);
        let mut matching = objective(2, None).with_initial(stored.clone());
        let mut mismatched = objective(2, None).with_initial(Array1::from_elem(3, 0.5));
        let mut buf_a = Array1::ones(8);
        let mut buf_b = Array1::ones(8);

        // Act
        matching.initialize_arguments(&mut buf_a);
        mismatched.initialize_arguments(&mut buf_b);
        matching.evaluate(&buf_a, &mut Array1::zeros(8)).unwrap();
        matching.finalize(Some(&buf_a));
        mismatched.finalize(None);

        // Assert
        assert_eq!(buf_a, stored);
        assert_eq!(buf_b, Array1::<f64>::ones(8));
        assert_eq!(matching.evaluator().state(), PoolState::Stopped);
        assert_eq!(matching.take_fitted(), Some(stored));
        assert_eq!(mismatched.take_fitted(), None);
    }

    #[test]
    // Purpose
    // -------
    // Prediction needs a fitted model and shape errors surface early.
    //
    // Given
    // -----
    // - A fresh model, a one-class model and a zero-feature model.
    //
    // Expect
    // ------
    // - `ModelNotFitted`, `TooFewClasses`, `ZeroFeatures`.
    fn unfitted_model_and_bad_shapes_are_rejected() {
        let model = LogisticRegression::new(2, 2).unwrap();

        assert_eq!(model.predict(&IndexedSample::with_bias(0)), Err(OptError::ModelNotFitted));
        assert!(!model.is_fitted());
        assert!(matches!(LogisticRegression::new(1, 2), Err(OptError::TooFewClasses { .. })));
        assert_eq!(LogisticRegression::new(3, 0).unwrap_err(), OptError::ZeroFeatures);
        assert!(matches!(
            LogisticRegression::new(2, 2).unwrap().with_regularization(Some(-1.0)),
            Err(OptError::InvalidRegularization { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Fitting a separable problem classifies the training data correctly
    // and reports accuracy through the progress sink.
    //
    // Given
    // -----
    // - 40 points split by the sign of `x`, uniform weights, 2 workers.
    //
    // Expect
    // ------
    // - Every training point predicted correctly, probabilities summing to
    //   one, and a final "Accuracy" diagnostic of 1.0.
    fn fit_separable_data_reaches_full_accuracy() {
        // Arrange
        let _ = env_logger::builder().is_test(true).try_init();
        let samples = separable_samples();
        let strategy = AccumulationStrategy::SharedCriticalSection;
        let options = EvaluatorOptions::new(2, strategy).unwrap();
        let mut model = LogisticRegression::new(2, 2).unwrap().with_evaluator(options);
        let mut sink = CollectingSink::new();

        // Act
        let outcome = model.fit_uniform(&samples, &mut sink).unwrap();

        // Assert
        assert!(model.is_fitted());
        assert_eq!(model.thetas(), Some(&outcome.theta_hat));
        for sample in &samples {
            assert_eq!(model.predict(sample).unwrap(), sample.label);
            let p = model.probability_predict(sample).unwrap();
            assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
        let last = sink.records.last().unwrap();
        assert_eq!(last.diagnostics.get(ACCURACY).copied(), Some(1.0));
    }

    #[test]
    // Purpose
    // -------
    // A second fit resumes from the stored parameters.
    //
    // Given
    // -----
    // - A model fitted once, then fitted again on the same data.
    //
    // Expect
    // ------
    // - The second run starts at the optimum, so it ends with no more
    //   iterations than the first needed.
    fn refit_resumes_from_stored_parameters() {
        let samples = separable_samples();
        let options = EvaluatorOptions::new(2, AccumulationStrategy::LocalMerge).unwrap();
        let mut model = LogisticRegression::new(2, 2).unwrap().with_evaluator(options);

        let first = model.fit_uniform(&samples, &mut CollectingSink::new()).unwrap();
        let second = model.fit_uniform(&samples, &mut CollectingSink::new()).unwrap();

        assert!(second.iterations <= first.iterations);
        assert!(second.value <= first.value + 1e-9);
    }
}
