//! Indexed training samples and sample-weight helpers.
use crate::optimization::errors::{OptError, OptResult};
use std::collections::BTreeMap;

/// Sparse feature vector with an integer class label.
///
/// Feature index `0` is conventionally the bias term fixed at `1.0`
/// (see [`IndexedSample::with_bias`]). The ordered map keeps per-sample
/// summation order deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedSample {
    pub features: BTreeMap<usize, f64>,
    pub label: usize,
}

impl IndexedSample {
    pub fn new(label: usize) -> Self {
        Self { features: BTreeMap::new(), label }
    }

    /// Sample whose bias feature `0 → 1.0` is already set.
    pub fn with_bias(label: usize) -> Self {
        let mut sample = Self::new(label);
        sample.features.insert(0, 1.0);
        sample
    }

    /// Builder-style insert; a repeated index overwrites the earlier value.
    pub fn feature(mut self, index: usize, value: f64) -> Self {
        self.features.insert(index, value);
        self
    }

    pub fn insert(&mut self, index: usize, value: f64) -> Option<f64> {
        self.features.insert(index, value)
    }

    /// Largest feature index present.
    pub fn max_feature(&self) -> Option<usize> {
        self.features.keys().next_back().copied()
    }
}

/// Uniform weights `1/n` for `n` samples.
pub fn uniform_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

/// Validate a training set against the model shape.
///
/// # Errors
/// - [`OptError::EmptySampleSet`] for no samples.
/// - [`OptError::SampleWeightMismatch`] when lengths differ.
/// - [`OptError::InvalidSampleWeight`] for non-finite or non-positive weights.
/// - [`OptError::LabelOutOfRange`] when `label >= classes`.
/// - [`OptError::FeatureOutOfRange`] / [`OptError::InvalidFeatureValue`] for
///   feature indices `>= features` or non-finite values.
pub fn validate_training_set(
    samples: &[IndexedSample], weights: &[f64], classes: usize, features: usize,
) -> OptResult<()> {
    if samples.is_empty() {
        return Err(OptError::EmptySampleSet);
    }
    if samples.len() != weights.len() {
        return Err(OptError::SampleWeightMismatch {
            samples: samples.len(),
            weights: weights.len(),
        });
    }
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(OptError::InvalidSampleWeight { index, value });
        }
    }
    for (index, sample) in samples.iter().enumerate() {
        if sample.label >= classes {
            return Err(OptError::LabelOutOfRange { index, label: sample.label, classes });
        }
        validate_features(index, sample, features)?;
    }
    Ok(())
}

/// Validate the features of a single sample (used for prediction too).
pub fn validate_features(index: usize, sample: &IndexedSample, features: usize) -> OptResult<()> {
    for (&feature, &value) in &sample.features {
        if feature >= features {
            return Err(OptError::FeatureOutOfRange { index, feature, features });
        }
        if !value.is_finite() {
            return Err(OptError::InvalidFeatureValue { index, feature, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Bias and builder helpers populate the ordered feature map.
    //
    // Given
    // -----
    // - `with_bias(2)` extended with features 5 and 3.
    //
    // Expect
    // ------
    // - Keys iterate as `0, 3, 5`; max feature is 5; label kept.
    fn bias_and_builder_populate_features() {
        let sample = IndexedSample::with_bias(2).feature(5, 0.5).feature(3, -1.0);

        assert_eq!(sample.features.keys().copied().collect::<Vec<_>>(), vec![0, 3, 5]);
        assert_eq!(sample.features[&0], 1.0);
        assert_eq!(sample.max_feature(), Some(5));
        assert_eq!(sample.label, 2);
    }

    #[test]
    // Purpose
    // -------
    // Uniform weights sum to one.
    //
    // Given
    // -----
    // - `n = 8` and `n = 0`.
    //
    // Expect
    // ------
    // - Eight entries of 0.125; empty for zero.
    fn uniform_weights_sum_to_one() {
        let w = uniform_weights(8);

        assert_eq!(w, vec![0.125; 8]);
        assert!(uniform_weights(0).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Each data defect maps to its own error variant.
    //
    // Given
    // -----
    // - Empty data, mismatched weights, a zero weight, a bad label, an
    //   out-of-range feature and a NaN feature value.
    //
    // Expect
    // ------
    // - The matching `OptError` variant for each case.
    fn training_set_validation_reports_each_defect() {
        let good = vec![IndexedSample::with_bias(0), IndexedSample::with_bias(1)];

        assert_eq!(validate_training_set(&[], &[], 2, 3), Err(OptError::EmptySampleSet));
        assert_eq!(
            validate_training_set(&good, &[0.5], 2, 3),
            Err(OptError::SampleWeightMismatch { samples: 2, weights: 1 })
        );
        assert_eq!(
            validate_training_set(&good, &[0.5, 0.0], 2, 3),
            Err(OptError::InvalidSampleWeight { index: 1, value: 0.0 })
        );
        assert_eq!(
            validate_training_set(&good, &[0.5, 0.5], 1, 3),
            Err(OptError::LabelOutOfRange { index: 1, label: 1, classes: 1 })
        );
        let wide = vec![IndexedSample::with_bias(0).feature(3, 1.0)];
        assert_eq!(
            validate_training_set(&wide, &[1.0], 2, 3),
            Err(OptError::FeatureOutOfRange { index: 0, feature: 3, features: 3 })
        );
        let nan = vec![IndexedSample::with_bias(0).feature(1, f64::NAN)];
        assert!(matches!(
            validate_training_set(&nan, &[1.0], 2, 3),
            Err(OptError::InvalidFeatureValue { index: 0, feature: 1, .. })
        ));
        assert!(validate_training_set(&good, &uniform_weights(2), 2, 3).is_ok());
    }
}
