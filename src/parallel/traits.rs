//! Per-sample objective contract and round accumulators.
//!
//! A [`SampleObjective`] describes an objective that decomposes into a sum of
//! per-sample terms. For each sample it writes one [`Contribution`] (loss,
//! whether the sample was predicted correctly, and sparse gradient entries)
//! which the evaluator folds into a [`RoundAccumulator`].
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::types::Theta,
};

/// Objective evaluated one sample at a time by the worker pool.
///
/// Implementations are shared read-only across worker threads, hence the
/// `Send + Sync + 'static` bound. `contribute` must only read `self`.
pub trait SampleObjective: Send + Sync + 'static {
    /// Length of the argument and gradient vectors.
    fn dimensionality(&self) -> usize;

    /// Number of samples; shards index into `0..sample_count()`.
    fn sample_count(&self) -> usize;

    /// Write the contribution of sample `index` at `arguments` into `out`.
    ///
    /// `out` is cleared by the caller before each call.
    fn contribute(
        &self, index: usize, arguments: &Theta, out: &mut Contribution,
    ) -> OptResult<()>;
}

/// Scratch record for one sample's contribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contribution {
    pub loss: f64,
    pub correct: bool,
    /// `(coordinate, value)` pairs; coordinates may repeat.
    pub gradient: Vec<(usize, f64)>,
}

impl Contribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.loss = 0.0;
        self.correct = false;
        self.gradient.clear();
    }

    pub fn add_gradient(&mut self, coordinate: usize, value: f64) {
        self.gradient.push((coordinate, value));
    }
}

/// Dense running totals for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundAccumulator {
    pub loss: f64,
    pub correct: usize,
    pub gradient: Vec<f64>,
}

impl RoundAccumulator {
    pub fn new(dim: usize) -> Self {
        Self { loss: 0.0, correct: 0, gradient: vec![0.0; dim] }
    }

    pub fn reset(&mut self) {
        self.loss = 0.0;
        self.correct = 0;
        self.gradient.fill(0.0);
    }

    /// Add one sample's contribution to the running totals.
    ///
    /// # Errors
    /// [`OptError::ContributionOutOfRange`] if any coordinate lies outside
    /// the gradient; the accumulator is left untouched in that case.
    pub fn absorb(&mut self, contribution: &Contribution) -> OptResult<()> {
        let dim = self.gradient.len();
        if let Some(&(coordinate, _)) = contribution.gradient.iter().find(|(c, _)| *c >= dim) {
            return Err(OptError::ContributionOutOfRange { coordinate, dim });
        }
        self.loss += contribution.loss;
        self.correct += usize::from(contribution.correct);
        for &(coordinate, value) in &contribution.gradient {
            self.gradient[coordinate] += value;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &RoundAccumulator) {
        self.loss += other.loss;
        self.correct += other.correct;
        for (dst, src) in self.gradient.iter_mut().zip(&other.gradient) {
            *dst += src;
        }
    }
}

/// Aggregate result of one evaluation round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSummary {
    /// Sum of per-sample losses.
    pub loss: f64,
    /// Number of samples flagged correct.
    pub correct: usize,
    /// Number of samples evaluated.
    pub samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Absorbing and merging sum losses, counts and repeated coordinates.
    //
    // Given
    // -----
    // - Two contributions touching coordinate 1 twice, merged across two
    //   accumulators.
    //
    // Expect
    // ------
    // - Totals equal the element-wise sums; reset zeroes everything.
    fn absorb_and_merge_sum_entries() {
        // Arrange
        let mut a = RoundAccumulator::new(3);
        let mut b = RoundAccumulator::new(3);
        let mut c = Contribution::new();
        c.loss = 1.5;
        c.correct = true;
        c.add_gradient(1, 2.0);
        c.add_gradient(1, 0.5);

        // Act
        a.absorb(&c).unwrap();
        c.clear();
        c.loss = 0.5;
        c.add_gradient(2, -1.0);
        b.absorb(&c).unwrap();
        a.merge(&b);

        // Assert
        assert_eq!(a.loss, 2.0);
        assert_eq!(a.correct, 1);
        assert_eq!(a.gradient, vec![0.0, 2.5, -1.0]);
        a.reset();
        assert_eq!(a, RoundAccumulator::new(3));
    }

    #[test]
    // Purpose
    // -------
    // A coordinate past the gradient is reported instead of indexing out of
    // bounds, and nothing from the bad contribution is kept.
    //
    // Given
    // -----
    // - A 3-D accumulator and a contribution touching coordinates 0 and 3.
    //
    // Expect
    // ------
    // - `ContributionOutOfRange { coordinate: 3, dim: 3 }` and an unchanged
    //   accumulator.
    fn absorb_rejects_out_of_range_coordinate() {
        // Arrange
        let mut acc = RoundAccumulator::new(3);
        let mut c = Contribution::new();
        c.loss = 1.0;
        c.correct = true;
        c.add_gradient(0, 1.0);
        c.add_gradient(3, 1.0);

        // Act
        let err = acc.absorb(&c).unwrap_err();

        // Assert
        assert_eq!(err, OptError::ContributionOutOfRange { coordinate: 3, dim: 3 });
        assert_eq!(acc, RoundAccumulator::new(3));
    }
}
