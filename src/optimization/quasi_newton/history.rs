//! Bounded curvature history for the inverse-Hessian approximation.
//!
//! Each accepted iteration contributes one pair `(s, y)` with
//! `s = x_{k+1} − x_k` and `y = ∇f(x_{k+1}) − ∇f(x_k)`. Pairs are stored
//! newest-first together with `ρ = 1 / (s·y)` and the iteration that produced
//! them. Full BFGS keeps every pair; L-BFGS evicts the oldest once the window
//! is full.
use crate::optimization::{
    numerical_stability::CURVATURE_EPS,
    quasi_newton::{traits::Algorithm, types::Theta},
};
use std::collections::VecDeque;

/// One curvature pair and its cached reciprocal curvature.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvaturePair {
    pub iteration: usize,
    pub s: Theta,
    pub y: Theta,
    pub rho: f64,
}

impl CurvaturePair {
    /// `s·y`, the curvature along the step.
    pub fn curvature(&self) -> f64 {
        1.0 / self.rho
    }
}

/// Result of offering a pair to [`CurvatureHistory::push`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryUpdate {
    Stored,
    /// Stored and the oldest pair (from `evicted_iteration`) was dropped.
    Evicted { evicted_iteration: usize },
    /// Rejected because `s·y` was not safely positive.
    SkippedCurvature { sy: f64 },
}

#[derive(Debug, Clone)]
pub struct CurvatureHistory {
    pairs: VecDeque<CurvaturePair>,
    capacity: Option<usize>,
}

impl CurvatureHistory {
    pub fn new(capacity: Option<usize>) -> Self {
        let pairs = match capacity {
            Some(cap) => VecDeque::with_capacity(cap),
            None => VecDeque::new(),
        };
        Self { pairs, capacity }
    }

    pub fn for_algorithm(algorithm: &Algorithm) -> Self {
        Self::new(algorithm.history_window())
    }

    /// Offer a new pair. Pairs with `s·y ≤ CURVATURE_EPS` or a non-finite
    /// `s·y` are skipped and leave the history untouched.
    pub fn push(&mut self, iteration: usize, s: Theta, y: Theta) -> HistoryUpdate {
        let sy = s.dot(&y);
        if !sy.is_finite() || sy <= CURVATURE_EPS {
            return HistoryUpdate::SkippedCurvature { sy };
        }
        let mut outcome = HistoryUpdate::Stored;
        if let Some(cap) = self.capacity {
            if self.pairs.len() >= cap {
                if let Some(old) = self.pairs.pop_back() {
                    outcome = HistoryUpdate::Evicted { evicted_iteration: old.iteration };
                }
            }
        }
        self.pairs.push_front(CurvaturePair { iteration, s, y, rho: 1.0 / sy });
        outcome
    }

    /// Pairs from newest to oldest.
    pub fn newest_first(&self) -> impl DoubleEndedIterator<Item = &CurvaturePair> {
        self.pairs.iter()
    }

    pub fn newest(&self) -> Option<&CurvaturePair> {
        self.pairs.front()
    }

    pub fn oldest(&self) -> Option<&CurvaturePair> {
        self.pairs.back()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Window enforcement and eviction order for L-BFGS.
    // - Unbounded growth for full BFGS.
    // - The curvature guard.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that a window of 3 keeps the 3 newest pairs after 5 pushes, with
    // the oldest retained pair coming from iteration 3.
    //
    // Given
    // -----
    // - Five well-conditioned pairs tagged with iterations 1..=5.
    //
    // Expect
    // ------
    // - Length 3, newest from iteration 5, oldest from iteration 3, and the
    //   fourth and fifth pushes report the evicted iteration.
    fn window_keeps_newest_pairs() {
        // Arrange
        let mut history = CurvatureHistory::new(Some(3));
        let mut updates = Vec::new();

        // Act
        for it in 1..=5 {
            let scale = it as f64;
            updates.push(history.push(it, array![scale, 0.0], array![scale, 1.0]));
        }

        // Assert
        assert_eq!(history.len(), 3);
        assert_eq!(history.newest().map(|p| p.iteration), Some(5));
        assert_eq!(history.oldest().map(|p| p.iteration), Some(3));
        assert_eq!(updates[3], HistoryUpdate::Evicted { evicted_iteration: 1 });
        assert_eq!(updates[4], HistoryUpdate::Evicted { evicted_iteration: 2 });
        let order: Vec<usize> = history.newest_first().map(|p| p.iteration).collect();
        assert_eq!(order, vec![5, 4, 3]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure non-positive and non-finite curvature is skipped without
    // touching stored pairs, and that BFGS history is unbounded.
    //
    // Given
    // -----
    // - An unbounded history, one good pair, then pairs with `s·y = -1`,
    //   `s·y = 0` and `s·y = NaN`, then 20 more good pairs.
    //
    // Expect
    // ------
    // - The three bad pairs are reported as skipped; 21 pairs are stored and
    //   `ρ = 1/(s·y)` for the cached newest pair.
    fn curvature_guard_and_unbounded_growth() {
        // Arrange
        let mut history = CurvatureHistory::for_algorithm(&Algorithm::Bfgs);
        history.push(0, array![1.0, 0.0], array![2.0, 0.0]);

        // Act
        let negative = history.push(1, array![1.0, 0.0], array![-1.0, 0.0]);
        let zero = history.push(2, array![1.0, 0.0], array![0.0, 5.0]);
        let nan = history.push(3, array![f64::NAN, 0.0], array![1.0, 0.0]);
        for it in 4..24 {
            history.push(it, array![0.5, 0.5], array![1.0, 1.0]);
        }

        // Assert
        assert!(matches!(negative, HistoryUpdate::SkippedCurvature { .. }));
        assert!(matches!(zero, HistoryUpdate::SkippedCurvature { .. }));
        assert!(matches!(nan, HistoryUpdate::SkippedCurvature { .. }));
        assert_eq!(history.len(), 21);
        assert_eq!(history.oldest().map(|p| p.iteration), Some(0));
        let newest = history.newest().unwrap();
        assert_eq!(newest.rho, 1.0);
        assert_eq!(newest.curvature(), 1.0);
    }
}
