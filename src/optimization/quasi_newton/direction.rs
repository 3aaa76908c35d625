//! Search direction via the L-BFGS two-loop recursion.
//!
//! Given the current gradient `g` and the curvature history, computes
//! `p = −H·g` where `H` is the implicit inverse-Hessian approximation. The
//! initial scaling is `H₀ = γ·I` with `γ = (s·y)/(y·y)` taken from the newest
//! pair; with no history `p = −g` exactly.
//!
//! Full BFGS uses the same recursion over an unbounded history, which is
//! mathematically equivalent to the dense update.
use crate::optimization::{
    numerical_stability::GENERAL_TOL,
    quasi_newton::{
        history::CurvatureHistory,
        types::{Grad, Theta},
    },
};

/// Compute the quasi-Newton descent direction `p = −H·g`.
pub fn two_loop_recursion(grad: &Grad, history: &CurvatureHistory) -> Theta {
    let mut q = grad.clone();
    if history.is_empty() {
        q.mapv_inplace(|v| -v);
        return q;
    }

    // First loop: newest to oldest.
    let mut alphas = Vec::with_capacity(history.len());
    for pair in history.newest_first() {
        let alpha = pair.rho * pair.s.dot(&q);
        q.scaled_add(-alpha, &pair.y);
        alphas.push(alpha);
    }

    let gamma = history
        .newest()
        .map(|pair| {
            let yy = pair.y.dot(&pair.y);
            if yy > GENERAL_TOL { pair.curvature() / yy } else { 1.0 }
        })
        .unwrap_or(1.0);
    q *= gamma;

    // Second loop: oldest to newest.
    for (pair, alpha) in history.newest_first().rev().zip(alphas.iter().rev()) {
        let beta = pair.rho * pair.y.dot(&q);
        q.scaled_add(alpha - beta, &pair.s);
    }

    q.mapv_inplace(|v| -v);
    q
}

/// Scale `direction` to unit Euclidean length. Zero vectors are left as is.
pub fn normalize(direction: &mut Theta) {
    let norm = direction.dot(direction).sqrt();
    if norm > GENERAL_TOL {
        *direction /= norm;
    }
}
