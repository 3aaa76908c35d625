//! lbfgs_trainer — quasi-Newton training with a persistent parallel evaluator.
//!
//! Purpose
//! -------
//! Serve as the crate root for a small training stack: a BFGS / L-BFGS
//! minimizer with backtracking line search, a master/worker pool that
//! evaluates sum-decomposable objectives in synchronized rounds, and a
//! multinomial logistic regression model built on both.
//!
//! Key behaviors
//! -------------
//! - `optimization` exposes the objective contract (`TargetFunction`), the
//!   optimizer options and outcome types, `minimize`, progress sinks and the
//!   finite-difference `GradientCheck`.
//! - `parallel` exposes `WorkShard` partitioning, the reusable `Rendezvous`
//!   barrier and `ConcurrentEvaluator`, which keeps its worker threads alive
//!   across evaluations.
//! - `regression` exposes sparse `IndexedSample`s and `LogisticRegression`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives are minimized; maximization problems negate their value and
//!   gradient.
//! - Every fallible operation returns `OptResult<T>`; no public function
//!   panics on user input.
//!
//! Conventions
//! -----------
//! - Vectors are `ndarray::Array1<f64>` (`Theta`, `Grad`).
//! - Logging goes through the `log` facade: per-iteration progress at
//!   `info`, line-search and pool lifecycle detail at `debug`/`trace`,
//!   faults and failed gradient checks at `warn`. Binaries choose the
//!   backend (tests use `env_logger`).
//!
//! Downstream usage
//! ----------------
//! - Most callers import `optimization::prelude::*` and either implement
//!   `TargetFunction` directly or use `regression::LogisticRegression`.
//! - Objectives that are sums over samples implement
//!   `parallel::SampleObjective` and wrap a `ConcurrentEvaluator`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds the end-to-end
//!   logistic pipeline.

pub mod optimization;
pub mod parallel;
pub mod regression;
