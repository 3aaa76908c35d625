//! parallel — persistent worker pool for sum-decomposable objectives.
//!
//! Purpose
//! -------
//! Evaluate objectives of the form `f(θ) = Σᵢ fᵢ(θ)` on a fixed set of
//! worker threads that live as long as the evaluator, one barrier-style
//! round per optimizer evaluation.
//!
//! Key behaviors
//! -------------
//! - `partition` splits the samples into contiguous, near-equal shards.
//! - `rendezvous::Rendezvous` is the reusable master/worker barrier with an
//!   explicit phase and generation counter.
//! - `evaluator::ConcurrentEvaluator` owns the pool, runs rounds and
//!   propagates worker faults as `OptError::WorkerFault`.
//! - `traits::SampleObjective` is the per-sample contract workers call.
//!
//! Conventions
//! -----------
//! - Synchronization uses `parking_lot` primitives; threads are plain
//!   `std::thread`s named `evaluator-worker-i`.
//! - Pool lifecycle events are logged at `debug`, faults at `warn`.

pub mod evaluator;
pub mod partition;
pub mod rendezvous;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::evaluator::{
    AccumulationStrategy, ConcurrentEvaluator, EvaluatorOptions, PoolState, evaluate_sequential,
};
pub use self::partition::{WorkShard, partition};
pub use self::rendezvous::{Phase, Rendezvous};
pub use self::traits::{Contribution, RoundAccumulator, RoundSummary, SampleObjective};

pub mod prelude {
    pub use super::evaluator::{
        AccumulationStrategy, ConcurrentEvaluator, EvaluatorOptions, PoolState,
    };
    pub use super::partition::{WorkShard, partition};
    pub use super::traits::{Contribution, RoundSummary, SampleObjective};
}
