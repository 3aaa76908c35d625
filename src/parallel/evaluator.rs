//! parallel::evaluator — persistent worker pool evaluating a `SampleObjective`.
//!
//! Purpose
//! -------
//! Evaluate an objective that is a sum of per-sample terms on a fixed pool of
//! worker threads, one synchronized round per call, reusing the same threads
//! and the same shard assignment for the whole lifetime of the evaluator.
//!
//! Key behaviors
//! -------------
//! - [`ConcurrentEvaluator::start`] spawns `W` named threads
//!   (`evaluator-worker-i`) and partitions the samples once.
//! - [`ConcurrentEvaluator::run_round`] resets the accumulators, publishes
//!   the trial arguments, opens a round on the [`Rendezvous`], waits for all
//!   workers and folds their results into the caller's gradient buffer.
//! - Two [`AccumulationStrategy`]s: every contribution added under one
//!   global mutex, or per-worker dense accumulators merged by the master in
//!   worker order.
//! - A worker fault (an `Err` from the objective or a panic) is recorded
//!   once, stops the remaining workers early, lets the round complete and
//!   is returned as [`OptError::WorkerFault`] after the pool is shut down.
//!
//! Invariants & assumptions
//! ------------------------
//! - Results of a round are read only after every worker arrived for that
//!   exact round; the rendezvous generation prevents re-running a round.
//! - Trial arguments are written by the master only between rounds.
//! - After [`ConcurrentEvaluator::shutdown`] the pool is unusable and every
//!   call returns [`OptError::PoolStopped`].
//!
//! Testing notes
//! -------------
//! - Unit tests compare every strategy and worker count against
//!   [`evaluate_sequential`], and cover fault propagation and the stopped
//!   state.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        quasi_newton::types::{Grad, Theta},
    },
    parallel::{
        partition::{WorkShard, partition},
        rendezvous::Rendezvous,
        traits::{Contribution, RoundAccumulator, RoundSummary, SampleObjective},
    },
};
use log::{debug, warn};
use ndarray::{Array1, ArrayView1};
use parking_lot::{Mutex, RwLock};
use std::{
    any::Any,
    fmt,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

/// How per-sample contributions are combined within a round.
///
/// - `SharedCriticalSection`: every contribution is added to one shared
///   accumulator under a global mutex.
/// - `LocalMerge`: each worker fills its own dense accumulator; the master
///   merges them in worker order once the round is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulationStrategy {
    SharedCriticalSection,
    #[default]
    LocalMerge,
}

impl FromStr for AccumulationStrategy {
    type Err = OptError;

    /// Parse a strategy name (case-insensitive, `-`/`_` ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String =
            s.chars().filter(|c| *c != '-' && *c != '_').collect::<String>().to_lowercase();
        match key.as_str() {
            "shared" | "sharedcriticalsection" => Ok(AccumulationStrategy::SharedCriticalSection),
            "local" | "localmerge" => Ok(AccumulationStrategy::LocalMerge),
            _ => Err(OptError::UnknownAccumulationStrategy {
                name: s.to_string(),
                reason: "Valid options are 'SharedCriticalSection' or 'LocalMerge'.",
            }),
        }
    }
}

impl fmt::Display for AccumulationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccumulationStrategy::SharedCriticalSection => write!(f, "SharedCriticalSection"),
            AccumulationStrategy::LocalMerge => write!(f, "LocalMerge"),
        }
    }
}

/// Evaluator pool configuration.
///
/// Defaults: one worker per available CPU, [`AccumulationStrategy::LocalMerge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorOptions {
    pub workers: NonZeroUsize,
    pub strategy: AccumulationStrategy,
}

impl EvaluatorOptions {
    /// Create validated evaluator options.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidWorkerCount`] if `workers == 0`.
    pub fn new(workers: usize, strategy: AccumulationStrategy) -> OptResult<Self> {
        let workers = NonZeroUsize::new(workers).ok_or(OptError::InvalidWorkerCount {
            workers,
            reason: "Evaluator needs at least one worker.",
        })?;
        Ok(Self { workers, strategy })
    }
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            strategy: AccumulationStrategy::default(),
        }
    }
}

/// Lifecycle of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Constructed; no threads yet.
    Idle,
    /// Threads spawned and waiting for rounds.
    Running,
    /// Threads joined; terminal.
    Stopped,
}

// ---- Shared state ----

struct Shared<O> {
    objective: O,
    strategy: AccumulationStrategy,
    rendezvous: Rendezvous,
    arguments: RwLock<Theta>,
    global: Mutex<RoundAccumulator>,
    locals: Vec<Mutex<RoundAccumulator>>,
    faulted: AtomicBool,
    fault: Mutex<Option<(usize, String)>>,
}

impl<O> Shared<O> {
    fn record_fault(&self, worker: usize, reason: String) {
        let mut slot = self.fault.lock();
        if slot.is_none() {
            *slot = Some((worker, reason));
        }
        self.faulted.store(true, Ordering::Release);
    }

    fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }
}

/// Persistent master/worker evaluator for a [`SampleObjective`].
pub struct ConcurrentEvaluator<O: SampleObjective> {
    shared: Arc<Shared<O>>,
    options: EvaluatorOptions,
    shards: Vec<WorkShard>,
    handles: Vec<JoinHandle<()>>,
    state: PoolState,
}

impl<O: SampleObjective> ConcurrentEvaluator<O> {
    /// Wrap `objective`; no threads are spawned until the first round.
    pub fn new(objective: O, options: EvaluatorOptions) -> Self {
        let dim = objective.dimensionality();
        let workers = options.workers.get();
        let shared = Shared {
            objective,
            strategy: options.strategy,
            rendezvous: Rendezvous::new(workers),
            arguments: RwLock::new(Array1::zeros(dim)),
            global: Mutex::new(RoundAccumulator::new(dim)),
            locals: (0..workers).map(|_| Mutex::new(RoundAccumulator::new(dim))).collect(),
            faulted: AtomicBool::new(false),
            fault: Mutex::new(None),
        };
        Self {
            shared: Arc::new(shared),
            options,
            shards: Vec::new(),
            handles: Vec::with_capacity(workers),
            state: PoolState::Idle,
        }
    }

    pub fn objective(&self) -> &O {
        &self.shared.objective
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Shard assignment, empty until the pool has started.
    pub fn shards(&self) -> &[WorkShard] {
        &self.shards
    }

    /// Spawn the worker threads. Calling it on a running pool is a no-op.
    ///
    /// # Errors
    /// - [`OptError::PoolStopped`] once the pool has been shut down.
    /// - [`OptError::WorkerSpawn`] if a thread cannot be created; threads
    ///   already spawned are stopped and joined.
    pub fn start(&mut self) -> OptResult<()> {
        match self.state {
            PoolState::Running => return Ok(()),
            PoolState::Stopped => return Err(OptError::PoolStopped),
            PoolState::Idle => {}
        }
        let shards = partition(self.shared.objective.sample_count(), self.options.workers);
        for (id, shard) in shards.iter().copied().enumerate() {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("evaluator-worker-{id}"))
                .spawn(move || worker_loop(id, shard, &shared));
            match spawned {
                Ok(handle) => self.handles.push(handle),
                Err(e) => {
                    self.state = PoolState::Running;
                    self.shutdown();
                    return Err(OptError::WorkerSpawn { reason: e.to_string() });
                }
            }
        }
        self.shards = shards;
        self.state = PoolState::Running;
        debug!(
            "evaluator pool started: workers={} samples={} strategy={}",
            self.options.workers,
            self.shared.objective.sample_count(),
            self.options.strategy
        );
        Ok(())
    }

    /// Run one synchronized round at `arguments`.
    ///
    /// Writes the summed gradient into `gradient_out` and returns the summed
    /// loss and correct count. Starts the pool on first use.
    ///
    /// # Errors
    /// - [`OptError::PoolStopped`] after shutdown.
    /// - [`OptError::ArgumentDimMismatch`] / [`OptError::GradientDimMismatch`]
    ///   for mis-sized buffers.
    /// - [`OptError::WorkerFault`] if any worker failed; the pool is stopped.
    pub fn run_round(
        &mut self, arguments: &Theta, gradient_out: &mut Grad,
    ) -> OptResult<RoundSummary> {
        self.start()?;
        let dim = self.shared.objective.dimensionality();
        if arguments.len() != dim {
            return Err(OptError::ArgumentDimMismatch { expected: dim, found: arguments.len() });
        }
        if gradient_out.len() != dim {
            return Err(OptError::GradientDimMismatch { expected: dim, found: gradient_out.len() });
        }

        self.shared.global.lock().reset();
        for local in &self.shared.locals {
            local.lock().reset();
        }
        self.shared.arguments.write().assign(arguments);
        gradient_out.fill(0.0);

        if self.shared.rendezvous.open_round().is_none() {
            return Err(OptError::PoolStopped);
        }
        self.shared.rendezvous.wait_round_complete();

        if self.shared.is_faulted() {
            let (worker, reason) = self
                .shared
                .fault
                .lock()
                .take()
                .unwrap_or((0, "unrecorded worker fault".to_string()));
            warn!("worker {worker} faulted, stopping evaluator pool: {reason}");
            self.shutdown();
            return Err(OptError::WorkerFault { worker, reason });
        }

        let total = self.fold();
        gradient_out.assign(&ArrayView1::from(total.gradient.as_slice()));
        Ok(RoundSummary {
            loss: total.loss,
            correct: total.correct,
            samples: self.shared.objective.sample_count(),
        })
    }

    /// Signal stop, join all workers and move to [`PoolState::Stopped`].
    pub fn shutdown(&mut self) {
        if self.state == PoolState::Stopped {
            return;
        }
        self.shared.rendezvous.stop();
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("evaluator-worker").to_string();
            if let Err(e) = handle.join() {
                warn!("failed to join {name}: {}", panic_reason(e.as_ref()));
            }
        }
        if self.state == PoolState::Running {
            debug!("evaluator pool stopped");
        }
        self.state = PoolState::Stopped;
    }

    fn fold(&self) -> RoundAccumulator {
        match self.shared.strategy {
            AccumulationStrategy::SharedCriticalSection => self.shared.global.lock().clone(),
            AccumulationStrategy::LocalMerge => {
                let mut total = RoundAccumulator::new(self.shared.objective.dimensionality());
                for local in &self.shared.locals {
                    total.merge(&local.lock());
                }
                total
            }
        }
    }
}

impl<O: SampleObjective> Drop for ConcurrentEvaluator<O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<O: SampleObjective> fmt::Debug for ConcurrentEvaluator<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentEvaluator")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("shards", &self.shards)
            .finish()
    }
}

/// Evaluate every sample on the calling thread, in index order.
///
/// Reference for the parallel strategies; also handy for small data sets.
///
/// # Errors
/// Dimension errors as in [`ConcurrentEvaluator::run_round`], and any error
/// returned by the objective.
pub fn evaluate_sequential<O: SampleObjective + ?Sized>(
    objective: &O, arguments: &Theta, gradient_out: &mut Grad,
) -> OptResult<RoundSummary> {
    let dim = objective.dimensionality();
    if arguments.len() != dim {
        return Err(OptError::ArgumentDimMismatch { expected: dim, found: arguments.len() });
    }
    if gradient_out.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: gradient_out.len() });
    }
    let mut total = RoundAccumulator::new(dim);
    let mut scratch = Contribution::new();
    for index in 0..objective.sample_count() {
        scratch.clear();
        objective.contribute(index, arguments, &mut scratch)?;
        total.absorb(&scratch)?;
    }
    gradient_out.assign(&ArrayView1::from(total.gradient.as_slice()));
    Ok(RoundSummary { loss: total.loss, correct: total.correct, samples: objective.sample_count() })
}

// ---- Worker side ----

fn worker_loop<O: SampleObjective>(id: usize, shard: WorkShard, shared: &Shared<O>) {
    let mut scratch = Contribution::new();
    let mut last_seen = 0;
    while let Some(generation) = shared.rendezvous.await_round(last_seen) {
        last_seen = generation;
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| run_shard(id, shard, shared, &mut scratch)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => shared.record_fault(id, e.to_string()),
            Err(payload) => shared.record_fault(id, panic_reason(payload.as_ref())),
        }
        shared.rendezvous.arrive();
    }
    debug!("evaluator worker {id} exiting after {last_seen} rounds");
}

fn run_shard<O: SampleObjective>(
    id: usize, shard: WorkShard, shared: &Shared<O>, scratch: &mut Contribution,
) -> OptResult<()> {
    let arguments = shared.arguments.read();
    match shared.strategy {
        AccumulationStrategy::SharedCriticalSection => {
            for index in shard.range() {
                if shared.is_faulted() {
                    break;
                }
                scratch.clear();
                shared.objective.contribute(index, &arguments, scratch)?;
                shared.global.lock().absorb(scratch)?;
            }
        }
        AccumulationStrategy::LocalMerge => {
            let mut local = shared.locals[id].lock();
            for index in shard.range() {
                if shared.is_faulted() {
                    break;
                }
                scratch.clear();
                shared.objective.contribute(index, &arguments, scratch)?;
                local.absorb(scratch)?;
            }
        }
    }
    Ok(())
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
