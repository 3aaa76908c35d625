//! Reusable master/worker rendezvous for repeating rounds.
//!
//! One master opens numbered rounds; a fixed set of parties (workers) each
//! run every round exactly once and report back. The master blocks until all
//! parties have arrived for the round it opened.
//!
//! State lives under a single `parking_lot::Mutex` with two condition
//! variables: `start` wakes workers when a round opens (or the rendezvous
//! stops) and `done` wakes the master when the last worker arrives. The
//! generation counter lets a worker tell a new round from one it already ran.
use parking_lot::{Condvar, Mutex};

/// Round phase as seen by the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No round in flight; workers idle.
    Waiting,
    /// A round is open and `pending` workers have yet to arrive.
    Running,
    /// Terminal: workers must exit.
    Stopped,
}

#[derive(Debug)]
struct RoundState {
    phase: Phase,
    generation: u64,
    pending: usize,
}

#[derive(Debug)]
pub struct Rendezvous {
    parties: usize,
    state: Mutex<RoundState>,
    start: Condvar,
    done: Condvar,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(RoundState { phase: Phase::Waiting, generation: 0, pending: 0 }),
            start: Condvar::new(),
            done: Condvar::new(),
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Master: open the next round and wake every worker.
    ///
    /// Returns the new generation, or `None` once stopped.
    pub fn open_round(&self) -> Option<u64> {
        let mut state = self.state.lock();
        if state.phase == Phase::Stopped {
            return None;
        }
        state.generation += 1;
        state.pending = self.parties;
        state.phase = Phase::Running;
        let generation = state.generation;
        drop(state);
        self.start.notify_all();
        Some(generation)
    }

    /// Master: block until every party has arrived for the open round.
    pub fn wait_round_complete(&self) {
        let mut state = self.state.lock();
        while state.pending > 0 {
            self.done.wait(&mut state);
        }
        if state.phase == Phase::Running {
            state.phase = Phase::Waiting;
        }
    }

    /// Worker: block until a round newer than `last_seen` opens.
    ///
    /// Returns that round's generation, or `None` when the rendezvous stops.
    pub fn await_round(&self, last_seen: u64) -> Option<u64> {
        let mut state = self.state.lock();
        loop {
            match state.phase {
                Phase::Stopped => return None,
                Phase::Running if state.generation > last_seen => {
                    return Some(state.generation);
                }
                _ => self.start.wait(&mut state),
            }
        }
    }

    /// Worker: report completion of the current round.
    pub fn arrive(&self) {
        let mut state = self.state.lock();
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 {
            drop(state);
            self.done.notify_all();
        }
    }

    /// Move to [`Phase::Stopped`] and wake everyone.
    pub fn stop(&self) {
        self.state.lock().phase = Phase::Stopped;
        self.start.notify_all();
        self.done.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each worker running each round exactly once across many rounds.
    // - Stop releasing idle workers.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Across 200 back-to-back rounds no worker runs a round twice or skips
    // one, and the master only returns after all workers finished.
    //
    // Given
    // -----
    // - 4 workers each recording the generations they ran.
    //
    // Expect
    // ------
    // - After each round the shared counter equals `4 × round`; each worker
    //   saw generations `1..=200` in order.
    fn every_worker_runs_every_round_once() {
        // Arrange
        const WORKERS: usize = 4;
        const ROUNDS: u64 = 200;
        let rendezvous = Arc::new(Rendezvous::new(WORKERS));
        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let rendezvous = Arc::clone(&rendezvous);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    let mut last = 0;
                    while let Some(generation) = rendezvous.await_round(last) {
                        last = generation;
                        seen.push(generation);
                        counter.fetch_add(1, Ordering::SeqCst);
                        rendezvous.arrive();
                    }
                    seen
                })
            })
            .collect();

        // Act
        for round in 1..=ROUNDS {
            assert_eq!(rendezvous.open_round(), Some(round));
            rendezvous.wait_round_complete();
            assert_eq!(counter.load(Ordering::SeqCst), WORKERS * round as usize);
            assert_eq!(rendezvous.phase(), Phase::Waiting);
        }
        rendezvous.stop();

        // Assert
        let expected: Vec<u64> = (1..=ROUNDS).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
        assert_eq!(rendezvous.open_round(), None);
    }

    #[test]
    // Purpose
    // -------
    // Stopping wakes workers that are waiting for a round.
    //
    // Given
    // -----
    // - Two workers blocked in `await_round(0)`.
    //
    // Expect
    // ------
    // - Both return `None` after `stop`.
    fn stop_releases_waiting_workers() {
        let rendezvous = Arc::new(Rendezvous::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let rendezvous = Arc::clone(&rendezvous);
                thread::spawn(move || rendezvous.await_round(0))
            })
            .collect();

        rendezvous.stop();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), None);
        }
        assert_eq!(rendezvous.phase(), Phase::Stopped);
    }
}
