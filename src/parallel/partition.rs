//! Contiguous, near-equal splitting of work units across workers.
use std::{num::NonZeroUsize, ops::Range};

/// Half-open range `[begin, end)` of work units owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkShard {
    pub begin: usize,
    pub end: usize,
}

impl WorkShard {
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

/// Split `total` units into `workers` contiguous shards.
///
/// With `base = total / workers` and `extra = total % workers`, worker `i`
/// receives `base + 1` units when `i < extra` and `base` otherwise. Shards
/// are returned in worker order, the first starting at `0` and each next one
/// starting where the previous ended, so together they cover `[0, total)`
/// exactly once. Shards may be empty when `total < workers`.
pub fn partition(total: usize, workers: NonZeroUsize) -> Vec<WorkShard> {
    let workers = workers.get();
    let base = total / workers;
    let extra = total % workers;
    let mut begin = 0;
    (0..workers)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let shard = WorkShard { begin, end: begin + len };
            begin = shard.end;
            shard
        })
        .collect()
}
