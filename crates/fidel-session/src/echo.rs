//! Bookkeeping for backspaces the engine synthesizes itself.
//!
//! Each commit registers a batch tagged with its `CommitId`. Backspace events
//! drain the oldest batch first, so the total behaves exactly like a bare
//! counter while still letting a failed injection retract its own batch.

use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(pub u64);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Batch {
    commit: CommitId,
    requested: usize,
    remaining: usize,
}

#[derive(Debug, Default)]
pub(crate) struct EchoLedger {
    batches: VecDeque<Batch>,
    next_id: u64,
}

impl EchoLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `count` upcoming synthesized backspaces and return the tag for them.
    pub(crate) fn expect(&mut self, count: usize) -> CommitId {
        self.next_id += 1;
        let commit = CommitId(self.next_id);
        if count > 0 {
            self.batches.push_back(Batch {
                commit,
                requested: count,
                remaining: count,
            });
        }
        commit
    }

    /// Swallow one backspace if any echo is outstanding.
    pub(crate) fn try_consume(&mut self) -> Option<CommitId> {
        let front = self.batches.front_mut()?;
        front.remaining -= 1;
        let commit = front.commit;
        if front.remaining == 0 {
            self.batches.pop_front();
        }
        Some(commit)
    }

    pub(crate) fn pending(&self) -> usize {
        self.batches.iter().map(|b| b.remaining).sum()
    }

    /// Only `delivered` of the batch's backspaces were ever synthesized.
    pub(crate) fn settle(&mut self, commit: CommitId, delivered: usize) {
        let Some(idx) = self.batches.iter().position(|b| b.commit == commit) else {
            return;
        };
        let batch = &mut self.batches[idx];
        let seen = batch.requested - batch.remaining;
        batch.remaining = delivered.min(batch.requested).saturating_sub(seen);
        if batch.remaining == 0 {
            self.batches.remove(idx);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.batches.clear();
    }
}
