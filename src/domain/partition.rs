// ============================================================
// Layer 3 — Corpus Partition
// ============================================================
// Three disjoint, order-preserving index ranges over the corpus:
//
//   [0 .. seed)                  seed      fully labeled, frozen
//   [seed .. len - held_out)     pool      labels withheld
//   [len - held_out .. len)      held_out  scoring only
//
// Documents never move between ranges at runtime.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Seed,
    Pool,
    HeldOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPartition {
    pub seed:     Range<usize>,
    pub pool:     Range<usize>,
    pub held_out: Range<usize>,
}

impl CorpusPartition {
    /// Which range document `index` belongs to, if any
    pub fn role_of(&self, index: usize) -> Option<Role> {
        if self.seed.contains(&index) {
            Some(Role::Seed)
        } else if self.pool.contains(&index) {
            Some(Role::Pool)
        } else if self.held_out.contains(&index) {
            Some(Role::HeldOut)
        } else {
            None
        }
    }

    /// Total number of documents covered by the three ranges
    pub fn len(&self) -> usize {
        self.seed.len() + self.pool.len() + self.held_out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
