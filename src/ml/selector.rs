// ============================================================
// Layer 5 — Candidate Selection
// ============================================================
// Two ways of picking the next batch of sentences to annotate.
//
// 1. BoundedTopKSelector (uncertainty sampling)
//    Streams over every pool sentence once per sweep and keeps
//    the K with the smallest margin.
//
//      consider(c):
//        fewer than K members → append c
//        c.margin < max       → evict the max slot, append c,
//                               rescan for the new max
//        otherwise            → drop c
//
//    Members stay in insertion order. The tracked maximum is
//    the EARLIEST inserted member holding the largest margin,
//    so among equal margins the oldest member is evicted first.
//    Eviction is by slot index, never by value.
//
//    Cost: O(1) for a rejected candidate, O(K) for an accepted
//    one, O(N·K) per sweep in the worst case. K is a handful of
//    sentences, so a heap would not pay for itself.
//
// 2. CandidatePool (random sampling)
//    Collects every pool sentence, then draws K uniformly
//    without replacement.

use rand::Rng;

use crate::domain::candidate::Candidate;

// ─── BoundedTopKSelector ──────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct BoundedTopKSelector {
    capacity: usize,
    members:  Vec<Candidate>,
    /// Slot of the tracked maximum; meaningful only when non-empty
    max_slot: usize,
}

impl BoundedTopKSelector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            members:  Vec::with_capacity(capacity),
            max_slot: 0,
        }
    }

    /// Offer one candidate. Returns true if it was kept.
    pub fn consider(&mut self, candidate: Candidate) -> bool {
        if self.members.len() < self.capacity {
            self.members.push(candidate);
            let last = self.members.len() - 1;
            if last == 0 || candidate.margin > self.members[self.max_slot].margin {
                self.max_slot = last;
            }
            return true;
        }

        match self.max_margin() {
            Some(max) if candidate.margin < max => {
                self.members.remove(self.max_slot);
                self.members.push(candidate);
                self.max_slot = self.scan_max();
                true
            }
            _ => false,
        }
    }

    /// Largest margin among the kept candidates
    pub fn max_margin(&self) -> Option<f64> {
        self.members.get(self.max_slot).map(|c| c.margin)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The kept candidates, in no particular order
    pub fn result(&self) -> &[Candidate] {
        &self.members
    }

    pub fn into_result(self) -> Vec<Candidate> {
        self.members
    }

    /// Index of the first member with the largest margin
    fn scan_max(&self) -> usize {
        let mut best = 0;
        for (i, c) in self.members.iter().enumerate().skip(1) {
            if c.margin > self.members[best].margin {
                best = i;
            }
        }
        best
    }
}

// ─── CandidatePool ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Draw up to `k` candidates uniformly without replacement.
    /// Drawn candidates leave the pool, so none is drawn twice.
    pub fn draw<R: Rng + ?Sized>(&mut self, k: usize, rng: &mut R) -> Vec<Candidate> {
        let n     = k.min(self.candidates.len());
        let mut drawn = Vec::with_capacity(n);
        for _ in 0..n {
            let i = rng.gen_range(0..self.candidates.len());
            drawn.push(self.candidates.swap_remove(i));
        }
        drawn
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn cand(id: u64, margin: f64) -> Candidate {
        Candidate::new(0, id, margin)
    }

    fn margins(sel: &BoundedTopKSelector) -> Vec<f64> {
        let mut m: Vec<f64> = sel.result().iter().map(|c| c.margin).collect();
        m.sort_by(f64::total_cmp);
        m
    }

    #[test]
    fn test_keeps_two_smallest() {
        let mut sel = BoundedTopKSelector::new(2);
        for (i, m) in [0.9, 0.1, 0.5, 0.05].into_iter().enumerate() {
            sel.consider(cand(i as u64, m));
        }
        assert_eq!(margins(&sel), vec![0.05, 0.1]);
        assert_eq!(sel.max_margin(), Some(0.1));
    }

    #[test]
    fn test_never_exceeds_capacity_and_bounds_rejects() {
        let stream = [0.7, 0.3, 0.9, 0.2, 0.2, 0.8, 0.1, 0.6, 0.4, 0.05, 0.3];
        let mut sel = BoundedTopKSelector::new(3);
        let mut rejected = Vec::new();
        for (i, m) in stream.into_iter().enumerate() {
            if !sel.consider(cand(i as u64, m)) {
                rejected.push(m);
            }
            assert!(sel.len() <= 3);
        }
        let max = sel.max_margin().unwrap();
        let kept: HashSet<u64> = sel.result().iter().map(|c| c.sentence).collect();
        for (i, m) in stream.into_iter().enumerate() {
            if !kept.contains(&(i as u64)) {
                assert!(m >= max, "unselected {m} below selected max {max}");
            }
        }
        assert_eq!(margins(&sel), vec![0.05, 0.1, 0.2]);
    }

    #[test]
    fn test_equal_margin_is_not_admitted_when_full() {
        let mut sel = BoundedTopKSelector::new(1);
        assert!(sel.consider(cand(1, 0.4)));
        assert!(!sel.consider(cand(2, 0.4)));
        assert_eq!(sel.result()[0].sentence, 1);
    }

    #[test]
    fn test_earliest_maximal_member_is_evicted() {
        let mut sel = BoundedTopKSelector::new(3);
        sel.consider(cand(1, 0.5));
        sel.consider(cand(2, 0.1));
        sel.consider(cand(3, 0.5));
        sel.consider(cand(4, 0.2));
        let ids: Vec<u64> = sel.result().iter().map(|c| c.sentence).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(sel.max_margin(), Some(0.5));
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut sel = BoundedTopKSelector::new(0);
        assert!(!sel.consider(cand(1, 0.0)));
        assert!(sel.is_empty());
        assert_eq!(sel.max_margin(), None);
    }

    #[test]
    fn test_random_draw_without_replacement() {
        let mut pool = CandidatePool::new();
        for i in 0..10 {
            pool.offer(cand(i, 0.0));
        }
        let mut rng  = StdRng::seed_from_u64(7);
        let drawn    = pool.draw(4, &mut rng);
        let distinct: HashSet<u64> = drawn.iter().map(|c| c.sentence).collect();
        assert_eq!(drawn.len(), 4);
        assert_eq!(distinct.len(), 4);

        let rest: HashSet<u64> = pool.draw(10, &mut rng).iter().map(|c| c.sentence).collect();
        assert_eq!(rest.len(), 6);
        assert!(rest.is_disjoint(&distinct));
    }

    #[test]
    fn test_random_draw_from_small_pool_takes_all() {
        let mut pool = CandidatePool::new();
        pool.offer(cand(1, 0.0));
        pool.offer(cand(2, 0.0));
        let drawn = pool.draw(5, &mut StdRng::seed_from_u64(1));
        assert_eq!(drawn.len(), 2);
        assert!(pool.draw(1, &mut StdRng::seed_from_u64(2)).is_empty());
    }
}
