// ============================================================
// Layer 2 — Cooperative Stop Flag
// ============================================================
// The process-wide "keep learning" switch.
//
// Written by the labeling surface (an annotator typing `q`),
// read by the controller at the top of every sweep and between
// candidates of a synchronous batch, and by the annotation
// worker between sentences. Nobody is interrupted mid-task:
// a reader only notices the flag at those points.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone)]
pub struct StopFlag {
    keep_learning: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self {
            keep_learning: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn keep_learning(&self) -> bool {
        self.keep_learning.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        if self.keep_learning.swap(false, Ordering::AcqRel) {
            tracing::info!("Stop requested, finishing current work");
        }
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}
