// ============================================================
// Layer 2 — Gold Labeler (simulated annotation)
// ============================================================
// Simulated active learning: instead of asking a human, reveal
// the gold labels that were hidden from the model.
//
//   1. erase whatever the model predicted inside the sentence
//   2. copy every TRUENAMEX starting in the sentence to ENAMEX
//
// Never asks to stop.

use anyhow::Result;

use crate::domain::document::{Document, Span, GOLD_NAME_TAG, NAME_TAG};
use crate::domain::traits::{LabelOutcome, Labeler};

#[derive(Debug, Clone, Copy, Default)]
pub struct GoldLabeler;

impl GoldLabeler {
    pub fn new() -> Self {
        Self
    }
}

impl Labeler for GoldLabeler {
    fn label(&mut self, doc: &mut Document, sentence: Span) -> Result<LabelOutcome> {
        doc.erase_inside(NAME_TAG, sentence);
        let copied = doc.copy_inside(GOLD_NAME_TAG, NAME_TAG, sentence);
        tracing::debug!(
            "Revealed {} gold name(s) in: {}",
            copied,
            doc.text_of(sentence)
        );
        Ok(LabelOutcome::Continue)
    }
}
