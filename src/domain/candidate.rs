// ============================================================
// Layer 3 — Candidate Domain Type
// ============================================================
// A sentence offered for annotation during one sweep, together
// with the document holding it and the tagger's margin for it.
//
// Margin = P(best labeling) - P(second best labeling).
// A small margin means the model is unsure about the sentence,
// which makes the sentence a good candidate for annotation.
//
// Candidates are created fresh every sweep and never persisted.

use crate::domain::document::AnnotationId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Index of the owning document in the corpus
    pub doc: usize,

    /// Id of the sentence annotation inside that document
    pub sentence: AnnotationId,

    /// Tagger margin for the sentence (0.0 under random selection)
    pub margin: f64,
}

impl Candidate {
    pub fn new(doc: usize, sentence: AnnotationId, margin: f64) -> Self {
        Self { doc, sentence, margin }
    }
}
