// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The active learner talks to its collaborators only through
// these traits:
//
//   DocumentSource  — loads the corpus
//   SequenceTagger  — trains, decodes and reports margins
//   Labeler         — reveals or asks for the true labels
//   Persistable     — saves and restores component state
//
// The concrete implementations live in the data, ml and infra
// layers; tests substitute scripted ones.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::document::{Document, Span};

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load documents from a source.
///
/// Implementations:
///   - SgmlLoader → loads a directory of SGML-tagged files
pub trait DocumentSource {
    /// Load all available documents, in a stable order.
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── SequenceTagger ───────────────────────────────────────────────────────────
/// A trainable sequence tagger with margin reporting.
///
/// Evidence added by `train_on_span` only becomes visible to
/// `annotate_span` and `margin` after `compute_probabilities`.
pub trait SequenceTagger {
    /// Reset per-document decoding state
    fn new_document(&mut self);

    /// Add the labels currently visible in `span` as training evidence
    fn train_on_span(&mut self, doc: &Document, span: Span) -> Result<()>;

    /// Write predicted labels for `span` into the document
    fn annotate_span(&mut self, doc: &mut Document, span: Span) -> Result<()>;

    /// Margin of the most recent `annotate_span` call
    fn margin(&self) -> f64;

    /// Enable margin tracking during `annotate_span`
    fn record_margin(&mut self);

    /// Fold pending training evidence into the decoding model
    fn compute_probabilities(&mut self);
}

// ─── Labeler ──────────────────────────────────────────────────────────────────
/// What the labeling surface asks the learner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOutcome {
    Continue,
    /// The annotator asked to stop learning altogether
    Stop,
}

/// Anything that can supply the true labels of one sentence.
///
/// Implementations:
///   - GoldLabeler    → copies the hidden gold labels (simulation)
///   - ConsoleLabeler → asks a human in the terminal
///
/// `Send` because an annotation worker runs it on its own thread.
pub trait Labeler: Send {
    /// Write the true labels of `sentence` into the model-visible layer.
    fn label(&mut self, doc: &mut Document, sentence: Span) -> Result<LabelOutcome>;
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// Any component whose state can be saved and restored from disk.
///
/// Implementations:
///   - LexiconTagger → saves/loads its label counts as JSON
pub trait Persistable: Sized {
    fn save(&self, path: &str) -> Result<()>;

    fn load(path: &str) -> Result<Self>;
}
