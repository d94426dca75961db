// ============================================================
// Layer 5 — ML Layer
// ============================================================
// Everything that scores, ranks or predicts:
//
//   selector.rs — bounded top-K by margin, random candidate pool
//   tagger.rs   — count-based BIO name tagger with margins
//   scorer.rs   — compares a response layer against a key layer

/// Uncertainty and random candidate selection
pub mod selector;

/// The name tagger used by the learner
pub mod tagger;

/// Key/response annotation comparison
pub mod scorer;
