// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the corpus
// the learner works on and the collaborators it drives.
//
// Rules for this layer:
//   - NO file I/O or threads
//   - NO tagger internals
//   - Only data types and the traits other layers implement

/// Spans, annotations and documents
pub mod document;

/// The shared, ordered document store
pub mod corpus;

/// A sentence offered for annotation in one sweep
pub mod candidate;

/// Seed / pool / held-out ranges over the corpus
pub mod partition;

/// Abstractions implemented by the data, ml and infra layers
pub mod traits;
