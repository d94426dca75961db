// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Turns a directory of tagged files into a segmented corpus
// split into the ranges active learning works with.
//
//   *.sgm files
//       │
//       ▼
//   Preprocessor   → normalises line endings and invisible chars
//       │
//       ▼
//   SgmlLoader     → strips markup, records it as annotations
//       │
//       ▼
//   Segmenter      → adds sentence and token annotations
//       │
//       ▼
//   partition_corpus → seed / pool / held-out ranges

/// Loads SGML-tagged files from a directory
pub mod loader;

/// Cleans and normalises raw text
pub mod preprocessor;

/// Splits text bodies into sentences and tokens
pub mod segmenter;

/// Divides the corpus into seed, pool and held-out ranges
pub mod splitter;
