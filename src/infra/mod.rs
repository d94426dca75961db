// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the concerns that touch the outside world:
//
//   metrics.rs          — Progress logging
//                         Appends one CSV row per sweep with the
//                         held-out attribute recall and precision.
//
//   run_store.rs        — Run persistence
//                         Saves/loads LearnConfig as JSON and the
//                         trained tagger, so `evaluate` can score
//                         a finished run.
//
//   console_labeler.rs  — Interactive annotation
//                         Shows a sentence in the terminal and
//                         applies the annotator's label commands.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Rust Book §12 (I/O and File Handling)

/// Per-sweep progress CSV
pub mod metrics;

/// Config and tagger persistence
pub mod run_store;

/// Terminal labeling surface
pub mod console_labeler;
