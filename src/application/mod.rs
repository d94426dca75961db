// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (an active-learning run or an evaluation).
//
// Rules for this layer:
//   - No tagger math here (that's Layer 5)
//   - No terminal I/O here (that's Layer 1 and the console
//     labeler in Layer 6)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)
//            Rust Book §16 (Fearless Concurrency)

// The sweep state machine
pub mod active_learner;

// Scoring the tagger on held-out documents
pub mod evaluation;

// Background labeling of one batch
pub mod worker;

// Process-wide cooperative stop switch
pub mod stop_flag;

// Simulated annotator that reveals hidden gold labels
pub mod gold_labeler;

// The `learn` workflow
pub mod learn_use_case;

// The `evaluate` workflow
pub mod evaluate_use_case;
