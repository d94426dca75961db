// ============================================================
// Layer 2 — LearnUseCase
// ============================================================
// Orchestrates one active-learning run in order:
//
//   Step 1: Load the SGML corpus         (Layer 4 - data)
//   Step 2: Split sentences and tokens   (Layer 4 - data)
//   Step 3: Partition seed/pool/held-out (Layer 4 - data)
//   Step 4: Save config                  (Layer 6 - infra)
//   Step 5: Pick the labeling surface    (Layer 2 / Layer 6)
//   Step 6: Seed training                (Layer 2 - active_learner)
//   Step 7: Sweep until a stop condition (Layer 2 - active_learner)
//   Step 8: Save the tagger              (Layer 6 - infra)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{self, BufReader};
use std::sync::{Arc, Mutex};

use crate::application::active_learner::{
    ActiveLearner, LearnerOptions, RunSummary, SelectionStrategy,
};
use crate::application::gold_labeler::GoldLabeler;
use crate::application::stop_flag::StopFlag;
use crate::application::worker::SharedLabeler;
use crate::data::{loader::SgmlLoader, segmenter::Segmenter, splitter::partition_corpus};
use crate::domain::corpus::Corpus;
use crate::infra::{console_labeler::ConsoleLabeler, metrics::ProgressLog, run_store::RunStore};
use crate::ml::tagger::LexiconTagger;

/// Where the true labels of a selected sentence come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelingMode {
    /// Copied from the hidden gold annotations
    Simulated,
    /// Typed by a human at the terminal
    Interactive,
}

// ─── Learning Configuration ──────────────────────────────────────────────────
// Saved next to the tagger so `evaluate` can rebuild the same partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnConfig {
    pub corpus_dir:    String,
    pub output_dir:    String,
    pub seed_docs:     usize,
    pub held_out_docs: usize,
    pub batch_size:    usize,
    pub max_sweeps:    usize,
    pub strategy:      SelectionStrategy,
    pub labeling:      LabelingMode,
    pub overlapped:    bool,
    pub random_seed:   Option<u64>,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            corpus_dir:    "data/corpus".to_string(),
            output_dir:    "runs".to_string(),
            seed_docs:     10,
            held_out_docs: 10,
            batch_size:    5,
            max_sweeps:    21,
            strategy:      SelectionStrategy::Uncertainty,
            labeling:      LabelingMode::Simulated,
            overlapped:    false,
            random_seed:   None,
        }
    }
}

impl LearnConfig {
    fn learner_options(&self) -> LearnerOptions {
        LearnerOptions {
            batch_size:  self.batch_size,
            max_sweeps:  self.max_sweeps,
            strategy:    self.strategy,
            overlapped:  self.overlapped,
            random_seed: self.random_seed,
        }
    }
}

/// Load, segment and return the corpus named by `corpus_dir`
pub fn open_corpus(corpus_dir: &str) -> Result<Corpus> {
    let corpus    = Corpus::open(&SgmlLoader::new(corpus_dir))?;
    let segmenter = Segmenter::new();
    let mut sentences = 0;
    for i in 0..corpus.size() {
        sentences += segmenter.segment(&mut corpus.lock(i));
    }
    tracing::info!(
        "Loaded {} document(s), {} sentence(s) from '{}'",
        corpus.size(),
        sentences,
        corpus_dir
    );
    Ok(corpus)
}

// ─── LearnUseCase ─────────────────────────────────────────────────────────────
pub struct LearnUseCase {
    config: LearnConfig,
}

impl LearnUseCase {
    pub fn new(config: LearnConfig) -> Self {
        Self { config }
    }

    /// Run active learning end to end and save the trained tagger
    pub fn execute(&self) -> Result<RunSummary> {
        let cfg = &self.config;

        // ── Steps 1-3: Corpus ─────────────────────────────────────────────────
        let corpus    = open_corpus(&cfg.corpus_dir)?;
        let partition = partition_corpus(corpus.size(), cfg.seed_docs, cfg.held_out_docs)?;
        tracing::info!(
            "Partition: seed {:?}, pool {:?}, held-out {:?}",
            partition.seed,
            partition.pool,
            partition.held_out
        );

        // ── Step 4: Save config for evaluate ─────────────────────────────────
        let store = RunStore::new(&cfg.output_dir)?;
        store.save_config(cfg)?;

        // ── Step 5: Labeling surface ──────────────────────────────────────────
        let labeler: SharedLabeler = match cfg.labeling {
            LabelingMode::Simulated => Arc::new(Mutex::new(GoldLabeler::new())),
            LabelingMode::Interactive => Arc::new(Mutex::new(ConsoleLabeler::new(
                BufReader::new(io::stdin()),
                io::stdout(),
            ))),
        };

        // ── Steps 6-7: Learn ──────────────────────────────────────────────────
        let progress    = ProgressLog::new(store.dir())?;
        let mut learner = ActiveLearner::new(
            cfg.learner_options(),
            corpus,
            partition,
            LexiconTagger::new(),
            labeler,
            StopFlag::new(),
        )?
        .with_progress_log(progress);

        learner.initialize()?;
        let summary = learner.run()?;

        // ── Step 8: Persist ───────────────────────────────────────────────────
        let tagger = learner.into_tagger();
        tracing::info!("Tagger trained on {} token(s)", tagger.tokens_trained());
        store.save_tagger(&tagger)?;

        Ok(summary)
    }
}
