// ============================================================
// Layer 2 — Active Learner (sweep controller)
// ============================================================
// Drives the tagger through repeated sweeps over the corpus.
// Each sweep walks through these phases in order:
//
//   SCORING                  tag the held-out set, compare with gold;
//                            full attribute recall → TERMINATED
//   PRUNING                  erase predictions from pool sentences
//                            that are not yet `training`
//   JOINING_PREVIOUS_WORKER  wait for last sweep's worker, if any
//   TRAINING_ON_JOINED       train on what it labeled, then
//                            recompute probabilities once
//   SELECTING                tag every free pool sentence and pick
//                            K by margin (or at random)
//   DISPATCHING              synchronous: label + train now
//                            overlapped:  hand the batch to a new
//                            worker and return without waiting
//
// Overlapped mode keeps at most ONE worker alive: a new one is
// only started after the previous one has been joined in the
// same sweep. Documents of an outstanding batch are locked:
// skipped by pruning, scoring and selection. Documents of a
// batch joined in this sweep are still skipped by this sweep's
// selection and come back as candidates one sweep later.
//
// The tagger is only ever touched from this (the controller)
// thread.

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

use crate::application::evaluation::{report, score_documents};
use crate::application::stop_flag::StopFlag;
use crate::application::worker::{reveal, AnnotationWorker, SharedLabeler, WorkerOutcome};
use crate::domain::candidate::Candidate;
use crate::domain::corpus::Corpus;
use crate::domain::document::{
    AnnotationId, Span, GOLD_NAME_TAG, NAME_TAG, SENTENCE,
};
use crate::domain::partition::CorpusPartition;
use crate::domain::traits::{LabelOutcome, SequenceTagger};
use crate::infra::metrics::ProgressLog;
use crate::ml::scorer::MatchCounts;
use crate::ml::selector::{BoundedTopKSelector, CandidatePool};

// ─── Options ──────────────────────────────────────────────────────────────────
/// How the next batch is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// The K sentences with the smallest margin
    Uncertainty,
    /// K sentences drawn uniformly from the pool
    Random,
}

#[derive(Debug, Clone)]
pub struct LearnerOptions {
    /// Sentences per batch (K)
    pub batch_size:  usize,
    pub max_sweeps:  usize,
    pub strategy:    SelectionStrategy,
    /// Label batches on a worker thread while the next sweep runs
    pub overlapped:  bool,
    pub random_seed: Option<u64>,
}

// ─── State ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    Scoring,
    Pruning,
    JoiningPreviousWorker,
    TrainingOnJoined,
    Selecting,
    Dispatching,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every held-out name found with the right type
    FullRecall,
    /// The annotator asked to stop
    UserStopped,
    /// No unlabeled pool sentence left
    PoolExhausted,
    /// Configured number of sweeps done
    SweepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Continue,
    Stop(StopReason),
}

/// What survives from one sweep to the next
pub struct SweepState {
    phase:      SweepPhase,
    /// Batch chosen by the latest SELECTING phase
    selected:   Vec<Candidate>,
    /// Largest margin in `selected` (uncertainty mode only)
    max_margin: Option<f64>,
    /// Documents held by the outstanding worker
    locked:     BTreeSet<usize>,
    worker:     Option<AnnotationWorker>,
}

impl SweepState {
    fn new() -> Self {
        Self {
            phase:      SweepPhase::Idle,
            selected:   Vec::new(),
            max_margin: None,
            locked:     BTreeSet::new(),
            worker:     None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sweeps:              usize,
    pub sentences_annotated: usize,
    /// Held-out counts of the latest SCORING phase
    pub last_score:          Option<MatchCounts>,
    pub stop_reason:         StopReason,
}

/// Streaming collector for one SELECTING pass
enum Selection {
    TopK(BoundedTopKSelector),
    Random(CandidatePool),
}

// ─── ActiveLearner ────────────────────────────────────────────────────────────
pub struct ActiveLearner<T: SequenceTagger> {
    options:   LearnerOptions,
    corpus:    Corpus,
    partition: CorpusPartition,
    tagger:    T,
    labeler:   SharedLabeler,
    stop:      StopFlag,
    rng:       StdRng,
    progress:  Option<ProgressLog>,
    state:     SweepState,

    sweeps:              usize,
    sentences_annotated: usize,
    last_score:          Option<MatchCounts>,
}

impl<T: SequenceTagger> ActiveLearner<T> {
    pub fn new(
        options:   LearnerOptions,
        corpus:    Corpus,
        partition: CorpusPartition,
        tagger:    T,
        labeler:   SharedLabeler,
        stop:      StopFlag,
    ) -> Result<Self> {
        ensure!(options.batch_size > 0, "batch size must be at least 1");
        ensure!(
            partition.len() <= corpus.size(),
            "partition covers {} documents but the corpus has {}",
            partition.len(),
            corpus.size()
        );

        let rng = match options.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            options,
            corpus,
            partition,
            tagger,
            labeler,
            stop,
            rng,
            progress: None,
            state: SweepState::new(),
            sweeps: 0,
            sentences_annotated: 0,
            last_score: None,
        })
    }

    /// Append one progress row per sweep to `log`
    pub fn with_progress_log(mut self, log: ProgressLog) -> Self {
        self.progress = Some(log);
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn tagger(&self) -> &T {
        &self.tagger
    }

    pub fn into_tagger(self) -> T {
        self.tagger
    }

    pub fn phase(&self) -> SweepPhase {
        self.state.phase
    }

    pub fn selected(&self) -> &[Candidate] {
        &self.state.selected
    }

    pub fn selected_max_margin(&self) -> Option<f64> {
        self.state.max_margin
    }

    pub fn locked_documents(&self) -> &BTreeSet<usize> {
        &self.state.locked
    }

    pub fn has_outstanding_worker(&self) -> bool {
        self.state.worker.is_some()
    }

    pub fn sentences_annotated(&self) -> usize {
        self.sentences_annotated
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    // ── Seed training ─────────────────────────────────────────────────────────
    /// Hide gold labels outside the seed set and train on the seed set.
    /// Returns the number of seed sentences.
    pub fn initialize(&mut self) -> Result<usize> {
        let mut seed_sentences = 0;

        for i in 0..self.corpus.size() {
            let mut doc = self.corpus.lock(i);
            let whole   = Span::new(0, doc.text().len());

            doc.copy_inside(NAME_TAG, GOLD_NAME_TAG, whole);
            if self.partition.seed.contains(&i) {
                let ids: Vec<AnnotationId> =
                    doc.annotations_of_type(SENTENCE).iter().map(|s| s.id).collect();
                for id in ids {
                    doc.mark_training(id);
                    seed_sentences += 1;
                }
            } else {
                doc.erase_inside(NAME_TAG, whole);
            }
        }
        tracing::info!("{} sentences in initial training set", seed_sentences);

        if self.options.strategy == SelectionStrategy::Uncertainty {
            self.tagger.record_margin();
        }

        for i in 0..self.corpus.size() {
            let doc = self.corpus.lock(i);
            self.tagger.new_document();
            for sentence in doc.annotations_of_type(SENTENCE) {
                if sentence.is_training() {
                    self.tagger.train_on_span(&doc, sentence.span)?;
                }
            }
        }
        self.tagger.compute_probabilities();

        Ok(seed_sentences)
    }

    // ── Outer loop ────────────────────────────────────────────────────────────
    /// Sweep until a stop condition, then wind down any outstanding worker.
    pub fn run(&mut self) -> Result<RunSummary> {
        let reason = loop {
            if !self.stop.keep_learning() {
                break StopReason::UserStopped;
            }
            if self.sweeps >= self.options.max_sweeps {
                break StopReason::SweepLimit;
            }
            if let SweepOutcome::Stop(reason) = self.sweep()? {
                break reason;
            }
        };

        self.finish()?;
        tracing::info!(
            "Active learning finished after {} sweep(s), {} sentence(s) annotated: {:?}",
            self.sweeps,
            self.sentences_annotated,
            reason
        );

        Ok(RunSummary {
            sweeps:              self.sweeps,
            sentences_annotated: self.sentences_annotated,
            last_score:          self.last_score,
            stop_reason:         reason,
        })
    }

    /// One full pass of the state machine
    pub fn sweep(&mut self) -> Result<SweepOutcome> {
        self.sweeps += 1;
        tracing::debug!("── sweep {} ──", self.sweeps);

        self.enter(SweepPhase::Scoring);
        self.state.selected.clear();
        self.state.max_margin = None;
        let score = self.score()?;
        if score.is_perfect() {
            self.enter(SweepPhase::Terminated);
            tracing::info!("100% recall reached, terminating.");
            return Ok(SweepOutcome::Stop(StopReason::FullRecall));
        }

        self.enter(SweepPhase::Pruning);
        let pruned = self.prune();
        tracing::debug!("Pruned {} prediction(s) from pool sentences", pruned);

        self.enter(SweepPhase::JoiningPreviousWorker);
        let cooling = self.join_previous_worker()?;

        if !self.stop.keep_learning() {
            return Ok(SweepOutcome::Stop(StopReason::UserStopped));
        }

        self.enter(SweepPhase::Selecting);
        let batch = self.select(&cooling)?;
        if batch.is_empty() {
            if cooling.is_empty() {
                tracing::info!("No unlabeled sentences left in the pool");
                return Ok(SweepOutcome::Stop(StopReason::PoolExhausted));
            }
            return Ok(SweepOutcome::Continue);
        }

        self.enter(SweepPhase::Dispatching);
        self.dispatch(batch)?;
        Ok(SweepOutcome::Continue)
    }

    fn enter(&mut self, phase: SweepPhase) {
        tracing::trace!("sweep {}: {:?} → {:?}", self.sweeps, self.state.phase, phase);
        self.state.phase = phase;
    }

    // ── SCORING ───────────────────────────────────────────────────────────────
    fn score(&mut self) -> Result<MatchCounts> {
        let held_out = self.partition.held_out.clone();
        let counts   = score_documents(&mut self.tagger, &self.corpus, held_out, &self.state.locked)?;

        report(&counts);
        if let Some(log) = &self.progress {
            log.log(
                self.sentences_annotated,
                counts.attr_recall(),
                counts.attr_precision(),
            )?;
        }
        self.last_score = Some(counts);
        Ok(counts)
    }

    // ── PRUNING ───────────────────────────────────────────────────────────────
    fn prune(&mut self) -> usize {
        let mut erased = 0;
        for i in self.free_pool_documents(&BTreeSet::new()) {
            let mut doc = self.corpus.lock(i);
            let spans: Vec<Span> = doc
                .annotations_of_type(SENTENCE)
                .iter()
                .filter(|s| !s.is_training())
                .map(|s| s.span)
                .collect();
            for span in spans {
                erased += doc.erase_inside(NAME_TAG, span);
            }
        }
        erased
    }

    // ── JOINING_PREVIOUS_WORKER / TRAINING_ON_JOINED ──────────────────────────
    /// Join the outstanding worker, if any, and train on its batch.
    /// Returns the documents that worker held.
    fn join_previous_worker(&mut self) -> Result<BTreeSet<usize>> {
        let Some(worker) = self.state.worker.take() else {
            return Ok(BTreeSet::new());
        };

        if !worker.is_finished() {
            tracing::info!("Waiting for annotation worker.");
        }
        let documents = worker.documents().clone();
        let outcome   = worker.join()?;
        self.state.locked.clear();
        tracing::info!("Annotation worker finished.");

        match outcome {
            WorkerOutcome::Completed(labeled) => {
                self.enter(SweepPhase::TrainingOnJoined);
                for candidate in &labeled {
                    self.train_on(candidate)?;
                }
                if !labeled.is_empty() {
                    self.tagger.compute_probabilities();
                }
            }
            WorkerOutcome::Panicked(message) => {
                tracing::error!(
                    "Annotation worker failed, its batch is not trained on: {}",
                    message
                );
            }
        }
        Ok(documents)
    }

    // ── SELECTING ─────────────────────────────────────────────────────────────
    fn select(&mut self, cooling: &BTreeSet<usize>) -> Result<Vec<Candidate>> {
        let k = self.options.batch_size;
        let mut selection = match self.options.strategy {
            SelectionStrategy::Uncertainty => Selection::TopK(BoundedTopKSelector::new(k)),
            SelectionStrategy::Random => Selection::Random(CandidatePool::new()),
        };

        let mut in_pool = 0usize;
        for i in self.free_pool_documents(cooling) {
            let mut doc = self.corpus.lock(i);
            let sentences: Vec<(AnnotationId, Span)> = doc
                .annotations_of_type(SENTENCE)
                .iter()
                .filter(|s| !s.is_training())
                .map(|s| (s.id, s.span))
                .collect();

            self.tagger.new_document();
            for (id, span) in sentences {
                self.tagger.annotate_span(&mut doc, span)?;
                match &mut selection {
                    Selection::TopK(selector) => {
                        selector.consider(Candidate::new(i, id, self.tagger.margin()));
                    }
                    Selection::Random(pool) => pool.offer(Candidate::new(i, id, 0.0)),
                }
                in_pool += 1;
            }
        }
        tracing::debug!("{} sentence(s) in the active learning pool", in_pool);

        let batch = match selection {
            Selection::TopK(selector) => {
                self.state.max_margin = selector.max_margin();
                selector.into_result()
            }
            Selection::Random(mut pool) => {
                self.state.max_margin = None;
                pool.draw(k, &mut self.rng)
            }
        };
        self.state.selected = batch.clone();
        Ok(batch)
    }

    /// Pool documents not held by a worker and not in `also_skip`
    fn free_pool_documents(&self, also_skip: &BTreeSet<usize>) -> Vec<usize> {
        let pool: Range<usize> = self.partition.pool.clone();
        pool.filter(|i| !self.state.locked.contains(i) && !also_skip.contains(i))
            .collect()
    }

    // ── DISPATCHING ───────────────────────────────────────────────────────────
    fn dispatch(&mut self, batch: Vec<Candidate>) -> Result<()> {
        if self.options.overlapped {
            ensure!(
                self.state.worker.is_none(),
                "an annotation worker is already outstanding"
            );
            self.state.locked = batch.iter().map(|c| c.doc).collect();
            let size   = batch.len();
            let worker = AnnotationWorker::spawn(
                batch,
                &self.corpus,
                self.labeler.clone(),
                self.stop.clone(),
            )?;
            self.state.worker = Some(worker);
            tracing::info!("*** started annotation worker for {} sentence(s) ***", size);
            return Ok(());
        }

        let mut folded = 0;
        for candidate in &batch {
            let outcome = self.fold(candidate)?;
            folded += 1;
            if outcome == LabelOutcome::Stop {
                self.stop.request_stop();
            }
            if !self.stop.keep_learning() {
                break;
            }
        }
        if folded > 0 {
            self.tagger.compute_probabilities();
        }
        Ok(())
    }

    // ── Fold ──────────────────────────────────────────────────────────────────
    /// Reveal the true labels of `candidate`, mark it `training` and
    /// train on it. Call at most once per sentence.
    pub fn fold(&mut self, candidate: &Candidate) -> Result<LabelOutcome> {
        let mut doc = self.corpus.lock(candidate.doc);
        let (span, outcome) = reveal(&mut doc, candidate, &self.labeler)?;
        self.tagger.train_on_span(&doc, span)?;
        self.sentences_annotated += 1;
        Ok(outcome)
    }

    /// Train on a sentence a worker already labeled
    fn train_on(&mut self, candidate: &Candidate) -> Result<()> {
        let mut doc = self.corpus.lock(candidate.doc);
        let Some(span) = doc.annotation(candidate.sentence).map(|s| s.span) else {
            tracing::warn!("Labeled sentence {} vanished, skipping", candidate.sentence);
            return Ok(());
        };
        doc.mark_training(candidate.sentence);
        self.tagger.train_on_span(&doc, span)?;
        self.sentences_annotated += 1;
        Ok(())
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    /// Ask an outstanding worker to stop after its current sentence,
    /// join it and train on whatever it labeled.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(worker) = &self.state.worker {
            if !worker.is_finished() {
                self.stop.request_stop();
            }
        }
        self.join_previous_worker()?;
        Ok(())
    }
}
