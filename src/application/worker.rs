// ============================================================
// Layer 2 — Annotation Worker
// ============================================================
// Labels one batch of selected sentences on a background
// thread while the controller moves on to the next sweep.
//
//   spawn()  → thread labels each sentence and marks it
//              `training`, in batch order
//   join()   → the ONLY synchronisation point; returns the
//              candidates that were actually labeled
//
// The worker never touches the tagger: training on the batch
// happens on the controller thread after join(). It also
// never touches a document outside its batch, and the
// controller keeps its hands off the batch's documents until
// join() returns.
//
// The stop flag is checked after every sentence, so a stop
// request ends the batch early but never mid-sentence.

use anyhow::{anyhow, Context, Result};
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::application::stop_flag::StopFlag;
use crate::domain::candidate::Candidate;
use crate::domain::corpus::{lock_document, Corpus, SharedDocument};
use crate::domain::document::{Document, Span};
use crate::domain::traits::{LabelOutcome, Labeler};

/// A labeling surface usable from the controller and from a worker
pub type SharedLabeler = Arc<Mutex<dyn Labeler>>;

/// How a joined worker ended
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Candidates labeled and marked `training`, in batch order
    Completed(Vec<Candidate>),
    /// The worker thread panicked; nothing it did can be trusted
    Panicked(String),
}

pub struct AnnotationWorker {
    documents: BTreeSet<usize>,
    handle:    JoinHandle<Result<Vec<Candidate>>>,
}

impl AnnotationWorker {
    /// Start labeling `batch` on a new thread
    pub fn spawn(
        batch:   Vec<Candidate>,
        corpus:  &Corpus,
        labeler: SharedLabeler,
        stop:    StopFlag,
    ) -> Result<Self> {
        let items: Vec<(Candidate, SharedDocument)> = batch
            .iter()
            .map(|c| {
                corpus
                    .get(c.doc)
                    .map(|d| (*c, d))
                    .with_context(|| format!("Candidate refers to missing document {}", c.doc))
            })
            .collect::<Result<_>>()?;

        let documents = batch.iter().map(|c| c.doc).collect();
        let handle = thread::Builder::new()
            .name("annotation-worker".to_string())
            .spawn(move || label_batch(items, &labeler, &stop))
            .context("Cannot start annotation worker thread")?;

        Ok(Self { documents, handle })
    }

    /// Documents owned by this worker until it is joined
    pub fn documents(&self) -> &BTreeSet<usize> {
        &self.documents
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker is done.
    ///
    /// A labeling error inside the worker is returned as Err; a
    /// panic is reported as `WorkerOutcome::Panicked` instead.
    pub fn join(self) -> Result<WorkerOutcome> {
        match self.handle.join() {
            Ok(labeled) => Ok(WorkerOutcome::Completed(labeled?)),
            Err(payload) => Ok(WorkerOutcome::Panicked(panic_message(payload))),
        }
    }
}

fn label_batch(
    items:   Vec<(Candidate, SharedDocument)>,
    labeler: &SharedLabeler,
    stop:    &StopFlag,
) -> Result<Vec<Candidate>> {
    let mut labeled = Vec::with_capacity(items.len());
    for (candidate, doc) in items {
        let outcome = {
            let mut doc = lock_document(&doc);
            reveal(&mut doc, &candidate, labeler)?.1
        };
        labeled.push(candidate);

        if outcome == LabelOutcome::Stop {
            stop.request_stop();
        }
        if !stop.keep_learning() {
            tracing::info!("Annotation worker stopping after {} sentence(s)", labeled.len());
            break;
        }
    }
    Ok(labeled)
}

/// Obtain the true labels of one candidate sentence and mark it `training`.
/// Returns the sentence span and what the labeler asked for next.
pub fn reveal(
    doc:       &mut Document,
    candidate: &Candidate,
    labeler:   &SharedLabeler,
) -> Result<(Span, LabelOutcome)> {
    let span = doc
        .annotation(candidate.sentence)
        .map(|s| s.span)
        .ok_or_else(|| {
            anyhow!(
                "Sentence {} not found in '{}'",
                candidate.sentence,
                doc.source()
            )
        })?;

    tracing::debug!("Now annotating: {}", doc.text_of(span));
    let outcome = labeler
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .label(doc, span)?;
    doc.mark_training(candidate.sentence);
    Ok((span, outcome))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gold_labeler::GoldLabeler;
    use crate::domain::document::{NAME_TAG, SENTENCE};
    use crate::test_support::{corpus_of, PanickingLabeler, StoppingLabeler};

    fn pool_candidates(corpus: &Corpus, doc: usize) -> Vec<Candidate> {
        corpus
            .lock(doc)
            .annotations_of_type(SENTENCE)
            .iter()
            .map(|s| Candidate::new(doc, s.id, 0.0))
            .collect()
    }

    fn gold_labeler() -> SharedLabeler {
        Arc::new(Mutex::new(GoldLabeler::new()))
    }

    #[test]
    fn test_labels_and_marks_whole_batch() {
        let corpus = corpus_of(&[
            r#"<ENAMEX TYPE="PERSON">Ann</ENAMEX> ran. Bob sat."#,
        ]);
        // Hide the gold the way the learner does before labeling
        crate::test_support::hide_gold(&corpus, 0);

        let batch  = pool_candidates(&corpus, 0);
        let worker = AnnotationWorker::spawn(batch.clone(), &corpus, gold_labeler(), StopFlag::new())
            .unwrap();
        assert_eq!(worker.documents().len(), 1);

        match worker.join().unwrap() {
            WorkerOutcome::Completed(labeled) => assert_eq!(labeled, batch),
            other => panic!("unexpected outcome {other:?}"),
        }
        let doc = corpus.lock(0);
        assert!(doc.annotations_of_type(SENTENCE).iter().all(|s| s.is_training()));
        assert_eq!(doc.annotations_of_type(NAME_TAG).len(), 1);
    }

    #[test]
    fn test_stop_request_ends_batch_after_current_sentence() {
        let corpus = corpus_of(&["One here. Two here. Three here."]);
        let batch  = pool_candidates(&corpus, 0);
        let stop   = StopFlag::new();
        let labeler: SharedLabeler = Arc::new(Mutex::new(StoppingLabeler::after(1)));

        let worker = AnnotationWorker::spawn(batch.clone(), &corpus, labeler, stop.clone()).unwrap();
        match worker.join().unwrap() {
            WorkerOutcome::Completed(labeled) => assert_eq!(labeled, batch[..1].to_vec()),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!stop.keep_learning());
        let doc = corpus.lock(0);
        let trained = doc
            .annotations_of_type(SENTENCE)
            .iter()
            .filter(|s| s.is_training())
            .count();
        assert_eq!(trained, 1);
    }

    #[test]
    fn test_panic_is_reported_not_propagated() {
        let corpus  = corpus_of(&["Only one."]);
        let batch   = pool_candidates(&corpus, 0);
        let labeler: SharedLabeler = Arc::new(Mutex::new(PanickingLabeler));

        let worker = AnnotationWorker::spawn(batch, &corpus, labeler, StopFlag::new()).unwrap();
        match worker.join().unwrap() {
            WorkerOutcome::Panicked(msg) => assert!(msg.contains("annotator crashed")),
            other => panic!("unexpected outcome {other:?}"),
        }
        // The document is still usable afterwards
        assert_eq!(corpus.lock(0).text(), "Only one.");
    }

    #[test]
    fn test_missing_sentence_is_an_error() {
        let corpus  = corpus_of(&["Only one."]);
        let labeler = gold_labeler();
        let mut doc = corpus.lock(0);
        let bogus   = Candidate::new(0, 9_999, 0.0);
        assert!(reveal(&mut doc, &bogus, &labeler).is_err());
    }
}
