// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved tagger on the held-out documents of the run
// that produced it:
//
//   1. read learn_config.json from the output directory
//   2. reload and re-partition the same corpus
//   3. hide the gold names of the held-out documents
//   4. load tagger.json and score it (see evaluation.rs)

use anyhow::Result;
use std::collections::BTreeSet;

use crate::application::evaluation::{report, score_documents};
use crate::application::learn_use_case::open_corpus;
use crate::data::splitter::partition_corpus;
use crate::domain::document::{Span, GOLD_NAME_TAG, NAME_TAG};
use crate::infra::run_store::RunStore;
use crate::ml::scorer::MatchCounts;
use crate::ml::tagger::LexiconTagger;

pub struct EvaluateUseCase {
    store: RunStore,
}

impl EvaluateUseCase {
    pub fn new(output_dir: &str) -> Result<Self> {
        Ok(Self { store: RunStore::new(output_dir)? })
    }

    pub fn execute(&self) -> Result<MatchCounts> {
        let cfg       = self.store.load_config()?;
        let corpus    = open_corpus(&cfg.corpus_dir)?;
        let partition = partition_corpus(corpus.size(), cfg.seed_docs, cfg.held_out_docs)?;

        for i in partition.held_out.clone() {
            let mut doc = corpus.lock(i);
            let whole   = Span::new(0, doc.text().len());
            doc.copy_inside(NAME_TAG, GOLD_NAME_TAG, whole);
            doc.erase_inside(NAME_TAG, whole);
        }

        let mut tagger: LexiconTagger = self.store.load_tagger()?;
        tracing::info!(
            "Evaluating tagger ({} training tokens) on {} held-out document(s)",
            tagger.tokens_trained(),
            partition.held_out.len()
        );

        let counts = score_documents(&mut tagger, &corpus, partition.held_out, &BTreeSet::new())?;
        report(&counts);
        Ok(counts)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::learn_use_case::{LearnConfig, LearnUseCase};
    use std::fs;

    #[test]
    fn test_evaluate_after_learn() {
        let corpus = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let docs   = [
            r#"<ENAMEX TYPE="PERSON">John</ENAMEX> ran. <ENAMEX TYPE="PERSON">Ann</ENAMEX> sat."#,
            r#"<ENAMEX TYPE="PERSON">Ann</ENAMEX> ran home."#,
            r#"<ENAMEX TYPE="PERSON">John</ENAMEX> sat down."#,
        ];
        for (i, d) in docs.iter().enumerate() {
            fs::write(corpus.path().join(format!("{i}.sgm")), d).unwrap();
        }

        let cfg = LearnConfig {
            corpus_dir:    corpus.path().to_string_lossy().into_owned(),
            output_dir:    output.path().to_string_lossy().into_owned(),
            seed_docs:     1,
            held_out_docs: 1,
            batch_size:    1,
            max_sweeps:    3,
            ..LearnConfig::default()
        };
        LearnUseCase::new(cfg).execute().unwrap();

        let counts = EvaluateUseCase::new(&output.path().to_string_lossy())
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(counts.tags_in_key, 1);
    }

    #[test]
    fn test_evaluate_without_learn_fails() {
        let output = tempfile::tempdir().unwrap();
        let result = EvaluateUseCase::new(&output.path().to_string_lossy())
            .unwrap()
            .execute();
        assert!(result.is_err());
    }
}
