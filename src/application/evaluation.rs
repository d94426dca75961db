// ============================================================
// Layer 2 — Held-out Evaluation
// ============================================================
// Runs the tagger over the held-out documents and compares its
// output with the hidden gold labels.
//
// For each document:
//   1. clear old predictions in every non-training sentence
//   2. annotate every such sentence with the current model
//   3. compare TRUENAMEX (key) against ENAMEX (response)
//   4. clear the predictions again
//
// Counts are summed over ALL documents before recall and
// precision are computed.

use anyhow::Result;
use std::collections::BTreeSet;

use crate::domain::corpus::Corpus;
use crate::domain::document::{Span, GOLD_NAME_TAG, NAME_TAG, SENTENCE};
use crate::domain::traits::SequenceTagger;
use crate::ml::scorer::{compare, MatchCounts};

/// Score the tagger on `docs`, skipping any document in `locked`.
pub fn score_documents<T, I>(
    tagger: &mut T,
    corpus: &Corpus,
    docs:   I,
    locked: &BTreeSet<usize>,
) -> Result<MatchCounts>
where
    T: SequenceTagger,
    I: IntoIterator<Item = usize>,
{
    let mut total = MatchCounts::default();

    for i in docs {
        if locked.contains(&i) {
            continue;
        }
        let mut doc = corpus.lock(i);
        let sentences: Vec<Span> = doc
            .annotations_of_type(SENTENCE)
            .iter()
            .filter(|s| !s.is_training())
            .map(|s| s.span)
            .collect();

        tagger.new_document();
        for &span in &sentences {
            doc.erase_inside(NAME_TAG, span);
            tagger.annotate_span(&mut doc, span)?;
        }

        total += compare(&doc, GOLD_NAME_TAG, NAME_TAG);

        for &span in &sentences {
            doc.erase_inside(NAME_TAG, span);
        }
    }

    Ok(total)
}

/// Log the four headline numbers for one evaluation
pub fn report(counts: &MatchCounts) {
    tracing::info!("Overall Type Recall:          {:.4}", counts.type_recall());
    tracing::info!("Overall Type Precision:       {:.4}", counts.type_precision());
    tracing::info!("Overall Attribute Recall:     {:.4}", counts.attr_recall());
    tracing::info!("Overall Attribute Precision:  {:.4}", counts.attr_precision());
}
