// Shared fixtures for unit tests across layers.

use anyhow::Result;

use crate::data::loader::parse_sgml;
use crate::data::segmenter::Segmenter;
use crate::domain::corpus::Corpus;
use crate::domain::document::{Document, Span, GOLD_NAME_TAG, NAME_TAG};
use crate::domain::traits::{LabelOutcome, Labeler, SequenceTagger};

/// Parse and segment each text into its own document ("doc0", "doc1", ...)
pub fn corpus_of(texts: &[&str]) -> Corpus {
    let segmenter = Segmenter::new();
    let docs = texts
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut doc = parse_sgml(format!("doc{i}"), raw);
            segmenter.segment(&mut doc);
            doc
        })
        .collect();
    Corpus::from_documents(docs)
}

/// Move the visible names of document `index` to the gold layer
pub fn hide_gold(corpus: &Corpus, index: usize) {
    let mut doc = corpus.lock(index);
    let whole   = Span::new(0, doc.text().len());
    doc.copy_inside(NAME_TAG, GOLD_NAME_TAG, whole);
    doc.erase_inside(NAME_TAG, whole);
}

// ─── ScriptedTagger ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub enum TaggerEvent {
    NewDocument,
    Train(String),
    Annotate(String),
    ComputeProbabilities,
}

/// Tagger double: records every call and reports a fixed margin
/// per sentence text. The oracle variant predicts the gold names.
#[derive(Debug, Default)]
pub struct ScriptedTagger {
    pub events:    Vec<TaggerEvent>,
    pub margins:   Vec<(String, f64)>,
    pub recording: bool,
    oracle:        bool,
    last_margin:   f64,
}

impl ScriptedTagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oracle() -> Self {
        Self { oracle: true, ..Self::default() }
    }

    pub fn with_margins(margins: &[(&str, f64)]) -> Self {
        Self {
            margins: margins.iter().map(|(t, m)| (t.to_string(), *m)).collect(),
            ..Self::default()
        }
    }
}

impl SequenceTagger for ScriptedTagger {
    fn new_document(&mut self) {
        self.events.push(TaggerEvent::NewDocument);
    }

    fn train_on_span(&mut self, doc: &Document, span: Span) -> Result<()> {
        self.events.push(TaggerEvent::Train(doc.text_of(span).to_string()));
        Ok(())
    }

    fn annotate_span(&mut self, doc: &mut Document, span: Span) -> Result<()> {
        let text = doc.text_of(span).to_string();
        self.last_margin = self
            .margins
            .iter()
            .find(|(t, _)| *t == text)
            .map_or(1.0, |(_, m)| *m);
        if self.oracle {
            doc.copy_inside(GOLD_NAME_TAG, NAME_TAG, span);
        }
        self.events.push(TaggerEvent::Annotate(text));
        Ok(())
    }

    fn margin(&self) -> f64 {
        self.last_margin
    }

    fn record_margin(&mut self) {
        self.recording = true;
    }

    fn compute_probabilities(&mut self) {
        self.events.push(TaggerEvent::ComputeProbabilities);
    }
}

// ─── Labelers ─────────────────────────────────────────────────────────────────
/// Reveals gold like the simulated labeler and asks to stop on the n-th sentence
pub struct StoppingLabeler {
    remaining: usize,
}

impl StoppingLabeler {
    pub fn after(n: usize) -> Self {
        Self { remaining: n }
    }
}

impl Labeler for StoppingLabeler {
    fn label(&mut self, doc: &mut Document, sentence: Span) -> Result<LabelOutcome> {
        doc.erase_inside(NAME_TAG, sentence);
        doc.copy_inside(GOLD_NAME_TAG, NAME_TAG, sentence);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Ok(LabelOutcome::Stop)
        } else {
            Ok(LabelOutcome::Continue)
        }
    }
}

pub struct PanickingLabeler;

impl Labeler for PanickingLabeler {
    fn label(&mut self, _doc: &mut Document, _sentence: Span) -> Result<LabelOutcome> {
        panic!("annotator crashed");
    }
}
