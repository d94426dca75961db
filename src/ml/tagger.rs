// ============================================================
// Layer 5 — Lexicon Tagger
// ============================================================
// A small count-based name tagger implementing SequenceTagger.
//
// Labels follow the BIO scheme:
//   O          outside any name
//   B-PERSON   first token of a PERSON name
//   I-PERSON   later token of the same name
//
// For each token we estimate P(label | token) by backing off
// from the word form to its shape to the label prior:
//
//   prior(l) = (n(l) + 1) / (N + L)
//   shape(l) = (n(s, l) + α·prior(l)) / (n(s) + α)
//   word(l)  = (n(w, l) + α·shape(l)) / (n(w) + α)
//
// where the shape of "McDonald" is "XxXx", of "1990" is "d".
//
// Decoding picks each token's best label independently. The
// best labeling of a sentence has probability P1 = Π p_best;
// the second best differs from it in exactly one token, so
//
//   P2     = P1 · max_i (p_second(i) / p_best(i))
//   margin = P1 − P2
//
// Training evidence is collected in `pending` and only copied
// into the decoding tables by compute_probabilities().
//
// Within one document, an unseen word that was already tagged
// as a name earlier in the document leans towards that type.
// new_document() clears that memory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;

use crate::domain::document::{
    attributes, AnnotationId, Document, Span, NAME_TAG, TOKEN, TYPE_ATTR,
};
use crate::domain::traits::{Persistable, SequenceTagger};

const OUTSIDE: &str = "O";

/// Back-off weight α
const SMOOTHING: f64 = 1.0;

/// Pseudo-count given to a type remembered from earlier in the document
const DOCUMENT_MEMORY_WEIGHT: f64 = 1.0;

/// Entity type used when a gold name has no TYPE attribute
const UNTYPED: &str = "NAME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LabelCounts {
    /// "w:<word>" / "s:<shape>" → label → count
    by_feature: HashMap<String, BTreeMap<String, u32>>,
    /// label → number of training tokens carrying it
    by_label:   BTreeMap<String, u32>,
}

impl LabelCounts {
    fn add_token(&mut self, word: &str, label: &str) {
        for feature in [word_feature(word), shape_feature(word)] {
            *self
                .by_feature
                .entry(feature)
                .or_default()
                .entry(label.to_string())
                .or_default() += 1;
        }
        *self.by_label.entry(label.to_string()).or_default() += 1;
    }

    fn feature(&self, key: &str) -> Option<&BTreeMap<String, u32>> {
        self.by_feature.get(key)
    }

    fn total(&self) -> u32 {
        self.by_label.values().sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconTagger {
    /// Evidence gathered by train_on_span
    pending: LabelCounts,

    /// Decoding tables as of the last compute_probabilities()
    #[serde(skip)]
    model: LabelCounts,

    #[serde(skip)]
    record_margin: bool,

    #[serde(skip)]
    last_margin: f64,

    /// word → entity type tagged earlier in the current document
    #[serde(skip)]
    document_memory: HashMap<String, String>,
}

impl LexiconTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of training tokens seen so far (including pending evidence)
    pub fn tokens_trained(&self) -> u32 {
        self.pending.total()
    }

    /// Labels the decoder can currently emit, always including O
    fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.model.by_label.keys().cloned().collect();
        if !self.model.by_label.contains_key(OUTSIDE) {
            labels.push(OUTSIDE.to_string());
        }
        labels
    }

    /// P(label | word), sorted best first (ties by label name)
    fn distribution(&self, labels: &[String], word: &str) -> Vec<(String, f64)> {
        let n_labels = labels.len() as f64;
        let total    = self.model.total() as f64;

        let prior = |l: &str| {
            let n = self.model.by_label.get(l).copied().unwrap_or(0) as f64;
            (n + 1.0) / (total + n_labels)
        };

        let backoff = |counts: Option<&BTreeMap<String, u32>>, l: &str, lower: f64| {
            let (n_fl, n_f) = counts.map_or((0.0, 0.0), |c| {
                (
                    c.get(l).copied().unwrap_or(0) as f64,
                    c.values().sum::<u32>() as f64,
                )
            });
            (n_fl + SMOOTHING * lower) / (n_f + SMOOTHING)
        };

        let shape_counts = self.model.feature(&shape_feature(word));
        let word_counts  = self.model.feature(&word_feature(word));
        let remembered   = match word_counts {
            None => self.document_memory.get(word).map(|t| format!("B-{t}")),
            Some(_) => None,
        };

        let mut dist: Vec<(String, f64)> = labels
            .iter()
            .map(|l| {
                let shape = backoff(shape_counts, l, prior(l));
                let mut p = backoff(word_counts, l, shape);
                if let Some(r) = &remembered {
                    let bonus = if r == l { DOCUMENT_MEMORY_WEIGHT } else { 0.0 };
                    p = (p + bonus) / (1.0 + DOCUMENT_MEMORY_WEIGHT);
                }
                (l.clone(), p)
            })
            .collect();

        dist.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        dist
    }
}

impl SequenceTagger for LexiconTagger {
    fn new_document(&mut self) {
        self.document_memory.clear();
    }

    fn train_on_span(&mut self, doc: &Document, span: Span) -> Result<()> {
        let names: Vec<(AnnotationId, Span, String)> = doc
            .annotations_of_type(NAME_TAG)
            .iter()
            .map(|a| {
                let kind = a.get(TYPE_ATTR).unwrap_or(UNTYPED).to_string();
                (a.id, a.span, kind)
            })
            .collect();

        let mut previous_name: Option<AnnotationId> = None;
        for token in doc.annotations_within(TOKEN, span) {
            let word = doc.text_of(token.span);
            let name = names.iter().find(|(_, s, _)| token.span.within(s));
            let label = match name {
                Some((id, _, kind)) if previous_name == Some(*id) => format!("I-{kind}"),
                Some((_, _, kind)) => format!("B-{kind}"),
                None => OUTSIDE.to_string(),
            };
            previous_name = name.map(|(id, _, _)| *id);
            self.pending.add_token(word, &label);
        }
        Ok(())
    }

    fn annotate_span(&mut self, doc: &mut Document, span: Span) -> Result<()> {
        let labels = self.labels();
        let tokens: Vec<(Span, String)> = doc
            .annotations_within(TOKEN, span)
            .iter()
            .map(|t| (t.span, doc.text_of(t.span).to_string()))
            .collect();

        let mut best_path   = 1.0f64;
        let mut best_ratio  = 0.0f64;
        let mut decoded: Vec<(Span, String)> = Vec::with_capacity(tokens.len());

        for (token, word) in &tokens {
            let dist = self.distribution(&labels, word);
            let (label, p1) = dist[0].clone();
            let p2 = dist.get(1).map_or(0.0, |(_, p)| *p);
            best_path *= p1;
            if p1 > 0.0 {
                best_ratio = best_ratio.max(p2 / p1);
            }
            decoded.push((*token, label));
        }

        if self.record_margin {
            self.last_margin = best_path * (1.0 - best_ratio);
        }

        // Merge B/I runs of the same type into name annotations
        let mut open: Option<(String, Span)> = None;
        let mut names: Vec<(String, Span)> = Vec::new();
        for ((token, label), (_, word)) in decoded.iter().zip(&tokens) {
            let entity = label
                .strip_prefix("B-")
                .map(|t| (t, true))
                .or_else(|| label.strip_prefix("I-").map(|t| (t, false)));
            match entity {
                Some((kind, begins)) => {
                    let continues = !begins && open.as_ref().is_some_and(|(k, _)| k == kind);
                    if continues {
                        if let Some((_, s)) = open.as_mut() {
                            s.end = token.end;
                        }
                    } else {
                        names.extend(open.take());
                        open = Some((kind.to_string(), *token));
                    }
                    self.document_memory.insert(word.clone(), kind.to_string());
                }
                None => names.extend(open.take()),
            }
        }
        names.extend(open.take());

        for (kind, s) in names {
            doc.annotate(NAME_TAG, s, attributes([(TYPE_ATTR, kind.as_str())]));
        }
        Ok(())
    }

    fn margin(&self) -> f64 {
        self.last_margin
    }

    fn record_margin(&mut self) {
        self.record_margin = true;
    }

    fn compute_probabilities(&mut self) {
        self.model = self.pending.clone();
        tracing::debug!(
            "Tagger tables rebuilt: {} tokens, {} labels",
            self.model.total(),
            self.model.by_label.len()
        );
    }
}

impl Persistable for LexiconTagger {
    fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json).with_context(|| format!("Cannot write tagger to '{path}'"))?;
        tracing::debug!("Saved tagger to '{}'", path);
        Ok(())
    }

    fn load(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| {
            format!("Cannot read tagger from '{path}'. Have you run 'learn' first?")
        })?;
        let mut tagger: LexiconTagger = serde_json::from_str(&json)?;
        tagger.compute_probabilities();
        Ok(tagger)
    }
}

fn word_feature(word: &str) -> String {
    format!("w:{word}")
}

fn shape_feature(word: &str) -> String {
    format!("s:{}", shape(word))
}

/// Character classes with repeats collapsed: "McDonald" → "XxXx"
fn shape(word: &str) -> String {
    let mut out = String::new();
    for c in word.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };
        if !out.ends_with(class) {
            out.push(class);
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::segmenter::Segmenter;
    use crate::domain::document::SENTENCE;

    fn segmented(text: &str) -> Document {
        let mut doc = Document::new("t", text);
        Segmenter::new().segment(&mut doc);
        doc
    }

    fn whole(doc: &Document) -> Span {
        doc.annotations_of_type(SENTENCE)[0].span
    }

    fn trained() -> LexiconTagger {
        let mut doc = segmented("John Smith works at IBM .");
        doc.annotate(NAME_TAG, Span::new(0, 10), attributes([(TYPE_ATTR, "PERSON")]));
        doc.annotate(NAME_TAG, Span::new(20, 23), attributes([(TYPE_ATTR, "ORGANIZATION")]));
        let mut tagger = LexiconTagger::new();
        tagger.record_margin();
        tagger.train_on_span(&doc, whole(&doc)).unwrap();
        tagger.compute_probabilities();
        tagger
    }

    fn names(doc: &Document) -> Vec<(String, String)> {
        doc.annotations_of_type(NAME_TAG)
            .iter()
            .map(|a| {
                (doc.text_of(a.span).to_string(), a.get(TYPE_ATTR).unwrap().to_string())
            })
            .collect()
    }

    #[test]
    fn test_shape() {
        assert_eq!(shape("McDonald"), "XxXx");
        assert_eq!(shape("1990"), "d");
        assert_eq!(shape("IBM"), "X");
    }

    #[test]
    fn test_tags_known_names() {
        let mut tagger = trained();
        let mut doc    = segmented("John left IBM .");
        let span       = whole(&doc);
        tagger.new_document();
        tagger.annotate_span(&mut doc, span).unwrap();
        assert_eq!(
            names(&doc),
            vec![
                ("John".to_string(), "PERSON".to_string()),
                ("IBM".to_string(), "ORGANIZATION".to_string()),
            ]
        );
    }

    #[test]
    fn test_multi_token_name_is_merged() {
        let mut tagger = trained();
        let mut doc    = segmented("John Smith works .");
        let span       = whole(&doc);
        tagger.annotate_span(&mut doc, span).unwrap();
        assert_eq!(names(&doc)[0].0, "John Smith");
    }

    #[test]
    fn test_training_is_invisible_until_probabilities_recomputed() {
        let mut gold = segmented("Paris is big .");
        gold.annotate(NAME_TAG, Span::new(0, 5), attributes([(TYPE_ATTR, "GPE")]));

        let mut tagger = LexiconTagger::new();
        tagger.train_on_span(&gold, whole(&gold)).unwrap();

        let mut doc  = segmented("Paris is big .");
        let span     = whole(&doc);
        tagger.annotate_span(&mut doc, span).unwrap();
        assert!(names(&doc).is_empty());

        tagger.compute_probabilities();
        tagger.annotate_span(&mut doc, span).unwrap();
        assert_eq!(names(&doc), vec![("Paris".to_string(), "GPE".to_string())]);
    }

    #[test]
    fn test_untrained_tagger_is_certain() {
        let mut tagger = LexiconTagger::new();
        tagger.record_margin();
        tagger.compute_probabilities();
        let mut doc = segmented("Nothing known here .");
        let span    = whole(&doc);
        tagger.annotate_span(&mut doc, span).unwrap();
        assert!((tagger.margin() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_words_have_smaller_margin() {
        let mut tagger = trained();

        let mut seen = segmented("John works .");
        let span     = whole(&seen);
        tagger.annotate_span(&mut seen, span).unwrap();
        let seen_margin = tagger.margin();

        let mut unseen = segmented("Zorblax Quuxington .");
        let span       = whole(&unseen);
        tagger.annotate_span(&mut unseen, span).unwrap();
        let unseen_margin = tagger.margin();

        assert!(unseen_margin < seen_margin);
        assert!(unseen_margin >= 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("tagger.json");
        let path   = path.to_str().unwrap();
        let tagger = trained();
        tagger.save(path).unwrap();

        let mut loaded = LexiconTagger::load(path).unwrap();
        assert_eq!(loaded.tokens_trained(), 6);
        let mut doc = segmented("IBM .");
        let span    = whole(&doc);
        loaded.annotate_span(&mut doc, span).unwrap();
        assert_eq!(names(&doc)[0].1, "ORGANIZATION");
    }
}
