// ============================================================
// Layer 5 — Annotation Scorer
// ============================================================
// Compares two annotation layers of the same document, e.g.
// gold TRUENAMEX (key) against predicted ENAMEX (response):
//
//   matching tag       — same span in both layers
//   matching attribute — same span AND same attribute map
//
// Counts from several documents are summed before any ratio
// is taken, so a large document weighs more than a small one.

use std::collections::HashMap;
use std::ops::AddAssign;

use crate::domain::document::{Attributes, Document, Span};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub tags_in_key:      usize,
    pub tags_in_response: usize,
    pub matching_tags:    usize,
    pub matching_attrs:   usize,
}

impl MatchCounts {
    pub fn type_recall(&self) -> f64 {
        recall(self.matching_tags, self.tags_in_key)
    }

    pub fn type_precision(&self) -> f64 {
        precision(self.matching_tags, self.tags_in_response, self.tags_in_key)
    }

    pub fn attr_recall(&self) -> f64 {
        recall(self.matching_attrs, self.tags_in_key)
    }

    pub fn attr_precision(&self) -> f64 {
        precision(self.matching_attrs, self.tags_in_response, self.tags_in_key)
    }

    /// Every key tag found with the right attributes
    pub fn is_perfect(&self) -> bool {
        self.matching_attrs == self.tags_in_key
    }
}

impl AddAssign for MatchCounts {
    fn add_assign(&mut self, other: Self) {
        self.tags_in_key      += other.tags_in_key;
        self.tags_in_response += other.tags_in_response;
        self.matching_tags    += other.matching_tags;
        self.matching_attrs   += other.matching_attrs;
    }
}

/// Compare layer `response_kind` against layer `key_kind` in `doc`.
///
/// Each response annotation can match at most one key annotation.
pub fn compare(doc: &Document, key_kind: &str, response_kind: &str) -> MatchCounts {
    let keys      = doc.annotations_of_type(key_kind);
    let responses = doc.annotations_of_type(response_kind);

    let mut unmatched: HashMap<Span, Vec<&Attributes>> = HashMap::new();
    for r in &responses {
        unmatched.entry(r.span).or_default().push(&r.attributes);
    }

    let mut counts = MatchCounts {
        tags_in_key:      keys.len(),
        tags_in_response: responses.len(),
        ..MatchCounts::default()
    };

    for key in &keys {
        let Some(candidates) = unmatched.get_mut(&key.span) else {
            continue;
        };
        if candidates.is_empty() {
            continue;
        }
        counts.matching_tags += 1;
        let same = candidates.iter().position(|a| **a == key.attributes);
        match same {
            Some(i) => {
                counts.matching_attrs += 1;
                candidates.remove(i);
            }
            None => {
                candidates.remove(0);
            }
        }
    }

    counts
}

/// Vacuously perfect when there is nothing to find
fn recall(matching: usize, keys: usize) -> f64 {
    if keys == 0 {
        1.0
    } else {
        matching as f64 / keys as f64
    }
}

/// Perfect when both sides are empty, zero when only responses are missing
fn precision(matching: usize, responses: usize, keys: usize) -> f64 {
    match (responses, keys) {
        (0, 0) => 1.0,
        (0, _) => 0.0,
        _ => matching as f64 / responses as f64,
    }
}
