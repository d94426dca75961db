// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A document is a text buffer plus a set of typed annotations.
// Each annotation covers a byte span of the text and carries
// an attribute map, e.g.
//
//   ENAMEX  [0, 10)  { TYPE: "PERSON" }
//   sentence [0, 42) { training: "true" }
//
// Annotations are addressed by a stable AnnotationId so that
// removal never depends on value equality.
//
// Reference: Rust Book §5 (Structs and Methods)
//            Rust Book §8 (Collections)

use std::collections::BTreeMap;

/// Annotation kind of a sentence produced by segmentation
pub const SENTENCE: &str = "sentence";

/// Annotation kind of a single token inside a sentence
pub const TOKEN: &str = "token";

/// Annotation kind marking the text body of a document
pub const TEXT: &str = "TEXT";

/// Model-visible name labels (written by the tagger and by labeling)
pub const NAME_TAG: &str = "ENAMEX";

/// Gold name labels, hidden from the model outside the seed set
pub const GOLD_NAME_TAG: &str = "TRUENAMEX";

/// Attribute holding the entity type of a name label
pub const TYPE_ATTR: &str = "TYPE";

/// Sentence attribute set once the sentence contributed a true label
pub const TRAINING_ATTR: &str = "training";

pub type AnnotationId = u64;

pub type Attributes = BTreeMap<String, String>;

/// Half-open byte range `[start, end)` into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end:   usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if this span lies entirely inside `outer`
    pub fn within(&self, outer: &Span) -> bool {
        self.start >= outer.start && self.end <= outer.end
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id:         AnnotationId,
    pub kind:       String,
    pub span:       Span,
    pub attributes: Attributes,
}

impl Annotation {
    /// Look up an attribute value by name
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// True for a sentence that has already contributed a true label
    pub fn is_training(&self) -> bool {
        self.get(TRAINING_ATTR).is_some()
    }
}

/// A text buffer with its annotations.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The filename the document was loaded from
    source:      String,
    text:        String,
    annotations: Vec<Annotation>,
    next_id:     AnnotationId,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source:      source.into(),
            text:        text.into(),
            annotations: Vec::new(),
            next_id:     0,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text covered by `span`, or "" if the span is out of range
    pub fn text_of(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// Add an annotation and return its id
    pub fn annotate(
        &mut self,
        kind:       impl Into<String>,
        span:       Span,
        attributes: Attributes,
    ) -> AnnotationId {
        let id = self.next_id;
        self.next_id += 1;
        self.annotations.push(Annotation {
            id,
            kind: kind.into(),
            span,
            attributes,
        });
        id
    }

    /// All annotations of `kind`, ordered by start offset.
    /// Annotations sharing a start keep their insertion order.
    pub fn annotations_of_type(&self, kind: &str) -> Vec<&Annotation> {
        let mut found: Vec<&Annotation> = self
            .annotations
            .iter()
            .filter(|a| a.kind == kind)
            .collect();
        found.sort_by_key(|a| a.span.start);
        found
    }

    /// Annotations of `kind` lying entirely inside `span`
    pub fn annotations_within(&self, kind: &str, span: Span) -> Vec<&Annotation> {
        self.annotations_of_type(kind)
            .into_iter()
            .filter(|a| a.span.within(&span))
            .collect()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }

    /// Set an attribute on an existing annotation.
    /// Returns false if no annotation has this id.
    pub fn set_attribute(&mut self, id: AnnotationId, key: &str, value: &str) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.attributes.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Mark a sentence as training data. Setting it twice is a no-op.
    pub fn mark_training(&mut self, sentence: AnnotationId) -> bool {
        self.set_attribute(sentence, TRAINING_ATTR, "true")
    }

    /// Remove every annotation of `kind` lying inside `span`.
    /// Returns how many were removed.
    pub fn erase_inside(&mut self, kind: &str, span: Span) -> usize {
        let before = self.annotations.len();
        self.annotations
            .retain(|a| !(a.kind == kind && a.span.within(&span)));
        before - self.annotations.len()
    }

    /// Copy every `from` annotation starting inside `span` to kind `to`,
    /// keeping span and attributes. Returns how many were copied.
    pub fn copy_inside(&mut self, from: &str, to: &str, span: Span) -> usize {
        let copies: Vec<(Span, Attributes)> = self
            .annotations
            .iter()
            .filter(|a| a.kind == from && span.contains(a.span.start))
            .map(|a| (a.span, a.attributes.clone()))
            .collect();
        let copied = copies.len();
        for (s, attrs) in copies {
            self.annotate(to, s, attrs);
        }
        copied
    }
}

/// Build an attribute map from `(key, value)` pairs
pub fn attributes<const N: usize>(pairs: [(&str, &str); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
