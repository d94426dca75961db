// ============================================================
// Layer 4 — Sentence Segmenter and Tokenizer
// ============================================================
// Splits the text body of a document into sentences and each
// sentence into tokens, recording both as annotations:
//
//   sentence [0, 23)
//     token [0, 4)   "John"
//     token [5, 10)  "Smith"
//     ...
//
// Sentences are the unit of active learning; tokens are the
// unit the tagger labels.
//
// A sentence ends at '.', '!' or '?' when the next token starts
// with an upper-case letter, a digit or a quote, or when the
// text ends. A period directly after a known abbreviation never
// ends a sentence. A blank line always does.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::document::{Attributes, Document, Span, SENTENCE, TEXT, TOKEN};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['\-.&][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]").unwrap()
});

const ABBREVIATIONS: [&str; 11] = [
    "Mr", "Mrs", "Ms", "Dr", "Jr", "Sr", "St", "Inc", "Corp", "Co", "Ltd",
];

pub struct Segmenter;

impl Segmenter {
    pub fn new() -> Self {
        Self
    }

    /// Add sentence and token annotations to `doc`.
    /// Documents that already have sentences are left alone.
    /// Returns the number of sentences added.
    pub fn segment(&self, doc: &mut Document) -> usize {
        if !doc.annotations_of_type(SENTENCE).is_empty() {
            return 0;
        }

        let mut bodies: Vec<Span> = doc
            .annotations_of_type(TEXT)
            .iter()
            .map(|a| a.span)
            .collect();
        if bodies.is_empty() {
            bodies.push(Span::new(0, doc.text().len()));
        }

        let mut added = 0;
        for body in bodies {
            for sentence in self.split(doc.text(), body) {
                doc.annotate(SENTENCE, sentence.span, Attributes::new());
                for token in sentence.tokens {
                    doc.annotate(TOKEN, token, Attributes::new());
                }
                added += 1;
            }
        }
        added
    }

    /// Split `body` of `text` into sentences with their token spans
    fn split(&self, text: &str, body: Span) -> Vec<SentenceSpans> {
        let Some(slice) = text.get(body.start..body.end) else {
            return Vec::new();
        };

        let tokens: Vec<Span> = TOKEN_RE
            .find_iter(slice)
            .map(|m| Span::new(body.start + m.start(), body.start + m.end()))
            .collect();

        let mut sentences = Vec::new();
        let mut current: Vec<Span> = Vec::new();

        for (i, &token) in tokens.iter().enumerate() {
            current.push(token);

            let next = tokens.get(i + 1);
            let ends = match next {
                None => true,
                Some(&next) => {
                    let gap = &text[token.end..next.start];
                    gap.contains("\n\n") || ends_sentence(text, &current, next)
                }
            };

            if ends {
                let span = Span::new(current[0].start, token.end);
                sentences.push(SentenceSpans {
                    span,
                    tokens: std::mem::take(&mut current),
                });
            }
        }
        sentences
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

struct SentenceSpans {
    span:   Span,
    tokens: Vec<Span>,
}

/// Does the last token of `current` close the sentence, given the next token?
fn ends_sentence(text: &str, current: &[Span], next: Span) -> bool {
    let Some(&last) = current.last() else {
        return false;
    };
    let last_text = &text[last.start..last.end];
    if !matches!(last_text, "." | "!" | "?") {
        return false;
    }

    if last_text == "." && current.len() >= 2 {
        let prev = current[current.len() - 2];
        if prev.end == last.start && ABBREVIATIONS.contains(&&text[prev.start..prev.end]) {
            return false;
        }
    }

    text[next.start..next.end]
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || c == '"' || c == '\'')
}
