// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw corpus text before SGML tags are parsed, so
// that every annotation offset refers to the cleaned text.
//
// The segmenter relies on two things from this pass:
//   - a line break is exactly one '\n', whatever the file's
//     line-ending convention, so only a real blank line reads
//     as "\n\n" (a hard sentence boundary)
//   - a line holding nothing but whitespace is empty, so it
//     counts as a blank line too
//
// Steps:
//   1. CRLF and lone CR → '\n'
//   2. Invisible or control characters → ' ' (one for one,
//      so a tag's text never gains or loses a character)
//   3. Trailing whitespace dropped from every line
//   4. Leading/trailing whitespace dropped from the document
//
// Runs of spaces inside a line are left alone: the token
// pattern skips any amount of whitespace, and markup such as
// `<ENAMEX  TYPE="GPE">` parses either way.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut out = String::with_capacity(unified.len());
        for (i, line) in unified.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let visible: String = line.chars().map(visible_char).collect();
            out.push_str(visible.trim_end());
        }

        out.trim().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Map characters the tokenizer cannot see (or must not see) to a space
fn visible_char(c: char) -> char {
    match c {
        // no-break spaces, zero-width space, byte-order mark
        '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{200B}' | '\u{FEFF}' => ' ',
        c if c.is_control() => ' ',
        c => c,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_sgml;
    use crate::data::segmenter::Segmenter;
    use crate::domain::document::{NAME_TAG, SENTENCE};

    #[test]
    fn test_crlf_is_a_single_line_break() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("one\r\ntwo"), "one\ntwo");
        assert_eq!(p.clean("one.\r\n\r\ntwo."), "one.\n\ntwo.");
        assert_eq!(p.clean("old\rmac"), "old\nmac");
    }

    #[test]
    fn test_wrapped_name_stays_in_one_sentence() {
        let raw = "<TEXT>Yesterday <ENAMEX TYPE=\"PERSON\">John\r\nSmith</ENAMEX> met the press.</TEXT>";
        let mut doc = parse_sgml("wrap.sgm", &Preprocessor::new().clean(raw));
        Segmenter::new().segment(&mut doc);

        let sentences = doc.annotations_of_type(SENTENCE);
        assert_eq!(sentences.len(), 1);
        assert_eq!(doc.text_of(sentences[0].span), "Yesterday John\nSmith met the press.");
        assert_eq!(doc.annotations_of_type(NAME_TAG).len(), 1);
    }

    #[test]
    fn test_whitespace_only_line_becomes_blank() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("one\n \t \ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_invisible_chars_keep_length() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("a\u{00A0}b\u{200B}c\x01d\te"), "a b c d e");
    }

    #[test]
    fn test_inner_spacing_and_markup_untouched() {
        let p   = Preprocessor::new();
        let raw = "<ENAMEX  TYPE=\"PERSON\">John</ENAMEX>   ran";
        assert_eq!(p.clean(raw), raw);
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(Preprocessor::new().clean(""), "");
    }
}
