// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads SGML-tagged text files from a directory.
//
// The corpus format is plain text with inline markup:
//
//   <DOC><TEXT>
//   <ENAMEX TYPE="PERSON">John Smith</ENAMEX> joined
//   <ENAMEX TYPE="ORGANIZATION">IBM</ENAMEX> in 1990.
//   </TEXT></DOC>
//
// Tags are stripped from the text and each element becomes an
// annotation whose kind is the upper-cased tag name, whose
// span covers the enclosed plain text and whose attributes are
// the tag's key="value" pairs.
//
// Files are read in file-name order so the seed / pool /
// held-out split is reproducible.

use anyhow::{Context, Result};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::document::{Attributes, Document, Span};
use crate::domain::traits::DocumentSource;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9_]*)([^>]*)>").unwrap());

static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"([^"]*)""#).unwrap());

const EXTENSIONS: [&str; 3] = ["sgm", "sgml", "txt"];

/// Loads all SGML-tagged files from a given directory.
pub struct SgmlLoader {
    dir: String,
}

impl SgmlLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for SgmlLoader {
    fn load_all(&self) -> Result<Vec<Document>> {
        let dir = Path::new(&self.dir);

        if !dir.exists() {
            tracing::warn!(
                "Corpus directory '{}' does not exist, returning empty corpus",
                self.dir
            );
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
        {
            let path = entry?.path();
            let wanted = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            if wanted {
                paths.push(path);
            }
        }
        paths.sort();

        let preprocessor = Preprocessor::new();
        let mut docs     = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            let doc = parse_sgml(source, &preprocessor.clean(&raw));
            tracing::debug!("Loaded: {} ({} chars)", doc.source(), doc.text().len());
            docs.push(doc);
        }

        tracing::info!("Successfully loaded {} documents", docs.len());
        Ok(docs)
    }
}

/// Strip inline markup from `raw` and turn each element into an annotation.
pub fn parse_sgml(source: impl Into<String>, raw: &str) -> Document {
    let source = source.into();
    let mut text = String::with_capacity(raw.len());
    let mut open: Vec<(String, usize, Attributes)> = Vec::new();
    let mut closed: Vec<(String, Span, Attributes)> = Vec::new();
    let mut last = 0usize;

    for cap in TAG_RE.captures_iter(raw) {
        let whole = cap.get(0).map_or(0..0, |m| m.range());
        text.push_str(&decode_entities(&raw[last..whole.start]));
        last = whole.end;

        let name = cap[2].to_ascii_uppercase();
        let rest = &cap[3];

        if &cap[1] == "/" {
            match open.iter().rposition(|(n, _, _)| *n == name) {
                Some(i) => {
                    let (kind, start, attrs) = open.remove(i);
                    closed.push((kind, Span::new(start, text.len()), attrs));
                }
                None => tracing::warn!("{}: unbalanced </{}> skipped", source, name),
            }
        } else if !rest.trim_end().ends_with('/') {
            open.push((name, text.len(), parse_attributes(rest)));
        }
    }
    text.push_str(&decode_entities(&raw[last..]));

    if !open.is_empty() {
        tracing::warn!("{}: {} unclosed tag(s) ignored", source, open.len());
    }

    let mut doc = Document::new(source, text);
    for (kind, span, attrs) in closed {
        doc.annotate(kind, span, attrs);
    }
    doc
}

fn parse_attributes(s: &str) -> Attributes {
    ATTR_RE
        .captures_iter(s)
        .map(|c| (c[1].to_ascii_uppercase(), c[2].to_string()))
        .collect()
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{NAME_TAG, TEXT, TYPE_ATTR};

    #[test]
    fn test_tags_become_annotations() {
        let doc = parse_sgml(
            "a.sgm",
            r#"<DOC><TEXT><ENAMEX TYPE="PERSON">John Smith</ENAMEX> joined <enamex type="ORGANIZATION">IBM</enamex>.</TEXT></DOC>"#,
        );
        assert_eq!(doc.text(), "John Smith joined IBM.");

        let names = doc.annotations_of_type(NAME_TAG);
        assert_eq!(names.len(), 2);
        assert_eq!(doc.text_of(names[0].span), "John Smith");
        assert_eq!(names[1].get(TYPE_ATTR), Some("ORGANIZATION"));

        let body = doc.annotations_of_type(TEXT);
        assert_eq!(body[0].span, Span::new(0, doc.text().len()));
    }

    #[test]
    fn test_unbalanced_close_is_skipped() {
        let doc = parse_sgml("b.sgm", "Hello</ENAMEX> world");
        assert_eq!(doc.text(), "Hello world");
        assert!(doc.annotations_of_type(NAME_TAG).is_empty());
    }

    #[test]
    fn test_entities_decoded_before_offsets() {
        let doc = parse_sgml("c.sgm", r#"AT&amp;T and <ENAMEX TYPE="GPE">Ohio</ENAMEX>"#);
        assert_eq!(doc.text(), "AT&T and Ohio");
        let names = doc.annotations_of_type(NAME_TAG);
        assert_eq!(doc.text_of(names[0].span), "Ohio");
    }

    #[test]
    fn test_loads_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.sgm"), "second").unwrap();
        fs::write(dir.path().join("a.sgm"), "first").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let docs = SgmlLoader::new(dir.path().to_str().unwrap()).load_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source(), "a.sgm");
        assert_eq!(docs[1].text(), "second");
    }

    #[test]
    fn test_missing_directory_is_empty_corpus() {
        let docs = SgmlLoader::new("/definitely/not/here").load_all().unwrap();
        assert!(docs.is_empty());
    }
}
