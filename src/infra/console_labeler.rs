// ============================================================
// Layer 6 — Console Labeler (interactive annotation)
// ============================================================
// Asks a human for the names in one sentence at a time.
//
// The sentence is shown with numbered tokens and the labels
// the model already predicted, e.g.
//
//   [0]Mary [1]Jones [2]left [3]Acme [4]Corp [5].
//     PERSON        0-1  Mary Jones
//
// Commands, one per line:
//   p 0-1    tag tokens 0..=1 as PERSON
//            (p PERSON, o ORGANIZATION, g GPE, l LOCATION)
//   x 3      remove the label covering token 3
//   c        clear every label in the sentence
//   a / ⏎    accept the sentence as shown
//   q        accept and stop learning
//   ?        help
//
// End of input is treated like `q`.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::domain::document::{
    attributes, AnnotationId, Document, Span, NAME_TAG, TOKEN, TYPE_ATTR,
};
use crate::domain::traits::{LabelOutcome, Labeler};

const ENTITY_KEYS: [(&str, &str); 4] = [
    ("p", "PERSON"),
    ("o", "ORGANIZATION"),
    ("g", "GPE"),
    ("l", "LOCATION"),
];

const HELP: &str = "\
  p|o|g|l i[-j]  tag tokens i..=j as PERSON|ORGANIZATION|GPE|LOCATION
  x i            remove the label covering token i
  c              clear all labels in this sentence
  a or <enter>   accept
  q              accept and stop learning
  ?              this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tag(&'static str, usize, usize),
    Remove(usize),
    Clear,
    Accept,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Some(Command::Accept);
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return None;
    }

    match (head, arg) {
        ("a", None) => Some(Command::Accept),
        ("q", None) => Some(Command::Quit),
        ("c", None) => Some(Command::Clear),
        ("?", None) => Some(Command::Help),
        ("x", Some(i)) => i.parse().ok().map(Command::Remove),
        (key, Some(range)) => {
            let (_, kind) = ENTITY_KEYS.iter().find(|(k, _)| *k == key)?;
            let (first, last) = match range.split_once('-') {
                Some((i, j)) => (i.parse().ok()?, j.parse().ok()?),
                None => {
                    let i = range.parse().ok()?;
                    (i, i)
                }
            };
            (first <= last).then_some(Command::Tag(*kind, first, last))
        }
        _ => None,
    }
}

/// Terminal labeling surface over any line reader and writer.
pub struct ConsoleLabeler<R, W> {
    input:  R,
    output: W,
}

impl<R: BufRead + Send, W: Write + Send> ConsoleLabeler<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn show(&mut self, doc: &Document, tokens: &[Span], sentence: Span) -> Result<()> {
        let numbered: Vec<String> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| format!("[{i}]{}", doc.text_of(*t)))
            .collect();
        writeln!(self.output)?;
        writeln!(self.output, "{}", numbered.join(" "))?;

        for name in doc.annotations_within(NAME_TAG, sentence) {
            let covered: Vec<usize> = (0..tokens.len())
                .filter(|&i| tokens[i].within(&name.span))
                .collect();
            let range = match (covered.first(), covered.last()) {
                (Some(a), Some(b)) if a != b => format!("{a}-{b}"),
                (Some(a), _) => a.to_string(),
                _ => "?".to_string(),
            };
            writeln!(
                self.output,
                "  {:<13} {:<5} {}",
                name.get(TYPE_ATTR).unwrap_or("-"),
                range,
                doc.text_of(name.span)
            )?;
        }
        write!(self.output, "> ")?;
        self.output.flush()?;
        Ok(())
    }

    /// Apply one edit command; returns false if it could not be applied
    fn apply(&mut self, doc: &mut Document, tokens: &[Span], command: Command) -> bool {
        match command {
            Command::Tag(kind, first, last) => {
                let (Some(a), Some(b)) = (tokens.get(first), tokens.get(last)) else {
                    return false;
                };
                let span = Span::new(a.start, b.end);
                let overlapping: Vec<AnnotationId> = doc
                    .annotations_of_type(NAME_TAG)
                    .iter()
                    .filter(|n| n.span.start < span.end && span.start < n.span.end)
                    .map(|n| n.id)
                    .collect();
                for id in overlapping {
                    doc.remove_annotation(id);
                }
                doc.annotate(NAME_TAG, span, attributes([(TYPE_ATTR, kind)]));
                true
            }
            Command::Remove(i) => {
                let Some(token) = tokens.get(i) else {
                    return false;
                };
                let covering: Vec<AnnotationId> = doc
                    .annotations_of_type(NAME_TAG)
                    .iter()
                    .filter(|n| token.within(&n.span))
                    .map(|n| n.id)
                    .collect();
                for id in &covering {
                    doc.remove_annotation(*id);
                }
                !covering.is_empty()
            }
            Command::Clear => {
                if let (Some(a), Some(b)) = (tokens.first(), tokens.last()) {
                    doc.erase_inside(NAME_TAG, Span::new(a.start, b.end));
                }
                true
            }
            Command::Accept | Command::Quit | Command::Help => true,
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> Labeler for ConsoleLabeler<R, W> {
    fn label(&mut self, doc: &mut Document, sentence: Span) -> Result<LabelOutcome> {
        let tokens: Vec<Span> = doc
            .annotations_within(TOKEN, sentence)
            .iter()
            .map(|t| t.span)
            .collect();

        loop {
            self.show(doc, &tokens, sentence)?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("Cannot read from the annotator's terminal")?;
            if read == 0 {
                return Ok(LabelOutcome::Stop);
            }

            match parse_command(line.trim()) {
                Some(Command::Accept) => return Ok(LabelOutcome::Continue),
                Some(Command::Quit) => return Ok(LabelOutcome::Stop),
                Some(Command::Help) => writeln!(self.output, "{HELP}")?,
                Some(command) => {
                    if !self.apply(doc, &tokens, command) {
                        writeln!(self.output, "No such token or label, ? for help")?;
                    }
                }
                None => writeln!(self.output, "Unrecognised command, ? for help")?,
            }
        }
    }
}
