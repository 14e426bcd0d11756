//! Paragraph accumulation and greedy fill.

use std::{borrow::Cow, iter};

use textwrap::{Options, WordSeparator, WordSplitter, WrapAlgorithm};

/// How an input line ends its output line, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Break {
    None,
    /// Two trailing spaces; re-emitted after the wrapped segment.
    Spaces,
    /// Odd trailing backslash or `<br>`, kept in the text.
    Marker,
}

/// Split Markdown hard-break syntax off the end of `line`.
///
/// The returned text has surrounding whitespace removed.
pub(crate) fn hard_break(line: &str) -> (&str, Break) {
    let trimmed = line.trim_end();
    let text = trimmed.trim_start();
    if text.is_empty() {
        return (text, Break::None);
    }
    if line.ends_with("  ") {
        return (text, Break::Spaces);
    }
    let backslashes = text.bytes().rev().take_while(|&b| b == b'\\').count();
    let lower = text.to_ascii_lowercase();
    let html_br = ["<br>", "<br/>", "<br />"]
        .iter()
        .any(|tag| lower.ends_with(tag));
    if backslashes % 2 == 1 || html_br {
        (text, Break::Marker)
    } else {
        (text, Break::None)
    }
}

/// Lines collected for one output paragraph.
#[derive(Debug, Clone)]
pub(crate) struct Paragraph {
    first_prefix: String,
    cont_prefix: String,
    lines: Vec<(String, Break)>,
}

impl Paragraph {
    pub(crate) fn new(first_prefix: String, cont_prefix: String) -> Self {
        Self {
            first_prefix,
            cont_prefix,
            lines: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, text: &str, brk: Break) {
        self.lines.push((text.to_string(), brk));
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn set_cont_prefix(&mut self, prefix: String) {
        self.cont_prefix = prefix;
    }

    /// The whole paragraph on one line, for Setext header text.
    pub(crate) fn unwrapped(&self) -> String {
        let words: Vec<&str> = self.lines.iter().map(|(text, _)| text.as_str()).collect();
        format!("{}{}", self.first_prefix, words.join(" "))
            .trim_end()
            .to_string()
    }

    /// Fill the paragraph to `width` columns.
    ///
    /// Hard breaks split the paragraph into segments that are filled
    /// separately; every segment after the first starts at the continuation
    /// prefix. With `markdown` set, no output line starts with a word that
    /// would open a new block.
    pub(crate) fn fill(&self, width: usize, keep_spaces: bool, markdown: bool) -> Vec<String> {
        let mut out = Vec::new();
        let mut segment = String::new();
        let last = self.lines.len().saturating_sub(1);
        for (idx, (text, brk)) in self.lines.iter().enumerate() {
            if !text.is_empty() {
                if !segment.is_empty() {
                    segment.push(' ');
                }
                if keep_spaces {
                    segment.push_str(text);
                } else {
                    segment.push_str(&collapse_spaces(text));
                }
            }
            if *brk == Break::None && idx != last {
                continue;
            }
            let first = if out.is_empty() {
                &self.first_prefix
            } else {
                &self.cont_prefix
            };
            let text = if markdown {
                glue_openers(&segment)
            } else {
                Cow::Borrowed(segment.as_str())
            };
            let mut lines = fill_segment(first, &self.cont_prefix, &text, width);
            if *brk == Break::Spaces
                && let Some(line) = lines.last_mut()
            {
                line.push_str("  ");
            }
            out.extend(lines);
            segment.clear();
        }
        out
    }
}

fn collapse_spaces(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stands in for the spaces before a word that must not start a line.
/// `AsciiSpace` never breaks on it and it is one column wide.
const GLUE: char = '\u{e000}';

/// `word` would open a Markdown block if a line began with it: an ATX
/// header run, a bullet or ordinal, a rule or setext underline, a fence,
/// an HTML tag, or a footnote, link or abbreviation label.
pub(crate) fn opens_block(word: &str) -> bool {
    let bytes = word.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    match first {
        b'#' | b'=' | b'-' | b'_' | b'*' | b'+' | b':' => {
            bytes.iter().all(|&b| b == first) || word.starts_with("*[")
        }
        b'`' | b'~' => bytes.len() >= 3 && bytes[..3].iter().all(|&b| b == first),
        b'<' => true,
        b'[' => word.contains("]:"),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            digits <= 9 && digits + 1 == bytes.len() && matches!(bytes[digits], b'.' | b')')
        }
        _ => false,
    }
}

/// Join every block-opening word to the word before it with [`GLUE`].
fn glue_openers(text: &str) -> Cow<'_, str> {
    if text.contains(GLUE) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut seen_word = false;
    let mut run = 0;
    for (idx, word) in text.split(' ').enumerate() {
        if idx > 0 {
            run += 1;
        }
        if word.is_empty() {
            continue;
        }
        let sep = if seen_word && opens_block(word) { GLUE } else { ' ' };
        out.extend(iter::repeat_n(sep, run));
        out.push_str(word);
        run = 0;
        seen_word = true;
    }
    out.extend(iter::repeat_n(' ', run));
    Cow::Owned(out)
}

/// Greedy first-fit fill of one segment.
///
/// Words are never split; a word wider than the line sits alone.
pub(crate) fn fill_segment(first: &str, cont: &str, text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![first.trim_end().to_string()];
    }
    let options = Options::new(width.max(1))
        .initial_indent(first)
        .subsequent_indent(cont)
        .break_words(false)
        .word_separator(WordSeparator::AsciiSpace)
        .word_splitter(WordSplitter::NoHyphenation)
        .wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(text, &options)
        .into_iter()
        .map(|line| line.trim_end().replace(GLUE, " "))
        .collect()
}
