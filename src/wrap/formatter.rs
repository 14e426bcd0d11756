//! Streaming formatter behind [`super::wrap_lines`] and [`super::wrap_stream`].

use log::debug;

use super::{
    WrapOptions,
    paragraph::{Break, Paragraph, hard_break},
};
use crate::{
    line::{MARKDOWN_TAB_STOP, display_width, indent_width, is_blank},
    markdown::{BlockState, Classifier, LineKind},
};

fn spaces(n: usize) -> String {
    " ".repeat(n)
}

/// Leading whitespace expanded to spaces, trailing whitespace removed.
fn normalize_indent(line: &str) -> String {
    let (indent, start) = indent_width(line, MARKDOWN_TAB_STOP);
    format!("{}{}", spaces(indent), line[start..].trim_end())
}

/// List marker (`-`, `12.`) or footnote label (`[^id]:`) at the start of
/// `body`.
fn item_marker(body: &str, kind: LineKind) -> &str {
    if kind == LineKind::FootnoteDef {
        body.find("]:").map_or(body, |idx| &body[..idx + 2])
    } else {
        body.find([' ', '\t']).map_or(body, |idx| &body[..idx])
    }
}

/// Line-at-a-time reflow engine.
///
/// Completed output accumulates internally until [`Formatter::drain`] is
/// called. A paragraph is only emitted once a line arrives that cannot
/// continue it, so output lags input by at most one paragraph.
#[derive(Debug)]
pub struct Formatter {
    options: WrapOptions,
    classifier: Classifier,
    out: Vec<String>,
    paragraph: Option<Paragraph>,
    /// Kind and `seq` of the Markdown block that owns the open paragraph.
    owner: Option<(LineKind, u64)>,
    /// The open plain paragraph hangs under a bullet.
    bullet: bool,
    blank_run: usize,
}

impl Formatter {
    #[must_use]
    pub fn new(options: WrapOptions) -> Self {
        Self {
            options,
            classifier: Classifier::new(),
            out: Vec::new(),
            paragraph: None,
            owner: None,
            bullet: false,
            blank_run: 0,
        }
    }

    /// Feed one input line without its line terminator.
    pub fn push_line(&mut self, line: &str) {
        if self.options.markdown {
            self.push_markdown(line);
        } else {
            self.push_plain(line);
        }
    }

    /// Flush the open paragraph and any pending blank lines.
    pub fn finish(&mut self) {
        self.flush();
        self.emit_blanks();
    }

    /// Take the output lines produced so far.
    pub fn drain(&mut self) -> std::vec::Drain<'_, String> {
        self.out.drain(..)
    }

    fn push_markdown(&mut self, line: &str) {
        let mut line = line.to_string();
        let state = *self.classifier.classify(&mut line);
        let opened = self.classifier.opened();
        debug!(
            "{} depth {} seq {}: {line:?}",
            state.kind, state.depth, state.seq
        );
        match state.kind {
            LineKind::Code | LineKind::HtmlBlock => {
                self.flush();
                self.emit(line);
            }
            _ if is_blank(&line) => {
                self.flush();
                self.emit(String::new());
            }
            LineKind::HeaderAtx
            | LineKind::Rule
            | LineKind::LinkLabel
            | LineKind::Table
            | LineKind::HtmlAbbreviation => {
                self.flush();
                self.emit(normalize_indent(&line));
            }
            LineKind::HeaderSetext => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.emit(paragraph.unwrapped());
                }
                self.owner = None;
                self.emit(normalize_indent(&line));
            }
            _ => self.markdown_paragraph(&line, state, opened),
        }
    }

    fn markdown_paragraph(&mut self, line: &str, state: BlockState, opened: bool) {
        let owner = (state.kind, state.seq);
        let (indent, start) = indent_width(line, MARKDOWN_TAB_STOP);
        let mut body = &line[start..];
        if opened || self.owner != Some(owner) || self.paragraph.is_none() {
            self.flush();
            let content = spaces(state.content_col());
            let first = if state.kind == LineKind::Text {
                spaces(indent)
            } else if opened {
                let marker = item_marker(body, state.kind);
                body = &body[marker.len()..];
                let hang = usize::from(state.indent_hang);
                let pad = hang
                    .saturating_sub(display_width(marker, MARKDOWN_TAB_STOP))
                    .max(1);
                format!(
                    "{}{marker}{}",
                    spaces(usize::from(state.indent_left)),
                    spaces(pad)
                )
            } else {
                content.clone()
            };
            let cont = if state.kind == LineKind::Text {
                first.clone()
            } else {
                content
            };
            self.paragraph = Some(Paragraph::new(first, cont));
            self.owner = Some(owner);
        }
        let (text, brk) = hard_break(body);
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push(text, brk);
        }
    }

    fn push_plain(&mut self, line: &str) {
        if is_blank(line) {
            self.blank_run += 1;
            return;
        }
        let needed = self.options.paragraph_newlines.max(1) - 1;
        if self.blank_run > 0 && self.blank_run >= needed {
            self.flush();
            self.emit_blanks();
        }
        // Shorter blank runs are absorbed into the paragraph.
        self.blank_run = 0;

        let (indent, start) = indent_width(line, self.options.tab_width);
        let body = line[start..].trim_end();
        let forced = needed == 0
            || body
                .chars()
                .next()
                .is_some_and(|c| self.options.break_chars.contains(c));
        if forced {
            self.flush();
        }

        let hang = self.options.hang_indent;
        if let Some(paragraph) = self.paragraph.as_mut() {
            if paragraph.len() == 1 && !self.bullet {
                paragraph.set_cont_prefix(spaces(indent + hang));
            }
            paragraph.push(body, Break::None);
            return;
        }
        let (cont, bullet) = match self.bullet_offset(body) {
            Some(offset) => (indent + offset, true),
            None => (indent + hang, false),
        };
        let mut paragraph = Paragraph::new(spaces(indent), spaces(cont));
        paragraph.push(body, Break::None);
        self.paragraph = Some(paragraph);
        self.bullet = bullet;
    }

    /// Column of the text after a hang bullet, relative to the bullet.
    fn bullet_offset(&self, body: &str) -> Option<usize> {
        let bullet = body.chars().next()?;
        if !self.options.hang_chars.contains(bullet) {
            return None;
        }
        let rest = &body[bullet.len_utf8()..];
        if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
            return None;
        }
        let (pad, _) = indent_width(rest, self.options.tab_width);
        Some(display_width(&body[..bullet.len_utf8()], self.options.tab_width) + pad.max(1))
    }

    fn flush(&mut self) {
        self.owner = None;
        self.bullet = false;
        let Some(paragraph) = self.paragraph.take() else {
            return;
        };
        let width = self
            .options
            .width
            .saturating_sub(self.options.left_margin)
            .max(1);
        for line in paragraph.fill(width, self.options.keep_spaces, self.options.markdown) {
            self.emit(line);
        }
    }

    fn emit_blanks(&mut self) {
        for _ in 0..std::mem::take(&mut self.blank_run) {
            self.emit(String::new());
        }
    }

    fn emit(&mut self, line: String) {
        if self.options.left_margin > 0 && !line.is_empty() {
            self.out
                .push(format!("{}{line}", spaces(self.options.left_margin)));
        } else {
            self.out.push(line);
        }
    }
}
