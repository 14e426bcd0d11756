//! Line-oriented Markdown block classifier.
//!
//! [`Classifier`] keeps a stack of open block contexts and assigns each
//! incoming line the frame on top of that stack. The wrap engine uses the
//! result to decide which lines may be reflowed, which pass through verbatim,
//! and where nested list content starts. Recognised constructs follow
//! Markdown and PHP Markdown Extra: atx and Setext headers, rules, ordered,
//! unordered and definition lists, footnote definitions, tables, link labels,
//! abbreviations, block HTML, and fenced or indented code.

mod blocks;
mod html;
mod state;

use log::trace;

pub use self::state::{BlockState, CodeFence, HtmlSubstate, LineKind};
use self::{blocks::ListMarker, html::HtmlOpen};
use crate::line::{MARKDOWN_TAB_STOP, digit_count, indent_width, is_blank, renumber};

/// Block opened by the current line's leading characters.
#[derive(Debug, Clone, Copy)]
enum Opening {
    Header,
    Setext,
    Rule,
    Fence(CodeFence),
    Html(HtmlOpen),
    Footnote { has_text: bool },
    LinkLabel,
    Abbreviation,
    List(ListMarker),
    Table,
}

/// Per-stream Markdown block classifier.
///
/// Construct one per input stream; no state is shared between instances.
///
/// # Examples
///
/// ```
/// use wrap::markdown::{Classifier, LineKind};
///
/// let mut classifier = Classifier::new();
/// let mut first = String::from("3. first");
/// let mut second = String::from("7. second");
/// assert_eq!(classifier.classify(&mut first).kind, LineKind::OrderedList);
/// assert_eq!(classifier.classify(&mut second).ol_num, 2);
/// assert_eq!((first.as_str(), second.as_str()), ("1. first", "2. second"));
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    stack: Vec<BlockState>,
    seq: u64,
    prev_blank_line: bool,
    /// The previous line was paragraph text that a lazy line may continue.
    in_paragraph: bool,
    opened: bool,
    pop_next: bool,
    code_fence: Option<CodeFence>,
    html_state: HtmlSubstate,
    pre_tag: Option<&'static str>,
    pre_depth: isize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    /// Create a classifier holding only the bottom `Text` frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: vec![BlockState::new(LineKind::Text, 0, 0, 0)],
            seq: 0,
            prev_blank_line: true,
            in_paragraph: false,
            opened: false,
            pop_next: false,
            code_fence: None,
            html_state: HtmlSubstate::None,
            pre_tag: None,
            pre_depth: 0,
        }
    }

    /// Open frames, bottom first.
    #[must_use]
    pub fn stack(&self) -> &[BlockState] {
        &self.stack
    }

    /// Frame on top of the stack.
    #[must_use]
    pub fn top(&self) -> &BlockState {
        &self.stack[self.stack.len() - 1]
    }

    /// `true` when the last classified line opened its block or started a new
    /// item in it, for example a list item's marker line.
    #[must_use]
    pub fn opened(&self) -> bool {
        self.opened
    }

    #[must_use]
    pub fn html_state(&self) -> HtmlSubstate {
        self.html_state
    }

    #[must_use]
    pub fn code_fence(&self) -> Option<CodeFence> {
        self.code_fence
    }

    /// Classify one line and return the frame it belongs to.
    ///
    /// Ordered-list items are renumbered in `line`, so the caller sees
    /// `1.`, `2.`, `3.` … for each list.
    pub fn classify(&mut self, line: &mut String) -> &BlockState {
        self.opened = false;
        if std::mem::take(&mut self.pop_next) {
            self.pop();
            self.code_fence = None;
            self.html_state = HtmlSubstate::None;
            self.pre_tag = None;
        }
        let prev_blank = std::mem::take(&mut self.prev_blank_line);
        let (indent, start) = indent_width(line, MARKDOWN_TAB_STOP);
        let blank = is_blank(line);

        let top_kind = self.top().kind;
        match top_kind {
            LineKind::HeaderAtx
            | LineKind::HeaderSetext
            | LineKind::Rule
            | LineKind::HtmlAbbreviation => self.pop(),
            LineKind::LinkLabel if !blank && blocks::is_title_continuation(&line[start..]) => {
                return self.finish_verbatim(false);
            }
            LineKind::Table if !blank && blocks::has_table_pipe(&line[start..]) => {
                return self.finish_verbatim(false);
            }
            LineKind::LinkLabel | LineKind::Table => self.pop(),
            _ => {}
        }

        if self.top().kind == LineKind::Code
            && let Some(fence) = self.code_fence
        {
            self.pop_next = fence.closes(&line[start..]);
            return self.finish_verbatim(blank);
        }

        if self.top().kind == LineKind::HtmlBlock {
            if self.html_terminates(&line[start..], blank) {
                self.pop_next = true;
                self.html_state = HtmlSubstate::End;
            }
            return self.finish_verbatim(blank);
        }

        if blank {
            self.prev_blank_line = true;
            self.in_paragraph = false;
            return self.top();
        }

        let top_is_code = self.top().kind == LineKind::Code;
        let threshold = (self.stack.len() - usize::from(top_is_code)) * 4;
        if indent >= threshold && (top_is_code || !self.in_paragraph) {
            if !top_is_code {
                self.push(LineKind::Code, indent);
            }
            return self.finish_verbatim(false);
        }
        if top_is_code {
            self.pop();
        }

        let opening = self.dispatch(&line[start..], indent, prev_blank);
        self.transition(line, opening, indent, start, prev_blank)
    }

    /// Recognise a block opener from the first non-whitespace byte.
    fn dispatch(&self, text: &str, indent: usize, prev_blank: bool) -> Option<Opening> {
        let first = *text.as_bytes().first()?;
        match first {
            b'#' if blocks::atx_level(text).is_some() => return Some(Opening::Header),
            b'*' if blocks::is_abbreviation(text) => return Some(Opening::Abbreviation),
            b'-' | b'=' if self.in_paragraph && blocks::setext_underline(text).is_some() => {
                return Some(Opening::Setext);
            }
            _ => {}
        }
        if matches!(first, b'-' | b'_' | b'*') && blocks::is_rule(text) {
            return Some(Opening::Rule);
        }
        match first {
            b'`' | b'~' => {
                if let Some(fence) = CodeFence::open(text) {
                    return Some(Opening::Fence(fence));
                }
            }
            b'<' => {
                if let Some(open) = html::probe(text) {
                    return Some(Opening::Html(open));
                }
            }
            b'[' => {
                if let Some(has_text) = blocks::footnote(text) {
                    return Some(Opening::Footnote { has_text });
                }
                if blocks::is_link_label(text) {
                    return Some(Opening::LinkLabel);
                }
            }
            _ => {}
        }
        if let Some(marker) = blocks::list_marker(text, indent) {
            // Only an item numbered 1 may interrupt a paragraph.
            let interrupts = self.in_paragraph && !self.top().kind.is_list();
            if marker.kind != LineKind::OrderedList || !interrupts || marker.number == Some(1) {
                return Some(Opening::List(marker));
            }
        }
        (prev_blank && blocks::has_table_pipe(text)).then_some(Opening::Table)
    }

    fn transition(
        &mut self,
        line: &mut String,
        opening: Option<Opening>,
        indent: usize,
        start: usize,
        prev_blank: bool,
    ) -> &BlockState {
        let depth = indent / self.divisor(indent);
        let Some(opening) = opening else {
            // A lazy continuation line stays in whatever block is open.
            if prev_blank || !self.in_paragraph {
                self.pop_shallower(depth, indent);
            }
            self.in_paragraph = true;
            return self.top();
        };

        self.in_paragraph = false;
        match opening {
            Opening::Header | Opening::Rule => {
                self.stack.truncate(1);
                let kind = if matches!(opening, Opening::Header) {
                    LineKind::HeaderAtx
                } else {
                    LineKind::Rule
                };
                self.push(kind, indent);
            }
            Opening::Setext => {
                self.push(LineKind::HeaderSetext, indent);
            }
            Opening::Footnote { has_text } => {
                self.stack.truncate(1);
                let frame = self.push(LineKind::FootnoteDef, indent);
                frame.indent_hang = 4;
                frame.footnote_has_text = has_text;
                self.in_paragraph = has_text;
            }
            Opening::LinkLabel | Opening::Abbreviation | Opening::Table => {
                self.pop_shallower(depth, indent);
                let kind = match opening {
                    Opening::LinkLabel => LineKind::LinkLabel,
                    Opening::Abbreviation => LineKind::HtmlAbbreviation,
                    _ => LineKind::Table,
                };
                self.push(kind, indent);
            }
            Opening::Fence(fence) => {
                self.pop_shallower(depth, indent);
                self.push(LineKind::Code, indent);
                self.code_fence = Some(fence);
            }
            Opening::Html(open) => {
                self.pop_shallower(depth, indent);
                self.push(LineKind::HtmlBlock, indent);
                self.html_state = open.substate;
                self.pre_tag = open.pre_tag;
                let text = &line[start..];
                let closed = match (open.substate, open.pre_tag) {
                    (HtmlSubstate::Pre, Some(tag)) => {
                        self.pre_depth = html::tag_balance(text, tag);
                        self.pre_depth <= 0
                    }
                    (substate, _) => substate
                        .terminator()
                        .is_some_and(|t| text[open.body_start..].contains(t)),
                };
                if closed {
                    self.pop_next = true;
                    self.html_state = HtmlSubstate::End;
                }
            }
            Opening::List(marker) => {
                self.in_paragraph = true;
                self.list_item(line, marker, depth + 1, indent, start);
            }
        }
        self.top()
    }

    /// Reuse a sibling list frame or push a new one for a list item line.
    fn list_item(
        &mut self,
        line: &mut String,
        marker: ListMarker,
        depth: usize,
        indent: usize,
        start: usize,
    ) {
        while self.stack.len() > 1 {
            let top = *self.top();
            let shallower = usize::from(top.depth) > depth && indent < top.content_col();
            if shallower || (top.kind.is_nestable() && indent < usize::from(top.indent_left)) {
                self.pop();
                continue;
            }
            if top.kind.is_nestable() && indent < top.content_col() {
                let same_list = top.kind == marker.kind
                    && (marker.kind != LineKind::OrderedList || top.ol_marker == marker.marker);
                if same_list {
                    self.next_item(line, start);
                    return;
                }
                self.pop();
                continue;
            }
            break;
        }

        let mut hang = marker.hang;
        if marker.kind == LineKind::OrderedList {
            hang = hang.saturating_add_signed(renumber(line, start, 1));
        }
        let frame = self.push(marker.kind, indent);
        frame.indent_hang = state::clamp_u16(hang);
        if marker.kind == LineKind::OrderedList {
            frame.ol_marker = marker.marker;
            frame.ol_num = 1;
        }
    }

    /// Start the next item of the list on top of the stack.
    fn next_item(&mut self, line: &mut String, start: usize) {
        self.seq += 1;
        self.opened = true;
        let seq = self.seq;
        let last = self.stack.len() - 1;
        let frame = &mut self.stack[last];
        frame.seq = seq;
        if frame.kind == LineKind::OrderedList {
            frame.ol_num += 1;
            renumber(line, start, frame.ol_num);
            if digit_count(frame.ol_num) > digit_count(frame.ol_num - 1) {
                frame.indent_hang += 1;
            }
        }
        trace!("next {} item, seq {seq}", frame.kind);
    }

    /// Markdown prefers 4 spaces per indent but accepts 3, and 2 for bullets.
    fn divisor(&self, indent: usize) -> usize {
        let innermost = self.stack.iter().rev().find(|f| f.kind.is_nestable());
        let a = indent % 4;
        let b = indent % 3;
        let c = match innermost.map(|f| f.kind) {
            Some(LineKind::DefinitionList | LineKind::UnorderedList) => indent % 2,
            _ => 9,
        };
        if a <= b && a <= c {
            4
        } else if b <= c {
            3
        } else {
            2
        }
    }

    /// Pop frames that a line at `depth`/`indent` no longer belongs to.
    fn pop_shallower(&mut self, depth: usize, indent: usize) {
        while self.stack.len() > 1 {
            let top = self.top();
            if usize::from(top.depth) > depth && indent < top.content_col() {
                self.pop();
            } else {
                break;
            }
        }
    }

    fn html_terminates(&mut self, text: &str, blank: bool) -> bool {
        match (self.html_state, self.pre_tag) {
            (HtmlSubstate::Element, _) => blank,
            (HtmlSubstate::Pre, Some(tag)) => {
                self.pre_depth += html::tag_balance(text, tag);
                self.pre_depth <= 0
            }
            (substate, _) => substate.terminator().is_some_and(|t| text.contains(t)),
        }
    }

    fn push(&mut self, kind: LineKind, indent: usize) -> &mut BlockState {
        self.seq += 1;
        self.opened = true;
        let depth = self.stack.len();
        let indent_left = indent.max(usize::from(self.top().indent_left));
        trace!("push {kind} at depth {depth}, indent {indent_left}, seq {}", self.seq);
        self.stack
            .push(BlockState::new(kind, self.seq, depth, indent_left));
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn pop(&mut self) {
        if self.stack.len() > 1
            && let Some(frame) = self.stack.pop()
        {
            trace!("pop {} from depth {}", frame.kind, frame.depth);
        }
    }

    fn finish_verbatim(&mut self, blank: bool) -> &BlockState {
        self.prev_blank_line = blank;
        self.in_paragraph = false;
        self.top()
    }
}

#[cfg(test)]
mod tests;
