//! Types describing the classifier's block stack.

use std::fmt;

/// Classification of a line within its Markdown context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Text,
    /// Indented or fenced code.
    Code,
    HeaderAtx,
    HeaderSetext,
    Rule,
    OrderedList,
    UnorderedList,
    DefinitionList,
    FootnoteDef,
    LinkLabel,
    Table,
    HtmlBlock,
    HtmlAbbreviation,
}

impl LineKind {
    /// Lists and footnote definitions can hold nested blocks.
    #[must_use]
    pub fn is_nestable(self) -> bool {
        matches!(
            self,
            Self::OrderedList | Self::UnorderedList | Self::DefinitionList | Self::FootnoteDef
        )
    }

    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::OrderedList | Self::UnorderedList | Self::DefinitionList
        )
    }

    /// Lines of this kind are never reflowed.
    #[must_use]
    pub fn is_verbatim(self) -> bool {
        !matches!(self, Self::Text) && !self.is_nestable()
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Code => "code",
            Self::HeaderAtx => "atx",
            Self::HeaderSetext => "setext",
            Self::Rule => "rule",
            Self::OrderedList => "ol",
            Self::UnorderedList => "ul",
            Self::DefinitionList => "dl",
            Self::FootnoteDef => "footnote",
            Self::LinkLabel => "label",
            Self::Table => "table",
            Self::HtmlBlock => "html",
            Self::HtmlAbbreviation => "abbr",
        };
        f.write_str(name)
    }
}

/// One open block context on the classifier stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockState {
    pub kind: LineKind,
    /// Reassigned whenever the frame absorbs a new logical item; equal values
    /// on consecutive lines mean the second continues the first.
    pub seq: u64,
    /// Equals the frame's index in the stack.
    pub depth: u16,
    pub indent_left: u16,
    /// Extra indent for continuation lines of a list item.
    pub indent_hang: u16,
    /// `.` or `)` for ordered lists, `'\0'` otherwise.
    pub ol_marker: char,
    pub ol_num: u32,
    pub footnote_has_text: bool,
}

impl BlockState {
    pub(crate) fn new(kind: LineKind, seq: u64, depth: usize, indent_left: usize) -> Self {
        Self {
            kind,
            seq,
            depth: clamp_u16(depth),
            indent_left: clamp_u16(indent_left),
            indent_hang: 0,
            ol_marker: '\0',
            ol_num: 0,
            footnote_has_text: false,
        }
    }

    /// Column at which the block's content starts.
    #[must_use]
    pub fn content_col(&self) -> usize {
        usize::from(self.indent_left) + usize::from(self.indent_hang)
    }
}

pub(crate) fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Progress through an open HTML block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlSubstate {
    #[default]
    None,
    CData,
    Comment,
    Doctype,
    /// Block-level element, closed by a blank line.
    Element,
    ProcessingInstruction,
    /// Inside `<pre>`, `<script>` or `<style>`.
    Pre,
    /// Terminator seen; the frame pops on the next line.
    End,
}

impl HtmlSubstate {
    /// Byte sequence that closes the block, for the substates that have one.
    #[must_use]
    pub fn terminator(self) -> Option<&'static str> {
        match self {
            Self::CData => Some("]]>"),
            Self::Comment => Some("-->"),
            Self::Doctype => Some(">"),
            Self::ProcessingInstruction => Some("?>"),
            _ => None,
        }
    }
}

/// An open code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFence {
    pub ch: char,
    pub len: usize,
}

impl CodeFence {
    /// Parse an opening fence at the start of `text`.
    ///
    /// Backtick fences may not carry backticks in their info string.
    #[must_use]
    pub fn open(text: &str) -> Option<Self> {
        let ch = match text.as_bytes().first()? {
            b'`' => '`',
            b'~' => '~',
            _ => return None,
        };
        let len = text.bytes().take_while(|&b| b == ch as u8).count();
        if len < 3 || (ch == '`' && text[len..].contains('`')) {
            return None;
        }
        Some(Self { ch, len })
    }

    /// `true` when `text` (indent already stripped) closes this fence.
    #[must_use]
    pub fn closes(&self, text: &str) -> bool {
        let run = text.bytes().take_while(|&b| b == self.ch as u8).count();
        run >= self.len && crate::line::is_blank(&text[run..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_closing_needs_same_char_and_length() {
        let fence = CodeFence::open("````rust").expect("fence");
        assert_eq!(fence, CodeFence { ch: '`', len: 4 });
        assert!(!fence.closes("```"));
        assert!(!fence.closes("~~~~"));
        assert!(!fence.closes("```` x"));
        assert!(fence.closes("`````  "));
    }

    #[test]
    fn backtick_info_string_rejects_backticks() {
        assert!(CodeFence::open("``` a`b").is_none());
        assert!(CodeFence::open("~~~ a`b").is_some());
        assert!(CodeFence::open("``").is_none());
    }

    #[test]
    fn verbatim_kinds() {
        assert!(LineKind::Code.is_verbatim());
        assert!(LineKind::Table.is_verbatim());
        assert!(!LineKind::Text.is_verbatim());
        assert!(!LineKind::FootnoteDef.is_verbatim());
        assert!(LineKind::FootnoteDef.is_nestable());
        assert!(!LineKind::FootnoteDef.is_list());
    }
}
