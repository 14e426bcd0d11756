//! Probes for the block constructs recognised by their leading characters.
//!
//! Every probe receives the line with its indentation already stripped.

use super::state::LineKind;
use crate::line::{is_blank, uri_scheme_len};

lazy_regex! {
    ABBREVIATION_RE = r"^\*\[[^\]]+\]:";
    /// Group 1 is the text after the label, if any.
    FOOTNOTE_RE = r"^\[\^[^\]]+\]:(?:[ \t]+(.*))?$";
    LINK_LABEL_RE =
        r#"^\[[^\]^][^\]]*\]:[ \t]*(<[^>]*>|\S+)(?:[ \t]+("[^"]*"|'[^']*'|\([^)]*\)))?[ \t]*$"#;
}

/// Level of an atx header (`#` to `######` followed by whitespace).
pub(crate) fn atx_level(text: &str) -> Option<usize> {
    let level = text.bytes().take_while(|&b| b == b'#').count();
    let follow = text.as_bytes().get(level);
    ((1..=6).contains(&level) && follow.is_none_or(u8::is_ascii_whitespace)).then_some(level)
}

/// Three or more `-`, `_` or `*`, all the same, separated only by whitespace.
pub(crate) fn is_rule(text: &str) -> bool {
    let Some(&ch) = text.as_bytes().first() else {
        return false;
    };
    if !matches!(ch, b'-' | b'_' | b'*') {
        return false;
    }
    let mut count = 0;
    for b in text.bytes() {
        match b {
            _ if b == ch => count += 1,
            b' ' | b'\t' | b'\r' | b'\n' => {}
            _ => return false,
        }
    }
    count >= 3
}

/// A line made of one repeated `=` or `-`, optionally followed by whitespace.
pub(crate) fn setext_underline(text: &str) -> Option<u8> {
    let ch = *text.as_bytes().first()?;
    if !matches!(ch, b'=' | b'-') {
        return None;
    }
    let run = text.bytes().take_while(|&b| b == ch).count();
    is_blank(&text[run..]).then_some(ch)
}

pub(crate) fn is_abbreviation(text: &str) -> bool {
    ABBREVIATION_RE.is_match(text)
}

/// `Some(has_text)` for a footnote definition marker line.
pub(crate) fn footnote(text: &str) -> Option<bool> {
    let caps = FOOTNOTE_RE.captures(crate::line::chomp(text))?;
    Some(caps.get(1).is_some_and(|m| !is_blank(m.as_str())))
}

/// `[id]: URI ["title"]` whose target carries a URI scheme.
pub(crate) fn is_link_label(text: &str) -> bool {
    let Some(caps) = LINK_LABEL_RE.captures(crate::line::chomp(text)) else {
        return false;
    };
    let target = caps[1].trim_start_matches('<');
    uri_scheme_len(target).is_some()
}

/// Optional title on the line after a link label.
pub(crate) fn is_title_continuation(text: &str) -> bool {
    matches!(text.as_bytes().first(), Some(b'"' | b'\'' | b'('))
}

/// Unescaped `|` after a non-whitespace byte.
pub(crate) fn has_table_pipe(text: &str) -> bool {
    let mut seen_text = false;
    let mut escaped = false;
    for b in text.bytes() {
        if escaped {
            escaped = false;
            seen_text = true;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'|' if seen_text => return true,
            _ if b.is_ascii_whitespace() => {}
            _ => seen_text = true,
        }
    }
    false
}

/// A recognised list item marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListMarker {
    pub kind: LineKind,
    /// `.`/`)` for ordered items, the bullet character otherwise.
    pub marker: char,
    pub number: Option<u32>,
    /// Columns from the marker start to the item text.
    pub hang: usize,
}

/// Probe for an ordered, unordered or definition list marker.
///
/// `col` is the column at which `text` starts; it keeps tab expansion after
/// the marker aligned with the Markdown tab stop.
pub(crate) fn list_marker(text: &str, col: usize) -> Option<ListMarker> {
    let bytes = text.as_bytes();
    let (kind, marker, number, marker_len) = match bytes.first()? {
        b'-' | b'+' | b'*' => (LineKind::UnorderedList, char::from(bytes[0]), None, 1),
        b':' => (LineKind::DefinitionList, ':', None, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let delim = *bytes.get(digits)?;
            if digits > 9 || !matches!(delim, b'.' | b')') {
                return None;
            }
            let number = text[..digits].parse().ok()?;
            (LineKind::OrderedList, char::from(delim), Some(number), digits + 1)
        }
        _ => return None,
    };
    if !matches!(bytes.get(marker_len), Some(b' ' | b'\t')) {
        return None;
    }
    Some(ListMarker {
        kind,
        marker,
        number,
        hang: marker_hang(text, marker_len, col),
    })
}

fn marker_hang(text: &str, marker_len: usize, col: usize) -> usize {
    let rest = &text[marker_len..];
    let ws = rest.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count();
    let start = col + marker_len;
    let pad = rest[..ws].bytes().fold(0, |pad, b| {
        if b == b'\t' {
            pad + 4 - (start + pad) % 4
        } else {
            pad + 1
        }
    });
    // Five or more spaces start indented code inside the item.
    if is_blank(&rest[ws..]) || pad > 4 {
        marker_len + 1
    } else {
        marker_len + pad
    }
}
