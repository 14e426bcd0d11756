//! Block-level HTML detection.
//!
//! Only enough of a tag is parsed to decide whether a line opens an HTML
//! block and how that block ends. Tag names are folded to lower case.

use super::state::HtmlSubstate;

/// Tags whose content is preformatted and ends at the matching close tag.
pub(crate) const PRE_TAGS: [&str; 3] = ["pre", "script", "style"];

/// HTML 5 block-level element names.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "audio", "base", "basefont", "blockquote", "body", "canvas",
    "caption", "center", "col", "colgroup", "dd", "del", "details", "dialog", "dir", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "ins", "legend",
    "li", "link", "main", "math", "menu", "menuitem", "meta", "nav", "noframes", "noscript", "ol",
    "optgroup", "option", "output", "p", "param", "search", "section", "source", "summary",
    "table", "tbody", "td", "template", "tfoot", "th", "thead", "title", "tr", "track", "ul",
    "video",
];

const MAX_TAG_LEN: usize = 10;

/// Result of probing a line that starts with `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HtmlOpen {
    pub substate: HtmlSubstate,
    /// Preformatted tag name when `substate` is [`HtmlSubstate::Pre`].
    pub pre_tag: Option<&'static str>,
    /// Byte offset just past the opening construct.
    pub body_start: usize,
}

/// Decide whether `text` (starting at `<`) opens an HTML block.
pub(crate) fn probe(text: &str) -> Option<HtmlOpen> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let open = |substate, body_start| {
        Some(HtmlOpen {
            substate,
            pre_tag: None,
            body_start,
        })
    };
    if text.starts_with("<!--") {
        return open(HtmlSubstate::Comment, 4);
    }
    if text.starts_with("<![CDATA[") {
        return open(HtmlSubstate::CData, 9);
    }
    if text.starts_with("<!") && bytes.get(2).is_some_and(u8::is_ascii_alphabetic) {
        return open(HtmlSubstate::Doctype, 2);
    }
    if text.starts_with("<?") {
        return open(HtmlSubstate::ProcessingInstruction, 2);
    }

    let closing = bytes.get(1) == Some(&b'/');
    let name_start = if closing { 2 } else { 1 };
    let name_len = tag_name_len(&bytes[name_start..])?;
    let name = text[name_start..name_start + name_len].to_ascii_lowercase();
    let after_name = name_start + name_len;
    match bytes.get(after_name) {
        None | Some(b' ' | b'\t' | b'\r' | b'\n' | b'>') => {}
        Some(b'/') if bytes.get(after_name + 1) == Some(&b'>') => {}
        _ => return None,
    }

    if !closing && let Some(tag) = PRE_TAGS.iter().find(|t| **t == name) {
        return Some(HtmlOpen {
            substate: HtmlSubstate::Pre,
            pre_tag: Some(*tag),
            body_start: after_name,
        });
    }
    if BLOCK_TAGS.contains(&name.as_str()) || PRE_TAGS.contains(&name.as_str()) {
        return open(HtmlSubstate::Element, after_name);
    }

    // Any other tag only opens a block when it stands alone on the line.
    let end = tag_end(text, after_name)?;
    crate::line::is_blank(&text[end..]).then_some(HtmlOpen {
        substate: HtmlSubstate::Element,
        pre_tag: None,
        body_start: end,
    })
}

fn tag_name_len(bytes: &[u8]) -> Option<usize> {
    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
        .count();
    (len <= MAX_TAG_LEN).then_some(len)
}

/// Offset just past the `>` that ends the tag, skipping quoted attributes.
fn tag_end(text: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (idx, b) in text.bytes().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if q == b => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(idx + 1),
            (None, b'<') => return None,
            _ => {}
        }
    }
    None
}

/// Case-insensitive ASCII substring search.
pub(crate) fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let (h, n) = (haystack.as_bytes(), needle.as_bytes());
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Net change in open `tag` elements across `text`.
///
/// Opening tags count +1 and closing tags -1.
pub(crate) fn tag_balance(text: &str, tag: &str) -> isize {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut balance = 0;
    let mut rest = text;
    while let Some(idx) = find_ci(rest, "<") {
        let tail = &rest[idx..];
        let (matched, delta) = if starts_with_ci(tail, &close) {
            (close.len(), -1)
        } else if starts_with_ci(tail, &open) {
            (open.len(), 1)
        } else {
            (1, 0)
        };
        let boundary = tail.as_bytes().get(matched);
        if delta != 0 && matches!(boundary, None | Some(b' ' | b'\t' | b'>' | b'/')) {
            balance += delta;
        }
        rest = &tail[matched..];
    }
    balance
}

fn starts_with_ci(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
