//! Comment delimiter table and comment-line detection for `wrapc`.

use std::fmt;

use crate::{Error, Result};

/// Delimiters recognised when `-p` is not given.
pub const DEFAULT_DELIMITERS: &str = "# ; // /* (* -- %";

const SINGLE: u128 = 1 << b' ';

/// Comment delimiters keyed by their first byte.
///
/// Each entry is a bitset of the bytes that may follow the first one. The
/// space bit marks a one-byte delimiter and is never combined with another
/// bit, so `#` and `#!` cannot both be configured.
#[derive(Clone, PartialEq, Eq)]
pub struct CommentDelimMap {
    entries: [u128; 128],
}

impl fmt::Debug for CommentDelimMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.delimiters()).finish()
    }
}

impl Default for CommentDelimMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for delim in DEFAULT_DELIMITERS.split(' ') {
            let bytes = delim.as_bytes();
            map.entries[usize::from(bytes[0])] |= bytes.get(1).map_or(SINGLE, |b| 1u128 << b);
        }
        map
    }
}

impl CommentDelimMap {
    fn empty() -> Self {
        Self { entries: [0; 128] }
    }

    /// Parse a space- or comma-separated delimiter list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] for delimiters that are not one or two
    /// printable ASCII bytes, or that conflict with another entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use wrap::comment::CommentDelimMap;
    ///
    /// let map = CommentDelimMap::parse("//, #").expect("valid list");
    /// assert_eq!(map.delimiters(), ["#", "//"]);
    /// assert!(CommentDelimMap::parse("# #!").is_err());
    /// ```
    pub fn parse(list: &str) -> Result<Self> {
        let mut map = Self::empty();
        for delim in list.split([' ', ',']).filter(|d| !d.is_empty()) {
            map.insert(delim)?;
        }
        Ok(map)
    }

    /// Add one delimiter.
    ///
    /// # Errors
    ///
    /// See [`CommentDelimMap::parse`].
    pub fn insert(&mut self, delim: &str) -> Result<()> {
        let bytes = delim.as_bytes();
        if !(1..=2).contains(&bytes.len()) || !bytes.iter().all(u8::is_ascii_graphic) {
            return Err(Error::Usage(format!("invalid comment delimiter {delim:?}")));
        }
        let entry = &mut self.entries[usize::from(bytes[0])];
        let bit = bytes.get(1).map_or(SINGLE, |b| 1u128 << b);
        let conflict = if bit == SINGLE {
            *entry & !SINGLE != 0
        } else {
            *entry & SINGLE != 0
        };
        if conflict {
            return Err(Error::Usage(format!(
                "comment delimiter {delim:?} conflicts with another delimiter"
            )));
        }
        *entry |= bit;
        Ok(())
    }

    /// Configured delimiters in byte order.
    #[must_use]
    pub fn delimiters(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (first, entry) in (0u8..).zip(self.entries.iter()) {
            for second in 0u8..128 {
                if entry & (1u128 << second) == 0 {
                    continue;
                }
                let mut delim = String::from(char::from(first));
                if second != b' ' {
                    delim.push(char::from(second));
                }
                out.push(delim);
            }
        }
        out
    }

    /// Length of the delimiter at the start of `bytes`, before repeats.
    fn lookup(&self, bytes: &[u8]) -> Option<usize> {
        let first = *bytes.first()?;
        let entry = *self.entries.get(usize::from(first))?;
        if entry == 0 {
            return None;
        }
        if entry == SINGLE {
            return Some(1);
        }
        let second = *bytes.get(1)?;
        (second < 128 && entry & (1u128 << second) != 0).then_some(2)
    }
}

/// A source line split into its comment decoration and body.
///
/// All parts borrow from the line. `indent`, `delim` and `pad` are
/// contiguous, so together they form the line's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment<'a> {
    pub indent: &'a str,
    pub delim: &'a str,
    pub pad: &'a str,
    pub body: &'a str,
    /// Block comment closer found at the end of the line.
    pub suffix: &'a str,
}

impl Comment<'_> {
    /// Indent, delimiter and padding.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}{}{}", self.indent, self.delim, self.pad)
    }

    /// Closer that ends a block comment opened by this delimiter.
    #[must_use]
    pub fn closer(&self) -> Option<&'static str> {
        closer(self.delim)
    }
}

fn closer(delim: &str) -> Option<&'static str> {
    if delim.starts_with("/*") {
        Some("*/")
    } else if delim.starts_with("(*") {
        Some("*)")
    } else {
        None
    }
}

fn split_indent(line: &str) -> (&str, &str) {
    let end = line.len() - line.trim_start_matches([' ', '\t']).len();
    line.split_at(end)
}

/// Split `rest` (the text after a delimiter) into pad, body and suffix.
fn split_body<'a>(rest: &'a str, closer: Option<&'static str>) -> (&'a str, &'a str, &'a str) {
    let body = rest.trim_start_matches([' ', '\t']);
    let pad = &rest[..rest.len() - body.len()];
    let body = body.trim_end();
    if let Some(closer) = closer
        && let Some(inner) = body.strip_suffix(closer)
    {
        return (pad, inner.trim_end(), closer);
    }
    (pad, body, "")
}

/// Recognise a comment that starts `line` after optional whitespace.
///
/// # Examples
///
/// ```
/// use wrap::comment::{CommentDelimMap, detect};
///
/// let map = CommentDelimMap::default();
/// let comment = detect("    /// Doc text", &map).expect("comment");
/// assert_eq!((comment.indent, comment.delim, comment.body), ("    ", "///", "Doc text"));
/// assert!(detect("#!/bin/sh", &map).is_none());
/// ```
#[must_use]
pub fn detect<'a>(line: &'a str, map: &CommentDelimMap) -> Option<Comment<'a>> {
    let (indent, rest) = split_indent(line);
    let bytes = rest.as_bytes();
    let base = map.lookup(bytes)?;
    let own = &bytes[..base];
    let end = base
        + bytes[base..]
            .iter()
            .take_while(|b| own.contains(b) || **b == b'!')
            .count();
    if !bytes.get(end).is_none_or(u8::is_ascii_whitespace) {
        return None;
    }
    let delim = &rest[..end];
    let (pad, body, suffix) = split_body(&rest[end..], closer(delim));
    Some(Comment {
        indent,
        delim,
        pad,
        body,
        suffix,
    })
}

/// Recognise a box-comment continuation line (` * text`) or a lone closer
/// inside a block opened by `opener`.
#[must_use]
pub fn detect_continuation<'a>(line: &'a str, opener: &str) -> Option<Comment<'a>> {
    let closer = closer(opener)?;
    let (indent, rest) = split_indent(line);
    if rest.trim_end() == closer {
        return Some(Comment {
            indent,
            delim: "",
            pad: "",
            body: "",
            suffix: &rest[..closer.len()],
        });
    }
    if !rest.starts_with('*') || rest.starts_with(closer) {
        return None;
    }
    if !rest.as_bytes().get(1).is_none_or(u8::is_ascii_whitespace) {
        return None;
    }
    let (pad, body, suffix) = split_body(&rest[1..], Some(closer));
    Some(Comment {
        indent,
        delim: &rest[..1],
        pad,
        body,
        suffix,
    })
}
