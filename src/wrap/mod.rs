//! Paragraph reflow for plain text and Markdown.
//!
//! [`Formatter`] is the streaming engine: feed it lines with
//! [`Formatter::push_line`], collect finished output with
//! [`Formatter::drain`], and call [`Formatter::finish`] at end of input.
//! [`wrap_lines`] and [`wrap_stream`] wrap the same engine for slices and
//! byte streams.
//!
//! Display widths come from `unicode-width`; the greedy fill itself is done
//! by `textwrap` with word splitting disabled.

use std::io::{BufRead, Write};

mod formatter;
mod paragraph;

pub use formatter::Formatter;

use crate::{Result, line::chomp};

/// Reflow settings shared by both modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOptions {
    /// Output line width in columns.
    pub width: usize,
    /// Tab stop used to measure plain-text indentation.
    pub tab_width: usize,
    /// Consecutive newlines that end a plain-text paragraph.
    pub paragraph_newlines: usize,
    /// Spaces added in front of every non-empty output line.
    pub left_margin: usize,
    /// Extra indent for plain-text continuation lines.
    pub hang_indent: usize,
    /// Single-character bullets that start a hanging paragraph.
    pub hang_chars: String,
    /// Leading characters that force a plain-text paragraph break.
    pub break_chars: String,
    /// Keep runs of spaces between words.
    pub keep_spaces: bool,
    /// Classify input as Markdown.
    pub markdown: bool,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            width: 80,
            tab_width: 8,
            paragraph_newlines: 2,
            left_margin: 0,
            hang_indent: 0,
            hang_chars: String::new(),
            break_chars: String::new(),
            keep_spaces: false,
            markdown: false,
        }
    }
}

impl WrapOptions {
    /// Options for Markdown input at the given width.
    #[must_use]
    pub fn markdown(width: usize) -> Self {
        Self {
            width,
            markdown: true,
            ..Self::default()
        }
    }
}

/// Wrap a slice of lines.
///
/// # Examples
///
/// ```
/// use wrap::{WrapOptions, wrap_lines};
///
/// let input = vec!["a b c d".to_string(), "e f".to_string()];
/// let options = WrapOptions { width: 5, ..WrapOptions::default() };
/// assert_eq!(wrap_lines(&input, &options), ["a b c", "d e f"]);
/// ```
#[must_use]
pub fn wrap_lines(lines: &[String], options: &WrapOptions) -> Vec<String> {
    let mut formatter = Formatter::new(options.clone());
    for line in lines {
        formatter.push_line(line);
    }
    formatter.finish();
    formatter.drain().collect()
}

/// Wrap everything readable from `reader` onto `writer`.
///
/// Input is read line by line; invalid UTF-8 is replaced rather than
/// rejected. Output lines end in `\n`.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] when reading or writing fails.
pub fn wrap_stream<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    options: &WrapOptions,
) -> Result<()> {
    let mut formatter = Formatter::new(options.clone());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        formatter.push_line(chomp(&String::from_utf8_lossy(&buf)));
        write_lines(&mut writer, &mut formatter)?;
    }
    formatter.finish();
    write_lines(&mut writer, &mut formatter)?;
    writer.flush()?;
    Ok(())
}

fn write_lines<W: Write>(writer: &mut W, formatter: &mut Formatter) -> Result<()> {
    for line in formatter.drain() {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
