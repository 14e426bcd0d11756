//! Byte-level helpers shared by the classifier, the wrap engine and the
//! comment detector.

/// Markdown tab stop used when measuring block indentation.
pub const MARKDOWN_TAB_STOP: usize = 4;

/// Measure the leading whitespace of `line`.
///
/// Spaces count one column, a tab advances to the next multiple of
/// `tab_stop`, and CR/LF contribute nothing. Returns the column reached and
/// the byte offset of the first non-whitespace byte.
///
/// # Examples
///
/// ```
/// use wrap::line::indent_width;
///
/// assert_eq!(indent_width("  \tfoo", 4), (4, 3));
/// assert_eq!(indent_width("foo", 4), (0, 0));
/// ```
#[must_use]
pub fn indent_width(line: &str, tab_stop: usize) -> (usize, usize) {
    let tab_stop = tab_stop.max(1);
    let mut col = 0;
    for (idx, b) in line.bytes().enumerate() {
        match b {
            b' ' => col += 1,
            b'\t' => col += tab_stop - col % tab_stop,
            b'\r' | b'\n' => {}
            _ => return (col, idx),
        }
    }
    (col, line.len())
}

/// Display width of a prefix with tabs expanded.
#[must_use]
pub fn display_width(text: &str, tab_stop: usize) -> usize {
    use unicode_width::UnicodeWidthChar;

    let tab_stop = tab_stop.max(1);
    text.chars().fold(0, |col, ch| match ch {
        '\t' => col + tab_stop - col % tab_stop,
        '\r' | '\n' => col,
        _ => col + ch.width().unwrap_or(0),
    })
}

/// `true` when the line holds nothing but whitespace.
#[inline]
#[must_use]
pub fn is_blank(line: &str) -> bool {
    line.bytes().all(|b| b.is_ascii_whitespace())
}

/// Length of a URI scheme (including the colon) at the start of `text`.
///
/// A scheme is a letter followed by letters, digits, `+`, `-` or `.`, then
/// `:`. Single-letter schemes are rejected so DOS drive letters do not pass.
///
/// # Examples
///
/// ```
/// use wrap::line::uri_scheme_len;
///
/// assert_eq!(uri_scheme_len("https://example.com"), Some(6));
/// assert_eq!(uri_scheme_len("c:/tmp"), None);
/// assert_eq!(uri_scheme_len("no scheme"), None);
/// ```
#[must_use]
pub fn uri_scheme_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }
    let end = bytes
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')))?;
    (end >= 2 && bytes[end] == b':').then_some(end + 1)
}

/// Number of decimal digits in `n`.
#[must_use]
pub fn digit_count(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Overwrite the run of ASCII digits starting at byte `at` with `n`.
///
/// The tail of the line shifts left or right when the digit count changes.
/// Returns the signed change in line length.
///
/// # Examples
///
/// ```
/// use wrap::line::renumber;
///
/// let mut line = String::from("  9. item");
/// assert_eq!(renumber(&mut line, 2, 10), 1);
/// assert_eq!(line, "  10. item");
/// ```
pub fn renumber(line: &mut String, at: usize, n: u32) -> isize {
    let len = line.as_bytes()[at..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let digits = n.to_string();
    let delta = digits.len().cast_signed() - len.cast_signed();
    line.replace_range(at..at + len, &digits);
    delta
}

/// Longest common prefix of `a` and `b`, cut back to a character boundary.
#[must_use]
pub fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(end) {
        end -= 1;
    }
    &a[..end]
}

/// Strip a trailing `\n` or `\r\n`.
#[must_use]
pub fn chomp(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", 0, 0)]
    #[case("    x", 4, 4)]
    #[case("\tx", 4, 1)]
    #[case(" \tx", 4, 2)]
    #[case("   \t x", 5, 5)]
    #[case("\r\n", 0, 2)]
    fn measures_markdown_indent(#[case] line: &str, #[case] col: usize, #[case] byte: usize) {
        assert_eq!(indent_width(line, MARKDOWN_TAB_STOP), (col, byte));
    }

    #[test]
    fn tab_stop_is_configurable() {
        assert_eq!(indent_width("\tx", 8), (8, 1));
        assert_eq!(display_width("//\t", 8), 8);
    }

    #[rstest]
    #[case("mailto:a@b", Some(7))]
    #[case("ftp.x+y-z:", Some(10))]
    #[case("1http:", None)]
    #[case("http", None)]
    fn probes_uri_schemes(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(uri_scheme_len(text), expected);
    }

    #[rstest]
    #[case("10. x", 0, 9, "9. x", -1)]
    #[case("3) x", 0, 1, "1) x", 0)]
    #[case(" 99. x", 1, 100, " 100. x", 1)]
    fn renumbers_in_place(
        #[case] line: &str,
        #[case] at: usize,
        #[case] n: u32,
        #[case] expected: &str,
        #[case] delta: isize,
    ) {
        let mut buf = line.to_string();
        assert_eq!(renumber(&mut buf, at, n), delta);
        assert_eq!(buf, expected);
    }

    #[test]
    fn digit_counts() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(1000), 4);
    }

    #[test]
    fn common_prefix_respects_char_boundaries() {
        assert_eq!(common_prefix("#   a", "# b"), "# ");
        assert_eq!(common_prefix("é", "è"), "");
    }

    #[test]
    fn chomp_strips_line_endings() {
        assert_eq!(chomp("a\r\n"), "a");
        assert_eq!(chomp("a\n"), "a");
        assert_eq!(chomp("a"), "a");
    }
}
