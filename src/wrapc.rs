//! Comment reformatting pipeline behind the `wrapc` binary.
//!
//! Three tasks run on scoped threads:
//!
//! - the **detector** (calling thread) splits each input line into its
//!   comment decoration and body, sends bodies down the body pipe, and
//!   describes each block's decoration on a separate descriptor channel;
//! - the **worker** reflows each comment block with a fresh
//!   [`Formatter`] and echoes pass-through bytes and control frames;
//! - the **decorator** puts the decoration back and writes the output.
//!
//! Both pipes carry [`crate::protocol`] frames, so pass-through text and
//! wrapped bodies stay in input order.

use std::{
    io::{BufRead, Write},
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use log::{debug, trace};

use crate::{
    Error, Result,
    comment::{Comment, CommentDelimMap, detect, detect_continuation},
    line::{chomp, common_prefix, display_width, is_blank},
    pipe::{PipeReader, PipeWriter, pipe},
    protocol::{Control, Decoder, Encoder, Frame},
    wrap::{Formatter, WrapOptions},
};

/// Settings for one `wrapc` run.
#[derive(Debug, Clone, Default)]
pub struct WrapcOptions {
    /// Body formatting; `width` is the full output width unless
    /// `body_width` is set.
    pub wrap: WrapOptions,
    pub delimiters: CommentDelimMap,
    /// `width` counts the comment body only.
    pub body_width: bool,
}

/// Decoration of one comment block, sent from the detector to the decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decor {
    Begin {
        first_prefix: String,
        cont_prefix: String,
    },
    End {
        suffix: String,
    },
}

/// Reformat the comments in `input` onto `output`.
///
/// # Errors
///
/// Returns the most severe error among the three tasks: I/O failures,
/// protocol errors on the internal pipes, or [`Error::Os`] when a thread
/// cannot be spawned or panics.
///
/// # Examples
///
/// ```
/// use wrap::wrapc::{WrapcOptions, run};
///
/// let mut options = WrapcOptions::default();
/// options.wrap.width = 20;
/// let mut out = Vec::new();
/// run(&b"fn x() {}\n# one two three four five\n"[..], &mut out, &options)?;
/// assert_eq!(
///     String::from_utf8_lossy(&out),
///     "fn x() {}\n# one two three four\n# five\n"
/// );
/// # Ok::<(), wrap::Error>(())
/// ```
pub fn run<R, W>(input: R, output: W, options: &WrapcOptions) -> Result<()>
where
    R: BufRead,
    W: Write + Send,
{
    let (body_writer, body_reader) = pipe();
    let (wrapped_writer, wrapped_reader) = pipe();
    let (decor_tx, decor_rx) = mpsc::channel();

    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("wrapc-worker".into())
            .spawn_scoped(scope, || work(body_reader, wrapped_writer, &options.wrap))
            .map_err(|e| Error::Os(format!("cannot start wrap worker: {e}")))?;
        let decorator = thread::Builder::new()
            .name("wrapc-decorator".into())
            .spawn_scoped(scope, || decorate(wrapped_reader, decor_rx, output))
            .map_err(|e| Error::Os(format!("cannot start decorator: {e}")))?;

        let detected = Detector::new(options, Encoder::new(body_writer), decor_tx).run(input);

        let mut errors = Vec::new();
        if let Err(err) = detected {
            errors.push(err);
        }
        for (task, handle) in [("wrap worker", worker), ("decorator", decorator)] {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => errors.push(Error::Child {
                    task,
                    source: Box::new(err),
                }),
                Err(_) => errors.push(Error::Os(format!("{task} panicked"))),
            }
        }
        Error::worst(errors).map_or(Ok(()), Err)
    })
}

/// Comment block being collected by the detector.
#[derive(Debug)]
struct Block {
    indent: String,
    delim: String,
    cont_prefix: String,
    style: Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    /// Every line starts with the delimiter.
    Line,
    /// `/* … */` or `(* … *)` with a ` * ` column.
    Boxed,
    /// Block comment whose body lines carry no decoration; holds the closer.
    Bare(&'static str),
}

#[derive(Debug)]
enum State {
    Outside,
    /// First line of a block, waiting for the second to fix the prefix.
    Starting {
        line: String,
    },
    Inside(Block),
}

struct Detector<'a> {
    options: &'a WrapcOptions,
    body: Encoder<PipeWriter>,
    decor: Sender<Decor>,
    state: State,
    passing: bool,
}

impl<'a> Detector<'a> {
    fn new(options: &'a WrapcOptions, body: Encoder<PipeWriter>, decor: Sender<Decor>) -> Self {
        Self {
            options,
            body,
            decor,
            state: State::Outside,
            passing: false,
        }
    }

    fn run<R: BufRead>(mut self, mut input: R) -> Result<()> {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if input.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            self.line(&raw)?;
        }
        match std::mem::replace(&mut self.state, State::Outside) {
            State::Starting { line } => self.single(&line)?,
            State::Inside(_) => self.end_block("")?,
            State::Outside => {}
        }
        self.pass_mode(false)?;
        self.body.control(Control::EndOfStream)?;
        self.body.flush()
    }

    fn line(&mut self, raw: &[u8]) -> Result<()> {
        let lossy = String::from_utf8_lossy(raw);
        let text = chomp(&lossy);
        match std::mem::replace(&mut self.state, State::Outside) {
            State::Inside(block) => {
                if self.continue_block(block, text)? {
                    return Ok(());
                }
            }
            State::Starting { line } => {
                if self.second_line(&line, text)? {
                    return Ok(());
                }
            }
            State::Outside => {}
        }

        match detect(text, &self.options.delimiters) {
            Some(comment) if comment.suffix.is_empty() => {
                self.state = State::Starting {
                    line: text.to_string(),
                };
                Ok(())
            }
            Some(_) => self.single(text),
            None => {
                self.pass_mode(true)?;
                self.body.data(raw)
            }
        }
    }

    /// Handle the line after a block's first line.
    ///
    /// Returns `true` when `text` was consumed.
    fn second_line(&mut self, first_line: &str, text: &str) -> Result<bool> {
        let Some(first) = detect(first_line, &self.options.delimiters) else {
            return Ok(false);
        };
        if let Some(closer) = first.closer() {
            return match detect_continuation(text, first.delim) {
                Some(lone) if lone.delim.is_empty() => {
                    self.single(first_line)?;
                    self.pass_line(text)?;
                    Ok(true)
                }
                Some(second) => {
                    let block = Block {
                        indent: first.indent.to_string(),
                        delim: first.delim.to_string(),
                        cont_prefix: second.prefix(),
                        style: Style::Boxed,
                    };
                    self.begin(&first.prefix(), &block.cont_prefix)?;
                    self.send_body(first.body)?;
                    self.state = State::Inside(block);
                    self.box_line(second)?;
                    Ok(true)
                }
                None => {
                    self.bare_block(first_line, &first, closer, text)?;
                    Ok(true)
                }
            };
        }

        let Some(second) = detect(text, &self.options.delimiters)
            .filter(|c| c.indent == first.indent && c.delim == first.delim && c.suffix.is_empty())
        else {
            self.single(first_line)?;
            return Ok(false);
        };
        let prefix = common_prefix(&first.prefix(), &second.prefix()).to_string();
        debug!("comment block with prefix {prefix:?}");
        self.begin(&prefix, &prefix)?;
        self.send_body(strip_prefix(first_line, &prefix, &first))?;
        self.send_body(strip_prefix(text, &prefix, &second))?;
        self.state = State::Inside(Block {
            indent: first.indent.to_string(),
            delim: first.delim.to_string(),
            cont_prefix: prefix,
            style: Style::Line,
        });
        Ok(true)
    }

    /// Returns `true` when `text` continues `block`.
    fn continue_block(&mut self, block: Block, text: &str) -> Result<bool> {
        if let Style::Bare(closer) = block.style {
            self.bare_line(block, closer, text)?;
            return Ok(true);
        }
        if block.style == Style::Boxed {
            return match detect_continuation(text, &block.delim) {
                Some(lone) if lone.delim.is_empty() => {
                    self.end_block("")?;
                    self.pass_line(text)?;
                    Ok(true)
                }
                Some(comment) => {
                    let body = strip_prefix(text, &block.cont_prefix, &comment);
                    self.state = State::Inside(block);
                    self.send_body(body)?;
                    if !comment.suffix.is_empty() {
                        self.end_block(comment.suffix)?;
                    }
                    Ok(true)
                }
                None => {
                    self.end_block("")?;
                    Ok(false)
                }
            };
        }
        match detect(text, &self.options.delimiters) {
            Some(comment)
                if comment.indent == block.indent
                    && comment.delim == block.delim
                    && comment.suffix.is_empty() =>
            {
                let body = strip_prefix(text, &block.cont_prefix, &comment);
                self.state = State::Inside(block);
                self.send_body(body)?;
                Ok(true)
            }
            _ => {
                self.end_block("")?;
                Ok(false)
            }
        }
    }

    /// Open a block comment whose second line has no ` * ` column.
    ///
    /// Body lines continue at the second line's indentation. An opener with
    /// no text of its own passes through on its own line.
    fn bare_block(
        &mut self,
        first_line: &str,
        first: &Comment<'_>,
        closer: &'static str,
        text: &str,
    ) -> Result<()> {
        let cont_prefix = if is_blank(text) {
            first.indent.to_string()
        } else {
            text[..text.len() - text.trim_start_matches([' ', '\t']).len()].to_string()
        };
        debug!("bare block comment, continuation {cont_prefix:?}");
        if first.body.is_empty() {
            self.pass_line(first_line)?;
            self.begin(&cont_prefix, &cont_prefix)?;
        } else {
            self.begin(&first.prefix(), &cont_prefix)?;
            self.send_body(first.body)?;
        }
        let block = Block {
            indent: first.indent.to_string(),
            delim: first.delim.to_string(),
            cont_prefix,
            style: Style::Bare(closer),
        };
        self.bare_line(block, closer, text)
    }

    /// Body line of a bare block; a trailing `closer` ends the block.
    fn bare_line(&mut self, block: Block, closer: &str, text: &str) -> Result<()> {
        let body = text
            .strip_prefix(block.cont_prefix.as_str())
            .unwrap_or_else(|| text.trim_start())
            .trim_end();
        match body.strip_suffix(closer) {
            Some(inner) if is_blank(inner) => {
                self.end_block("")?;
                self.pass_line(text)
            }
            Some(inner) => {
                self.send_body(inner)?;
                self.end_block(closer)
            }
            None => {
                self.state = State::Inside(block);
                self.send_body(body)
            }
        }
    }

    /// Second line of a box block, which may also close it.
    fn box_line(&mut self, comment: Comment<'_>) -> Result<()> {
        self.send_body(comment.body)?;
        if !comment.suffix.is_empty() {
            self.end_block(comment.suffix)?;
        }
        Ok(())
    }

    /// A block made of one line.
    fn single(&mut self, text: &str) -> Result<()> {
        let Some(comment) = detect(text, &self.options.delimiters) else {
            return self.pass_line(text);
        };
        let prefix = comment.prefix();
        let cont = if comment.closer().is_some() {
            format!("{} * ", comment.indent)
        } else {
            prefix.clone()
        };
        self.begin(&prefix, &cont)?;
        self.send_body(comment.body)?;
        self.end_block(comment.suffix)
    }

    fn begin(&mut self, first_prefix: &str, cont_prefix: &str) -> Result<()> {
        self.pass_mode(false)?;
        let wrap = &self.options.wrap;
        let width = if self.options.body_width {
            wrap.width
        } else {
            let tab = wrap.tab_width;
            let widest = display_width(first_prefix, tab).max(display_width(cont_prefix, tab));
            wrap.width.saturating_sub(widest).max(1)
        };
        trace!("begin block {first_prefix:?}/{cont_prefix:?}, body width {width}");
        self.decor
            .send(Decor::Begin {
                first_prefix: first_prefix.to_string(),
                cont_prefix: cont_prefix.to_string(),
            })
            .map_err(|_| Error::Protocol("decorator hung up".into()))?;
        self.body.control(Control::Paragraph {
            width,
            hang: wrap.hang_indent,
        })
    }

    fn end_block(&mut self, suffix: &str) -> Result<()> {
        self.state = State::Outside;
        self.decor
            .send(Decor::End {
                suffix: suffix.to_string(),
            })
            .map_err(|_| Error::Protocol("decorator hung up".into()))
    }

    fn send_body(&mut self, body: &str) -> Result<()> {
        self.body.data(body.trim_end().as_bytes())?;
        self.body.data(b"\n")
    }

    fn pass_line(&mut self, text: &str) -> Result<()> {
        self.pass_mode(true)?;
        self.body.data(text.as_bytes())?;
        self.body.data(b"\n")
    }

    fn pass_mode(&mut self, on: bool) -> Result<()> {
        if self.passing == on {
            return Ok(());
        }
        self.passing = on;
        self.body.control(if on {
            Control::BeginPass
        } else {
            Control::EndPass
        })
    }
}

/// Body of `line` once the block's canonical `prefix` is removed.
///
/// Lines whose padding is shorter than the prefix's fall back to the
/// detected body.
fn strip_prefix<'a>(line: &'a str, prefix: &str, comment: &Comment<'a>) -> &'a str {
    line.strip_prefix(prefix).unwrap_or(comment.body)
}

/// Wrap worker: reflow block bodies and echo everything else.
fn work(input: PipeReader, output: PipeWriter, base: &WrapOptions) -> Result<()> {
    let mut decoder = Decoder::new(input);
    let mut encoder = Encoder::new(output);
    let mut formatter: Option<Formatter> = None;
    while let Some(frame) = decoder.next_frame()? {
        match frame {
            Frame::Data(bytes) => match formatter.as_mut() {
                Some(formatter) => {
                    formatter.push_line(chomp(&String::from_utf8_lossy(&bytes)));
                    emit(&mut encoder, formatter)?;
                }
                None => encoder.data(&bytes)?,
            },
            Frame::Control(control) => {
                if let Some(mut done) = formatter.take() {
                    done.finish();
                    emit(&mut encoder, &mut done)?;
                }
                encoder.control(control)?;
                match control {
                    Control::Paragraph { width, hang } => {
                        formatter = Some(Formatter::new(WrapOptions {
                            width,
                            hang_indent: hang,
                            left_margin: 0,
                            ..base.clone()
                        }));
                    }
                    Control::EndOfStream => break,
                    Control::BeginPass | Control::EndPass => {}
                }
            }
        }
    }
    encoder.flush()
}

fn emit(encoder: &mut Encoder<PipeWriter>, formatter: &mut Formatter) -> Result<()> {
    for line in formatter.drain() {
        encoder.data(line.as_bytes())?;
        encoder.data(b"\n")?;
    }
    Ok(())
}

/// Wrapped block being decorated; one line is held back so the closing
/// suffix can go on the last line.
struct Decorated {
    first_prefix: String,
    cont_prefix: String,
    pending: Option<String>,
    written: usize,
}

impl Decorated {
    fn push<W: Write>(&mut self, out: &mut W, line: String) -> Result<()> {
        if let Some(prev) = self.pending.replace(line) {
            self.write(out, &prev, "")?;
        }
        Ok(())
    }

    fn finish<W: Write>(mut self, out: &mut W, suffix: &str) -> Result<()> {
        match self.pending.take() {
            Some(last) => self.write(out, &last, suffix),
            None if !suffix.is_empty() => self.write(out, "", suffix),
            None => Ok(()),
        }
    }

    fn write<W: Write>(&mut self, out: &mut W, body: &str, suffix: &str) -> Result<()> {
        let prefix = if self.written == 0 {
            &self.first_prefix
        } else {
            &self.cont_prefix
        };
        self.written += 1;
        let mut line = if body.is_empty() {
            prefix.trim_end().to_string()
        } else {
            format!("{prefix}{body}")
        };
        if !suffix.is_empty() {
            line.push(' ');
            line.push_str(suffix);
        }
        writeln!(out, "{line}")?;
        Ok(())
    }
}

fn expect_decor(decor: &Receiver<Decor>) -> Result<Decor> {
    decor
        .recv()
        .map_err(|_| Error::Protocol("missing comment block descriptor".into()))
}

/// Decorator: restore prefixes and suffixes around wrapped bodies.
fn decorate<W: Write>(input: PipeReader, decor: Receiver<Decor>, mut out: W) -> Result<()> {
    let mut decoder = Decoder::new(input);
    let mut block: Option<Decorated> = None;
    while let Some(frame) = decoder.next_frame()? {
        match frame {
            Frame::Data(bytes) => match block.as_mut() {
                Some(block) => {
                    let line = String::from_utf8_lossy(&bytes);
                    block.push(&mut out, chomp(&line).to_string())?;
                }
                None => out.write_all(&bytes)?,
            },
            Frame::Control(control) => {
                if let Some(done) = block.take() {
                    let Decor::End { suffix } = expect_decor(&decor)? else {
                        return Err(Error::Protocol("block descriptors out of order".into()));
                    };
                    done.finish(&mut out, &suffix)?;
                }
                match control {
                    Control::Paragraph { .. } => {
                        let Decor::Begin {
                            first_prefix,
                            cont_prefix,
                        } = expect_decor(&decor)?
                        else {
                            return Err(Error::Protocol("block descriptors out of order".into()));
                        };
                        block = Some(Decorated {
                            first_prefix,
                            cont_prefix,
                            pending: None,
                            written: 0,
                        });
                    }
                    Control::EndOfStream => break,
                    Control::BeginPass | Control::EndPass => {}
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn wrapc(input: &str, width: usize) -> String {
        let mut options = WrapcOptions::default();
        options.wrap.width = width;
        let mut out = Vec::new();
        run(input.as_bytes(), &mut out, &options).expect("wrapc");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn wraps_line_comment_to_width() {
        let out = wrapc(
            "  // hello world, this is a long comment that should wrap\n",
            40,
        );
        assert_eq!(out, "  // hello world, this is a long comment\n  // that should wrap\n");
    }

    #[test]
    fn code_passes_through_untouched() {
        let input = "fn main() {\r\n    let x = 1; // trailing\r\n}";
        assert_eq!(wrapc(input, 20), input);
    }

    #[test]
    fn joins_short_comment_lines() {
        let out = wrapc("# one\n# two\n#\n# three\ncode\n", 80);
        assert_eq!(out, "# one two\n#\n# three\ncode\n");
    }

    #[test]
    fn extra_padding_stays_in_body() {
        let out = wrapc("#   indented\n# plain\n", 80);
        assert_eq!(out, "#   indented plain\n");
    }

    #[test]
    fn box_comment_keeps_decoration() {
        let input = "/* alpha beta\n * gamma delta epsilon\n */\n";
        assert_eq!(
            wrapc(input, 20),
            "/* alpha beta gamma\n * delta epsilon\n */\n"
        );
    }

    #[test]
    fn single_line_block_keeps_suffix() {
        assert_eq!(
            wrapc("/* one two three four */\n", 16),
            "/* one two three\n * four */\n"
        );
    }

    #[test]
    fn bare_block_after_opener_text() {
        let input = "/* start of a long comment\n   continued body text here\n*/\n";
        assert_eq!(
            wrapc(input, 16),
            "/* start of a\n   long comment\n   continued\n   body text\n   here\n*/\n"
        );
    }

    #[test]
    fn bare_block_under_lone_opener() {
        let input = "/*\n  alpha beta gamma delta\n*/\nint x;\n";
        assert_eq!(
            wrapc(input, 12),
            "/*\n  alpha beta\n  gamma\n  delta\n*/\nint x;\n"
        );
    }

    #[test]
    fn bare_block_closer_ends_text_line() {
        let input = "(* one two three\n   four five *)\nlet x = 1\n";
        assert_eq!(
            wrapc(input, 12),
            "(* one two\n   three\n   four five *)\nlet x = 1\n"
        );
    }

    #[rstest]
    #[case("")]
    #[case("no comments here\n")]
    #[case("#!/bin/sh\nexit 0\n")]
    fn comment_free_input_is_unchanged(#[case] input: &str) {
        assert_eq!(wrapc(input, 10), input);
    }

    #[test]
    fn body_width_ignores_prefix() {
        let mut options = WrapcOptions::default();
        options.wrap.width = 10;
        options.body_width = true;
        let mut out = Vec::new();
        run(&b"    # aaaa bbbb cccc\n"[..], &mut out, &options).expect("wrapc");
        assert_eq!(out, b"    # aaaa bbbb\n    # cccc\n");
    }

    #[test]
    fn output_is_reproducible() {
        let input = "x\n# a b c d e f g h i j\n# k l\ny\n// m n o p\n";
        assert_eq!(wrapc(input, 12), wrapc(input, 12));
    }
}
