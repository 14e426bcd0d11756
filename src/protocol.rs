//! In-band control framing for the `wrapc` pipes.
//!
//! Payload bytes travel unchanged except that a literal DLE is doubled.
//! A control frame is `DLE ETB <kind> [params] LF`:
//!
//! | kind | params | meaning |
//! |---|---|---|
//! | `B` | | begin pass-through |
//! | `E` | | end pass-through |
//! | `P` | `<width> <hang>` | new comment block |
//! | `Z` | | end of stream |

use std::io::{BufRead, Write};

use crate::{Error, Result};

pub const DLE: u8 = 0x10;
pub const ETB: u8 = 0x03;

/// Control message carried between payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    BeginPass,
    EndPass,
    /// Start of a comment block with its body width and hang hints.
    Paragraph { width: usize, hang: usize },
    EndOfStream,
}

/// One decoded unit: unescaped payload or a control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Vec<u8>),
    Control(Control),
}

/// Writes escaped payload and control frames.
#[derive(Debug)]
pub struct Encoder<W: Write> {
    inner: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write payload bytes, doubling every DLE.
    ///
    /// # Errors
    ///
    /// Propagates write failures as [`Error::Io`].
    pub fn data(&mut self, bytes: &[u8]) -> Result<()> {
        for (idx, chunk) in bytes.split(|&b| b == DLE).enumerate() {
            if idx > 0 {
                self.inner.write_all(&[DLE, DLE])?;
            }
            self.inner.write_all(chunk)?;
        }
        Ok(())
    }

    /// Write one control frame.
    ///
    /// # Errors
    ///
    /// Propagates write failures as [`Error::Io`].
    pub fn control(&mut self, control: Control) -> Result<()> {
        self.inner.write_all(&[DLE, ETB])?;
        match control {
            Control::BeginPass => self.inner.write_all(b"B")?,
            Control::EndPass => self.inner.write_all(b"E")?,
            Control::Paragraph { width, hang } => write!(self.inner, "P {width} {hang}")?,
            Control::EndOfStream => self.inner.write_all(b"Z")?,
        }
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates flush failures as [`Error::Io`].
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads frames back from an encoded stream.
///
/// Payload is returned one input line at a time. A control frame that
/// follows payload on the same line is held back until the payload has
/// been returned.
#[derive(Debug)]
pub struct Decoder<R: BufRead> {
    inner: R,
    raw: Vec<u8>,
    pending: Option<Control>,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            raw: Vec::new(),
            pending: None,
        }
    }

    /// Next frame, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for a DLE that is not followed by ETB or
    /// DLE, an unknown control kind, or malformed parameters, and
    /// [`Error::Io`] when reading fails.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(control) = self.pending.take() {
            return Ok(Some(Frame::Control(control)));
        }
        self.raw.clear();
        if self.inner.read_until(b'\n', &mut self.raw)? == 0 {
            return Ok(None);
        }

        let mut data = Vec::with_capacity(self.raw.len());
        let mut idx = 0;
        while idx < self.raw.len() {
            let byte = self.raw[idx];
            if byte != DLE {
                data.push(byte);
                idx += 1;
                continue;
            }
            match self.raw.get(idx + 1) {
                Some(&DLE) => {
                    data.push(DLE);
                    idx += 2;
                }
                Some(&ETB) => {
                    let control = parse_control(&self.raw[idx + 2..])?;
                    if data.is_empty() {
                        return Ok(Some(Frame::Control(control)));
                    }
                    self.pending = Some(control);
                    return Ok(Some(Frame::Data(data)));
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "DLE followed by {}",
                        other.map_or_else(|| "end of input".to_string(), |b| format!("{b:#04x}"))
                    )));
                }
            }
        }
        Ok(Some(Frame::Data(data)))
    }
}

/// Parse `kind [params] LF` following `DLE ETB`.
fn parse_control(frame: &[u8]) -> Result<Control> {
    let Some(body) = frame.strip_suffix(b"\n") else {
        return Err(Error::Protocol("truncated control frame".into()));
    };
    let text = std::str::from_utf8(body)
        .map_err(|_| Error::Protocol("control frame is not ASCII".into()))?;
    let mut parts = text.split(' ');
    let control = match parts.next().unwrap_or_default() {
        "B" => Control::BeginPass,
        "E" => Control::EndPass,
        "Z" => Control::EndOfStream,
        "P" => {
            let mut param = |name: &str| {
                parts
                    .next()
                    .and_then(|p| p.parse::<usize>().ok())
                    .ok_or_else(|| Error::Protocol(format!("bad {name} in control frame {text:?}")))
            };
            let width = param("width")?;
            let hang = param("hang")?;
            Control::Paragraph { width, hang }
        }
        kind => return Err(Error::Protocol(format!("unknown control kind {kind:?}"))),
    };
    if parts.next().is_some() {
        return Err(Error::Protocol(format!("trailing parameters in {text:?}")));
    }
    Ok(control)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn encode(items: &[Frame]) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        for item in items {
            match item {
                Frame::Data(bytes) => encoder.data(bytes).expect("data"),
                Frame::Control(control) => encoder.control(*control).expect("control"),
            }
        }
        encoder.into_inner()
    }

    fn decode(bytes: &[u8]) -> Result<Vec<Frame>> {
        let mut decoder = Decoder::new(bytes);
        let mut out = Vec::new();
        while let Some(frame) = decoder.next_frame()? {
            out.push(frame);
        }
        Ok(out)
    }

    /// Join adjacent data frames and drop empty ones.
    fn normalize(frames: Vec<Frame>) -> Vec<Frame> {
        let mut out: Vec<Frame> = Vec::new();
        for frame in frames {
            if let Frame::Data(bytes) = &frame {
                if bytes.is_empty() {
                    continue;
                }
                if let Some(Frame::Data(prev)) = out.last_mut() {
                    prev.extend_from_slice(bytes);
                    continue;
                }
            }
            out.push(frame);
        }
        out
    }

    #[test]
    fn escapes_dle() {
        let bytes = encode(&[Frame::Data(vec![b'a', DLE, b'b'])]);
        assert_eq!(bytes, [b'a', DLE, DLE, b'b']);
    }

    #[test]
    fn control_frames_have_fixed_layout() {
        let bytes = encode(&[Frame::Control(Control::Paragraph { width: 72, hang: 3 })]);
        assert_eq!(bytes, b"\x10\x03P 72 3\n");
    }

    #[test]
    fn data_before_control_is_returned_first() {
        let frames = decode(b"tail\x10\x03Z\n").expect("decode");
        assert_eq!(
            frames,
            [
                Frame::Data(b"tail".to_vec()),
                Frame::Control(Control::EndOfStream),
            ]
        );
    }

    #[test]
    fn rejects_malformed_input() {
        let cases: [&[u8]; 7] = [
            b"a\x10b\n",
            b"a\x10",
            b"\x10\x03Q\n",
            b"\x10\x03P 1\n",
            b"\x10\x03P x 1\n",
            b"\x10\x03B",
            b"\x10\x03B extra\n",
        ];
        for bad in cases {
            assert!(
                matches!(decode(bad), Err(Error::Protocol(_))),
                "accepted {bad:?}"
            );
        }
    }

    fn control() -> impl Strategy<Value = Control> {
        prop_oneof![
            Just(Control::BeginPass),
            Just(Control::EndPass),
            Just(Control::EndOfStream),
            (0usize..500, 0usize..20).prop_map(|(width, hang)| Control::Paragraph { width, hang }),
        ]
    }

    fn frame() -> impl Strategy<Value = Frame> {
        prop_oneof![
            3 => prop::collection::vec(
                prop_oneof![Just(DLE), Just(ETB), Just(b'\n'), any::<u8>()],
                0..32,
            )
            .prop_map(Frame::Data),
            1 => control().prop_map(Frame::Control),
        ]
    }

    proptest! {
        #[test]
        fn round_trip_is_lossless(frames in prop::collection::vec(frame(), 0..16)) {
            let decoded = decode(&encode(&frames)).expect("decode");
            prop_assert_eq!(normalize(decoded), normalize(frames));
        }
    }
}
