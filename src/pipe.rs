//! In-process byte pipes between the `wrapc` tasks.
//!
//! A pipe is a bounded channel of byte chunks. The writer half buffers small
//! writes into chunks, and the reader half exposes the chunks as a
//! [`BufRead`]. Dropping the writer signals end of input to the reader;
//! dropping the reader makes further writes fail with `BrokenPipe`.

use std::{
    io::{self, BufRead, Read, Write},
    sync::mpsc::{Receiver, SyncSender, sync_channel},
};

/// Bytes buffered before a chunk is sent.
const CHUNK_SIZE: usize = 8 * 1024;
/// Chunks in flight before the writer blocks.
const PIPE_DEPTH: usize = 16;

/// Create a connected writer/reader pair.
#[must_use]
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = sync_channel(PIPE_DEPTH);
    (
        PipeWriter {
            tx,
            buf: Vec::with_capacity(CHUNK_SIZE),
        },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Sending half of a [`pipe`].
#[derive(Debug)]
pub struct PipeWriter {
    tx: SyncSender<Vec<u8>>,
    buf: Vec<u8>,
}

impl PipeWriter {
    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE));
        self.tx
            .send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"))
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        // The reader may already be gone; nothing is left to report to.
        let _ = self.send_buffered();
    }
}

/// Receiving half of a [`pipe`].
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for PipeReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                // Every writer is gone: end of input.
                Err(_) => return Ok(&[]),
            }
        }
        Ok(&self.chunk[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.chunk.len());
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn carries_lines_across_threads() {
        let (mut writer, reader) = pipe();
        let handle = thread::spawn(move || {
            for idx in 0..2000 {
                writeln!(writer, "line {idx}").expect("write");
            }
        });
        let lines: Vec<String> = reader.lines().map(|l| l.expect("read")).collect();
        handle.join().expect("writer thread");
        assert_eq!(lines.len(), 2000);
        assert_eq!(lines[1999], "line 1999");
    }

    #[test]
    fn write_after_reader_drop_is_broken_pipe() {
        let (mut writer, reader) = pipe();
        drop(reader);
        writer.write_all(b"x").expect("buffered write");
        let err = writer.flush().expect_err("reader gone");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
