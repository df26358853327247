//! Byte-level input and output seams between the engine and the outside world.

use std::collections::VecDeque;
use std::io::{self, BufWriter, Read, Write};

/// Produces input bytes for `,`.
pub trait ByteSource {
    /// Read one byte; `Ok(None)` means end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Consumes output bytes from `.`, in program order.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Push any buffered bytes out. Called before blocking on input and at the end of a run.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Collects output in memory.
impl ByteSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Serves queued bytes, then end of input.
impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pop_front())
    }
}

/// Always at end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Empty;

impl ByteSource for Empty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl ByteSink for Discard {
    fn write_byte(&mut self, _byte: u8) -> io::Result<()> {
        Ok(())
    }
}

/// Adapts any [`Read`] into a byte source, one byte per call.
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Adapts any [`Write`] into a buffered byte sink.
pub struct WriterSink<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: BufWriter::new(inner) }
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// The process's standard input.
pub fn stdin() -> ReaderSource<io::Stdin> {
    ReaderSource::new(io::stdin())
}

/// The process's standard output, buffered.
pub fn stdout() -> WriterSink<io::Stdout> {
    WriterSink::new(io::stdout())
}
