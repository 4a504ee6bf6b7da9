#![forbid(unsafe_code)]
//! Abstract byte sinks and sources the codec writes to and reads from.
//!
//! The codec never sees a file or socket. It only needs "write these bytes"
//! and "fill this buffer", and reports a short read as a format error.

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::types::{CactusError, Result};

/// Destination for raw encoded bytes.
pub trait ByteSink {
    /// Appends `src` to the sink.
    fn write_bytes(&mut self, src: &[u8]) -> Result<()>;
}

/// Source of raw encoded bytes.
pub trait ByteSource {
    /// Fills `dst` completely or fails with [`CactusError::Format`] when the
    /// stream ends first.
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()>;
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        (**self).write_bytes(src)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        (**self).read_bytes(dst)
    }
}

impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.extend_from_slice(src);
        Ok(())
    }
}

impl ByteSink for BytesMut {
    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.put_slice(src);
        Ok(())
    }
}

impl ByteSource for Bytes {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        if self.remaining() < dst.len() {
            return Err(truncated(dst.len(), self.remaining()));
        }
        self.copy_to_slice(dst);
        Ok(())
    }
}

/// Cursor over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Creates a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns true once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let available = self.data.len() - self.pos;
        if available < dst.len() {
            return Err(truncated(dst.len(), available));
        }
        let end = self.pos + dst.len();
        dst.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }
}

/// Adapts any [`std::io::Write`] into a [`ByteSink`].
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
    written: u64,
}

impl<W: Write> IoSink<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Total bytes handed to the writer.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the wrapped writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.inner.write_all(src)?;
        self.written += src.len() as u64;
        Ok(())
    }
}

/// Adapts any [`std::io::Read`] into a [`ByteSource`].
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    read: u64,
}

impl<R: Read> IoSource<R> {
    /// Wraps a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, read: 0 }
    }

    /// Total bytes consumed from the reader.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(dst) {
            Ok(()) => {
                self.read += dst.len() as u64;
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(CactusError::Format(
                format!("stream truncated after {} bytes", self.read),
            )),
            Err(err) => Err(CactusError::Io(err)),
        }
    }
}

fn truncated(needed: usize, available: usize) -> CactusError {
    CactusError::Format(format!(
        "stream truncated (need {needed} bytes, have {available})"
    ))
}
