#![forbid(unsafe_code)]
//! Running checksums and the sink/source adapters that feed them.

use crate::primitives::io::{ByteSink, ByteSource};
use crate::types::Result;

/// Incremental 32-bit checksum.
pub trait Checksum {
    /// Clears all accumulated state.
    fn reset(&mut self);
    /// Feeds `bytes` into the checksum.
    fn update(&mut self, bytes: &[u8]);
    /// Returns the checksum of everything fed so far without consuming it.
    fn finalize(&self) -> u32;
}

/// CRC32 (IEEE) backed by `crc32fast`.
pub struct Crc32Fast {
    inner: crc32fast::Hasher,
}

impl Default for Crc32Fast {
    fn default() -> Self {
        Self {
            inner: crc32fast::Hasher::new(),
        }
    }
}

impl Checksum for Crc32Fast {
    fn reset(&mut self) {
        self.inner.reset();
    }

    fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    fn finalize(&self) -> u32 {
        self.inner.clone().finalize()
    }
}

/// Sink adapter that feeds every written byte through a checksum.
pub struct ChecksumSink<'a, S: ?Sized, C = Crc32Fast> {
    inner: &'a mut S,
    checksum: C,
}

impl<'a, S: ByteSink + ?Sized> ChecksumSink<'a, S> {
    /// Wraps `inner` with a fresh CRC32.
    pub fn new(inner: &'a mut S) -> Self {
        Self {
            inner,
            checksum: Crc32Fast::default(),
        }
    }
}

impl<'a, S: ByteSink + ?Sized, C: Checksum> ChecksumSink<'a, S, C> {
    /// Checksum of the bytes seen so far.
    pub fn checksum(&self) -> u32 {
        self.checksum.finalize()
    }

    /// Returns the wrapped stream, bypassing the checksum from here on.
    pub fn into_inner(self) -> &'a mut S {
        self.inner
    }
}

impl<S: ByteSink + ?Sized, C: Checksum> ByteSink for ChecksumSink<'_, S, C> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.inner.write_bytes(src)?;
        self.checksum.update(src);
        Ok(())
    }
}

/// Source adapter that checksums every byte handed to the caller.
pub struct ChecksumSource<'a, S: ?Sized, C = Crc32Fast> {
    inner: &'a mut S,
    checksum: C,
}

impl<'a, S: ByteSource + ?Sized> ChecksumSource<'a, S> {
    /// Wraps `inner` with a fresh CRC32.
    pub fn new(inner: &'a mut S) -> Self {
        Self {
            inner,
            checksum: Crc32Fast::default(),
        }
    }
}

impl<'a, S: ByteSource + ?Sized, C: Checksum> ChecksumSource<'a, S, C> {
    /// Checksum of the bytes seen so far.
    pub fn checksum(&self) -> u32 {
        self.checksum.finalize()
    }

    /// Returns the wrapped stream, bypassing the checksum from here on.
    pub fn into_inner(self) -> &'a mut S {
        self.inner
    }
}

impl<S: ByteSource + ?Sized, C: Checksum> ByteSource for ChecksumSource<'_, S, C> {
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        self.inner.read_bytes(dst)?;
        self.checksum.update(dst);
        Ok(())
    }
}
