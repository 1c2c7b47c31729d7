//! Positioned byte access over a seekable source.
//!
//! [`ByteCursor`] owns the byte source and the absolute read offset. It knows
//! nothing about markers or records; it only guarantees that every read is
//! either complete or reported as a [`Op2Error::TruncatedStream`] with the
//! offset it happened at.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use log::{debug, trace};

use super::types::error::{Op2Error, Result};
use super::types::models::Endian;

#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    offset: u64,
    len: u64,
    endian: Endian,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wraps a source at its current position.
    ///
    /// The source may already be partially consumed: reading resumes from
    /// wherever it stands. When `endian` is `None`, the byte order is detected
    /// from the next word, which must be the length (4) of a marker block.
    pub fn open(mut inner: R, endian: Option<Endian>) -> Result<Self> {
        let offset = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(offset))?;

        let mut cursor = ByteCursor {
            inner,
            offset,
            len,
            endian: Endian::Little,
        };

        cursor.endian = match endian {
            Some(endian) => endian,
            None => {
                let first = cursor.peek(4)?;
                let word = [first[0], first[1], first[2], first[3]];
                Endian::detect(word).ok_or(Op2Error::UnknownEndianness {
                    first_word: u32::from_be_bytes(word),
                })?
            }
        };
        debug!(
            "Opened byte cursor at offset {} of {} bytes ({})",
            offset, len, cursor.endian
        );
        Ok(cursor)
    }

    /// Reads exactly `n` bytes.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Fills `buf` completely or fails without a partial advance being reported.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure_available(buf.len() as u64)?;
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                // The source shrank under us; report it like any other truncation.
                self.inner.seek(SeekFrom::Start(self.offset))?;
                Err(Op2Error::TruncatedStream {
                    offset: self.offset,
                    needed: buf.len() as u64,
                    available: 0,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads one 32-bit signed integer in the session byte order.
    pub fn read_i32(&mut self) -> Result<i32> {
        let mut word = [0u8; 4];
        self.read_into(&mut word)?;
        Ok(self.endian.read_i32(&word))
    }

    /// Reads `n` bytes and restores the position.
    pub fn peek(&mut self, n: usize) -> Result<Vec<u8>> {
        let start = self.offset;
        let data = self.read(n)?;
        self.seek(start)?;
        Ok(data)
    }

    /// Advances past `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.ensure_available(n)?;
        let target = self.offset + n;
        self.seek(target)
    }

    /// Moves to an absolute offset inside the stream.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(Op2Error::FatalStream {
                offset: self.offset,
                reason: format!("seek to {} past end of stream ({} bytes)", offset, self.len),
            });
        }
        // Relative moves let a buffered source keep its buffer.
        let delta = offset as i64 - self.offset as i64;
        self.inner.seek_relative(delta)?;
        trace!("seek {} -> {}", self.offset, offset);
        self.offset = offset;
        Ok(())
    }

    /// Current absolute offset.
    pub fn tell(&self) -> u64 {
        self.offset
    }

    /// Bytes left between the current offset and the end of the stream.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.offset)
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Hands the source back, positioned at the current offset.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn ensure_available(&self, needed: u64) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(Op2Error::TruncatedStream {
                offset: self.offset,
                needed,
                available,
            });
        }
        Ok(())
    }
}
