//! Marker and record framing.
//!
//! # Wire layout
//! ```text
//! block   = [len: i32] [payload: len bytes] [len: i32]
//! marker  = block with len == 4 whose payload is one i32   -> (4, n, 4)
//! record  = marker(n > 0) block { marker(n > 0) block }
//! ```
//! A record ends when the next marker is zero or negative; positive markers
//! after a block announce a continuation block of the same record.

use std::collections::VecDeque;
use std::io::{Read, Seek};

use log::trace;

use crate::op2::cursor::ByteCursor;
use crate::op2::trace::DebugSink;
use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::{Endian, Marker};
use crate::op2::utils;

/// How many markers are kept for error diagnostics.
const RECENT_MARKERS: usize = 8;

/// A framer position together with its marker history.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    offset: u64,
    recent: VecDeque<Marker>,
}

/// Interprets the marker/block protocol on top of a [`ByteCursor`].
///
/// The framer is the single owner of the byte source and of the session's
/// debug sink, so every boundary it crosses can be mirrored to the trace.
#[derive(Debug)]
pub struct RecordFramer<R> {
    cursor: ByteCursor<R>,
    trace: DebugSink,
    recent: VecDeque<Marker>,
}

impl<R: Read + Seek> RecordFramer<R> {
    pub fn new(cursor: ByteCursor<R>, trace: DebugSink) -> Self {
        RecordFramer {
            cursor,
            trace,
            recent: VecDeque::with_capacity(RECENT_MARKERS),
        }
    }

    pub fn endian(&self) -> Endian {
        self.cursor.endian()
    }

    pub fn tell(&self) -> u64 {
        self.cursor.tell()
    }

    /// Captures the position and marker history for a later [`restore`](Self::restore).
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.cursor.tell(),
            recent: self.recent.clone(),
        }
    }

    /// Undoes every read since `checkpoint`, marker history included.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.cursor.seek(checkpoint.offset)?;
        self.recent = checkpoint.recent;
        Ok(())
    }

    pub fn trace(&mut self) -> &mut DebugSink {
        &mut self.trace
    }

    /// Values of the most recently read markers, oldest first.
    pub fn recent_markers(&self) -> Vec<i32> {
        self.recent.iter().map(|m| m.value).collect()
    }

    /// Reads one `(4, n, 4)` marker and returns it without checking `n`.
    pub fn read_marker(&mut self) -> Result<Marker> {
        let offset = self.cursor.tell();
        let leading = self.cursor.read_i32()?;
        if leading != 4 {
            return Err(Op2Error::InvalidMarker { offset, length: leading });
        }
        let value = self.cursor.read_i32()?;
        let trailing = self.cursor.read_i32()?;
        if trailing != leading {
            return Err(Op2Error::BlockLengthMismatch { offset, leading, trailing });
        }

        let marker = Marker { offset, value };
        if self.recent.len() == RECENT_MARKERS {
            self.recent.pop_front();
        }
        self.recent.push_back(marker);
        trace!("marker [4, {}, 4] at {}", value, offset);
        Ok(marker)
    }

    /// Reads one marker per expected value, failing on the first disagreement.
    pub fn read_markers(&mut self, expected: &[i32]) -> Result<()> {
        for &value in expected {
            let marker = self.read_marker()?;
            if marker.value != value {
                return Err(Op2Error::MarkerMismatch {
                    offset: marker.offset,
                    expected: value,
                    actual: marker.value,
                });
            }
        }
        self.trace.line(format_args!("---markers = {:?}---", expected));
        Ok(())
    }

    /// Reads `n` markers and restores the position.
    pub fn peek_markers(&mut self, n: usize) -> Result<Vec<i32>> {
        let checkpoint = self.checkpoint();
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            values.push(self.read_marker()?.value);
        }
        self.restore(checkpoint)?;
        Ok(values)
    }

    /// Value of the next marker, without consuming it.
    pub fn peek_marker(&mut self) -> Result<i32> {
        let values = self.peek_markers(1)?;
        Ok(values[0])
    }

    /// Reads one length-prefixed block, validating the duplicated length.
    pub fn read_block(&mut self) -> Result<Vec<u8>> {
        let offset = self.cursor.tell();
        let leading = self.read_block_length(offset)?;
        let data = self.cursor.read(leading as usize)?;
        let trailing = self.cursor.read_i32()?;
        if trailing != leading {
            return Err(Op2Error::BlockLengthMismatch { offset, leading, trailing });
        }
        trace!("block of {} bytes at {}", leading, offset);
        Ok(data)
    }

    /// Advances past one block without materializing its payload.
    /// Returns the payload length.
    pub fn skip_block(&mut self) -> Result<u64> {
        let offset = self.cursor.tell();
        let leading = self.read_block_length(offset)?;
        self.cursor.skip(leading as u64)?;
        let trailing = self.cursor.read_i32()?;
        if trailing != leading {
            return Err(Op2Error::BlockLengthMismatch { offset, leading, trailing });
        }
        trace!("skipped block of {} bytes at {}", leading, offset);
        Ok(leading as u64)
    }

    /// Reads one logical record, concatenating continuation blocks.
    pub fn read_record(&mut self) -> Result<Vec<u8>> {
        let offset = self.cursor.tell();
        self.read_marker()?;
        let mut data = self.read_block()?;
        let mut nblocks = 1;
        while self.peek_marker()? > 0 {
            self.read_marker()?;
            let more = self.read_block()?;
            data.extend_from_slice(&more);
            nblocks += 1;
        }
        if self.trace.is_enabled() {
            self.trace.line(format_args!(
                "  record at {}: {} bytes in {} block(s) [{}]",
                offset,
                data.len(),
                nblocks,
                utils::hex_preview(&data, 32)
            ));
        }
        Ok(data)
    }

    /// Skips one logical record. Returns the total payload length.
    pub fn skip_record(&mut self) -> Result<u64> {
        let offset = self.cursor.tell();
        self.read_marker()?;
        let mut total = self.skip_block()?;
        while self.peek_marker()? > 0 {
            self.read_marker()?;
            total += self.skip_block()?;
        }
        self.trace
            .line(format_args!("  skipped record at {}: {} bytes", offset, total));
        Ok(total)
    }

    /// Reads `n` raw bytes with no framing interpretation.
    pub fn read_raw(&mut self, n: usize) -> Result<Vec<u8>> {
        self.cursor.read(n)
    }

    /// Releases the debug sink. Called exactly once when a session ends.
    pub fn close_trace(&mut self) {
        self.trace.close();
    }

    /// Closes the trace and hands the source back at the current offset.
    pub fn into_inner(mut self) -> R {
        self.trace.close();
        self.cursor.into_inner()
    }

    fn read_block_length(&mut self, offset: u64) -> Result<i32> {
        let length = self.cursor.read_i32()?;
        if length < 0 {
            return Err(Op2Error::FatalStream {
                offset,
                reason: format!("negative block length {}", length),
            });
        }
        Ok(length)
    }
}
