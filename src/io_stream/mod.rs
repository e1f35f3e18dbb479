//! Logical streams over a block-scattered byte source.
//!
//! An [`MsfStream`] presents one stream of the container as a contiguous,
//! read-only byte sequence.  Its bytes live in fixed-size blocks that may sit
//! anywhere in the source, in any order, interleaved with other streams.
//!
//! # Reads
//! A read at logical position `P` is split at block boundaries: each piece
//! is translated through the stream's [`BlockList`] and issued as one
//! positional read against the source.  Consecutive logical blocks are never
//! assumed to be physically adjacent.  A piece that comes back short (the
//! source ended early) stops the read, and the bytes gathered so far are
//! returned.
//!
//! # Cursor
//! Each stream owns its cursor.  Physical reads never touch a shared cursor
//! (see [`ByteSource`]), so streams cloned from one another, or opened from the
//! same source, do not interfere.  Seeking performs no clamping: a position
//! past the end is legal and simply reads as end-of-stream.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use tracing::trace;

use crate::block::BlockList;
use crate::error::{MsfError, Result};
use crate::source::ByteSource;

/// Result of a cursor read that tells "nothing left" apart from "nothing asked".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes copied.  Zero only for an empty request or a source that ended
    /// before the stream's declared length.
    Read(usize),
    /// The cursor is at or past the logical end.
    EndOfStream,
}

pub struct MsfStream<S> {
    source:   Arc<S>,
    blocks:   BlockList,
    length:   u64,
    position: u64,
    nil:      bool,
}

impl<S: ByteSource> MsfStream<S> {
    /// Build a stream over `blocks`.  Returns `None` if the blocks cannot hold
    /// `length` bytes.
    pub fn with_blocks(source: Arc<S>, blocks: BlockList, length: u64) -> Option<Self> {
        if blocks.capacity() < length {
            return None;
        }
        Some(Self { source, blocks, length, position: 0, nil: false })
    }

    /// A deleted stream: no blocks, length zero.
    pub(crate) fn nil(source: Arc<S>, block_size: u32) -> Self {
        Self {
            source,
            blocks:   BlockList::empty(block_size),
            length:   0,
            position: 0,
            nil:      true,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True if the directory marked this stream as deleted.
    pub fn is_nil(&self) -> bool {
        self.nil
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn block_size(&self) -> u64 {
        self.blocks.block_size()
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Positional read: copy bytes starting at logical `pos` without touching
    /// the cursor.  Returns 0 at or past the logical end.
    pub fn read_at(&self, pos: u64, buf: &mut [u8]) -> io::Result<usize> {
        if pos >= self.length || buf.is_empty() {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(self.length - pos) as usize;
        let mut done = 0usize;

        while done < want {
            let logical = pos + done as u64;
            let span = match self.blocks.translate(logical) {
                Some(s) => s,
                None    => break,
            };
            let piece = span.remaining.min((want - done) as u64) as usize;
            trace!(logical, physical = span.physical, len = piece, "msf sub-read");

            let n = self.source.read_full_at(span.physical, &mut buf[done..done + piece])?;
            done += n;
            if n < piece {
                break;
            }
        }
        Ok(done)
    }

    /// Cursor read.  Advances the position by the number of bytes copied.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        if buf.is_empty() {
            return Ok(ReadOutcome::Read(0));
        }
        if self.position >= self.length {
            return Ok(ReadOutcome::EndOfStream);
        }
        let n = self.read_at(self.position, buf)?;
        self.position += n as u64;
        Ok(ReadOutcome::Read(n))
    }

    /// Streams are read-only.
    pub fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(MsfError::Unsupported)
    }
}

impl<S> Clone for MsfStream<S> {
    fn clone(&self) -> Self {
        Self {
            source:   Arc::clone(&self.source),
            blocks:   self.blocks.clone(),
            length:   self.length,
            position: self.position,
            nil:      self.nil,
        }
    }
}

impl<S> fmt::Debug for MsfStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsfStream")
            .field("length", &self.length)
            .field("position", &self.position)
            .field("block_size", &self.blocks.block_size())
            .field("blocks", &self.blocks.len())
            .field("nil", &self.nil)
            .finish()
    }
}

// ── std::io ──────────────────────────────────────────────────────────────────

impl<S: ByteSource> Read for MsfStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read_into(buf)? {
            ReadOutcome::Read(n)    => Ok(n),
            ReadOutcome::EndOfStream => Ok(0),
        }
    }
}

impl<S: ByteSource> Seek for MsfStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n)   => Some(n),
            SeekFrom::Current(d) => self.position.checked_add_signed(d),
            SeekFrom::End(d)     => self.length.checked_add_signed(d),
        };
        match target {
            Some(p) => {
                self.position = p;
                Ok(p)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

impl<S: ByteSource> Write for MsfStream<S> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(MsfError::Unsupported.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
