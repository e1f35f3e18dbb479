//! Stream directory decoding.
//!
//! The directory that lists every stream is itself stored like a stream:
//! its bytes are scattered across blocks, and the indices of those blocks
//! sit in a flat array (the block map) at `block_map_address`.  Decoding
//! therefore bootstraps in two steps:
//!
//! 1. Read the block map directly from the source and resolve it into a
//!    [`BlockList`].
//! 2. Wrap that list in an ordinary [`MsfStream`] and parse the directory
//!    payload from it:
//!
//! ```text
//! u32 stream_count
//! u32 stream_size[stream_count]
//! u32 blocks[stream 0][ceil(size0 / block_size)]
//! u32 blocks[stream 1][ceil(size1 / block_size)]
//! ...
//! ```
//!
//! Entries follow one another with no padding.  All integers are little-endian.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::block::{blocks_for_len, BlockList};
use crate::error::{MsfError, Result, Section};
use crate::io_stream::MsfStream;
use crate::source::ByteSource;
use crate::superblock::Superblock;

/// Declared size of a deleted stream.  Such a stream owns no blocks.
pub const NIL_STREAM_SIZE: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// Size as declared in the directory (may be [`NIL_STREAM_SIZE`]).
    pub size:   u32,
    /// Raw block indices, in logical order.
    pub blocks: Vec<u32>,
}

impl StreamEntry {
    pub fn is_nil(&self) -> bool {
        self.size == NIL_STREAM_SIZE
    }

    /// Logical length in bytes; zero for a deleted stream.
    pub fn len(&self) -> u64 {
        if self.is_nil() { 0 } else { self.size as u64 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDirectory {
    pub block_size: u32,
    pub entries:    Vec<StreamEntry>,
}

impl StreamDirectory {
    /// Locate and decode the directory of the container whose magic sits at
    /// `base_offset`.
    pub fn load<S: ByteSource>(source: &Arc<S>, sb: &Superblock, base_offset: u64) -> Result<Self> {
        let map = read_block_map(&**source, sb, base_offset)?;
        let blocks = BlockList::resolve(&map, sb.block_size, base_offset)?;
        let length = sb.directory_byte_count as u64;
        let stream = MsfStream::with_blocks(Arc::clone(source), blocks, length)
            .ok_or_else(|| MsfError::truncated(Section::BlockMap, length, 0))?;

        let dir = Self::read(stream, sb.block_size, length)?;
        dir.warn_out_of_range(sb.block_count);
        debug!(
            streams = dir.entries.len(),
            directory_bytes = length,
            directory_blocks = map.len(),
            "decoded msf stream directory"
        );
        Ok(dir)
    }

    /// Decode a directory payload of `available` bytes from `reader`.
    ///
    /// Every count is checked against the bytes left before anything is
    /// allocated, so a corrupt count fails as truncation instead of
    /// exhausting memory.
    pub fn read<R: Read>(reader: R, block_size: u32, available: u64) -> Result<Self> {
        let mut rdr = Budget { inner: reader, consumed: 0, available };

        let count = rdr.read_u32()?;
        let sizes = rdr.read_u32_array(count as u64)?;

        let mut entries = Vec::with_capacity(sizes.len());
        for size in sizes {
            let nblocks = if size == NIL_STREAM_SIZE {
                0
            } else {
                blocks_for_len(size as u64, block_size as u64)
            };
            let blocks = rdr.read_u32_array(nblocks)?;
            entries.push(StreamEntry { size, blocks });
        }
        Ok(Self { block_size, entries })
    }

    /// Turn every entry into a stream over `source`, in declaration order.
    pub fn into_streams<S: ByteSource>(self, source: &Arc<S>, base_offset: u64) -> Result<Vec<MsfStream<S>>> {
        let block_size = self.block_size;
        self.entries
            .into_iter()
            .map(|entry| {
                if entry.is_nil() {
                    return Ok(MsfStream::nil(Arc::clone(source), block_size));
                }
                let blocks = BlockList::resolve(&entry.blocks, block_size, base_offset)?;
                MsfStream::with_blocks(Arc::clone(source), blocks, entry.len())
                    .ok_or_else(|| MsfError::truncated(Section::Directory, entry.len(), 0))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn warn_out_of_range(&self, block_count: u32) {
        let past_end = self.entries.iter()
            .flat_map(|e| e.blocks.iter())
            .filter(|&&b| b >= block_count)
            .count();
        if past_end > 0 {
            warn!(past_end, block_count, "msf directory references blocks past the declared block count");
        }
        let nil = self.entries.iter().filter(|e| e.is_nil()).count();
        if nil > 0 {
            debug!(nil, "msf directory contains deleted streams");
        }
    }
}

/// Read the flat array of directory block indices at the block map address.
pub fn read_block_map<S: ByteSource + ?Sized>(source: &S, sb: &Superblock, base_offset: u64) -> Result<Vec<u32>> {
    let offset = sb.block_map_offset(base_offset)?;
    let expected = sb.directory_block_count() * 4;

    let mut raw = vec![0u8; expected as usize];
    let n = source.read_full_at(offset, &mut raw)?;
    if n as u64 != expected {
        return Err(MsfError::truncated(Section::BlockMap, expected, n as u64));
    }

    let mut map = vec![0u32; raw.len() / 4];
    LittleEndian::read_u32_into(&raw, &mut map);
    Ok(map)
}

// ── Bounded reader ───────────────────────────────────────────────────────────

const CHUNK_WORDS: usize = 16 * 1024;

struct Budget<R> {
    inner:     R,
    consumed:  u64,
    available: u64,
}

impl<R: Read> Budget<R> {
    fn reserve(&self, bytes: u64) -> Result<()> {
        match self.consumed.checked_add(bytes) {
            Some(end) if end <= self.available => Ok(()),
            _ => Err(MsfError::truncated(
                Section::Directory,
                self.consumed.saturating_add(bytes),
                self.available,
            )),
        }
    }

    fn short(&self, bytes: u64, e: io::Error) -> MsfError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            MsfError::truncated(Section::Directory, self.consumed + bytes, self.consumed)
        } else {
            MsfError::Io(e)
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.reserve(4)?;
        let v = self.inner.read_u32::<LittleEndian>().map_err(|e| self.short(4, e))?;
        self.consumed += 4;
        Ok(v)
    }

    /// The declared directory size only caps `count`; the output grows one
    /// chunk at a time so a short reader fails before a large allocation.
    fn read_u32_array(&mut self, count: u64) -> Result<Vec<u32>> {
        let bytes = count.saturating_mul(4);
        self.reserve(bytes)?;
        let total = count as usize;
        let mut out = Vec::with_capacity(total.min(CHUNK_WORDS));
        let mut chunk = vec![0u32; total.min(CHUNK_WORDS)];
        while out.len() < total {
            let n = (total - out.len()).min(CHUNK_WORDS);
            let left = (total - out.len()) as u64 * 4;
            self.inner
                .read_u32_into::<LittleEndian>(&mut chunk[..n])
                .map_err(|e| self.short(left, e))?;
            out.extend_from_slice(&chunk[..n]);
            self.consumed += n as u64 * 4;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[u32]) -> Vec<u8> {
        ws.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_entries_in_order() {
        // 3 streams: 0 bytes, 700 bytes (2 blocks), 512 bytes (1 block).
        let payload = words(&[3, 0, 700, 512, 9, 4, 6]);
        let dir = StreamDirectory::read(&payload[..], 512, payload.len() as u64).unwrap();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.entries[0], StreamEntry { size: 0, blocks: vec![] });
        assert_eq!(dir.entries[1], StreamEntry { size: 700, blocks: vec![9, 4] });
        assert_eq!(dir.entries[2], StreamEntry { size: 512, blocks: vec![6] });
    }

    #[test]
    fn empty_directory_has_no_entries() {
        let payload = words(&[0]);
        let dir = StreamDirectory::read(&payload[..], 4096, 4).unwrap();
        assert!(dir.is_empty());
    }

    #[test]
    fn nil_stream_owns_no_blocks() {
        let payload = words(&[2, NIL_STREAM_SIZE, 10, 5]);
        let dir = StreamDirectory::read(&payload[..], 1024, payload.len() as u64).unwrap();
        assert!(dir.entries[0].is_nil());
        assert_eq!(dir.entries[0].len(), 0);
        assert!(dir.entries[0].blocks.is_empty());
        assert_eq!(dir.entries[1].blocks, vec![5]);
    }

    #[test]
    fn huge_count_fails_before_allocating() {
        let payload = words(&[u32::MAX]);
        match StreamDirectory::read(&payload[..], 512, 4) {
            Err(MsfError::TruncatedInput { section: Section::Directory, actual: 4, .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_block_indices_are_truncation() {
        let payload = words(&[1, 2048]);
        assert!(matches!(
            StreamDirectory::read(&payload[..], 512, payload.len() as u64),
            Err(MsfError::TruncatedInput { section: Section::Directory, .. })
        ));
    }

    #[test]
    fn oversized_declared_directory_with_short_reader_is_truncation() {
        // The declared size admits a quarter-billion sizes; the reader holds two.
        let payload = words(&[1 << 28, 7, 9]);
        match StreamDirectory::read(&payload[..], 512, u32::MAX as u64) {
            Err(MsfError::TruncatedInput { section: Section::Directory, expected, actual: 4 }) => {
                assert_eq!(expected, 4 + (1u64 << 30));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn arrays_longer_than_one_chunk_decode_intact() {
        let sizes: Vec<u32> = (0..CHUNK_WORDS as u32 + 3).map(|i| i % 2).collect();
        let mut ws = vec![sizes.len() as u32];
        ws.extend(&sizes);
        ws.extend((0..sizes.iter().filter(|&&s| s != 0).count() as u32).map(|i| i + 2));
        let payload = words(&ws);
        let dir = StreamDirectory::read(&payload[..], 512, payload.len() as u64).unwrap();
        assert_eq!(dir.len(), sizes.len());
        assert_eq!(dir.entries[1].blocks, vec![2]);
        assert_eq!(dir.entries.last().unwrap().size, sizes[sizes.len() - 1]);
        assert_eq!(dir.entries[sizes.len() - 2].blocks, vec![2 + (sizes.len() as u32 - 3) / 2]);
    }

    #[test]
    fn reader_shorter_than_declared_is_truncation() {
        // Declared length says 16 bytes, reader only has 8.
        let payload = words(&[2, 1]);
        assert!(matches!(
            StreamDirectory::read(&payload[..], 512, 16),
            Err(MsfError::TruncatedInput { section: Section::Directory, expected: 12, actual: 4 })
        ));
    }
}
