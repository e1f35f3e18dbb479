use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Cursor;
use crate::error::{MsfError, Result, Section};
use crate::source::ByteSource;

/// Signature written by every MSF 7.00 producer.
pub const MAGIC_V7: &[u8; 32] = b"Microsoft C/C++ MSF 7.00\r\n\x1aDS\0\0\0";
/// Historical spelling with spaces around the slash.
pub const MAGIC_V7_SPACED: &[u8; 34] = b"Microsoft C / C++ MSF 7.00\r\n\x1aDS\0\0\0";
/// Signatures in the order they are tried.
pub const MAGICS: [&[u8]; 2] = [MAGIC_V7, MAGIC_V7_SPACED];

const MAX_MAGIC_LEN: usize = MAGIC_V7_SPACED.len();

pub const SUPERBLOCK_SIZE: usize = 24;
pub const VALID_BLOCK_SIZES: [u32; 4] = [512, 1024, 2048, 4096];

/// Match `header` against the accepted signatures.  Returns the length of the
/// signature that matched.
pub fn match_magic(header: &[u8]) -> Option<usize> {
    MAGICS.iter()
        .find(|m| header.starts_with(m))
        .map(|m| m.len())
}

/// Validate the signature at `base_offset` and return the offset of the first
/// byte after it.
///
/// A source that ends while its bytes still agree with one of the signatures
/// is reported as truncated rather than as a bad magic.
pub fn read_magic<S: ByteSource + ?Sized>(source: &S, base_offset: u64) -> Result<u64> {
    let mut header = [0u8; MAX_MAGIC_LEN];
    let n = source.read_full_at(base_offset, &mut header)?;
    let header = &header[..n];

    if let Some(len) = match_magic(header) {
        return Ok(base_offset + len as u64);
    }
    if let Some(m) = MAGICS.iter().find(|m| n < m.len() && m.starts_with(header)) {
        return Err(MsfError::truncated(Section::Magic, m.len() as u64, n as u64));
    }
    Err(MsfError::InvalidMagic)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Superblock {
    pub block_size:           u32,
    pub free_block_map_block: u32,
    pub block_count:          u32,
    pub directory_byte_count: u32,
    /// Offset 16.  Carried through unvalidated.
    pub reserved:             u32,
    pub block_map_address:    u32,
}

impl Superblock {
    /// Decode the 24-byte record.  Only `block_size` is range-checked.
    pub fn parse(bytes: &[u8; SUPERBLOCK_SIZE]) -> Result<Self> {
        let mut rdr = Cursor::new(&bytes[..]);
        let sb = Self {
            block_size:           rdr.read_u32::<LittleEndian>()?,
            free_block_map_block: rdr.read_u32::<LittleEndian>()?,
            block_count:          rdr.read_u32::<LittleEndian>()?,
            directory_byte_count: rdr.read_u32::<LittleEndian>()?,
            reserved:             rdr.read_u32::<LittleEndian>()?,
            block_map_address:    rdr.read_u32::<LittleEndian>()?,
        };
        if !is_valid_block_size(sb.block_size) {
            return Err(MsfError::InvalidSuperblock(sb.block_size));
        }
        Ok(sb)
    }

    /// Read the superblock that follows the magic at `offset`.
    pub fn read_at<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<Self> {
        let mut bytes = [0u8; SUPERBLOCK_SIZE];
        let n = source.read_full_at(offset, &mut bytes)?;
        if n != SUPERBLOCK_SIZE {
            return Err(MsfError::truncated(Section::Superblock, SUPERBLOCK_SIZE as u64, n as u64));
        }
        Self::parse(&bytes)
    }

    /// Validate the magic at `base_offset` and decode the superblock behind it.
    pub fn read<S: ByteSource + ?Sized>(source: &S, base_offset: u64) -> Result<Self> {
        let after_magic = read_magic(source, base_offset)?;
        Self::read_at(source, after_magic)
    }

    /// Absolute offset of the block map for a container starting at `base_offset`.
    pub fn block_map_offset(&self, base_offset: u64) -> Result<u64> {
        (self.block_map_address as u64 * self.block_size as u64)
            .checked_add(base_offset)
            .ok_or(MsfError::AddressOverflow { block: self.block_map_address })
    }

    /// Number of blocks the stream directory occupies.
    pub fn directory_block_count(&self) -> u64 {
        crate::block::blocks_for_len(self.directory_byte_count as u64, self.block_size as u64)
    }
}

pub fn is_valid_block_size(size: u32) -> bool {
    VALID_BLOCK_SIZES.contains(&size)
}
