use crate::error::{MsfError, Result};

/// The physical extent that backs one logical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Absolute offset in the byte source.
    pub physical: u64,
    /// Bytes left in the block from `physical` onward.
    pub remaining: u64,
}

/// Number of `block_size` blocks needed to hold `len` bytes.
pub fn blocks_for_len(len: u64, block_size: u64) -> u64 {
    len.div_ceil(block_size)
}

/// Map logical position `pos` onto `blocks`, a list of absolute block offsets.
///
/// Returns `None` when `pos` lies beyond the last listed block (or the
/// physical offset is not representable).
pub fn translate(pos: u64, block_size: u64, blocks: &[u64]) -> Option<BlockSpan> {
    let index = usize::try_from(pos / block_size).ok()?;
    let in_block = pos % block_size;
    let start = *blocks.get(index)?;
    Some(BlockSpan {
        physical:  start.checked_add(in_block)?,
        remaining: block_size - in_block,
    })
}

/// Ordered, already-resolved block offsets of one logical stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockList {
    block_size: u64,
    offsets:    Vec<u64>,
}

impl BlockList {
    /// Resolve raw block indices to absolute offsets:
    /// `index * block_size + base_offset`.
    pub fn resolve(indices: &[u32], block_size: u32, base_offset: u64) -> Result<Self> {
        let offsets = indices.iter()
            .map(|&idx| {
                (idx as u64 * block_size as u64)
                    .checked_add(base_offset)
                    .ok_or(MsfError::AddressOverflow { block: idx })
            })
            .collect::<Result<Vec<u64>>>()?;
        Ok(Self { block_size: block_size as u64, offsets })
    }

    pub fn empty(block_size: u32) -> Self {
        Self { block_size: block_size as u64, offsets: Vec::new() }
    }

    pub fn translate(&self, pos: u64) -> Option<BlockSpan> {
        translate(pos, self.block_size, &self.offsets)
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Largest logical length these blocks can back.
    pub fn capacity(&self) -> u64 {
        self.offsets.len() as u64 * self.block_size
    }
}
