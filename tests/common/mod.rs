//! Synthetic MSF image builder shared by the integration tests and benches.
#![allow(dead_code)]

use msfio::directory::NIL_STREAM_SIZE;
use msfio::superblock::MAGIC_V7;

/// Deterministic, block-distinguishable filler.
pub fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_mul(31).wrapping_add((i % 251) as u8) ^ (i / 251) as u8)
        .collect()
}

/// Lays out a container block by block.  Block 0 holds the header, block 1 is
/// the (unused) free block map; everything else is allocated on demand.
pub struct Builder {
    pub block_size: u32,
    pub magic:      Vec<u8>,
    blocks:         Vec<Vec<u8>>,
    entries:        Vec<(u32, Vec<u32>)>,
}

impl Builder {
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size,
            magic:   MAGIC_V7.to_vec(),
            blocks:  vec![vec![0u8; block_size as usize]; 2],
            entries: Vec::new(),
        }
    }

    pub fn with_magic(mut self, magic: &[u8]) -> Self {
        self.magic = magic.to_vec();
        self
    }

    fn ensure(&mut self, count: usize) {
        while self.blocks.len() < count {
            self.blocks.push(vec![0u8; self.block_size as usize]);
        }
    }

    fn alloc(&mut self) -> u32 {
        self.blocks.push(vec![0u8; self.block_size as usize]);
        (self.blocks.len() - 1) as u32
    }

    fn fill(&mut self, data: &[u8], blocks: &[u32]) {
        let bs = self.block_size as usize;
        for (chunk, &b) in data.chunks(bs).zip(blocks) {
            self.ensure(b as usize + 1);
            self.blocks[b as usize][..chunk.len()].copy_from_slice(chunk);
        }
    }

    /// Add a stream stored in exactly the given physical blocks.
    pub fn stream_at(&mut self, data: &[u8], blocks: &[u32]) -> &mut Self {
        self.fill(data, blocks);
        self.entries.push((data.len() as u32, blocks.to_vec()));
        self
    }

    /// Add a stream in freshly allocated blocks, listed in reverse physical
    /// order so logical neighbours are never physically adjacent.
    pub fn stream(&mut self, data: &[u8]) -> &mut Self {
        let n = data.len().div_ceil(self.block_size as usize);
        let mut blocks: Vec<u32> = (0..n).map(|_| self.alloc()).collect();
        blocks.reverse();
        self.stream_at(data, &blocks)
    }

    pub fn nil_stream(&mut self) -> &mut Self {
        self.entries.push((NIL_STREAM_SIZE, Vec::new()));
        self
    }

    /// Produce the image.  The block map occupies one block placed before the
    /// directory blocks, which are the last blocks of the image.
    pub fn build(&self) -> Vec<u8> {
        let mut b = Builder {
            block_size: self.block_size,
            magic:      self.magic.clone(),
            blocks:     self.blocks.clone(),
            entries:    Vec::new(),
        };
        let bs = self.block_size as usize;

        let mut dir = Vec::new();
        dir.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for (size, _) in &self.entries {
            dir.extend_from_slice(&size.to_le_bytes());
        }
        for (_, blocks) in &self.entries {
            for blk in blocks {
                dir.extend_from_slice(&blk.to_le_bytes());
            }
        }

        let map_block = b.alloc();
        let dir_count = dir.len().div_ceil(bs);
        assert!(dir_count * 4 <= bs, "directory too large for a single block map block");
        let mut dir_blocks: Vec<u32> = (0..dir_count).map(|_| b.alloc()).collect();
        dir_blocks.reverse();
        b.fill(&dir, &dir_blocks);

        let map: Vec<u8> = dir_blocks.iter().flat_map(|x| x.to_le_bytes()).collect();
        b.fill(&map, &[map_block]);

        let total = b.blocks.len() as u32;
        let mut header = b.magic.clone();
        for field in [self.block_size, 1, total, dir.len() as u32, 0, map_block] {
            header.extend_from_slice(&field.to_le_bytes());
        }
        b.blocks[0][..header.len()].copy_from_slice(&header);

        b.blocks.concat()
    }
}

/// Overwrite the superblock's block size field of an image built with the
/// default magic.
pub fn patch_block_size(image: &mut [u8], value: u32) {
    image[32..36].copy_from_slice(&value.to_le_bytes());
}
