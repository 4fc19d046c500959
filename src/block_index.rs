//! In-memory block index.
//!
//! One entry per block plus a trailing sentinel holding the end of the last
//! block's data. An entry stores the block's volume-relative offset shifted
//! right by the alignment shift; the top bit marks a block stored plain.

use crate::config::CISO_PLAIN_BLOCK;
use crate::CisoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndex {
    entries: Vec<u32>,
    align_shift: u8,
}

impl BlockIndex {
    /// Allocate a zeroed index for `total_blocks` blocks.
    pub fn new(total_blocks: u64, align_shift: u8) -> Result<Self, CisoError> {
        let len = total_blocks
            .checked_add(1)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| CisoError::Format(format!("{total_blocks} blocks cannot be indexed")))?;
        Ok(Self {
            entries: vec![0; len],
            align_shift,
        })
    }

    /// Number of blocks covered, excluding the sentinel.
    pub fn total_blocks(&self) -> u64 {
        (self.entries.len() - 1) as u64
    }

    /// Record the write offset of block `block`.
    pub fn set(&mut self, block: u64, offset: u64, plain: bool) -> Result<(), CisoError> {
        if block >= self.total_blocks() {
            return Err(CisoError::Format(format!(
                "block {block} out of range for {} blocks",
                self.total_blocks()
            )));
        }
        let mut entry = self.encode_offset(offset)?;
        if plain {
            entry |= CISO_PLAIN_BLOCK;
        }
        self.entries[block as usize] = entry;
        Ok(())
    }

    /// Record the end offset of the last block.
    pub fn set_sentinel(&mut self, offset: u64) -> Result<(), CisoError> {
        let entry = self.encode_offset(offset)?;
        let last = self.entries.len() - 1;
        self.entries[last] = entry;
        Ok(())
    }

    fn encode_offset(&self, offset: u64) -> Result<u32, CisoError> {
        let granularity = 1u64 << self.align_shift;
        if offset % granularity != 0 {
            return Err(CisoError::Format(format!(
                "offset {offset:#x} is not aligned to {granularity} bytes"
            )));
        }
        let shifted = offset >> self.align_shift;
        if shifted >= CISO_PLAIN_BLOCK as u64 {
            return Err(CisoError::Format(format!(
                "offset {offset:#x} does not fit an index entry"
            )));
        }
        Ok(shifted as u32)
    }

    /// Raw entry values, sentinel last.
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Serialize every entry as a little endian word.
    pub fn encode(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| e.to_le_bytes()).collect()
    }
}

/// Byte offset encoded in `entry`.
pub fn entry_offset(entry: u32, align_shift: u8) -> u64 {
    ((entry & !CISO_PLAIN_BLOCK) as u64) << align_shift
}

/// Whether `entry` marks a block stored without compression.
pub fn entry_is_plain(entry: u32) -> bool {
    entry & CISO_PLAIN_BLOCK != 0
}
