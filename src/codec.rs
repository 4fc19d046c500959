//! Block codec used for the payload.

use crate::CisoError;

/// Largest input a single LZ4 block may hold.
const LZ4_MAX_INPUT_SIZE: usize = 0x7E00_0000;

/// Blocks whose compressed form is not at least this many bytes smaller
/// than the raw block are stored plain.
pub const PLAIN_BLOCK_MARGIN: usize = 12;

/// Compresses one block at a time.
pub trait BlockCodec {
    /// Compress `block` and return the compressed bytes. The slice is valid
    /// until the next call.
    fn compress(&mut self, block: &[u8]) -> Result<&[u8], CisoError>;
}

/// Raw LZ4 block compression without a size prefix.
pub struct Lz4Codec {
    out: Vec<u8>,
    block_size: usize,
}

impl Lz4Codec {
    /// Set up a codec for blocks of `block_size` bytes.
    pub fn new(block_size: usize) -> Result<Self, CisoError> {
        if block_size == 0 || block_size > LZ4_MAX_INPUT_SIZE {
            return Err(CisoError::CodecInit(format!(
                "block size {block_size} outside LZ4 input range"
            )));
        }
        Ok(Self {
            out: vec![0; lz4_flex::block::get_maximum_output_size(block_size)],
            block_size,
        })
    }
}

impl BlockCodec for Lz4Codec {
    fn compress(&mut self, block: &[u8]) -> Result<&[u8], CisoError> {
        if block.len() > self.block_size {
            return Err(CisoError::Format(format!(
                "block of {} bytes exceeds codec block size {}",
                block.len(),
                self.block_size
            )));
        }
        let n = lz4_flex::block::compress_into(block, &mut self.out)
            .map_err(|e| CisoError::Format(format!("lz4 compression failed: {e}")))?;
        Ok(&self.out[..n])
    }
}

/// Whether a block compressed to `compressed_len` bytes should be written
/// raw instead.
pub fn store_plain(compressed_len: usize, block_size: usize) -> bool {
    compressed_len + PLAIN_BLOCK_MARGIN >= block_size
}
