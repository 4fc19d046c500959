//! Container descriptor and its 24-byte header record.
//!
//! Header layout, all fields little endian:
//!
//! ```text
//! 0x00  magic        [u8; 4]  "CISO"
//! 0x04  header_size  u32      0x18
//! 0x08  total_bytes  u64      payload size after the origin offset
//! 0x10  block_size   u32      0x800
//! 0x14  version      u8       2
//! 0x15  align        u8       2
//! 0x16  reserved     [u8; 2]  zero
//! ```

use std::fmt;
use std::io::{Seek, SeekFrom};

use crate::config::{
    CISO_ALIGN_SHIFT, CISO_BLOCK_SIZE, CISO_HEADER_SIZE, CISO_MAGIC, CISO_VERSION,
    INDEX_ENTRY_SIZE,
};
use crate::layout::ImageLayout;
use crate::CisoError;

/// Immutable geometry of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub magic: [u8; 4],
    pub version: u8,
    pub block_size: u32,
    pub total_bytes: u64,
    pub total_blocks: u64,
    pub align_shift: u8,
}

impl ContainerDescriptor {
    /// Build the descriptor for `total_bytes` of payload.
    ///
    /// Bytes past the last full block are not covered by any block.
    pub fn new(total_bytes: u64) -> Self {
        Self {
            magic: *CISO_MAGIC,
            version: CISO_VERSION,
            block_size: CISO_BLOCK_SIZE,
            total_bytes,
            total_blocks: total_bytes / CISO_BLOCK_SIZE as u64,
            align_shift: CISO_ALIGN_SHIFT,
        }
    }

    /// Build the descriptor for a source stream of `stream_len` bytes laid
    /// out as `layout`.
    pub fn for_layout(layout: ImageLayout, stream_len: u64) -> Result<Self, CisoError> {
        let origin = layout.origin_offset();
        let total_bytes = stream_len.checked_sub(origin).ok_or_else(|| {
            CisoError::Format(format!(
                "source is {stream_len} bytes, shorter than the {layout} origin {origin:#x}"
            ))
        })?;
        Ok(Self::new(total_bytes))
    }

    /// Measure `src` and build its descriptor.
    pub fn from_source<S: Seek>(layout: ImageLayout, src: &mut S) -> Result<Self, CisoError> {
        let len = src
            .seek(SeekFrom::End(0))
            .map_err(|e| CisoError::io("measuring source image", e))?;
        Self::for_layout(layout, len)
    }

    /// Alignment granularity in bytes.
    pub fn alignment(&self) -> u64 {
        1 << self.align_shift
    }

    /// Number of index entries, including the trailing sentinel.
    pub fn index_entries(&self) -> u64 {
        self.total_blocks + 1
    }

    /// Size in bytes of the serialized index.
    pub fn index_size(&self) -> u64 {
        self.index_entries() * INDEX_ENTRY_SIZE
    }

    /// Offset of the first payload byte in volume 1.
    pub fn payload_start(&self) -> u64 {
        CISO_HEADER_SIZE as u64 + self.index_size()
    }

    /// Serialize the header record.
    pub fn encode_header(&self) -> [u8; CISO_HEADER_SIZE as usize] {
        let mut out = [0u8; CISO_HEADER_SIZE as usize];
        out[0..4].copy_from_slice(&self.magic);
        out[4..8].copy_from_slice(&CISO_HEADER_SIZE.to_le_bytes());
        out[8..16].copy_from_slice(&self.total_bytes.to_le_bytes());
        out[16..20].copy_from_slice(&self.block_size.to_le_bytes());
        out[20] = self.version;
        out[21] = self.align_shift;
        out
    }
}

impl fmt::Display for ContainerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Magic:        {}", String::from_utf8_lossy(&self.magic))?;
        writeln!(f, "Version:      {}", self.version)?;
        writeln!(f, "Block Size:   {}", self.block_size)?;
        writeln!(f, "Total Bytes:  {}", self.total_bytes)?;
        writeln!(f, "Total Blocks: {}", self.total_blocks)?;
        write!(f, "Alignment:    {}", self.align_shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REDUMP_ORIGIN;

    #[test]
    fn remainder_is_not_a_block() {
        let d = ContainerDescriptor::new(4096 + 100);
        assert_eq!(d.total_blocks, 2);
        assert_eq!(d.total_bytes, 4196);
        assert_eq!(d.index_entries(), 3);
        assert_eq!(d.payload_start(), 0x18 + 12);
    }

    #[test]
    fn redump_origin_is_subtracted() {
        let d = ContainerDescriptor::for_layout(ImageLayout::Redump, REDUMP_ORIGIN + 6144).unwrap();
        assert_eq!(d.total_bytes, 6144);
        assert_eq!(d.total_blocks, 3);
    }

    #[test]
    fn short_source_is_rejected() {
        let err = ContainerDescriptor::for_layout(ImageLayout::Redump, 1024).unwrap_err();
        assert!(matches!(err, CisoError::Format(_)));
    }

    #[test]
    fn header_layout() {
        let d = ContainerDescriptor::new(0x1_2345_6800);
        let h = d.encode_header();
        assert_eq!(&h[0..4], b"CISO");
        assert_eq!(u32::from_le_bytes(h[4..8].try_into().unwrap()), 0x18);
        assert_eq!(u64::from_le_bytes(h[8..16].try_into().unwrap()), 0x1_2345_6800);
        assert_eq!(u32::from_le_bytes(h[16..20].try_into().unwrap()), 0x800);
        assert_eq!(h[20], 2);
        assert_eq!(h[21], 2);
        assert_eq!(&h[22..24], &[0, 0]);
    }

    #[test]
    fn display_lists_geometry() {
        let text = ContainerDescriptor::new(4096).to_string();
        assert!(text.contains("Magic:        CISO"));
        assert!(text.contains("Total Blocks: 2"));
    }
}
