//! Format constants of the Xbox CISO container and runtime options for the
//! converter.

/// Container magic written at the start of the first volume.
pub const CISO_MAGIC: &[u8; 4] = b"CISO";
/// Size in bytes of the fixed container header.
pub const CISO_HEADER_SIZE: u32 = 0x18;
/// Uncompressed size of every block.
pub const CISO_BLOCK_SIZE: u32 = 0x800;
/// Container format version.
pub const CISO_VERSION: u8 = 2;
/// Index entries store offsets shifted right by this many bits.
pub const CISO_ALIGN_SHIFT: u8 = 2;
/// Flag bit marking an index entry whose block is stored uncompressed.
pub const CISO_PLAIN_BLOCK: u32 = 0x8000_0000;
/// Size in bytes of one serialized index entry.
pub const INDEX_ENTRY_SIZE: u64 = 4;

/// Largest file FATX accepts, less some headroom. A new volume is started
/// once the write cursor passes this value.
pub const FATX_SIZE_LIMIT: u64 = 0xFFBF_6000;
/// Volumes end on this boundary.
pub const VOLUME_PAD_BOUNDARY: u64 = 0x400;

/// Signature found at the start of the XDVDFS volume descriptor.
pub const XDVDFS_SIGNATURE: &[u8; 20] = b"MICROSOFT*XBOX*MEDIA";
/// Where the signature sits in a Redump dump.
pub const REDUMP_PROBE_OFFSET: u64 = 0x1831_0000;
/// Start of the filesystem image in a Redump dump.
pub const REDUMP_ORIGIN: u64 = 0x1830_0000;
/// Where the signature sits in a raw XDVDFS image.
pub const XDVDFS_PROBE_OFFSET: u64 = 0x1_0000;

/// Runtime configuration for a conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Write cursor value past which the next block goes to a new volume.
    pub split_size: u64,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            split_size: FATX_SIZE_LIMIT,
            progress: false,
        }
    }
}
