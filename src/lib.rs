//! Xbox disc image to CISO container converter.
//!
//! The source image is probed for its layout, split into 2 KiB blocks, and
//! each block is LZ4 compressed into one or more `.cso` volumes together
//! with a seek index so readers can decompress any block directly.

pub mod block_index;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod io_utils;
pub mod layout;
pub mod stats;
pub mod volume;
pub mod writer;

pub use block_index::{entry_is_plain, entry_offset, BlockIndex};
pub use codec::{store_plain, BlockCodec, Lz4Codec};
pub use config::ConvertOptions;
pub use descriptor::ContainerDescriptor;
pub use error::CisoError;
pub use layout::{detect_layout, ImageLayout};
pub use stats::ConversionStats;
pub use volume::{volume_path, FileVolumes, VolumeFactory, VolumeSet};
pub use writer::{convert, convert_file, output_paths, write_container, BlockWriter, Conversion};
