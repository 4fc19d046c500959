//! Source image layout detection.
//!
//! Xbox disc images come in two shapes. Redump dumps carry the video
//! partition in front of the game partition, so the XDVDFS filesystem starts
//! at [`REDUMP_ORIGIN`]. Raw XDVDFS images start with the filesystem itself.
//! Both are recognised by the volume descriptor signature, which sits 64 KiB
//! into the filesystem.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use log::{debug, info};

use crate::config::{
    REDUMP_ORIGIN, REDUMP_PROBE_OFFSET, XDVDFS_PROBE_OFFSET, XDVDFS_SIGNATURE,
};
use crate::CisoError;

/// Recognised source layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Redump style dump with a leading video partition.
    Redump,
    /// Bare XDVDFS filesystem image.
    Xdvdfs,
}

impl ImageLayout {
    /// Byte offset in the source where filesystem data begins.
    pub fn origin_offset(self) -> u64 {
        match self {
            ImageLayout::Redump => REDUMP_ORIGIN,
            ImageLayout::Xdvdfs => 0,
        }
    }
}

impl fmt::Display for ImageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLayout::Redump => write!(f, "Redump"),
            ImageLayout::Xdvdfs => write!(f, "raw XDVDFS"),
        }
    }
}

/// Determine the layout of `src`.
///
/// The Redump probe runs first. The read cursor is left at an unspecified
/// position; callers must seek before reading payload.
pub fn detect_layout<R: Read + Seek>(src: &mut R) -> Result<ImageLayout, CisoError> {
    let len = src
        .seek(SeekFrom::End(0))
        .map_err(|e| CisoError::io("measuring source image", e))?;

    if probe_signature(src, len, REDUMP_PROBE_OFFSET)? {
        info!("Detected Redump style image");
        return Ok(ImageLayout::Redump);
    }
    debug!("File not big enough or no signature for a Redump style image");

    if probe_signature(src, len, XDVDFS_PROBE_OFFSET)? {
        info!("Detected raw XDVDFS image");
        return Ok(ImageLayout::Xdvdfs);
    }
    debug!("File not big enough or no signature for a raw XDVDFS image");

    Err(CisoError::LayoutDetection(format!(
        "no {} signature at {:#x} or {:#x} (source is {} bytes)",
        String::from_utf8_lossy(XDVDFS_SIGNATURE),
        REDUMP_PROBE_OFFSET,
        XDVDFS_PROBE_OFFSET,
        len
    )))
}

/// Returns true when the XDVDFS signature is present at `offset`.
fn probe_signature<R: Read + Seek>(src: &mut R, len: u64, offset: u64) -> Result<bool, CisoError> {
    if offset + XDVDFS_SIGNATURE.len() as u64 > len {
        return Ok(false);
    }
    src.seek(SeekFrom::Start(offset))
        .map_err(|e| CisoError::io(format!("seeking to {offset:#x}"), e))?;
    let mut buf = [0u8; 20];
    match src.read_exact(&mut buf) {
        Ok(()) => Ok(&buf == XDVDFS_SIGNATURE),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(CisoError::io(format!("reading signature at {offset:#x}"), e)),
    }
}
