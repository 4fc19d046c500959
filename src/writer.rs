//! Container writer.
//!
//! Volume 1 receives the header and a zeroed index. Blocks are then
//! aligned, compressed and appended, splitting to a new volume whenever the
//! cursor passes the ceiling. Once every offset is known the last volume is
//! padded and the index is patched in behind the header.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::block_index::BlockIndex;
use crate::codec::{store_plain, BlockCodec, Lz4Codec};
use crate::config::{ConvertOptions, CISO_HEADER_SIZE};
use crate::descriptor::ContainerDescriptor;
use crate::layout::{detect_layout, ImageLayout};
use crate::stats::ConversionStats;
use crate::volume::{volume_path, FileVolumes, VolumeFactory, VolumeSet};
use crate::CisoError;

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub layout: ImageLayout,
    pub descriptor: ContainerDescriptor,
    pub index: BlockIndex,
    pub volumes: u32,
    pub stats: ConversionStats,
}

/// Reads source blocks and writes them, compressed where worthwhile, into
/// the volume set.
pub struct BlockWriter<'a, R, C> {
    src: &'a mut R,
    codec: C,
    descriptor: &'a ContainerDescriptor,
    raw: Vec<u8>,
}

impl<'a, R: Read + Seek, C: BlockCodec> BlockWriter<'a, R, C> {
    /// Position `src` at the first payload byte of `layout`.
    pub fn new(
        src: &'a mut R,
        layout: ImageLayout,
        descriptor: &'a ContainerDescriptor,
        codec: C,
    ) -> Result<Self, CisoError> {
        src.seek(SeekFrom::Start(layout.origin_offset()))
            .map_err(|e| CisoError::io("seeking to image origin", e))?;
        Ok(Self {
            src,
            codec,
            descriptor,
            raw: vec![0; descriptor.block_size as usize],
        })
    }

    /// Write block `block` to the current volume and record its offset.
    ///
    /// Blocks must be written in order since the source is read
    /// sequentially.
    pub fn write_block<F: VolumeFactory>(
        &mut self,
        block: u64,
        volumes: &mut VolumeSet<F>,
        index: &mut BlockIndex,
        stats: &mut ConversionStats,
    ) -> Result<(), CisoError> {
        volumes.split_if_needed()?;
        volumes
            .align(self.descriptor.alignment())
            .map_err(block_error(block))?;
        let offset = volumes.cursor();

        let last = block + 1 == self.descriptor.total_blocks;
        let n = read_full(&mut *self.src, &mut self.raw).map_err(block_error(block))?;
        if n < self.raw.len() {
            if !last {
                return Err(CisoError::Block {
                    block,
                    source: io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source ended after {n} of {} bytes", self.raw.len()),
                    ),
                });
            }
            warn!("Final block {block} is short by {} bytes, zero filling", self.raw.len() - n);
            self.raw[n..].fill(0);
        }
        stats.bytes_in += self.raw.len() as u64;

        let compressed = self.codec.compress(&self.raw)?;
        let plain = store_plain(compressed.len(), self.raw.len());
        let data = if plain { &self.raw[..] } else { compressed };

        index.set(block, offset, plain)?;
        volumes.write(data).map_err(block_error(block))?;
        stats.log_block(plain, data.len());
        Ok(())
    }
}

fn block_error(block: u64) -> impl Fn(io::Error) -> CisoError {
    move |source| CisoError::Block { block, source }
}

/// Fill `buf` from `src`, stopping early only at end of stream.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Convert the image in `src` into volumes produced by `factory`.
pub fn convert<R, F>(src: &mut R, factory: F, options: &ConvertOptions) -> Result<Conversion, CisoError>
where
    R: Read + Seek,
    F: VolumeFactory,
{
    let layout = detect_layout(src)?;
    let descriptor = ContainerDescriptor::from_source(layout, src)?;
    write_container(src, layout, descriptor, factory, options)
}

/// Write the container for an image whose layout is already known.
pub fn write_container<R, F>(
    src: &mut R,
    layout: ImageLayout,
    descriptor: ContainerDescriptor,
    factory: F,
    options: &ConvertOptions,
) -> Result<Conversion, CisoError>
where
    R: Read + Seek,
    F: VolumeFactory,
{
    let codec = Lz4Codec::new(descriptor.block_size as usize)?;
    for line in descriptor.to_string().lines() {
        info!("{line}");
    }

    let mut index = BlockIndex::new(descriptor.total_blocks, descriptor.align_shift)?;
    info!("Block index size is: {} bytes", descriptor.index_size());

    let mut volumes = VolumeSet::open(factory, options.split_size)?;
    volumes
        .write(&descriptor.encode_header())
        .and_then(|_| volumes.write(&index.encode()))
        .map_err(|e| CisoError::Volume { volume: 1, source: e })?;
    debug!("Payload starts at {:#x}", descriptor.payload_start());

    let mut stats = ConversionStats::new(layout.to_string());
    let progress = if options.progress {
        let bar = ProgressBar::new(descriptor.total_blocks);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} blocks [{elapsed_precise}] eta {eta}")
        {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut writer = BlockWriter::new(src, layout, &descriptor, codec)?;
    for block in 0..descriptor.total_blocks {
        writer.write_block(block, &mut volumes, &mut index, &mut stats)?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    let end = volumes.number();
    volumes
        .align(descriptor.alignment())
        .map_err(|e| CisoError::Volume { volume: end, source: e })?;
    index.set_sentinel(volumes.cursor())?;

    let count = volumes.finish(CISO_HEADER_SIZE as u64, &index.encode())?;
    stats.finish(count);
    stats.report();

    Ok(Conversion {
        layout,
        descriptor,
        index,
        volumes: count,
        stats,
    })
}

/// Convert the image at `input`, writing `<input>.1.cso`, `<input>.2.cso`,
/// ... next to it.
pub fn convert_file<P: AsRef<Path>>(input: P, options: &ConvertOptions) -> Result<Conversion, CisoError> {
    let input = input.as_ref();
    info!("Compressing {}", input.display());
    let file = File::open(input).map_err(|e| CisoError::io(format!("opening {}", input.display()), e))?;
    let mut src = BufReader::new(file);
    convert(&mut src, FileVolumes::new(input), options)
}

/// Paths of the volumes a conversion of `input` produced.
pub fn output_paths(input: &Path, volumes: u32) -> Vec<PathBuf> {
    (1..=volumes).map(|n| volume_path(input, n)).collect()
}
