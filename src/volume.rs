//! Output volumes and the splitter that moves to a new one once the write
//! cursor passes the size ceiling.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::VOLUME_PAD_BOUNDARY;
use crate::CisoError;

/// Creates numbered output volumes, starting at 1.
pub trait VolumeFactory {
    type Volume: Write + Seek;

    fn create(&mut self, number: u32) -> Result<Self::Volume, CisoError>;
}

/// Volumes named `<input>.1.cso`, `<input>.2.cso`, ... next to the input.
#[derive(Debug, Clone)]
pub struct FileVolumes {
    base: PathBuf,
}

impl FileVolumes {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            base: input.as_ref().to_path_buf(),
        }
    }

    /// Path of volume `number`.
    pub fn path_for(&self, number: u32) -> PathBuf {
        volume_path(&self.base, number)
    }
}

/// Path of volume `number` for the given input path.
pub fn volume_path(input: &Path, number: u32) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(format!(".{number}.cso"));
    PathBuf::from(name)
}

impl VolumeFactory for FileVolumes {
    type Volume = BufWriter<File>;

    fn create(&mut self, number: u32) -> Result<Self::Volume, CisoError> {
        let path = self.path_for(number);
        let file = File::create(&path).map_err(volume_error(number))?;
        debug!("Opened volume {} at {}", number, path.display());
        Ok(BufWriter::new(file))
    }
}

/// The set of volumes written during one conversion.
///
/// Volume 1 stays open to the end because the index is patched into it.
/// Any later volume is sealed as soon as the next one starts.
pub struct VolumeSet<F: VolumeFactory> {
    factory: F,
    first: F::Volume,
    current: Option<F::Volume>,
    number: u32,
    cursor: u64,
    split_size: u64,
}

impl<F: VolumeFactory> VolumeSet<F> {
    /// Open volume 1 unconditionally.
    pub fn open(mut factory: F, split_size: u64) -> Result<Self, CisoError> {
        let first = factory.create(1)?;
        Ok(Self {
            factory,
            first,
            current: None,
            number: 1,
            cursor: 0,
            split_size,
        })
    }

    /// Write cursor within the current volume.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Number of the current volume.
    pub fn number(&self) -> u32 {
        self.number
    }

    fn sink(&mut self) -> &mut F::Volume {
        match self.current.as_mut() {
            Some(v) => v,
            None => &mut self.first,
        }
    }

    /// Start a new volume if the cursor has passed the ceiling. Returns
    /// whether a split happened. Called once before every block so a block
    /// never spans two volumes.
    pub fn split_if_needed(&mut self) -> Result<bool, CisoError> {
        if self.cursor <= self.split_size {
            return Ok(false);
        }
        let next = self.number + 1;
        let volume = self.factory.create(next)?;
        if let Some(mut sealed) = self.current.replace(volume) {
            sealed.flush().map_err(volume_error(self.number))?;
        }
        info!(
            "Volume {} reached {} bytes, continuing in volume {}",
            self.number, self.cursor, next
        );
        self.number = next;
        self.cursor = 0;
        Ok(true)
    }

    /// Write `bytes` to the current volume.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink().write_all(bytes)?;
        self.cursor += bytes.len() as u64;
        Ok(())
    }

    /// Zero-pad the cursor up to a multiple of `granularity`. Returns the
    /// number of bytes written.
    pub fn align(&mut self, granularity: u64) -> io::Result<u64> {
        let rem = self.cursor % granularity;
        if rem == 0 {
            return Ok(0);
        }
        let pad = granularity - rem;
        write_zeros(self.sink(), pad)?;
        self.cursor += pad;
        Ok(pad)
    }

    /// Pad the current volume, rewrite the index region of volume 1 and
    /// flush everything. Returns the number of volumes written.
    pub fn finish(mut self, index_offset: u64, index: &[u8]) -> Result<u32, CisoError> {
        let number = self.number;

        let pad = VOLUME_PAD_BOUNDARY - (self.cursor & (VOLUME_PAD_BOUNDARY - 1));
        write_zeros(self.sink(), pad).map_err(volume_error(number))?;
        self.cursor += pad;
        debug!("Padded volume {} to {} bytes", number, self.cursor);

        if let Some(mut last) = self.current.take() {
            last.flush().map_err(volume_error(number))?;
        }

        patch(&mut self.first, index_offset, index).map_err(volume_error(1))?;
        Ok(number)
    }
}

fn volume_error(volume: u32) -> impl Fn(io::Error) -> CisoError {
    move |source| CisoError::Volume { volume, source }
}

fn patch<W: Write + Seek>(out: &mut W, offset: u64, bytes: &[u8]) -> io::Result<()> {
    out.seek(SeekFrom::Start(offset))?;
    out.write_all(bytes)?;
    out.flush()
}

fn write_zeros<W: Write>(out: &mut W, mut len: u64) -> io::Result<()> {
    const ZEROS: [u8; 1024] = [0; 1024];
    while len > 0 {
        let n = len.min(ZEROS.len() as u64) as usize;
        out.write_all(&ZEROS[..n])?;
        len -= n as u64;
    }
    Ok(())
}
