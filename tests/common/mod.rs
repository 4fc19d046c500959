#![allow(dead_code)]

use std::fs;
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};
use xciso::{entry_is_plain, entry_offset, volume_path};

pub const BLOCK: usize = 0x800;
pub const SIGNATURE: &[u8; 20] = b"MICROSOFT*XBOX*MEDIA";

/// Raw XDVDFS image of `len` bytes: the signature at 0x10000, a run of
/// compressible text and some random blocks.
pub fn xdvdfs_image(len: usize, seed: u64) -> Vec<u8> {
    assert!(len >= 0x10000 + SIGNATURE.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    for (i, chunk) in data.chunks_mut(BLOCK).enumerate() {
        match i % 4 {
            0 => {}
            1 => rng.fill(chunk),
            2 => {
                for (j, b) in chunk.iter_mut().enumerate() {
                    *b = b"default.xbe "[j % 12];
                }
            }
            _ => chunk.fill((i % 251) as u8),
        }
    }
    data[0x10000..0x10000 + SIGNATURE.len()].copy_from_slice(SIGNATURE);
    data
}

/// A container read back from disk.
pub struct Container {
    pub header: Vec<u8>,
    pub entries: Vec<u32>,
    pub volumes: Vec<Vec<u8>>,
}

/// Load every `<input>.N.cso` volume that exists.
pub fn read_container(input: &Path) -> Container {
    let mut volumes = Vec::new();
    let mut n = 1;
    while let Ok(bytes) = fs::read(volume_path(input, n)) {
        volumes.push(bytes);
        n += 1;
    }
    assert!(!volumes.is_empty(), "no volumes written");
    let first = &volumes[0];
    let header = first[..0x18].to_vec();
    let total_bytes = u64::from_le_bytes(header[8..16].try_into().unwrap());
    let count = (total_bytes / BLOCK as u64) as usize + 1;
    let entries = first[0x18..0x18 + count * 4]
        .chunks(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect();
    Container {
        header,
        entries,
        volumes,
    }
}

impl Container {
    pub fn total_blocks(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn offset(&self, entry: usize) -> u64 {
        entry_offset(self.entries[entry], 2)
    }

    /// Volume holding each entry. A later volume always starts with a block
    /// at offset 0, while volume 1 starts after the index.
    pub fn volume_of(&self) -> Vec<usize> {
        let mut vol = 0;
        let mut out = Vec::with_capacity(self.entries.len());
        for i in 0..self.entries.len() {
            if i > 0 && self.offset(i) == 0 {
                vol += 1;
            }
            out.push(vol);
        }
        out
    }

    /// Decode block `i` back into its 2 KiB of source data.
    pub fn block(&self, i: usize) -> Vec<u8> {
        let vols = self.volume_of();
        let data = &self.volumes[vols[i]];
        let start = self.offset(i) as usize;
        let end = if vols[i + 1] == vols[i] {
            self.offset(i + 1) as usize
        } else {
            data.len()
        };
        if entry_is_plain(self.entries[i]) {
            return data[start..start + BLOCK].to_vec();
        }
        // The span may carry up to three bytes of alignment padding.
        for trim in 0..4 {
            if let Ok(out) = lz4_flex::block::decompress(&data[start..end - trim], BLOCK) {
                if out.len() == BLOCK {
                    return out;
                }
            }
        }
        panic!("block {i} does not decode");
    }
}
