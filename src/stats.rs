use std::time::Instant;

use log::info;
use serde::Serialize;

/// Counters collected while writing a container.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    #[serde(skip)]
    start_time: Instant,
    pub layout: String,
    pub total_blocks: u64,
    pub compressed_blocks: u64,
    pub plain_blocks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub volumes: u32,
    pub elapsed_ms: u128,
}

impl ConversionStats {
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            layout: layout.into(),
            total_blocks: 0,
            compressed_blocks: 0,
            plain_blocks: 0,
            bytes_in: 0,
            bytes_out: 0,
            volumes: 1,
            elapsed_ms: 0,
        }
    }

    pub fn log_block(&mut self, plain: bool, written: usize) {
        self.total_blocks += 1;
        if plain {
            self.plain_blocks += 1;
        } else {
            self.compressed_blocks += 1;
        }
        self.bytes_out += written as u64;
    }

    pub fn finish(&mut self, volumes: u32) {
        self.volumes = volumes;
        self.elapsed_ms = self.start_time.elapsed().as_millis();
    }

    /// Stored size as a percentage of the input.
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        self.bytes_out as f64 * 100.0 / self.bytes_in as f64
    }

    pub fn report(&self) {
        info!(
            "Wrote {} blocks ({} compressed, {} plain) to {} volume(s): {} -> {} bytes ({:.2}%) in {} ms",
            self.total_blocks,
            self.compressed_blocks,
            self.plain_blocks,
            self.volumes,
            self.bytes_in,
            self.bytes_out,
            self.ratio(),
            self.elapsed_ms,
        );
    }
}
