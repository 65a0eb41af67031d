//! Construction parameters (§6 External Interfaces, §6 Tunables).

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Minimum viable buffer size per stream, in elements. Mirrors the
/// `std::max(1UL, ...)` floors scattered through the original's buffer
/// size arithmetic.
const MIN_BUF_ELEMS: u64 = 1;

/// Default per-buffer size target, `opt_buf_size` in the original
/// (`1UL << 20`, i.e. 1 MiB).
pub const DEFAULT_BUF_SIZE_BYTES: u64 = 1 << 20;

/// Default number of buffers per stream.
pub const DEFAULT_BUFFERS_PER_STREAM: u64 = 4;

/// Construction parameters supplied by the caller.
#[derive(Debug, Clone)]
pub struct Config {
    /// Total RAM budget in bytes, shared between per-stream buffers and the
    /// radix heap's in-memory buckets.
    pub ram_use: u64,
    /// Size of a text block, in symbols. All but possibly the last block
    /// have exactly this many symbols.
    pub max_block_size: u64,
    /// Alphabet size; 256 for raw byte text.
    pub alphabet_size: u64,
    /// Directory for intermediate streams; removed streams are unlinked
    /// from here, never left to the OS temp-file reaper.
    pub tmp_dir: PathBuf,
    /// Radix bits per radix-heap level (typical 8-10).
    pub radix_log: u32,
    /// Buffers per open stream (typical 4).
    pub buffers_per_stream: u64,
    /// Per-buffer size, in bytes, before being divided across buffers of a
    /// stream.
    pub buf_size_bytes: u64,
    /// Cap, in bytes, on a single part of a multi-part stream. `None`
    /// derives it from text length the way the original does
    /// (`max(1 MiB, text_len * elem_size / 40)`).
    pub max_part_size_bytes: Option<u64>,
}

impl Config {
    pub fn new(ram_use: u64, max_block_size: u64, tmp_dir: impl Into<PathBuf>) -> Self {
        Config {
            ram_use,
            max_block_size,
            alphabet_size: 256,
            tmp_dir: tmp_dir.into(),
            radix_log: 8,
            buffers_per_stream: DEFAULT_BUFFERS_PER_STREAM,
            buf_size_bytes: DEFAULT_BUF_SIZE_BYTES,
            max_part_size_bytes: None,
        }
    }

    pub fn with_alphabet_size(mut self, alphabet_size: u64) -> Self {
        self.alphabet_size = alphabet_size;
        self
    }

    pub fn with_radix_log(mut self, radix_log: u32) -> Self {
        self.radix_log = radix_log;
        self
    }

    pub fn with_buffers_per_stream(mut self, n: u64) -> Self {
        self.buffers_per_stream = n;
        self
    }

    pub fn with_max_part_size_bytes(mut self, n: u64) -> Self {
        self.max_part_size_bytes = Some(n);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_block_size == 0 {
            return Err(Error::ZeroBlockSize);
        }
        if self.buffers_per_stream == 0 {
            return Err(Error::ZeroBuffers);
        }
        if self.alphabet_size == 0 {
            return Err(Error::ZeroAlphabet);
        }
        let min_ram = self.buffers_per_stream * MIN_BUF_ELEMS;
        if self.ram_use < min_ram {
            return Err(Error::RamBudgetTooSmall {
                ram_use: self.ram_use,
                n_buffers: self.buffers_per_stream,
            });
        }
        Ok(())
    }

    pub fn tmp_path(&self, prefix: &str) -> PathBuf {
        crate::utils::temp_path(&self.tmp_dir, prefix)
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// Split `ram_use` between per-stream buffers and the radix heap the
    /// way `em_induce_plus_suffixes` decides `computed_buf_size` /
    /// `ram_for_radix_heap`: use the 1 MiB default buffer size as long as
    /// it fits half the budget, otherwise shrink buffers to fit.
    pub fn split_ram_for_streams(&self, n_buffers: u64) -> (u64, u64) {
        let opt = DEFAULT_BUF_SIZE_BYTES;
        if opt.saturating_mul(n_buffers) <= self.ram_use / 2 {
            let for_buffers = opt * n_buffers;
            (opt, self.ram_use - for_buffers)
        } else {
            let for_heap = self.ram_use / 2;
            let for_buffers = self.ram_use - for_heap;
            (std::cmp::max(1, for_buffers / n_buffers.max(1)), for_heap)
        }
    }

    pub fn max_part_size(&self, text_length: u64, elem_size: u64) -> u64 {
        self.max_part_size_bytes.unwrap_or_else(|| {
            std::cmp::max(DEFAULT_BUF_SIZE_BYTES, (text_length * elem_size) / 40)
        })
    }
}
