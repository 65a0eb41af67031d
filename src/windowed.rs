//! Bounded-RAM random access over the text and the classifier's bit
//! streams, used by [`crate::induce`] so a single induction pass never
//! needs the whole text or the whole `type`/`is_lms` bit array resident at
//! once -- only a handful of blocks' worth, per §5's RAM budget.
//!
//! An induction step only ever looks at `T[p]` and `T[p-1]`, and those two
//! positions are usually in the same block (occasionally adjacent blocks),
//! so a small LRU of whole blocks amortises well: once a block is paged
//! in, every position within it is served from RAM until it's evicted.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Number of whole blocks kept resident at once. Two is the minimum that
/// lets `p` and `p-1` both hit cache across a block boundary; a few extra
/// absorb the heap's interleaving of multiple in-flight buckets without
/// thrashing.
const RESIDENT_BLOCKS: usize = 4;

/// Random access to `T[0..n)` bounded to `RESIDENT_BLOCKS * block_size`
/// resident bytes, backed by seeks into the text file rather than a
/// whole-file read.
pub struct BlockTextCache {
    file: File,
    path: PathBuf,
    n: u64,
    block_size: u64,
    resident: VecDeque<(u64, Vec<u8>)>,
}

impl BlockTextCache {
    pub fn new(text_path: &Path, n: u64, block_size: u64) -> Result<Self> {
        let file = File::open(text_path).map_err(|e| Error::io(text_path, e))?;
        Ok(BlockTextCache {
            file,
            path: text_path.to_path_buf(),
            n,
            block_size: block_size.max(1),
            resident: VecDeque::with_capacity(RESIDENT_BLOCKS),
        })
    }

    fn block_id(&self, pos: u64) -> u64 {
        pos / self.block_size
    }

    fn load(&mut self, block_id: u64) -> Result<()> {
        if self.resident.iter().any(|&(id, _)| id == block_id) {
            return Ok(());
        }
        let start = block_id * self.block_size;
        let end = std::cmp::min(start + self.block_size, self.n);
        let len = (end - start) as usize;
        let mut buf = vec![0u8; len];
        self.file.seek(SeekFrom::Start(start)).map_err(|e| Error::io(&self.path, e))?;
        self.file.read_exact(&mut buf).map_err(|e| Error::io(&self.path, e))?;
        if self.resident.len() >= RESIDENT_BLOCKS {
            self.resident.pop_front();
        }
        self.resident.push_back((block_id, buf));
        Ok(())
    }

    /// `T[pos]`, paging in the containing block if it isn't resident.
    pub fn get(&mut self, pos: u64) -> Result<u8> {
        debug_assert!(pos < self.n);
        let block_id = self.block_id(pos);
        self.load(block_id)?;
        let (_, buf) = self.resident.iter().find(|&&(id, _)| id == block_id).expect("just loaded");
        let offset = (pos - block_id * self.block_size) as usize;
        Ok(buf[offset])
    }
}

/// Random access to a dense, one-bit-per-position bitmap written by
/// [`crate::block::classify`] (LSB-first within each byte, byte `g` holding
/// positions `[8g, 8g+8)`), bounded to one resident page of bytes rather
/// than the whole `n`-bit array.
pub struct RandomAccessBitmap {
    file: File,
    path: PathBuf,
    page: Option<(u64, Vec<u8>)>,
    page_bytes: u64,
}

/// Bytes kept resident per page. 64 KiB covers a wide span of positions
/// (512 Ki bits) per seek, so sequential-ish access patterns rarely repage.
const BITMAP_PAGE_BYTES: u64 = 64 * 1024;

impl RandomAccessBitmap {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(RandomAccessBitmap { file, path: path.to_path_buf(), page: None, page_bytes: BITMAP_PAGE_BYTES })
    }

    fn load_page(&mut self, page_id: u64) -> Result<()> {
        if let Some((id, _)) = self.page {
            if id == page_id {
                return Ok(());
            }
        }
        let start = page_id * self.page_bytes;
        self.file.seek(SeekFrom::Start(start)).map_err(|e| Error::io(&self.path, e))?;
        let mut buf = vec![0u8; self.page_bytes as usize];
        let mut total = 0usize;
        loop {
            let n = self.file.read(&mut buf[total..]).map_err(|e| Error::io(&self.path, e))?;
            if n == 0 {
                break;
            }
            total += n;
            if total == buf.len() {
                break;
            }
        }
        buf.truncate(total);
        self.page = Some((page_id, buf));
        Ok(())
    }

    pub fn get(&mut self, pos: u64) -> Result<bool> {
        let byte_index = pos / 8;
        let bit = (pos % 8) as u32;
        let page_id = byte_index / self.page_bytes;
        self.load_page(page_id)?;
        let (_, buf) = self.page.as_ref().expect("just loaded");
        let offset = (byte_index % self.page_bytes) as usize;
        let byte = *buf.get(offset).unwrap_or(&0);
        Ok((byte >> bit) & 1 == 1)
    }
}

/// Writer for the dense bitmap format [`RandomAccessBitmap`] reads,
/// filled by a backward scan (positions arrive `n-1, n-2, ..., 0`): bits
/// within a byte are produced high-offset-first, which is exactly the
/// order a backward scan visits them in, so each byte is completed and
/// flushed the moment its lowest position is seen.
pub struct BackwardBitmapWriter {
    file: File,
    path: PathBuf,
    cur_byte: u8,
}

impl BackwardBitmapWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        Ok(BackwardBitmapWriter { file, path: path.to_path_buf(), cur_byte: 0 })
    }

    /// Record the bit for `pos`. Must be called exactly once per position,
    /// in strictly descending `pos` order, ending at `pos == 0`.
    ///
    /// Bytes are completed highest-index first (the scan runs backward), but
    /// [`RandomAccessBitmap`] addresses them by ascending byte index, so each
    /// completed byte is seeked to its own `pos / 8` offset rather than
    /// appended at the current (descending) write cursor.
    pub fn write(&mut self, pos: u64, bit: bool) -> Result<()> {
        use std::io::Write;
        let byte_index = pos / 8;
        let j = (pos % 8) as u32;
        if bit {
            self.cur_byte |= 1 << j;
        }
        if j == 0 {
            self.file.seek(SeekFrom::Start(byte_index)).map_err(|e| Error::io(&self.path, e))?;
            self.file.write_all(&[self.cur_byte]).map_err(|e| Error::io(&self.path, e))?;
            self.cur_byte = 0;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        use std::io::Write;
        self.file.flush().map_err(|e| Error::io(&self.path, e))
    }
}
