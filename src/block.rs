//! Block partitioning and the classification pass (§4.3).
//!
//! Classification is a single backward scan over the text: each position's
//! L/S type depends only on its right neighbour, and each LMS bit depends
//! on a position's own type plus its left neighbour's type (known one step
//! later in a backward scan). Both derived bit streams are therefore
//! written to disk in the same order they are discovered -- descending
//! text position -- and read back with a [`crate::io::BackwardBitStreamReader`]
//! by anything that wants them in ascending (text) order.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::io::{BackwardBitStreamReader, BackwardStreamReader, BitStreamWriter};
use crate::windowed::BackwardBitmapWriter;

/// A half-open range of text positions `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub start: u64,
    pub end: u64,
}

impl BlockInfo {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.start && pos < self.end
    }
}

/// Cut `[0, n)` into blocks of `max_block_size`, the last one possibly
/// shorter.
pub fn plan_blocks(n: u64, max_block_size: u64) -> Vec<BlockInfo> {
    if n == 0 {
        return Vec::new();
    }
    let mut blocks = Vec::new();
    let mut start = 0u64;
    while start < n {
        let end = std::cmp::min(start + max_block_size, n);
        blocks.push(BlockInfo { start, end });
        start = end;
    }
    blocks
}

pub fn block_of(blocks: &[BlockInfo], pos: u64) -> usize {
    // Blocks are equal-sized except the last, so this is a direct division
    // rather than a scan; still correct if the caller's `max_block_size`
    // changed between calls (falls back to a linear scan).
    if let Some(first) = blocks.first() {
        let guess = (pos / first.len().max(1)) as usize;
        if guess < blocks.len() && blocks[guess].contains(pos) {
            return guess;
        }
    }
    blocks
        .iter()
        .position(|b| b.contains(pos))
        .expect("position out of range of every block")
}

pub struct Classification {
    pub n: u64,
    pub blocks: Vec<BlockInfo>,
    /// Bit stream, descending text order: `is_s[n-1], is_s[n-2], ..., is_s[0]`.
    pub type_path: PathBuf,
    /// Bit stream, same order, for the LMS predicate.
    pub is_lms_path: PathBuf,
    /// Dense, randomly-addressable bitmaps holding the same two bits per
    /// position as `type_path`/`is_lms_path`, used by [`crate::induce`] so
    /// induction never needs either array fully resident -- see
    /// `crate::windowed`.
    pub type_bitmap_path: PathBuf,
    pub is_lms_bitmap_path: PathBuf,
    /// Count of LMS positions by the character found at that position,
    /// indexed `0..alphabet_size`.
    pub count: Vec<u64>,
    pub lms_count: u64,
}

/// Run the backward classification scan, materialising the `type` and
/// `is_lms` streams of §3's data model table, plus the dense random-access
/// bitmaps `crate::windowed` serves induction from.
pub fn classify(text_path: &Path, n: u64, alphabet_size: u64, config: &Config) -> Result<Classification> {
    let blocks = plan_blocks(n, config.max_block_size);
    let type_path = config.tmp_path("type");
    let is_lms_path = config.tmp_path("is_lms");
    let type_bitmap_path = config.tmp_path("type_bitmap");
    let is_lms_bitmap_path = config.tmp_path("is_lms_bitmap");
    let mut count = vec![0u64; alphabet_size as usize];
    let mut lms_count = 0u64;

    if n == 0 {
        BitStreamWriter::new(&type_path)?.finish()?;
        BitStreamWriter::new(&is_lms_path)?.finish()?;
        BackwardBitmapWriter::new(&type_bitmap_path)?.finish()?;
        BackwardBitmapWriter::new(&is_lms_bitmap_path)?.finish()?;
        return Ok(Classification {
            n,
            blocks,
            type_path,
            is_lms_path,
            type_bitmap_path,
            is_lms_bitmap_path,
            count,
            lms_count,
        });
    }

    let mut text = BackwardStreamReader::<u8>::new(text_path)?;
    let mut type_writer = BitStreamWriter::new(&type_path)?;
    let mut lms_writer = BitStreamWriter::new(&is_lms_path)?;
    let mut type_bitmap_writer = BackwardBitmapWriter::new(&type_bitmap_path)?;
    let mut lms_bitmap_writer = BackwardBitmapWriter::new(&is_lms_bitmap_path)?;

    let mut have_prev = false;
    let mut prev_char: u8 = 0;
    let mut prev_is_s: bool = false;
    let mut pos = n;

    while !text.is_empty()? {
        pos -= 1;
        let c = text.read()?;
        let is_s = have_prev && (c < prev_char || (c == prev_char && prev_is_s));
        type_writer.write(is_s)?;
        type_bitmap_writer.write(pos, is_s)?;
        if have_prev {
            let is_lms_next = prev_is_s && !is_s;
            lms_writer.write(is_lms_next)?;
            lms_bitmap_writer.write(pos + 1, is_lms_next)?;
            if is_lms_next {
                count[prev_char as usize] += 1;
                lms_count += 1;
            }
        }
        prev_char = c;
        prev_is_s = is_s;
        have_prev = true;
    }
    // Position 0 has no predecessor, so it is never LMS.
    lms_writer.write(false)?;
    lms_bitmap_writer.write(0, false)?;

    type_writer.finish()?;
    lms_writer.finish()?;
    type_bitmap_writer.finish()?;
    lms_bitmap_writer.finish()?;

    Ok(Classification {
        n,
        blocks,
        type_path,
        is_lms_path,
        type_bitmap_path,
        is_lms_bitmap_path,
        count,
        lms_count,
    })
}

/// Read a classification's bit streams back into RAM in ascending text
/// order. The induction engine needs random access to both arrays (an
/// induced position's predecessor can be anywhere in the text), which is
/// the one place this crate trades strict external-memory operation for a
/// compact (`n`-bit) resident working set -- see `DESIGN.md`.
pub fn load_type_bits(classification: &Classification) -> Result<Vec<bool>> {
    read_bits_ascending(&classification.type_path, classification.n)
}

pub fn load_lms_bits(classification: &Classification) -> Result<Vec<bool>> {
    read_bits_ascending(&classification.is_lms_path, classification.n)
}

fn read_bits_ascending(path: &Path, n: u64) -> Result<Vec<bool>> {
    let mut out = vec![false; n as usize];
    if n == 0 {
        return Ok(out);
    }
    let mut r = BackwardBitStreamReader::new(path, n)?;
    for i in (0..n as usize).rev() {
        out[i] = r.read()?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn classify_str(s: &str, max_block_size: u64) -> (Classification, Vec<bool>, Vec<bool>) {
        let dir = tempdir().unwrap();
        let text_path = dir.path().join("t");
        std::fs::write(&text_path, s.as_bytes()).unwrap();
        let config = Config::new(1 << 20, max_block_size, dir.path());
        let c = classify(&text_path, s.len() as u64, 256, &config).unwrap();
        let types = load_type_bits(&c).unwrap();
        let lms = load_lms_bits(&c).unwrap();
        (c, types, lms)
    }

    #[test]
    fn mississippi_types_and_lms() {
        // m i s s i s s i p p i  (text order, indices 0..11)
        // Known SA-IS classification: LMS positions are at indices 1, 4, 7 ("i"s preceded by L).
        let (c, types, lms) = classify_str("mississippi", 64);
        assert_eq!(types.len(), 11);
        assert_eq!(lms.len(), 11);
        let lms_positions: Vec<usize> = (0..11).filter(|&i| lms[i]).collect();
        assert_eq!(lms_positions, vec![1, 4, 7]);
        assert_eq!(c.lms_count, 3);
        assert_eq!(c.count[b'i' as usize], 3);
    }

    #[test]
    fn repeated_character_has_no_lms() {
        let (c, _types, lms) = classify_str("aaaa", 64);
        assert!(lms.iter().all(|&b| !b));
        assert_eq!(c.lms_count, 0);
    }

    #[test]
    fn single_character_text() {
        let (c, types, lms) = classify_str("a", 64);
        assert_eq!(types, vec![false]);
        assert_eq!(lms, vec![false]);
        assert_eq!(c.lms_count, 0);
    }

    #[test]
    fn plan_blocks_splits_evenly_with_short_tail() {
        let blocks = plan_blocks(10, 3);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[3], BlockInfo { start: 9, end: 10 });
        for (i, b) in blocks.iter().enumerate() {
            assert_eq!(block_of(&blocks, b.start), i);
        }
    }
}
