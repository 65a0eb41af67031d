//! Bit-packed stream variants (§4.1 "a 'bit' variant packs 8 bits per
//! byte with the same API"). Used for the `type[k]` (is-LMS) streams and
//! the `output_diff` stream.
//!
//! Bits are packed LSB-first within each byte. A forward reader discovers
//! its own length (end of file == out of bits); because "count is
//! external" (§6), a *backward* bit reader is told the total bit count at
//! construction, since it must know how many of the final byte's 8 bits
//! are real data versus zero padding.

use std::path::Path;

use crate::error::Result;
use crate::io::backward_reader::BackwardStreamReader;
use crate::io::multi_stream::{BackwardMultiStreamReader, MultiStreamReader, MultiStreamWriter};
use crate::io::stream_reader::StreamReader;
use crate::io::stream_writer::StreamWriter;

pub struct BitStreamWriter {
    inner: StreamWriter<u8>,
    cur: u8,
    cur_bits: u32,
}

impl BitStreamWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Ok(BitStreamWriter { inner: StreamWriter::new(path)?, cur: 0, cur_bits: 0 })
    }

    pub fn write(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.cur |= 1 << self.cur_bits;
        }
        self.cur_bits += 1;
        if self.cur_bits == 8 {
            self.inner.write(self.cur)?;
            self.cur = 0;
            self.cur_bits = 0;
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.cur_bits > 0 {
            self.inner.write(self.cur)?;
            self.cur = 0;
            self.cur_bits = 0;
        }
        self.inner.finish()
    }
}

pub struct BitStreamReader {
    inner: StreamReader<u8>,
    cur: u8,
    bit_idx: u32,
}

impl BitStreamReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Ok(BitStreamReader { inner: StreamReader::new(path)?, cur: 0, bit_idx: 8 })
    }

    pub fn read(&mut self) -> Result<bool> {
        if self.bit_idx == 8 {
            self.cur = self.inner.read()?;
            self.bit_idx = 0;
        }
        let bit = (self.cur >> self.bit_idx) & 1 != 0;
        self.bit_idx += 1;
        Ok(bit)
    }
}

/// Counts down from a known total, handing back how many bits of payload
/// live in the *next* byte to pull: 8 for every byte except the very
/// first one pulled (the logically-last byte written), which may be a
/// partial, zero-high-padded byte.
struct BackwardBitCursor {
    remaining_bits: u64,
    bit_idx: Option<u32>,
    pulled_first: bool,
}

impl BackwardBitCursor {
    fn new(total_bits: u64) -> Self {
        BackwardBitCursor { remaining_bits: total_bits, bit_idx: None, pulled_first: false }
    }

    /// Returns `Some(top_bit_index)` when a new byte needs to be pulled,
    /// else `None` (the current byte still has bits left).
    fn needs_new_byte(&self) -> Option<u32> {
        if self.bit_idx.is_some() {
            return None;
        }
        let top = if !self.pulled_first {
            match self.remaining_bits % 8 {
                0 => 8,
                r => r,
            }
        } else {
            8
        };
        Some(top - 1)
    }

    fn on_byte_pulled(&mut self, top_bit_index: u32) {
        self.bit_idx = Some(top_bit_index);
        self.pulled_first = true;
    }

    fn take_bit(&mut self) -> u32 {
        let idx = self.bit_idx.unwrap();
        self.remaining_bits -= 1;
        self.bit_idx = if idx == 0 { None } else { Some(idx - 1) };
        idx
    }
}

/// Backward bit reader; `total_bits` must equal exactly the number of bits
/// the matching `BitStreamWriter` wrote.
pub struct BackwardBitStreamReader {
    inner: BackwardStreamReader<u8>,
    cur: u8,
    cursor: BackwardBitCursor,
}

impl BackwardBitStreamReader {
    pub fn new(path: impl AsRef<Path>, total_bits: u64) -> Result<Self> {
        Ok(BackwardBitStreamReader {
            inner: BackwardStreamReader::new(path)?,
            cur: 0,
            cursor: BackwardBitCursor::new(total_bits),
        })
    }

    pub fn read(&mut self) -> Result<bool> {
        if let Some(top) = self.cursor.needs_new_byte() {
            self.cur = self.inner.read()?;
            self.cursor.on_byte_pulled(top);
        }
        let idx = self.cursor.take_bit();
        Ok((self.cur >> idx) & 1 != 0)
    }
}

/// N-way forward bit writer, the bit-packed sibling of `MultiStreamWriter`.
pub struct MultiBitStreamWriter {
    inner: MultiStreamWriter<u8>,
    cur: Vec<u8>,
    cur_bits: Vec<u32>,
}

impl MultiBitStreamWriter {
    pub fn new(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let n = paths.len();
        Ok(MultiBitStreamWriter { inner: MultiStreamWriter::new(paths)?, cur: vec![0; n], cur_bits: vec![0; n] })
    }

    pub fn write_to_ith_file(&mut self, i: usize, bit: bool) -> Result<()> {
        if bit {
            self.cur[i] |= 1 << self.cur_bits[i];
        }
        self.cur_bits[i] += 1;
        if self.cur_bits[i] == 8 {
            self.inner.write_to_ith_file(i, self.cur[i])?;
            self.cur[i] = 0;
            self.cur_bits[i] = 0;
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        for i in 0..self.cur.len() {
            if self.cur_bits[i] > 0 {
                self.inner.write_to_ith_file(i, self.cur[i])?;
                self.cur[i] = 0;
                self.cur_bits[i] = 0;
            }
        }
        self.inner.finish()
    }
}

/// N-way forward bit reader.
pub struct MultiBitStreamReader {
    inner: MultiStreamReader<u8>,
    cur: Vec<u8>,
    bit_idx: Vec<u32>,
}

impl MultiBitStreamReader {
    pub fn new(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let n = paths.len();
        Ok(MultiBitStreamReader { inner: MultiStreamReader::new(paths)?, cur: vec![0; n], bit_idx: vec![8; n] })
    }

    pub fn read_from_ith_file(&mut self, i: usize) -> Result<bool> {
        if self.bit_idx[i] == 8 {
            self.cur[i] = self.inner.read_from_ith_file(i)?;
            self.bit_idx[i] = 0;
        }
        let bit = (self.cur[i] >> self.bit_idx[i]) & 1 != 0;
        self.bit_idx[i] += 1;
        Ok(bit)
    }
}

/// N-way backward bit reader; `total_bits[i]` is the exact bit count
/// written to logical file `i`.
pub struct BackwardMultiBitStreamReader {
    inner: BackwardMultiStreamReader<u8>,
    cur: Vec<u8>,
    cursors: Vec<BackwardBitCursor>,
}

impl BackwardMultiBitStreamReader {
    pub fn new(paths: &[impl AsRef<Path>], total_bits: &[u64]) -> Result<Self> {
        let n = paths.len();
        Ok(BackwardMultiBitStreamReader {
            inner: BackwardMultiStreamReader::new(paths)?,
            cur: vec![0; n],
            cursors: total_bits.iter().map(|&b| BackwardBitCursor::new(b)).collect(),
        })
    }

    pub fn read_from_ith_file(&mut self, i: usize) -> Result<bool> {
        if let Some(top) = self.cursors[i].needs_new_byte() {
            self.cur[i] = self.inner.read_from_ith_file(i)?;
            self.cursors[i].on_byte_pulled(top);
        }
        let idx = self.cursors[i].take_bit();
        Ok((self.cur[i] >> idx) & 1 != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn forward_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bits");
        let bits: Vec<bool> = (0..1000).map(|i| i % 3 == 0).collect();
        {
            let mut w = BitStreamWriter::new(&path).unwrap();
            for &b in &bits {
                w.write(b).unwrap();
            }
            w.finish().unwrap();
        }
        let mut r = BitStreamReader::new(&path).unwrap();
        for &b in &bits {
            assert_eq!(r.read().unwrap(), b);
        }
    }

    #[test]
    fn backward_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bits_back");
        let bits: Vec<bool> = (0..1001).map(|i| i % 5 < 2).collect();
        {
            let mut w = BitStreamWriter::new(&path).unwrap();
            for &b in &bits {
                w.write(b).unwrap();
            }
            w.finish().unwrap();
        }
        let mut r = BackwardBitStreamReader::new(&path, bits.len() as u64).unwrap();
        for &b in bits.iter().rev() {
            assert_eq!(r.read().unwrap(), b);
        }
    }
}
