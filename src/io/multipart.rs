//! Multi-part writer and its LIFO-consuming backward reader (§4.1).
//!
//! Used when a logical stream would exceed a single file's practical size,
//! or when the consumer wants to read it back in LIFO order (most
//! recently written part first). Parts are named `<name>.1`, `<name>.2`,
//! ... in creation order.

use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_BUFFERS_PER_STREAM, DEFAULT_BUF_SIZE_BYTES};
use crate::error::{Error, Result};
use crate::io::backward_reader::BackwardStreamReader;
use crate::io::raw::{self, Elem};
use crate::io::stream_writer::StreamWriter;

pub fn part_path(base: &Path, part_no: u64) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(format!(".{}", part_no));
    PathBuf::from(s)
}

pub struct MultipartWriter<T: Elem> {
    base: PathBuf,
    max_part_size_bytes: u64,
    buf_size_bytes: u64,
    n_buffers: u64,
    part_no: u64,
    cur: StreamWriter<T>,
    cur_part_bytes: u64,
    bytes_written: u64,
}

impl<T: Elem> MultipartWriter<T> {
    pub fn new(base: impl AsRef<Path>, max_part_size_bytes: u64) -> Result<Self> {
        Self::with_buffers(base, max_part_size_bytes, DEFAULT_BUF_SIZE_BYTES, DEFAULT_BUFFERS_PER_STREAM)
    }

    pub fn with_buffers(
        base: impl AsRef<Path>,
        max_part_size_bytes: u64,
        buf_size_bytes: u64,
        n_buffers: u64,
    ) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let cur = StreamWriter::with_buffers(part_path(&base, 1), buf_size_bytes, n_buffers)?;
        Ok(MultipartWriter {
            base,
            max_part_size_bytes: max_part_size_bytes.max(raw::elem_size::<T>()),
            buf_size_bytes,
            n_buffers,
            part_no: 1,
            cur,
            cur_part_bytes: 0,
            bytes_written: 0,
        })
    }

    pub fn write(&mut self, value: T) -> Result<()> {
        if self.cur_part_bytes >= self.max_part_size_bytes {
            self.cur.finish()?;
            self.part_no += 1;
            self.cur = StreamWriter::with_buffers(part_path(&self.base, self.part_no), self.buf_size_bytes, self.n_buffers)?;
            self.cur_part_bytes = 0;
        }
        self.cur.write(value)?;
        let sz = raw::elem_size::<T>();
        self.cur_part_bytes += sz;
        self.bytes_written += sz;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush, returning the number of parts written. Idempotent except for
    /// the returned count, which is cheap to recompute.
    pub fn finish(&mut self) -> Result<u64> {
        self.cur.finish()?;
        Ok(self.part_no)
    }

    pub fn parts_count(&self) -> u64 {
        self.part_no
    }
}

/// Consumes the parts of a `MultipartWriter`'s output in reverse creation
/// order, each part read backward -- the combined effect is as if the
/// logical, unsplit stream were read backward from end to start.
pub struct MultipartBackwardReader<T: Elem> {
    base: PathBuf,
    buf_size_bytes: u64,
    n_buffers: u64,
    next_part: u64,
    cur: Option<BackwardStreamReader<T>>,
    bytes_read: u64,
}

impl<T: Elem> MultipartBackwardReader<T> {
    pub fn new(base: impl AsRef<Path>, n_parts: u64) -> Result<Self> {
        Self::with_buffers(base, n_parts, DEFAULT_BUF_SIZE_BYTES, DEFAULT_BUFFERS_PER_STREAM)
    }

    pub fn with_buffers(base: impl AsRef<Path>, n_parts: u64, buf_size_bytes: u64, n_buffers: u64) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        if n_parts == 0 {
            return Err(Error::ZeroParts { path: base });
        }
        let mut reader = MultipartBackwardReader {
            base,
            buf_size_bytes,
            n_buffers,
            next_part: n_parts,
            cur: None,
            bytes_read: 0,
        };
        reader.open_next_nonempty()?;
        Ok(reader)
    }

    fn open_next_nonempty(&mut self) -> Result<()> {
        while self.next_part >= 1 {
            let path = part_path(&self.base, self.next_part);
            self.next_part -= 1;
            let mut r = BackwardStreamReader::with_buffers(&path, self.buf_size_bytes, self.n_buffers, 0)?;
            if !r.is_empty()? {
                self.cur = Some(r);
                return Ok(());
            }
        }
        self.cur = None;
        Ok(())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        loop {
            match &mut self.cur {
                Some(r) => {
                    if !r.is_empty()? {
                        return Ok(false);
                    }
                }
                None => return Ok(true),
            }
            self.open_next_nonempty()?;
        }
    }

    pub fn read(&mut self) -> Result<T> {
        if self.is_empty()? {
            debug_assert!(false, "read() called on an exhausted multi-part backward reader");
            return Ok(T::default());
        }
        let r = self.cur.as_mut().unwrap();
        let v = r.read()?;
        self.bytes_read += raw::elem_size::<T>();
        Ok(v)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
