//! Forward asynchronous stream writer, the write-side dual of
//! `StreamReader` (§4.1). The foreground fills buffers; the worker thread
//! flushes full ones to disk, appended in order.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::{DEFAULT_BUFFERS_PER_STREAM, DEFAULT_BUF_SIZE_BYTES};
use crate::error::{Error, Result};
use crate::io::pool::{Buf, BufferQueue};
use crate::io::raw::{self, Elem};

pub struct StreamWriter<T: Elem> {
    empty: Arc<BufferQueue<Buf<T>>>,
    full: Arc<BufferQueue<Buf<T>>>,
    worker: Option<JoinHandle<()>>,
    error: Arc<Mutex<Option<io::Error>>>,
    cur: Buf<T>,
    bytes_written: u64,
    path: PathBuf,
    finished: bool,
}

impl<T: Elem> StreamWriter<T> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_buffers(path, DEFAULT_BUF_SIZE_BYTES, DEFAULT_BUFFERS_PER_STREAM)
    }

    pub fn with_buffers(path: impl AsRef<Path>, total_buf_size_bytes: u64, n_buffers: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if n_buffers == 0 {
            return Err(Error::ZeroBuffers);
        }
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;

        let elem_size = raw::elem_size::<T>();
        let total_items = std::cmp::max(1, total_buf_size_bytes / elem_size.max(1));
        let items_per_buf = std::cmp::max(1, total_items / n_buffers) as usize;

        let empty = Arc::new(BufferQueue::with_items(
            (0..n_buffers - 1).map(|_| Buf::with_capacity(items_per_buf)),
        ));
        let full = Arc::new(BufferQueue::new());
        let error = Arc::new(Mutex::new(None));

        let worker = {
            let empty = Arc::clone(&empty);
            let full = Arc::clone(&full);
            let error = Arc::clone(&error);
            let mut file = file;
            thread::spawn(move || loop {
                let buf = match full.pop_blocking() {
                    Some(b) => b,
                    None => break,
                };
                if buf.filled == 0 {
                    // Sentinel pushed by `finish()`.
                    break;
                }
                if let Err(e) = raw::write_all(&mut file, &buf.data[..buf.filled]) {
                    *error.lock().unwrap() = Some(e);
                    break;
                }
                let mut buf = buf;
                buf.filled = 0;
                empty.push(buf);
            })
        };

        Ok(StreamWriter {
            empty,
            full,
            worker: Some(worker),
            error,
            cur: Buf::with_capacity(items_per_buf),
            bytes_written: 0,
            path,
            finished: false,
        })
    }

    fn check_error(&self) -> Result<()> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(Error::io(&self.path, e));
        }
        Ok(())
    }

    pub fn write(&mut self, value: T) -> Result<()> {
        self.check_error()?;
        self.cur.data[self.cur.filled] = value;
        self.cur.filled += 1;
        self.bytes_written += raw::elem_size::<T>();
        if self.cur.filled == self.cur.data.len() {
            self.flush_current()?;
        }
        Ok(())
    }

    fn flush_current(&mut self) -> Result<()> {
        if self.cur.filled == 0 {
            return Ok(());
        }
        let next = self.empty.pop_blocking().unwrap_or_else(|| Buf::with_capacity(self.cur.data.len()));
        let full = std::mem::replace(&mut self.cur, next);
        self.full.push(full);
        self.check_error()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush the tail buffer and stop the worker, surfacing any pending
    /// I/O error. Idempotent.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.flush_current()?;
        let mut sentinel = Buf::with_capacity(0);
        sentinel.filled = 0;
        self.full.push(sentinel);
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
        self.check_error()
    }
}

impl<T: Elem> Drop for StreamWriter<T> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::stream_reader::StreamReader;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn writes_then_reads_back_raw() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w");
        {
            let mut w = StreamWriter::<u8>::with_buffers(&path, 8, 2).unwrap();
            for b in 0..255u8 {
                w.write(b).unwrap();
            }
            w.finish().unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, (0..255u8).collect::<Vec<_>>());
    }

    proptest! {
        // §8 invariant 7: writing a sequence with any writer and reading
        // it back with the matching reader yields the sequence, for any
        // combination of part sizes (here, buffer sizes) and buffer counts.
        #[test]
        fn round_trip_any_buffer_shape(
            values in prop::collection::vec(any::<u32>(), 0..500),
            write_buf_bytes in 4u64..128,
            write_n_buffers in 1u64..5,
            read_buf_bytes in 4u64..128,
            read_n_buffers in 1u64..5,
        ) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("s");
            {
                let mut w = StreamWriter::<u32>::with_buffers(&path, write_buf_bytes, write_n_buffers).unwrap();
                for &v in &values {
                    w.write(v).unwrap();
                }
                w.finish().unwrap();
            }
            let mut r = StreamReader::<u32>::with_buffers(&path, read_buf_bytes, read_n_buffers).unwrap();
            let mut got = Vec::new();
            while !r.is_empty().unwrap() {
                got.push(r.read().unwrap());
            }
            prop_assert_eq!(got, values);
        }
    }
}
