//! Forward asynchronous stream reader (§4.1 "Forward reader").
//!
//! A dedicated worker thread keeps reading buffers ahead of the foreground
//! consumer: it pops an empty buffer, fills it from the current file
//! position, and hands it to the foreground via the `full` queue. The
//! foreground blocks only when it has drained every buffer the worker has
//! produced so far. A read past end of file is not an error -- the worker
//! signals `full` to stop and `is_empty()` starts returning `true`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::{DEFAULT_BUFFERS_PER_STREAM, DEFAULT_BUF_SIZE_BYTES};
use crate::error::{Error, Result};
use crate::io::pool::{Buf, BufferQueue};
use crate::io::raw::{self, Elem};

pub struct StreamReader<T: Elem> {
    empty: Arc<BufferQueue<Buf<T>>>,
    full: Arc<BufferQueue<Buf<T>>>,
    worker: Option<JoinHandle<()>>,
    error: Arc<Mutex<Option<io::Error>>>,
    cur: Option<Buf<T>>,
    cur_pos: usize,
    bytes_read: u64,
    path: PathBuf,
}

impl<T: Elem> StreamReader<T> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_buffers(path, DEFAULT_BUF_SIZE_BYTES, DEFAULT_BUFFERS_PER_STREAM)
    }

    pub fn with_buffers(path: impl AsRef<Path>, total_buf_size_bytes: u64, n_buffers: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if n_buffers == 0 {
            return Err(Error::ZeroBuffers);
        }
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;

        let elem_size = raw::elem_size::<T>();
        let total_items = std::cmp::max(1, total_buf_size_bytes / elem_size.max(1));
        let items_per_buf = std::cmp::max(1, total_items / n_buffers) as usize;

        let empty = Arc::new(BufferQueue::with_items(
            (0..n_buffers).map(|_| Buf::with_capacity(items_per_buf)),
        ));
        let full = Arc::new(BufferQueue::new());
        let error = Arc::new(Mutex::new(None));

        let worker = {
            let empty = Arc::clone(&empty);
            let full = Arc::clone(&full);
            let error = Arc::clone(&error);
            let mut file = file;
            thread::spawn(move || loop {
                let mut buf = match empty.pop_blocking() {
                    Some(b) => b,
                    None => break,
                };
                match raw::read_some(&mut file, &mut buf.data[..]) {
                    Ok(n) => {
                        buf.filled = n;
                        if n == 0 {
                            empty.push(buf);
                            full.send_stop();
                            break;
                        }
                        full.push(buf);
                    }
                    Err(e) => {
                        *error.lock().unwrap() = Some(e);
                        full.send_stop();
                        break;
                    }
                }
            })
        };

        Ok(StreamReader {
            empty,
            full,
            worker: Some(worker),
            error,
            cur: None,
            cur_pos: 0,
            bytes_read: 0,
            path,
        })
    }

    fn receive_new_buffer(&mut self) -> Result<()> {
        if let Some(mut buf) = self.cur.take() {
            buf.filled = 0;
            self.empty.push(buf);
        }
        match self.full.pop_blocking() {
            Some(buf) => {
                self.bytes_read += buf.filled as u64 * raw::elem_size::<T>();
                self.cur_pos = 0;
                self.cur = Some(buf);
            }
            None => {
                self.cur = None;
                self.cur_pos = 0;
            }
        }
        self.check_error()
    }

    fn check_error(&self) -> Result<()> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(Error::io(&self.path, e));
        }
        Ok(())
    }

    fn cur_filled(&self) -> usize {
        self.cur.as_ref().map(|b| b.filled).unwrap_or(0)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        if self.cur_pos >= self.cur_filled() {
            self.receive_new_buffer()?;
        }
        Ok(self.cur_pos >= self.cur_filled())
    }

    pub fn read(&mut self) -> Result<T> {
        if self.is_empty()? {
            debug_assert!(false, "read() called on an exhausted stream reader");
            return Ok(T::default());
        }
        let buf = self.cur.as_ref().unwrap();
        let v = buf.data[self.cur_pos];
        self.cur_pos += 1;
        Ok(v)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<T: Elem> Drop for StreamReader<T> {
    fn drop(&mut self) {
        self.empty.send_stop();
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::stream_writer::StreamWriter;
    use tempfile::tempdir;

    #[test]
    fn round_trips_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s");
        {
            let mut w = StreamWriter::<u32>::new(&path).unwrap();
            for i in 0..10_000u32 {
                w.write(i).unwrap();
            }
            w.finish().unwrap();
        }
        let mut r = StreamReader::<u32>::with_buffers(&path, 64, 3).unwrap();
        let mut got = Vec::new();
        while !r.is_empty().unwrap() {
            got.push(r.read().unwrap());
        }
        assert_eq!(got, (0..10_000u32).collect::<Vec<_>>());
    }
}
