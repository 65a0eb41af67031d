//! Backward asynchronous stream reader (§4.1 "Backward reader").
//!
//! Identical machinery to `StreamReader`, except the worker seeks
//! *backwards* by the amount it intends to read before reading, and seeks
//! backwards again afterwards, so each successive buffer holds the
//! elements immediately preceding the previous one. Within a buffer,
//! elements are handed out in reverse index order, so the observable
//! stream reads the file from its end towards its beginning.

use std::fs::File;
use std::io::{self, Seek};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::{DEFAULT_BUFFERS_PER_STREAM, DEFAULT_BUF_SIZE_BYTES};
use crate::error::{Error, Result};
use crate::io::pool::{Buf, BufferQueue};
use crate::io::raw::{self, Elem};

pub struct BackwardStreamReader<T: Elem> {
    empty: Arc<BufferQueue<Buf<T>>>,
    full: Arc<BufferQueue<Buf<T>>>,
    worker: Option<JoinHandle<()>>,
    error: Arc<Mutex<Option<io::Error>>>,
    cur: Option<Buf<T>>,
    /// Number of not-yet-consumed elements at the front of `cur`; consumed
    /// from the back, so this also indexes the next element to hand out.
    cur_remaining: usize,
    bytes_read: u64,
    path: PathBuf,
}

impl<T: Elem> BackwardStreamReader<T> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_buffers(path, DEFAULT_BUF_SIZE_BYTES, DEFAULT_BUFFERS_PER_STREAM, 0)
    }

    /// `skip_bytes` seeks back from the end of file before starting, so a
    /// caller can treat a known-size tail of the file as absent.
    pub fn with_buffers(
        path: impl AsRef<Path>,
        total_buf_size_bytes: u64,
        n_buffers: u64,
        skip_bytes: u64,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if n_buffers == 0 {
            return Err(Error::ZeroBuffers);
        }
        let mut file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        let file_len = raw::seek_end(&mut file).map_err(|e| Error::io(&path, e))?;
        let elem_size = raw::elem_size::<T>();
        if file_len % elem_size != 0 {
            return Err(Error::CorruptStream {
                path,
                reason: format!("length {} bytes is not a whole number of {}-byte elements", file_len, elem_size),
            });
        }
        if skip_bytes > 0 {
            raw::seek_relative(&mut file, -(skip_bytes as i64)).map_err(|e| Error::io(&path, e))?;
        }

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
                match read_backward(&mut file, &mut buf.data[..]) {
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

        Ok(BackwardStreamReader {
            empty,
            full,
            worker: Some(worker),
            error,
            cur: None,
            cur_remaining: 0,
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
                self.cur_remaining = buf.filled;
                self.cur = Some(buf);
            }
            None => {
                self.cur = None;
                self.cur_remaining = 0;
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

    pub fn is_empty(&mut self) -> Result<bool> {
        if self.cur_remaining == 0 {
            self.receive_new_buffer()?;
        }
        Ok(self.cur_remaining == 0)
    }

    pub fn read(&mut self) -> Result<T> {
        if self.is_empty()? {
            debug_assert!(false, "read() called on an exhausted backward stream reader");
            return Ok(T::default());
        }
        self.cur_remaining -= 1;
        let buf = self.cur.as_ref().unwrap();
        Ok(buf.data[self.cur_remaining])
    }

    pub fn peek(&mut self) -> Result<T> {
        if self.is_empty()? {
            debug_assert!(false, "peek() called on an exhausted backward stream reader");
            return Ok(T::default());
        }
        let buf = self.cur.as_ref().unwrap();
        Ok(buf.data[self.cur_remaining - 1])
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

/// Seek back by the capacity of `buf` (or to the start of file, whichever
/// is nearer), read forward into `buf`, then seek back over what was just
/// read so the next call continues towards the beginning of the file.
fn read_backward<T: Elem>(file: &mut File, buf: &mut [T]) -> io::Result<usize> {
    let pos = file.stream_position()?;
    if pos == 0 {
        return Ok(0);
    }
    let elem_size = raw::elem_size::<T>();
    let want = std::cmp::min(buf.len() as u64, pos / elem_size);
    raw::seek_relative(file, -((want * elem_size) as i64))?;
    let n = raw::read_some(file, &mut buf[..want as usize])?;
    raw::seek_relative(file, -((n as u64 * elem_size) as i64))?;
    Ok(n)
}

impl<T: Elem> Drop for BackwardStreamReader<T> {
    fn drop(&mut self) {
        self.empty.send_stop();
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
    }
}
