//! The empty/full buffer-queue pair shared by every streamer worker.
//!
//! This is the Rust analogue of the original's `buffer_queue`: a
//! `std::queue<buffer*>` guarded by a mutex and condition variable. Rather
//! than an arena of raw pointers handed between queues (the "pointer-heavy
//! buffer queues" pattern flagged for re-architecture), buffers here are
//! plain owned `Vec<T>` that move between queues by value -- Rust's
//! ownership transfer already gives us the arena-and-index discipline for
//! free, with the compiler enforcing that only one side touches a buffer
//! at a time.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A reusable, fixed-capacity buffer. `filled` may be less than
/// `data.len()` (the last buffer of a stream, or a short read).
pub struct Buf<T> {
    pub data: Vec<T>,
    pub filled: usize,
}

impl<T: Default + Clone> Buf<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Buf { data: vec![T::default(); capacity], filled: 0 }
    }
}

/// A blocking FIFO of buffers, with cooperative shutdown.
pub struct BufferQueue<T> {
    inner: Mutex<Inner<T>>,
    cv: Condvar,
}

struct Inner<T> {
    items: VecDeque<T>,
    stopped: bool,
}

impl<T> Default for BufferQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BufferQueue<T> {
    pub fn new() -> Self {
        BufferQueue { inner: Mutex::new(Inner { items: VecDeque::new(), stopped: false }), cv: Condvar::new() }
    }

    pub fn with_items(items: impl IntoIterator<Item = T>) -> Self {
        let q = Self::new();
        {
            let mut g = q.inner.lock().unwrap();
            g.items.extend(items);
        }
        q
    }

    pub fn push(&self, item: T) {
        let mut g = self.inner.lock().unwrap();
        g.items.push_back(item);
        self.cv.notify_one();
    }

    /// Block until an item is available or the queue has been stopped with
    /// nothing left in it.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut g = self.inner.lock().unwrap();
        while g.items.is_empty() && !g.stopped {
            g = self.cv.wait(g).unwrap();
        }
        g.items.pop_front()
    }

    pub fn send_stop(&self) {
        let mut g = self.inner.lock().unwrap();
        g.stopped = true;
        self.cv.notify_all();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().items.is_empty()
    }
}
