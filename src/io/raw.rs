//! Fixed-width element I/O on top of `std::fs::File`.
//!
//! Streams are raw element arrays on disk: no framing, no length prefix,
//! just `n * size_of::<T>()` bytes. `T` must be a plain fixed-width integer
//! so reinterpreting its backing bytes is sound; this module is the only
//! place that reaches for that unsafe cast.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::mem::size_of;
use std::slice;

/// Marker for types this module is allowed to blit to/from disk.
///
/// # Safety
/// Implementors must have no padding and be valid for any bit pattern.
pub unsafe trait Elem: Copy + Default + Send + Sync + 'static {}

unsafe impl Elem for u8 {}
unsafe impl Elem for u16 {}
unsafe impl Elem for u32 {}
unsafe impl Elem for u64 {}

fn as_bytes_mut<T: Elem>(buf: &mut [T]) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut u8, buf.len() * size_of::<T>()) }
}

fn as_bytes<T: Elem>(buf: &[T]) -> &[u8] {
    unsafe { slice::from_raw_parts(buf.as_ptr() as *const u8, buf.len() * size_of::<T>()) }
}

/// Read up to `buf.len()` elements, returning how many were actually read
/// (short reads happen only at end of file, matching `fread`'s contract).
pub fn read_some<T: Elem>(file: &mut File, buf: &mut [T]) -> io::Result<usize> {
    let bytes = as_bytes_mut(buf);
    let mut total = 0usize;
    while total < bytes.len() {
        let n = file.read(&mut bytes[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total / size_of::<T>())
}

pub fn write_all<T: Elem>(file: &mut File, buf: &[T]) -> io::Result<()> {
    file.write_all(as_bytes(buf))
}

pub fn seek_end(file: &mut File) -> io::Result<u64> {
    file.seek(SeekFrom::End(0))
}

pub fn seek_relative(file: &mut File, delta: i64) -> io::Result<u64> {
    file.seek(SeekFrom::Current(delta))
}

pub fn elem_size<T: Elem>() -> u64 {
    size_of::<T>() as u64
}
