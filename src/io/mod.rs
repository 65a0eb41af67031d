//! Asynchronous, double-buffered disk I/O (§4.1, §5).
//!
//! Every streamer in this module follows the same shape: a foreground
//! side that the rest of the crate drives synchronously, and exactly one
//! background worker thread moving buffers between disk and the
//! foreground across a pair of blocking FIFOs (`pool::BufferQueue`). None
//! of these types are `Clone`; each owns its worker thread and joins it
//! on drop.

mod backward_reader;
mod bit_stream;
mod multi_stream;
mod multipart;
mod pool;
pub(crate) mod raw;
mod stream_reader;
mod stream_writer;

pub use backward_reader::BackwardStreamReader;
pub use bit_stream::{
    BackwardBitStreamReader, BackwardMultiBitStreamReader, BitStreamReader, BitStreamWriter,
    MultiBitStreamReader, MultiBitStreamWriter,
};
pub use multi_stream::{
    block_stream_path, BackwardMultiStreamReader, MultiStreamReader, MultiStreamWriter,
};
pub use multipart::{part_path, MultipartBackwardReader, MultipartWriter};
pub use raw::Elem;
pub use stream_reader::StreamReader;
pub use stream_writer::StreamWriter;
