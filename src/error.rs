use std::io;
use std::path::PathBuf;

/// Coarse error taxonomy for the external-memory induction pipeline.
///
/// Intermediate state spans many files and many gigabytes; partial recovery
/// would require a write-ahead log this system does not have, so almost
/// every variant here is meant to be fatal to the run that produced it (the
/// caller decides what "fatal" means -- the library itself only ever
/// returns `Result`, it never aborts the process).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("RAM budget {ram_use} is too small for {n_buffers} buffers of at least 1 byte each")]
    RamBudgetTooSmall { ram_use: u64, n_buffers: u64 },

    #[error("max_block_size must be nonzero")]
    ZeroBlockSize,

    #[error("n_buffers must be nonzero")]
    ZeroBuffers,

    #[error("integer type of width {width_bits} bits cannot address {needed} distinct values")]
    NarrowIntegerWidth { width_bits: u32, needed: u64 },

    #[error("alphabet size must be nonzero")]
    ZeroAlphabet,

    #[error("text length must be nonzero")]
    ZeroTextLength,

    #[error("multi-part stream {path} has 0 declared parts")]
    ZeroParts { path: PathBuf },

    #[error("corrupt intermediate stream {path}: {reason}")]
    CorruptStream { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
