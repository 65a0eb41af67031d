//! External-memory suffix array construction via induced sorting, for
//! texts too large to hold in RAM alongside their suffix array.
//!
//! The algorithm is the same induced-sorting (SA-IS) family used by
//! [`construct`]'s in-memory base case -- [Nong, Practical linear-time
//! O(1)-workspace suffix sorting for constant
//! alphabets](https://dl.acm.org/citation.cfm?doid=2493175.2493180) --
//! generalised to stream its working set through a small set of disk-backed
//! primitives: an asynchronous double-buffered stream layer ([`io`]), a
//! monotone external-memory radix heap ([`radix_heap`]) that replaces the
//! in-memory algorithm's bucket arrays, and a pair of induction scans
//! ([`induce`]) built on top of both. [`block`] partitions the text and
//! runs the classification pass those scans depend on. Composing these
//! into a full, recursively-correct construction is the caller's job,
//! modelled by the [`recursion::Recursor`] trait; [`pipeline::construct`]
//! is the reference orchestration, and [`recursion::InMemoryRecursor`] a
//! ready-made recursor for anything that fits in RAM.

pub mod block;
pub mod config;
mod construct;
pub mod error;
pub mod induce;
pub mod io;
#[cfg(feature = "pack")]
pub mod pack;
pub mod pipeline;
pub mod radix_heap;
pub mod recursion;
pub mod utils;
pub mod windowed;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{construct, ConstructStats};
pub use recursion::{InMemoryRecursor, Recursor};
