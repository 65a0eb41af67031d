//! Small ambient helpers shared across the induction pipeline: wall-clock
//! timing for log messages, and random names for intermediate files.
//!
//! These replace the free functions gathered under `utils::` in the
//! original C++ (`utils::wclock`, `utils::random_string_hash`,
//! `utils::file_size`) with explicit parameters instead of hidden global
//! state, per the "singletons for utilities" redesign guidance: nothing
//! here is a singleton, callers pass in what they need.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::Rng;

use crate::error::{Error, Result};

/// A started wall clock, for the per-pass timing lines emitted via `log`.
#[derive(Debug, Clone, Copy)]
pub struct Clock(Instant);

impl Clock {
    pub fn start() -> Self {
        Clock(Instant::now())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.0.elapsed().as_secs_f64()
    }
}

/// Generate a random hexadecimal suffix for an intermediate file name,
/// the equivalent of `utils::random_string_hash()`.
pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..16).map(|_| format!("{:x}", rng.gen_range(0, 16))).collect()
}

/// Build a path for an intermediate stream under `dir`, named
/// `<prefix>.<random>` so concurrent runs never collide.
pub fn temp_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}.{}", prefix, random_suffix()))
}

pub fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path).map(|m| m.len()).map_err(|e| Error::io(path, e))
}

/// Remove a file if it exists; used when unlinking intermediate streams.
/// Per spec, the pragmatic policy is: retain intermediates on failure (for
/// debugging), unlink on success -- so this is only ever called from the
/// success path of the pipeline.
pub fn remove_file_if_exists(path: &Path) {
    let _ = fs::remove_file(path);
}

/// Smallest unsigned bit width able to address `count` distinct values
/// (i.e. `ceil(log2(max(count, 1)))`), used to size packed heap-value
/// fields per the "narrowest integer meeting the width precondition" rule.
pub fn bits_to_address(count: u64) -> u32 {
    if count <= 1 {
        0
    } else {
        64 - (count - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_to_address_examples() {
        assert_eq!(bits_to_address(0), 0);
        assert_eq!(bits_to_address(1), 0);
        assert_eq!(bits_to_address(2), 1);
        assert_eq!(bits_to_address(3), 2);
        assert_eq!(bits_to_address(256), 8);
        assert_eq!(bits_to_address(257), 9);
    }

    #[test]
    fn random_suffix_is_nonempty_hex() {
        let s = random_suffix();
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
