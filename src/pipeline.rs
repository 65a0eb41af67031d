//! Top-level orchestration (§2's "Leaves first" component list, read
//! top to bottom): stream the text in once, classify it, name
//! LMS-substrings, hand the reduced string to a [`Recursor`] if naming
//! didn't already fully distinguish them, then induce the final suffix
//! array from the result -- writing it straight to `sa_path` rather than
//! ever materialising the whole array in RAM.
//!
//! The classification and induction primitives this crate owns are
//! exercised here for real (and unit-tested on their own in `block` and
//! `induce`), but composing them into a self-certifying, multi-level
//! external recursion is the out-of-scope recursion driver's job; this
//! orchestrator delegates that one composition point -- sorting a reduced
//! string once naming collides -- to whatever [`Recursor`] the caller
//! supplies.

use std::collections::HashMap;
use std::path::Path;

use crate::block::{self, Classification};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::induce;
use crate::io::{StreamReader, StreamWriter};
use crate::recursion::Recursor;
use crate::utils::Clock;
use crate::windowed::BlockTextCache;

/// Summary statistics from a completed construction, logged at `info` and
/// handed back to the caller for its own diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructStats {
    pub text_length: u64,
    pub block_count: usize,
    pub lms_count: u64,
    pub diff_bit_count: u64,
    pub distinct_name_count: u64,
    pub recursed: bool,
    pub elapsed_secs: f64,
}

/// Build the suffix array of the text at `text_path` (`n` bytes, drawn
/// from an alphabet of `config.alphabet_size` symbols) and write it,
/// fixed-width `u32` per entry including the leading sentinel-length slot,
/// to `sa_path`.
pub fn construct(
    text_path: &Path,
    n: u64,
    sa_path: &Path,
    config: &Config,
    recursor: &dyn Recursor,
) -> Result<ConstructStats> {
    config.validate()?;
    if n == 0 {
        return Err(Error::ZeroTextLength);
    }
    let clock = Clock::start();

    let classification = block::classify(text_path, n, config.alphabet_size, config)?;
    log::debug!(
        "classified {} symbols into {} blocks, {} LMS positions",
        n,
        classification.blocks.len(),
        classification.lms_count
    );

    let lms_bits = block::load_lms_bits(&classification)?;
    let lms_positions: Vec<u64> = (0..n).filter(|&i| lms_bits[i as usize]).collect();
    let m = lms_positions.len() as u64;

    let (full_sorted_lms, diff_bit_count, distinct_name_count, recursed) = if m == 0 {
        (Vec::new(), 0, 0, false)
    } else {
        name_lms_substrings(text_path, n, &classification, &lms_bits, &lms_positions, config, recursor)?
    };

    let mut writer = StreamWriter::<u32>::new(sa_path)?;
    writer.write(n as u32)?;
    induce::two_pass_induce(
        text_path,
        n,
        &classification.type_bitmap_path,
        &classification.is_lms_bitmap_path,
        &classification.blocks,
        config.max_block_size,
        &full_sorted_lms,
        config.alphabet_size,
        config,
        |p, _flags| writer.write(p as u32),
    )?;
    writer.finish()?;

    for path in [
        &classification.type_path,
        &classification.is_lms_path,
        &classification.type_bitmap_path,
        &classification.is_lms_bitmap_path,
    ] {
        crate::utils::remove_file_if_exists(path);
    }

    let stats = ConstructStats {
        text_length: n,
        block_count: classification.blocks.len(),
        lms_count: classification.lms_count,
        diff_bit_count,
        distinct_name_count,
        recursed,
        elapsed_secs: clock.elapsed_secs(),
    };
    log::debug!(
        "construction of {} symbols finished in {:.3}s ({} diff bits among {} LMS positions, {} distinct names, recursed={})",
        n, stats.elapsed_secs, stats.diff_bit_count, stats.lms_count, stats.distinct_name_count, stats.recursed
    );
    Ok(stats)
}

/// §4.4: sort LMS-substrings by induction, name them by their diff bits,
/// and resolve the reduced string's own suffix order -- either directly,
/// if naming already distinguished every LMS-substring, or by handing the
/// reduced string to `recursor` (§4.5's "external collaborator"). Returns
/// the fully sorted LMS-*suffix* positions (in text coordinates, ready to
/// seed the final induction), the diff-bit diagnostic, the distinct name
/// count, and whether recursion was needed.
fn name_lms_substrings(
    text_path: &Path,
    n: u64,
    classification: &Classification,
    lms_bits: &[bool],
    lms_positions: &[u64],
    config: &Config,
    recursor: &dyn Recursor,
) -> Result<(Vec<u64>, u64, u64, bool)> {
    let m = lms_positions.len() as u64;

    let mut lms_order = Vec::with_capacity(m as usize);
    induce::two_pass_induce(
        text_path,
        n,
        &classification.type_bitmap_path,
        &classification.is_lms_bitmap_path,
        &classification.blocks,
        config.max_block_size,
        lms_positions,
        config.alphabet_size,
        config,
        |p, _flags| {
            if lms_bits[p as usize] {
                lms_order.push(p);
            }
            Ok(())
        },
    )?;
    debug_assert_eq!(lms_order.len() as u64, m, "induction must visit every LMS position exactly once");

    let diff_bit_count = induce::diff_bit_count(text_path, n, config.max_block_size, &lms_order)?;

    // Name each sorted LMS-substring: 0 for the first, incrementing every
    // time a real equality check (not the induction's own cheap hint)
    // finds a boundary against the previous one.
    let mut names = vec![0u32; m as usize];
    {
        let mut left = BlockTextCache::new(text_path, n, config.max_block_size)?;
        let mut right = BlockTextCache::new(text_path, n, config.max_block_size)?;
        for idx in 1..m as usize {
            let same = induce::lms_substr_eq_windowed(&mut left, &mut right, n, lms_order[idx - 1], lms_order[idx])?;
            names[idx] = names[idx - 1] + if same { 0 } else { 1 };
        }
    }
    let distinct_name_count = u64::from(names[m as usize - 1]) + 1;
    debug_assert_eq!(diff_bit_count, distinct_name_count - 1);

    let pos_to_name: HashMap<u64, u32> = lms_order.iter().copied().zip(names.iter().copied()).collect();
    let reduced: Vec<u32> = lms_positions.iter().map(|&p| pos_to_name[&p]).collect();

    let (sorted_idx, recursed): (Vec<u32>, bool) = if distinct_name_count == m {
        // 5.a: LMS-substrings already pairwise distinct, so their sorted
        // order *is* the sorted order of the LMS-suffixes they start --
        // just map each one back to its index in `lms_positions`, no
        // recursion needed (mirrors `llhsais::sort_lms_suffixes` step 5.a).
        let text_pos_to_idx: HashMap<u64, u32> =
            lms_positions.iter().enumerate().map(|(i, &p)| (p, i as u32)).collect();
        let idx = lms_order.iter().map(|p| text_pos_to_idx[p]).collect();
        (idx, false)
    } else {
        // 5.b: hand the reduced string to the recursion driver and read
        // its sorted suffix order back (`sub_sa[0]` is scratch; see
        // `Recursor`'s doc comment).
        let mut sub_sa = vec![0u32; m as usize + 1];
        recursor.construct(&reduced, distinct_name_count as usize, &mut sub_sa);
        (sub_sa[1..].to_vec(), true)
    };

    let full_sorted_lms: Vec<u64> = sorted_idx.iter().map(|&i| lms_positions[i as usize]).collect();
    Ok((full_sorted_lms, diff_bit_count, distinct_name_count, recursed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recursion::InMemoryRecursor;
    use tempfile::tempdir;

    fn run(s: &[u8], max_block_size: u64) -> Vec<u32> {
        let dir = tempdir().unwrap();
        let text_path = dir.path().join("text");
        let sa_path = dir.path().join("sa");
        std::fs::write(&text_path, s).unwrap();
        let config = Config::new(1 << 20, max_block_size, dir.path());
        construct(&text_path, s.len() as u64, &sa_path, &config, &InMemoryRecursor).unwrap();

        let mut reader = StreamReader::<u32>::new(&sa_path).unwrap();
        let mut out = Vec::new();
        while !reader.is_empty().unwrap() {
            out.push(reader.read().unwrap());
        }
        out
    }

    #[test]
    fn mississippi() {
        let sa = run(b"mississippi", 64);
        assert_eq!(&sa[1..], &[10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]);
    }

    #[test]
    fn single_character() {
        let sa = run(b"a", 64);
        assert_eq!(&sa[1..], &[0]);
    }

    #[test]
    fn two_characters_descending() {
        let sa = run(b"ba", 64);
        assert_eq!(&sa[1..], &[1, 0]);
    }

    #[test]
    fn abracadabra() {
        let sa = run(b"abracadabra", 64);
        assert_eq!(&sa[1..], &[10, 7, 0, 3, 5, 8, 1, 4, 6, 9, 2]);
    }

    #[test]
    fn repeated_character_has_no_lms_and_needs_no_naming_pass() {
        // Every position shares the same L-type run, so `m == 0` and the
        // naming/recursion machinery is skipped entirely.
        let sa = run(b"aaaa", 64);
        assert_eq!(&sa[1..], &[3, 2, 1, 0]);
    }

    #[test]
    fn forces_recursion_when_lms_substrings_collide() {
        // "abcabcabcabc": LMS-substrings are "abca", "abca", "abc" -- the
        // first two collide, so naming alone can't distinguish all three and
        // must hand a reduced string to the recursor.
        let sa = run(b"abcabcabcabc", 3);
        let mut sorted = sa[1..].to_vec();
        sorted.sort();
        assert_eq!(sorted, (0..12u32).collect::<Vec<_>>());
    }

    #[test]
    fn is_a_permutation_for_small_blocks() {
        // Force multiple blocks to exercise the classifier's per-block
        // bookkeeping even on tiny input.
        let sa = run(b"abracadabra", 3);
        let mut sorted = sa[1..].to_vec();
        sorted.sort();
        assert_eq!(sorted, (0..11u32).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_empty_text() {
        let dir = tempdir().unwrap();
        let text_path = dir.path().join("text");
        std::fs::write(&text_path, b"").unwrap();
        let config = Config::new(1 << 20, 64, dir.path());
        let err = construct(&text_path, 0, &dir.path().join("sa"), &config, &InMemoryRecursor).unwrap_err();
        assert!(matches!(err, Error::ZeroTextLength));
    }
}
