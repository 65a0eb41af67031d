//! End-to-end scenarios and cross-cutting invariants for suffix array
//! construction (text on disk in, suffix array on disk out).

use fsais_em::{Config, InMemoryRecursor};
use std::path::Path;
use tempfile::tempdir;

fn build(text: &[u8], max_block_size: u64) -> Vec<u32> {
    let dir = tempdir().unwrap();
    build_in(dir.path(), text, max_block_size)
}

fn build_in(dir: &Path, text: &[u8], max_block_size: u64) -> Vec<u32> {
    let text_path = dir.join("text");
    let sa_path = dir.join("sa");
    std::fs::write(&text_path, text).unwrap();
    let config = Config::new(1 << 20, max_block_size, dir);
    fsais_em::construct(&text_path, text.len() as u64, &sa_path, &config, &InMemoryRecursor).unwrap();

    let mut reader = fsais_em::io::StreamReader::<u32>::new(&sa_path).unwrap();
    let mut out = Vec::new();
    while !reader.is_empty().unwrap() {
        out.push(reader.read().unwrap());
    }
    out
}

fn suffix_array_of(text: &[u8], max_block_size: u64) -> Vec<u32> {
    build(text, max_block_size)[1..].to_vec()
}

#[test]
fn scenario_a() {
    assert_eq!(suffix_array_of(b"a", 64), vec![0]);
}

#[test]
fn scenario_ba() {
    assert_eq!(suffix_array_of(b"ba", 64), vec![1, 0]);
}

#[test]
fn scenario_mississippi() {
    assert_eq!(suffix_array_of(b"mississippi", 64), vec![10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]);
}

#[test]
fn scenario_aaaa() {
    assert_eq!(suffix_array_of(b"aaaa", 64), vec![3, 2, 1, 0]);
}

#[test]
fn scenario_abracadabra() {
    assert_eq!(suffix_array_of(b"abracadabra", 64), vec![10, 7, 0, 3, 5, 8, 1, 4, 6, 9, 2]);
}

#[test]
fn scenario_repeating_pair_small_alphabet() {
    // [5,4,5,4,5,4] over alphabet size 6.
    let text = [5u8, 4, 5, 4, 5, 4];
    let dir = tempdir().unwrap();
    let text_path = dir.path().join("text");
    let sa_path = dir.path().join("sa");
    std::fs::write(&text_path, &text).unwrap();
    let config = Config::new(1 << 20, 64, dir.path()).with_alphabet_size(6);
    fsais_em::construct(&text_path, text.len() as u64, &sa_path, &config, &InMemoryRecursor).unwrap();
    let mut reader = fsais_em::io::StreamReader::<u32>::new(&sa_path).unwrap();
    let mut out = Vec::new();
    while !reader.is_empty().unwrap() {
        out.push(reader.read().unwrap());
    }
    assert_eq!(&out[1..], &[5, 3, 1, 4, 2, 0]);
}

fn assert_is_permutation(sa: &[u32], n: usize) {
    let mut sorted = sa.to_vec();
    sorted.sort();
    assert_eq!(sorted, (0..n as u32).collect::<Vec<_>>());
}

fn assert_lexicographically_sorted(text: &[u8], sa: &[u32]) {
    for w in sa.windows(2) {
        let a = &text[w[0] as usize..];
        let b = &text[w[1] as usize..];
        assert!(a < b, "SA out of order: suffix at {} >= suffix at {}", w[0], w[1]);
    }
}

#[test]
fn sa_is_a_permutation_and_lexicographically_sorted() {
    for text in [&b"mississippi"[..], b"abracadabra", b"aaaa", b"ba", b"a", b"banana"] {
        let sa = suffix_array_of(text, 64);
        assert_is_permutation(&sa, text.len());
        assert_lexicographically_sorted(text, &sa);
    }
}

#[test]
fn single_block_and_multi_block_agree() {
    let text = b"abracadabramississippibanana";
    let whole = build(text, 1 << 20);
    let chunked = build(text, 3);
    assert_eq!(whole, chunked);
}

#[test]
fn n_equals_two_both_orderings() {
    assert_eq!(suffix_array_of(b"ab", 64), vec![0, 1]);
    assert_eq!(suffix_array_of(b"ba", 64), vec![1, 0]);
}

#[test]
fn block_size_one_matches_block_size_n() {
    let text = b"mississippi";
    assert_eq!(build(text, 1), build(text, text.len() as u64));
}

#[test]
fn alternating_highs_and_lows() {
    let text = b"zazazazaza";
    let sa = suffix_array_of(text, 64);
    assert_is_permutation(&sa, text.len());
    assert_lexicographically_sorted(text, &sa);
}

#[test]
fn alphabet_size_equals_text_length() {
    // Every symbol distinct: the SA is forced by a single comparison per pair.
    let text: Vec<u8> = (0..20u8).rev().collect();
    let sa = suffix_array_of(&text, 64);
    assert_is_permutation(&sa, text.len());
    assert_lexicographically_sorted(&text, &sa);
}

#[test]
fn fails_fast_on_zero_block_size() {
    let dir = tempdir().unwrap();
    let text_path = dir.path().join("text");
    std::fs::write(&text_path, b"abc").unwrap();
    let config = Config::new(1 << 20, 0, dir.path());
    let err = fsais_em::construct(&text_path, 3, &dir.path().join("sa"), &config, &InMemoryRecursor).unwrap_err();
    assert!(matches!(err, fsais_em::Error::ZeroBlockSize));
}

#[test]
fn reuses_temp_directory_across_two_runs() {
    let dir = tempdir().unwrap();
    let first = build_in(dir.path(), b"mississippi", 4);
    let second = build_in(dir.path(), b"banana", 4);
    assert_eq!(&first[1..], &[10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]);
    assert_eq!(&second[1..], &[5, 3, 1, 0, 4, 2]);
}

/// Independent, from-scratch reimplementation of the L/S/LMS classification
/// (§3's definitions, not this crate's `block::classify`), used below as an
/// oracle rather than a copy of what's under test.
fn oracle_lms_positions(text: &[u8]) -> Vec<usize> {
    let n = text.len();
    let mut is_s = vec![false; n];
    for i in (0..n.saturating_sub(1)).rev() {
        is_s[i] = text[i] < text[i + 1] || (text[i] == text[i + 1] && is_s[i + 1]);
    }
    (1..n).filter(|&i| is_s[i] && !is_s[i - 1]).collect()
}

/// Independent true LMS-substring extraction: each LMS position's substring
/// runs up to (and including) the next LMS position, or to the end of text
/// for the last one (no explicit sentinel byte, same convention `block.rs`
/// and `induce.rs` use throughout this crate).
fn oracle_lms_substrings<'a>(text: &'a [u8], lms: &[usize]) -> Vec<&'a [u8]> {
    lms.iter()
        .enumerate()
        .map(|(idx, &p)| {
            let end = lms.get(idx + 1).copied().unwrap_or(text.len() - 1);
            &text[p..=end]
        })
        .collect()
}

#[test]
fn lms_count_and_distinct_name_count_match_an_independent_oracle() {
    for text in [
        &b"mississippi"[..],
        b"abracadabra",
        b"banana",
        b"aaaa",
        b"ba",
        b"a",
        b"abcabcabc",
        b"zazazazaza",
    ] {
        let dir = tempdir().unwrap();
        let text_path = dir.path().join("text");
        let sa_path = dir.path().join("sa");
        std::fs::write(&text_path, text).unwrap();
        let config = Config::new(1 << 20, 4, dir.path());
        let stats =
            fsais_em::construct(&text_path, text.len() as u64, &sa_path, &config, &InMemoryRecursor).unwrap();

        let lms = oracle_lms_positions(text);
        assert_eq!(stats.lms_count, lms.len() as u64, "LMS count mismatch for {:?}", text);

        if lms.len() < 2 {
            continue;
        }
        let substrs = oracle_lms_substrings(text, &lms);
        let mut sorted = substrs.clone();
        sorted.sort();
        let distinct = sorted.windows(2).filter(|w| w[0] != w[1]).count() as u64 + 1;
        assert_eq!(
            stats.distinct_name_count, distinct,
            "distinct LMS-substring count mismatch for {:?}",
            text
        );
        assert_eq!(stats.diff_bit_count, distinct - 1, "diff-bit count mismatch for {:?}", text);
    }
}
