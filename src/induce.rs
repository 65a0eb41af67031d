//! Induced-sorting primitives shared by LMS-substring naming (§4.4) and
//! final-suffix placement (§4.5-4.6).
//!
//! Both stages are the same shape: an induce-L pass (ascending characters,
//! front-of-bucket first) followed by an induce-S pass (descending
//! characters, back-of-bucket first) over the *first* pass's own output,
//! read backward, with the LMS entries that seeded pass 1 dropped before
//! they seed pass 2 (mirroring the array algorithm's `clear_lms` between
//! its own two induce calls). [`two_pass_induce`] is that shared
//! composition: [`crate::pipeline::construct`] seeds it once with LMS
//! positions in text order to name LMS-substrings, and again with the
//! correctly sorted LMS-*suffixes* to place the final suffix array.
//!
//! The array algorithm gets two things for free that this external
//! translation has to reconstruct explicitly:
//!
//! - **The `n-1` anchor.** `sa[0] = n` (the empty-suffix sentinel) is
//!   never an LMS position, so no caller ever seeds it -- yet processing
//!   array slot 0 is what starts the entire induce-L chain in the
//!   textbook algorithm (it's always L-type, so it's always chased).
//!   Both passes of [`two_pass_induce`] need this, not only the final
//!   stage: naming "mississippi" never discovers position 10 at all
//!   without it, since no LMS seed chases that far. Pass 1 pushes `n-1`
//!   itself, as a chase (see below), before consuming the real seed list.
//! - **Head-before-tail priority within a bucket.** In the array, a
//!   bucket's head region (positions reached by chasing an L-predecessor)
//!   physically sits before its tail region (positions seeded directly),
//!   so an ascending scan always visits a bucket's chases before its
//!   seeds. A heap keyed only on `(character, arrival order)` loses that:
//!   seeds are pushed before extraction starts, so they'd always win ties
//!   against a chase discovered later, backwards from the array's
//!   head-first order. Every key therefore carries a one-bit *generation*
//!   above the arrival-order tiebreak -- `0` for a chased predecessor,
//!   `1` for an upfront seed -- so a chase always outranks a seed sharing
//!   its bucket, regardless of when either was pushed.
//!
//! Neither pass holds the text, the type bitmap, or its own output fully
//! resident: the text/type lookups go through [`crate::windowed`]'s
//! bounded-RAM caches, and a pass's output -- which can be as large as the
//! whole text for the final-suffix stage -- streams through a
//! [`crate::io::MultipartWriter`]/[`crate::io::MultipartBackwardReader`]
//! pair instead of an in-memory `Vec`.
//!
//! Every heap value packs `(block_id, in-block offset, flags)` rather than
//! a raw position (§4.4 "the value field must be at least 2 bits wider
//! than needed to address blocks"): `is_head_plus`/`is_tail_plus` record
//! whether the position itself, and its successor, are S-type, and
//! `is_diff` is a cheap bucket-crossing hint toward the real LMS-substring
//! comparison [`diff_bit_count`] performs for naming. Below
//! [`SMALL_ALPHABET_THRESHOLD`] symbols a resident `seen_bucket[c]` table
//! makes that hint free; above it (§4.4 "alphabet dispatch") the table is
//! skipped and the hint is always `false`, leaving every comparison to the
//! caller's real equality check.

use std::path::Path;

use crate::block::{block_of, BlockInfo};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::io::{MultipartBackwardReader, MultipartWriter};
use crate::radix_heap::RadixHeap;
use crate::utils::bits_to_address;
use crate::windowed::{BlockTextCache, RandomAccessBitmap};

const STEP_BITS: u32 = 39;
const STEP_MASK: u64 = (1u64 << STEP_BITS) - 1;

/// Above the step tiebreak, one bit of *generation*: `0` for a
/// chase-discovered predecessor, `1` for an upfront seed. A chase always
/// sorts before a seed sharing the same character bucket, matching the
/// array algorithm's head-before-tail layout (see the module doc comment).
const GEN_CHASE: u64 = 0;
const GEN_SEED: u64 = 1;

/// Below this many symbols, a resident `bool` table keyed by character is
/// cheap enough to keep for the `is_diff` bucket-crossing hint; above it,
/// the table is skipped entirely (§4.4 "alphabet dispatch").
const SMALL_ALPHABET_THRESHOLD: u64 = 1 << 16;

/// Flags packed into the low bits of every heap value alongside the
/// position. `is_head_plus`/`is_tail_plus` name the position's own type
/// and its successor's (`plus` = S-type, per the glossary); `is_diff` is
/// the cheap "definitely starts a new LMS-substring name" hint.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Flags {
    pub is_head_plus: bool,
    pub is_tail_plus: bool,
    pub is_diff: bool,
}

const FLAG_BITS: u32 = 3;

impl Flags {
    fn pack(self) -> u64 {
        self.is_head_plus as u64 | (self.is_tail_plus as u64) << 1 | (self.is_diff as u64) << 2
    }

    fn unpack(bits: u64) -> Self {
        Flags { is_head_plus: bits & 1 != 0, is_tail_plus: bits & 2 != 0, is_diff: bits & 4 != 0 }
    }
}

struct ValueLayout {
    offset_bits: u32,
}

impl ValueLayout {
    /// Checks the "narrowest integer meeting the width precondition" rule
    /// (`crate::utils::bits_to_address`'s doc) both ways a packed `u64` can
    /// be too narrow here: the heap key's character term must fit beside
    /// the generation bit and the step tiebreak, and the heap value's block
    /// id must fit beside its in-block offset and flag bits.
    fn new(block_size: u64, block_count: u64, alphabet_size: u64) -> Result<Self> {
        let term_bits = bits_to_address(alphabet_size.max(1));
        let available_for_term = 64u32.saturating_sub(STEP_BITS + 1);
        if term_bits > available_for_term {
            return Err(Error::NarrowIntegerWidth { width_bits: available_for_term, needed: alphabet_size });
        }

        let offset_bits = bits_to_address(block_size.max(1));
        let available_for_block_id = 64u32.saturating_sub(offset_bits + FLAG_BITS);
        if available_for_block_id < 64 && block_count > (1u64 << available_for_block_id) {
            return Err(Error::NarrowIntegerWidth { width_bits: available_for_block_id, needed: block_count });
        }

        Ok(ValueLayout { offset_bits })
    }

    fn pack(&self, block_id: usize, offset: u64, flags: Flags) -> u64 {
        ((block_id as u64) << (self.offset_bits + FLAG_BITS)) | (offset << FLAG_BITS) | flags.pack()
    }

    fn unpack(&self, value: u64) -> (usize, u64, Flags) {
        let flags = Flags::unpack(value & ((1 << FLAG_BITS) - 1));
        let offset = (value >> FLAG_BITS) & ((1u64 << self.offset_bits) - 1);
        let block_id = (value >> (self.offset_bits + FLAG_BITS)) as usize;
        (block_id, offset, flags)
    }
}

fn char_term(c: u8, ascending: bool, alphabet_size: u64) -> u64 {
    if ascending {
        c as u64
    } else {
        (alphabet_size - 1) - c as u64
    }
}

fn make_key(term: u64, generation: u64, step: u64) -> u64 {
    debug_assert!(step <= STEP_MASK, "induction ran long enough to overflow the step tiebreak");
    debug_assert!(generation <= 1);
    (term << (STEP_BITS + 1)) | (generation << STEP_BITS) | (step & STEP_MASK)
}

/// Push `p` into the heap at `(character(p), generation, step)`, computing
/// its flags the same way regardless of whether it arrived as an upfront
/// seed or a chase discovery.
#[allow(clippy::too_many_arguments)]
fn push_position(
    heap: &mut RadixHeap,
    text: &mut BlockTextCache,
    type_is_s: &mut RandomAccessBitmap,
    layout: &ValueLayout,
    blocks: &[BlockInfo],
    n: u64,
    p: u64,
    ascending: bool,
    alphabet_size: u64,
    generation: u64,
    step: u64,
) -> Result<()> {
    let bid = block_of(blocks, p);
    let offset = p - blocks[bid].start;
    let c = text.get(p)?;
    let is_head_plus = type_is_s.get(p)?;
    let is_tail_plus = if p + 1 < n { type_is_s.get(p + 1)? } else { false };
    let value = layout.pack(bid, offset, Flags { is_head_plus, is_tail_plus, is_diff: false });
    heap.push(make_key(char_term(c, ascending, alphabet_size), generation, step), value)
}

/// One induction scan (§4.4's dual state machine, generalised over
/// direction): pulls seed positions from `next_seed` (front-to-back order
/// for `induce_l`'s ascending/FIFO discipline, already-reversed for
/// `induce_s`'s descending/LIFO one), follows "predecessor is
/// `want_predecessor_is_s`" chains, and calls `emit` once per extracted
/// position with the flags that position carried in its heap value.
///
/// `anchor` seeds the one position no caller's seed list ever names: `n-1`,
/// chased the moment array slot 0 (the `sa[0] = n` sentinel) would be
/// visited in the textbook algorithm. It's pushed as a chase (generation
/// [`GEN_CHASE`]), not a seed, so it takes head-of-bucket priority over any
/// real seed sharing its character -- see the module doc comment. Only
/// [`two_pass_induce`]'s first (induce-L) call ever passes `Some`.
///
/// `block_count[k]` (§3's per-block bookkeeping) is tracked alongside as a
/// sanity bound, logged at the end rather than asserted against an a
/// priori target, since a single pass's final per-block count depends on
/// which predecessor chains actually get discovered.
#[allow(clippy::too_many_arguments)]
fn run_pass_core(
    text_path: &Path,
    n: u64,
    type_bitmap_path: &Path,
    blocks: &[BlockInfo],
    block_size: u64,
    heap_ram_budget: u64,
    anchor: Option<u64>,
    mut next_seed: impl FnMut() -> Result<Option<u64>>,
    want_predecessor_is_s: bool,
    ascending: bool,
    alphabet_size: u64,
    config: &Config,
    mut emit: impl FnMut(u64, Flags) -> Result<()>,
) -> Result<()> {
    let mut text = BlockTextCache::new(text_path, n, block_size)?;
    let mut type_is_s = RandomAccessBitmap::new(type_bitmap_path)?;
    let max_key = make_key(alphabet_size.saturating_sub(1), GEN_SEED, STEP_MASK);
    let mut heap = RadixHeap::new(config, max_key, std::cmp::max(heap_ram_budget, 1));
    let layout = ValueLayout::new(block_size, blocks.len() as u64, alphabet_size)?;

    let small_alphabet = alphabet_size <= SMALL_ALPHABET_THRESHOLD;
    let mut seen_bucket: Vec<bool> = if small_alphabet { vec![false; alphabet_size as usize] } else { Vec::new() };
    let mut block_count = vec![0u64; blocks.len().max(1)];

    let mut chase_step: u64 = 0;
    if let Some(p) = anchor {
        push_position(&mut heap, &mut text, &mut type_is_s, &layout, blocks, n, p, ascending, alphabet_size, GEN_CHASE, chase_step)?;
        chase_step += 1;
    }

    let mut seed_step: u64 = 0;
    while let Some(p) = next_seed()? {
        push_position(&mut heap, &mut text, &mut type_is_s, &layout, blocks, n, p, ascending, alphabet_size, GEN_SEED, seed_step)?;
        seed_step += 1;
    }

    while let Some((key, value)) = heap.extract_min()? {
        let term = key >> (STEP_BITS + 1);
        let (bid, offset, mut flags) = layout.unpack(value);
        let p = blocks[bid].start + offset;
        block_count[bid] += 1;
        debug_assert!(
            (block_count[bid] as u64) <= blocks[bid].len(),
            "block {} induced more positions ({}) than it contains ({})",
            bid,
            block_count[bid],
            blocks[bid].len()
        );

        if small_alphabet {
            let c = if ascending { term } else { alphabet_size - 1 - term } as usize;
            flags.is_diff = !seen_bucket[c];
            seen_bucket[c] = true;
        }

        emit(p, flags)?;

        if p == 0 {
            chase_step += 1;
            continue;
        }
        let pred = p - 1;
        if type_is_s.get(pred)? == want_predecessor_is_s {
            push_position(
                &mut heap,
                &mut text,
                &mut type_is_s,
                &layout,
                blocks,
                n,
                pred,
                ascending,
                alphabet_size,
                GEN_CHASE,
                chase_step,
            )?;
        }
        chase_step += 1;
    }
    log::debug!(
        "induction pass ({}) finished: {} blocks touched, {} positions total",
        if ascending { "ascending/L" } else { "descending/S" },
        block_count.iter().filter(|&&c| c > 0).count(),
        block_count.iter().sum::<u64>(),
    );
    Ok(())
}

fn seed_from_slice(seeds: &[u64]) -> impl FnMut() -> Result<Option<u64>> + '_ {
    let mut it = seeds.iter();
    move || Ok(it.next().copied())
}

fn seed_from_backward_reader(reader: &mut MultipartBackwardReader<u64>) -> impl FnMut() -> Result<Option<u64>> + '_ {
    move || {
        if reader.is_empty()? {
            Ok(None)
        } else {
            Ok(Some(reader.read()?))
        }
    }
}

/// Like [`seed_from_backward_reader`], but drops positions the `is_lms`
/// bitmap marks as LMS -- the external equivalent of the array algorithm's
/// `clear_lms`: pass 1's own LMS-seeded entries must not re-seed pass 2.
fn seed_from_backward_reader_excluding_lms<'a>(
    reader: &'a mut MultipartBackwardReader<u64>,
    is_lms: &'a mut RandomAccessBitmap,
) -> impl FnMut() -> Result<Option<u64>> + 'a {
    move || loop {
        if reader.is_empty()? {
            return Ok(None);
        }
        let p = reader.read()?;
        if !is_lms.get(p)? {
            return Ok(Some(p));
        }
    }
}

fn remove_multipart(base: &Path, n_parts: u64) {
    for i in 1..=n_parts {
        crate::utils::remove_file_if_exists(&crate::io::part_path(base, i));
    }
}

/// The shared two-pass composition of §4.4 and §4.5-4.6: induce-L forward
/// over `initial_seeds_ascending` (plus the implicit `n-1` anchor, see the
/// module doc comment), then induce-S backward over the first pass's own
/// output with its LMS entries dropped, then hand the *second* pass's
/// output back to the caller by reading it backward (restoring ascending
/// order). `initial_seeds_ascending` must fit in RAM (true of both
/// callers: LMS positions for naming, and sorted LMS-suffixes for the
/// final stage); the two intermediate passes' own output never does.
/// `is_lms_bitmap_path` is read only to filter pass 2's seeds -- it plays
/// no role in pass 1's own induction.
#[allow(clippy::too_many_arguments)]
pub(crate) fn two_pass_induce(
    text_path: &Path,
    n: u64,
    type_bitmap_path: &Path,
    is_lms_bitmap_path: &Path,
    blocks: &[BlockInfo],
    block_size: u64,
    initial_seeds_ascending: &[u64],
    alphabet_size: u64,
    config: &Config,
    mut consume_ascending: impl FnMut(u64, Flags) -> Result<()>,
) -> Result<()> {
    let part_cap = config.max_part_size(n, 8);
    let anchor = if n > 0 { Some(n - 1) } else { None };
    // Two multipart streams are ever open at once (pass 2's backward read of
    // pass 1's output, alongside pass 2's own forward write); split the RAM
    // budget between their buffers and the heap the same way for both passes.
    let (stream_buf_bytes, heap_ram_budget) = config.split_ram_for_streams(2);

    let pass1_base = config.tmp_path("induce_pass1");
    let pass1_parts = {
        let mut writer = MultipartWriter::<u64>::with_buffers(&pass1_base, part_cap, stream_buf_bytes, config.buffers_per_stream)?;
        run_pass_core(
            text_path,
            n,
            type_bitmap_path,
            blocks,
            block_size,
            heap_ram_budget,
            anchor,
            seed_from_slice(initial_seeds_ascending),
            false,
            true,
            alphabet_size,
            config,
            |p, _flags| writer.write(p),
        )?;
        writer.finish()?
    };

    let pass2_base = config.tmp_path("induce_pass2");
    let pass2_parts = {
        let mut reader =
            MultipartBackwardReader::<u64>::with_buffers(&pass1_base, pass1_parts, stream_buf_bytes, config.buffers_per_stream)?;
        let mut is_lms = RandomAccessBitmap::new(is_lms_bitmap_path)?;
        let mut writer = MultipartWriter::<u64>::with_buffers(&pass2_base, part_cap, stream_buf_bytes, config.buffers_per_stream)?;
        run_pass_core(
            text_path,
            n,
            type_bitmap_path,
            blocks,
            block_size,
            heap_ram_budget,
            None,
            seed_from_backward_reader_excluding_lms(&mut reader, &mut is_lms),
            true,
            false,
            alphabet_size,
            config,
            |p, flags| writer.write((p << FLAG_BITS) | flags.pack()),
        )?;
        writer.finish()?
    };
    remove_multipart(&pass1_base, pass1_parts);

    {
        let mut reader =
            MultipartBackwardReader::<u64>::with_buffers(&pass2_base, pass2_parts, stream_buf_bytes, config.buffers_per_stream)?;
        while !reader.is_empty()? {
            let packed = reader.read()?;
            let pos = packed >> FLAG_BITS;
            let flags = Flags::unpack(packed & ((1 << FLAG_BITS) - 1));
            consume_ascending(pos, flags)?;
        }
    }
    remove_multipart(&pass2_base, pass2_parts);
    Ok(())
}

/// Count of adjacent pairs in `sorted_lms` whose LMS-substrings differ
/// (§8 invariant 4's diff-bit diagnostic: exactly `k - 1` among `k` distinct
/// LMS-substrings), computed with the real equality check
/// ([`lms_substr_eq_windowed`]) rather than either pass's own cheap
/// bucket-crossing hint.
pub(crate) fn diff_bit_count(text_path: &Path, n: u64, block_size: u64, sorted_lms: &[u64]) -> Result<u64> {
    if sorted_lms.len() < 2 {
        return Ok(0);
    }
    let mut left = BlockTextCache::new(text_path, n, block_size)?;
    let mut right = BlockTextCache::new(text_path, n, block_size)?;
    let mut count = 0u64;
    for w in sorted_lms.windows(2) {
        if !lms_substr_eq_windowed(&mut left, &mut right, n, w[0], w[1])? {
            count += 1;
        }
    }
    Ok(count)
}

/// Induce L-type predecessors over a small, resident seed/output pair --
/// a thin convenience wrapper over [`run_pass_core`] for callers (tests,
/// and any future direct use) that don't need the streaming composition
/// [`two_pass_induce`] provides.
#[cfg(test)]
pub(crate) fn induce_l(
    text_path: &Path,
    n: u64,
    type_bitmap_path: &Path,
    blocks: &[BlockInfo],
    block_size: u64,
    seeds_ascending: &[u64],
    alphabet_size: u64,
    config: &Config,
) -> Result<Vec<u64>> {
    let mut out = Vec::new();
    let heap_ram_budget = config.split_ram_for_streams(0).1;
    run_pass_core(
        text_path,
        n,
        type_bitmap_path,
        blocks,
        block_size,
        heap_ram_budget,
        None,
        seed_from_slice(seeds_ascending),
        false,
        true,
        alphabet_size,
        config,
        |p, _| {
            out.push(p);
            Ok(())
        },
    )?;
    Ok(out)
}

/// Induce S-type predecessors, scanning characters descending, back of
/// bucket first (LIFO among same-character entries, i.e. `seeds` should
/// already be given in reverse of the order they'd be visited left to
/// right). Test-only convenience wrapper, see [`induce_l`].
#[cfg(test)]
pub(crate) fn induce_s(
    text_path: &Path,
    n: u64,
    type_bitmap_path: &Path,
    blocks: &[BlockInfo],
    block_size: u64,
    seeds_reversed: &[u64],
    alphabet_size: u64,
    config: &Config,
) -> Result<Vec<u64>> {
    let mut out = Vec::new();
    let heap_ram_budget = config.split_ram_for_streams(0).1;
    run_pass_core(
        text_path,
        n,
        type_bitmap_path,
        blocks,
        block_size,
        heap_ram_budget,
        None,
        seed_from_slice(seeds_reversed),
        true,
        false,
        alphabet_size,
        config,
        |p, _| {
            out.push(p);
            Ok(())
        },
    )?;
    Ok(out)
}

/// `crate::construct::utils::lms_substr_eq`, windowed over two independent
/// text caches instead of one resident slice (the two compared positions
/// can be arbitrarily far apart, so sharing one cache would thrash).
/// `i`/`j` must both be LMS positions in `[0, n)`; position `n` itself is
/// never read, only compared against as the implicit end-of-text sentinel
/// (§3: "the last position is L-type by convention").
pub(crate) fn lms_substr_eq_windowed(
    left: &mut BlockTextCache,
    right: &mut BlockTextCache,
    n: u64,
    mut i: u64,
    mut j: u64,
) -> Result<bool> {
    if i > j {
        std::mem::swap(&mut i, &mut j);
    }
    if i == j {
        return Ok(true);
    }
    if j >= n || left.get(i)? != right.get(j)? {
        return Ok(false);
    }
    let mut last = left.get(i)?;
    i += 1;
    j += 1;
    while j < n {
        let ci = left.get(i)?;
        if ci < last {
            break;
        }
        if ci != right.get(j)? {
            return Ok(false);
        }
        last = ci;
        i += 1;
        j += 1;
    }
    // Remaining L-type run until the next LMS boundary: compare run
    // lengths and values exactly like `construct::utils::peek` does over a
    // resident slice, just fetched one element at a time.
    loop {
        if j >= n {
            return Ok(false);
        }
        let (v0, len0, asc0) = peek_windowed(left, n, i)?;
        let (v1, len1, asc1) = peek_windowed(right, n, j)?;
        if v0 != v1 || asc0 != asc1 {
            return Ok(false);
        }
        if asc0 {
            return Ok(true);
        }
        if len0 != len1 {
            return Ok(false);
        }
        i += len0;
        j += len1;
    }
}

/// Length and trailing direction of the maximal run of equal symbols
/// starting at `i`: `true` iff the run ends because the next symbol is
/// strictly greater (mirrors `construct::utils::peek`, but treats running
/// off the end of the text as "not ascending", matching the final-position
/// L-type convention).
fn peek_windowed(cache: &mut BlockTextCache, n: u64, i: u64) -> Result<(u8, u64, bool)> {
    let p = cache.get(i)?;
    let mut len = 1u64;
    let mut k = i + 1;
    while k < n {
        let c = cache.get(k)?;
        if c > p {
            return Ok((p, len, true));
        } else if c < p {
            return Ok((p, len, false));
        }
        len += 1;
        k += 1;
    }
    Ok((p, len, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::plan_blocks;
    use tempfile::tempdir;

    /// Classify `text` into a temp file and return (text_path, n,
    /// blocks, type_bitmap_path, is_s) -- `is_s` computed independently in
    /// RAM, purely so the test can pick seeds, not fed to the code under
    /// test.
    fn setup(
        dir: &Path,
        text: &[u8],
        max_block_size: u64,
    ) -> (std::path::PathBuf, u64, Vec<BlockInfo>, std::path::PathBuf, Vec<bool>) {
        let text_path = dir.join("t");
        std::fs::write(&text_path, text).unwrap();
        let config = Config::new(1 << 20, max_block_size, dir);
        let n = text.len() as u64;
        let classification = crate::block::classify(&text_path, n, 256, &config).unwrap();
        let is_s = crate::block::load_type_bits(&classification).unwrap();
        (text_path, n, classification.blocks.clone(), classification.type_bitmap_path, is_s)
    }

    #[test]
    fn induce_l_discovers_l_predecessors_in_order() {
        // "banana": L/S types (S marked): b a n a n a$
        // indices:  0 1 2 3 4 5
        let text = b"banana";
        let dir = tempdir().unwrap();
        let (text_path, n, blocks, bitmap_path, is_s) = setup(dir.path(), text, 64);
        let config = Config::new(1 << 20, 64, dir.path()).with_radix_log(4);
        // Seed with every S-type position ascending by index (a stand-in
        // for "LMS seeds in text order", which is all induce_l needs: a
        // set of starting points plus the type array).
        let seeds: Vec<u64> = (0..n).filter(|&i| is_s[i as usize]).collect();
        let out = induce_l(&text_path, n, &bitmap_path, &blocks, 64, &seeds, 256, &config).unwrap();
        // Every position reachable by following "predecessor is L" chains
        // from an S seed must appear, and nothing outside 0..n.
        assert!(out.iter().all(|&p| p < n));
        assert!(out.len() >= seeds.len());
    }

    #[test]
    fn single_position_text_yields_itself() {
        let text = b"a";
        let dir = tempdir().unwrap();
        let (text_path, n, blocks, bitmap_path, _is_s) = setup(dir.path(), text, 64);
        let config = Config::new(1 << 20, 64, dir.path());
        let out = induce_l(&text_path, n, &bitmap_path, &blocks, 64, &[0], 256, &config).unwrap();
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn two_pass_induce_recovers_sorted_lms_substrings_for_mississippi() {
        let text = b"mississippi";
        let dir = tempdir().unwrap();
        let (text_path, n, blocks, bitmap_path, is_s) = setup(dir.path(), text, 4);
        let config = Config::new(1 << 20, 4, dir.path()).with_radix_log(4);
        let lms_bitmap_path = {
            let classification = crate::block::classify(&text_path, n, 256, &config).unwrap();
            classification.is_lms_bitmap_path
        };
        let lms_bits = {
            let mut r = RandomAccessBitmap::new(&lms_bitmap_path).unwrap();
            (0..n).map(|i| r.get(i).unwrap()).collect::<Vec<bool>>()
        };
        let lms_positions: Vec<u64> = (0..n).filter(|&i| lms_bits[i as usize]).collect();
        assert_eq!(lms_positions, vec![1, 4, 7]);

        let mut order = Vec::new();
        two_pass_induce(
            &text_path,
            n,
            &bitmap_path,
            &lms_bitmap_path,
            &blocks,
            4,
            &lms_positions,
            256,
            &config,
            |p, _flags| {
                if lms_bits[p as usize] {
                    order.push(p);
                }
                Ok(())
            },
        )
        .unwrap();
        // Sorted LMS-substring order for "mississippi": "ippi$" (7) <
        // "issi" (1) == "issi" (4) -- 1 and 4 are content-identical
        // LMS-substrings, so their relative order is a tie broken by the
        // induction's own bucket discipline rather than by content; this
        // exact sequence is what a textbook array-based SA-IS run produces
        // for this string too.
        assert_eq!(order, vec![7, 1, 4]);
        let _ = is_s; // setup's oracle type array isn't needed beyond seeding sanity above.
        let _ = plan_blocks; // re-exported for other modules' tests, not exercised directly here.
    }

    #[test]
    fn diff_bit_count_matches_resident_oracle() {
        let text = b"mississippi";
        let dir = tempdir().unwrap();
        let (text_path, n, _blocks, _bitmap_path, _is_s) = setup(dir.path(), text, 4);
        let lms_sorted: Vec<u64> = vec![10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2];
        let mut left = BlockTextCache::new(&text_path, n, 4).unwrap();
        let mut right = BlockTextCache::new(&text_path, n, 4).unwrap();
        let mut windowed = 0u64;
        for w in lms_sorted.windows(2) {
            if !lms_substr_eq_windowed(&mut left, &mut right, n, w[0], w[1]).unwrap() {
                windowed += 1;
            }
        }
        let mut resident = 0u64;
        for w in lms_sorted.windows(2) {
            if !crate::construct::utils::lms_substr_eq(text, w[0] as usize, w[1] as usize) {
                resident += 1;
            }
        }
        assert_eq!(windowed, resident);
    }
}
