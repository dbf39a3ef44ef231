//! Spaced-word extraction over both strands.
//!
//! For every pattern and every window start `i` in `[0, n - L]`, the
//! indexer packs the symbols at the pattern's match and don't-care
//! positions into a [`SpacedWord`] and routes it to its minimizer bucket.
//! The reverse-complement array is walked identically, and words from both
//! strands carry the forward sequence id. With sampling enabled, a word is
//! kept only if the CRC-32 of its match word falls below the configured
//! limit.

use tracing::warn;
use velella_core::hash::crc32_word;
use velella_core::{CancelFlag, Result, SeqId};

use crate::alphabet::reverse_complement_codes;
use crate::bucket::BucketManager;
use crate::pattern::SpacedPattern;
use crate::word::SpacedWord;

/// Indexing knobs shared by all sequences of a run.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// When set, keep only words whose `crc32(matches)` is strictly below
    /// this limit (min-hash sampling).
    pub min_hash_limit: Option<u32>,
}

/// Extract the spaced words of one strand into `out`.
///
/// Walks `codes` under `pattern` only; callers pass the forward and
/// reverse-complement arrays separately. Positions are offsets into the
/// walked array.
pub fn extract_words(
    codes: &[u8],
    seq_id: SeqId,
    pattern: &SpacedPattern,
    options: &IndexOptions,
    out: &mut BucketManager,
) {
    let len = pattern.len();
    if codes.len() < len {
        return;
    }
    for i in 0..=codes.len() - len {
        let mut matches = 0u64;
        for &pos in pattern.match_positions() {
            matches = (matches << 2) | codes[i + pos] as u64;
        }
        if let Some(limit) = options.min_hash_limit {
            if crc32_word(matches) >= limit {
                continue;
            }
        }
        let mut dont_cares = 0u64;
        for &pos in pattern.dontcare_positions() {
            dont_cares = (dont_cares << 2) | codes[i + pos] as u64;
        }
        out.insert(SpacedWord::new(seq_id, i as u32, matches, dont_cares));
    }
}

/// Index one decoded sequence: both strands, every pattern.
///
/// Sequences shorter than a pattern contribute no words for that pattern;
/// a sequence shorter than every pattern is reported at `warn` level and
/// skipped entirely.
pub fn index_sequence(
    codes: &[u8],
    seq_id: SeqId,
    patterns: &[SpacedPattern],
    options: &IndexOptions,
    out: &mut BucketManager,
) {
    if patterns.iter().all(|p| codes.len() < p.len()) {
        warn!(
            seq_id,
            length = codes.len(),
            "sequence shorter than every pattern, no words emitted"
        );
        return;
    }
    let rc = reverse_complement_codes(codes);
    for pattern in patterns {
        extract_words(codes, seq_id, pattern, options, out);
        extract_words(&rc, seq_id, pattern, options, out);
    }
}

/// Index a batch of decoded sequences, polling the cancel flag between
/// sequences.
pub fn index_sequences<'a, I>(
    sequences: I,
    patterns: &[SpacedPattern],
    options: &IndexOptions,
    cancel: &CancelFlag,
    out: &mut BucketManager,
) -> Result<()>
where
    I: IntoIterator<Item = (SeqId, &'a [u8])>,
{
    for (seq_id, codes) in sequences {
        cancel.check()?;
        index_sequence(codes, seq_id, patterns, options, out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::decode_dna;
    use crate::bucket::BucketRole;

    fn options() -> IndexOptions {
        IndexOptions::default()
    }

    fn indexed(seq: &[u8], pattern: &str) -> BucketManager {
        let codes = decode_dna(seq);
        let pattern = SpacedPattern::parse(pattern).unwrap();
        let mut mgr = BucketManager::new(BucketRole::References);
        index_sequence(&codes, 0, std::slice::from_ref(&pattern), &options(), &mut mgr);
        mgr
    }

    #[test]
    fn aaaa_under_1001() {
        // Forward: one window, matches (A,A) = 0b0000, minimizer 0.
        // Reverse complement TTTT: matches (T,T) = 0b1111, minimizer 0xF.
        let mgr = indexed(b"AAAA", "1001");
        assert_eq!(mgr.word_count(), 2);

        let fwd = mgr.bucket(0).words();
        assert_eq!(fwd.len(), 1);
        assert_eq!(fwd[0].matches, 0b0000);
        assert_eq!(fwd[0].dont_cares, 0b0000);
        assert_eq!(fwd[0].seq_pos, 0);

        let rev = mgr.bucket(0xF).words();
        assert_eq!(rev.len(), 1);
        assert_eq!(rev[0].matches, 0b1111);
        assert_eq!(rev[0].dont_cares, 0b1111);
        assert_eq!(rev[0].seq_id, 0);
    }

    #[test]
    fn window_count_matches_length() {
        // 8 bases, L = 4: 5 windows per strand per pattern.
        let mgr = indexed(b"ACGTACGT", "1001");
        assert_eq!(mgr.word_count(), 10);
    }

    #[test]
    fn short_sequence_emits_nothing() {
        let mgr = indexed(b"ACG", "1001");
        assert_eq!(mgr.word_count(), 0);
    }

    #[test]
    fn skipped_symbols_do_not_occupy_positions() {
        // N is dropped, so ACNGT indexes like ACGT.
        let with_n = indexed(b"ACNGT", "1001");
        let without = indexed(b"ACGT", "1001");
        assert_eq!(with_n.word_count(), without.word_count());
        for (a, b) in with_n.buckets().iter().zip(without.buckets()) {
            assert_eq!(a.len(), b.len());
        }
    }

    #[test]
    fn words_reconstruct_match_symbols() {
        // Pattern 101: match positions 0 and 2.
        let codes = decode_dna(b"ACGT");
        let pattern = SpacedPattern::parse("101").unwrap();
        let mut mgr = BucketManager::new(BucketRole::References);
        extract_words(&codes, 0, &pattern, &options(), &mut mgr);
        let mut words: Vec<&SpacedWord> =
            mgr.buckets().iter().flat_map(|b| b.words().iter()).collect();
        words.sort_by_key(|w| w.seq_pos);
        assert_eq!(words.len(), 2);
        // Window 0: A,G -> [0, 2]; window 1: C,T -> [1, 3].
        assert_eq!(words[0].decode_matches(2), vec![0, 2]);
        assert_eq!(words[1].decode_matches(2), vec![1, 3]);
    }

    #[test]
    fn minimizer_invariant_holds() {
        let mgr = indexed(b"ACGTACGTTGCAGTAC", "10011");
        for bucket in mgr.buckets() {
            for w in bucket.words() {
                assert_eq!(w.minimizer as u64, w.matches & 0xF);
                assert_eq!(w.minimizer, bucket.minimizer());
            }
        }
    }

    #[test]
    fn sampling_filters_by_crc() {
        let codes = decode_dna(b"ACGTACGTTGCAGTAC");
        let pattern = SpacedPattern::parse("1001").unwrap();

        let mut all = BucketManager::new(BucketRole::References);
        extract_words(&codes, 0, &pattern, &options(), &mut all);

        let limit = 1 << 30;
        let sampled_opts = IndexOptions {
            min_hash_limit: Some(limit),
        };
        let mut sampled = BucketManager::new(BucketRole::References);
        extract_words(&codes, 0, &pattern, &sampled_opts, &mut sampled);

        let expected = all
            .buckets()
            .iter()
            .flat_map(|b| b.words())
            .filter(|w| velella_core::hash::crc32_word(w.matches) < limit)
            .count();
        assert_eq!(sampled.word_count(), expected);
        assert!(sampled.word_count() <= all.word_count());
    }

    #[test]
    fn cancel_stops_indexing() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let codes = decode_dna(b"ACGTACGT");
        let pattern = SpacedPattern::parse("1001").unwrap();
        let mut mgr = BucketManager::new(BucketRole::Queries);
        let res = index_sequences(
            [(0u32, codes.as_slice())],
            std::slice::from_ref(&pattern),
            &options(),
            &cancel,
            &mut mgr,
        );
        assert!(res.is_err());
        assert_eq!(mgr.word_count(), 0);
    }
}
