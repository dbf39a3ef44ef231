//! The bucket-pair match engine.
//!
//! For every minimizer, the finalized reference and query buckets each
//! expose their words sorted by packed match word plus the run index over
//! equal match words. A linear merge over the two run sequences finds the
//! equal-match pairs; each pair in the Cartesian product of two equal runs
//! is scored by walking its don't-care symbols through the substitution
//! matrix and accepted if the score clears the filtering threshold.
//!
//! Buckets are independent, so they fan out over a rayon pool; every
//! worker accumulates into its own [`ScoringTables`] delta and the deltas
//! are merged after the join. Integer sums commute, so the result does not
//! depend on worker order.

use rayon::prelude::*;
use tracing::debug;
use velella_core::{CancelFlag, Result, SeqId};
use velella_seq::{Bucket, BucketManager, BUCKET_COUNT};

use crate::matrix::{CHIAROMONTE, MISMATCH};
use crate::scoring::ScoringTables;

/// Match-stage knobs.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Number of don't-care positions per word (`S`).
    pub spaces: usize,
    /// Accept a match iff its score is strictly above this.
    pub threshold: i64,
    /// Collect every scored pair as a `(query, reference, score)` row.
    pub histogram: bool,
}

/// Everything the match stage produces.
#[derive(Debug, Default)]
pub struct MatchOutput {
    pub tables: ScoringTables,
    /// Present only when [`MatchOptions::histogram`] is set.
    pub histogram: Vec<(SeqId, SeqId, i64)>,
}

impl MatchOutput {
    /// Fold another block's output into this one.
    pub fn merge(&mut self, other: MatchOutput) {
        self.tables.merge(other.tables);
        self.histogram.extend(other.histogram);
    }
}

/// Score one pair of words by their don't-care symbols.
#[inline]
fn score_pair(mut ref_word: u64, mut query_word: u64, spaces: usize) -> (i64, u32) {
    let mut score = 0i64;
    let mut mismatches = 0u32;
    for _ in 0..spaces {
        let r = (ref_word & 0b11) as usize;
        let q = (query_word & 0b11) as usize;
        score += CHIAROMONTE[r][q] as i64;
        mismatches += MISMATCH[r][q] as u32;
        ref_word >>= 2;
        query_word >>= 2;
    }
    (score, mismatches)
}

/// Compare one reference bucket against one query bucket.
fn match_bucket(references: &Bucket, queries: &Bucket, options: &MatchOptions) -> MatchOutput {
    let mut out = MatchOutput::default();

    let ref_words = references.words();
    let query_words = queries.words();
    let ref_groups = references.word_groups();
    let query_groups = queries.word_groups();

    let mut ri = 0usize;
    let mut qi = 0usize;
    while ri < ref_groups.len() && qi < query_groups.len() {
        let (r_start, r_len) = ref_groups[ri];
        let (q_start, q_len) = query_groups[qi];
        let r_matches = ref_words[r_start as usize].matches;
        let q_matches = query_words[q_start as usize].matches;

        if r_matches < q_matches {
            ri += 1;
        } else if r_matches > q_matches {
            qi += 1;
        } else {
            for q in 0..q_len as usize {
                let query_word = &query_words[q_start as usize + q];
                for r in 0..r_len as usize {
                    let ref_word = &ref_words[r_start as usize + r];
                    let (score, mismatches) =
                        score_pair(ref_word.dont_cares, query_word.dont_cares, options.spaces);
                    if options.histogram {
                        out.histogram.push((query_word.seq_id, ref_word.seq_id, score));
                    }
                    if score > options.threshold {
                        out.tables.record_match(
                            query_word.seq_id,
                            ref_word.seq_id,
                            score,
                            mismatches,
                        );
                    }
                }
            }
            ri += 1;
            qi += 1;
        }
    }
    out
}

/// Run the match stage over all minimizer buckets.
///
/// Both managers must be finalized. Buckets are processed in ascending
/// minimizer order when single-threaded; the accumulated tables are
/// identical regardless of ordering. The cancel flag is polled between
/// buckets.
pub fn match_buckets(
    references: &BucketManager,
    queries: &BucketManager,
    options: &MatchOptions,
    cancel: &CancelFlag,
) -> Result<MatchOutput> {
    assert!(
        references.is_finalized() && queries.is_finalized(),
        "match_buckets requires finalized bucket managers"
    );

    let outputs = (0..BUCKET_COUNT as u32)
        .into_par_iter()
        .map(|minimizer| -> Result<MatchOutput> {
            cancel.check()?;
            let out = match_bucket(
                references.bucket(minimizer),
                queries.bucket(minimizer),
                options,
            );
            debug!(
                minimizer,
                pairs = out.tables.pair_count(),
                "bucket matched"
            );
            Ok(out)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut merged = MatchOutput::default();
    for out in outputs {
        merged.merge(out);
    }
    // Keep histogram rows in a stable order for output.
    merged.histogram.sort_unstable();
    Ok(merged)
}
