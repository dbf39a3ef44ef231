//! Per-pair scoring accumulators and the distance pass.
//!
//! One [`ScoringTables`] holds, for every `(query, reference)` pair that
//! produced at least one accepted spaced-word match, the summed
//! substitution score, the summed per-position mismatch count, and the
//! number of accepted matches. The Jukes-Cantor pass turns those into
//! evolutionary distances. `BTreeMap`s keep iteration in ascending id
//! order so downstream tie-breaks are deterministic.

use std::collections::BTreeMap;

use tracing::warn;
use velella_core::SeqId;
use velella_phylo::jukes_cantor;

/// Accumulated statistics for one `(query, reference)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairScore {
    pub score_sum: i64,
    pub mismatch_sum: u64,
    pub match_count: u32,
}

/// Sparse per-query, per-reference accumulators plus derived distances.
#[derive(Debug, Default)]
pub struct ScoringTables {
    pairs: BTreeMap<SeqId, BTreeMap<SeqId, PairScore>>,
    distances: BTreeMap<SeqId, BTreeMap<SeqId, f64>>,
}

impl ScoringTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accepted spaced-word match.
    pub fn record_match(&mut self, query: SeqId, reference: SeqId, score: i64, mismatches: u32) {
        let pair = self
            .pairs
            .entry(query)
            .or_default()
            .entry(reference)
            .or_default();
        pair.score_sum += score;
        pair.mismatch_sum += mismatches as u64;
        pair.match_count += 1;
    }

    /// Fold a worker's delta tables into this one.
    pub fn merge(&mut self, other: ScoringTables) {
        for (query, refs) in other.pairs {
            let mine = self.pairs.entry(query).or_default();
            for (reference, delta) in refs {
                let pair = mine.entry(reference).or_default();
                pair.score_sum += delta.score_sum;
                pair.mismatch_sum += delta.mismatch_sum;
                pair.match_count += delta.match_count;
            }
        }
    }

    pub fn pair(&self, query: SeqId, reference: SeqId) -> Option<&PairScore> {
        self.pairs.get(&query)?.get(&reference)
    }

    pub fn match_count(&self, query: SeqId, reference: SeqId) -> u32 {
        self.pair(query, reference).map_or(0, |p| p.match_count)
    }

    pub fn distance(&self, query: SeqId, reference: SeqId) -> Option<f64> {
        self.distances.get(&query)?.get(&reference).copied()
    }

    /// Queries with at least one accepted match, ascending.
    pub fn query_ids(&self) -> impl Iterator<Item = SeqId> + '_ {
        self.pairs.keys().copied()
    }

    /// One query's match counts per reference.
    pub fn counts_for(&self, query: SeqId) -> BTreeMap<SeqId, u32> {
        self.pairs
            .get(&query)
            .map(|refs| refs.iter().map(|(&r, p)| (r, p.match_count)).collect())
            .unwrap_or_default()
    }

    /// One query's derived distances per reference. Empty before
    /// [`Self::derive_distances`] runs.
    pub fn distances_for(&self, query: SeqId) -> BTreeMap<SeqId, f64> {
        self.distances.get(&query).cloned().unwrap_or_default()
    }

    /// Number of populated `(query, reference)` pairs.
    pub fn pair_count(&self) -> usize {
        self.pairs.values().map(BTreeMap::len).sum()
    }

    /// Derive the Jukes-Cantor distance of every populated pair.
    ///
    /// Pairs without matches and pairs whose substitution frequency is at
    /// or beyond the 0.75 saturation limit take `default_distance`; the
    /// latter is a deliberate policy (saturated rather than undefined) and
    /// is reported at `warn` level.
    pub fn derive_distances(&mut self, spaces: usize, default_distance: f64) {
        self.distances.clear();
        for (&query, refs) in &self.pairs {
            let row: &mut BTreeMap<SeqId, f64> = self.distances.entry(query).or_default();
            for (&reference, pair) in refs {
                let distance = if pair.match_count == 0 {
                    default_distance
                } else {
                    let subst_freq =
                        pair.mismatch_sum as f64 / (pair.match_count as f64 * spaces as f64);
                    match jukes_cantor(subst_freq) {
                        Ok(d) => d,
                        Err(_) => {
                            warn!(
                                query,
                                reference, subst_freq, "saturated substitution frequency, using default distance"
                            );
                            default_distance
                        }
                    }
                };
                row.insert(reference, distance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates() {
        let mut tables = ScoringTables::new();
        tables.record_match(1, 0, 150, 1);
        tables.record_match(1, 0, -20, 3);
        let pair = tables.pair(1, 0).unwrap();
        assert_eq!(pair.score_sum, 130);
        assert_eq!(pair.mismatch_sum, 4);
        assert_eq!(pair.match_count, 2);
        assert_eq!(tables.match_count(1, 0), 2);
        assert_eq!(tables.match_count(1, 9), 0);
    }

    #[test]
    fn merge_sums_pairwise() {
        let mut a = ScoringTables::new();
        a.record_match(1, 0, 10, 1);
        let mut b = ScoringTables::new();
        b.record_match(1, 0, 5, 0);
        b.record_match(2, 0, 7, 2);
        a.merge(b);
        assert_eq!(
            a.pair(1, 0),
            Some(&PairScore {
                score_sum: 15,
                mismatch_sum: 1,
                match_count: 2
            })
        );
        assert_eq!(a.match_count(2, 0), 1);
        assert_eq!(a.pair_count(), 2);
    }

    #[test]
    fn distances_zero_mismatch() {
        let mut tables = ScoringTables::new();
        tables.record_match(1, 0, 182, 0);
        tables.derive_distances(2, 10.0);
        assert_eq!(tables.distance(1, 0), Some(0.0));
    }

    #[test]
    fn distances_known_value() {
        // One match, one mismatch over S = 2: subst_freq = 0.5,
        // d = -0.75 ln(1/3).
        let mut tables = ScoringTables::new();
        tables.record_match(1, 0, -23, 1);
        tables.derive_distances(2, 10.0);
        let d = tables.distance(1, 0).unwrap();
        assert!((d - (-0.75 * (1.0f64 / 3.0).ln())).abs() < 1e-12);
    }

    #[test]
    fn saturated_pairs_take_default() {
        // Two mismatches per position over S = 2: subst_freq = 1.0.
        let mut tables = ScoringTables::new();
        tables.record_match(1, 0, -200, 2);
        tables.derive_distances(1, 10.0);
        assert_eq!(tables.distance(1, 0), Some(10.0));
    }

    #[test]
    fn distance_monotone_in_mismatches() {
        // Fixed match_count and spaces: more mismatches, larger distance.
        let mut last = -1.0;
        for mismatches in 0..10u32 {
            let mut tables = ScoringTables::new();
            for _ in 0..4 {
                tables.record_match(1, 0, 0, mismatches);
            }
            tables.derive_distances(16, 10.0);
            let d = tables.distance(1, 0).unwrap();
            assert!(d > last, "not monotone at {} mismatches", mismatches);
            last = d;
        }
    }

    #[test]
    fn per_query_views() {
        let mut tables = ScoringTables::new();
        tables.record_match(5, 0, 10, 0);
        tables.record_match(5, 1, 10, 0);
        tables.record_match(6, 0, 10, 0);
        tables.derive_distances(4, 10.0);
        assert_eq!(tables.query_ids().collect::<Vec<_>>(), vec![5, 6]);
        let counts = tables.counts_for(5);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&0], 1);
        assert_eq!(tables.distances_for(6).len(), 1);
        assert!(tables.counts_for(7).is_empty());
    }
}
