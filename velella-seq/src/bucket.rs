//! Minimizer buckets and the bucket manager.
//!
//! Words are appended to the bucket named by their minimizer while a
//! sequence set is indexed. Finalization then sorts each bucket by the
//! packed match word and records the maximal runs of equal match words as
//! `(offset, len)` groups; the match engine walks those groups instead of
//! individual words. A finalized manager is immutable.

use crate::word::{SpacedWord, MINIMIZER_BITS};

/// Number of minimizer buckets (`2^MINIMIZER_BITS`).
pub const BUCKET_COUNT: usize = 1 << MINIMIZER_BITS;

/// Whether a manager holds reference or query words. Only affects labeling
/// in downstream reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketRole {
    References,
    Queries,
}

/// All spaced words sharing one minimizer value.
#[derive(Debug, Clone)]
pub struct Bucket {
    minimizer: u32,
    words: Vec<SpacedWord>,
    groups: Vec<(u32, u32)>,
}

impl Bucket {
    fn new(minimizer: u32) -> Self {
        Self {
            minimizer,
            words: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn minimizer(&self) -> u32 {
        self.minimizer
    }

    pub fn words(&self) -> &[SpacedWord] {
        &self.words
    }

    /// `(offset, len)` runs of equal match words; empty before finalization.
    pub fn word_groups(&self) -> &[(u32, u32)] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn push(&mut self, word: SpacedWord) {
        self.words.push(word);
    }

    /// Sort by match word, then index the maximal equal runs.
    fn finalize(&mut self) {
        self.words.sort_unstable_by_key(|w| w.matches);
        self.groups.clear();
        let mut start = 0usize;
        for idx in 1..=self.words.len() {
            if idx == self.words.len() || self.words[idx].matches != self.words[start].matches {
                self.groups.push((start as u32, (idx - start) as u32));
                start = idx;
            }
        }
    }
}

/// Fixed array of [`BUCKET_COUNT`] buckets keyed by minimizer.
#[derive(Debug, Clone)]
pub struct BucketManager {
    role: BucketRole,
    buckets: Vec<Bucket>,
    finalized: bool,
}

impl BucketManager {
    pub fn new(role: BucketRole) -> Self {
        Self {
            role,
            buckets: (0..BUCKET_COUNT as u32).map(Bucket::new).collect(),
            finalized: false,
        }
    }

    pub fn role(&self) -> BucketRole {
        self.role
    }

    /// Route a word to its minimizer's bucket. O(1).
    ///
    /// Inserting into a finalized manager is a program error.
    pub fn insert(&mut self, word: SpacedWord) {
        debug_assert!(!self.finalized, "insert into finalized BucketManager");
        self.buckets[word.minimizer as usize].push(word);
    }

    /// Fold another (unfinalized) manager's words into this one.
    ///
    /// Supports sharded indexing: each worker fills its own sub-manager and
    /// the shards are merged before finalization.
    pub fn merge(&mut self, other: BucketManager) {
        debug_assert!(!self.finalized && !other.finalized);
        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets) {
            mine.words.extend(theirs.words);
        }
    }

    /// Sort and group every bucket. After this the manager is read-only.
    pub fn finalize(&mut self) {
        for bucket in &mut self.buckets {
            bucket.finalize();
        }
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn bucket(&self, minimizer: u32) -> &Bucket {
        &self.buckets[minimizer as usize]
    }

    /// Buckets in ascending minimizer order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Total number of stored words.
    pub fn word_count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }
}
