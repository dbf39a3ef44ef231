//! Spaced-word indexing for the Velella placement engine.
//!
//! Converts nucleotide sequences into bit-packed spaced words under one or
//! more binary match/don't-care patterns and shards them into minimizer
//! buckets for high-throughput matching:
//!
//! - **Alphabet** — 2-bit DNA codes with skip-unknown decoding
//! - **Patterns** — [`SpacedPattern`], the compiled match/don't-care template
//! - **Words** — [`SpacedWord`], one extracted spaced word
//! - **Buckets** — [`Bucket`] and [`BucketManager`], minimizer-keyed word
//!   containers with a sorted word-group index
//! - **Indexing** — [`index_sequence`], both-strand extraction with optional
//!   min-hash sampling, and FASTA ingestion via `needletail`

pub mod alphabet;
pub mod bucket;
pub mod fasta;
pub mod indexer;
pub mod pattern;
pub mod word;

pub use alphabet::{decode_dna, reverse_complement_codes};
pub use bucket::{Bucket, BucketManager, BucketRole, BUCKET_COUNT};
pub use fasta::{read_fasta, DecodedSequence};
pub use indexer::{extract_words, index_sequence, index_sequences, IndexOptions};
pub use pattern::{parse_pattern_line, SpacedPattern};
pub use word::SpacedWord;
