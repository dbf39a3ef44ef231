//! Matching, scoring, and the placement pipeline.
//!
//! Ties the other Velella crates together: the match engine compares
//! finalized reference and query buckets, the scoring tables accumulate
//! per-pair statistics and derive Jukes-Cantor distances, and the driver
//! runs the whole pipeline from FASTA inputs to jplace output.

pub mod config;
pub mod driver;
pub mod engine;
pub mod export;
pub mod jplace;
pub mod matrix;
pub mod scoring;

pub use config::{AssignmentMode, PlaceConfig};
pub use driver::{run_placement, PlacementOutcome, PlacementRecord};
pub use engine::{match_buckets, MatchOptions};
pub use scoring::{PairScore, ScoringTables};
