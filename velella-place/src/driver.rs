//! The placement pipeline.
//!
//! References are indexed once; queries are indexed and matched in blocks
//! of `read_block_size` (block boundaries do not affect results, only peak
//! memory). After the Jukes-Cantor pass, every query is placed under the
//! configured policy and the records are emitted in query input order.

use std::path::Path;

use tracing::info;
use velella_core::{CancelFlag, NameTable, Result, SeqId, VelellaError};
use velella_phylo::{choose_node, edge_placement, Scratch, Tree};
use velella_seq::{index_sequences, read_fasta, BucketManager, BucketRole, IndexOptions};

use crate::config::PlaceConfig;
use crate::engine::{match_buckets, MatchOptions, MatchOutput};
use crate::scoring::ScoringTables;

/// One query's placement, ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
    pub name: String,
    pub edge_num: usize,
    pub distal_length: f64,
    pub pendant_length: f64,
    pub like_weight_ratio: f64,
    pub likelihood: f64,
}

/// Everything a placement run produces.
#[derive(Debug)]
pub struct PlacementOutcome {
    /// One record per query, in input order.
    pub records: Vec<PlacementRecord>,
    /// The reference tree with `{<edge_num>}` annotations.
    pub annotated_tree: String,
    pub tables: ScoringTables,
    /// `(query, reference, score)` rows; empty unless requested.
    pub histogram: Vec<(SeqId, SeqId, i64)>,
    pub names: NameTable,
}

/// Run the full pipeline from input files to placement records.
pub fn run_placement(
    config: &PlaceConfig,
    reference_path: &Path,
    query_path: &Path,
    tree_path: &Path,
    collect_histogram: bool,
    cancel: &CancelFlag,
) -> Result<PlacementOutcome> {
    let patterns = config.compile_patterns()?;
    let index_options = IndexOptions {
        min_hash_limit: config.min_hash_limit(),
    };
    let mut names = NameTable::new();

    // Stage: reference indexing.
    info!(path = %reference_path.display(), "reading reference genomes");
    let references = read_fasta(reference_path)?;
    let mut ref_ids = Vec::with_capacity(references.len());
    for seq in &references {
        ref_ids.push(names.add_reference(&seq.name)?);
    }
    let mut ref_buckets = BucketManager::new(BucketRole::References);
    index_sequences(
        ref_ids.iter().copied().zip(&references).map(|(id, s)| (id, s.codes.as_slice())),
        &patterns,
        &index_options,
        cancel,
        &mut ref_buckets,
    )?;
    ref_buckets.finalize();
    info!(
        genomes = references.len(),
        words = ref_buckets.word_count(),
        "reference index built"
    );

    // Stage: query registration. Ids are assigned up front so block
    // boundaries cannot change them.
    info!(path = %query_path.display(), "reading reads");
    let queries = read_fasta(query_path)?;
    let query_ids: Vec<SeqId> = queries.iter().map(|s| names.add_query(&s.name)).collect();

    // Stage: reference tree.
    let tree = Tree::from_newick_file(tree_path, &mut names)?;
    info!(leaves = tree.leaf_count(), "reference tree loaded");

    // Stage: block-wise matching.
    let match_options = MatchOptions {
        spaces: config.spaces,
        threshold: config.filtering_threshold(),
        histogram: collect_histogram,
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| VelellaError::InvalidInput(e.to_string()))?;

    let mut output = MatchOutput::default();
    for (block_idx, (block_seqs, block_ids)) in queries
        .chunks(config.read_block_size)
        .zip(query_ids.chunks(config.read_block_size))
        .enumerate()
    {
        let mut query_buckets = BucketManager::new(BucketRole::Queries);
        index_sequences(
            block_ids.iter().copied().zip(block_seqs).map(|(id, s)| (id, s.codes.as_slice())),
            &patterns,
            &index_options,
            cancel,
            &mut query_buckets,
        )?;
        query_buckets.finalize();
        let block_output =
            pool.install(|| match_buckets(&ref_buckets, &query_buckets, &match_options, cancel))?;
        info!(
            block = block_idx,
            reads = block_seqs.len(),
            pairs = block_output.tables.pair_count(),
            "read block matched"
        );
        output.merge(block_output);
    }

    // Stage: distances.
    output
        .tables
        .derive_distances(config.spaces, config.default_distance);

    // Stage: per-query placement, in input order.
    let (annotated_tree, edge_ids) = tree.annotated_newick();
    let policy = config.policy();
    let mut scratch = Scratch::new(&tree);
    let mut records = Vec::with_capacity(query_ids.len());
    for &query in &query_ids {
        let counts = output.tables.counts_for(query);
        let distances = output.tables.distances_for(query);
        scratch.load(&tree, &counts, &distances);
        let node = choose_node(&tree, policy, &counts, &distances, &mut scratch)?;
        let placement = edge_placement(
            &tree,
            node,
            policy,
            &distances,
            config.default_distance,
            config.default_pendant,
        );
        records.push(PlacementRecord {
            name: names.name(query).unwrap_or_default().to_string(),
            edge_num: edge_ids[placement.node],
            distal_length: placement.distal,
            pendant_length: placement.pendant,
            like_weight_ratio: 1.0,
            likelihood: 1.0,
        });
    }
    info!(reads = records.len(), "placement finished");

    Ok(PlacementOutcome {
        records,
        annotated_tree,
        tables: output.tables,
        histogram: output.histogram,
        names,
    })
}
