//! Tab-separated side outputs.
//!
//! The distance table is the input consumed by external distance-based
//! placers; the histogram stream supports filtering-threshold tuning.

use std::io::Write;

use velella_core::{NameTable, Result, SeqId};

use crate::scoring::ScoringTables;

/// Write the query x reference Jukes-Cantor distance matrix.
///
/// One row per query in ingest order: the query name followed by its
/// distance to every reference in reference ingest order. Pairs without a
/// derived distance take `default_distance`.
pub fn write_distance_table(
    mut writer: impl Write,
    names: &NameTable,
    tables: &ScoringTables,
    default_distance: f64,
) -> Result<()> {
    let reference_ids = names.reference_ids();
    for &query in names.query_ids() {
        write!(writer, "{}", names.name(query).unwrap_or_default())?;
        for &reference in &reference_ids {
            let distance = tables.distance(query, reference).unwrap_or(default_distance);
            write!(writer, "\t{}", distance)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write per-match score rows as `query<TAB>reference<TAB>score`.
pub fn write_histogram(
    mut writer: impl Write,
    rows: &[(SeqId, SeqId, i64)],
) -> Result<()> {
    for (query, reference, score) in rows {
        writeln!(writer, "{}\t{}\t{}", query, reference, score)?;
    }
    Ok(())
}
