//! jplace (version 3) document serialization.
//!
//! The document carries the edge-annotated reference tree and one
//! placement entry per read, each with a single `p` row
//! `[edge_num, distal_length, pendant_length, like_weight_ratio,
//! likelihood]` and an `nm` entry `[[name, 1]]`.

use std::io::Write;

use serde::Serialize;
use velella_core::Result;

use crate::driver::PlacementOutcome;

pub const JPLACE_VERSION: u32 = 3;

pub const JPLACE_FIELDS: [&str; 5] = [
    "edge_num",
    "distal_length",
    "pendant_length",
    "like_weight_ratio",
    "likelihood",
];

#[derive(Debug, Serialize)]
pub struct JplaceDocument {
    pub version: u32,
    pub fields: Vec<String>,
    pub metadata: JplaceMetadata,
    pub tree: String,
    pub placements: Vec<JplacePlacement>,
}

#[derive(Debug, Serialize)]
pub struct JplaceMetadata {
    pub invocation: String,
}

#[derive(Debug, Serialize)]
pub struct JplacePlacement {
    /// Placement rows; tuples serialize as JSON arrays.
    pub p: Vec<(usize, f64, f64, f64, f64)>,
    /// `[[name, multiplicity]]`.
    pub nm: Vec<(String, u32)>,
}

impl JplaceDocument {
    /// Build the document from a finished placement run.
    pub fn from_outcome(outcome: &PlacementOutcome, invocation: &str) -> Self {
        let placements = outcome
            .records
            .iter()
            .map(|r| JplacePlacement {
                p: vec![(
                    r.edge_num,
                    r.distal_length,
                    r.pendant_length,
                    r.like_weight_ratio,
                    r.likelihood,
                )],
                nm: vec![(r.name.clone(), 1)],
            })
            .collect();
        Self {
            version: JPLACE_VERSION,
            fields: JPLACE_FIELDS.iter().map(|s| s.to_string()).collect(),
            metadata: JplaceMetadata {
                invocation: invocation.to_string(),
            },
            tree: outcome.annotated_tree.clone(),
            placements,
        }
    }

    pub fn write_to(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        Ok(())
    }
}
