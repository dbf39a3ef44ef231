//! Two-way mapping between sequence names and dense internal ids.
//!
//! One `NameTable` is owned by the placement pipeline and passed explicitly
//! to every stage that needs it. Ids are handed out monotonically from a
//! single counter in the order sequences are encountered, so references,
//! queries, and synthesized internal tree nodes all draw from one id space
//! and an id resolves to exactly one name.

use std::collections::HashMap;

use crate::error::{Result, VelellaError};

/// Dense internal id of an input sequence or a synthesized tree node.
pub type SeqId = u32;

/// Which partition of the table an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Reference,
    Query,
    /// Synthesized internal tree node.
    Internal,
}

/// Registry of every named entity in a placement run.
///
/// Names must be unique among references (duplicates are fatal at ingest)
/// and among internal nodes; query names are recorded as given.
#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<String>,
    kinds: Vec<NameKind>,
    reference_ids: HashMap<String, SeqId>,
    /// Ids of queries in the order they were ingested.
    query_order: Vec<SeqId>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: String, kind: NameKind) -> SeqId {
        let id = self.names.len() as SeqId;
        self.names.push(name);
        self.kinds.push(kind);
        id
    }

    /// Register a reference sequence. Fails if the name is already taken
    /// by another reference.
    pub fn add_reference(&mut self, name: &str) -> Result<SeqId> {
        if self.reference_ids.contains_key(name) {
            return Err(VelellaError::DuplicateSequenceName(name.to_string()));
        }
        let id = self.push(name.to_string(), NameKind::Reference);
        self.reference_ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register a query sequence. Query names are not required to be unique;
    /// each call mints a fresh id.
    pub fn add_query(&mut self, name: &str) -> SeqId {
        let id = self.push(name.to_string(), NameKind::Query);
        self.query_order.push(id);
        id
    }

    /// Register a synthesized internal tree node.
    pub fn add_internal(&mut self, name: &str) -> SeqId {
        self.push(name.to_string(), NameKind::Internal)
    }

    /// Resolve a reference name to its id.
    pub fn reference_id(&self, name: &str) -> Option<SeqId> {
        self.reference_ids.get(name).copied()
    }

    /// The name behind an id.
    pub fn name(&self, id: SeqId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn kind(&self, id: SeqId) -> Option<NameKind> {
        self.kinds.get(id as usize).copied()
    }

    pub fn is_reference(&self, id: SeqId) -> bool {
        self.kind(id) == Some(NameKind::Reference)
    }

    /// Query ids in ingest order.
    pub fn query_ids(&self) -> &[SeqId] {
        &self.query_order
    }

    /// Reference ids in ingest order.
    pub fn reference_ids(&self) -> Vec<SeqId> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, &k)| k == NameKind::Reference)
            .map(|(i, _)| i as SeqId)
            .collect()
    }

    pub fn reference_count(&self) -> usize {
        self.reference_ids.len()
    }

    pub fn query_count(&self) -> usize {
        self.query_order.len()
    }

    /// Total number of ids handed out.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
