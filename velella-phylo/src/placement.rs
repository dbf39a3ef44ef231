//! Placement policies and edge geometry.
//!
//! Each query arrives here as two per-reference maps (spaced-word match
//! counts and Jukes-Cantor distances) which are loaded into a per-query
//! [`Scratch`] over the tree. A policy picks the placement node (a leaf
//! or an LCA) and the geometry step positions the query along that node's
//! parent edge. Leaf scans resolve ties by tree leaf order; top-two
//! selection for the LCA policies iterates the maps in ascending
//! reference id. Both orders are deterministic.

use std::collections::BTreeMap;

use velella_core::{Result, SeqId};

use crate::tree::{NodeId, Tree};

/// Similarity sentinel for leaves without a distance entry.
const UNSCORED_LEAF_DISTANCE: f64 = 10.0;

/// The five placement policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    /// Leaf with the most accepted spaced-word matches.
    BestCount,
    /// Leaf with the smallest Jukes-Cantor distance.
    BestDistance,
    /// LCA of the two leaves with the most matches.
    LcaCount,
    /// LCA of the two leaves with the smallest distances.
    LcaDistance,
    /// LCA of the top two by count, unless the best leaf dominates:
    /// if `c1 - c2 > (c1 + c2) / x` the best leaf itself is returned.
    LcaDominant { x: f64 },
}

impl Policy {
    /// Whether the chosen node is interpreted as a leaf estimate (placed
    /// along the edge by distance) rather than an LCA.
    fn is_leaf_based(&self) -> bool {
        matches!(self, Policy::BestCount | Policy::BestDistance)
    }
}

/// Per-query scratch state parallel to the tree arena.
///
/// Replaces per-node mutable fields: `similarity` and `weight` are arrays
/// indexed by [`NodeId`], reset by [`Self::load`] before each query.
/// Leaves take the query's distance (or a sentinel) and match count (or
/// zero); the `fill_*` walks derive internal nodes from their children
/// on demand.
#[derive(Debug)]
pub struct Scratch {
    similarity: Vec<f64>,
    weight: Vec<i64>,
}

impl Scratch {
    pub fn new(tree: &Tree) -> Self {
        Self {
            similarity: vec![-1.0; tree.node_count()],
            weight: vec![-1; tree.node_count()],
        }
    }

    /// Reset all nodes and load one query's leaf values.
    pub fn load(
        &mut self,
        tree: &Tree,
        counts: &BTreeMap<SeqId, u32>,
        distances: &BTreeMap<SeqId, f64>,
    ) {
        self.similarity.fill(-1.0);
        self.weight.fill(-1);
        for &leaf in tree.leaves() {
            let seq_id = tree.node(leaf).seq_id;
            self.similarity[leaf] = distances
                .get(&seq_id)
                .copied()
                .unwrap_or(UNSCORED_LEAF_DISTANCE);
            self.weight[leaf] = counts.get(&seq_id).map(|&c| c as i64).unwrap_or(0);
        }
    }

    /// Similarity score of a node (smaller is closer).
    pub fn similarity(&self, id: NodeId) -> f64 {
        self.similarity[id]
    }

    /// Match-count weight of a node.
    pub fn weight(&self, id: NodeId) -> i64 {
        self.weight[id]
    }

    /// Give every unset node the minimum similarity of its children, in
    /// post-order. After this, a node's value is the best similarity in
    /// its subtree.
    pub fn fill_min_score(&mut self, tree: &Tree) {
        for &id in tree.postorder() {
            if self.similarity[id] < 0.0 {
                let min = tree
                    .node(id)
                    .children
                    .iter()
                    .map(|&c| self.similarity[c])
                    .fold(f64::MAX, f64::min);
                self.similarity[id] = min;
            }
        }
    }

    /// Give every internal node the sum of its children's weights, in
    /// post-order. After this, a node's value is the total match count
    /// below it.
    pub fn fill_sum_count(&mut self, tree: &Tree) {
        for &id in tree.postorder() {
            let node = tree.node(id);
            if !node.is_leaf() {
                self.weight[id] = node.children.iter().map(|&c| self.weight[c]).sum();
            }
        }
    }
}

/// Top two entries by descending count; ties go to the smaller id.
fn top_two_by_count(counts: &BTreeMap<SeqId, u32>) -> Option<((SeqId, u32), (SeqId, u32))> {
    let mut first: Option<(SeqId, u32)> = None;
    let mut second: Option<(SeqId, u32)> = None;
    for (&id, &count) in counts {
        if first.map_or(true, |(_, c)| count > c) {
            second = first;
            first = Some((id, count));
        } else if second.map_or(true, |(_, c)| count > c) {
            second = Some((id, count));
        }
    }
    Some((first?, second?))
}

/// Top two entries by ascending distance; ties go to the smaller id.
fn top_two_by_distance(distances: &BTreeMap<SeqId, f64>) -> Option<((SeqId, f64), (SeqId, f64))> {
    let mut first: Option<(SeqId, f64)> = None;
    let mut second: Option<(SeqId, f64)> = None;
    for (&id, &dist) in distances {
        if first.map_or(true, |(_, d)| dist < d) {
            second = first;
            first = Some((id, dist));
        } else if second.map_or(true, |(_, d)| dist < d) {
            second = Some((id, dist));
        }
    }
    Some((first?, second?))
}

/// Choose the placement node for one query.
///
/// `scratch` must have been [`Scratch::load`]ed with the same maps; the
/// leaf-valued policies read the query's state through it. A query with
/// no entries at all places at the root.
pub fn choose_node(
    tree: &Tree,
    policy: Policy,
    counts: &BTreeMap<SeqId, u32>,
    distances: &BTreeMap<SeqId, f64>,
    scratch: &mut Scratch,
) -> Result<NodeId> {
    match policy {
        Policy::BestCount => {
            if counts.is_empty() {
                return Ok(tree.root());
            }
            let mut best = tree.leaves()[0];
            for &leaf in tree.leaves() {
                if scratch.weight(leaf) > scratch.weight(best) {
                    best = leaf;
                }
            }
            Ok(best)
        }
        Policy::BestDistance => {
            if distances.is_empty() {
                return Ok(tree.root());
            }
            // The filled value at a node is the best similarity in its
            // subtree, so following it from the root lands on the best
            // leaf (leftmost on ties).
            scratch.fill_min_score(tree);
            let mut node = tree.root();
            while !tree.node(node).is_leaf() {
                let target = scratch.similarity(node);
                let children = &tree.node(node).children;
                node = children
                    .iter()
                    .copied()
                    .find(|&c| scratch.similarity(c) == target)
                    .unwrap_or(children[0]);
            }
            Ok(node)
        }
        Policy::LcaCount => match top_two_by_count(counts) {
            None => lone_entry(tree, counts.keys().next().copied()),
            Some(((id1, _), (id2, _))) => {
                let n1 = tree.find_node(id1)?;
                let n2 = tree.find_node(id2)?;
                Ok(tree.lca(&[n1, n2]))
            }
        },
        Policy::LcaDistance => match top_two_by_distance(distances) {
            None => lone_entry(tree, distances.keys().next().copied()),
            Some(((id1, _), (id2, _))) => {
                let n1 = tree.find_node(id1)?;
                let n2 = tree.find_node(id2)?;
                Ok(tree.lca(&[n1, n2]))
            }
        },
        Policy::LcaDominant { x } => match top_two_by_count(counts) {
            None => lone_entry(tree, counts.keys().next().copied()),
            Some(((id1, c1), (id2, c2))) => {
                let n1 = tree.find_node(id1)?;
                if (c1 as f64 - c2 as f64) > (c1 as f64 + c2 as f64) / x {
                    Ok(n1)
                } else {
                    let n2 = tree.find_node(id2)?;
                    Ok(tree.lca(&[n1, n2]))
                }
            }
        },
    }
}

/// Zero entries place at the root, a single entry at that leaf.
fn lone_entry(tree: &Tree, entry: Option<SeqId>) -> Result<NodeId> {
    match entry {
        Some(id) => tree.find_node(id),
        None => Ok(tree.root()),
    }
}

/// A placement positioned on a node's parent edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePlacement {
    pub node: NodeId,
    pub distal: f64,
    pub pendant: f64,
}

/// Position a query along the parent edge of the chosen node.
///
/// Leaf-based policies anchor the query in proportion to the Jukes-Cantor
/// distance estimate `d`, capping the distal length at the edge length `E`:
/// `d < 2E` gives `(d/2, d/2)`, otherwise `(E, d - E)`. LCA-based policies
/// and the root fallback sit at the edge midpoint with a configured
/// pendant length.
pub fn edge_placement(
    tree: &Tree,
    node: NodeId,
    policy: Policy,
    distances: &BTreeMap<SeqId, f64>,
    default_distance: f64,
    default_pendant: f64,
) -> EdgePlacement {
    let edge = tree.node(node).branch_length;
    if policy.is_leaf_based() && node != tree.root() {
        let d = distances
            .get(&tree.node(node).seq_id)
            .copied()
            .unwrap_or(default_distance);
        let (distal, pendant) = if d < 2.0 * edge {
            (d / 2.0, d / 2.0)
        } else {
            (edge, d - edge)
        };
        EdgePlacement {
            node,
            distal,
            pendant,
        }
    } else {
        EdgePlacement {
            node,
            distal: edge / 2.0,
            pendant: default_pendant,
        }
    }
}
