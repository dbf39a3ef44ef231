//! The rooted reference tree.
//!
//! Nodes live in a flat arena and are referenced by [`NodeId`] indices;
//! `parent` is an `Option<NodeId>` and children are id lists, so LCA and
//! ancestor queries run over the arena without pointer graphs. Leaves are
//! bound to reference sequence ids through the pipeline's `NameTable`;
//! internal nodes mint fresh ids from the same counter.

use std::collections::HashMap;

use tracing::warn;
use velella_core::{NameTable, Result, SeqId, VelellaError};

use crate::newick::{self, RawNode};

/// Index into the tree's node arena.
pub type NodeId = usize;

/// A single node of the reference tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Index of this node in the arena.
    pub id: NodeId,
    /// Sequence id: the reference id for leaves, a freshly minted id for
    /// internal nodes.
    pub seq_id: SeqId,
    /// Leaf name (a reference sequence name) or `internal_<k>`.
    pub name: String,
    /// Parent node (`None` only at the root).
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Branch length from the parent to this node.
    pub branch_length: f64,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted, at-most-binary reference tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    postorder: Vec<NodeId>,
    preorder: Vec<NodeId>,
    leaves: Vec<NodeId>,
    seq_to_node: HashMap<SeqId, NodeId>,
}

impl Tree {
    /// Parse a Newick string and bind it against the reference name table.
    ///
    /// Every leaf name must resolve in the reference partition
    /// (`UnknownLeaf` otherwise). A root with more than two children is
    /// rebinarized: all children after the first are re-parented under a
    /// new internal node that becomes the root's second child. Internal
    /// node names are then assigned `internal_<k>` in depth-first
    /// post-order, so edge ids are stable for a given topology.
    pub fn from_newick(input: &str, names: &mut NameTable) -> Result<Self> {
        let (mut raw, root) = newick::parse(input)?;

        if raw[root].children.len() > 2 {
            warn!("reference tree is unrooted; rooting arbitrarily at the first child");
            rebinarize_root(&mut raw, root);
        }

        Self::bind(raw, root, names)
    }

    /// Read a Newick file and parse it per [`Self::from_newick`].
    pub fn from_newick_file(
        path: impl AsRef<std::path::Path>,
        names: &mut NameTable,
    ) -> Result<Self> {
        let newick = std::fs::read_to_string(path)?;
        Self::from_newick(&newick, names)
    }

    fn bind(raw: Vec<RawNode>, raw_root: usize, names: &mut NameTable) -> Result<Self> {
        // Rebuild the arena in depth-first order so node ids are stable
        // regardless of parser allocation order.
        let order = postorder_of(&raw, raw_root);

        let mut internal_counter = 0usize;
        let mut raw_to_new: HashMap<usize, NodeId> = HashMap::new();
        let mut nodes: Vec<Node> = Vec::with_capacity(order.len());

        for &raw_id in &order {
            let r = &raw[raw_id];
            let id = nodes.len();
            raw_to_new.insert(raw_id, id);

            let (name, seq_id) = if r.children.is_empty() {
                let name = r.name.clone().unwrap_or_default();
                let seq_id = names
                    .reference_id(&name)
                    .ok_or_else(|| VelellaError::UnknownLeaf(name.clone()))?;
                (name, seq_id)
            } else {
                internal_counter += 1;
                let name = format!("internal_{}", internal_counter);
                let seq_id = names.add_internal(&name);
                (name, seq_id)
            };

            let children: Vec<NodeId> = r.children.iter().map(|c| raw_to_new[c]).collect();
            nodes.push(Node {
                id,
                seq_id,
                name,
                parent: None,
                children,
                branch_length: r.branch_length.unwrap_or(0.0),
            });
        }

        // Fix up parent links from the child lists.
        for id in 0..nodes.len() {
            for c in nodes[id].children.clone() {
                nodes[c].parent = Some(id);
            }
        }

        let root = raw_to_new[&raw_root];
        let postorder: Vec<NodeId> = (0..nodes.len()).collect();
        let preorder = preorder_of(&nodes, root);
        let leaves: Vec<NodeId> = postorder
            .iter()
            .copied()
            .filter(|&id| nodes[id].is_leaf())
            .collect();
        let seq_to_node = nodes.iter().map(|n| (n.seq_id, n.id)).collect();

        Ok(Self {
            nodes,
            root,
            postorder,
            preorder,
            leaves,
            seq_to_node,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Node ids in depth-first post-order (children before parent).
    pub fn postorder(&self) -> &[NodeId] {
        &self.postorder
    }

    /// Node ids in pre-order (parent before children).
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    /// Leaf ids in depth-first order.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Resolve a sequence id to its node.
    pub fn find_node(&self, seq_id: SeqId) -> Result<NodeId> {
        self.seq_to_node
            .get(&seq_id)
            .copied()
            .ok_or(VelellaError::NodeNotFound(seq_id))
    }

    /// Lowest common ancestor of a non-empty id set.
    ///
    /// Never returns a node below any input: `lca(&[x]) == x`.
    pub fn lca(&self, ids: &[NodeId]) -> NodeId {
        if ids.is_empty() {
            return self.root;
        }
        let first_path = self.root_path(ids[0]);
        let mut shared = first_path.len();
        for &id in &ids[1..] {
            let path = self.root_path(id);
            let common = first_path
                .iter()
                .zip(&path)
                .take_while(|(a, b)| a == b)
                .count();
            shared = shared.min(common);
        }
        first_path[shared - 1]
    }

    /// Path from the root down to `id`, inclusive.
    fn root_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = id;
        while let Some(p) = self.nodes[cur].parent {
            path.push(p);
            cur = p;
        }
        path.reverse();
        path
    }

    /// True if `parent` lies on the path from `child` to the root
    /// (including `parent == child`). The root is an ancestor of everything.
    pub fn is_ancestor(&self, child: NodeId, parent: NodeId) -> bool {
        if parent == self.root || child == parent {
            return true;
        }
        let mut cur = child;
        while let Some(p) = self.nodes[cur].parent {
            if p == parent {
                return true;
            }
            cur = p;
        }
        false
    }

    /// Serialize without edge annotations.
    pub fn to_newick(&self) -> String {
        newick::write(self)
    }

    /// Serialize with `{<edge_num>}` annotations; returns the string and
    /// each node's edge number (indexed by [`NodeId`]).
    pub fn annotated_newick(&self) -> (String, Vec<usize>) {
        newick::write_annotated(self)
    }
}

/// Re-parent all root children after the first under a new internal node.
fn rebinarize_root(raw: &mut Vec<RawNode>, root: usize) {
    let moved: Vec<usize> = raw[root].children.split_off(1);
    let new_id = raw.len();
    raw.push(RawNode {
        name: None,
        branch_length: None,
        parent: Some(root),
        children: moved.clone(),
    });
    for c in moved {
        raw[c].parent = Some(new_id);
    }
    raw[root].children.push(new_id);
}

fn postorder_of(raw: &[RawNode], root: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(raw.len());
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        order.push(id);
        for &child in &raw[id].children {
            stack.push(child);
        }
    }
    order.reverse();
    order
}

fn preorder_of(nodes: &[Node], root: NodeId) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        order.push(id);
        for &child in nodes[id].children.iter().rev() {
            stack.push(child);
        }
    }
    order
}
