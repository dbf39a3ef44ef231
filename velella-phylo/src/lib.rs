//! Reference tree and placement policies for the Velella placement engine.
//!
//! Provides the arena-based rooted reference tree with LCA and ancestor
//! queries, Newick parsing and edge-annotated re-serialization, the
//! Jukes-Cantor distance correction, and the five placement policies.

pub mod distance;
pub mod newick;
pub mod placement;
pub mod tree;

pub use distance::jukes_cantor;
pub use placement::{choose_node, edge_placement, EdgePlacement, Policy, Scratch};
pub use tree::{Node, NodeId, Tree};
