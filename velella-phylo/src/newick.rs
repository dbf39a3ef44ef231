//! Newick parsing and writing.
//!
//! The parser produces a raw arena consumed by [`crate::tree::Tree`]; the
//! writer re-serializes a bound tree, optionally annotating every edge with
//! `{<edge_num>}` in depth-first post-order starting at 0 (the numbering
//! used by placement files).

use velella_core::{Result, VelellaError};

use crate::tree::{Node, NodeId, Tree};

/// An unbound node fresh out of the parser.
#[derive(Debug, Clone, Default)]
pub struct RawNode {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Parse a Newick string into a raw node arena and its root index.
///
/// Single pass over the bytes with an explicit stack of open clades, so
/// deeply nested input cannot overflow the call stack. A label directly
/// after `)` names the clade that just closed; any other label opens a new
/// leaf under the innermost unclosed clade.
pub fn parse(input: &str) -> Result<(Vec<RawNode>, usize)> {
    let bytes = input.as_bytes();
    let mut nodes: Vec<RawNode> = Vec::new();
    // Unclosed '(' clades, innermost last.
    let mut open: Vec<usize> = Vec::new();
    let mut root: Option<usize> = None;
    // The node a label or ':' currently applies to.
    let mut last: Option<usize> = None;
    // Set right after ')': the next label renames `last` instead of
    // creating a leaf.
    let mut clade_just_closed = false;
    let mut terminated = false;

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'(' => {
                let id = attach_node(&mut nodes, open.last().copied(), &mut root)?;
                open.push(id);
                last = None;
                clade_just_closed = false;
                i += 1;
            }
            b',' => {
                if open.is_empty() {
                    return Err(VelellaError::Parse(
                        "',' outside of any clade in Newick input".into(),
                    ));
                }
                clade_just_closed = false;
                i += 1;
            }
            b')' => {
                let id = open.pop().ok_or_else(|| {
                    VelellaError::Parse("')' without a matching '(' in Newick input".into())
                })?;
                last = Some(id);
                clade_just_closed = true;
                i += 1;
            }
            b':' => {
                let (value, next) = take_branch_length(bytes, i + 1)?;
                let id = last.ok_or_else(|| {
                    VelellaError::Parse("':' with no node to attach a branch length to".into())
                })?;
                nodes[id].branch_length = Some(value);
                i = next;
            }
            b';' => {
                terminated = true;
                break;
            }
            _ => {
                let (name, next) = take_label(bytes, i);
                if clade_just_closed {
                    // `last` was set by the ')' that raised the flag.
                    let id = last.ok_or_else(|| {
                        VelellaError::Parse("dangling clade label in Newick input".into())
                    })?;
                    nodes[id].name = Some(name);
                    clade_just_closed = false;
                } else {
                    let id = attach_node(&mut nodes, open.last().copied(), &mut root)?;
                    nodes[id].name = Some(name);
                    last = Some(id);
                }
                i = next;
            }
        }
    }

    if !terminated {
        return Err(VelellaError::Parse(
            "Newick input ended before the terminating ';'".into(),
        ));
    }
    if !open.is_empty() {
        return Err(VelellaError::Parse(format!(
            "{} unclosed '(' in Newick input",
            open.len()
        )));
    }
    let root =
        root.ok_or_else(|| VelellaError::Parse("Newick input contains no nodes".into()))?;
    Ok((nodes, root))
}

/// Append a node under `parent`, or install it as the root.
fn attach_node(
    nodes: &mut Vec<RawNode>,
    parent: Option<usize>,
    root: &mut Option<usize>,
) -> Result<usize> {
    let id = nodes.len();
    nodes.push(RawNode {
        parent,
        ..RawNode::default()
    });
    match parent {
        Some(p) => nodes[p].children.push(id),
        None => {
            if root.is_some() {
                return Err(VelellaError::Parse(
                    "more than one top-level node in Newick input".into(),
                ));
            }
            *root = Some(id);
        }
    }
    Ok(id)
}

/// Read a label starting at `start`; ends at structure characters or
/// whitespace. Returns the label and the index past it.
fn take_label(bytes: &[u8], start: usize) -> (String, usize) {
    let mut end = start;
    while end < bytes.len()
        && !matches!(bytes[end], b'(' | b')' | b',' | b':' | b';')
        && !bytes[end].is_ascii_whitespace()
    {
        end += 1;
    }
    (
        String::from_utf8_lossy(&bytes[start..end]).into_owned(),
        end,
    )
}

/// Read the branch length after a ':'. Returns the value and the index
/// past it.
fn take_branch_length(bytes: &[u8], start: usize) -> Result<(f64, usize)> {
    let mut begin = start;
    while begin < bytes.len() && bytes[begin].is_ascii_whitespace() {
        begin += 1;
    }
    let mut end = begin;
    while end < bytes.len() && matches!(bytes[end], b'0'..=b'9' | b'.' | b'+' | b'-' | b'e' | b'E')
    {
        end += 1;
    }
    if begin == end {
        return Err(VelellaError::Parse(
            "':' must be followed by a branch length".into(),
        ));
    }
    let text = String::from_utf8_lossy(&bytes[begin..end]);
    let value: f64 = text.parse().map_err(|_| {
        VelellaError::Parse(format!("cannot parse branch length '{}'", text))
    })?;
    Ok((value, end))
}

/// Format a branch length with enough precision but no trailing zeros.
fn format_branch_length(len: f64) -> String {
    let s = format!("{:.10}", len);
    let s = s.trim_end_matches('0');
    let s = s.trim_end_matches('.');
    if s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Serialize a bound tree without edge annotations.
pub fn write(tree: &Tree) -> String {
    let mut buf = String::new();
    write_subtree(tree, tree.root(), &mut buf, &mut 0, false, &mut Vec::new());
    buf.push(';');
    buf
}

/// Serialize a bound tree with `{<edge_num>}` annotations.
///
/// Edge numbers are assigned in depth-first post-order starting at 0.
/// Returns the serialized string and the edge number of every node,
/// indexed by [`NodeId`].
pub fn write_annotated(tree: &Tree) -> (String, Vec<usize>) {
    let mut buf = String::new();
    let mut edge_ids = vec![0usize; tree.node_count()];
    write_subtree(tree, tree.root(), &mut buf, &mut 0, true, &mut edge_ids);
    buf.push(';');
    (buf, edge_ids)
}

fn write_subtree(
    tree: &Tree,
    id: NodeId,
    buf: &mut String,
    counter: &mut usize,
    annotate: bool,
    edge_ids: &mut Vec<usize>,
) {
    let node: &Node = tree.node(id);
    if !node.children.is_empty() {
        buf.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                buf.push(',');
            }
            write_subtree(tree, child, buf, counter, annotate, edge_ids);
        }
        buf.push(')');
    }
    buf.push_str(&node.name);
    buf.push(':');
    buf.push_str(&format_branch_length(node.branch_length));
    if annotate {
        buf.push('{');
        buf.push_str(&counter.to_string());
        buf.push('}');
        edge_ids[id] = *counter;
    }
    *counter += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_pair() {
        let (nodes, root) = parse("(A:0.1,B:0.2);").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[root].children.len(), 2);
        let a = nodes[root].children[0];
        assert_eq!(nodes[a].name.as_deref(), Some("A"));
        assert_eq!(nodes[a].branch_length, Some(0.1));
    }

    #[test]
    fn parse_internal_names() {
        let (nodes, root) = parse("((A,B)AB,(C,D)CD)root;").unwrap();
        assert_eq!(nodes[root].name.as_deref(), Some("root"));
        let ab = nodes[root].children[0];
        assert_eq!(nodes[ab].name.as_deref(), Some("AB"));
    }

    #[test]
    fn parse_single_leaf() {
        let (nodes, root) = parse("A:1.5;").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[root].name.as_deref(), Some("A"));
        assert_eq!(nodes[root].branch_length, Some(1.5));
    }

    #[test]
    fn parse_trifurcating_root() {
        let (nodes, root) = parse("(A:1,B:1,C:1);").unwrap();
        assert_eq!(nodes[root].children.len(), 3);
    }

    #[test]
    fn parse_whitespace() {
        let (nodes, _) = parse("  ( A : 0.1 , B : 0.2 ) ; ").unwrap();
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn parse_clade_branch_length() {
        let (nodes, root) = parse("((A,B):0.7,C);").unwrap();
        let ab = nodes[root].children[0];
        assert_eq!(nodes[ab].branch_length, Some(0.7));
        assert_eq!(nodes[ab].children.len(), 2);
    }

    #[test]
    fn parse_error_unbalanced() {
        assert!(parse("((A,B);").is_err());
        assert!(parse("(A,B));").is_err());
    }

    #[test]
    fn parse_error_missing_semicolon() {
        assert!(parse("(A,B)").is_err());
    }

    #[test]
    fn parse_error_bad_length() {
        assert!(parse("(A:abc,B);").is_err());
        assert!(parse("(A:,B);").is_err());
    }

    #[test]
    fn parse_error_two_roots() {
        assert!(parse("(A,B) (C,D);").is_err());
    }

    #[test]
    fn parse_error_empty() {
        assert!(parse(";").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn branch_length_formatting() {
        assert_eq!(format_branch_length(1.0), "1");
        assert_eq!(format_branch_length(0.5), "0.5");
        assert_eq!(format_branch_length(0.0), "0");
        assert_eq!(format_branch_length(0.001), "0.001");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn leaf_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9]{0,5}"
    }

    /// A caterpillar tree over 2-6 distinct leaves, no branch lengths.
    fn simple_newick() -> impl Strategy<Value = String> {
        proptest::collection::btree_set(leaf_name(), 2..=6).prop_map(|leaves| {
            let leaves: Vec<String> = leaves.into_iter().collect();
            if leaves.len() == 2 {
                return format!("({},{});", leaves[0], leaves[1]);
            }
            let mut s = format!("({},{})", leaves[0], leaves[1]);
            for leaf in &leaves[2..] {
                s = format!("({},{})", s, leaf);
            }
            s.push(';');
            s
        })
    }

    proptest! {
        #[test]
        fn parse_does_not_panic(s in "\\PC{0,100}") {
            let _ = parse(&s);
        }

        #[test]
        fn leaf_count_preserved(newick in simple_newick()) {
            let (nodes, _) = parse(&newick).unwrap();
            let leaf_count = nodes.iter().filter(|n| n.children.is_empty()).count();
            let commas = newick.matches(',').count();
            prop_assert_eq!(leaf_count, commas + 1);
        }
    }
}
