//! DDG tree construction.
//!
//! The decision structure is a binary tree whose leaves are outcome labels,
//! built level by level from the matrix columns. Non-dyadic denominators
//! make the expansion periodic: internal nodes at the prefix boundary
//! (level `l`) are queued as ancestors, and children missing at the last
//! level borrow the next queued ancestor instead of growing a new subtree.
//! Those back edges give some nodes several parents, so the structure is a
//! DAG held in an arena of id-indexed nodes rather than owned pointers.

use std::collections::{HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::matrix::DdgMatrix;

#[derive(Clone, Debug)]
struct Node {
    label: Option<u32>,
    left: Option<usize>,
    right: Option<usize>,
}

/// A DDG tree (with back edges) in arena form. Node handles are indices
/// into the arena; edges are handles, never owning pointers.
#[derive(Clone, Debug)]
pub struct DdgTree {
    nodes: Vec<Node>,
    root: usize,
}

/// Map from level-order heap index to 1-based outcome label, scanning
/// matrix columns left to right and assigning heap indices within a level
/// from the rightmost position down.
fn leaf_table(matrix: &DdgMatrix) -> Result<HashMap<u128, u32>> {
    let mut table = HashMap::new();
    let mut current: u128 = 2;
    for level in 0..matrix.k() as usize {
        for (row, bits) in matrix.rows().iter().enumerate() {
            if bits[level] == 1 {
                table.insert(current, (row + 1) as u32);
                current = current.checked_sub(1).ok_or_else(|| {
                    Error::InvariantViolation("leaf table underflow: matrix is overfull".into())
                })?;
            }
        }
        current = 2 * current + 2;
    }
    Ok(table)
}

fn build_node(
    nodes: &mut Vec<Node>,
    index: u128,
    k: u32,
    l: u32,
    ancestors: &mut VecDeque<usize>,
    table: &HashMap<u128, u32>,
) -> Result<usize> {
    let id = nodes.len();
    nodes.push(Node {
        label: None,
        left: None,
        right: None,
    });
    if let Some(&label) = table.get(&index) {
        nodes[id].label = Some(label);
        return Ok(id);
    }
    let level = (index + 1).ilog2();
    if level == l {
        ancestors.push_back(id);
    }
    let index_lc = 2 * index + 1;
    let index_rc = 2 * index + 2;

    // The right child is built first; the ancestor queue order depends on it.
    let right = if level == k - 1 && !table.contains_key(&index_rc) {
        ancestors.pop_front().ok_or_else(|| {
            Error::InvariantViolation("ancestor queue exhausted at right child".into())
        })?
    } else {
        build_node(nodes, index_rc, k, l, ancestors, table)?
    };
    nodes[id].right = Some(right);

    let left = if level == k - 1 && !table.contains_key(&index_lc) {
        ancestors.pop_front().ok_or_else(|| {
            Error::InvariantViolation("ancestor queue exhausted at left child".into())
        })?
    } else {
        build_node(nodes, index_lc, k, l, ancestors, table)?
    };
    nodes[id].left = Some(left);
    Ok(id)
}

impl DdgTree {
    /// Build the DDG tree of a reduced matrix.
    pub fn build(matrix: &DdgMatrix) -> Result<Self> {
        if matrix.k() == 1 && matrix.l() == 0 {
            // Deterministic singleton: one leaf, no decision structure.
            let nodes = vec![Node {
                label: Some(matrix.degenerate_label()),
                left: None,
                right: None,
            }];
            return Ok(DdgTree { nodes, root: 0 });
        }
        let table = leaf_table(matrix)?;
        let mut nodes = Vec::new();
        let mut ancestors = VecDeque::new();
        let root = build_node(
            &mut nodes,
            0,
            matrix.k(),
            matrix.l(),
            &mut ancestors,
            &table,
        )?;
        Ok(DdgTree { nodes, root })
    }

    /// Root node id.
    pub fn root(&self) -> usize {
        self.root
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true for a built tree).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outcome label of `id`, if it is a leaf.
    pub fn label(&self, id: usize) -> Option<u32> {
        self.nodes[id].label
    }

    /// Left child of `id`, if it is internal.
    pub fn left(&self, id: usize) -> Option<usize> {
        self.nodes[id].left
    }

    /// Right child of `id`, if it is internal.
    pub fn right(&self, id: usize) -> Option<usize> {
        self.nodes[id].right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(ms: &[u128], k: u32, l: u32) -> DdgTree {
        let m = DdgMatrix::new(ms, k, l).unwrap();
        DdgTree::build(&m).unwrap()
    }

    fn lc(t: &DdgTree, id: usize) -> usize {
        t.left(id).unwrap()
    }

    fn rc(t: &DdgTree, id: usize) -> usize {
        t.right(id).unwrap()
    }

    #[test]
    fn test_leaf_table_positions() {
        let m = DdgMatrix::new(&[5, 5, 4], 4, 1).unwrap();
        let table = leaf_table(&m).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table[&6], 1);
        assert_eq!(table[&5], 2);
        assert_eq!(table[&4], 3);
        assert_eq!(table[&18], 1);
        assert_eq!(table[&17], 2);
    }

    #[test]
    fn test_probs_dyadic() {
        // [1, 1, 3, 1, 2] / 8: plain dyadic expansions, no back edges.
        let t = tree(&[1, 1, 3, 1, 2], 3, 3);
        let root = t.root();

        let r = rc(&t, root);
        assert_eq!(t.label(r), None);
        assert_eq!(t.label(rc(&t, r)), Some(3));
        assert_eq!(t.label(lc(&t, r)), Some(5));

        let l = lc(&t, root);
        assert_eq!(t.label(l), None);
        let ll = lc(&t, l);
        let lr = rc(&t, l);
        assert_eq!(t.label(ll), None);
        assert_eq!(t.label(lr), None);

        assert_eq!(t.label(rc(&t, lr)), Some(1));
        assert_eq!(t.label(lc(&t, lr)), Some(2));
        assert_eq!(t.label(rc(&t, ll)), Some(3));
        assert_eq!(t.label(lc(&t, ll)), Some(4));
    }

    #[test]
    fn test_probs_nondyadic_back_edge_to_root() {
        // [3, 12] / 15: the leftmost path at the last level cycles to the root.
        let t = tree(&[3, 12], 4, 0);
        let root = t.root();

        assert_eq!(t.label(rc(&t, root)), Some(2));

        let l = lc(&t, root);
        assert_eq!(t.label(l), None);
        assert_eq!(t.label(rc(&t, l)), Some(2));

        let ll = lc(&t, l);
        assert_eq!(t.label(ll), None);
        assert_eq!(t.label(rc(&t, ll)), Some(1));

        let lll = lc(&t, ll);
        assert_eq!(t.label(lll), None);
        assert_eq!(t.label(rc(&t, lll)), Some(1));
        assert_eq!(lc(&t, lll), root);
    }

    #[test]
    fn test_probs_nondyadic_two_back_edges() {
        // [5, 5, 4] / 14 with prefix length 1: two distinct back edges.
        let t = tree(&[5, 5, 4], 4, 1);
        let root = t.root();

        let r = rc(&t, root);
        assert_eq!(t.label(rc(&t, r)), Some(1));
        assert_eq!(t.label(lc(&t, r)), Some(2));

        let l = lc(&t, root);
        assert_eq!(t.label(rc(&t, l)), Some(3));

        let ll = lc(&t, l);
        let llr = rc(&t, ll);
        assert_eq!(t.label(rc(&t, llr)), Some(1));
        assert_eq!(t.label(lc(&t, llr)), Some(2));

        let lll = lc(&t, ll);
        assert_eq!(lc(&t, lll), l);
        assert_eq!(rc(&t, lll), r);
    }

    #[test]
    fn test_probs_nondyadic_three_back_edges() {
        // [8, 5, 5, 5, 5] / 28 with prefix length 2.
        let t = tree(&[8, 5, 5, 5, 5], 5, 2);
        let root = t.root();

        let r = rc(&t, root);
        assert_eq!(t.label(rc(&t, r)), Some(1));
        let rl = lc(&t, r);
        assert_eq!(t.label(rc(&t, rl)), Some(2));
        assert_eq!(t.label(lc(&t, rl)), Some(3));

        let l = lc(&t, root);
        let lr = rc(&t, l);
        assert_eq!(t.label(rc(&t, lr)), Some(4));
        assert_eq!(t.label(lc(&t, lr)), Some(5));

        let ll = lc(&t, l);
        let llr = rc(&t, ll);
        let llrr = rc(&t, llr);
        assert_eq!(t.label(rc(&t, llrr)), Some(1));
        assert_eq!(t.label(lc(&t, llrr)), Some(2));
        let llrl = lc(&t, llr);
        assert_eq!(t.label(rc(&t, llrl)), Some(3));
        assert_eq!(t.label(lc(&t, llrl)), Some(4));

        let lll = lc(&t, ll);
        let lllr = rc(&t, lll);
        assert_eq!(t.label(rc(&t, lllr)), Some(5));
        assert_eq!(t.label(lc(&t, lllr)), None);
        assert_eq!(lc(&t, lllr), rl);

        let llll = lc(&t, lll);
        assert_eq!(rc(&t, llll), lr);
        assert_eq!(lc(&t, llll), ll);
    }

    #[test]
    fn test_reduction_to_single_node() {
        let t = tree(&[0, 15], 4, 0);
        assert_eq!(t.len(), 1);
        // The surviving outcome keeps its original index.
        assert_eq!(t.label(t.root()), Some(2));
        assert_eq!(t.left(t.root()), None);
        assert_eq!(t.right(t.root()), None);
    }
}
