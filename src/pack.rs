//! Flattening DDG trees into pointer-free encodings.
//!
//! A depth-first pass assigns each node an offset in a flat integer array:
//! an internal node occupies slots `(o, o+1)` holding the offsets of its
//! children, and a leaf occupies one slot holding the negated outcome
//! label. Nodes reached again through back edges reuse their recorded
//! offset, so shared subtrees are encoded once and the result is
//! self-contained: decoding resolves nothing but array indices.

use crate::error::{Error, Result};
use crate::tree::DdgTree;

/// A packed DDG sampler: a flat array of slot values, with the outcome
/// count `n` and bit depth `k` it was built at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoding {
    pub(crate) values: Vec<i64>,
    pub(crate) n: u32,
    pub(crate) k: u32,
}

fn put(values: &mut Vec<i64>, index: usize, value: i64) {
    if index >= values.len() {
        values.resize(index + 1, 0);
    }
    values[index] = value;
}

fn pack_node(
    tree: &DdgTree,
    id: usize,
    values: &mut Vec<i64>,
    locs: &mut [Option<usize>],
    offset: usize,
) -> Result<usize> {
    debug_assert!(locs[id].is_none());
    locs[id] = Some(offset);
    if let Some(label) = tree.label(id) {
        put(values, offset, -i64::from(label));
        return Ok(offset + 1);
    }
    let left = tree
        .left(id)
        .ok_or_else(|| Error::InvariantViolation("internal node without left child".into()))?;
    let right = tree
        .right(id)
        .ok_or_else(|| Error::InvariantViolation("internal node without right child".into()))?;

    let mut next = offset + 2;
    if let Some(loc) = locs[left] {
        put(values, offset, loc as i64);
    } else {
        put(values, offset, next as i64);
        next = pack_node(tree, left, values, locs, next)?;
    }
    if let Some(loc) = locs[right] {
        put(values, offset + 1, loc as i64);
    } else {
        put(values, offset + 1, next as i64);
        next = pack_node(tree, right, values, locs, next)?;
    }
    Ok(next)
}

impl Encoding {
    /// Pack `tree` into its flat encoding. `n` and `k` are carried through
    /// to the interchange header.
    pub fn pack(tree: &DdgTree, n: u32, k: u32) -> Result<Self> {
        let mut values = Vec::new();
        let mut locs = vec![None; tree.len()];
        let end = pack_node(tree, tree.root(), &mut values, &mut locs, 0)?;
        if end != values.len() {
            return Err(Error::InvariantViolation(format!(
                "packing ended at {} but wrote {} slots",
                end,
                values.len()
            )));
        }
        Ok(Encoding { values, n, k })
    }

    /// Rebuild an encoding from its parts, as read from the text format.
    ///
    /// The slot array is validated structurally before it is accepted:
    /// every position reachable as an internal node must hold two
    /// in-range, non-negative child offsets, and every reachable leaf a
    /// usable label. The sampler walk then never indexes out of bounds.
    pub fn from_parts(values: Vec<i64>, n: u32, k: u32) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::DomainError("empty encoding".into()));
        }
        let len = values.len();
        let leaf_ok = |v: i64| v < 0 && -v <= i64::from(u32::MAX);
        if len == 1 {
            if !leaf_ok(values[0]) {
                return Err(Error::DomainError("single-slot encoding must be a leaf".into()));
            }
            return Ok(Encoding { values, n, k });
        }
        let mut visited = vec![false; len];
        let mut stack = vec![0usize];
        while let Some(o) = stack.pop() {
            if visited[o] {
                continue;
            }
            visited[o] = true;
            if o + 1 >= len {
                return Err(Error::DomainError(format!(
                    "internal node at slot {o} is missing its second slot"
                )));
            }
            for v in [values[o], values[o + 1]] {
                if v < 0 || v >= len as i64 {
                    return Err(Error::DomainError(format!(
                        "child offset {v} out of range (length {len})"
                    )));
                }
                let target = v as usize;
                if values[target] < 0 {
                    if !leaf_ok(values[target]) {
                        return Err(Error::DomainError(format!(
                            "leaf slot {target} holds unusable label {}",
                            values[target]
                        )));
                    }
                } else if !visited[target] {
                    stack.push(target);
                }
            }
        }
        Ok(Encoding { values, n, k })
    }

    /// The flat slot array.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Number of outcomes.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Bit depth the sampler was built at.
    pub fn k(&self) -> u32 {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DdgMatrix;

    fn encoding(ms: &[u128], k: u32, l: u32) -> Encoding {
        let m = DdgMatrix::new(ms, k, l).unwrap();
        let tree = DdgTree::build(&m).unwrap();
        Encoding::pack(&tree, m.n() as u32, m.k()).unwrap()
    }

    #[test]
    fn test_one_back_edge() {
        let enc = encoding(&[3, 12], 4, 0);

        // Exactly one slot points backwards, to the root.
        let back_edges: Vec<i64> = enc
            .values()
            .iter()
            .enumerate()
            .filter(|&(a, &b)| 0 <= b && (b as usize) < a)
            .map(|(_, &b)| b)
            .collect();
        assert_eq!(back_edges, vec![0]);

        let leaves_three = enc.values().iter().filter(|&&v| v == -1).count();
        assert_eq!(leaves_three, 2);
        let leaves_twelve = enc.values().iter().filter(|&&v| v == -2).count();
        assert_eq!(leaves_twelve, 2);
    }

    #[test]
    fn test_pack_is_contiguous_and_in_range() {
        let enc = encoding(&[8, 5, 5, 5, 5], 5, 2);
        let len = enc.values().len() as i64;
        for &v in enc.values() {
            assert!(v < len);
            if v < 0 {
                assert!(-v <= 5);
            }
        }
    }

    #[test]
    fn test_pack_singleton_holds_label() {
        let enc = encoding(&[0, 31], 5, 0);
        assert_eq!(enc.values(), &[-2]);
    }

    #[test]
    fn test_from_parts_accepts_well_formed_slots() {
        // A two-leaf tree and the degenerate single leaf.
        assert!(Encoding::from_parts(vec![2, 3, -1, -2], 2, 1).is_ok());
        assert!(Encoding::from_parts(vec![-2], 1, 1).is_ok());

        // Everything the packer itself emits must pass.
        let enc = encoding(&[8, 5, 5, 5, 5], 5, 2);
        assert!(Encoding::from_parts(enc.values().to_vec(), enc.n(), enc.k()).is_ok());
    }

    #[test]
    fn test_from_parts_rejects_unwalkable_slots() {
        use crate::error::Error;

        // A leaf value sitting where the walk expects a child offset.
        assert!(matches!(
            Encoding::from_parts(vec![0, -3], 2, 2),
            Err(Error::DomainError(_))
        ));
        // Child offset past the end of the array.
        assert!(matches!(
            Encoding::from_parts(vec![2, 5, -1], 2, 2),
            Err(Error::DomainError(_))
        ));
        // Internal node whose second slot falls off the end.
        assert!(matches!(
            Encoding::from_parts(vec![2, 2, 0], 2, 2),
            Err(Error::DomainError(_))
        ));
        // Non-leaf single slot.
        assert!(matches!(
            Encoding::from_parts(vec![0], 1, 1),
            Err(Error::DomainError(_))
        ));
    }
}
