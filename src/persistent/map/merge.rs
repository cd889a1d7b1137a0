//! Right-biased structural merge of two tries.
//!
//! Both operands route every key through the same hash prefix, so two nodes
//! met at the same position are always at the same level. The pairing of
//! their kinds selects the strategy:
//!
//! | left \ right  | Leaf                | Bitmap / Full       | Collision           |
//! |---------------|---------------------|---------------------|---------------------|
//! | Leaf          | join or replace     | graft leaf          | join bucket         |
//! | Bitmap / Full | graft leaf          | union of slots      | invariant violation |
//! | Collision     | join bucket         | invariant violation | concatenate buckets |
//!
//! On every key present on both sides the right operand's binding is kept.
//! Subtrees present on one side only are reused without copying, and a pair
//! of identical pointers short-circuits to that pointer.

use super::super::ReferenceCounter;
use super::super::error::TrieError;
use super::super::hash::{bit_position, child_index};
use super::node::{ChildBuffer, Node, NodeRef, child_at, splice_child};

/// Which operand of a leaf/branch graft holds the winning bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precedence {
    Leaf,
    Branch,
}

/// Merges two subtrees rooted at `level`; `right` wins on shared keys.
pub(super) fn merge<K: Eq + Clone, V>(
    level: u32,
    left: &NodeRef<K, V>,
    right: &NodeRef<K, V>,
) -> Result<NodeRef<K, V>, TrieError> {
    if ReferenceCounter::ptr_eq(left, right) {
        return Ok(left.clone());
    }

    match (left.as_ref(), right.as_ref()) {
        (Node::Leaf { key: left_key, .. }, Node::Leaf { key: right_key, .. }) => {
            if left_key == right_key {
                Ok(right.clone())
            } else {
                Node::join_leaves(level, left, right).map(ReferenceCounter::new)
            }
        }
        (Node::Leaf { hash, .. }, Node::Bitmap { .. } | Node::Full { .. }) => {
            graft_leaf(level, left, *hash, right, Precedence::Branch)
        }
        (Node::Bitmap { .. } | Node::Full { .. }, Node::Leaf { hash, .. }) => {
            graft_leaf(level, right, *hash, left, Precedence::Leaf)
        }
        (Node::Bitmap { .. } | Node::Full { .. }, Node::Bitmap { .. } | Node::Full { .. }) => {
            merge_branches(level, left, right)
        }
        (
            Node::Leaf {
                key: left_key,
                value: left_value,
                ..
            },
            Node::Collision { entries },
        ) => {
            if entries.iter().any(|(entry_key, _)| entry_key == left_key) {
                Ok(right.clone())
            } else {
                Ok(ReferenceCounter::new(Node::Collision {
                    entries: entries.push_front((left_key.clone(), left_value.clone())),
                }))
            }
        }
        (
            Node::Collision { entries },
            Node::Leaf {
                key: right_key,
                value: right_value,
                ..
            },
        ) => {
            let retained = entries.filter(|(entry_key, _)| entry_key != right_key);
            Ok(ReferenceCounter::new(Node::Collision {
                entries: retained.push_front((right_key.clone(), right_value.clone())),
            }))
        }
        (
            Node::Collision {
                entries: left_entries,
            },
            Node::Collision {
                entries: right_entries,
            },
        ) => {
            let shadowed = left_entries.filter(|(left_key, _)| {
                !right_entries
                    .iter()
                    .any(|(right_key, _)| right_key == left_key)
            });
            if shadowed.is_empty() {
                Ok(right.clone())
            } else {
                Ok(ReferenceCounter::new(Node::Collision {
                    entries: right_entries.append(&shadowed),
                }))
            }
        }
        (Node::Bitmap { .. } | Node::Full { .. }, Node::Collision { .. })
        | (Node::Collision { .. }, Node::Bitmap { .. } | Node::Full { .. }) => {
            Err(TrieError::UnreachablePairing {
                level,
                left: left.kind(),
                right: right.kind(),
            })
        }
    }
}

/// Places `leaf` into `branch` at the slot its digest selects, merging with
/// the slot's occupant when there is one.
fn graft_leaf<K: Eq + Clone, V>(
    level: u32,
    leaf: &NodeRef<K, V>,
    leaf_hash: u32,
    branch: &NodeRef<K, V>,
    winner: Precedence,
) -> Result<NodeRef<K, V>, TrieError> {
    Node::<K, V>::ensure_branch_level(level, branch.kind())?;
    let Some((bitmap, children)) = branch.branch() else {
        return Err(TrieError::UnreachablePairing {
            level,
            left: leaf.kind(),
            right: branch.kind(),
        });
    };

    let bit = bit_position(level, leaf_hash);
    let index = child_index(bitmap, bit);

    if bitmap & bit == 0 {
        let spliced = splice_child(level, children, index, leaf.clone())?;
        return Node::from_children(level, bitmap | bit, spliced).map(ReferenceCounter::new);
    }

    let occupant = child_at(level, children, index)?;
    let merged = match winner {
        Precedence::Leaf => merge(level + 1, occupant, leaf)?,
        Precedence::Branch => merge(level + 1, leaf, occupant)?,
    };

    let mut replaced: ChildBuffer<K, V> = children.iter().cloned().collect();
    replaced[index] = merged;
    Node::from_children(level, bitmap, replaced).map(ReferenceCounter::new)
}

/// Unions two branch nodes slot by slot, recursing into slots both occupy.
fn merge_branches<K: Eq + Clone, V>(
    level: u32,
    left: &NodeRef<K, V>,
    right: &NodeRef<K, V>,
) -> Result<NodeRef<K, V>, TrieError> {
    Node::<K, V>::ensure_branch_level(level, left.kind())?;
    let (Some((left_bitmap, left_children)), Some((right_bitmap, right_children))) =
        (left.branch(), right.branch())
    else {
        return Err(TrieError::UnreachablePairing {
            level,
            left: left.kind(),
            right: right.kind(),
        });
    };

    let mut children = ChildBuffer::new();
    for slot_number in 0..u32::BITS {
        let bit = 1u32 << slot_number;
        let in_left = left_bitmap & bit != 0;
        let in_right = right_bitmap & bit != 0;

        match (in_left, in_right) {
            (true, true) => {
                let left_child = child_at(level, left_children, child_index(left_bitmap, bit))?;
                let right_child =
                    child_at(level, right_children, child_index(right_bitmap, bit))?;
                children.push(merge(level + 1, left_child, right_child)?);
            }
            (true, false) => {
                let child = child_at(level, left_children, child_index(left_bitmap, bit))?;
                children.push(child.clone());
            }
            (false, true) => {
                let child = child_at(level, right_children, child_index(right_bitmap, bit))?;
                children.push(child.clone());
            }
            (false, false) => {}
        }
    }

    Node::from_children(level, left_bitmap | right_bitmap, children).map(ReferenceCounter::new)
}

// =============================================================================
// Tests
// =============================================================================
