//! Trie nodes: representation, lookup and copy-on-write insertion.
//!
//! A node is never modified once built. Insertion walks from the root to the
//! affected slot and allocates fresh nodes only along that path; every other
//! child is shared by pointer with the original tree.

use std::borrow::Borrow;

use smallvec::SmallVec;

use super::super::ReferenceCounter;
use super::super::error::{NodeKind, TrieError};
use super::super::hash::{BRANCHING_FACTOR, MAX_LEVEL, bit_position, child_index, slot};
use super::super::list::PersistentList;

/// Shared pointer to a node.
pub(super) type NodeRef<K, V> = ReferenceCounter<Node<K, V>>;

/// A binding inside a collision bucket.
pub(super) type Entry<K, V> = (K, ReferenceCounter<V>);

/// Scratch buffer for the children of a branch being rebuilt.
pub(super) type ChildBuffer<K, V> = SmallVec<[NodeRef<K, V>; BRANCHING_FACTOR]>;

/// Internal node structure for the trie.
#[derive(Debug)]
pub(super) enum Node<K, V> {
    /// A single binding. The digest of `key` is cached for splitting.
    Leaf {
        hash: u32,
        key: K,
        value: ReferenceCounter<V>,
    },
    /// A sparse branch. Children are stored in ascending slot order and
    /// `children.len() == bitmap.count_ones()`, strictly between 0 and 32.
    Bitmap {
        bitmap: u32,
        children: Box<[NodeRef<K, V>]>,
    },
    /// A branch with every slot occupied.
    Full {
        children: Box<[NodeRef<K, V>; BRANCHING_FACTOR]>,
    },
    /// Two or more bindings whose digests agree on every level above
    /// [`MAX_LEVEL`]. Scanned front to back; the first match wins.
    Collision { entries: PersistentList<Entry<K, V>> },
}

impl<K, V> Node<K, V> {
    pub(super) const fn leaf(hash: u32, key: K, value: ReferenceCounter<V>) -> Self {
        Self::Leaf { hash, key, value }
    }

    pub(super) const fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf { .. } => NodeKind::Leaf,
            Self::Bitmap { .. } => NodeKind::Bitmap,
            Self::Full { .. } => NodeKind::Full,
            Self::Collision { .. } => NodeKind::Collision,
        }
    }

    /// Views a branch node as its bitmap and compacted children. A full node
    /// reports every bit set.
    pub(super) fn branch(&self) -> Option<(u32, &[NodeRef<K, V>])> {
        match self {
            Self::Bitmap { bitmap, children } => Some((*bitmap, &children[..])),
            Self::Full { children } => Some((u32::MAX, &children[..])),
            Self::Leaf { .. } | Self::Collision { .. } => None,
        }
    }

    /// Builds the branch node for `bitmap` and its compacted children,
    /// choosing the full representation when all 32 slots are occupied.
    pub(super) fn from_children(
        level: u32,
        bitmap: u32,
        children: ChildBuffer<K, V>,
    ) -> Result<Self, TrieError> {
        let length = children.len();
        if length == 0 || length != bitmap.count_ones() as usize {
            return Err(TrieError::ChildCountMismatch {
                level,
                bitmap,
                length,
            });
        }

        if length == BRANCHING_FACTOR {
            Box::<[NodeRef<K, V>; BRANCHING_FACTOR]>::try_from(children.into_vec())
                .map(|children| Self::Full { children })
                .map_err(|rejected| TrieError::ChildCountMismatch {
                    level,
                    bitmap,
                    length: rejected.len(),
                })
        } else {
            Ok(Self::Bitmap {
                bitmap,
                children: children.into_vec().into_boxed_slice(),
            })
        }
    }

    /// Looks up `key` below this node.
    pub(super) fn find<Q>(&self, level: u32, hash: u32, key: &Q) -> Option<&ReferenceCounter<V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Self::Leaf {
                hash: leaf_hash,
                key: leaf_key,
                value,
            } => (*leaf_hash == hash && leaf_key.borrow() == key).then_some(value),
            Self::Bitmap { bitmap, children } => {
                let bit = bit_position(level, hash);
                if bitmap & bit == 0 {
                    // Slot is empty
                    None
                } else {
                    children
                        .get(child_index(*bitmap, bit))?
                        .find(level + 1, hash, key)
                }
            }
            Self::Full { children } => children[slot(level, hash)].find(level + 1, hash, key),
            Self::Collision { entries } => entries
                .iter()
                .find(|(entry_key, _)| entry_key.borrow() == key)
                .map(|(_, value)| value),
        }
    }
}

impl<K: Eq + Clone, V> Node<K, V> {
    /// Returns a new node equal to `node` with `key` bound to `value`.
    ///
    /// `node` is taken as a shared pointer so that a leaf pushed one level
    /// deeper is reused rather than copied.
    pub(super) fn insert(
        node: &NodeRef<K, V>,
        level: u32,
        hash: u32,
        key: K,
        value: ReferenceCounter<V>,
    ) -> Result<Self, TrieError> {
        match node.as_ref() {
            Self::Leaf { key: leaf_key, .. } => {
                if *leaf_key == key {
                    Ok(Self::leaf(hash, key, value))
                } else {
                    let incoming = ReferenceCounter::new(Self::leaf(hash, key, value));
                    Self::join_leaves(level, node, &incoming)
                }
            }
            Self::Bitmap { bitmap, children } => {
                Self::ensure_branch_level(level, NodeKind::Bitmap)?;
                let bit = bit_position(level, hash);
                let index = child_index(*bitmap, bit);

                if bitmap & bit == 0 {
                    let leaf = ReferenceCounter::new(Self::leaf(hash, key, value));
                    let spliced = splice_child(level, children, index, leaf)?;
                    Self::from_children(level, bitmap | bit, spliced)
                } else {
                    let child = child_at(level, children, index)?;
                    let updated = Self::insert(child, level + 1, hash, key, value)?;
                    let children =
                        replace_child(level, children, index, ReferenceCounter::new(updated))?;
                    Ok(Self::Bitmap {
                        bitmap: *bitmap,
                        children,
                    })
                }
            }
            Self::Full { children } => {
                Self::ensure_branch_level(level, NodeKind::Full)?;
                let index = slot(level, hash);
                let updated = Self::insert(&children[index], level + 1, hash, key, value)?;

                let mut replaced = children.clone();
                replaced[index] = ReferenceCounter::new(updated);
                Ok(Self::Full { children: replaced })
            }
            Self::Collision { entries } => {
                let retained = entries.filter(|(entry_key, _)| *entry_key != key);
                Ok(Self::Collision {
                    entries: retained.push_front((key, value)),
                })
            }
        }
    }

    /// Builds the smallest subtree holding two leaves with distinct keys.
    ///
    /// Below [`MAX_LEVEL`], the leaves go into a two-child branch when their
    /// slots differ, or into a one-child branch over the subtree one level
    /// deeper when they share a slot. At [`MAX_LEVEL`] they form a collision
    /// bucket with `incoming` first.
    pub(super) fn join_leaves(
        level: u32,
        existing: &NodeRef<K, V>,
        incoming: &NodeRef<K, V>,
    ) -> Result<Self, TrieError> {
        let (
            Self::Leaf {
                hash: existing_hash,
                key: existing_key,
                value: existing_value,
            },
            Self::Leaf {
                hash: incoming_hash,
                key: incoming_key,
                value: incoming_value,
            },
        ) = (existing.as_ref(), incoming.as_ref())
        else {
            return Err(TrieError::UnreachablePairing {
                level,
                left: existing.kind(),
                right: incoming.kind(),
            });
        };

        if level > MAX_LEVEL {
            return Err(TrieError::DepthExceeded {
                level,
                kind: NodeKind::Leaf,
            });
        }

        if level == MAX_LEVEL {
            let entries = PersistentList::new()
                .push_front((existing_key.clone(), existing_value.clone()))
                .push_front((incoming_key.clone(), incoming_value.clone()));
            return Ok(Self::Collision { entries });
        }

        let existing_bit = bit_position(level, *existing_hash);
        let incoming_bit = bit_position(level, *incoming_hash);

        let mut children = ChildBuffer::new();
        if existing_bit == incoming_bit {
            // Same slot at this level - push both one level down
            let subtree = Self::join_leaves(level + 1, existing, incoming)?;
            children.push(ReferenceCounter::new(subtree));
        } else if existing_bit < incoming_bit {
            children.push(existing.clone());
            children.push(incoming.clone());
        } else {
            children.push(incoming.clone());
            children.push(existing.clone());
        }
        Self::from_children(level, existing_bit | incoming_bit, children)
    }

    /// Branch nodes exist only above the terminal level.
    pub(super) fn ensure_branch_level(level: u32, kind: NodeKind) -> Result<(), TrieError> {
        if level >= MAX_LEVEL {
            Err(TrieError::DepthExceeded { level, kind })
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Child array helpers
// =============================================================================

/// Returns the child at `index`, reporting bitmap arithmetic that points
/// outside the array.
pub(super) fn child_at<K, V>(
    level: u32,
    children: &[NodeRef<K, V>],
    index: usize,
) -> Result<&NodeRef<K, V>, TrieError> {
    children.get(index).ok_or(TrieError::IndexOutOfBounds {
        level,
        index,
        length: children.len(),
    })
}

/// Copies `children` with the child at `index` replaced.
pub(super) fn replace_child<K, V>(
    level: u32,
    children: &[NodeRef<K, V>],
    index: usize,
    replacement: NodeRef<K, V>,
) -> Result<Box<[NodeRef<K, V>]>, TrieError> {
    let mut replaced = children.to_vec();
    let length = replaced.len();
    let target = replaced
        .get_mut(index)
        .ok_or(TrieError::IndexOutOfBounds {
            level,
            index,
            length,
        })?;
    *target = replacement;
    Ok(replaced.into_boxed_slice())
}

/// Copies `children` with `inserted` placed at `index`, shifting the rest up.
pub(super) fn splice_child<K, V>(
    level: u32,
    children: &[NodeRef<K, V>],
    index: usize,
    inserted: NodeRef<K, V>,
) -> Result<ChildBuffer<K, V>, TrieError> {
    if index > children.len() {
        return Err(TrieError::IndexOutOfBounds {
            level,
            index,
            length: children.len(),
        });
    }
    let (before, after) = children.split_at(index);

    let mut spliced = ChildBuffer::with_capacity(children.len() + 1);
    spliced.extend(before.iter().cloned());
    spliced.push(inserted);
    spliced.extend(after.iter().cloned());
    Ok(spliced)
}

// =============================================================================
// Invariant checking
// =============================================================================

#[cfg(test)]
impl<K, V> Node<K, V> {
    /// Walks the subtree checking every structural invariant, returning the
    /// number of bindings stored below this node.
    pub(super) fn validate(&self, level: u32) -> Result<usize, String> {
        match self {
            Self::Leaf { .. } => {
                if level > MAX_LEVEL {
                    return Err(format!("leaf at level {level}"));
                }
                Ok(1)
            }
            Self::Bitmap { bitmap, children } => {
                if level >= MAX_LEVEL {
                    return Err(format!("bitmap node at level {level}"));
                }
                let population = bitmap.count_ones() as usize;
                if population != children.len() {
                    return Err(format!(
                        "bitmap {bitmap:#b} has {population} bits but {} children",
                        children.len()
                    ));
                }
                if population == 0 || population == BRANCHING_FACTOR {
                    return Err(format!("bitmap node with {population} children"));
                }
                children.iter().try_fold(0, |total, child| {
                    child.validate(level + 1).map(|count| total + count)
                })
            }
            Self::Full { children } => {
                if level >= MAX_LEVEL {
                    return Err(format!("full node at level {level}"));
                }
                children.iter().try_fold(0, |total, child| {
                    child.validate(level + 1).map(|count| total + count)
                })
            }
            Self::Collision { entries } => {
                if level != MAX_LEVEL {
                    return Err(format!("collision node at level {level}"));
                }
                let length = entries.len();
                if length < 2 {
                    return Err(format!("collision node with {length} entries"));
                }
                Ok(length)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
