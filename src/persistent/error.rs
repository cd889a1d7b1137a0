//! Error types for the trie engine.
//!
//! None of these errors can be caused by a caller: each one describes a
//! broken structural invariant (a node kind at a depth where it cannot
//! exist, or bitmap arithmetic that disagrees with a child array). The
//! checked `try_*` operations of [`PersistentMap`] return them, while the
//! plain operations treat them as fatal.
//!
//! [`PersistentMap`]: crate::persistent::PersistentMap

use std::fmt;

/// The kind of a trie node, used to describe invariant violations.
///
/// # Examples
///
/// ```rust
/// use harkon::persistent::NodeKind;
///
/// assert_eq!(NodeKind::Collision.to_string(), "collision");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A single binding.
    Leaf,
    /// A sparse branch indexed by a 32-bit occupancy bitmap.
    Bitmap,
    /// A branch with all 32 slots occupied.
    Full,
    /// A bucket of bindings whose hashes cannot be told apart.
    Collision,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leaf => "leaf",
            Self::Bitmap => "bitmap",
            Self::Full => "full",
            Self::Collision => "collision",
        };
        formatter.write_str(name)
    }
}

/// A structural invariant violation detected while rebuilding a trie.
///
/// # Examples
///
/// ```rust
/// use harkon::persistent::{NodeKind, TrieError};
///
/// let error = TrieError::UnreachablePairing {
///     level: 6,
///     left: NodeKind::Bitmap,
///     right: NodeKind::Collision,
/// };
/// assert_eq!(
///     error.to_string(),
///     "cannot merge a bitmap node with a collision node at level 6"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// Two nodes at the same trie position have kinds that cannot coexist
    /// there.
    UnreachablePairing {
        /// Trie level of the two nodes.
        level: u32,
        /// Kind of the left operand.
        left: NodeKind,
        /// Kind of the right operand.
        right: NodeKind,
    },
    /// A child index computed from a bitmap fell outside the child array.
    IndexOutOfBounds {
        /// Trie level of the branch node.
        level: u32,
        /// The offending index.
        index: usize,
        /// Length of the child array.
        length: usize,
    },
    /// A rebuilt branch has a different number of children than its bitmap
    /// has set bits.
    ChildCountMismatch {
        /// Trie level of the branch node.
        level: u32,
        /// The occupancy bitmap.
        bitmap: u32,
        /// Number of children supplied.
        length: usize,
    },
    /// A node appeared below the deepest level its kind may occupy.
    DepthExceeded {
        /// Trie level at which the node was found.
        level: u32,
        /// Kind of the misplaced node.
        kind: NodeKind,
    },
}

impl fmt::Display for TrieError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreachablePairing { level, left, right } => write!(
                formatter,
                "cannot merge a {left} node with a {right} node at level {level}"
            ),
            Self::IndexOutOfBounds {
                level,
                index,
                length,
            } => write!(
                formatter,
                "child index {index} out of bounds for {length} children at level {level}"
            ),
            Self::ChildCountMismatch {
                level,
                bitmap,
                length,
            } => write!(
                formatter,
                "bitmap {bitmap:#034b} at level {level} does not match {length} children"
            ),
            Self::DepthExceeded { level, kind } => {
                write!(formatter, "{kind} node found at level {level}")
            }
        }
    }
}

impl std::error::Error for TrieError {}

// =============================================================================
// Tests
// =============================================================================
