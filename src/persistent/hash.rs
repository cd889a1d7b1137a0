//! 32-bit key digests and slot arithmetic for the hash array mapped trie.
//!
//! Keys are hashed through a [`BuildHasher`], so the hash function is
//! pluggable per map: any builder works as long as it is deterministic for
//! the lifetime of the maps that share nodes. The 64-bit output of the
//! standard hashing machinery is folded into the 32-bit digest the trie
//! consumes five bits at a time.
//!
//! # Default hash builder
//!
//! | Feature   | [`DefaultHashBuilder`]                         |
//! |-----------|------------------------------------------------|
//! | (none)    | `BuildHasherDefault<DefaultHasher>` (`SipHash`)|
//! | `fxhash`  | `rustc_hash::FxBuildHasher`                    |
//! | `ahash`   | `BuildHasherDefault<ahash::AHasher>`           |
//!
//! All three hash a key the same way for every builder created within one
//! process, which keeps independently built maps mergeable within that
//! process. `ahash` picks its fixed keys at random once per process, so
//! digests must not be persisted or compared across processes.

use std::hash::{BuildHasher, Hash};

// =============================================================================
// Default Hash Builder
// =============================================================================

/// Hash builder used when a map is created with [`PersistentMap::new`].
///
/// [`PersistentMap::new`]: crate::persistent::PersistentMap::new
#[cfg(feature = "fxhash")]
pub type DefaultHashBuilder = rustc_hash::FxBuildHasher;

/// Hash builder used when a map is created with [`PersistentMap::new`].
///
/// [`PersistentMap::new`]: crate::persistent::PersistentMap::new
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub type DefaultHashBuilder = std::hash::BuildHasherDefault<ahash::AHasher>;

/// Hash builder used when a map is created with [`PersistentMap::new`].
///
/// [`PersistentMap::new`]: crate::persistent::PersistentMap::new
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub type DefaultHashBuilder =
    std::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

// =============================================================================
// Constants
// =============================================================================

/// Branching factor of a trie level (2^5 = 32).
pub const BRANCHING_FACTOR: usize = 32;

/// Hash bits consumed per trie level.
pub const BITS_PER_LEVEL: u32 = 5;

/// The terminal level. Levels `0..MAX_LEVEL` each consume five bits of the
/// digest; keys still indistinguishable at this level share a collision
/// bucket.
pub const MAX_LEVEL: u32 = 6;

/// Bit mask for extracting a slot within a node.
const MASK: u32 = (BRANCHING_FACTOR - 1) as u32;

// =============================================================================
// Digest computation
// =============================================================================

/// Computes the 32-bit digest of `key` with the given hash builder.
///
/// # Examples
///
/// ```rust
/// use harkon::persistent::hash::digest;
/// use harkon::persistent::DefaultHashBuilder;
///
/// let builder = DefaultHashBuilder::default();
/// assert_eq!(digest(&builder, "key"), digest(&builder, "key"));
/// ```
#[inline]
pub fn digest<S, Q>(builder: &S, key: &Q) -> u32
where
    S: BuildHasher,
    Q: Hash + ?Sized,
{
    fold(builder.hash_one(key))
}

/// Folds a 64-bit hash into 32 bits so the high half still contributes.
#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Extracts the slot (0..32) addressed by `hash` at `level`.
///
/// Levels past the end of the digest address slot 0.
#[inline]
#[must_use]
pub const fn slot(level: u32, hash: u32) -> usize {
    match hash.checked_shr(level * BITS_PER_LEVEL) {
        Some(shifted) => (shifted & MASK) as usize,
        None => 0,
    }
}

/// Returns the single-bit mask for the slot addressed by `hash` at `level`.
#[inline]
#[must_use]
pub const fn bit_position(level: u32, hash: u32) -> u32 {
    1 << slot(level, hash)
}

/// Returns the compacted child index of `bit` inside `bitmap`: the number of
/// occupied slots below it.
#[inline]
#[must_use]
pub const fn child_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & bit.wrapping_sub(1)).count_ones() as usize
}

// =============================================================================
// Tests
// =============================================================================
