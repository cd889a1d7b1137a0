//! Persistent (immutable) hash map based on a hash array mapped trie.
//!
//! This module provides [`PersistentMap`], an immutable hash map that uses
//! structural sharing for efficient operations.
//!
//! # Overview
//!
//! Keys are hashed to a 32-bit digest which is consumed five bits per level,
//! giving a 32-way trie at most seven levels deep. Keys whose digests agree on
//! every level share a collision bucket at the last level.
//!
//! - O(log32 N) find
//! - O(log32 N) insert
//! - O(N + M) worst case merge, O(1) when either side is empty or both sides
//!   share a root
//! - O(1) clone and `is_empty`
//!
//! Inserting and merging return new maps without modifying the original.
//! Only the nodes along the changed paths are allocated; every other node is
//! shared by pointer between versions.
//!
//! # Examples
//!
//! ```rust
//! use harkon::persistent::PersistentMap;
//!
//! let globals = PersistentMap::new()
//!     .new_insert("pi".to_string(), 3.14)
//!     .new_insert("e".to_string(), 2.71);
//!
//! // A nested scope shadows a binding without touching its parent
//! let scope = globals.new_insert("pi".to_string(), 3.0);
//! assert_eq!(globals.find("pi"), Some(&3.14));
//! assert_eq!(scope.find("pi"), Some(&3.0));
//! assert_eq!(scope.find("e"), Some(&2.71));
//! ```
//!
//! # Internal Structure
//!
//! The trie uses:
//! - Leaves holding one binding and the cached digest of its key
//! - Bitmap nodes for sparse branches, with children compacted by popcount
//! - Full nodes once all 32 slots of a branch are occupied
//! - Collision buckets (persistent lists) at the terminal level
//! - Structural sharing via [`ReferenceCounter`]

mod merge;
mod node;

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use super::ReferenceCounter;
use super::error::TrieError;
use super::hash::{DefaultHashBuilder, digest};
use node::{Node, NodeRef};

// =============================================================================
// PersistentMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on a hash array mapped trie.
///
/// Every version of the map stays valid after an update, and versions share
/// all of the structure they have in common. Values are stored behind a
/// [`ReferenceCounter`] and are never copied once inserted.
///
/// The hash builder `S` must hash every key the same way for every map taking
/// part in a merge. Every [`DefaultHashBuilder`] choice hashes consistently
/// within one process, so any two maps built with [`PersistentMap::new`] in
/// the same process qualify.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `find`         | O(log32 N)        |
/// | `new_insert`   | O(log32 N)        |
/// | `new_merge`    | O(N + M)          |
/// | `contains_key` | O(log32 N)        |
/// | `is_empty`     | O(1)              |
/// | `clone`        | O(1)              |
///
/// # Examples
///
/// ```rust
/// use harkon::persistent::PersistentMap;
///
/// let map: PersistentMap<String, i32> = PersistentMap::singleton("key".to_string(), 42);
/// assert_eq!(map.find("key"), Some(&42));
/// ```
pub struct PersistentMap<K, V, S = DefaultHashBuilder> {
    /// Root node of the trie, absent for the empty map
    root: Option<NodeRef<K, V>>,
    /// Hash builder for key digests
    hash_builder: S,
}

impl<K, V> PersistentMap<K, V, DefaultHashBuilder> {
    /// Creates a new empty map with the default hash builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map: PersistentMap<String, i32> = PersistentMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> PersistentMap<K, V, S> {
    /// Creates a new empty map that hashes keys with `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::hash::BuildHasherDefault;
    /// use std::collections::hash_map::DefaultHasher;
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map: PersistentMap<u64, &str, BuildHasherDefault<DefaultHasher>> =
    ///     PersistentMap::with_hasher(BuildHasherDefault::default());
    /// assert!(map.new_insert(7, "seven").contains_key(&7));
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            root: None,
            hash_builder,
        }
    }

    /// Returns `true` if the map contains no bindings.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let empty: PersistentMap<&str, i32> = PersistentMap::new();
    /// assert!(empty.is_empty());
    /// assert!(!empty.new_insert("key", 42).is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the map's hash builder.
    #[inline]
    #[must_use]
    pub const fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// Two empty maps share the (absent) root. Maps that are equal in content
    /// but were built independently do not.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map = PersistentMap::new().new_insert("a", 1);
    /// let copy = map.clone();
    /// assert!(map.ptr_eq(&copy));
    /// assert!(!map.ptr_eq(&PersistentMap::new().new_insert("a", 1)));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<K, V, S> PersistentMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    /// Creates a map containing a single binding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map: PersistentMap<&str, i32> = PersistentMap::singleton("key", 42);
    /// assert_eq!(map.find("key"), Some(&42));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self
    where
        S: Default,
    {
        Self::with_hasher(S::default()).new_insert(key, value)
    }

    /// Returns a reference to the value bound to `key`.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash` and
    /// `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Complexity
    ///
    /// O(log32 N), plus a scan of the collision bucket when `key` shares its
    /// digest with other keys
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map = PersistentMap::new().new_insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.find("hello"), Some(&42));
    /// assert_eq!(map.find("world"), None);
    /// ```
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_reference(key).map(|value| &**value)
    }

    /// Returns the shared pointer to the value bound to `key`.
    ///
    /// Every version of the map holding this binding hands out the same
    /// pointer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::{PersistentMap, ReferenceCounter};
    ///
    /// let map = PersistentMap::new().new_insert("a", vec![1, 2, 3]);
    /// let extended = map.new_insert("b", vec![4]);
    ///
    /// let original = map.find_shared("a").unwrap();
    /// let shared = extended.find_shared("a").unwrap();
    /// assert!(ReferenceCounter::ptr_eq(&original, &shared));
    /// ```
    #[must_use]
    pub fn find_shared<Q>(&self, key: &Q) -> Option<ReferenceCounter<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_reference(key).cloned()
    }

    /// Returns `true` if the map binds `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map = PersistentMap::new().new_insert("a", 1);
    /// assert!(map.contains_key("a"));
    /// assert!(!map.contains_key("b"));
    /// ```
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_reference(key).is_some()
    }

    fn find_reference<Q>(&self, key: &Q) -> Option<&ReferenceCounter<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.as_ref()?;
        root.find(0, digest(&self.hash_builder, key), key)
    }

    /// Returns a new map with `key` bound to `value`, or the invariant
    /// violation that prevented building it.
    ///
    /// # Errors
    ///
    /// Returns a [`TrieError`] if the trie turns out to be structurally
    /// corrupt along the insertion path. A map built only through this API
    /// never is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map = PersistentMap::new().try_new_insert("a", 1).unwrap();
    /// assert_eq!(map.find("a"), Some(&1));
    /// ```
    pub fn try_new_insert(&self, key: K, value: V) -> Result<Self, TrieError> {
        Ok(Self {
            root: Some(self.inserted_root(key, value)?),
            hash_builder: self.hash_builder.clone(),
        })
    }

    /// Returns a new map with `key` bound to `value`.
    ///
    /// An existing binding for `key` is shadowed in the new map and left in
    /// place in this one.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Panics
    ///
    /// Panics if the trie is structurally corrupt; see
    /// [`try_new_insert`](Self::try_new_insert).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map = PersistentMap::new().new_insert("key", 1);
    /// let updated = map.new_insert("key", 2);
    ///
    /// assert_eq!(map.find("key"), Some(&1));
    /// assert_eq!(updated.find("key"), Some(&2));
    /// ```
    #[must_use]
    pub fn new_insert(&self, key: K, value: V) -> Self {
        self.try_new_insert(key, value)
            .unwrap_or_else(|error| invariant_violation("insert", &error))
    }

    /// Binds `key` to `value` in this handle.
    ///
    /// Only this handle's root is replaced. Clones taken earlier keep seeing
    /// the previous version.
    ///
    /// # Panics
    ///
    /// Panics if the trie is structurally corrupt; see
    /// [`try_new_insert`](Self::try_new_insert).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let mut map = PersistentMap::new();
    /// map.insert("a", 1);
    /// let snapshot = map.clone();
    /// map.insert("a", 2);
    ///
    /// assert_eq!(snapshot.find("a"), Some(&1));
    /// assert_eq!(map.find("a"), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) {
        match self.inserted_root(key, value) {
            Ok(root) => self.root = Some(root),
            Err(error) => invariant_violation("insert", &error),
        }
    }

    fn inserted_root(&self, key: K, value: V) -> Result<NodeRef<K, V>, TrieError> {
        let hash = digest(&self.hash_builder, &key);
        let value = ReferenceCounter::new(value);
        let root = match &self.root {
            None => Node::leaf(hash, key, value),
            Some(root) => Node::insert(root, 0, hash, key, value)?,
        };
        Ok(ReferenceCounter::new(root))
    }

    /// Returns the union of this map and `other`, or the invariant violation
    /// that prevented building it. Bindings of `other` win on shared keys.
    ///
    /// # Errors
    ///
    /// Returns a [`TrieError`] if the two tries cannot be reconciled, which
    /// happens only when one of them is structurally corrupt or the maps
    /// hash keys differently.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let left = PersistentMap::new().new_insert("a", 1);
    /// let right = PersistentMap::new().new_insert("b", 2);
    /// let merged = left.try_new_merge(&right).unwrap();
    /// assert!(merged.contains_key("a") && merged.contains_key("b"));
    /// ```
    pub fn try_new_merge(&self, other: &Self) -> Result<Self, TrieError> {
        Ok(Self {
            root: self.merged_root(other)?,
            hash_builder: self.hash_builder.clone(),
        })
    }

    /// Returns the union of this map and `other`. Bindings of `other` win on
    /// shared keys.
    ///
    /// Subtrees present in only one operand are reused as they are, and
    /// merging with an empty map returns the other map's root unchanged.
    ///
    /// # Complexity
    ///
    /// O(N + M) in the worst case, proportional to the overlap of the two
    /// tries in practice
    ///
    /// # Panics
    ///
    /// Panics if the tries cannot be reconciled; see
    /// [`try_new_merge`](Self::try_new_merge).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let map1 = PersistentMap::new()
    ///     .new_insert("a".to_string(), 1)
    ///     .new_insert("b".to_string(), 2);
    /// let map2 = PersistentMap::new()
    ///     .new_insert("b".to_string(), 20)
    ///     .new_insert("c".to_string(), 3);
    ///
    /// let merged = map1.new_merge(&map2);
    ///
    /// assert_eq!(merged.find("a"), Some(&1));
    /// assert_eq!(merged.find("b"), Some(&20)); // From map2
    /// assert_eq!(merged.find("c"), Some(&3));
    /// ```
    #[must_use]
    pub fn new_merge(&self, other: &Self) -> Self {
        self.try_new_merge(other)
            .unwrap_or_else(|error| invariant_violation("merge", &error))
    }

    /// Merges `other` into this handle. Bindings of `other` win on shared
    /// keys.
    ///
    /// # Panics
    ///
    /// Panics if the tries cannot be reconciled; see
    /// [`try_new_merge`](Self::try_new_merge).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentMap;
    ///
    /// let mut map = PersistentMap::new().new_insert("a", 1);
    /// map.merge(&PersistentMap::new().new_insert("a", 10).new_insert("b", 2));
    ///
    /// assert_eq!(map.find("a"), Some(&10));
    /// assert_eq!(map.find("b"), Some(&2));
    /// ```
    pub fn merge(&mut self, other: &Self) {
        match self.merged_root(other) {
            Ok(root) => self.root = root,
            Err(error) => invariant_violation("merge", &error),
        }
    }

    fn merged_root(&self, other: &Self) -> Result<Option<NodeRef<K, V>>, TrieError> {
        tracing::trace!(
            left_empty = self.root.is_none(),
            right_empty = other.root.is_none(),
            shared_root = self.ptr_eq(other),
            "merging persistent maps"
        );
        match (&self.root, &other.root) {
            (None, root) | (root, None) => Ok(root.clone()),
            (Some(left), Some(right)) => merge::merge(0, left, right).map(Some),
        }
    }
}

/// Reports a broken trie invariant and aborts the operation.
#[cold]
#[inline(never)]
fn invariant_violation(operation: &'static str, error: &TrieError) -> ! {
    tracing::error!(operation, %error, "persistent map invariant violated");
    panic!("persistent map {operation} failed: {error}");
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V, S: Clone> Clone for PersistentMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S: Default> Default for PersistentMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> FromIterator<(K, V)> for PersistentMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for PersistentMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for PersistentMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PersistentMap")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Static Assertions
// =============================================================================

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentMap<String, i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentMap<String, i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
