//! Persistent (immutable) data structures.
//!
//! This module provides the immutable containers of the crate. Both use
//! structural sharing, so every update allocates only the path it changes:
//!
//! - [`PersistentMap`]: Persistent hash map (hash array mapped trie) with
//!   copy-on-write insertion and a right-biased structural merge
//! - [`PersistentList`]: Persistent singly-linked list, used as the map's
//!   collision bucket
//!
//! # Examples
//!
//! ## `PersistentMap`
//!
//! ```rust
//! use harkon::persistent::PersistentMap;
//!
//! let empty: PersistentMap<&str, i32> = PersistentMap::new();
//! let first = empty.new_insert("a", 1);
//! let second = first.new_insert("b", 2);
//!
//! assert_eq!(empty.find("a"), None);
//! assert_eq!(first.find("b"), None);      // Original unchanged
//! assert_eq!(second.find("a"), Some(&1)); // New version
//! assert_eq!(second.find("b"), Some(&2));
//! ```
//!
//! ## Merging
//!
//! ```rust
//! use harkon::persistent::PersistentMap;
//!
//! let left = PersistentMap::new().new_insert("k", 1);
//! let right = PersistentMap::new().new_insert("k", 2);
//!
//! assert_eq!(left.new_merge(&right).find("k"), Some(&2)); // right wins
//! assert_eq!(right.new_merge(&left).find("k"), Some(&1));
//! ```
//!
//! ## `PersistentList`
//!
//! ```rust
//! use harkon::persistent::PersistentList;
//!
//! let list = PersistentList::new().push_front(3).push_front(2).push_front(1);
//! assert_eq!(list.front(), Some(&1));
//!
//! // Structural sharing: the original list is preserved
//! let extended = list.push_front(0);
//! assert_eq!(list.len(), 3);
//! assert_eq!(extended.len(), 4);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub type ReferenceCounter<T> = std::sync::Arc<T>;

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(not(feature = "arc"))]
pub type ReferenceCounter<T> = std::rc::Rc<T>;

mod error;
pub mod hash;
mod list;
mod map;

pub use error::NodeKind;
pub use error::TrieError;
pub use hash::DefaultHashBuilder;
pub use list::PersistentList;
pub use list::PersistentListIntoIterator;
pub use list::PersistentListIterator;
pub use map::PersistentMap;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_clone() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(*reference_counter, *reference_counter_clone);
        assert!(ReferenceCounter::ptr_eq(
            &reference_counter,
            &reference_counter_clone
        ));
    }

    #[rstest]
    fn test_reference_counter_strong_count() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 2);
        drop(reference_counter_clone);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
    }
}
