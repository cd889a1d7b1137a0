//! Persistent (immutable) singly-linked list.
//!
//! This module provides [`PersistentList`], an immutable cons-list that uses
//! structural sharing for efficient operations.
//!
//! # Overview
//!
//! - O(1) `push_front`
//! - O(1) `front` and `pop_front`
//! - O(1) `is_empty`
//! - O(n) `len` and equality (the length is not cached)
//! - O(n) `filter`, `append` and `reverse`
//!
//! Inside the crate the list is the container of a trie collision bucket;
//! outside of it, it serves as a cheap shareable sequence.
//!
//! # Structural Sharing
//!
//! ```text
//! list1: 1 -> 2 -> 3 -> nil
//! list2 = list1.push_front(0): 0 -> [1 -> 2 -> 3 -> nil]  // shares [1, 2, 3] with list1
//! ```
//!
//! # Examples
//!
//! ```rust
//! use harkon::persistent::PersistentList;
//!
//! let list: PersistentList<i32> = (1..=5).collect();
//! assert_eq!(list.front(), Some(&1));
//! assert_eq!(list.iter().sum::<i32>(), 15);
//!
//! let tail = list.pop_front();
//! assert_eq!(tail.front(), Some(&2));
//! assert_eq!(list.len(), 5); // Original unchanged
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::ReferenceCounter;

/// A cons cell: an element and the rest of the list.
struct Node<T> {
    element: T,
    next: Option<ReferenceCounter<Self>>,
}

/// A persistent (immutable) singly-linked list.
///
/// # Time Complexity
///
/// | Operation    | Complexity |
/// |--------------|------------|
/// | `new`        | O(1)       |
/// | `push_front` | O(1)       |
/// | `front`      | O(1)       |
/// | `pop_front`  | O(1)       |
/// | `is_empty`   | O(1)       |
/// | `len`        | O(n)       |
/// | `filter`     | O(n)       |
/// | `append`     | O(n)       |
/// | `reverse`    | O(n)       |
///
/// # Examples
///
/// ```rust
/// use harkon::persistent::PersistentList;
///
/// let list = PersistentList::singleton(42);
/// assert_eq!(list.front(), Some(&42));
/// ```
pub struct PersistentList<T> {
    head: Option<ReferenceCounter<Node<T>>>,
}

impl<T> Clone for PersistentList<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

impl<T> PersistentList<T> {
    /// Creates a new empty list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentList;
    ///
    /// let list: PersistentList<i32> = PersistentList::new();
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Creates a list containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().push_front(element)
    }

    /// Builds a list from a Vec, keeping the Vec's order.
    fn build_from_vec(elements: Vec<T>) -> Self {
        Self::build_onto(elements, None)
    }

    /// Builds a list holding `elements` followed by the nodes of `tail`.
    fn build_onto(mut elements: Vec<T>, tail: Option<ReferenceCounter<Node<T>>>) -> Self {
        let mut head = tail;
        while let Some(element) = elements.pop() {
            head = Some(ReferenceCounter::new(Node {
                element,
                next: head,
            }));
        }
        Self { head }
    }

    /// Prepends an element, sharing the whole of the current list as the
    /// new list's tail.
    ///
    /// # Complexity
    ///
    /// O(1) time and space
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentList;
    ///
    /// let list = PersistentList::new().push_front(2).push_front(1);
    /// let extended = list.push_front(0);
    ///
    /// assert_eq!(list.front(), Some(&1));
    /// assert_eq!(extended.front(), Some(&0));
    /// ```
    #[inline]
    #[must_use]
    pub fn push_front(&self, element: T) -> Self {
        Self {
            head: Some(ReferenceCounter::new(Node {
                element,
                next: self.head.clone(),
            })),
        }
    }

    /// Returns a reference to the first element, or `None` if the list is
    /// empty.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.head.as_ref().map(|node| &node.element)
    }

    /// Returns the list without its first element.
    ///
    /// The result shares every node with the original. Popping an empty list
    /// yields an empty list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentList;
    ///
    /// let list = PersistentList::new().push_front(2).push_front(1);
    /// assert_eq!(list.pop_front().front(), Some(&2));
    /// assert!(PersistentList::<i32>::new().pop_front().is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn pop_front(&self) -> Self {
        self.head.as_ref().map_or_else(Self::new, |node| Self {
            head: node.next.clone(),
        })
    }

    /// Decomposes the list into its first element and the rest.
    #[inline]
    #[must_use]
    pub fn uncons(&self) -> Option<(&T, Self)> {
        self.head.as_ref().map(|node| {
            let tail = Self {
                head: node.next.clone(),
            };
            (&node.element, tail)
        })
    }

    /// Returns the number of elements.
    ///
    /// # Complexity
    ///
    /// O(n): the list is walked on every call.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns an iterator over references to the elements, front to back.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> PersistentListIterator<'_, T> {
        PersistentListIterator {
            current: self.head.as_deref(),
        }
    }

    /// Returns `true` if both lists share the same head node.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Clone> PersistentList<T> {
    /// Returns the elements satisfying `predicate`, in their original order.
    ///
    /// When every element is kept, the original nodes are shared instead of
    /// copied. Otherwise only the prefix up to the last removed element is
    /// rebuilt; the remaining suffix is shared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentList;
    ///
    /// let list: PersistentList<i32> = (1..=6).collect();
    /// let even = list.filter(|value| value % 2 == 0);
    /// assert_eq!(even.iter().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
    /// ```
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        let mut kept = Vec::new();
        let mut pending: Vec<&T> = Vec::new();
        let mut current = self.head.as_ref();
        let mut shared_suffix = self.head.clone();

        while let Some(node) = current {
            if predicate(&node.element) {
                pending.push(&node.element);
            } else {
                kept.extend(pending.drain(..).cloned());
                shared_suffix.clone_from(&node.next);
            }
            current = node.next.as_ref();
        }

        Self::build_onto(kept, shared_suffix)
    }

    /// Concatenates two lists; the result shares `other` as its tail.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use harkon::persistent::PersistentList;
    ///
    /// let front: PersistentList<i32> = (1..=2).collect();
    /// let back: PersistentList<i32> = (3..=4).collect();
    /// let joined = front.append(&back);
    /// assert_eq!(joined.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn append(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        Self::build_onto(self.iter().cloned().collect(), other.head.clone())
    }

    /// Returns the list with its elements in reverse order.
    #[must_use]
    pub fn reverse(&self) -> Self {
        self.iter()
            .fold(Self::new(), |reversed, element| reversed.push_front(element.clone()))
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over references to elements of a [`PersistentList`].
pub struct PersistentListIterator<'a, T> {
    current: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for PersistentListIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.map(|node| {
            self.current = node.next.as_deref();
            &node.element
        })
    }
}

/// An owning iterator over elements of a [`PersistentList`].
pub struct PersistentListIntoIterator<T> {
    list: PersistentList<T>,
}

impl<T: Clone> Iterator for PersistentListIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let (element, tail) = self
            .list
            .uncons()
            .map(|(element, tail)| (element.clone(), tail))?;
        self.list = tail;
        Some(element)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Drop for PersistentList<T> {
    // Unlinks uniquely owned nodes one at a time so that long lists do not
    // drop recursively. Stops at the first node another list still holds.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(node) = next {
            match ReferenceCounter::try_unwrap(node) {
                Ok(mut node) => next = node.next.take(),
                Err(_shared) => break,
            }
        }
    }
}

impl<T> Default for PersistentList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for PersistentList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::build_from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone> IntoIterator for PersistentList<T> {
    type Item = T;
    type IntoIter = PersistentListIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentListIntoIterator { list: self }
    }
}

impl<'a, T> IntoIterator for &'a PersistentList<T> {
    type Item = &'a T;
    type IntoIter = PersistentListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PersistentList<T> {}

impl<T: Hash> Hash for PersistentList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Length first so that nested lists of different shapes differ
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentList<i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentList<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn to_vec(list: &PersistentList<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[rstest]
    fn test_new_creates_empty() {
        let list: PersistentList<i32> = PersistentList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.front(), None);
    }

    #[rstest]
    fn test_push_front_shares_tail() {
        let list = PersistentList::new().push_front(2).push_front(1);
        let extended = list.push_front(0);

        assert_eq!(to_vec(&list), vec![1, 2]);
        assert_eq!(to_vec(&extended), vec![0, 1, 2]);
        assert!(extended.pop_front().ptr_eq(&list));
    }

    #[rstest]
    fn test_uncons() {
        let list: PersistentList<i32> = (1..=3).collect();
        let (head, tail) = list.uncons().unwrap();
        assert_eq!(*head, 1);
        assert_eq!(to_vec(&tail), vec![2, 3]);
        assert!(PersistentList::<i32>::new().uncons().is_none());
    }

    #[rstest]
    fn test_from_iter_preserves_order() {
        let list: PersistentList<i32> = vec![3, 1, 2].into_iter().collect();
        assert_eq!(to_vec(&list), vec![3, 1, 2]);
    }

    #[rstest]
    fn test_into_iter() {
        let list: PersistentList<i32> = (1..=3).collect();
        let collected: Vec<i32> = list.into_iter().collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![1, 3, 5], vec![])]
    #[case(vec![2, 4], vec![2, 4])]
    #[case(vec![1, 2, 3, 4, 5, 6], vec![2, 4, 6])]
    #[case(vec![2, 3, 4, 6, 8], vec![2, 4, 6, 8])]
    fn test_filter(#[case] input: Vec<i32>, #[case] expected: Vec<i32>) {
        let list: PersistentList<i32> = input.into_iter().collect();
        assert_eq!(to_vec(&list.filter(|value| value % 2 == 0)), expected);
    }

    #[rstest]
    fn test_filter_keeping_everything_shares_nodes() {
        let list: PersistentList<i32> = (1..=4).collect();
        let filtered = list.filter(|_| true);
        assert!(filtered.ptr_eq(&list));
    }

    #[rstest]
    fn test_filter_shares_suffix_after_last_removal() {
        let suffix: PersistentList<i32> = (10..=12).collect();
        let list = suffix.push_front(1).push_front(2);
        let filtered = list.filter(|value| *value != 1);

        assert_eq!(to_vec(&filtered), vec![2, 10, 11, 12]);
        assert!(filtered.pop_front().ptr_eq(&suffix));
    }

    #[rstest]
    fn test_append() {
        let front: PersistentList<i32> = (1..=2).collect();
        let back: PersistentList<i32> = (3..=4).collect();
        let joined = front.append(&back);

        assert_eq!(to_vec(&joined), vec![1, 2, 3, 4]);
        assert!(joined.pop_front().pop_front().ptr_eq(&back));
        assert!(PersistentList::new().append(&back).ptr_eq(&back));
        assert!(front.append(&PersistentList::new()).ptr_eq(&front));
    }

    #[rstest]
    fn test_reverse() {
        let list: PersistentList<i32> = (1..=4).collect();
        assert_eq!(to_vec(&list.reverse()), vec![4, 3, 2, 1]);
    }

    #[rstest]
    fn test_eq_walks_elements() {
        let first: PersistentList<i32> = (1..=3).collect();
        let second: PersistentList<i32> = (1..=3).collect();
        let shorter: PersistentList<i32> = (1..=2).collect();

        assert_eq!(first, second);
        assert_ne!(first, shorter);
        assert_ne!(shorter, first);
    }

    #[rstest]
    fn test_debug_and_display() {
        let list: PersistentList<i32> = (1..=3).collect();
        assert_eq!(format!("{list:?}"), "[1, 2, 3]");
        assert_eq!(format!("{list}"), "[1, 2, 3]");
        assert_eq!(format!("{}", PersistentList::<i32>::new()), "[]");
    }

    #[rstest]
    fn test_drop_long_list() {
        let list: PersistentList<u32> = (0..1_000_000).collect();
        drop(list);

        let mut pushed = PersistentList::new();
        for index in 0..1_000_000_u32 {
            pushed = pushed.push_front(index);
        }
        drop(pushed);
    }

    #[rstest]
    fn test_drop_keeps_shared_suffix() {
        let shared: PersistentList<u32> = (0..1_000_000).collect();
        let mut extended = shared.clone();
        for index in 0..1_000_u32 {
            extended = extended.push_front(index);
        }

        drop(extended);
        assert_eq!(shared.front(), Some(&0));
        assert_eq!(shared.len(), 1_000_000);

        let tail = shared.pop_front();
        drop(shared);
        assert_eq!(tail.front(), Some(&1));
        assert_eq!(tail.len(), 999_999);
    }
}
