//! Unit tests for PersistentList.

use harkon::persistent::PersistentList;
use rstest::rstest;
use std::collections::HashSet;

fn list_of(elements: &[i32]) -> PersistentList<i32> {
    elements.iter().copied().collect()
}

fn to_vec(list: &PersistentList<i32>) -> Vec<i32> {
    list.iter().copied().collect()
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_new_creates_empty_list() {
    let list: PersistentList<i32> = PersistentList::new();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert_eq!(list.front(), None);
}

#[rstest]
fn test_singleton_creates_single_element_list() {
    let list = PersistentList::singleton(42);
    assert_eq!(list.len(), 1);
    assert_eq!(list.front(), Some(&42));
    assert!(list.pop_front().is_empty());
}

#[rstest]
fn test_push_front_chain_builds_list_in_reverse_order() {
    let list = PersistentList::new().push_front(3).push_front(2).push_front(1);
    assert_eq!(to_vec(&list), vec![1, 2, 3]);
}

#[rstest]
fn test_push_front_does_not_modify_original() {
    let original = list_of(&[2, 3]);
    let extended = original.push_front(1);

    assert_eq!(to_vec(&original), vec![2, 3]);
    assert_eq!(to_vec(&extended), vec![1, 2, 3]);
    assert!(extended.pop_front().ptr_eq(&original));
}

#[rstest]
fn test_from_iter_and_default() {
    assert_eq!(to_vec(&list_of(&[5, 6, 7])), vec![5, 6, 7]);
    assert!(PersistentList::<String>::default().is_empty());
}

// =============================================================================
// Deconstruction
// =============================================================================

#[rstest]
#[case(vec![1, 2, 3], vec![2, 3])]
#[case(vec![1], vec![])]
#[case(vec![], vec![])]
fn test_pop_front(#[case] input: Vec<i32>, #[case] expected: Vec<i32>) {
    assert_eq!(to_vec(&list_of(&input).pop_front()), expected);
}

#[rstest]
fn test_uncons_non_empty() {
    let list = list_of(&[1, 2, 3]);
    let (front, rest) = list.uncons().unwrap();
    assert_eq!(*front, 1);
    assert_eq!(to_vec(&rest), vec![2, 3]);
}

#[rstest]
fn test_uncons_empty() {
    assert!(PersistentList::<i32>::new().uncons().is_none());
}

// =============================================================================
// Iteration
// =============================================================================

#[rstest]
fn test_iter_sum() {
    assert_eq!(list_of(&[1, 2, 3, 4]).iter().sum::<i32>(), 10);
}

#[rstest]
fn test_into_iter_owned_and_borrowed() {
    let list: PersistentList<String> = ["a", "b"].iter().map(|s| (*s).to_string()).collect();

    let borrowed: Vec<&String> = (&list).into_iter().collect();
    assert_eq!(borrowed, vec!["a", "b"]);

    let owned: Vec<String> = list.into_iter().collect();
    assert_eq!(owned, vec!["a".to_string(), "b".to_string()]);
}

// =============================================================================
// Filter, append and reverse
// =============================================================================

#[rstest]
#[case(vec![1, 2, 3, 4, 5, 6], vec![1, 3, 5])]
#[case(vec![2, 4], vec![])]
#[case(vec![1, 3], vec![1, 3])]
#[case(vec![], vec![])]
fn test_filter_keeps_order(#[case] input: Vec<i32>, #[case] expected: Vec<i32>) {
    let filtered = list_of(&input).filter(|value| value % 2 != 0);
    assert_eq!(to_vec(&filtered), expected);
}

#[rstest]
fn test_filter_leaves_original_untouched() {
    let list = list_of(&[1, 2, 3]);
    let _filtered = list.filter(|value| *value != 2);
    assert_eq!(to_vec(&list), vec![1, 2, 3]);
}

#[rstest]
fn test_filter_shares_unfiltered_suffix() {
    let suffix = list_of(&[10, 11, 12]);
    let list = suffix.push_front(2).push_front(1);
    let filtered = list.filter(|value| *value != 2);

    assert_eq!(to_vec(&filtered), vec![1, 10, 11, 12]);
    assert!(filtered.pop_front().ptr_eq(&suffix));
}

#[rstest]
#[case(vec![1, 2], vec![3, 4], vec![1, 2, 3, 4])]
#[case(vec![], vec![3, 4], vec![3, 4])]
#[case(vec![1, 2], vec![], vec![1, 2])]
fn test_append(#[case] front: Vec<i32>, #[case] back: Vec<i32>, #[case] expected: Vec<i32>) {
    assert_eq!(to_vec(&list_of(&front).append(&list_of(&back))), expected);
}

#[rstest]
fn test_append_shares_other_as_tail() {
    let front = list_of(&[1, 2]);
    let back = list_of(&[3, 4]);
    let joined = front.append(&back);

    assert!(joined.pop_front().pop_front().ptr_eq(&back));
}

#[rstest]
fn test_reverse() {
    let list = list_of(&[1, 2, 3]);
    assert_eq!(to_vec(&list.reverse()), vec![3, 2, 1]);
    assert_eq!(list.reverse().reverse(), list);
    assert!(PersistentList::<i32>::new().reverse().is_empty());
}

// =============================================================================
// Standard traits
// =============================================================================

#[rstest]
fn test_equality_is_structural() {
    assert_eq!(list_of(&[1, 2, 3]), list_of(&[1, 2, 3]));
    assert_ne!(list_of(&[1, 2, 3]), list_of(&[1, 2]));
    assert_ne!(list_of(&[1, 2]), list_of(&[2, 1]));
}

#[rstest]
fn test_hash_distinguishes_contents() {
    let mut seen = HashSet::new();
    seen.insert(list_of(&[1, 2]));
    seen.insert(list_of(&[1, 2]));
    seen.insert(list_of(&[2, 1]));
    seen.insert(list_of(&[]));
    assert_eq!(seen.len(), 3);
}

#[rstest]
fn test_debug_and_display() {
    let list = list_of(&[1, 2, 3]);
    assert_eq!(format!("{list:?}"), "[1, 2, 3]");
    assert_eq!(format!("{list}"), "[1, 2, 3]");
    assert_eq!(format!("{}", PersistentList::<i32>::new()), "[]");
}
