//! Tests for keys whose digests cannot be told apart.
//!
//! The hash builders below force every key onto the same path through the
//! trie, so all bindings end up in collision buckets at the terminal level.
//! The maps must still behave exactly like a map with well-spread hashes.

use harkon::persistent::PersistentMap;
use rstest::rstest;
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, Hasher};

// =============================================================================
// Hash builder fixtures
// =============================================================================

/// Hashes every key to the same value.
#[derive(Debug, Clone, Copy, Default)]
struct ConstantHashBuilder;

struct ConstantHasher;

impl Hasher for ConstantHasher {
    fn finish(&self) -> u64 {
        0x0000_0000_5eed_cafe
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for ConstantHashBuilder {
    type Hasher = ConstantHasher;

    fn build_hasher(&self) -> Self::Hasher {
        ConstantHasher
    }
}

/// Keeps the low 30 bits of the digest fixed and lets only the top two bits
/// depend on the key.
#[derive(Debug, Clone, Copy, Default)]
struct LowBitsHashBuilder;

struct LowBitsHasher(DefaultHasher);

const SHARED_LOW_BITS: u64 = 0x1234_5678 & 0x3fff_ffff;

impl Hasher for LowBitsHasher {
    fn finish(&self) -> u64 {
        let spread = self.0.finish() & 0xc000_0000;
        spread | SHARED_LOW_BITS
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }
}

impl BuildHasher for LowBitsHashBuilder {
    type Hasher = LowBitsHasher;

    fn build_hasher(&self) -> Self::Hasher {
        LowBitsHasher(DefaultHasher::new())
    }
}

fn keys(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("symbol-{index}")).collect()
}

fn colliding<S>(count: usize) -> PersistentMap<String, usize, S>
where
    S: BuildHasher + Clone + Default,
{
    keys(count)
        .into_iter()
        .enumerate()
        .map(|(index, key)| (key, index))
        .collect()
}

// =============================================================================
// Constant digest
// =============================================================================

#[rstest]
#[case(2)]
#[case(33)]
#[case(100)]
fn test_constant_digest_finds_every_key(#[case] count: usize) {
    let map: PersistentMap<String, usize, ConstantHashBuilder> = colliding(count);

    for (index, key) in keys(count).iter().enumerate() {
        assert_eq!(map.find(key), Some(&index));
    }
    assert_eq!(map.find("symbol-missing"), None);
}

#[rstest]
fn test_constant_digest_matches_well_spread_map() {
    let count = 64;
    let colliding_map: PersistentMap<String, usize, ConstantHashBuilder> = colliding(count);
    let spread_map: PersistentMap<String, usize> = colliding(count);

    for key in keys(count + 10) {
        assert_eq!(colliding_map.find(&key), spread_map.find(&key));
    }
}

#[rstest]
fn test_constant_digest_shadowing() {
    let map: PersistentMap<String, usize, ConstantHashBuilder> = colliding(40);
    let shadowed = (0..5).fold(map.clone(), |acc, round| {
        acc.new_insert("symbol-7".to_string(), 1_000 + round)
    });

    assert_eq!(shadowed.find("symbol-7"), Some(&1_004));
    assert_eq!(shadowed.find("symbol-8"), Some(&8));
    assert_eq!(map.find("symbol-7"), Some(&7));
}

#[rstest]
fn test_constant_digest_merge_is_right_biased() {
    let all = keys(60);
    let left: PersistentMap<String, usize, ConstantHashBuilder> = all[..40]
        .iter()
        .map(|key| (key.clone(), 1))
        .collect();
    let right: PersistentMap<String, usize, ConstantHashBuilder> = all[20..]
        .iter()
        .map(|key| (key.clone(), 2))
        .collect();

    let merged = left.new_merge(&right);
    for (index, key) in all.iter().enumerate() {
        let expected = if index < 20 { 1 } else { 2 };
        assert_eq!(merged.find(key), Some(&expected), "key {key}");
    }

    let reversed = right.new_merge(&left);
    for (index, key) in all.iter().enumerate() {
        let expected = if index < 40 { 1 } else { 2 };
        assert_eq!(reversed.find(key), Some(&expected), "key {key}");
    }
}

#[rstest]
fn test_constant_digest_merge_with_single_binding() {
    let bucket: PersistentMap<String, usize, ConstantHashBuilder> = colliding(10);
    let single: PersistentMap<String, usize, ConstantHashBuilder> =
        PersistentMap::singleton("symbol-3".to_string(), 300);
    let fresh: PersistentMap<String, usize, ConstantHashBuilder> =
        PersistentMap::singleton("fresh".to_string(), 42);

    assert_eq!(bucket.new_merge(&single).find("symbol-3"), Some(&300));
    assert_eq!(single.new_merge(&bucket).find("symbol-3"), Some(&3));
    assert_eq!(bucket.new_merge(&fresh).find("fresh"), Some(&42));
    assert_eq!(fresh.new_merge(&bucket).find("fresh"), Some(&42));
    assert_eq!(fresh.new_merge(&bucket).find("symbol-9"), Some(&9));
}

// =============================================================================
// Shared low 30 bits
// =============================================================================

#[rstest]
fn test_shared_low_bits_finds_every_key() {
    let count = 50;
    let map: PersistentMap<String, usize, LowBitsHashBuilder> = colliding(count);

    for (index, key) in keys(count).iter().enumerate() {
        assert_eq!(map.find(key), Some(&index));
    }
    assert!(!map.contains_key("symbol-50"));
}

#[rstest]
fn test_shared_low_bits_merge_unions_keys() {
    let all = keys(80);
    let left: PersistentMap<String, usize, LowBitsHashBuilder> =
        all.iter().step_by(2).map(|key| (key.clone(), 0)).collect();
    let right: PersistentMap<String, usize, LowBitsHashBuilder> =
        all.iter().skip(1).step_by(2).map(|key| (key.clone(), 1)).collect();

    let merged = left.new_merge(&right);
    for (index, key) in all.iter().enumerate() {
        assert_eq!(merged.find(key), Some(&(index % 2)));
    }
}

#[rstest]
fn test_colliding_and_spread_keys_coexist() {
    let mut map: PersistentMap<String, usize, LowBitsHashBuilder> = colliding(10);
    let snapshot = map.clone();
    map.extend(keys(20).into_iter().skip(10).map(|key| (key, 0)));

    assert_eq!(map.find("symbol-3"), Some(&3));
    assert_eq!(map.find("symbol-15"), Some(&0));
    assert_eq!(snapshot.find("symbol-15"), None);
}
