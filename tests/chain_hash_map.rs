// ChainHashMap integration test suite (consolidated).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Ownership: the map owns stored keys/values; disposal hooks run exactly
//   once per key and value the map gives up (overwrite, remove, clear,
//   drop), and never for pairs returned via take/replace.
// - Lookup: get/find report absence as a normal outcome; lookups rely on
//   the hasher agreeing with Eq (equal keys, equal hashes).
// - Ordering: full traversal is most-recent-insertion-first; overwrites
//   keep an entry's position; len always matches a full traversal.
// - Sizing: the bucket array is fixed at construction and lookups stay
//   correct far beyond the expected element count.
use chain_hashmap::{BuildDjb2, ChainHashMap};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// Test: the documented end-to-end scenario on a small, deterministic map.
// Assumes: with_capacity(4) selects 5 buckets; BuildDjb2 is stable.
// Verifies: overwrite keeps count, lookups see latest values, removal
// drops exactly one entry.
#[test]
fn small_map_scenario() {
    let mut m: ChainHashMap<String, i32, BuildDjb2> =
        ChainHashMap::with_capacity_and_hasher(4, BuildDjb2::default());
    assert_eq!(m.bucket_count(), 5);

    m.insert("a".to_string(), 1);
    m.insert("b".to_string(), 2);
    m.insert("a".to_string(), 3);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&3));
    assert_eq!(m.get("b"), Some(&2));
    assert_eq!(m.get("c"), None);

    assert!(m.remove("b"));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get("b"), None);
}

// Test: stored values are returned by reference, not copied.
// Assumes: get borrows the stored value in place.
// Verifies: the reference identity of the stored allocation survives
// lookup (Rc::ptr_eq).
#[test]
fn get_returns_the_stored_allocation() {
    let v = Rc::new(41);
    let mut m: ChainHashMap<String, Rc<i32>> = ChainHashMap::new();
    m.insert("k".to_string(), v.clone());
    let got = m.get("k").expect("present");
    assert!(Rc::ptr_eq(got, &v));
}

// Test: overwrite disposal accounting with distinct key allocations.
// Assumes: insert("a", v2) over an existing "a" displaces the old key
// and the old value.
// Verifies: the value hook sees exactly v1, the key hook sees exactly
// one discarded "a", and the surviving entry holds v2.
#[test]
fn overwrite_disposes_exactly_the_displaced_pair() {
    let keys: Rc<Cell<usize>> = Rc::new(Cell::new(0));
    let vals: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
    let (kc, vc) = (keys.clone(), vals.clone());
    let mut m: ChainHashMap<String, u64> = ChainHashMap::new()
        .key_disposer(move |k| {
            assert_eq!(k, "a");
            kc.set(kc.get() + 1);
        })
        .value_disposer(move |v| vc.borrow_mut().push(v));

    m.insert("a".to_string(), 1);
    m.insert("a".to_string(), 2);
    assert_eq!(keys.get(), 1);
    assert_eq!(*vals.borrow(), [1]);
    assert_eq!(m.get("a"), Some(&2));

    drop(m); // remaining entry ("a", 2) disposed on drop
    assert_eq!(keys.get(), 2);
    assert_eq!(*vals.borrow(), [1, 2]);
}

// Test: removal semantics for present and absent keys.
// Assumes: remove reports presence; absent removal is a no-op.
// Verifies: len drops by exactly one, later lookups miss, and no hook
// runs for the absent case.
#[test]
fn remove_present_then_absent() {
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let mut m: ChainHashMap<String, i32> =
        ChainHashMap::new().value_disposer(move |_| c.set(c.get() + 1));
    m.insert("x".to_string(), 1);
    m.insert("y".to_string(), 2);

    assert!(m.remove("x"));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get("x"), None);
    assert_eq!(calls.get(), 1);

    assert!(!m.remove("x"));
    assert_eq!(m.len(), 1);
    assert_eq!(calls.get(), 1);
}

// A build hasher that disagrees with itself: every hashing pass produces
// a different hash for the same key.
#[derive(Default)]
struct UnstableBuildHasher {
    next: Cell<u64>,
}
struct SeededHasher(u64);
impl BuildHasher for UnstableBuildHasher {
    type Hasher = SeededHasher;
    fn build_hasher(&self) -> SeededHasher {
        let seed = self.next.get();
        self.next.set(seed + 1);
        SeededHasher(seed)
    }
}
impl Hasher for SeededHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        self.0
    }
}

// Test: the equal-keys-equal-hashes contract is load-bearing.
// Assumes: bucket placement uses the hash of the moment; with 23 default
// buckets, consecutive seeds land in different buckets.
// Verifies: under an unstable hasher an inserted key is unfindable, while
// the same sequence under a stable hasher succeeds.
#[test]
fn inconsistent_hasher_breaks_lookup() {
    let mut bad: ChainHashMap<String, i32, UnstableBuildHasher> =
        ChainHashMap::with_capacity_and_hasher(0, UnstableBuildHasher::default());
    bad.insert("k".to_string(), 1); // hashed with seed 0
    assert_eq!(bad.get("k"), None); // hashed with seed 1: wrong bucket
    assert_eq!(bad.len(), 1, "the entry exists; only lookup is broken");

    let mut good: ChainHashMap<String, i32, BuildDjb2> =
        ChainHashMap::with_capacity_and_hasher(0, BuildDjb2::default());
    good.insert("k".to_string(), 1);
    assert_eq!(good.get("k"), Some(&1));
}

// Test: traversal completeness and count accuracy.
// Assumes: iter walks the order chain, most recent first.
// Verifies: after N distinct inserts (with overwrites mixed in), a full
// traversal visits exactly len() entries, each key once, and the visited
// set equals the inserted set.
#[test]
fn iteration_completeness_and_count() {
    let mut m: ChainHashMap<String, usize> = ChainHashMap::with_capacity(8);
    let names = ["ada", "bob", "cyd", "dee", "eve", "fox", "gus", "hal"];
    for (i, n) in names.iter().enumerate() {
        m.insert((*n).to_string(), i);
    }
    m.insert("cyd".to_string(), 99); // overwrite must not add or move

    let visited: Vec<String> = m.iter().map(|(k, _v)| k.clone()).collect();
    assert_eq!(visited.len(), m.len());
    let unique: BTreeSet<&String> = visited.iter().collect();
    assert_eq!(unique.len(), visited.len(), "each entry visited exactly once");
    let expected: BTreeSet<String> = names.iter().map(|n| (*n).to_string()).collect();
    assert_eq!(visited.iter().cloned().collect::<BTreeSet<_>>(), expected);

    // Most-recent-first, with "cyd" still in its original slot.
    let reversed: Vec<String> = names.iter().rev().map(|n| (*n).to_string()).collect();
    assert_eq!(visited, reversed);
}

// Test: scope-exit cleanup over many entries.
// Assumes: drop runs the clear path.
// Verifies: every remaining key and value is disposed exactly once —
// ids recorded by the hooks are duplicate-free and complete.
#[test]
fn drop_disposes_every_remaining_entry_once() {
    let seen: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    {
        let mut m: ChainHashMap<u32, u32> = ChainHashMap::with_capacity(4)
            .key_disposer(move |k| s.borrow_mut().push(k));
        for i in 0..50 {
            m.insert(i, i);
        }
        m.remove(&7);
        let _ = m.take(&13);
    }
    let mut ids = seen.borrow().clone();
    ids.sort_unstable();
    let expected: Vec<u32> = (0..50).filter(|i| *i != 13).collect(); // 7 disposed, 13 taken
    assert_eq!(ids, expected);
}

// Test: borrowed queries across the whole by-key surface.
// Assumes: K: Borrow<Q> lookups (String keys, &str queries).
// Verifies: get/get_mut/contains_key/find/remove/take all accept &str.
#[test]
fn borrowed_queries() {
    let mut m: ChainHashMap<String, i32> = ChainHashMap::new();
    m.insert("alpha".to_string(), 1);
    assert!(m.contains_key("alpha"));
    assert!(m.find("alpha").is_some());
    *m.get_mut("alpha").unwrap() += 1;
    assert_eq!(m.get("alpha"), Some(&2));
    assert_eq!(m.take("alpha"), Some(("alpha".to_string(), 2)));
    assert!(!m.remove("alpha"));
}
