#![cfg(test)]

// Property tests for BucketMap kept inside the crate so they do not
// require feature gates to access internal modules.

use crate::bucket_map::{BucketMap, Handle};
use core::hash::{BuildHasher, Hasher};
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    RemoveHandle(usize),
    Find(usize),
    Mutate(usize, i32),
    PopFront,
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveHandle),
            2 => idx.clone().prop_map(OpI::Find),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::PopFront),
            2 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine run against std::collections::HashMap plus an explicit
// most-recent-first order model. Invariants exercised across random
// operation sequences:
// - Overwrites keep len and order-chain position; fresh inserts prepend.
// - `find` parity with the model and handle stability for live entries.
// - `remove`/`remove_handle` return the owned `(K, V)` matching the model
//   and invalidate the handle; absent removals are no-ops.
// - `pop_front` unlinks exactly the order model's front entry.
// - `iter` yields the order model's exact key sequence with model values.
// - Stale handles never resolve; len/is_empty parity after each op.
fn run_scenario<S>(pool: Vec<String>, ops: Vec<OpI>, hasher: S) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut sut: BucketMap<Key, i32, S> = BucketMap::with_capacity_and_hasher(4, hasher);
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut order: Vec<Key> = Vec::new(); // most-recent-first
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let displaced = sut.insert(k.clone(), v);
                match displaced {
                    Some((dk, dv)) => {
                        prop_assert!(already, "displaced pair only on overwrite");
                        prop_assert_eq!(&dk, &k);
                        let mv = model.insert(k.clone(), v).expect("present in model");
                        prop_assert_eq!(dv, mv);
                        // Position in the order model is unchanged.
                    }
                    None => {
                        prop_assert!(!already, "fresh insert only for absent keys");
                        model.insert(k.clone(), v);
                        order.insert(0, k.clone());
                        let h = sut.find(k.0.as_str()).expect("inserted key must resolve");
                        let prev = live.insert(k, h);
                        prop_assert!(prev.is_none());
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                match sut.remove(k.0.as_str()) {
                    Some((kk, vv)) => {
                        prop_assert_eq!(&kk, &k);
                        let mv = model.remove(&k).expect("present in model");
                        prop_assert_eq!(vv, mv);
                        order.retain(|ok| ok != &k);
                        stale.push(live.remove(&k).expect("tracked live handle"));
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            OpI::RemoveHandle(i) => {
                let k = key_from(&pool, i);
                if let Some(&h) = live.get(&k) {
                    let (kk, vv) = sut.remove_handle(h).expect("handle valid for removal");
                    prop_assert_eq!(&kk, &k);
                    let mv = model.remove(&k).expect("present in model");
                    prop_assert_eq!(vv, mv);
                    order.retain(|ok| ok != &k);
                    let _ = live.remove(&k);
                    stale.push(h);
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(k.0.as_str());
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(h) = found {
                    let &lh = live.get(&k).expect("tracked live handle present");
                    prop_assert_eq!(h, lh, "handles must be stable for live entries");
                    prop_assert_eq!(h.value(&sut), model.get(&k));
                }
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                match sut.get_mut(k.0.as_str()) {
                    Some(vr) => {
                        *vr = vr.saturating_add(d);
                        let mv = model.get_mut(&k).expect("present in model");
                        *mv = mv.saturating_add(d);
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            OpI::PopFront => {
                let popped = sut.pop_front();
                match popped {
                    Some((kk, vv)) => {
                        let front = order.remove(0);
                        prop_assert_eq!(&kk, &front);
                        let mv = model.remove(&kk).expect("present in model");
                        prop_assert_eq!(vv, mv);
                        stale.push(live.remove(&kk).expect("tracked live handle"));
                    }
                    None => prop_assert!(order.is_empty()),
                }
            }
            OpI::Iterate => {
                let seq: Vec<Key> = sut.iter().map(|(_h, k, _v)| k.clone()).collect();
                prop_assert_eq!(&seq, &order, "traversal must follow the order chain");
                for (_h, k, v) in sut.iter() {
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                order.clear();
                stale.extend(live.drain().map(|(_k, h)| h));
            }
        }

        // Post-conditions after each op
        for &h in &stale {
            prop_assert!(h.value(&sut).is_none(), "stale handle must not resolve");
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(pool, ops, DefaultHashBuilder::default())?;
    }
}

// Collision variant using a constant hasher: every key shares one bucket
// chain, stressing chain scans and predecessor-tracked unlinks.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(pool, ops, ConstBuildHasher)?;
    }
}
