//! BucketMap: structural layer with a fixed bucket array, an insertion-order
//! chain, and stable handles.

use crate::reentry::ReentryCheck;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{DefaultKey, SlotMap};

/// Prime bucket counts targeting a mean chain depth of about two at the
/// expected element count.
const BUCKET_SIZES: &[usize] = &[
    5, 11, 23, 47, 97, 199, 409, 823, 1741, 3469, 6949, 14033, 28411, 57557, 116731, 236897,
];

/// Bucket count used when the caller gives no element estimate.
const DEFAULT_BUCKET_COUNT: usize = 23;

fn bucket_count_for(expected: usize) -> usize {
    if expected == 0 {
        return DEFAULT_BUCKET_COUNT;
    }
    for &cnt in BUCKET_SIZES {
        if expected / 2 <= cnt {
            return cnt;
        }
    }
    *BUCKET_SIZES.last().unwrap()
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_key(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a BucketMap<K, V, S>) -> Option<&'a K> {
        map.handle_key(*self)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a BucketMap<K, V, S>) -> Option<&'a V> {
        map.handle_value(*self)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut BucketMap<K, V, S>) -> Option<&'a mut V> {
        map.handle_value_mut(*self)
    }
}

/// One stored entry. Linked into exactly one bucket chain (singly, via
/// `bucket_next`) and into the order chain (doubly, via `order_prev`/
/// `order_next`); both memberships are created together on insert and
/// severed together in `unlink`.
#[derive(Debug)]
struct Element<K, V> {
    key: K,
    value: V,
    hash: u64,
    bucket_next: Option<DefaultKey>,
    order_prev: Option<DefaultKey>,
    order_next: Option<DefaultKey>,
}

pub struct BucketMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    // Fixed for the life of the map; never grown or rehashed.
    buckets: Box<[Option<DefaultKey>]>,
    slots: SlotMap<DefaultKey, Element<K, V>>, // storage using generational keys
    // Most recently inserted element; overwrites do not move elements here.
    order_head: Option<DefaultKey>,
    reentry: ReentryCheck,
}

/// Outcome of a bucket-chain probe: the bucket index, the matching slot, and
/// its chain predecessor (needed for the singly linked unlink).
struct Probe {
    bucket: usize,
    prev: Option<DefaultKey>,
    slot: DefaultKey,
}

impl<K, V> BucketMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// `expected` guides bucket sizing; 0 selects a fixed default count.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_hasher(expected, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for BucketMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over immutable entries in order-chain order (most recently
/// inserted first).
pub struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Element<K, V>>,
    cursor: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let elem = &self.slots[slot];
        self.cursor = elem.order_next;
        Some((Handle::new(slot), &elem.key, &elem.value))
    }
}

/// Iterator over mutable entries in order-chain order.
pub struct IterMut<'a, K, V> {
    slots: &'a mut SlotMap<DefaultKey, Element<K, V>>,
    cursor: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Handle, &'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let elem = self.slots.get_mut(slot)?;
        self.cursor = elem.order_next;
        // The order chain is acyclic, so each slot is yielded at most once
        // and the reborrow below never aliases an earlier item.
        let elem = unsafe { &mut *(elem as *mut Element<K, V>) };
        Some((Handle::new(slot), &elem.key, &mut elem.value))
    }
}

impl<K, V, S> BucketMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(expected: usize, hasher: S) -> Self {
        Self {
            hasher,
            buckets: vec![None; bucket_count_for(expected)].into_boxed_slice(),
            slots: SlotMap::with_key(),
            order_head: None,
            reentry: ReentryCheck::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Scan the bucket chain for `q`, comparing stored hashes before keys.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Option<Probe>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let bucket = self.bucket_of(hash);
        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while let Some(slot) = cursor {
            let elem = &self.slots[slot];
            if elem.hash == hash && elem.key.borrow() == q {
                return Some(Probe { bucket, prev, slot });
            }
            prev = Some(slot);
            cursor = elem.bucket_next;
        }
        None
    }

    /// Insert or overwrite. On overwrite the element keeps its position in
    /// both chains and the displaced `(K, V)` pair is returned; on a fresh
    /// key the element is linked at the head of its bucket chain and of the
    /// order chain, and `None` is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let _pass = self.reentry.enter();
        let hash = self.make_hash(&key);
        if let Some(hit) = self.probe(hash, &key) {
            let elem = &mut self.slots[hit.slot];
            let old_key = mem::replace(&mut elem.key, key);
            let old_value = mem::replace(&mut elem.value, value);
            return Some((old_key, old_value));
        }
        let bucket = self.bucket_of(hash);
        let slot = self.slots.insert(Element {
            key,
            value,
            hash,
            bucket_next: self.buckets[bucket],
            order_prev: None,
            order_next: self.order_head,
        });
        self.buckets[bucket] = Some(slot);
        if let Some(head) = self.order_head {
            self.slots[head].order_prev = Some(slot);
        }
        self.order_head = Some(slot);
        None
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _pass = self.reentry.enter();
        let hash = self.make_hash(q);
        self.probe(hash, q).map(|hit| Handle::new(hit.slot))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.find(q)?;
        self.slots.get(handle.raw_key()).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.find(q)?;
        self.slots.get_mut(handle.raw_key()).map(|e| &mut e.value)
    }

    /// Remove by key, returning the owned pair. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hit = {
            let _pass = self.reentry.enter();
            let hash = self.make_hash(q);
            self.probe(hash, q)?
        };
        let elem = self.unlink(hit.bucket, hit.prev, hit.slot);
        Some((elem.key, elem.value))
    }
}

impl<K, V, S> BucketMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Chosen at construction and constant thereafter.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Remove by handle, using the element's stored hash; the key is not
    /// re-hashed or re-compared. Stale handles return `None`.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let elem = self.unlink_slot(handle.raw_key())?;
        Some((elem.key, elem.value))
    }

    /// Unlink and return the most recently inserted entry.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let target = self.order_head?;
        let elem = self
            .unlink_slot(target)
            .expect("order-chain head must be live and bucket-linked");
        Some((elem.key, elem.value))
    }

    /// Drop every element and empty all chains. The bucket array is retained,
    /// so the map is immediately reusable.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.buckets.fill(None);
        self.order_head = None;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.order_head,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            cursor: self.order_head,
            slots: &mut self.slots,
        }
    }

    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        self.slots.get(h.raw_key()).map(|e| &e.key)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        self.slots.get(h.raw_key()).map(|e| &e.value)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.slots.get_mut(h.raw_key()).map(|e| &mut e.value)
    }

    /// Locate `target`'s bucket-chain predecessor from its stored hash, then
    /// unlink it from both chains.
    fn unlink_slot(&mut self, target: DefaultKey) -> Option<Element<K, V>> {
        let hash = self.slots.get(target)?.hash;
        let bucket = self.bucket_of(hash);
        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while let Some(slot) = cursor {
            if slot == target {
                break;
            }
            prev = Some(slot);
            cursor = self.slots[slot].bucket_next;
        }
        cursor?;
        Some(self.unlink(bucket, prev, target))
    }

    /// Detach `target` from its bucket chain and from the order chain, then
    /// free its slot. Both linkages are severed before this returns, so no
    /// half-linked element is ever observable.
    fn unlink(
        &mut self,
        bucket: usize,
        bucket_prev: Option<DefaultKey>,
        target: DefaultKey,
    ) -> Element<K, V> {
        let elem = self
            .slots
            .remove(target)
            .expect("unlink target must be live");
        match bucket_prev {
            Some(prev) => self.slots[prev].bucket_next = elem.bucket_next,
            None => self.buckets[bucket] = elem.bucket_next,
        }
        match elem.order_prev {
            Some(prev) => self.slots[prev].order_next = elem.order_next,
            None => self.order_head = elem.order_next,
        }
        if let Some(next) = elem.order_next {
            self.slots[next].order_prev = elem.order_prev;
        }
        elem
    }
}
