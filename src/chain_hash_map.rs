//! ChainHashMap: owning facade with entry-disposal hooks atop BucketMap.

use crate::bucket_map::{BucketMap, Handle};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

type Disposer<T> = Box<dyn FnMut(T)>;

/// A fixed-bucket hash map that owns its keys and values outright and runs
/// the configured disposal hooks exactly once for every key and value it
/// gives up — on overwrite, removal, `clear`, or drop. Entries handed back
/// to the caller via [`take`](ChainHashMap::take) or
/// [`replace`](ChainHashMap::replace) skip the hooks; ownership moves out
/// instead.
///
/// Iteration order is most-recent-insertion-first; overwriting a key keeps
/// its original position.
pub struct ChainHashMap<K, V, S = DefaultHashBuilder> {
    inner: BucketMap<K, V, S>,
    dispose_key: Option<Disposer<K>>,
    dispose_value: Option<Disposer<V>>,
}

impl<K, V> ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// `expected` guides bucket sizing; 0 selects a fixed default count.
    /// The bucket count never changes afterwards.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_hasher(expected, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(expected: usize, hasher: S) -> Self {
        Self {
            inner: BucketMap::with_capacity_and_hasher(expected, hasher),
            dispose_key: None,
            dispose_value: None,
        }
    }

    /// Insert or overwrite. A displaced pair is disposed; nothing is
    /// returned. Use [`replace`](Self::replace) to reclaim the old pair
    /// instead.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some((old_key, old_value)) = self.inner.insert(key, value) {
            self.dispose(old_key, old_value);
        }
    }

    /// Insert or overwrite, returning the displaced pair to the caller
    /// instead of disposing it.
    pub fn replace(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.inner.insert(key, value)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_mut(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.contains_key(q)
    }

    /// Look up the entry node for `q`. Populating an absent key is a
    /// separate `insert`; there is no implicit upsert.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.find(q)
    }

    /// Remove and dispose the entry for `q`. Returns whether it was present;
    /// absence is a no-op, not an error.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.inner.remove(q) {
            Some((key, value)) => {
                self.dispose(key, value);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `q` and hand the owned pair back to the caller,
    /// bypassing the disposal hooks.
    pub fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove(q)
    }
}

impl<K, V, S> ChainHashMap<K, V, S> {
    /// Install a hook that receives every key the map disposes of.
    pub fn key_disposer(mut self, hook: impl FnMut(K) + 'static) -> Self {
        self.dispose_key = Some(Box::new(hook));
        self
    }

    /// Install a hook that receives every value the map disposes of.
    pub fn value_disposer(mut self, hook: impl FnMut(V) + 'static) -> Self {
        self.dispose_value = Some(Box::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.inner.bucket_count()
    }

    /// Entries in most-recent-insertion-first order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter().map(|(_h, k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.inner.iter_mut().map(|(_h, k, v)| (k, v))
    }

    pub fn handle_key(&self, h: Handle) -> Option<&K> {
        h.key(&self.inner)
    }

    pub fn handle_value(&self, h: Handle) -> Option<&V> {
        h.value(&self.inner)
    }

    pub fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        h.value_mut(&mut self.inner)
    }

    /// Dispose every remaining entry and leave the map empty and reusable
    /// (the bucket array is retained).
    pub fn clear(&mut self) {
        while let Some((key, value)) = self.inner.pop_front() {
            self.dispose(key, value);
        }
    }

    // Key hook runs before the value hook; an absent hook falls back to Drop.
    fn dispose(&mut self, key: K, value: V) {
        match self.dispose_key.as_mut() {
            Some(hook) => hook(key),
            None => drop(key),
        }
        match self.dispose_value.as_mut() {
            Some(hook) => hook(value),
            None => drop(value),
        }
    }
}

impl<K, V, S> Drop for ChainHashMap<K, V, S> {
    fn drop(&mut self) {
        self.clear();
    }
}
