//! chain-hashmap: a single-threaded hash map with a fixed bucket array,
//! insertion-ordered traversal, and entry-disposal hooks.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a map for registries and caches that (a) never rehashes — the
//!   bucket array is sized once, from the expected element count — and
//!   (b) makes ownership hand-off explicit: the map owns every key and
//!   value it stores and runs the configured disposal hooks exactly once
//!   for each one it gives up.
//! - Layers:
//!   - BucketMap<K, V, S>: structural map over a slotmap arena. Each
//!     element lives in one bucket chain (singly linked, scanned on
//!     lookup) and in the order chain (doubly linked, threading all live
//!     elements most-recent-insertion-first). A single unlink routine
//!     severs both memberships before returning. Stable generational
//!     `Handle`s give re-hash-free access to entries.
//!   - ChainHashMap<K, V, S>: public facade adding the disposal policy.
//!     `insert`/`remove`/`clear`/drop route displaced pairs through the
//!     optional key/value hooks; `take`/`replace` move ownership back to
//!     the caller instead.
//!   - djb2: a deterministic string hasher (`BuildDjb2`) for callers that
//!     want stable bucket placement.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (no atomics).
//! - Bucket count is fixed at construction; load factor degrades into
//!   longer chains rather than triggering a rehash.
//! - Each entry stores its `u64` hash once at insert; `K: Hash` is never
//!   re-invoked for a stored key, and indexing always uses the stored
//!   hash.
//! - Overwriting a key replaces key and value in place; the entry keeps
//!   its position in both chains.
//! - Iteration order is most-recent-insertion-first and stable between
//!   mutations; iterators borrow the map, so mutating during traversal is
//!   rejected at compile time.
//!
//! Reentrancy policy
//! - BucketMap runs user code only via `K: Eq`/`K: Hash` while probing.
//!   Entry points that open that window arm a debug-only reentry check;
//!   re-entering the map from inside a key's `Eq`/`Hash` impl panics in
//!   debug builds and is a no-op in release builds.
//! - ChainHashMap's hooks run only after the structure is consistent
//!   again, so disposal code may freely re-enter the map.
//!
//! Notes and non-goals
//! - No resizing, no rehashing, no serialization, no persistence.
//! - Duplicate keys cannot coexist; `insert` overwrites.
//! - Lookup misses are normal outcomes (`None`/`false`), never errors.
//! - Public API surface is `ChainHashMap`, its `Handle`, and the
//!   `bucket_map` structural layer for callers that want displaced pairs
//!   returned rather than disposed.

pub mod bucket_map;
mod bucket_map_proptest;
mod chain_hash_map;
pub mod djb2;
mod reentry;

// Public surface
pub use bucket_map::Handle;
pub use chain_hash_map::ChainHashMap;
pub use djb2::{BuildDjb2, Djb2Hasher};
pub use hashbrown::hash_map::DefaultHashBuilder;
