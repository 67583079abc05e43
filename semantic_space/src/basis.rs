// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Basis mapping: append-only assignment of vector dimensions to feature keys.
//!
//! A `BasisMapping` hands out dense dimension indices in first-seen order.
//! Once a key has an index it keeps it for the lifetime of the mapping; there
//! is no removal. The index of a key is its position in the description
//! vocabulary, which gives O(1) reverse lookups for reporting.
//!
//! # Thread Safety
//!
//! Hits are served from a `DashMap` read view without touching the create
//! lock. A miss takes the `parking_lot::RwLock` guarding the description
//! vocabulary for writing and re-checks the map before appending, so two
//! threads racing on the same unseen key always observe the same index.

use std::{
    fmt::{self, Display},
    hash::Hash,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use crate::error::{Result, SpaceError};

/// Produces the human-readable description stored for a new dimension.
pub type Describer<K> = Box<dyn Fn(&K) -> String + Send + Sync>;

/// Append-only mapping from feature keys to dimension indices.
///
/// # Performance
///
/// - `dimension` / `lookup` on an existing key: one sharded map read
/// - `dimension` on a new key: exclusive vocabulary lock, O(1) amortized append
/// - `description`: shared vocabulary lock, O(1)
/// - `size`: lock-free
pub struct BasisMapping<K> {
    /// Fast read view: key -> dimension.
    index: DashMap<K, usize, FxBuildHasher>,

    /// Description vocabulary; dimension = position in this vector.
    /// The write lock doubles as the create-path critical section.
    descriptions: RwLock<Vec<String>>,

    /// Published dimension count, bumped after a new key is fully visible.
    dimensions: AtomicUsize,

    /// When set, `resolve` stops creating dimensions.
    read_only: AtomicBool,

    describer: Option<Describer<K>>,
    name: String,
}

impl<K> BasisMapping<K>
where
    K: Hash + Eq + Clone + Display,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a mapping with room for `capacity` dimensions before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            descriptions: RwLock::new(Vec::with_capacity(capacity)),
            dimensions: AtomicUsize::new(0),
            read_only: AtomicBool::new(false),
            describer: None,
            name: "basis".to_string(),
        }
    }

    /// Replace the default `Display`-based description of new dimensions.
    ///
    /// Only affects dimensions created after the call.
    #[must_use]
    pub fn with_describer<F>(mut self, describer: F) -> Self
    where
        F: Fn(&K) -> String + Send + Sync + 'static,
    {
        self.describer = Some(Box::new(describer));
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the dimension for `key`, creating it if the key is unseen.
    ///
    /// New dimensions are numbered by the current size, so indices are dense
    /// and never reused. Creation ignores the read-only flag; use
    /// [`resolve`](Self::resolve) to honor it.
    pub fn dimension(&self, key: &K) -> usize {
        // Fast path: no lock on the vocabulary
        if let Some(dim) = self.index.get(key) {
            return *dim;
        }

        let mut descriptions = self.descriptions.write();

        // Double-check: another thread may have created it while we waited
        if let Some(dim) = self.index.get(key) {
            return *dim;
        }

        let dim = descriptions.len();
        descriptions.push(self.describe(key));
        self.index.insert(key.clone(), dim);
        self.dimensions.store(dim + 1, Ordering::Release);
        dim
    }

    /// Look up an existing dimension without creating one.
    #[inline]
    pub fn lookup(&self, key: &K) -> Option<usize> {
        self.index.get(key).map(|dim| *dim)
    }

    /// Dimension for `key`, creating it only while the mapping is writable.
    pub fn resolve(&self, key: &K) -> Option<usize> {
        if self.is_read_only() {
            self.lookup(key)
        } else {
            Some(self.dimension(key))
        }
    }

    /// Current number of dimensions. Never decreases.
    #[inline]
    pub fn size(&self) -> usize {
        self.dimensions.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Textual description of a dimension.
    ///
    /// # Errors
    ///
    /// [`SpaceError::OutOfRange`] when `index` is not below the current size.
    pub fn description(&self, index: usize) -> Result<String> {
        let descriptions = self.descriptions.read();
        descriptions
            .get(index)
            .cloned()
            .ok_or(SpaceError::OutOfRange {
                index,
                size: descriptions.len(),
            })
    }

    /// All descriptions in dimension order.
    pub fn descriptions(&self) -> Vec<String> {
        self.descriptions.read().clone()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Release);
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }

    fn describe(&self, key: &K) -> String {
        self.describer
            .as_ref()
            .map_or_else(|| key.to_string(), |describe| describe(key))
    }
}

impl<K> Default for BasisMapping<K>
where
    K: Hash + Eq + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for BasisMapping<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasisMapping")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions.load(Ordering::Relaxed))
            .field("read_only", &self.read_only.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<K> Display for BasisMapping<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]",
            self.name,
            self.dimensions.load(Ordering::Relaxed)
        )
    }
}
