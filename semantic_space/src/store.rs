// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Concurrent per-item co-occurrence accumulation and the transform pipeline.
//!
//! Each vocabulary item owns one growable [`SparseCounts`] behind its own
//! `parking_lot::Mutex`, so accumulation on different items runs in parallel
//! and accumulation on the same item serializes only on that item. Vectors
//! are created lazily through the `DashMap` entry API, which installs exactly
//! one vector per item even when threads race on its first sighting.
//!
//! A store is in one of two phases. While accumulating, every `accumulate`
//! call holds the phase gate for reading. `transform` takes it for writing,
//! waits out in-flight accumulation, snapshots the counts into a [`Matrix`]
//! and replaces them with the transformed rows. From then on accumulation
//! fails with [`SpaceError::IllegalState`]; the transformed rows are final.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt::Display,
    hash::Hash,
    sync::Arc,
};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::{
    basis::BasisMapping,
    error::{Result, SpaceError},
    transform::{check_shape, Matrix, Transform},
    vector::{SparseCounts, SpaceVector},
};

type ItemVector = Arc<Mutex<SparseCounts>>;

/// Rows installed by the most recent transform.
#[derive(Debug)]
struct TransformedRows {
    items: Vec<String>,
    index: HashMap<String, usize>,
    matrix: Matrix,
}

impl TransformedRows {
    fn new(items: Vec<String>, matrix: Matrix) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(row, item)| (item.clone(), row))
            .collect();
        Self {
            items,
            index,
            matrix,
        }
    }

    fn row(&self, item: &str) -> Option<&[f32]> {
        self.index.get(item).map(|&row| self.matrix.row(row))
    }
}

#[derive(Debug)]
enum Phase {
    Accumulating,
    Transformed(TransformedRows),
}

/// Per-item sparse count vectors over a shared [`BasisMapping`].
pub struct VectorStore<K> {
    basis: Arc<BasisMapping<K>>,
    raw: DashMap<String, ItemVector>,
    phase: RwLock<Phase>,
    /// Items to retain; empty retains everything.
    semantic_filter: RwLock<HashSet<String>>,
}

impl<K> VectorStore<K>
where
    K: Hash + Eq + Clone + Display,
{
    #[must_use]
    pub fn new(basis: Arc<BasisMapping<K>>) -> Self {
        Self::with_capacity(basis, 0)
    }

    /// Create a store pre-sized for `capacity` vocabulary items.
    #[must_use]
    pub fn with_capacity(basis: Arc<BasisMapping<K>>, capacity: usize) -> Self {
        Self {
            basis,
            raw: DashMap::with_capacity(capacity),
            phase: RwLock::new(Phase::Accumulating),
            semantic_filter: RwLock::new(HashSet::new()),
        }
    }

    pub fn basis(&self) -> &Arc<BasisMapping<K>> {
        &self.basis
    }

    /// Add `delta` to `item`'s count for `feature`.
    ///
    /// Returns the updated count, or `None` when the item is outside the
    /// semantic filter or the basis is read-only and has never seen `feature`.
    ///
    /// # Errors
    ///
    /// [`SpaceError::NullArgument`] for an empty item key,
    /// [`SpaceError::IllegalState`] once the store has been transformed.
    pub fn accumulate(&self, item: &str, feature: &K, delta: i32) -> Result<Option<i32>> {
        if item.is_empty() {
            return Err(SpaceError::NullArgument("item key"));
        }

        let phase = self.phase.read();
        if matches!(*phase, Phase::Transformed(_)) {
            return Err(SpaceError::IllegalState(
                "cannot accumulate into a transformed space".to_string(),
            ));
        }
        if !self.retains(item) {
            return Ok(None);
        }
        let Some(dim) = self.basis.resolve(feature) else {
            return Ok(None);
        };

        let vector = self.vector_entry(item);
        let updated = vector.lock().add(dim, delta)?;
        drop(phase);
        Ok(Some(updated))
    }

    /// Get-or-insert the item's vector; the map guard is released on return.
    fn vector_entry(&self, item: &str) -> ItemVector {
        if let Some(existing) = self.raw.get(item) {
            return Arc::clone(&existing);
        }
        Arc::clone(&self.raw.entry(item.to_string()).or_default())
    }

    fn retains(&self, item: &str) -> bool {
        let filter = self.semantic_filter.read();
        filter.is_empty() || filter.contains(item)
    }

    /// The item's current vector.
    ///
    /// Before a transform this is a count vector sized to the basis at the
    /// time of the call; the space may still be growing, so later calls can
    /// return longer vectors. After a transform it is the item's row.
    pub fn vector_for(&self, item: &str) -> Option<SpaceVector> {
        match &*self.phase.read() {
            Phase::Transformed(rows) => rows.row(item).map(|row| SpaceVector::Real(row.to_vec())),
            Phase::Accumulating => {
                let size = self.basis.size();
                let vector = self.raw.get(item).map(|v| Arc::clone(&v))?;
                let counts = vector.lock().resized(size);
                Some(SpaceVector::Counts(counts))
            },
        }
    }

    /// Current vocabulary.
    pub fn items(&self) -> BTreeSet<String> {
        match &*self.phase.read() {
            Phase::Transformed(rows) => rows.items.iter().cloned().collect(),
            Phase::Accumulating => self.raw.iter().map(|e| e.key().clone()).collect(),
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        match &*self.phase.read() {
            Phase::Transformed(rows) => rows.index.contains_key(item),
            Phase::Accumulating => self.raw.contains_key(item),
        }
    }

    pub fn len(&self) -> usize {
        match &*self.phase.read() {
            Phase::Transformed(rows) => rows.items.len(),
            Phase::Accumulating => self.raw.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Basis size before a transform, transformed column count after.
    pub fn vector_length(&self) -> usize {
        match &*self.phase.read() {
            Phase::Transformed(rows) => rows.matrix.cols(),
            Phase::Accumulating => self.basis.size(),
        }
    }

    pub fn is_transformed(&self) -> bool {
        matches!(*self.phase.read(), Phase::Transformed(_))
    }

    /// Restrict which items keep vectors. An empty set retains everything.
    ///
    /// Only affects later accumulation.
    pub fn set_semantic_filter<I>(&self, items: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut filter = self.semantic_filter.write();
        filter.clear();
        filter.extend(items);
    }

    pub fn semantic_filter(&self) -> BTreeSet<String> {
        self.semantic_filter.read().iter().cloned().collect()
    }

    /// Drop all raw count vectors.
    ///
    /// The basis keeps every dimension it has assigned, so a rebuilt space
    /// shares dimension semantics with the previous one. A transformed store
    /// keeps its rows and stays read-only.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let phase = self.phase.write();
        let dropped = self.raw.len();
        self.raw.clear();
        let transformed = matches!(*phase, Phase::Transformed(_));
        debug!(dropped, transformed, dimensions = self.basis.size(), "cleared item vectors");
    }

    /// Replace every item's vector with its row of `transform(snapshot)`.
    ///
    /// The first call snapshots the raw counts, rows in item-key order and
    /// columns up to the current basis size, then drops them. Later calls
    /// re-transform the already transformed rows, so transforms chain.
    ///
    /// # Errors
    ///
    /// Whatever the transform returns, [`SpaceError::TransformShape`] if it
    /// changed the row count, or [`SpaceError::InvalidConfig`] if its data does
    /// not fill `rows * cols`. On error the store is left as it was.
    #[instrument(skip(self, transform), fields(transform = transform.name()))]
    pub fn transform(&self, transform: &dyn Transform) -> Result<()> {
        let mut phase = self.phase.write();

        let (items, input) = match &*phase {
            Phase::Accumulating => self.snapshot(),
            Phase::Transformed(rows) => (rows.items.clone(), rows.matrix.clone()),
        };

        let output = transform.transform(&input)?;
        check_shape(input.rows(), &output)?;
        if output.cols() > input.cols() {
            warn!(
                input_cols = input.cols(),
                output_cols = output.cols(),
                "transform widened the space"
            );
        }

        self.raw.clear();
        let (rows, cols) = (output.rows(), output.cols());
        *phase = Phase::Transformed(TransformedRows::new(items, output));
        info!(rows, cols, "space transformed");
        Ok(())
    }

    /// Counts as a dense matrix, one row per item in key order.
    #[allow(clippy::cast_precision_loss)]
    fn snapshot(&self) -> (Vec<String>, Matrix) {
        let cols = self.basis.size();
        let mut entries: Vec<(String, ItemVector)> = self
            .raw
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut matrix = Matrix::zeros(entries.len(), cols);
        for (row, (_, vector)) in entries.iter().enumerate() {
            for (col, count) in vector.lock().iter() {
                if col < cols {
                    matrix.set(row, col, count as f32);
                }
            }
        }
        let items = entries.into_iter().map(|(item, _)| item).collect();
        (items, matrix)
    }
}

impl<K> std::fmt::Debug for VectorStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("basis", &self.basis)
            .field("raw_items", &self.raw.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use super::*;
    use crate::transform::{FnTransform, IdentityTransform};

    fn store() -> VectorStore<String> {
        VectorStore::new(Arc::new(BasisMapping::new()))
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_accumulate_creates_lazily() {
        let s = store();
        assert!(s.vector_for("cat").is_none());
        assert_eq!(s.accumulate("cat", &key("purr"), 2).unwrap(), Some(2));
        assert_eq!(s.accumulate("cat", &key("purr"), 1).unwrap(), Some(3));
        assert_eq!(s.accumulate("cat", &key("meow"), 1).unwrap(), Some(1));

        let v = s.vector_for("cat").unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v.get(0), 3.0);
        assert_eq!(v.get(1), 1.0);
        assert_eq!(s.items().into_iter().collect::<Vec<_>>(), vec!["cat"]);
    }

    #[test]
    fn test_vector_length_tracks_basis() {
        let s = store();
        s.accumulate("a", &key("x"), 1).unwrap();
        assert_eq!(s.vector_for("a").unwrap().len(), 1);

        s.accumulate("b", &key("y"), 1).unwrap();
        s.accumulate("b", &key("z"), 1).unwrap();
        // "a" never saw y or z but its view grows with the space
        assert_eq!(s.vector_for("a").unwrap().len(), 3);
        assert_eq!(s.vector_length(), 3);
    }

    #[test]
    fn test_empty_item_rejected() {
        let s = store();
        assert_eq!(
            s.accumulate("", &key("x"), 1).unwrap_err(),
            SpaceError::NullArgument("item key")
        );
    }

    #[test]
    fn test_semantic_filter() {
        let s = store();
        s.set_semantic_filter(vec!["keep".to_string()]);
        assert_eq!(s.accumulate("drop", &key("x"), 1).unwrap(), None);
        assert_eq!(s.accumulate("keep", &key("x"), 1).unwrap(), Some(1));
        assert_eq!(s.len(), 1);
        assert!(s.contains("keep"));
        assert!(!s.contains("drop"));
        assert_eq!(s.semantic_filter().len(), 1);

        s.set_semantic_filter(Vec::new());
        assert_eq!(s.accumulate("drop", &key("x"), 1).unwrap(), Some(1));
    }

    #[test]
    fn test_read_only_basis_skips_unseen_features() {
        let s = store();
        s.accumulate("a", &key("known"), 1).unwrap();
        s.basis().set_read_only(true);

        assert_eq!(s.accumulate("a", &key("unknown"), 1).unwrap(), None);
        assert_eq!(s.accumulate("a", &key("known"), 1).unwrap(), Some(2));
        assert_eq!(s.basis().size(), 1);
    }

    #[test]
    fn test_exact_counts_under_contention() {
        let s = Arc::new(store());
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = vec![];

        for _ in 0..8 {
            let s = Arc::clone(&s);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                for _ in 0..250 {
                    for delta in [1, 1, -1, 2] {
                        s.accumulate("hot", &key("f"), delta).unwrap();
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let v = s.vector_for("hot").unwrap();
        assert_eq!(v.get(0), (8 * 250 * 3) as f32);
    }

    #[test]
    fn test_racing_first_sighting_installs_one_vector() {
        for round in 0..20 {
            let s = Arc::new(store());
            let barrier = Arc::new(Barrier::new(8));
            let item = format!("new{round}");
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let s = Arc::clone(&s);
                    let barrier = Arc::clone(&barrier);
                    let item = item.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        s.accumulate(&item, &key("f"), 1).unwrap();
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert_eq!(s.len(), 1);
            assert_eq!(s.vector_for(&item).unwrap().get(0), 8.0);
        }
    }

    #[test]
    fn test_parallel_distinct_items() {
        let s = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let s = Arc::clone(&s);
                thread::spawn(move || {
                    for i in 0..100 {
                        s.accumulate(&format!("item{t}"), &format!("f{i}"), 1)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(s.len(), 8);
        assert_eq!(s.basis().size(), 100);
        for t in 0..8 {
            let counts = s.vector_for(&format!("item{t}")).unwrap();
            assert_eq!(counts.as_counts().unwrap().nnz(), 100);
        }
    }

    #[test]
    fn test_identity_transform_round_trip() {
        let s = store();
        s.accumulate("b", &key("x"), 2).unwrap();
        s.accumulate("a", &key("y"), 5).unwrap();
        s.accumulate("a", &key("x"), 1).unwrap();
        let before_a = s.vector_for("a").unwrap().to_dense();
        let before_b = s.vector_for("b").unwrap().to_dense();

        s.transform(&IdentityTransform).unwrap();

        assert!(s.is_transformed());
        let after_a = s.vector_for("a").unwrap();
        assert!(after_a.is_transformed());
        assert_eq!(after_a.to_dense(), before_a);
        assert_eq!(s.vector_for("b").unwrap().to_dense(), before_b);
        assert_eq!(s.len(), 2);

        let err = s.accumulate("a", &key("x"), 1).unwrap_err();
        assert!(matches!(err, SpaceError::IllegalState(_)));
    }

    #[test]
    fn test_snapshot_rows_in_key_order() {
        let s = store();
        s.accumulate("zebra", &key("x"), 1).unwrap();
        s.accumulate("apple", &key("x"), 2).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let recorder = FnTransform::new("recorder", move |m: &Matrix| {
            record.lock().extend_from_slice(m.data());
            Ok(m.clone())
        });
        s.transform(&recorder).unwrap();
        assert_eq!(*seen.lock(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_chained_transforms() {
        let s = store();
        s.accumulate("a", &key("x"), 1).unwrap();
        s.accumulate("a", &key("y"), 3).unwrap();

        let double = FnTransform::new("double", |m: &Matrix| {
            let data = m.data().iter().map(|v| v * 2.0).collect();
            Matrix::new(data, m.rows(), m.cols())
        });
        let last_column = FnTransform::new("last-column", |m: &Matrix| {
            let data = (0..m.rows()).map(|r| m.get(r, m.cols() - 1)).collect();
            Matrix::new(data, m.rows(), 1)
        });

        s.transform(&double).unwrap();
        s.transform(&last_column).unwrap();

        assert_eq!(s.vector_length(), 1);
        assert_eq!(s.vector_for("a").unwrap().to_dense(), vec![6.0]);
    }

    #[test]
    fn test_failed_transform_keeps_counts() {
        let s = store();
        s.accumulate("a", &key("x"), 4).unwrap();

        let broken = FnTransform::new("broken", |_m: &Matrix| Ok(Matrix::zeros(0, 1)));
        let err = s.transform(&broken).unwrap_err();
        assert_eq!(
            err,
            SpaceError::TransformShape {
                expected_rows: 1,
                got_rows: 0
            }
        );
        assert!(!s.is_transformed());
        assert_eq!(s.accumulate("a", &key("x"), 1).unwrap(), Some(5));
    }

    #[test]
    fn test_malformed_transform_output_rejected() {
        let s = store();
        s.accumulate("a", &key("x"), 4).unwrap();
        s.accumulate("a", &key("y"), 1).unwrap();

        // One value claiming a 1x4 shape
        let malformed = FnTransform::new("malformed", |_m: &Matrix| {
            serde_json::from_str::<Matrix>(r#"{"data":[1.0],"rows":1,"cols":4}"#)
                .map_err(|e| SpaceError::InvalidConfig(e.to_string()))
        });
        assert!(matches!(
            s.transform(&malformed).unwrap_err(),
            SpaceError::InvalidConfig(_)
        ));
        assert!(!s.is_transformed());
        assert_eq!(s.vector_for("a").unwrap().to_dense(), vec![4.0, 1.0]);
    }

    #[test]
    fn test_clear_keeps_basis() {
        let s = store();
        s.accumulate("a", &key("x"), 1).unwrap();
        s.accumulate("a", &key("y"), 1).unwrap();

        s.clear();
        assert!(s.items().is_empty());
        assert!(!s.is_transformed());
        assert_eq!(s.basis().dimension(&key("y")), 1);
        assert_eq!(s.basis().dimension(&key("x")), 0);

        // Rebuilding reuses the same dimensions
        s.accumulate("b", &key("y"), 7).unwrap();
        assert_eq!(s.vector_for("b").unwrap().get(1), 7.0);
        assert_eq!(s.vector_for("b").unwrap().get(0), 0.0);
    }

    #[test]
    fn test_clear_after_transform_stays_read_only() {
        let s = store();
        s.accumulate("a", &key("x"), 3).unwrap();
        s.transform(&IdentityTransform).unwrap();

        s.clear();
        assert!(s.is_transformed());
        assert_eq!(s.items().into_iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(s.vector_for("a").unwrap().to_dense(), vec![3.0]);

        let err = s.accumulate("b", &key("x"), 1).unwrap_err();
        assert!(matches!(err, SpaceError::IllegalState(_)));
        assert!(!s.contains("b"));
    }

    #[test]
    fn test_debug_format() {
        let s = store();
        assert!(format!("{s:?}").contains("VectorStore"));
    }
}
