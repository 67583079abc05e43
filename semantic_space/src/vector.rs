// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Sparse co-occurrence counts and the vectors handed out by a space.
//!
//! Zero counts are never stored. The `dimension` is the shell of the vector:
//! every position below it is valid, unstored positions read as zero. Raw
//! accumulation vectors grow their shell as higher dimensions are touched.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpaceError};

/// Highest dimension a sparse position can address.
const MAX_DIMENSION: usize = u32::MAX as usize;

/// Growable sparse integer vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SparseParts")]
pub struct SparseCounts {
    dimension: usize,
    /// Sorted, unique.
    positions: Vec<u32>,
    /// Parallel to `positions`, never zero.
    values: Vec<i32>,
}

impl SparseCounts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dimension: 0,
            positions: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, count)` pairs; duplicates are summed, zeros dropped.
    pub fn from_pairs(
        dimension: usize,
        pairs: impl IntoIterator<Item = (usize, i32)>,
    ) -> Result<Self> {
        let mut counts = Self::new();
        for (index, count) in pairs {
            counts.add(index, count)?;
        }
        counts.dimension = counts.dimension.max(dimension);
        Ok(counts)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.values.is_empty()
    }

    /// Count at `index`; zero outside the stored set, including beyond the shell.
    pub fn get(&self, index: usize) -> i32 {
        u32::try_from(index)
            .ok()
            .and_then(|idx| self.positions.binary_search(&idx).ok())
            .map_or(0, |i| self.values[i])
    }

    /// Add `delta` at `index`, growing the shell if needed. Returns the new count.
    ///
    /// A slot that reaches zero is removed.
    ///
    /// # Errors
    ///
    /// [`SpaceError::OutOfRange`] when `index` does not fit a `u32` position.
    pub fn add(&mut self, index: usize, delta: i32) -> Result<i32> {
        let idx = u32::try_from(index)
            .ok()
            .filter(|&idx| idx != u32::MAX)
            .ok_or(SpaceError::OutOfRange {
                index,
                size: MAX_DIMENSION,
            })?;
        self.dimension = self.dimension.max(index + 1);

        match self.positions.binary_search(&idx) {
            Ok(i) => {
                let updated = self.values[i].wrapping_add(delta);
                if updated == 0 {
                    self.positions.remove(i);
                    self.values.remove(i);
                } else {
                    self.values[i] = updated;
                }
                Ok(updated)
            },
            Err(i) => {
                if delta != 0 {
                    self.positions.insert(i, idx);
                    self.values.insert(i, delta);
                }
                Ok(delta)
            },
        }
    }

    /// Non-zero entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        self.positions
            .iter()
            .zip(&self.values)
            .map(|(&pos, &val)| (pos as usize, val))
    }

    /// Copy with its shell set to exactly `dimension`.
    ///
    /// Entries at or beyond `dimension` are dropped; a larger shell pads with zeros.
    #[must_use]
    pub fn resized(&self, dimension: usize) -> Self {
        let keep = self
            .positions
            .partition_point(|&pos| (pos as usize) < dimension);
        Self {
            dimension,
            positions: self.positions[..keep].to_vec(),
            values: self.values[..keep].to_vec(),
        }
    }

    /// Dense f32 realization of the shell.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dimension];
        for (pos, val) in self.iter() {
            dense[pos] = val as f32;
        }
        dense
    }
}

/// Wire form of [`SparseCounts`], checked before it becomes one.
#[derive(Deserialize)]
struct SparseParts {
    dimension: usize,
    positions: Vec<u32>,
    values: Vec<i32>,
}

impl TryFrom<SparseParts> for SparseCounts {
    type Error = SpaceError;

    fn try_from(parts: SparseParts) -> Result<Self> {
        let SparseParts {
            dimension,
            positions,
            values,
        } = parts;
        if positions.len() != values.len() {
            return Err(SpaceError::InvalidConfig(format!(
                "sparse vector has {} positions but {} values",
                positions.len(),
                values.len()
            )));
        }
        if !positions.windows(2).all(|w| w[0] < w[1]) {
            return Err(SpaceError::InvalidConfig(
                "sparse positions must be strictly increasing".into(),
            ));
        }
        if let Some(&last) = positions.last() {
            if last as usize >= dimension {
                return Err(SpaceError::OutOfRange {
                    index: last as usize,
                    size: dimension,
                });
            }
        }
        if values.contains(&0) {
            return Err(SpaceError::InvalidConfig(
                "sparse vector stores a zero count".into(),
            ));
        }
        Ok(Self {
            dimension,
            positions,
            values,
        })
    }
}

/// A vocabulary item's vector as seen by readers of a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpaceVector {
    /// Raw co-occurrence counts, before any transform.
    Counts(SparseCounts),
    /// Real-valued row produced by a transform.
    Real(Vec<f32>),
}

impl SpaceVector {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Counts(counts) => counts.dimension(),
            Self::Real(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` as f32; zero beyond the end.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get(&self, index: usize) -> f32 {
        match self {
            Self::Counts(counts) => {
                if index < counts.dimension() {
                    counts.get(index) as f32
                } else {
                    0.0
                }
            },
            Self::Real(values) => values.get(index).copied().unwrap_or(0.0),
        }
    }

    #[must_use]
    pub fn to_dense(&self) -> Vec<f32> {
        match self {
            Self::Counts(counts) => counts.to_dense(),
            Self::Real(values) => values.clone(),
        }
    }

    #[must_use]
    pub const fn is_transformed(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    #[must_use]
    pub const fn as_counts(&self) -> Option<&SparseCounts> {
        match self {
            Self::Counts(counts) => Some(counts),
            Self::Real(_) => None,
        }
    }
}
