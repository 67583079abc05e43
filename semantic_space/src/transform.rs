// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Matrix transforms applied when a space is finalized.
//!
//! A transform maps an `n x m` matrix to an `n x m'` matrix. It must keep the
//! row count (row `i` stays item `i`) and should be deterministic and free of
//! side effects. Column count is up to the transform; reductions shrink it.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpaceError};

/// A matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// # Errors
    ///
    /// [`SpaceError::InvalidConfig`] when `data` does not hold `rows * cols` values.
    pub fn new(data: Vec<f32>, rows: usize, cols: usize) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(SpaceError::InvalidConfig(format!(
                "matrix shape {rows}x{cols} does not match {} values",
                data.len()
            )));
        }
        Ok(Self { data, rows, cols })
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Stack rows, padding short ones with zeros to `cols`.
    ///
    /// Rows longer than `cols` are truncated.
    #[must_use]
    pub fn from_rows(rows: &[Vec<f32>], cols: usize) -> Self {
        let mut matrix = Self::zeros(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            let n = row.len().min(cols);
            matrix.data[i * cols..i * cols + n].copy_from_slice(&row[..n]);
        }
        matrix
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Wire form of [`Matrix`]; goes through [`Matrix::new`] on the way in.
#[derive(Deserialize)]
struct MatrixParts {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl TryFrom<MatrixParts> for Matrix {
    type Error = SpaceError;

    fn try_from(parts: MatrixParts) -> Result<Self> {
        Self::new(parts.data, parts.rows, parts.cols)
    }
}

/// Whole-matrix reweighting or reduction.
pub trait Transform: Send + Sync {
    /// Short name, used in logs and registry lookups.
    fn name(&self) -> &str;

    fn transform(&self, matrix: &Matrix) -> Result<Matrix>;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl Transform for IdentityTransform {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform(&self, matrix: &Matrix) -> Result<Matrix> {
        Ok(matrix.clone())
    }
}

/// Wraps a closure as a named transform.
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&Matrix) -> Result<Matrix> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&Matrix) -> Result<Matrix> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, matrix: &Matrix) -> Result<Matrix> {
        (self.func)(matrix)
    }
}

impl<F> fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Applies several transforms in order, feeding each the previous output.
#[derive(Clone, Default)]
pub struct TransformChain {
    name: String,
    stages: Vec<Arc<dyn Transform>>,
}

impl TransformChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, stage: Arc<dyn Transform>) -> Self {
        if !self.name.is_empty() {
            self.name.push('+');
        }
        self.name.push_str(stage.name());
        self.stages.push(stage);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Transform for TransformChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, matrix: &Matrix) -> Result<Matrix> {
        let mut current = matrix.clone();
        for stage in &self.stages {
            let next = stage.transform(&current)?;
            check_rows(current.rows(), &next)?;
            current = next;
        }
        Ok(current)
    }
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformChain")
            .field("name", &self.name)
            .field("stages", &self.stages.len())
            .finish()
    }
}

/// Row-count contract shared by the pipeline and chains.
pub(crate) fn check_rows(expected_rows: usize, output: &Matrix) -> Result<()> {
    if output.rows() == expected_rows {
        Ok(())
    } else {
        Err(SpaceError::TransformShape {
            expected_rows,
            got_rows: output.rows(),
        })
    }
}

/// Row count plus a data buffer that fills the declared shape.
pub(crate) fn check_shape(expected_rows: usize, output: &Matrix) -> Result<()> {
    check_rows(expected_rows, output)?;
    if output.rows.checked_mul(output.cols) == Some(output.data.len()) {
        Ok(())
    } else {
        Err(SpaceError::InvalidConfig(format!(
            "transform output {}x{} holds {} values",
            output.rows,
            output.cols,
            output.data.len()
        )))
    }
}

/// Name -> transform lookup for configuration-driven processing.
pub struct TransformRegistry {
    transforms: RwLock<HashMap<String, Arc<dyn Transform>>>,
}

impl TransformRegistry {
    /// Registry with only `identity` registered.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(IdentityTransform));
        registry
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            transforms: RwLock::new(HashMap::new()),
        }
    }

    /// Register under the transform's own name, replacing any previous entry.
    pub fn register(&self, transform: Arc<dyn Transform>) {
        let name = transform.name().to_string();
        self.transforms.write().insert(name, transform);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.read().get(name).cloned()
    }

    /// # Errors
    ///
    /// [`SpaceError::NullArgument`] for `None`, [`SpaceError::UnknownTransform`]
    /// for a name nothing was registered under.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn Transform>> {
        let name = name.ok_or(SpaceError::NullArgument("transform"))?;
        self.get(name)
            .ok_or_else(|| SpaceError::UnknownTransform(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transforms.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names())
            .finish()
    }
}
