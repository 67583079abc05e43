// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Read and finalize surface shared by every space builder.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    config::SpaceConfig,
    error::Result,
    transform::{Transform, TransformRegistry},
    vector::SpaceVector,
};

/// A vocabulary of words, each mapped to a vector over a common set of dimensions.
pub trait SemanticSpace: Send + Sync {
    fn config(&self) -> &SpaceConfig;

    /// Words that currently have a vector.
    fn words(&self) -> BTreeSet<String>;

    fn vector(&self, word: &str) -> Option<SpaceVector>;

    /// Current dimensionality; may still grow while documents are processed.
    fn vector_length(&self) -> usize;

    fn space_name(&self) -> String;

    /// Human-readable meaning of a raw dimension.
    fn dimension_description(&self, dimension: usize) -> Result<String>;

    /// Finalize the space with `transform`. May be called again to chain.
    fn process_space(&self, transform: &dyn Transform) -> Result<()>;

    /// Apply the transform named in the configuration, if any.
    ///
    /// A space without a configured transform is left untouched.
    fn process_space_from_config(&self, registry: &TransformRegistry) -> Result<()> {
        let Some(name) = self.config().transform.as_deref() else {
            debug!(space = %self.space_name(), "no transform configured");
            return Ok(());
        };
        let transform = registry.resolve(Some(name))?;
        self.process_space(transform.as_ref())
    }
}
