// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Dependency-path space.
//!
//! Each focus word is described by the paths that start at it. Paths the
//! acceptor rejects are dropped; accepted paths become one count on the
//! feature chosen by the configured [`PathBasis`].

use std::{collections::BTreeSet, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    acceptor::PathAcceptor,
    basis::BasisMapping,
    config::SpaceConfig,
    error::Result,
    feature::PathFeature,
    path::{DependencyPath, PathBasis},
    space::SemanticSpace,
    store::VectorStore,
    transform::Transform,
    vector::SpaceVector,
};

pub const DEPENDENCY_SPACE_NAME: &str = "dependency-vector-space";

pub struct DependencySpace {
    config: SpaceConfig,
    acceptor: Box<dyn PathAcceptor>,
    store: VectorStore<PathFeature>,
}

impl DependencySpace {
    /// Build with the acceptor tier named in `config`.
    pub fn new(config: SpaceConfig) -> Result<Self> {
        let acceptor = config.acceptor.build();
        Self::with_acceptor(config, acceptor)
    }

    /// Build with a caller-supplied acceptor. The configured tier is then
    /// only used for the space name.
    pub fn with_acceptor(config: SpaceConfig, acceptor: Box<dyn PathAcceptor>) -> Result<Self> {
        let name = format!("path-{}", config.basis.as_str());
        let basis = Arc::new(BasisMapping::new().with_name(name));
        Self::with_parts(config, acceptor, basis)
    }

    /// Build over an existing basis, e.g. a read-only one from a training run.
    pub fn with_parts(
        config: SpaceConfig,
        acceptor: Box<dyn PathAcceptor>,
        basis: Arc<BasisMapping<PathFeature>>,
    ) -> Result<Self> {
        config.validate()?;
        let store = VectorStore::with_capacity(basis, config.initial_capacity);
        store.set_semantic_filter(config.semantic_filter.iter().cloned());
        Ok(Self {
            config,
            acceptor,
            store,
        })
    }

    pub fn store(&self) -> &VectorStore<PathFeature> {
        &self.store
    }

    pub fn path_basis(&self) -> PathBasis {
        self.config.basis
    }

    /// Longest path, in nodes, worth extracting for this space.
    pub fn max_path_length(&self) -> usize {
        self.acceptor.max_path_length()
    }

    /// Count the accepted `paths` on `focus`'s vector.
    ///
    /// Returns the number of paths that produced a count.
    pub fn process_paths<'a, I>(&self, focus: &str, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a DependencyPath>,
    {
        let mut recorded = 0;
        let mut rejected = 0;
        for path in paths {
            if !self.acceptor.accepts(path) {
                rejected += 1;
                continue;
            }
            let feature = self.config.basis.feature(path);
            if self.store.accumulate(focus, &feature, 1)?.is_some() {
                recorded += 1;
            }
        }
        if rejected > 0 {
            debug!(focus, recorded, rejected, "paths processed");
        }
        Ok(recorded)
    }

    /// Process `(focus, paths)` pairs in parallel.
    #[instrument(skip(self, batch), fields(focus_words = batch.len()))]
    pub fn process_batch(&self, batch: &[(String, Vec<DependencyPath>)]) -> Result<usize> {
        batch
            .par_iter()
            .map(|(focus, paths)| self.process_paths(focus, paths))
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }

    pub fn clear_semantics(&self) {
        self.store.clear();
    }
}

impl SemanticSpace for DependencySpace {
    fn config(&self) -> &SpaceConfig {
        &self.config
    }

    fn words(&self) -> BTreeSet<String> {
        self.store.items()
    }

    fn vector(&self, word: &str) -> Option<SpaceVector> {
        self.store.vector_for(word)
    }

    fn vector_length(&self) -> usize {
        self.store.vector_length()
    }

    fn space_name(&self) -> String {
        format!(
            "{DEPENDENCY_SPACE_NAME}-{}-{}",
            self.config.acceptor,
            self.config.basis.as_str()
        )
    }

    fn dimension_description(&self, dimension: usize) -> Result<String> {
        self.store.basis().description(dimension)
    }

    fn process_space(&self, transform: &dyn Transform) -> Result<()> {
        self.store.transform(transform)
    }
}

impl std::fmt::Debug for DependencySpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencySpace")
            .field("name", &self.space_name())
            .field("max_path_length", &self.max_path_length())
            .field("store", &self.store)
            .finish()
    }
}
