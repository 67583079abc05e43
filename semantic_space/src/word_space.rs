// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Windowed co-occurrence space.
//!
//! Every token within `window_size` positions of a focus token becomes one
//! count on the focus token's vector. With word order enabled the feature is
//! the context word at its signed offset; otherwise all offsets collapse to 0.

use std::{collections::BTreeSet, sync::Arc};

use rayon::prelude::*;
use tracing::instrument;

use crate::{
    basis::BasisMapping,
    config::SpaceConfig,
    error::Result,
    feature::WordPosition,
    path::EMPTY_TOKEN,
    space::SemanticSpace,
    store::VectorStore,
    transform::Transform,
    vector::SpaceVector,
};

pub const WORD_SPACE_NAME: &str = "generic-word-space";

#[derive(Debug)]
pub struct WordSpace {
    config: SpaceConfig,
    store: VectorStore<WordPosition>,
}

impl WordSpace {
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(config: SpaceConfig) -> Result<Self> {
        let basis = Arc::new(BasisMapping::new().with_name("word-position"));
        Self::with_basis(config, basis)
    }

    /// Build over an existing basis, e.g. one shared with another space.
    pub fn with_basis(config: SpaceConfig, basis: Arc<BasisMapping<WordPosition>>) -> Result<Self> {
        config.validate()?;
        let store = VectorStore::with_capacity(basis, config.initial_capacity);
        store.set_semantic_filter(config.semantic_filter.iter().cloned());
        Ok(Self { config, store })
    }

    pub fn store(&self) -> &VectorStore<WordPosition> {
        &self.store
    }

    fn feature(&self, word: &str, offset: i32) -> WordPosition {
        if self.config.use_word_order {
            WordPosition::new(word, offset)
        } else {
            WordPosition::unordered(word)
        }
    }

    /// Count every in-window co-occurrence of one tokenized document.
    ///
    /// Filtered tokens keep their position but are never counted, neither
    /// as focus nor as context. Returns the number of counts recorded.
    pub fn process_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<usize> {
        let window = self.config.window_size;
        let mut recorded = 0;

        for (i, focus) in tokens.iter().enumerate() {
            let focus = focus.as_ref();
            if focus == EMPTY_TOKEN {
                continue;
            }
            let start = i.saturating_sub(window);
            let end = i.saturating_add(window).min(tokens.len().saturating_sub(1));

            for (j, context) in tokens.iter().enumerate().take(end + 1).skip(start) {
                let context = context.as_ref();
                if j == i || context == EMPTY_TOKEN {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let offset = j as i32 - i as i32;
                if self
                    .store
                    .accumulate(focus, &self.feature(context, offset), 1)?
                    .is_some()
                {
                    recorded += 1;
                }
            }
        }
        Ok(recorded)
    }

    /// Add pre-counted `(context word, frequency)` pairs seen at `position`
    /// relative to `target`.
    pub fn process_context_counts<I, S>(
        &self,
        target: &str,
        position: i32,
        counts: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        let mut recorded = 0;
        for (word, frequency) in counts {
            let word = word.as_ref();
            if word == EMPTY_TOKEN {
                continue;
            }
            if self
                .store
                .accumulate(target, &self.feature(word, position), frequency)?
                .is_some()
            {
                recorded += 1;
            }
        }
        Ok(recorded)
    }

    /// Process many tokenized documents in parallel.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub fn process_documents<S>(&self, documents: &[Vec<S>]) -> Result<usize>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|doc| self.process_tokens(doc.as_slice()))
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }

    /// Drop all raw word vectors but keep the basis, so a new corpus shares
    /// dimension semantics with the previous one. Transformed vectors stay.
    pub fn clear_semantics(&self) {
        self.store.clear();
    }
}

impl SemanticSpace for WordSpace {
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
        let order = if self.config.use_word_order {
            "order"
        } else {
            "no-order"
        };
        format!("{WORD_SPACE_NAME}-w-{}-{order}", self.config.window_size)
    }

    fn dimension_description(&self, dimension: usize) -> Result<String> {
        self.store.basis().description(dimension)
    }

    fn process_space(&self, transform: &dyn Transform) -> Result<()> {
        self.store.transform(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::SpaceError,
        transform::{IdentityTransform, TransformRegistry},
    };

    fn ordered(window: usize) -> WordSpace {
        WordSpace::new(SpaceConfig::word_space().with_window_size(window)).unwrap()
    }

    fn count(space: &WordSpace, word: &str, feature: &WordPosition) -> f32 {
        let dim = space.store().basis().lookup(feature).unwrap();
        space.vector(word).unwrap().get(dim)
    }

    #[test]
    fn test_window_with_order() {
        let space = ordered(1);
        let recorded = space.process_tokens(&["the", "cat", "sat"]).unwrap();
        // the->cat, cat->the, cat->sat, sat->cat
        assert_eq!(recorded, 4);
        assert_eq!(count(&space, "cat", &WordPosition::new("the", -1)), 1.0);
        assert_eq!(count(&space, "cat", &WordPosition::new("sat", 1)), 1.0);
        assert!(space.store().basis().lookup(&WordPosition::new("sat", 2)).is_none());
        assert_eq!(space.words().len(), 3);
    }

    #[test]
    fn test_window_without_order() {
        let space = WordSpace::new(SpaceConfig::default()).unwrap();
        space.process_tokens(&["a", "b", "a"]).unwrap();
        // "b" sees "a" on both sides under one position-free dimension
        assert_eq!(count(&space, "b", &WordPosition::unordered("a")), 2.0);
        assert_eq!(space.vector_length(), 2);
    }

    #[test]
    fn test_filtered_tokens_hold_position() {
        let space = ordered(2);
        space.process_tokens(&["x", "", "y"]).unwrap();
        assert_eq!(count(&space, "x", &WordPosition::new("y", 2)), 1.0);
        assert!(!space.words().contains(""));
    }

    #[test]
    fn test_context_counts() {
        let space = ordered(2);
        let recorded = space
            .process_context_counts("dog", -1, vec![("big", 3), ("", 9), ("old", 2)])
            .unwrap();
        assert_eq!(recorded, 2);
        assert_eq!(count(&space, "dog", &WordPosition::new("big", -1)), 3.0);
        assert_eq!(space.dimension_description(1).unwrap(), "old@-1");
    }

    #[test]
    fn test_parallel_documents_match_sequential() {
        let docs: Vec<Vec<String>> = (0..32)
            .map(|d| {
                (0..20)
                    .map(|i| format!("w{}", (d * 7 + i * 3) % 11))
                    .collect()
            })
            .collect();

        let parallel = ordered(2);
        let sequential = ordered(2);
        let total = parallel.process_documents(&docs).unwrap();
        let mut expected = 0;
        for doc in &docs {
            expected += sequential.process_tokens(doc.as_slice()).unwrap();
        }
        assert_eq!(total, expected);

        for word in sequential.words() {
            let seq = sequential.vector(&word).unwrap();
            let par = parallel.vector(&word).unwrap();
            for (dim, value) in seq.as_counts().unwrap().iter() {
                let feature = sequential.dimension_description(dim).unwrap();
                let pdim = parallel
                    .store()
                    .basis()
                    .descriptions()
                    .iter()
                    .position(|d| *d == feature)
                    .unwrap();
                assert_eq!(par.get(pdim), value as f32);
            }
        }
    }

    #[test]
    fn test_space_name() {
        assert_eq!(ordered(3).space_name(), "generic-word-space-w-3-order");
        let unordered = WordSpace::new(SpaceConfig::default()).unwrap();
        assert_eq!(unordered.space_name(), "generic-word-space-w-2-no-order");
    }

    #[test]
    fn test_process_space_and_reject_after() {
        let space = ordered(1);
        space.process_tokens(&["a", "b"]).unwrap();
        space.process_space(&IdentityTransform).unwrap();
        assert!(space.vector("a").unwrap().is_transformed());

        let err = space.process_tokens(&["a", "b"]).unwrap_err();
        assert!(matches!(err, SpaceError::IllegalState(_)));

        space.clear_semantics();
        assert!(space.store().is_transformed());
        assert_eq!(space.words().len(), 2);
        assert!(space.vector("a").unwrap().is_transformed());
        let err = space.process_tokens(&["a", "b"]).unwrap_err();
        assert!(matches!(err, SpaceError::IllegalState(_)));
    }

    #[test]
    fn test_unbounded_window_covers_document() {
        let json = r#"{"window_size": 18446744073709551615, "use_word_order": true}"#;
        let config: SpaceConfig = serde_json::from_str(json).unwrap();
        let space = WordSpace::new(config).unwrap();
        // Every ordered pair of three tokens
        assert_eq!(space.process_tokens(&["a", "b", "c"]).unwrap(), 6);
        assert_eq!(count(&space, "a", &WordPosition::new("c", 2)), 1.0);
        assert_eq!(count(&space, "c", &WordPosition::new("a", -2)), 1.0);

        let space = WordSpace::new(SpaceConfig::word_space().with_window_size(usize::MAX)).unwrap();
        assert_eq!(space.process_tokens(&["x", "", "y"]).unwrap(), 2);
    }

    #[test]
    fn test_process_space_from_config() {
        let registry = TransformRegistry::new();

        let plain = ordered(1);
        plain.process_tokens(&["a", "b"]).unwrap();
        plain.process_space_from_config(&registry).unwrap();
        assert!(!plain.store().is_transformed());

        let configured =
            WordSpace::new(SpaceConfig::word_space().with_transform("identity")).unwrap();
        configured.process_tokens(&["a", "b"]).unwrap();
        configured.process_space_from_config(&registry).unwrap();
        assert!(configured.store().is_transformed());

        let unknown = WordSpace::new(SpaceConfig::word_space().with_transform("lsa")).unwrap();
        assert_eq!(
            unknown.process_space_from_config(&registry).unwrap_err(),
            SpaceError::UnknownTransform("lsa".into())
        );
    }

    #[test]
    fn test_semantic_filter_from_config() {
        let config = SpaceConfig {
            semantic_filter: vec!["cat".into()],
            ..SpaceConfig::word_space()
        };
        let space = WordSpace::new(config).unwrap();
        space.process_tokens(&["the", "cat", "sat"]).unwrap();
        assert_eq!(space.words().into_iter().collect::<Vec<_>>(), vec!["cat"]);
        // Context words still get dimensions
        assert_eq!(space.vector_length(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SpaceConfig::default().with_window_size(0);
        assert!(matches!(
            WordSpace::new(config).unwrap_err(),
            SpaceError::InvalidConfig(_)
        ));
    }
}
