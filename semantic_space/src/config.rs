// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Configuration for building a semantic space.

use serde::{Deserialize, Serialize};

use crate::{
    acceptor::AcceptorTier,
    error::{Result, SpaceError},
    path::PathBasis,
};

/// Default number of words considered on each side of a focus word.
pub const DEFAULT_WINDOW_SIZE: usize = 2;

/// Configuration for a semantic space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Words before and after each focus word that count as context.
    pub window_size: usize,

    /// Distinguish context words by their relative position.
    pub use_word_order: bool,

    /// Which dependency paths count as semantic relations.
    pub acceptor: AcceptorTier,

    /// How an accepted path becomes a feature.
    pub basis: PathBasis,

    /// Registered transform applied when the space is processed.
    pub transform: Option<String>,

    /// Only these items keep vectors; empty keeps every item.
    pub semantic_filter: Vec<String>,

    /// Expected vocabulary size, used to pre-size maps.
    pub initial_capacity: usize,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            use_word_order: false,
            acceptor: AcceptorTier::default(),
            basis: PathBasis::default(),
            transform: None,
            semantic_filter: Vec::new(),
            initial_capacity: 0,
        }
    }
}

impl SpaceConfig {
    /// Windowed co-occurrence space that keeps word order.
    pub fn word_space() -> Self {
        Self {
            use_word_order: true,
            ..Default::default()
        }
    }

    /// Dependency space over the medium template tier, relation-qualified features.
    pub fn dependency_space() -> Self {
        Self {
            acceptor: AcceptorTier::Medium,
            basis: PathBasis::Relation,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_transform(mut self, name: impl Into<String>) -> Self {
        self.transform = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SpaceError::InvalidConfig(
                "window_size must be at least 1".into(),
            ));
        }

        if self.transform.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(SpaceError::InvalidConfig(
                "transform name cannot be blank".into(),
            ));
        }

        if self.semantic_filter.iter().any(String::is_empty) {
            return Err(SpaceError::InvalidConfig(
                "semantic_filter cannot contain empty words".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpaceConfig::default();
        assert_eq!(config.window_size, 2);
        assert!(!config.use_word_order);
        assert_eq!(config.acceptor, AcceptorTier::Medium);
        assert_eq!(config.basis, PathBasis::Word);
        assert!(config.transform.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_presets() {
        assert!(SpaceConfig::word_space().use_word_order);
        assert_eq!(SpaceConfig::dependency_space().basis, PathBasis::Relation);
        let config = SpaceConfig::default()
            .with_window_size(5)
            .with_transform("identity");
        assert_eq!(config.window_size, 5);
        assert_eq!(config.transform.as_deref(), Some("identity"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SpaceConfig::default();
        config.window_size = 0;
        assert!(config.validate().is_err());

        config.window_size = 3;
        config.transform = Some("  ".into());
        assert!(config.validate().is_err());

        config.transform = None;
        config.semantic_filter = vec!["dog".into(), String::new()];
        assert!(config.validate().is_err());

        config.semantic_filter.pop();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialize() {
        let config = SpaceConfig::dependency_space().with_transform("identity");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"relation\""));
        assert!(json.contains("\"medium\""));
        let restored: SpaceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_config_partial_json() {
        let restored: SpaceConfig =
            serde_json::from_str(r#"{"window_size": 4, "acceptor": "maximum"}"#).unwrap();
        assert_eq!(restored.window_size, 4);
        assert_eq!(restored.acceptor, AcceptorTier::Maximum);
        assert!(!restored.use_word_order);
    }
}
