// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Feature keys: the units of context that become vector dimensions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A co-occurring word at a signed offset from the focus word.
///
/// Position 0 stands for "anywhere in the window" when word order is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordPosition {
    pub word: String,
    pub position: i32,
}

impl WordPosition {
    #[must_use]
    pub fn new(word: impl Into<String>, position: i32) -> Self {
        Self {
            word: word.into(),
            position,
        }
    }

    /// Position-free key, used when word order is ignored.
    #[must_use]
    pub fn unordered(word: impl Into<String>) -> Self {
        Self::new(word, 0)
    }
}

impl fmt::Display for WordPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.position == 0 {
            write!(f, "{}", self.word)
        } else {
            write!(f, "{}@{}", self.word, self.position)
        }
    }
}

/// A word reached through a labeled syntactic relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordRelation {
    pub word: String,
    pub relation: String,
}

impl WordRelation {
    #[must_use]
    pub fn new(word: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            relation: relation.into(),
        }
    }
}

impl fmt::Display for WordRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.relation, self.word)
    }
}

/// Feature produced from a dependency path, depending on the path basis in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathFeature {
    Word(String),
    Relation(WordRelation),
}

impl fmt::Display for PathFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "{word}"),
            Self::Relation(rel) => write!(f, "{rel}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_word_position_display() {
        assert_eq!(WordPosition::new("cat", -2).to_string(), "cat@-2");
        assert_eq!(WordPosition::new("cat", 1).to_string(), "cat@1");
        assert_eq!(WordPosition::unordered("cat").to_string(), "cat");
    }

    #[test]
    fn test_structural_equality() {
        let mut set = HashSet::new();
        set.insert(WordPosition::new("cat", 1));
        assert!(set.contains(&WordPosition::new("cat", 1)));
        assert!(!set.contains(&WordPosition::new("cat", -1)));
    }

    #[test]
    fn test_path_feature_display() {
        assert_eq!(PathFeature::Word("dog".into()).to_string(), "dog");
        assert_eq!(
            PathFeature::Relation(WordRelation::new("dog", "subj")).to_string(),
            "subj:dog"
        );
    }
}
