// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Dependency paths: chains of tagged words linked by labeled relations.

use serde::{Deserialize, Serialize};

use crate::feature::{PathFeature, WordRelation};

/// Word that marks a token removed by upstream filtering.
pub const EMPTY_TOKEN: &str = "";

/// One word of a parsed sentence with its part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyTreeNode {
    pub word: String,
    pub pos: String,
}

impl DependencyTreeNode {
    #[must_use]
    pub fn new(word: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            pos: pos.into(),
        }
    }

    /// A node whose token was filtered out upstream.
    #[must_use]
    pub fn filtered(pos: impl Into<String>) -> Self {
        Self::new(EMPTY_TOKEN, pos)
    }

    #[inline]
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.word == EMPTY_TOKEN
    }
}

/// An ordered walk through a dependency tree.
///
/// Holds `length() + 1` nodes; `relation(i)` labels the edge between
/// `node(i)` and `node(i + 1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyPath {
    nodes: Vec<DependencyTreeNode>,
    relations: Vec<String>,
}

impl DependencyPath {
    /// Start a path at `head` with no relations yet.
    #[must_use]
    pub fn new(head: DependencyTreeNode) -> Self {
        Self {
            nodes: vec![head],
            relations: Vec::new(),
        }
    }

    /// Extend the path by one relation to `node`.
    #[must_use]
    pub fn then(mut self, relation: impl Into<String>, node: DependencyTreeNode) -> Self {
        self.push(relation, node);
        self
    }

    pub fn push(&mut self, relation: impl Into<String>, node: DependencyTreeNode) {
        self.relations.push(relation.into());
        self.nodes.push(node);
    }

    /// Number of relations traversed.
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.relations.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> &DependencyTreeNode {
        &self.nodes[0]
    }

    #[must_use]
    pub fn last(&self) -> &DependencyTreeNode {
        &self.nodes[self.nodes.len() - 1]
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&DependencyTreeNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn relation(&self, index: usize) -> Option<&str> {
        self.relations.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn nodes(&self) -> &[DependencyTreeNode] {
        &self.nodes
    }

    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    #[must_use]
    pub fn has_filtered_node(&self) -> bool {
        self.nodes.iter().any(DependencyTreeNode::is_filtered)
    }
}

/// How an accepted path is turned into a feature key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathBasis {
    /// Last word only; "clock" via subj and via obj share a dimension.
    #[default]
    Word,
    /// Last word qualified by the relation that reached it.
    Relation,
}

impl PathBasis {
    #[must_use]
    pub fn feature(self, path: &DependencyPath) -> PathFeature {
        let last = path.last();
        match self {
            Self::Word => PathFeature::Word(last.word.clone()),
            Self::Relation => {
                let relation = path
                    .relations
                    .last()
                    .map_or_else(String::new, Clone::clone);
                PathFeature::Relation(WordRelation::new(last.word.clone(), relation))
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Relation => "relation",
        }
    }
}
