// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Semantic Space - concurrent co-occurrence vector spaces
//!
//! This crate builds word vectors from co-occurrence counts. Many worker
//! threads feed documents into a shared space; once the corpus is done the
//! space is finalized by a matrix transform.
//!
//! # Features
//!
//! - **Basis mapping**: Append-only feature -> dimension index shared by every vector
//! - **Dependency path acceptors**: Template tiers over Minipar relations plus a universal acceptor
//! - **Sparse accumulation**: Per-item count vectors with lock-free lazy creation
//! - **Transforms**: Whole-space reweighting or reduction after accumulation
//! - **Space builders**: Windowed word spaces and dependency-path spaces
//!
//! # Quick Start
//!
//! ```rust
//! use semantic_space::{IdentityTransform, SemanticSpace, SpaceConfig, WordSpace};
//!
//! let space = WordSpace::new(SpaceConfig::word_space()).unwrap();
//! space.process_tokens(&["the", "cat", "sat"]).unwrap();
//! space.process_space(&IdentityTransform).unwrap();
//!
//! let cat = space.vector("cat").unwrap();
//! assert_eq!(cat.len(), space.vector_length());
//! ```
//!
//! # Lifecycle
//!
//! A space accumulates until [`SemanticSpace::process_space`] runs. The
//! transform waits for in-flight accumulations, and any accumulation after
//! it fails with [`SpaceError::IllegalState`]. Clearing a space returns it to
//! accumulation while keeping its basis.

#![allow(clippy::cast_possible_truncation)] // Counts fit in f32 mantissa for realistic corpora
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)] // Error conditions are documented on SpaceError
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod acceptor;
pub mod basis;
pub mod config;
pub mod dependency_space;
pub mod error;
pub mod feature;
pub mod path;
pub mod space;
pub mod store;
pub mod transform;
pub mod vector;
pub mod word_space;

pub use acceptor::{
    AcceptorTier, PathAcceptor, TemplateAcceptor, TemplateTier, UniversalPathAcceptor, WILDCARD,
};
pub use basis::{BasisMapping, Describer};
pub use config::SpaceConfig;
pub use dependency_space::DependencySpace;
pub use error::{Result, SpaceError};
pub use feature::{PathFeature, WordPosition, WordRelation};
pub use path::{DependencyPath, DependencyTreeNode, PathBasis, EMPTY_TOKEN};
pub use space::SemanticSpace;
pub use store::VectorStore;
pub use transform::{
    FnTransform, IdentityTransform, Matrix, Transform, TransformChain, TransformRegistry,
};
pub use vector::{SpaceVector, SparseCounts};
pub use word_space::WordSpace;
