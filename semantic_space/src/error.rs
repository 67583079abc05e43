// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpaceError {
    #[error("dimension {index} out of range: basis has {size} dimensions")]
    OutOfRange { index: usize, size: usize },

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("required argument missing: {0}")]
    NullArgument(&'static str),

    #[error("transform changed row count: expected {expected_rows}, got {got_rows}")]
    TransformShape {
        expected_rows: usize,
        got_rows: usize,
    },

    #[error("unknown transform: {0}")]
    UnknownTransform(String),

    #[error("unknown acceptor tier: {0}")]
    UnknownTier(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SpaceError>;
