//! Error types shared across the crate.
//!
//! Shape and pass-order violations are programming errors and surface as
//! [`NetworkError`]. Persistence problems are recoverable: callers usually
//! fall back to a fresh network (see [`crate::nn::load_or_init`]).

use thiserror::Error;

/// Errors raised by the network engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A vector did not have the width the network expects.
    #[error("shape mismatch for {what}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// `back_prop` was called without a preceding `feed_forward`.
    #[error("back_prop called without a preceding feed_forward")]
    BackPropWithoutForward,

    /// The requested topology cannot build a network.
    #[error("invalid topology {0:?}: need at least two widths, all non-zero")]
    InvalidTopology(Vec<usize>),
}

/// Errors raised while parsing persisted weights.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The source had no content.
    #[error("persisted network is empty")]
    Empty,

    /// The first line was not a generation counter.
    #[error("line 1: invalid generation counter {0:?}")]
    BadCounter(String),

    /// A weight could not be parsed as a float.
    #[error("line {line}: invalid weight {value:?}")]
    BadWeight { line: usize, value: String },

    /// A weight row did not match the width of its layer's first row.
    #[error("line {line}: expected {expected} weights, found {actual}")]
    RaggedLayer {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Consecutive layers do not chain.
    #[error("layer {layer} expects {expected} inputs but the previous layer has {actual} outputs")]
    BrokenChain {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    /// No complete layer was found.
    #[error("persisted network contains no layers")]
    NoLayers,

    /// Parsed weights did not form a valid network.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Underlying storage failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Errors raised by the training controller during a tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainerError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The sensor encoder and the network disagree on the input width.
    #[error("sensor vector has {actual} values but the network expects {expected}")]
    SensorWidth { expected: usize, actual: usize },
}

/// Result alias for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
