//! Error types for layer construction and forward passes.
//!
//! Bad configuration and malformed inputs fail loudly: an unknown
//! activation or composition mode, an edge referencing a node or
//! relation that does not exist, or a shape mismatch all surface as a
//! [`LayerError`] instead of silently corrupting the output.

use thiserror::Error;

/// Errors produced by layer constructors and forward passes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// Activation name not in the supported set.
    #[error("unknown activation '{0}', expected one of: relu, rrelu, sigmoid, tanh")]
    UnknownActivation(String),

    /// Composition mode name not in the supported set.
    #[error("unknown composition mode '{0}', expected one of: add, sub, mult")]
    UnknownComposition(String),

    /// An edge references a node outside the embedding matrix.
    #[error("node index {index} out of range for {num_nodes} nodes")]
    NodeIndexOutOfRange { index: usize, num_nodes: usize },

    /// An edge references a relation outside the relation vocabulary.
    #[error("relation index {index} out of range for {num_relations} relations")]
    RelationIndexOutOfRange { index: usize, num_relations: usize },

    /// Two tensors disagree on a dimension they must share.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A layer that consumes relation embeddings was called without them.
    #[error("layer requires relation embeddings but none were provided")]
    MissingRelationEmbeddings,

    /// Layer configuration is inconsistent (e.g. zero relations for a
    /// relation-weighted layer).
    #[error("invalid layer configuration: {0}")]
    InvalidConfig(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LayerError>;
