//! Relational graph convolution layers for knowledge-graph embeddings.
//!
//! This crate provides message-passing layers that update node (and,
//! where applicable, relation) embeddings along typed edges of a
//! heterogeneous graph:
//!
//! - [`RegcnLayer`]: GCN with relation-embedding-aware messages
//! - [`WgcnLayer`]: GCN with a learnable scalar weight per relation
//! - [`GcnLayer`]: vanilla GCN with symmetric degree normalization
//! - [`CompGcnLayer`]: composition-based GCN with directional weights
//!   and a relation-embedding update
//! - [`RgcnLayer`]: relational GCN with one weight matrix per relation
//!
//! All layers share the same skeleton: compute one message per edge,
//! reduce messages per destination node with [`scatter_reduce`], add a
//! self-loop transform, and optionally apply a nonlinearity. The
//! [`RelationalLayer`] enum exposes the variants behind a single
//! `forward` interface for pipelines that select the architecture from
//! configuration.
//!
//! Layers are generic over the float type (`f32` or `f64` via
//! [`ndarray::NdFloat`]), so precision is a single explicit choice for
//! the whole pipeline. Forward passes are pure functions of their
//! inputs; training, autodiff, and batching belong to the caller.

use num_traits::NumCast;

pub mod activation;
pub mod aggregation;
pub mod composition;
pub mod error;
pub mod layers;
pub mod linear;

pub use activation::Activation;
pub use aggregation::{scatter_reduce, Reduce};
pub use composition::{compose, compose_rows, CompositionMode};
pub use error::{LayerError, Result};
pub use layers::{
    CompGcnLayer, ForwardInput, ForwardOutput, GcnLayer, LayerConfig, LayerKind, RegcnLayer,
    RelationalLayer, RgcnLayer, WgcnLayer,
};
pub use linear::Linear;

/// An edge of the graph: `(source_node, relation, destination_node)`.
pub type EdgeTriple = (usize, usize, usize);

/// Lossless-enough conversion from an `f64` constant into the tensor
/// float type. Infallible for `f32`/`f64`, which are the only types
/// satisfying [`ndarray::NdFloat`].
pub(crate) fn cast<F: NumCast>(v: f64) -> F {
    F::from(v).expect("f64 constant convertible to tensor float")
}

#[cfg(test)]
mod tests {
    use super::cast;

    #[test]
    fn cast_preserves_constants_at_both_precisions() {
        let slope = 0.229_166_666_666_666_67_f64;
        assert_eq!(cast::<f64>(slope), slope);
        assert_eq!(cast::<f32>(slope), slope as f32);
        assert_eq!(cast::<f32>(3.0), 3.0_f32);
    }
}
