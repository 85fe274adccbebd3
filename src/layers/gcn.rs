//! Vanilla GCN layer with symmetric degree normalization.

use ndarray::{Array1, Array2, NdFloat};
use rand::Rng;
use tracing::debug;

use super::{add_aggregated, check_node};
use crate::aggregation::{scatter_reduce, Reduce};
use crate::error::Result;
use crate::linear::Linear;
use crate::EdgeTriple;

/// Kipf-Welling GCN over the untyped graph: self-loops are folded into
/// the edge list, every message is scaled by
/// `deg(src)^{-1/2} * deg(dst)^{-1/2}`, messages are sum-reduced, and
/// the linear transform runs as the update step on the aggregate.
/// The relation column of each edge triple is ignored.
#[derive(Debug, Clone)]
pub struct GcnLayer<F> {
    lin: Linear<F>,
}

impl<F: NdFloat> GcnLayer<F> {
    pub fn new(input_dim: usize, output_dim: usize, bias: bool, rng: &mut impl Rng) -> Self {
        Self {
            lin: Linear::new(input_dim, output_dim, bias, rng),
        }
    }

    /// Build from an explicit transform (deterministic construction).
    pub fn from_parts(lin: Linear<F>) -> Self {
        Self { lin }
    }

    /// One message-passing step.
    pub fn forward(&self, nodes: &Array2<F>, edges: &[EdgeTriple]) -> Result<Array2<F>> {
        let num_nodes = nodes.nrows();
        debug!(
            num_nodes,
            num_edges = edges.len(),
            "gcn forward"
        );

        // Self-loop augmentation: every node aggregates itself too.
        let mut pairs = Vec::with_capacity(edges.len() + num_nodes);
        for &(src, _, dst) in edges {
            check_node(src, num_nodes)?;
            check_node(dst, num_nodes)?;
            pairs.push((src, dst));
        }
        pairs.extend((0..num_nodes).map(|i| (i, i)));

        // Unweighted source degree over the augmented list.
        let mut degree = Array1::<F>::zeros(num_nodes);
        for &(src, _) in &pairs {
            degree[src] = degree[src] + F::one();
        }
        // deg^{-1/2}, with the division-by-zero inf replaced by 0.
        let deg_inv_sqrt = degree.mapv(|d| {
            if d == F::zero() {
                F::zero()
            } else {
                F::one() / d.sqrt()
            }
        });

        let mut messages = Array2::<F>::zeros((pairs.len(), nodes.ncols()));
        let mut destinations = Vec::with_capacity(pairs.len());
        for (i, &(src, dst)) in pairs.iter().enumerate() {
            let norm = deg_inv_sqrt[src] * deg_inv_sqrt[dst];
            let mut row = messages.row_mut(i);
            row.assign(&(&nodes.row(src) * norm));
            destinations.push(dst);
        }

        let (unique, aggregated) =
            scatter_reduce(&messages, &destinations, num_nodes, Reduce::Sum)?;
        let mut propagated = Array2::<F>::zeros((num_nodes, nodes.ncols()));
        add_aggregated(&mut propagated, &unique, &aggregated);

        // Update step: the linear transform runs after aggregation.
        self.lin.forward(&propagated)
    }
}
