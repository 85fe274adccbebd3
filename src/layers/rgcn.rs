//! Relational GCN with one full weight matrix per relation.

use ndarray::{Array2, Array3, Axis, NdFloat};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::debug;

use super::{add_aggregated, check_node, check_relation};
use crate::aggregation::{scatter_reduce, Reduce};
use crate::error::{LayerError, Result};
use crate::EdgeTriple;

/// Basis-free RGCN: each relation owns a `(input_dim, output_dim)`
/// weight matrix, messages are `x[src] . W[rel]` mean-reduced per
/// destination, and a separate self-loop matrix transforms every node.
/// No activation is applied; that is left to the caller.
#[derive(Debug, Clone)]
pub struct RgcnLayer<F> {
    /// Shape `(num_relations, input_dim, output_dim)`.
    weight: Array3<F>,
    self_loop_weight: Array2<F>,
}

impl<F: NdFloat> RgcnLayer<F> {
    /// Relation weights are Xavier-uniform with ReLU gain `sqrt(2)`;
    /// the self-loop matrix is Xavier-uniform with gain 1.
    pub fn new(
        input_dim: usize,
        output_dim: usize,
        num_relations: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let gain = 2.0_f64.sqrt();
        let bound = gain * (6.0 / (input_dim + output_dim) as f64).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        let weight = Array3::from_shape_fn((num_relations, input_dim, output_dim), |_| {
            crate::cast(dist.sample(rng))
        });

        let self_bound = (6.0 / (input_dim + output_dim) as f64).sqrt();
        let self_dist = Uniform::new_inclusive(-self_bound, self_bound);
        let self_loop_weight =
            Array2::from_shape_fn((input_dim, output_dim), |_| crate::cast(self_dist.sample(rng)));

        Self {
            weight,
            self_loop_weight,
        }
    }

    /// Build from explicit parameters (deterministic construction).
    pub fn from_weights(weight: Array3<F>, self_loop_weight: Array2<F>) -> Result<Self> {
        let (num_relations, input_dim, output_dim) = weight.dim();
        if num_relations == 0 {
            return Err(LayerError::InvalidConfig(
                "RGCN requires num_relations > 0".to_string(),
            ));
        }
        if self_loop_weight.dim() != (input_dim, output_dim) {
            return Err(LayerError::DimensionMismatch {
                what: "self-loop weight rows vs relation weight input dim",
                expected: input_dim,
                actual: self_loop_weight.nrows(),
            });
        }
        Ok(Self {
            weight,
            self_loop_weight,
        })
    }

    pub fn num_relations(&self) -> usize {
        self.weight.len_of(Axis(0))
    }

    pub fn input_dim(&self) -> usize {
        self.weight.len_of(Axis(1))
    }

    pub fn output_dim(&self) -> usize {
        self.weight.len_of(Axis(2))
    }

    /// One message-passing step.
    pub fn forward(&self, nodes: &Array2<F>, edges: &[EdgeTriple]) -> Result<Array2<F>> {
        let num_nodes = nodes.nrows();
        if nodes.ncols() != self.input_dim() {
            return Err(LayerError::DimensionMismatch {
                what: "node columns vs weight input dim",
                expected: self.input_dim(),
                actual: nodes.ncols(),
            });
        }
        debug!(
            num_nodes,
            num_edges = edges.len(),
            "rgcn forward"
        );

        let mut messages = Array2::<F>::zeros((edges.len(), self.output_dim()));
        let mut destinations = Vec::with_capacity(edges.len());
        for (i, &(src, rel, dst)) in edges.iter().enumerate() {
            check_node(src, num_nodes)?;
            check_relation(rel, self.num_relations())?;
            let msg = nodes.row(src).dot(&self.weight.index_axis(Axis(0), rel));
            messages.row_mut(i).assign(&msg);
            destinations.push(dst);
        }

        let (unique, aggregated) =
            scatter_reduce(&messages, &destinations, num_nodes, Reduce::Mean)?;

        let mut out = nodes.dot(&self.self_loop_weight);
        add_aggregated(&mut out, &unique, &aggregated);
        Ok(out)
    }
}
