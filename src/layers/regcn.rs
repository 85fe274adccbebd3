//! Relation-embedding-aware GCN layer.

use ndarray::{Array2, NdFloat};
use rand::Rng;
use tracing::debug;

use super::{add_aggregated, check_node, check_relation};
use crate::activation::Activation;
use crate::aggregation::{scatter_reduce, Reduce};
use crate::error::Result;
use crate::linear::Linear;
use crate::EdgeTriple;

/// GCN variant whose messages mix the source node embedding with the
/// embedding of the edge's relation: `fc_aggregate(x[src] + rel[r])`,
/// mean-reduced per destination, added onto the self-loop transform
/// `fc_self(x)`, then passed through the activation.
#[derive(Debug, Clone)]
pub struct RegcnLayer<F> {
    fc_self: Linear<F>,
    fc_aggregate: Linear<F>,
    activation: Activation,
}

impl<F: NdFloat> RegcnLayer<F> {
    pub fn new(
        input_dim: usize,
        output_dim: usize,
        bias: bool,
        activation: Activation,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            fc_self: Linear::new(input_dim, output_dim, bias, rng),
            fc_aggregate: Linear::new(input_dim, output_dim, bias, rng),
            activation,
        }
    }

    /// Build from explicit transforms (deterministic construction).
    pub fn from_parts(
        fc_self: Linear<F>,
        fc_aggregate: Linear<F>,
        activation: Activation,
    ) -> Self {
        Self {
            fc_self,
            fc_aggregate,
            activation,
        }
    }

    /// One message-passing step.
    ///
    /// `relations` holds one embedding row per relation, with the same
    /// width as the node embeddings.
    pub fn forward(
        &self,
        nodes: &Array2<F>,
        relations: &Array2<F>,
        edges: &[EdgeTriple],
    ) -> Result<Array2<F>> {
        let num_nodes = nodes.nrows();
        debug!(
            num_nodes,
            num_edges = edges.len(),
            "regcn forward"
        );

        let mut h = self.fc_self.forward(nodes)?;

        let mut raw = Array2::<F>::zeros((edges.len(), nodes.ncols()));
        let mut destinations = Vec::with_capacity(edges.len());
        for (i, &(src, rel, dst)) in edges.iter().enumerate() {
            check_node(src, num_nodes)?;
            check_relation(rel, relations.nrows())?;
            let mut row = raw.row_mut(i);
            row.assign(&(&nodes.row(src) + &relations.row(rel)));
            destinations.push(dst);
        }
        let messages = self.fc_aggregate.forward(&raw)?;

        let (unique, aggregated) =
            scatter_reduce(&messages, &destinations, num_nodes, Reduce::Mean)?;
        add_aggregated(&mut h, &unique, &aggregated);

        self.activation.apply(&mut h);
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn identity_layer(activation: Activation) -> RegcnLayer<f64> {
        let eye = array![[1.0, 0.0], [0.0, 1.0]];
        RegcnLayer::from_parts(
            Linear::from_weights(eye.clone(), None).unwrap(),
            Linear::from_weights(eye, None).unwrap(),
            activation,
        )
    }

    #[test]
    fn aggregates_mean_of_incoming_messages() {
        let layer = identity_layer(Activation::Relu);
        let nodes = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let relations = array![[0.5, 0.5]];
        // Two edges into node 2; mean of (x0 + r0) and (x1 + r0).
        let edges = [(0, 0, 2), (1, 0, 2)];
        let out = layer.forward(&nodes, &relations, &edges).unwrap();
        assert_relative_eq!(out[[2, 0]], 1.0 + 1.0);
        assert_relative_eq!(out[[2, 1]], 1.0 + 1.0);
    }

    #[test]
    fn isolated_node_keeps_only_self_loop() {
        let layer = identity_layer(Activation::Tanh);
        let nodes = array![[0.3, -0.2], [1.0, 1.0]];
        let relations = array![[1.0, 1.0]];
        let edges = [(0, 0, 1)];
        let out = layer.forward(&nodes, &relations, &edges).unwrap();
        // Node 0 has no incoming edges: output is tanh(fc_self(x0)).
        assert_relative_eq!(out[[0, 0]], 0.3_f64.tanh());
        assert_relative_eq!(out[[0, 1]], (-0.2_f64).tanh());
    }

    #[test]
    fn output_shape_is_nodes_by_output_dim() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let layer: RegcnLayer<f64> = RegcnLayer::new(5, 3, true, Activation::RRelu, &mut rng);
        let nodes = Array2::zeros((7, 5));
        let relations = Array2::zeros((2, 5));
        let edges = [(0, 1, 6), (3, 0, 2)];
        let out = layer.forward(&nodes, &relations, &edges).unwrap();
        assert_eq!(out.shape(), &[7, 3]);
    }

    #[test]
    fn bad_relation_index_is_rejected() {
        let layer = identity_layer(Activation::Relu);
        let nodes = array![[1.0, 0.0], [0.0, 1.0]];
        let relations = array![[0.0, 0.0]];
        let err = layer.forward(&nodes, &relations, &[(0, 3, 1)]).unwrap_err();
        assert_eq!(
            err,
            crate::LayerError::RelationIndexOutOfRange {
                index: 3,
                num_relations: 1
            }
        );
    }
}
