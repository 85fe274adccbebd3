//! GCN layer with one learnable scalar weight per relation.

use ndarray::{Array1, Array2, NdFloat};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::debug;

use super::{add_aggregated, check_node, check_relation};
use crate::activation::Activation;
use crate::aggregation::{scatter_reduce, Reduce};
use crate::error::{LayerError, Result};
use crate::linear::Linear;
use crate::EdgeTriple;

/// Weighted-relation GCN: each relation contributes a learnable scalar
/// that scales the source embedding before the shared linear transform.
/// Messages are sum-reduced per destination.
#[derive(Debug, Clone)]
pub struct WgcnLayer<F> {
    relation_weight: Array1<F>,
    fc: Linear<F>,
    activation: Activation,
}

impl<F: NdFloat> WgcnLayer<F> {
    /// Relation weights start uniform in `[0, 1)`.
    pub fn new(
        num_relations: usize,
        input_dim: usize,
        output_dim: usize,
        bias: bool,
        activation: Activation,
        rng: &mut impl Rng,
    ) -> Self {
        let dist = Uniform::new(0.0, 1.0);
        let relation_weight = Array1::from_shape_fn(num_relations, |_| crate::cast(dist.sample(rng)));
        Self {
            relation_weight,
            fc: Linear::new(input_dim, output_dim, bias, rng),
            activation,
        }
    }

    /// Build from explicit parameters (deterministic construction).
    pub fn from_parts(
        relation_weight: Array1<F>,
        fc: Linear<F>,
        activation: Activation,
    ) -> Result<Self> {
        if relation_weight.is_empty() {
            return Err(LayerError::InvalidConfig(
                "WGCN requires at least one relation weight".to_string(),
            ));
        }
        Ok(Self {
            relation_weight,
            fc,
            activation,
        })
    }

    pub fn num_relations(&self) -> usize {
        self.relation_weight.len()
    }

    /// One message-passing step.
    pub fn forward(&self, nodes: &Array2<F>, edges: &[EdgeTriple]) -> Result<Array2<F>> {
        let num_nodes = nodes.nrows();
        debug!(
            num_nodes,
            num_edges = edges.len(),
            "wgcn forward"
        );

        let mut h = self.fc.forward(nodes)?;

        let mut scaled = Array2::<F>::zeros((edges.len(), nodes.ncols()));
        let mut destinations = Vec::with_capacity(edges.len());
        for (i, &(src, rel, dst)) in edges.iter().enumerate() {
            check_node(src, num_nodes)?;
            check_relation(rel, self.relation_weight.len())?;
            let weight = self.relation_weight[rel];
            let mut row = scaled.row_mut(i);
            row.assign(&(&nodes.row(src) * weight));
            destinations.push(dst);
        }
        let messages = self.fc.forward(&scaled)?;

        let (unique, aggregated) =
            scatter_reduce(&messages, &destinations, num_nodes, Reduce::Sum)?;
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

    fn identity_layer(weights: Array1<f64>) -> WgcnLayer<f64> {
        let eye = array![[1.0, 0.0], [0.0, 1.0]];
        WgcnLayer::from_parts(
            weights,
            Linear::from_weights(eye, None).unwrap(),
            Activation::Relu,
        )
        .unwrap()
    }

    #[test]
    fn sums_scaled_incoming_messages() {
        let layer = identity_layer(array![2.0, 0.5]);
        let nodes = array![[1.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
        // Node 2 receives 2.0 * x0 and 0.5 * x1, summed.
        let edges = [(0, 0, 2), (1, 1, 2)];
        let out = layer.forward(&nodes, &edges).unwrap();
        assert_relative_eq!(out[[2, 0]], 2.0);
        assert_relative_eq!(out[[2, 1]], 1.0);
    }

    #[test]
    fn isolated_node_keeps_only_self_loop() {
        let layer = identity_layer(array![1.0]);
        let nodes = array![[0.7, 0.1], [1.0, 1.0]];
        let edges = [(0, 0, 1)];
        let out = layer.forward(&nodes, &edges).unwrap();
        assert_relative_eq!(out[[0, 0]], 0.7);
        assert_relative_eq!(out[[0, 1]], 0.1);
    }

    #[test]
    fn output_shape_is_nodes_by_output_dim() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let layer: WgcnLayer<f32> = WgcnLayer::new(3, 4, 6, false, Activation::Relu, &mut rng);
        assert_eq!(layer.num_relations(), 3);
        let nodes = Array2::zeros((5, 4));
        let edges = [(0, 2, 4), (1, 0, 0)];
        let out = layer.forward(&nodes, &edges).unwrap();
        assert_eq!(out.shape(), &[5, 6]);
    }

    #[test]
    fn bad_relation_index_is_rejected() {
        let layer = identity_layer(array![1.0]);
        let nodes = array![[1.0, 0.0], [0.0, 1.0]];
        let err = layer.forward(&nodes, &[(0, 2, 1)]).unwrap_err();
        assert!(matches!(err, LayerError::RelationIndexOutOfRange { .. }));
    }
}
