//! Composition-based GCN with directional weights and relation update.

use ndarray::{Array2, NdFloat};
use rand::Rng;
use tracing::debug;

use super::{add_aggregated, check_node, check_relation};
use crate::aggregation::{scatter_reduce, Reduce};
use crate::composition::{compose, compose_rows, CompositionMode};
use crate::error::{LayerError, Result};
use crate::linear::Linear;
use crate::EdgeTriple;

/// CompGCN layer over a doubled relation vocabulary: relation IDs below
/// `num_relations` are forward edges (transform `W_o`), IDs in
/// `[num_relations, 2 * num_relations)` are inverse edges (`W_s`), and
/// the relation matrix carries one extra self-loop relation row at
/// index `2 * num_relations` (`W_i`). Relation embeddings are updated
/// by a plain per-row transform `W_r`.
#[derive(Debug, Clone)]
pub struct CompGcnLayer<F> {
    w_i: Linear<F>,
    w_o: Linear<F>,
    w_s: Linear<F>,
    w_r: Linear<F>,
    num_relations: usize,
}

impl<F: NdFloat> CompGcnLayer<F> {
    pub fn new(
        input_dim: usize,
        output_dim: usize,
        num_relations: usize,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            w_i: Linear::new(input_dim, output_dim, false, rng),
            w_o: Linear::new(input_dim, output_dim, false, rng),
            w_s: Linear::new(input_dim, output_dim, false, rng),
            w_r: Linear::new(input_dim, output_dim, false, rng),
            num_relations,
        }
    }

    /// Build from explicit transforms (deterministic construction).
    pub fn from_parts(
        w_i: Linear<F>,
        w_o: Linear<F>,
        w_s: Linear<F>,
        w_r: Linear<F>,
        num_relations: usize,
    ) -> Result<Self> {
        if num_relations == 0 {
            return Err(LayerError::InvalidConfig(
                "CompGCN requires num_relations > 0".to_string(),
            ));
        }
        Ok(Self {
            w_i,
            w_o,
            w_s,
            w_r,
            num_relations,
        })
    }

    pub fn num_relations(&self) -> usize {
        self.num_relations
    }

    /// One message-passing step. Returns the updated node embeddings
    /// and the updated relation embeddings.
    ///
    /// `relations` must have `2 * num_relations + 1` rows: forward
    /// relations, inverse relations, then the self-loop relation.
    pub fn forward(
        &self,
        nodes: &Array2<F>,
        relations: &Array2<F>,
        edges: &[EdgeTriple],
        mode: CompositionMode,
    ) -> Result<(Array2<F>, Array2<F>)> {
        let num_nodes = nodes.nrows();
        let expected_rows = 2 * self.num_relations + 1;
        if relations.nrows() != expected_rows {
            return Err(LayerError::DimensionMismatch {
                what: "relation rows (2 * num_relations + 1)",
                expected: expected_rows,
                actual: relations.nrows(),
            });
        }
        debug!(
            num_nodes,
            num_edges = edges.len(),
            ?mode,
            "compgcn forward"
        );

        // Self-loop term: every node composed with the self-loop
        // relation, through W_i.
        let self_rel = relations.row(2 * self.num_relations);
        let composed = compose_rows(nodes.view(), self_rel, mode)?;
        let mut h_v = self.w_i.forward(&composed)?;

        // Forward edges through W_o, inverse edges through W_s.
        self.propagate(&mut h_v, nodes, relations, edges, mode, &self.w_o, false)?;
        self.propagate(&mut h_v, nodes, relations, edges, mode, &self.w_s, true)?;

        // Relation update is a pure per-row transform, no aggregation.
        let h_r = self.w_r.forward(relations)?;
        Ok((h_v, h_r))
    }

    fn propagate(
        &self,
        h_v: &mut Array2<F>,
        nodes: &Array2<F>,
        relations: &Array2<F>,
        edges: &[EdgeTriple],
        mode: CompositionMode,
        transform: &Linear<F>,
        inverse: bool,
    ) -> Result<()> {
        let num_nodes = nodes.nrows();
        let subset: Vec<EdgeTriple> = edges
            .iter()
            .copied()
            .filter(|&(_, rel, _)| (rel >= self.num_relations) == inverse)
            .collect();

        let mut composed = Array2::<F>::zeros((subset.len(), nodes.ncols()));
        let mut destinations = Vec::with_capacity(subset.len());
        for (i, &(src, rel, dst)) in subset.iter().enumerate() {
            check_node(src, num_nodes)?;
            // The self-loop relation row is not addressable from edges.
            check_relation(rel, 2 * self.num_relations)?;
            let row = compose(nodes.row(src), relations.row(rel), mode)?;
            composed.row_mut(i).assign(&row);
            destinations.push(dst);
        }
        let messages = transform.forward(&composed)?;

        let (unique, aggregated) =
            scatter_reduce(&messages, &destinations, num_nodes, Reduce::Sum)?;
        add_aggregated(h_v, &unique, &aggregated);
        Ok(())
    }
}
