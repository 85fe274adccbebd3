//! Grouped scatter reduction of per-edge messages.
//!
//! The shared primitive behind every layer in this crate: given one
//! message per edge and the edge's destination node, reduce all
//! messages that share a destination into a single vector.

use std::collections::HashMap;

use ndarray::{Array2, NdFloat};

use crate::error::{LayerError, Result};

/// Reduction applied to the messages of each destination node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Sum,
    Mean,
}

/// Group message rows by destination node and reduce each group.
///
/// Returns the sorted unique destination IDs together with a
/// `(K, D)` matrix whose row `k` is the reduced message for
/// `unique[k]`. The pairing is what callers rely on to add each
/// aggregate back into the right row of the output embedding matrix.
///
/// Messages are accumulated through an index remap from raw node ID to
/// accumulator row, so the result is independent of edge order. An
/// empty message batch yields an empty ID list and a `(0, D)` matrix.
pub fn scatter_reduce<F: NdFloat>(
    messages: &Array2<F>,
    destinations: &[usize],
    num_nodes: usize,
    reduce: Reduce,
) -> Result<(Vec<usize>, Array2<F>)> {
    if messages.nrows() != destinations.len() {
        return Err(LayerError::DimensionMismatch {
            what: "message rows vs destination count",
            expected: destinations.len(),
            actual: messages.nrows(),
        });
    }
    let dim = messages.ncols();
    if destinations.is_empty() {
        return Ok((Vec::new(), Array2::zeros((0, dim))));
    }
    for &d in destinations {
        if d >= num_nodes {
            return Err(LayerError::NodeIndexOutOfRange {
                index: d,
                num_nodes,
            });
        }
    }

    let mut unique = destinations.to_vec();
    unique.sort_unstable();
    unique.dedup();

    // Raw node ID -> accumulator row. Keeps every message aligned with
    // the slot its destination occupies in the output.
    let slot: HashMap<usize, usize> = unique.iter().enumerate().map(|(i, &d)| (d, i)).collect();

    let mut acc = Array2::<F>::zeros((unique.len(), dim));
    let mut counts = vec![0usize; unique.len()];
    for (row, &d) in destinations.iter().enumerate() {
        let pos = slot[&d];
        let mut target = acc.row_mut(pos);
        target += &messages.row(row);
        counts[pos] += 1;
    }

    if reduce == Reduce::Mean {
        for (pos, &count) in counts.iter().enumerate() {
            let mut row = acc.row_mut(pos);
            row /= crate::cast::<F>(count as f64);
        }
    }

    Ok((unique, acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn sum_groups_by_destination() {
        let messages = array![[1.0, 0.0], [0.0, 2.0], [3.0, 3.0]];
        let destinations = [2, 0, 2];
        let (unique, agg) = scatter_reduce(&messages, &destinations, 4, Reduce::Sum).unwrap();
        assert_eq!(unique, vec![0, 2]);
        assert_eq!(agg, array![[0.0, 2.0], [4.0, 3.0]]);
    }

    #[test]
    fn mean_divides_by_group_size() {
        let messages = array![[2.0, 4.0], [4.0, 0.0], [1.0, 1.0]];
        let destinations = [1, 1, 3];
        let (unique, agg) = scatter_reduce(&messages, &destinations, 4, Reduce::Mean).unwrap();
        assert_eq!(unique, vec![1, 3]);
        assert_relative_eq!(agg[[0, 0]], 3.0);
        assert_relative_eq!(agg[[0, 1]], 2.0);
        assert_relative_eq!(agg[[1, 0]], 1.0);
    }

    #[test]
    fn result_is_independent_of_edge_order() {
        let forward = array![[1.0, 0.0], [0.0, 2.0], [3.0, 3.0], [1.0, 1.0]];
        let reversed = array![[1.0, 1.0], [3.0, 3.0], [0.0, 2.0], [1.0, 0.0]];
        let (u1, a1) = scatter_reduce(&forward, &[3, 0, 3, 1], 4, Reduce::Sum).unwrap();
        let (u2, a2) = scatter_reduce(&reversed, &[1, 3, 0, 3], 4, Reduce::Sum).unwrap();
        assert_eq!(u1, u2);
        assert_eq!(a1, a2);
    }

    #[test]
    fn empty_batch_yields_zero_rows() {
        let messages = Array2::<f64>::zeros((0, 5));
        let (unique, agg) = scatter_reduce(&messages, &[], 10, Reduce::Mean).unwrap();
        assert!(unique.is_empty());
        assert_eq!(agg.shape(), &[0, 5]);
    }

    #[test]
    fn out_of_range_destination_is_rejected() {
        let messages = array![[1.0, 1.0]];
        let err = scatter_reduce(&messages, &[7], 4, Reduce::Sum).unwrap_err();
        assert_eq!(
            err,
            LayerError::NodeIndexOutOfRange {
                index: 7,
                num_nodes: 4
            }
        );
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let messages = array![[1.0, 1.0]];
        let err = scatter_reduce(&messages, &[0, 1], 4, Reduce::Sum).unwrap_err();
        assert!(matches!(err, LayerError::DimensionMismatch { .. }));
    }
}
