//! Composition functions combining node and relation vectors.
//!
//! CompGCN-style layers merge the embedding of an edge's source node
//! with the embedding of its relation before the linear transform. The
//! three supported modes are elementwise add, subtract, and multiply.

use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, NdFloat};
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, Result};

/// Elementwise combination mode for a node vector and a relation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    Add,
    Sub,
    Mult,
}

impl FromStr for CompositionMode {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(CompositionMode::Add),
            "sub" => Ok(CompositionMode::Sub),
            "mult" => Ok(CompositionMode::Mult),
            other => Err(LayerError::UnknownComposition(other.to_string())),
        }
    }
}

/// Compose two vectors of equal length elementwise.
pub fn compose<F: NdFloat>(
    a: ArrayView1<F>,
    b: ArrayView1<F>,
    mode: CompositionMode,
) -> Result<Array1<F>> {
    if a.len() != b.len() {
        return Err(LayerError::DimensionMismatch {
            what: "composition operand lengths",
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(match mode {
        CompositionMode::Add => &a + &b,
        CompositionMode::Sub => &a - &b,
        CompositionMode::Mult => &a * &b,
    })
}

/// Compose every row of `nodes` with the single relation vector `rel`.
///
/// Used for the self-loop term, where all nodes share one relation row.
pub fn compose_rows<F: NdFloat>(
    nodes: ArrayView2<F>,
    rel: ArrayView1<F>,
    mode: CompositionMode,
) -> Result<Array2<F>> {
    if nodes.ncols() != rel.len() {
        return Err(LayerError::DimensionMismatch {
            what: "node columns vs relation length",
            expected: nodes.ncols(),
            actual: rel.len(),
        });
    }
    Ok(match mode {
        CompositionMode::Add => &nodes + &rel,
        CompositionMode::Sub => &nodes - &rel,
        CompositionMode::Mult => &nodes * &rel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn add_equals_elementwise_sum() {
        let a = array![1.0, 2.0, 3.0];
        let b = array![0.5, -1.0, 2.0];
        let out = compose(a.view(), b.view(), CompositionMode::Add).unwrap();
        assert_eq!(out, array![1.5, 1.0, 5.0]);
    }

    #[test]
    fn sub_and_mult_match_reference() {
        let a = array![1.0, 2.0];
        let b = array![3.0, 0.5];
        assert_eq!(
            compose(a.view(), b.view(), CompositionMode::Sub).unwrap(),
            array![-2.0, 1.5]
        );
        assert_eq!(
            compose(a.view(), b.view(), CompositionMode::Mult).unwrap(),
            array![3.0, 1.0]
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let a = array![1.0, 2.0];
        let b = array![1.0];
        let err = compose(a.view(), b.view(), CompositionMode::Add).unwrap_err();
        assert!(matches!(err, LayerError::DimensionMismatch { .. }));
    }

    #[test]
    fn rows_broadcast_over_relation() {
        let nodes = array![[1.0, 0.0], [0.0, 2.0]];
        let rel = array![1.0, 1.0];
        let out = compose_rows(nodes.view(), rel.view(), CompositionMode::Mult).unwrap();
        assert_eq!(out, nodes);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "concat".parse::<CompositionMode>().unwrap_err();
        assert_eq!(err, LayerError::UnknownComposition("concat".to_string()));
    }
}
