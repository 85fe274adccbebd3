//! Elementwise nonlinearities applied after message aggregation.

use std::str::FromStr;

use ndarray::{Array2, NdFloat};
use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// RReLU negative-slope bounds (as in randomized leaky ReLU).
const RRELU_LOWER: f64 = 1.0 / 8.0;
const RRELU_UPPER: f64 = 1.0 / 3.0;

/// Activation function applied elementwise to a layer's output.
///
/// `RRelu` uses the fixed evaluation-mode slope `(lower + upper) / 2`
/// so that forward passes stay deterministic; sampling a slope per call
/// is a training-harness concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    RRelu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Apply the activation in place.
    pub fn apply<F: NdFloat>(&self, h: &mut Array2<F>) {
        match self {
            Activation::Relu => h.mapv_inplace(|x| x.max(F::zero())),
            Activation::RRelu => {
                let slope = crate::cast::<F>((RRELU_LOWER + RRELU_UPPER) / 2.0);
                h.mapv_inplace(move |x| if x < F::zero() { x * slope } else { x });
            }
            Activation::Sigmoid => h.mapv_inplace(|x| F::one() / (F::one() + (-x).exp())),
            Activation::Tanh => h.mapv_inplace(|x| x.tanh()),
        }
    }
}

impl FromStr for Activation {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relu" => Ok(Activation::Relu),
            "rrelu" => Ok(Activation::RRelu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            other => Err(LayerError::UnknownActivation(other.to_string())),
        }
    }
}
