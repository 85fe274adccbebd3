//! Dense linear transform with Xavier-uniform initialization.

use ndarray::{Array1, Array2, NdFloat};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::{LayerError, Result};

/// A learnable affine map `y = x W (+ b)`.
///
/// Weights have shape `(input_dim, output_dim)`. Sampling happens in
/// `f64` and is cast into the tensor float type, so the same seed gives
/// the same parameters regardless of precision.
#[derive(Debug, Clone)]
pub struct Linear<F> {
    weight: Array2<F>,
    bias: Option<Array1<F>>,
}

impl<F: NdFloat> Linear<F> {
    /// Xavier-uniform initialization with gain 1.
    pub fn new(input_dim: usize, output_dim: usize, bias: bool, rng: &mut impl Rng) -> Self {
        Self::with_gain(input_dim, output_dim, bias, 1.0, rng)
    }

    /// Xavier-uniform initialization with an explicit gain, e.g.
    /// `sqrt(2)` for ReLU-family activations.
    pub fn with_gain(
        input_dim: usize,
        output_dim: usize,
        bias: bool,
        gain: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let bound = gain * (6.0 / (input_dim + output_dim) as f64).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        let weight =
            Array2::from_shape_fn((input_dim, output_dim), |_| crate::cast(dist.sample(rng)));
        let bias = bias.then(|| Array1::zeros(output_dim));
        Self { weight, bias }
    }

    /// Build from explicit parameters (deterministic construction).
    pub fn from_weights(weight: Array2<F>, bias: Option<Array1<F>>) -> Result<Self> {
        if let Some(b) = &bias {
            if b.len() != weight.ncols() {
                return Err(LayerError::DimensionMismatch {
                    what: "bias length vs output dim",
                    expected: weight.ncols(),
                    actual: b.len(),
                });
            }
        }
        Ok(Self { weight, bias })
    }

    pub fn input_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.ncols()
    }

    /// Apply the transform to a batch of row vectors.
    pub fn forward(&self, x: &Array2<F>) -> Result<Array2<F>> {
        if x.ncols() != self.weight.nrows() {
            return Err(LayerError::DimensionMismatch {
                what: "input columns vs weight rows",
                expected: self.weight.nrows(),
                actual: x.ncols(),
            });
        }
        let mut y = x.dot(&self.weight);
        if let Some(b) = &self.bias {
            y += b;
        }
        Ok(y)
    }
}
