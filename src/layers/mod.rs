//! The five relational layer variants and their shared interface.
//!
//! Each layer is a standalone struct with a typed `forward`. The
//! [`RelationalLayer`] enum wraps them behind a single polymorphic
//! `forward(ForwardInput) -> ForwardOutput` for configuration-driven
//! pipelines.

use ndarray::{Array2, NdFloat};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::composition::CompositionMode;
use crate::error::{LayerError, Result};
use crate::EdgeTriple;

pub mod compgcn;
pub mod gcn;
pub mod regcn;
pub mod rgcn;
pub mod wgcn;

pub use compgcn::CompGcnLayer;
pub use gcn::GcnLayer;
pub use regcn::RegcnLayer;
pub use rgcn::RgcnLayer;
pub use wgcn::WgcnLayer;

/// Add each aggregated row into the destination row it belongs to.
///
/// `destinations[k]` names the output row for `aggregated` row `k`,
/// exactly as returned by [`crate::scatter_reduce`].
pub(crate) fn add_aggregated<F: NdFloat>(
    h: &mut Array2<F>,
    destinations: &[usize],
    aggregated: &Array2<F>,
) {
    for (k, &d) in destinations.iter().enumerate() {
        let mut row = h.row_mut(d);
        row += &aggregated.row(k);
    }
}

pub(crate) fn check_node(index: usize, num_nodes: usize) -> Result<()> {
    if index >= num_nodes {
        return Err(LayerError::NodeIndexOutOfRange { index, num_nodes });
    }
    Ok(())
}

pub(crate) fn check_relation(index: usize, num_relations: usize) -> Result<()> {
    if index >= num_relations {
        return Err(LayerError::RelationIndexOutOfRange {
            index,
            num_relations,
        });
    }
    Ok(())
}

/// Which layer variant a [`LayerConfig`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Regcn,
    Wgcn,
    Gcn,
    CompGcn,
    Rgcn,
}

/// Construction parameters shared by all layer variants.
///
/// Fields irrelevant to a variant are ignored by it (`num_relations`
/// for the plain GCN, `activation` for RGCN which leaves the
/// nonlinearity to the caller).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub kind: LayerKind,
    pub input_dim: usize,
    pub output_dim: usize,
    /// Size of the relation vocabulary, excluding inverse relations.
    pub num_relations: usize,
    /// Additive bias on linear transforms.
    pub bias: bool,
    pub activation: Activation,
    /// Composition mode for CompGCN forwards built through the enum.
    pub composition: CompositionMode,
}

impl LayerConfig {
    /// Config with per-variant default activation (RReLU for REGCN,
    /// ReLU otherwise), no bias, additive composition.
    pub fn new(kind: LayerKind, input_dim: usize, output_dim: usize) -> Self {
        let activation = match kind {
            LayerKind::Regcn => Activation::RRelu,
            _ => Activation::Relu,
        };
        Self {
            kind,
            input_dim,
            output_dim,
            num_relations: 0,
            bias: false,
            activation,
            composition: CompositionMode::Add,
        }
    }

    pub fn with_num_relations(mut self, num_relations: usize) -> Self {
        self.num_relations = num_relations;
        self
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_composition(mut self, composition: CompositionMode) -> Self {
        self.composition = composition;
        self
    }
}

/// Inputs to the polymorphic [`RelationalLayer::forward`].
///
/// `relations` is required by REGCN and CompGCN and ignored by the
/// other variants. For CompGCN it must carry `2 * num_relations + 1`
/// rows (forward, inverse, then the self-loop relation).
#[derive(Debug, Clone, Copy)]
pub struct ForwardInput<'a, F> {
    pub nodes: &'a Array2<F>,
    pub edges: &'a [EdgeTriple],
    pub relations: Option<&'a Array2<F>>,
    pub composition: CompositionMode,
}

impl<'a, F> ForwardInput<'a, F> {
    pub fn new(nodes: &'a Array2<F>, edges: &'a [EdgeTriple]) -> Self {
        Self {
            nodes,
            edges,
            relations: None,
            composition: CompositionMode::Add,
        }
    }

    pub fn with_relations(mut self, relations: &'a Array2<F>) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn with_composition(mut self, composition: CompositionMode) -> Self {
        self.composition = composition;
        self
    }
}

/// Output of the polymorphic forward: updated node embeddings, plus
/// updated relation embeddings for variants that produce them
/// (CompGCN only).
#[derive(Debug, Clone)]
pub struct ForwardOutput<F> {
    pub nodes: Array2<F>,
    pub relations: Option<Array2<F>>,
}

/// Tagged union over the five layer variants.
#[derive(Debug, Clone)]
pub enum RelationalLayer<F> {
    Regcn(RegcnLayer<F>),
    Wgcn(WgcnLayer<F>),
    Gcn(GcnLayer<F>),
    CompGcn(CompGcnLayer<F>),
    Rgcn(RgcnLayer<F>),
}

impl<F: NdFloat> RelationalLayer<F> {
    /// Build the variant selected by `config.kind`.
    pub fn new(config: &LayerConfig, rng: &mut impl Rng) -> Result<Self> {
        if config.input_dim == 0 || config.output_dim == 0 {
            return Err(LayerError::InvalidConfig(
                "input_dim and output_dim must be nonzero".to_string(),
            ));
        }
        let needs_relations = matches!(
            config.kind,
            LayerKind::Wgcn | LayerKind::CompGcn | LayerKind::Rgcn
        );
        if needs_relations && config.num_relations == 0 {
            return Err(LayerError::InvalidConfig(format!(
                "{:?} requires num_relations > 0",
                config.kind
            )));
        }
        Ok(match config.kind {
            LayerKind::Regcn => RelationalLayer::Regcn(RegcnLayer::new(
                config.input_dim,
                config.output_dim,
                config.bias,
                config.activation,
                rng,
            )),
            LayerKind::Wgcn => RelationalLayer::Wgcn(WgcnLayer::new(
                config.num_relations,
                config.input_dim,
                config.output_dim,
                config.bias,
                config.activation,
                rng,
            )),
            LayerKind::Gcn => RelationalLayer::Gcn(GcnLayer::new(
                config.input_dim,
                config.output_dim,
                config.bias,
                rng,
            )),
            LayerKind::CompGcn => RelationalLayer::CompGcn(CompGcnLayer::new(
                config.input_dim,
                config.output_dim,
                config.num_relations,
                rng,
            )),
            LayerKind::Rgcn => RelationalLayer::Rgcn(RgcnLayer::new(
                config.input_dim,
                config.output_dim,
                config.num_relations,
                rng,
            )),
        })
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            RelationalLayer::Regcn(_) => LayerKind::Regcn,
            RelationalLayer::Wgcn(_) => LayerKind::Wgcn,
            RelationalLayer::Gcn(_) => LayerKind::Gcn,
            RelationalLayer::CompGcn(_) => LayerKind::CompGcn,
            RelationalLayer::Rgcn(_) => LayerKind::Rgcn,
        }
    }

    /// Run one message-passing step with the variant's policy.
    pub fn forward(&self, input: ForwardInput<'_, F>) -> Result<ForwardOutput<F>> {
        match self {
            RelationalLayer::Regcn(layer) => {
                let relations = input
                    .relations
                    .ok_or(LayerError::MissingRelationEmbeddings)?;
                Ok(ForwardOutput {
                    nodes: layer.forward(input.nodes, relations, input.edges)?,
                    relations: None,
                })
            }
            RelationalLayer::Wgcn(layer) => Ok(ForwardOutput {
                nodes: layer.forward(input.nodes, input.edges)?,
                relations: None,
            }),
            RelationalLayer::Gcn(layer) => Ok(ForwardOutput {
                nodes: layer.forward(input.nodes, input.edges)?,
                relations: None,
            }),
            RelationalLayer::CompGcn(layer) => {
                let relations = input
                    .relations
                    .ok_or(LayerError::MissingRelationEmbeddings)?;
                let (nodes, relations) =
                    layer.forward(input.nodes, relations, input.edges, input.composition)?;
                Ok(ForwardOutput {
                    nodes,
                    relations: Some(relations),
                })
            }
            RelationalLayer::Rgcn(layer) => Ok(ForwardOutput {
                nodes: layer.forward(input.nodes, input.edges)?,
                relations: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn config_builds_every_kind() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for kind in [
            LayerKind::Regcn,
            LayerKind::Wgcn,
            LayerKind::Gcn,
            LayerKind::CompGcn,
            LayerKind::Rgcn,
        ] {
            let config = LayerConfig::new(kind, 6, 4).with_num_relations(2);
            let layer: RelationalLayer<f64> = RelationalLayer::new(&config, &mut rng).unwrap();
            assert_eq!(layer.kind(), kind);
        }
    }

    #[test]
    fn relation_layers_reject_zero_relations() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = LayerConfig::new(LayerKind::Rgcn, 6, 4);
        let err = RelationalLayer::<f64>::new(&config, &mut rng).unwrap_err();
        assert!(matches!(err, LayerError::InvalidConfig(_)));
    }

    #[test]
    fn regcn_default_activation_is_rrelu() {
        let config = LayerConfig::new(LayerKind::Regcn, 4, 4);
        assert_eq!(config.activation, Activation::RRelu);
        let config = LayerConfig::new(LayerKind::Wgcn, 4, 4);
        assert_eq!(config.activation, Activation::Relu);
    }
}
