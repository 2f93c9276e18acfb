//! Serde-typed interchange records for trained tree ensembles.
//!
//! A payload is a top-level feature declaration list plus one node array per
//! tree. Node records are flat: split fields and the leaf value are all
//! optional, and `TreeEnsembleModel::from_payload` decides which combination
//! is structurally valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared kind of an input feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Continuous,
    Categorical,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Continuous => "continuous",
            FeatureKind::Categorical => "categorical",
        }
    }
}

/// Per-feature declaration in the payload header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDecl {
    pub kind: FeatureKind,
    /// Full category domain observed across all trees; categorical only.
    #[serde(default)]
    pub domain: Option<BTreeSet<i64>>,
}

impl FeatureDecl {
    pub fn continuous() -> Self {
        Self {
            kind: FeatureKind::Continuous,
            domain: None,
        }
    }

    pub fn categorical<I: IntoIterator<Item = i64>>(domain: I) -> Self {
        Self {
            kind: FeatureKind::Categorical,
            domain: Some(domain.into_iter().collect()),
        }
    }
}

/// One record of a per-tree node array.
///
/// The node id is its index in the array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodePayload {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub categories: Option<BTreeSet<i64>>,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl NodePayload {
    /// Continuous split record: `value <= threshold` branches left.
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            feature: Some(feature),
            threshold: Some(threshold),
            left: Some(left),
            right: Some(right),
            ..Self::default()
        }
    }

    /// Categorical split record: membership in `categories` branches left.
    pub fn categorical_split<I: IntoIterator<Item = i64>>(
        feature: usize,
        categories: I,
        left: usize,
        right: usize,
    ) -> Self {
        Self {
            feature: Some(feature),
            categories: Some(categories.into_iter().collect()),
            left: Some(left),
            right: Some(right),
            ..Self::default()
        }
    }

    /// Terminal record contributing `value` to the ensemble output.
    pub fn leaf(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }
}

/// Node array of a single tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePayload {
    pub nodes: Vec<NodePayload>,
}

/// Complete interchange payload for a trained ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsemblePayload {
    pub features: Vec<FeatureDecl>,
    pub trees: Vec<TreePayload>,
    /// Constant offset added to the summed leaf contributions.
    #[serde(default)]
    pub base_score: f64,
}
