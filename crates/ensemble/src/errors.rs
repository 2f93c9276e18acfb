//! Error types for ensemble parsing and validation.

use thiserror::Error;

/// Structural defects detected while building a `TreeEnsembleModel`.
///
/// Every variant points at the offending tree/node so a bad export can be
/// traced back to the producing toolchain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedEnsembleError {
    #[error("ensemble declares no trees")]
    NoTrees,

    #[error("ensemble declares no features")]
    NoFeatures,

    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },

    #[error("tree {tree} node {node}: child reference {child} out of range ({len} nodes)")]
    DanglingChild {
        tree: usize,
        node: usize,
        child: usize,
        len: usize,
    },

    #[error("tree {tree} node {node}: split node is missing a child reference")]
    MissingChild { tree: usize, node: usize },

    #[error("tree {tree} node {node}: neither split data nor leaf value present")]
    MissingLeafValue { tree: usize, node: usize },

    #[error("tree {tree} node {node}: carries both split data and a leaf value")]
    AmbiguousNode { tree: usize, node: usize },

    #[error("tree {tree} node {node}: references undeclared feature {feature}")]
    UndeclaredFeature {
        tree: usize,
        node: usize,
        feature: usize,
    },

    #[error("tree {tree} node {node}: {found} split on feature {feature} declared {declared}")]
    SplitKindMismatch {
        tree: usize,
        node: usize,
        feature: usize,
        declared: &'static str,
        found: &'static str,
    },

    #[error("tree {tree} node {node}: categorical split with empty category set")]
    EmptyCategorySet { tree: usize, node: usize },

    #[error(
        "tree {tree} node {node}: category {category} outside declared domain of feature {feature}"
    )]
    CategoryOutsideDomain {
        tree: usize,
        node: usize,
        feature: usize,
        category: i64,
    },

    #[error("categorical feature {feature} declared without a category domain")]
    MissingCategoryDomain { feature: usize },

    #[error("categorical feature {feature} declared with an empty category domain")]
    EmptyCategoryDomain { feature: usize },

    #[error("tree {tree} node {node}: non-finite threshold")]
    NonFiniteThreshold { tree: usize, node: usize },

    #[error("tree {tree} node {node}: non-finite leaf value")]
    NonFiniteLeafValue { tree: usize, node: usize },

    #[error("tree {tree} node {node} is reached more than once (cycle or shared subtree)")]
    RevisitedNode { tree: usize, node: usize },

    #[error("tree {tree} node {node} is unreachable from the root")]
    UnreachableNode { tree: usize, node: usize },
}

/// Errors surfaced by the ensemble crate, including model file I/O.
#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error(transparent)]
    Malformed(#[from] MalformedEnsembleError),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
