//! Validated tree-ensemble model and deterministic traversal.
//!
//! Trees are stored as arenas of nodes indexed by integer id within each
//! tree; child fields are indices into that arena, so the structure is
//! strictly acyclic and owned. Construction validates every structural
//! invariant up front; the model is read-only afterwards.

use crate::errors::{EnsembleError, MalformedEnsembleError};
use crate::payload::{EnsemblePayload, FeatureDecl, FeatureKind, NodePayload, TreePayload};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Split test of an internal node.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitTest {
    /// `value <= threshold` branches left.
    Threshold(f64),
    /// Membership in the category set branches left.
    Categories(BTreeSet<i64>),
}

/// One node of a tree arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split {
        feature: usize,
        test: SplitTest,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Branch direction taken at a split on a root-to-leaf path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Left,
    Right,
}

/// One decision tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn num_splits(&self) -> usize {
        self.nodes.len() - self.num_leaves()
    }

    /// Lazy depth-first leaf sequence, left child before right child.
    ///
    /// Each leaf is paired with the ordered (split id, branch) decisions on
    /// its root-to-leaf path; this is the unit the formulation builder
    /// consumes. The order is fully determined by the node array, so leaf
    /// indexing is reproducible across runs.
    pub fn leaf_paths(&self) -> LeafPaths<'_> {
        LeafPaths {
            tree: self,
            stack: vec![(0, Vec::new())],
        }
    }
}

/// A leaf together with the split decisions leading to it.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPath {
    /// Node id of the leaf within its tree.
    pub leaf: usize,
    /// Contribution to the ensemble output when this leaf is active.
    pub value: f64,
    /// (split node id, branch taken) pairs, root first.
    pub path: Vec<(usize, Branch)>,
}

/// Depth-first iterator over a tree's leaves.
pub struct LeafPaths<'a> {
    tree: &'a Tree,
    stack: Vec<(usize, Vec<(usize, Branch)>)>,
}

impl Iterator for LeafPaths<'_> {
    type Item = LeafPath;

    fn next(&mut self) -> Option<LeafPath> {
        while let Some((id, path)) = self.stack.pop() {
            match &self.tree.nodes[id] {
                Node::Leaf { value } => {
                    return Some(LeafPath {
                        leaf: id,
                        value: *value,
                        path,
                    });
                }
                Node::Split { left, right, .. } => {
                    let mut right_path = path.clone();
                    right_path.push((id, Branch::Right));
                    self.stack.push((*right, right_path));

                    let mut left_path = path;
                    left_path.push((id, Branch::Left));
                    self.stack.push((*left, left_path));
                }
            }
        }
        None
    }
}

/// Validated collection of trees plus the feature-kind declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsembleModel {
    features: Vec<FeatureDecl>,
    trees: Vec<Tree>,
    base_score: f64,
}

impl TreeEnsembleModel {
    // ---------------------------------------------------------------------
    // Construction and validation
    // ---------------------------------------------------------------------

    pub fn from_payload(payload: &EnsemblePayload) -> Result<Self, MalformedEnsembleError> {
        if payload.features.is_empty() {
            return Err(MalformedEnsembleError::NoFeatures);
        }
        if payload.trees.is_empty() {
            return Err(MalformedEnsembleError::NoTrees);
        }

        for (feature, decl) in payload.features.iter().enumerate() {
            if decl.kind == FeatureKind::Categorical {
                match &decl.domain {
                    None => {
                        return Err(MalformedEnsembleError::MissingCategoryDomain { feature });
                    }
                    Some(domain) if domain.is_empty() => {
                        return Err(MalformedEnsembleError::EmptyCategoryDomain { feature });
                    }
                    Some(_) => {}
                }
            }
        }

        let trees = payload
            .trees
            .iter()
            .enumerate()
            .map(|(index, tree)| build_tree(index, tree, &payload.features))
            .collect::<Result<Vec<_>, _>>()?;

        let model = Self {
            features: payload.features.clone(),
            trees,
            base_score: payload.base_score,
        };
        debug!(
            trees = model.num_trees(),
            leaves = model.total_leaves(),
            splits = model.total_splits(),
            "validated tree ensemble"
        );
        Ok(model)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn features(&self) -> &[FeatureDecl] {
        &self.features
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature_kind(&self, feature: usize) -> Option<FeatureKind> {
        self.features.get(feature).map(|decl| decl.kind)
    }

    /// Declared category domain of a categorical feature.
    pub fn category_domain(&self, feature: usize) -> Option<&BTreeSet<i64>> {
        self.features.get(feature).and_then(|decl| decl.domain.as_ref())
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn tree(&self, index: usize) -> &Tree {
        &self.trees[index]
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn total_leaves(&self) -> usize {
        self.trees.iter().map(Tree::num_leaves).sum()
    }

    pub fn total_splits(&self) -> usize {
        self.trees.iter().map(Tree::num_splits).sum()
    }

    // ---------------------------------------------------------------------
    // Prediction
    // ---------------------------------------------------------------------

    /// Additive ensemble prediction over a dense feature vector.
    ///
    /// Ties on a threshold go left; categorical features are compared after
    /// rounding to the nearest integer. The same conventions drive the
    /// formulation builder, so the active leaf found here is the one the
    /// constraint system selects.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut score = self.base_score;

        for tree in &self.trees {
            let mut id = 0usize;
            loop {
                match &tree.nodes[id] {
                    Node::Leaf { value } => {
                        score += value;
                        break;
                    }
                    Node::Split {
                        feature,
                        test,
                        left,
                        right,
                    } => {
                        let Some(&x) = features.get(*feature) else {
                            warn!(
                                feature = *feature,
                                len = features.len(),
                                "feature vector too short; skipping tree"
                            );
                            break;
                        };
                        let goes_left = match test {
                            SplitTest::Threshold(threshold) => x <= *threshold,
                            SplitTest::Categories(set) => set.contains(&(x.round() as i64)),
                        };
                        id = if goes_left { *left } else { *right };
                    }
                }
            }
        }

        score
    }

    // ---------------------------------------------------------------------
    // Serialization, hashing, and model files
    // ---------------------------------------------------------------------

    /// Reconstruct the interchange payload for this model.
    ///
    /// Node ids are preserved, so `from_payload(&to_payload())` rebuilds an
    /// identical model and file round-trips are stable.
    pub fn to_payload(&self) -> EnsemblePayload {
        let trees = self
            .trees
            .iter()
            .map(|tree| TreePayload {
                nodes: tree
                    .nodes
                    .iter()
                    .map(|node| match node {
                        Node::Leaf { value } => NodePayload::leaf(*value),
                        Node::Split {
                            feature,
                            test,
                            left,
                            right,
                        } => match test {
                            SplitTest::Threshold(threshold) => {
                                NodePayload::split(*feature, *threshold, *left, *right)
                            }
                            SplitTest::Categories(set) => NodePayload::categorical_split(
                                *feature,
                                set.iter().copied(),
                                *left,
                                *right,
                            ),
                        },
                    })
                    .collect(),
            })
            .collect();

        EnsemblePayload {
            features: self.features.clone(),
            trees,
            base_score: self.base_score,
        }
    }

    /// Canonical JSON rendering of the interchange payload.
    ///
    /// Payload structs serialize with a fixed field order and keep category
    /// sets and domains in sorted `BTreeSet`s, so equal models render
    /// byte-identically with no key re-sorting pass.
    pub fn to_canonical_json(&self) -> Result<String, EnsembleError> {
        serde_json::to_string_pretty(&self.to_payload())
            .map_err(|e| EnsembleError::Serialization(e.to_string()))
    }

    /// Canonical BLAKE3 fingerprint (hex) of the model.
    ///
    /// Stable across platforms and across repeated construction from the
    /// same payload.
    pub fn fingerprint(&self) -> Result<String, EnsembleError> {
        let json = self.to_canonical_json()?;
        Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EnsembleError> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|e| EnsembleError::Load(e.to_string()))?;
        let payload: EnsemblePayload =
            serde_json::from_str(&data).map_err(|e| EnsembleError::Load(e.to_string()))?;
        Ok(Self::from_payload(&payload)?)
    }

    pub fn from_binary_file<P: AsRef<Path>>(path: P) -> Result<Self, EnsembleError> {
        let data = fs::read(path.as_ref()).map_err(|e| EnsembleError::Load(e.to_string()))?;
        let payload: EnsemblePayload =
            bincode::deserialize(&data).map_err(|e| EnsembleError::Load(e.to_string()))?;
        Ok(Self::from_payload(&payload)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), EnsembleError> {
        let json = self.to_canonical_json()?;
        fs::write(path, json).map_err(|e| EnsembleError::Serialization(e.to_string()))?;
        Ok(())
    }

    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<(), EnsembleError> {
        let data = bincode::serialize(&self.to_payload())
            .map_err(|e| EnsembleError::Serialization(e.to_string()))?;
        fs::write(path, data).map_err(|e| EnsembleError::Serialization(e.to_string()))?;
        Ok(())
    }
}

fn build_tree(
    tree: usize,
    payload: &TreePayload,
    features: &[FeatureDecl],
) -> Result<Tree, MalformedEnsembleError> {
    let len = payload.nodes.len();
    if len == 0 {
        return Err(MalformedEnsembleError::EmptyTree { tree });
    }

    let mut nodes = Vec::with_capacity(len);
    for (node, raw) in payload.nodes.iter().enumerate() {
        nodes.push(build_node(tree, node, raw, features, len)?);
    }

    // Every node must be reached exactly once from the root: rules out
    // cycles, shared subtrees, and orphaned records in one pass.
    let mut visited = vec![false; len];
    let mut stack = vec![0usize];
    while let Some(id) = stack.pop() {
        if visited[id] {
            return Err(MalformedEnsembleError::RevisitedNode { tree, node: id });
        }
        visited[id] = true;
        if let Node::Split { left, right, .. } = nodes[id] {
            stack.push(right);
            stack.push(left);
        }
    }
    if let Some(node) = visited.iter().position(|seen| !seen) {
        return Err(MalformedEnsembleError::UnreachableNode { tree, node });
    }

    Ok(Tree { nodes })
}

fn build_node(
    tree: usize,
    node: usize,
    raw: &NodePayload,
    features: &[FeatureDecl],
    len: usize,
) -> Result<Node, MalformedEnsembleError> {
    match (raw.feature, raw.value) {
        (Some(_), Some(_)) => Err(MalformedEnsembleError::AmbiguousNode { tree, node }),
        (None, Some(value)) => {
            if raw.left.is_some()
                || raw.right.is_some()
                || raw.threshold.is_some()
                || raw.categories.is_some()
            {
                return Err(MalformedEnsembleError::AmbiguousNode { tree, node });
            }
            if !value.is_finite() {
                return Err(MalformedEnsembleError::NonFiniteLeafValue { tree, node });
            }
            Ok(Node::Leaf { value })
        }
        (None, None) => Err(MalformedEnsembleError::MissingLeafValue { tree, node }),
        (Some(feature), None) => {
            let decl = features
                .get(feature)
                .ok_or(MalformedEnsembleError::UndeclaredFeature { tree, node, feature })?;

            let left = raw
                .left
                .ok_or(MalformedEnsembleError::MissingChild { tree, node })?;
            let right = raw
                .right
                .ok_or(MalformedEnsembleError::MissingChild { tree, node })?;
            for child in [left, right] {
                if child >= len {
                    return Err(MalformedEnsembleError::DanglingChild {
                        tree,
                        node,
                        child,
                        len,
                    });
                }
            }

            let test = match decl.kind {
                FeatureKind::Continuous => {
                    if raw.categories.is_some() {
                        return Err(MalformedEnsembleError::SplitKindMismatch {
                            tree,
                            node,
                            feature,
                            declared: "continuous",
                            found: "categorical",
                        });
                    }
                    let threshold = raw
                        .threshold
                        .ok_or(MalformedEnsembleError::MissingLeafValue { tree, node })?;
                    if !threshold.is_finite() {
                        return Err(MalformedEnsembleError::NonFiniteThreshold { tree, node });
                    }
                    SplitTest::Threshold(threshold)
                }
                FeatureKind::Categorical => {
                    if raw.threshold.is_some() {
                        return Err(MalformedEnsembleError::SplitKindMismatch {
                            tree,
                            node,
                            feature,
                            declared: "categorical",
                            found: "threshold",
                        });
                    }
                    let categories = raw
                        .categories
                        .clone()
                        .ok_or(MalformedEnsembleError::MissingLeafValue { tree, node })?;
                    if categories.is_empty() {
                        return Err(MalformedEnsembleError::EmptyCategorySet { tree, node });
                    }
                    let domain = decl.domain.as_ref().expect("validated above");
                    for &category in &categories {
                        if !domain.contains(&category) {
                            return Err(MalformedEnsembleError::CategoryOutsideDomain {
                                tree,
                                node,
                                feature,
                                category,
                            });
                        }
                    }
                    SplitTest::Categories(categories)
                }
            };

            Ok(Node::Split {
                feature,
                test,
                left,
                right,
            })
        }
    }
}
