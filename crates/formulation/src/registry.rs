//! Shared indicator-variable registry.

use crate::block::{Block, VarDomain, VarId};
use std::collections::BTreeMap;
use treemip_ensemble::{FeatureKind, Node, SplitTest, TreeEnsembleModel};

/// Indicator variables shared across the whole ensemble for one build call.
///
/// Continuous features key indicators by rank within the sorted distinct
/// threshold list; categorical features key them by position within the
/// declared category domain. Split nodes in different trees testing the same
/// (feature, threshold) or (feature, category) pair resolve to the same
/// binary variable, which is what keeps indicator counts sub-linear in the
/// raw split-node count.
///
/// Populated once per formulation call and passed explicitly to constraint
/// emission; there is no shared state across calls.
pub(crate) struct IndicatorRegistry {
    /// Per feature, ascending distinct thresholds (empty for categorical).
    thresholds: Vec<Vec<f64>>,
    /// Per feature, ascending category domain (empty for continuous).
    categories: Vec<Vec<i64>>,
    /// (feature, rank-or-position) -> declared indicator.
    vars: BTreeMap<(usize, usize), VarId>,
}

// Collapse -0.0 onto 0.0 so sorting by total order and exact lookup agree.
fn normalize(t: f64) -> f64 {
    if t == 0.0 {
        0.0
    } else {
        t
    }
}

impl IndicatorRegistry {
    /// Scan the ensemble for the distinct (feature, threshold) pairs and the
    /// categorical domains.
    pub fn scan(ensemble: &TreeEnsembleModel) -> Self {
        let n = ensemble.num_features();
        let mut thresholds = vec![Vec::new(); n];
        let mut categories = vec![Vec::new(); n];

        for (feature, decl) in ensemble.features().iter().enumerate() {
            if decl.kind == FeatureKind::Categorical {
                categories[feature] = decl
                    .domain
                    .as_ref()
                    .expect("categorical features carry a validated domain")
                    .iter()
                    .copied()
                    .collect();
            }
        }

        for tree in ensemble.trees() {
            for node in tree.nodes() {
                if let Node::Split {
                    feature,
                    test: SplitTest::Threshold(t),
                    ..
                } = node
                {
                    thresholds[*feature].push(normalize(*t));
                }
            }
        }
        for list in &mut thresholds {
            list.sort_by(f64::total_cmp);
            list.dedup();
        }

        Self {
            thresholds,
            categories,
            vars: BTreeMap::new(),
        }
    }

    /// Declare one binary `y` per registered pair, feature-major, ascending
    /// threshold rank / category value within each feature.
    pub fn declare(&mut self, block: &mut Block<'_>) {
        for feature in 0..self.thresholds.len() {
            for rank in 0..self.thresholds[feature].len() {
                let id = block.add_var("y", &format!("{feature},{rank}"), VarDomain::Binary);
                self.vars.insert((feature, rank), id);
            }
            for (position, category) in self.categories[feature].iter().enumerate() {
                let id = block.add_var("y", &format!("{feature},{category}"), VarDomain::Binary);
                self.vars.insert((feature, position), id);
            }
        }
    }

    pub fn thresholds(&self, feature: usize) -> &[f64] {
        &self.thresholds[feature]
    }

    pub fn categories(&self, feature: usize) -> &[i64] {
        &self.categories[feature]
    }

    /// Indicator for a continuous split test `x <= threshold`.
    pub fn continuous_y(&self, feature: usize, threshold: f64) -> VarId {
        let rank = self.thresholds[feature]
            .binary_search_by(|probe| probe.total_cmp(&normalize(threshold)))
            .expect("threshold was registered during scan");
        self.vars[&(feature, rank)]
    }

    /// Indicator for membership of one category value.
    pub fn category_y(&self, feature: usize, category: i64) -> VarId {
        let position = self.categories[feature]
            .binary_search(&category)
            .expect("category is part of the validated domain");
        self.vars[&(feature, position)]
    }

    /// Indicator at a known rank/position.
    pub fn var_at(&self, feature: usize, position: usize) -> VarId {
        self.vars[&(feature, position)]
    }

    pub fn num_indicators(&self) -> usize {
        self.vars.len()
    }
}
