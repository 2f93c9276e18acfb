//! Big-M mixed-integer encoding of a tree ensemble.
//!
//! One binary indicator per distinct split test, one [0, 1] activation per
//! leaf, and the constraint families that force exactly one path-consistent
//! leaf per tree. Because leaf activations sum to 1 per tree, the split
//! linking uses partial-sum inequalities against the indicators instead of
//! explicit big constants; the only Big-M values are the variable-bound
//! consistency coefficients derived from the input domains.

use crate::block::{Block, ConstraintSense, VarDomain, VarId};
use crate::errors::{DomainMismatchError, FormulationError, UnboundedVariableError};
use crate::expr::LinExpr;
use crate::registry::IndicatorRegistry;
use crate::strategy::FormulationStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use treemip_ensemble::{Branch, FeatureKind, LeafPath, Node, SplitTest, TreeEnsembleModel};

/// Knobs for the Big-M builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulationOptions {
    /// Declare leaf activations as binaries instead of the [0, 1]
    /// relaxation. The constraint system forces integrality at optima
    /// either way, so the relaxation is the default.
    #[serde(default)]
    pub binary_leaf_vars: bool,
}

/// Big-M formulation strategy over a validated ensemble.
pub struct BigMFormulation<'a> {
    ensemble: &'a TreeEnsembleModel,
    options: FormulationOptions,
}

impl<'a> BigMFormulation<'a> {
    pub fn new(ensemble: &'a TreeEnsembleModel) -> Self {
        Self::with_options(ensemble, FormulationOptions::default())
    }

    pub fn with_options(ensemble: &'a TreeEnsembleModel, options: FormulationOptions) -> Self {
        Self { ensemble, options }
    }

    /// Check the input variables against the ensemble declarations and
    /// collect effective (lb, ub) per feature. Runs before any block
    /// mutation so a failed build leaves the block untouched.
    fn check_inputs(
        &self,
        block: &Block<'_>,
        input_vars: &[VarId],
    ) -> Result<Vec<(f64, f64)>, FormulationError> {
        let ensemble = self.ensemble;
        if input_vars.len() != ensemble.num_features() {
            return Err(DomainMismatchError::InputArity {
                expected: ensemble.num_features(),
                got: input_vars.len(),
            }
            .into());
        }

        let mut bounds = Vec::with_capacity(input_vars.len());
        for (feature, (&var, decl)) in input_vars
            .iter()
            .zip(ensemble.features())
            .enumerate()
        {
            let domain = &block.model().var(var).domain;
            match decl.kind {
                FeatureKind::Continuous => match domain {
                    VarDomain::Continuous {
                        lb: Some(lb),
                        ub: Some(ub),
                    } if lb.is_finite() && ub.is_finite() => bounds.push((*lb, *ub)),
                    VarDomain::Continuous { lb, ub } => {
                        return Err(UnboundedVariableError {
                            feature,
                            lb: *lb,
                            ub: *ub,
                        }
                        .into());
                    }
                    other => {
                        return Err(DomainMismatchError::KindMismatch {
                            feature,
                            declared: "continuous",
                            got: other.kind_str(),
                        }
                        .into());
                    }
                },
                FeatureKind::Categorical => {
                    let declared = ensemble
                        .category_domain(feature)
                        .expect("categorical features carry a validated domain");
                    match domain {
                        VarDomain::Binary => {
                            if let Some(&category) =
                                declared.iter().find(|&&v| v != 0 && v != 1)
                            {
                                return Err(DomainMismatchError::CategoryNotCovered {
                                    feature,
                                    category,
                                }
                                .into());
                            }
                            bounds.push((0.0, 1.0));
                        }
                        VarDomain::Integer { values } => {
                            if let Some(&category) =
                                declared.iter().find(|&&v| !values.contains(&v))
                            {
                                return Err(DomainMismatchError::CategoryNotCovered {
                                    feature,
                                    category,
                                }
                                .into());
                            }
                            let (lb, ub) = domain.bounds();
                            bounds.push((
                                lb.expect("non-empty integer domain"),
                                ub.expect("non-empty integer domain"),
                            ));
                        }
                        other => {
                            return Err(DomainMismatchError::KindMismatch {
                                feature,
                                declared: "categorical",
                                got: other.kind_str(),
                            }
                            .into());
                        }
                    }
                }
            }
        }
        Ok(bounds)
    }
}

impl FormulationStrategy for BigMFormulation<'_> {
    fn name(&self) -> &'static str {
        "big-m"
    }

    fn build(
        &self,
        block: &mut Block<'_>,
        input_vars: &[VarId],
        output_var: VarId,
    ) -> Result<(), FormulationError> {
        let ensemble = self.ensemble;
        let input_bounds = self.check_inputs(block, input_vars)?;

        // Indicator variables, shared across every tree of this build.
        let mut registry = IndicatorRegistry::scan(ensemble);
        registry.declare(block);

        // Leaf activations, in deterministic traversal order per tree.
        let leaf_domain = if self.options.binary_leaf_vars {
            VarDomain::Binary
        } else {
            VarDomain::unit_interval()
        };
        let mut tree_leaves: Vec<Vec<(LeafPath, VarId)>> =
            Vec::with_capacity(ensemble.num_trees());
        for (t, tree) in ensemble.trees().iter().enumerate() {
            let leaves = tree
                .leaf_paths()
                .map(|path| {
                    let var =
                        block.add_var("z_l", &format!("{t},{}", path.leaf), leaf_domain.clone());
                    (path, var)
                })
                .collect();
            tree_leaves.push(leaves);
        }

        // Exactly one active leaf per tree.
        for (t, leaves) in tree_leaves.iter().enumerate() {
            let expr = LinExpr::sum(leaves.iter().map(|(_, var)| *var));
            block.add_constraint("single_leaf", &t.to_string(), expr, ConstraintSense::Eq, 1.0);
        }

        // Split linking: activating a leaf below a branch forces the
        // branch's indicator term. Partial sums stay within [0, 1] because
        // of the single-leaf equality, so no explicit big constant appears.
        for (t, leaves) in tree_leaves.iter().enumerate() {
            let mut reachable: BTreeMap<usize, (Vec<VarId>, Vec<VarId>)> = BTreeMap::new();
            for (path, var) in leaves {
                for &(split, branch) in &path.path {
                    let entry = reachable.entry(split).or_default();
                    match branch {
                        Branch::Left => entry.0.push(*var),
                        Branch::Right => entry.1.push(*var),
                    }
                }
            }

            for (split, (left, right)) in &reachable {
                let Node::Split { feature, test, .. } = ensemble.tree(t).node(*split) else {
                    unreachable!("paths only record split nodes");
                };
                let branch_terms: Vec<VarId> = match test {
                    SplitTest::Threshold(threshold) => {
                        vec![registry.continuous_y(*feature, *threshold)]
                    }
                    SplitTest::Categories(set) => set
                        .iter()
                        .map(|&category| registry.category_y(*feature, category))
                        .collect(),
                };

                let mut expr = LinExpr::sum(left.iter().copied());
                for &y in &branch_terms {
                    expr.add_term(y, -1.0);
                }
                block.add_constraint(
                    "left_split",
                    &format!("{t},{split}"),
                    expr,
                    ConstraintSense::Le,
                    0.0,
                );

                let mut expr = LinExpr::sum(right.iter().copied());
                for &y in &branch_terms {
                    expr.add_term(y, 1.0);
                }
                block.add_constraint(
                    "right_split",
                    &format!("{t},{split}"),
                    expr,
                    ConstraintSense::Le,
                    1.0,
                );
            }
        }

        // Per-feature indicator structure and bound consistency.
        for feature in 0..ensemble.num_features() {
            let (lb, ub) = input_bounds[feature];
            let x = input_vars[feature];

            match ensemble.feature_kind(feature).expect("arity checked") {
                FeatureKind::Continuous => {
                    let thresholds = registry.thresholds(feature);

                    // x <= t_k implies x <= t_{k+1}.
                    for rank in 0..thresholds.len().saturating_sub(1) {
                        let expr = LinExpr::term(registry.var_at(feature, rank), 1.0)
                            .with_term(registry.var_at(feature, rank + 1), -1.0);
                        block.add_constraint(
                            "order_y",
                            &format!("{feature},{rank}"),
                            expr,
                            ConstraintSense::Le,
                            0.0,
                        );
                    }

                    for (rank, &threshold) in thresholds.iter().enumerate() {
                        let y = registry.var_at(feature, rank);
                        // y = 0 forces x >= t, y = 1 relaxes to x >= lb.
                        let expr = LinExpr::term(x, 1.0).with_term(y, threshold - lb);
                        block.add_constraint(
                            "var_lower",
                            &format!("{feature},{rank}"),
                            expr,
                            ConstraintSense::Ge,
                            threshold,
                        );
                        // y = 1 forces x <= t, y = 0 relaxes to x <= ub.
                        let expr = LinExpr::term(x, 1.0).with_term(y, ub - threshold);
                        block.add_constraint(
                            "var_upper",
                            &format!("{feature},{rank}"),
                            expr,
                            ConstraintSense::Le,
                            ub,
                        );
                    }
                }
                FeatureKind::Categorical => {
                    let categories: Vec<i64> = registry.categories(feature).to_vec();

                    // Exactly one category indicator active.
                    let expr = LinExpr::sum(
                        (0..categories.len()).map(|pos| registry.var_at(feature, pos)),
                    );
                    block.add_constraint(
                        "select_one",
                        &feature.to_string(),
                        expr,
                        ConstraintSense::Eq,
                        1.0,
                    );

                    // The selected category is the variable's value.
                    let mut expr = LinExpr::term(x, 1.0);
                    for (pos, &category) in categories.iter().enumerate() {
                        expr.add_term(registry.var_at(feature, pos), -(category as f64));
                    }
                    block.add_constraint(
                        "categorical",
                        &feature.to_string(),
                        expr,
                        ConstraintSense::Eq,
                        0.0,
                    );

                    for (pos, &category) in categories.iter().enumerate() {
                        let y = registry.var_at(feature, pos);
                        let v = category as f64;
                        // y = 1 pins x to the category from below.
                        let expr = LinExpr::term(x, 1.0).with_term(y, -(v - lb));
                        block.add_constraint(
                            "var_lower",
                            &format!("{feature},{category}"),
                            expr,
                            ConstraintSense::Ge,
                            lb,
                        );
                        // ... and from above.
                        let expr = LinExpr::term(x, 1.0).with_term(y, ub - v);
                        block.add_constraint(
                            "var_upper",
                            &format!("{feature},{category}"),
                            expr,
                            ConstraintSense::Le,
                            ub,
                        );
                    }
                }
            }
        }

        // Output equals the additive leaf contributions plus base score.
        let mut expr = LinExpr::term(output_var, 1.0);
        for leaves in &tree_leaves {
            for (path, var) in leaves {
                expr.add_term(*var, -path.value);
            }
        }
        block.add_constraint(
            "output_link",
            "0",
            expr,
            ConstraintSense::Eq,
            ensemble.base_score(),
        );

        info!(
            strategy = self.name(),
            trees = ensemble.num_trees(),
            indicators = registry.num_indicators(),
            leaves = ensemble.total_leaves(),
            constraints = block.model().num_block_constraints(block.name()),
            "formulation attached to block"
        );
        Ok(())
    }
}
