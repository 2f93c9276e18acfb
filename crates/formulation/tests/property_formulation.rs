//! Feasibility of the encoding under assignments derived from real inputs.
//!
//! For any concrete feature vector, setting the indicators from the split
//! semantics, activating the leaf each tree actually routes to, and setting
//! the output to the ensemble prediction must satisfy every emitted
//! constraint. This pins the constraint algebra to the traversal semantics.

mod common;

use common::{categorical_inputs, categorical_payload, continuous_inputs, continuous_payload};
use proptest::prelude::*;
use treemip_ensemble::{EnsemblePayload, FeatureKind, Node, SplitTest, TreeEnsembleModel};
use treemip_formulation::{add_formulation_to_block, Model, VarId};

enum SplitPoint {
    Threshold(f64),
    Category(i64),
}

/// Distinct split points per feature in the same order the builder declares
/// its indicators: feature-major, ascending within each feature.
fn indicator_meta(ensemble: &TreeEnsembleModel) -> Vec<(usize, SplitPoint)> {
    let mut meta = Vec::new();
    for feature in 0..ensemble.num_features() {
        match ensemble.feature_kind(feature).unwrap() {
            FeatureKind::Continuous => {
                let mut thresholds = Vec::new();
                for tree in ensemble.trees() {
                    for node in tree.nodes() {
                        if let Node::Split {
                            feature: f,
                            test: SplitTest::Threshold(t),
                            ..
                        } = node
                        {
                            if *f == feature {
                                thresholds.push(*t);
                            }
                        }
                    }
                }
                thresholds.sort_by(f64::total_cmp);
                thresholds.dedup();
                meta.extend(
                    thresholds
                        .into_iter()
                        .map(|t| (feature, SplitPoint::Threshold(t))),
                );
            }
            FeatureKind::Categorical => {
                let domain = ensemble.category_domain(feature).unwrap();
                meta.extend(
                    domain
                        .iter()
                        .map(|&category| (feature, SplitPoint::Category(category))),
                );
            }
        }
    }
    meta
}

fn check_feasible(
    payload: &EnsemblePayload,
    make_inputs: fn(&mut Model) -> (Vec<VarId>, VarId),
    x: &[f64],
) {
    let ensemble = TreeEnsembleModel::from_payload(payload).unwrap();
    let mut model = Model::new();
    let (inputs, output) = make_inputs(&mut model);
    let mut block = model.block("gbt");
    add_formulation_to_block(&mut block, payload, &inputs, output).unwrap();

    let mut assignment = vec![0.0f64; model.num_vars()];
    for (feature, &var) in inputs.iter().enumerate() {
        assignment[var.index()] = x[feature];
    }
    assignment[output.index()] = ensemble.predict(x);

    // Indicators follow the fixed split-test semantics.
    let meta = indicator_meta(&ensemble);
    let y_vars: Vec<VarId> = model.vars_in("gbt", "y").map(|(id, _)| id).collect();
    assert_eq!(y_vars.len(), meta.len());
    for ((feature, point), var) in meta.iter().zip(&y_vars) {
        let active = match point {
            SplitPoint::Threshold(t) => x[*feature] <= *t,
            SplitPoint::Category(c) => x[*feature].round() as i64 == *c,
        };
        assignment[var.index()] = if active { 1.0 } else { 0.0 };
    }

    // Exactly the routed leaf is active in each tree.
    let z_vars: Vec<VarId> = model.vars_in("gbt", "z_l").map(|(id, _)| id).collect();
    let mut z_iter = z_vars.iter();
    for tree in ensemble.trees() {
        let mut id = 0usize;
        let active = loop {
            match tree.node(id) {
                Node::Leaf { .. } => break id,
                Node::Split {
                    feature,
                    test,
                    left,
                    right,
                } => {
                    let goes_left = match test {
                        SplitTest::Threshold(t) => x[*feature] <= *t,
                        SplitTest::Categories(set) => {
                            set.contains(&(x[*feature].round() as i64))
                        }
                    };
                    id = if goes_left { *left } else { *right };
                }
            }
        };
        for path in tree.leaf_paths() {
            let var = z_iter.next().expect("one activation per leaf");
            assignment[var.index()] = if path.leaf == active { 1.0 } else { 0.0 };
        }
    }
    assert!(z_iter.next().is_none());

    for constraint in model.constraints() {
        assert!(
            constraint.satisfied(&assignment, 1e-9),
            "constraint {} violated for inputs {:?}",
            constraint.name,
            x
        );
    }
}

proptest! {
    #[test]
    fn continuous_assignments_satisfy_every_constraint(
        x0 in -2.0f64..=2.0,
        x1 in -2.0f64..=2.0,
        x2 in -2.0f64..=2.0,
        x3 in 0.0f64..=1.0,
    ) {
        check_feasible(&continuous_payload(), continuous_inputs, &[x0, x1, x2, x3]);
    }
}

proptest! {
    #[test]
    fn categorical_assignments_satisfy_every_constraint(
        x0 in -2.0f64..=2.0,
        x1 in -2.0f64..=2.0,
        x2 in -2.0f64..=2.0,
        x3 in 0i64..=1,
    ) {
        check_feasible(&categorical_payload(), categorical_inputs, &[x0, x1, x2, x3 as f64]);
    }
}
