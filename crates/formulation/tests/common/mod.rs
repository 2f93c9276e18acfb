//! Shared ensemble fixtures for the formulation tests.
//!
//! The canonical fixture is 20 perfect depth-3 trees (7 splits + 8 leaves
//! each: 140 split nodes, 160 leaves overall) over 4 features. Split
//! features rotate so every feature is tested 35 times while thresholds
//! cycle through fixed per-feature palettes, leaving 10 + 10 + 9 + 13 = 42
//! distinct (feature, threshold) pairs.

use treemip_ensemble::{EnsemblePayload, FeatureDecl, NodePayload, TreePayload};
use treemip_formulation::{Model, VarDomain, VarId};

pub const NUM_TREES: usize = 20;
const NUM_FEATURES: usize = 4;

fn threshold_palette(feature: usize) -> Vec<f64> {
    match feature {
        0 => (0..10).map(|k| -1.8 + 0.36 * k as f64).collect(),
        1 => (0..10).map(|k| -1.5 + 0.3 * k as f64).collect(),
        2 => (0..9).map(|k| -1.6 + 0.4 * k as f64).collect(),
        // Feature 3 lives in [0, 1] and carries 13 distinct thresholds.
        3 => (0..13).map(|k| 0.05 + 0.07 * k as f64).collect(),
        _ => unreachable!("fixture has 4 features"),
    }
}

fn build_payload(categorical_feature3: bool) -> EnsemblePayload {
    let palettes: Vec<Vec<f64>> = (0..NUM_FEATURES).map(threshold_palette).collect();
    let mut uses = [0usize; NUM_FEATURES];

    let trees = (0..NUM_TREES)
        .map(|i| {
            let mut nodes = Vec::with_capacity(15);
            // Splits occupy ids 0..=6 with children 2p+1 / 2p+2; leaves 7..=14.
            for p in 0..7 {
                let feature = (i + p) % NUM_FEATURES;
                let n = uses[feature];
                uses[feature] += 1;
                let (left, right) = (2 * p + 1, 2 * p + 2);
                if feature == 3 && categorical_feature3 {
                    nodes.push(NodePayload::categorical_split(
                        3,
                        [(n % 2) as i64],
                        left,
                        right,
                    ));
                } else {
                    let palette = &palettes[feature];
                    nodes.push(NodePayload::split(
                        feature,
                        palette[n % palette.len()],
                        left,
                        right,
                    ));
                }
            }
            for l in 0..8 {
                nodes.push(NodePayload::leaf(((i * 8 + l) as f64) * 0.01 - 0.6));
            }
            TreePayload { nodes }
        })
        .collect();

    let mut features = vec![FeatureDecl::continuous(); NUM_FEATURES];
    if categorical_feature3 {
        features[3] = FeatureDecl::categorical([0, 1]);
    }

    EnsemblePayload {
        features,
        trees,
        base_score: 0.0,
    }
}

/// All-continuous canonical fixture.
pub fn continuous_payload() -> EnsemblePayload {
    build_payload(false)
}

/// Same trees with feature 3 redeclared categorical over {0, 1}; its splits
/// become alternating single-category membership tests.
pub fn categorical_payload() -> EnsemblePayload {
    build_payload(true)
}

/// Input variables matching `continuous_payload`: x0..x2 in [-2, 2], x3 in
/// [0, 1], plus a free output variable.
pub fn continuous_inputs(model: &mut Model) -> (Vec<VarId>, VarId) {
    let mut inputs: Vec<VarId> = (0..3)
        .map(|f| model.add_var(format!("x[{f}]"), VarDomain::continuous(-2.0, 2.0)))
        .collect();
    inputs.push(model.add_var("x[3]", VarDomain::continuous(0.0, 1.0)));
    let output = model.add_var("prediction", VarDomain::free());
    (inputs, output)
}

/// Input variables matching `categorical_payload`: feature 3 becomes an
/// integer variable over {0, 1}.
pub fn categorical_inputs(model: &mut Model) -> (Vec<VarId>, VarId) {
    let mut inputs: Vec<VarId> = (0..3)
        .map(|f| model.add_var(format!("x[{f}]"), VarDomain::continuous(-2.0, 2.0)))
        .collect();
    inputs.push(model.add_var("x[3]", VarDomain::integer([0, 1])));
    let output = model.add_var("prediction", VarDomain::free());
    (inputs, output)
}
