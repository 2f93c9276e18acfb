//! Big-M Formulation Demo
//!
//! Builds a small two-tree ensemble, attaches its Big-M formulation to a
//! block, and prints the resulting variable/constraint census.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use treemip_ensemble::{EnsemblePayload, FeatureDecl, NodePayload, TreeEnsembleModel, TreePayload};
use treemip_formulation::{add_formulation_to_block, Model, VarDomain};

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("=== Big-M Formulation Demo ===\n");

    // 1. A two-tree ensemble over one continuous and one categorical feature
    println!("1. Building a 2-tree ensemble payload...");
    let payload = EnsemblePayload {
        features: vec![FeatureDecl::continuous(), FeatureDecl::categorical([0, 1, 2])],
        trees: vec![
            TreePayload {
                nodes: vec![
                    NodePayload::split(0, 0.5, 1, 2),
                    NodePayload::leaf(1.0),
                    NodePayload::categorical_split(1, [0, 2], 3, 4),
                    NodePayload::leaf(2.0),
                    NodePayload::leaf(3.0),
                ],
            },
            TreePayload {
                nodes: vec![
                    NodePayload::split(0, -0.5, 1, 2),
                    NodePayload::leaf(-1.0),
                    NodePayload::leaf(1.5),
                ],
            },
        ],
        base_score: 0.25,
    };

    let ensemble = TreeEnsembleModel::from_payload(&payload)?;
    println!(
        "   {} trees, {} splits, {} leaves, fingerprint {}",
        ensemble.num_trees(),
        ensemble.total_splits(),
        ensemble.total_leaves(),
        &ensemble.fingerprint()?[..16]
    );

    // 2. Declare the surrounding model: inputs, output, and a block
    println!("\n2. Declaring input/output variables...");
    let mut model = Model::new();
    let inputs = vec![
        model.add_var("x[0]", VarDomain::continuous(-2.0, 2.0)),
        model.add_var("x[1]", VarDomain::integer([0, 1, 2])),
    ];
    let output = model.add_var("prediction", VarDomain::free());

    // 3. Attach the formulation
    println!("\n3. Attaching the Big-M formulation...");
    let mut block = model.block("gbt");
    add_formulation_to_block(&mut block, &payload, &inputs, output)?;

    // 4. Census
    println!("\n4. Block census:");
    for group in ["y", "z_l"] {
        println!("   vars {:<12} {}", group, model.num_vars_in("gbt", group));
    }
    for group in [
        "single_leaf",
        "left_split",
        "right_split",
        "select_one",
        "categorical",
        "order_y",
        "var_lower",
        "var_upper",
        "output_link",
    ] {
        println!(
            "   cons {:<12} {}",
            group,
            model.num_constraints_in("gbt", group)
        );
    }
    println!(
        "   total: {} variables, {} constraints",
        model.num_block_vars("gbt"),
        model.num_block_constraints("gbt")
    );

    // 5. Sanity-check a prediction against the traversal semantics
    println!("\n5. Ensemble prediction at x = [0.0, 2]:");
    println!("   predict = {}", ensemble.predict(&[0.0, 2.0]));

    Ok(())
}
