//! Mixed-integer formulations of tree-ensemble prediction functions.
//!
//! Embeds a trained gradient-boosted tree ensemble as a constraint set
//! inside an optimization model: binary indicators for the distinct split
//! tests, leaf-activation variables per tree, and the linking constraints
//! that make exactly one path-consistent leaf active per tree.
//!
//! Modules:
//! - `block`: Minimal model/block container the builder emits into
//! - `expr`: Linear expressions
//! - `bigm`: The Big-M encoding strategy
//! - `strategy`: Seam for alternative encodings
//! - `errors`: Construction-time failure taxonomy
//!
//! The sole entry point for the common case is
//! [`add_formulation_to_block`]; strategies can also be driven directly via
//! [`Block::build_formulation`].

pub mod bigm;
pub mod block;
pub mod errors;
pub mod expr;
mod registry;
pub mod strategy;

pub use bigm::{BigMFormulation, FormulationOptions};
pub use block::{
    Block, Constraint, ConstraintId, ConstraintSense, Model, VarDomain, VarId, Variable,
};
pub use errors::{DomainMismatchError, FormulationError, UnboundedVariableError};
pub use expr::LinExpr;
pub use strategy::FormulationStrategy;

use treemip_ensemble::{EnsemblePayload, TreeEnsembleModel};

/// Crate version string for metadata and validation reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Validate an ensemble payload and attach its Big-M formulation to a block.
///
/// `input_vars` supplies one externally-owned variable per declared feature
/// (finite bounds for continuous features, a finite discrete domain for
/// categorical ones); `output_var` is constrained to equal the ensemble
/// prediction. The block is only mutated once every input has validated.
pub fn add_formulation_to_block(
    block: &mut Block<'_>,
    payload: &EnsemblePayload,
    input_vars: &[VarId],
    output_var: VarId,
) -> Result<(), FormulationError> {
    let ensemble = TreeEnsembleModel::from_payload(payload)?;
    BigMFormulation::new(&ensemble).build(block, input_vars, output_var)
}
