//! Strategy seam for lowering ensembles into optimization blocks.

use crate::block::{Block, VarId};
use crate::errors::FormulationError;

/// An encoding that attaches a tree ensemble's prediction function to a
/// block as variables and constraints.
///
/// Alternative encodings (e.g. a convex-combination form) implement this
/// trait without touching the ensemble parser or the block container.
pub trait FormulationStrategy {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Emit variables and constraints into `block`, linking `input_vars`
    /// (one per declared feature, externally owned) to `output_var`.
    fn build(
        &self,
        block: &mut Block<'_>,
        input_vars: &[VarId],
        output_var: VarId,
    ) -> Result<(), FormulationError>;
}

impl Block<'_> {
    /// Run a formulation strategy against this block.
    pub fn build_formulation(
        &mut self,
        strategy: &dyn FormulationStrategy,
        input_vars: &[VarId],
        output_var: VarId,
    ) -> Result<(), FormulationError> {
        strategy.build(self, input_vars, output_var)
    }
}
