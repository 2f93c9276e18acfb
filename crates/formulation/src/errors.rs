//! Error types for formulation construction.

use thiserror::Error;
use treemip_ensemble::MalformedEnsembleError;

/// A continuous input variable lacks the finite bounds needed to size the
/// Big-M constants.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("input variable for feature {feature} must carry finite bounds (got [{lb:?}, {ub:?}])")]
pub struct UnboundedVariableError {
    pub feature: usize,
    pub lb: Option<f64>,
    pub ub: Option<f64>,
}

/// Categorical declarations disagree between the ensemble and the supplied
/// input variables.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainMismatchError {
    #[error("ensemble declares {expected} features but {got} input variables were supplied")]
    InputArity { expected: usize, got: usize },

    #[error("feature {feature} is declared {declared} but its input variable is {got}")]
    KindMismatch {
        feature: usize,
        declared: &'static str,
        got: &'static str,
    },

    #[error("feature {feature}: input variable domain does not cover declared category {category}")]
    CategoryNotCovered { feature: usize, category: i64 },
}

/// Any failure surfaced while turning an ensemble into a formulation.
///
/// Everything is detected during construction and returned synchronously;
/// the target block is only mutated once all inputs have validated, so a
/// failed call leaves it untouched.
#[derive(Debug, Error)]
pub enum FormulationError {
    #[error(transparent)]
    Malformed(#[from] MalformedEnsembleError),

    #[error(transparent)]
    UnboundedVariable(#[from] UnboundedVariableError),

    #[error(transparent)]
    DomainMismatch(#[from] DomainMismatchError),
}
