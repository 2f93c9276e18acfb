//! Linear expressions over declared variables.

use crate::block::VarId;

/// A linear expression: ordered term list plus a constant offset.
///
/// Terms keep insertion order so emitted constraints are reproducible;
/// adding a term for a variable already present folds into its coefficient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-term expression `coefficient * var`.
    pub fn term(var: VarId, coefficient: f64) -> Self {
        Self {
            terms: vec![(var, coefficient)],
            constant: 0.0,
        }
    }

    /// Unit-coefficient sum of the given variables.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add_term(var, 1.0);
        }
        expr
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        if let Some(entry) = self.terms.iter_mut().find(|(v, _)| *v == var) {
            entry.1 += coefficient;
        } else {
            self.terms.push((var, coefficient));
        }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Coefficient of `var`, or 0 when absent.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Evaluate under a dense assignment indexed by variable id.
    pub fn eval(&self, assignment: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(var, coefficient)| coefficient * assignment[var.index()])
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_terms_fold_into_one_coefficient() {
        let var = VarId::from_index(0);
        let mut expr = LinExpr::term(var, 1.0);
        expr.add_term(var, 2.5);

        assert_eq!(expr.num_terms(), 1);
        assert_eq!(expr.coefficient(var), 3.5);
    }

    #[test]
    fn eval_combines_terms_and_constant() {
        let a = VarId::from_index(0);
        let b = VarId::from_index(1);
        let expr = LinExpr::term(a, 2.0).with_term(b, -1.0).with_constant(0.5);

        assert_eq!(expr.constant(), 0.5);
        assert_eq!(expr.eval(&[3.0, 4.0]), 2.5);
    }
}
