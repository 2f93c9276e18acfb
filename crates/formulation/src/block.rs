//! Minimal optimization-model container.
//!
//! Implements exactly the surface a formulation needs from the surrounding
//! optimization system: declare a variable with a domain, declare a linear
//! constraint, and namespace both under a caller-supplied block so several
//! formulations coexist in one model. A real solver frontend would replace
//! this module; the formulation builders only rely on the operations here.

use crate::expr::LinExpr;
use std::collections::BTreeSet;

/// Index of a declared variable within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a declared constraint within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(usize);

impl ConstraintId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VarDomain {
    /// Real-valued, with optional lower/upper bounds.
    Continuous { lb: Option<f64>, ub: Option<f64> },
    /// {0, 1}.
    Binary,
    /// Finite discrete domain.
    Integer { values: BTreeSet<i64> },
}

impl VarDomain {
    pub fn continuous(lb: f64, ub: f64) -> Self {
        Self::Continuous {
            lb: Some(lb),
            ub: Some(ub),
        }
    }

    /// Unbounded real variable.
    pub fn free() -> Self {
        Self::Continuous { lb: None, ub: None }
    }

    /// Continuous [0, 1], the relaxed form of a binary.
    pub fn unit_interval() -> Self {
        Self::continuous(0.0, 1.0)
    }

    pub fn integer<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self::Integer {
            values: values.into_iter().collect(),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            VarDomain::Continuous { .. } => "continuous",
            VarDomain::Binary => "binary",
            VarDomain::Integer { .. } => "integer",
        }
    }

    /// Effective bounds: [0, 1] for binaries, the min/max value for finite
    /// integer domains.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            VarDomain::Continuous { lb, ub } => (*lb, *ub),
            VarDomain::Binary => (Some(0.0), Some(1.0)),
            VarDomain::Integer { values } => (
                values.first().map(|&v| v as f64),
                values.last().map(|&v| v as f64),
            ),
        }
    }
}

/// A declared decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Fully qualified name, e.g. `gbt.y[0,3]`.
    pub name: String,
    /// Owning block, if declared through one.
    pub block: Option<String>,
    /// Semantic group within the block (`y`, `z_l`, ...).
    pub group: Option<String>,
    pub domain: VarDomain,
}

/// Direction of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Le,
    Ge,
    Eq,
}

/// A declared linear constraint `expr (<= | >= | ==) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub block: Option<String>,
    pub group: Option<String>,
    pub expr: LinExpr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl Constraint {
    /// Check the constraint under a dense assignment indexed by variable id.
    pub fn satisfied(&self, assignment: &[f64], tol: f64) -> bool {
        let lhs = self.expr.eval(assignment);
        match self.sense {
            ConstraintSense::Le => lhs <= self.rhs + tol,
            ConstraintSense::Ge => lhs >= self.rhs - tol,
            ConstraintSense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// Container owning all variables and constraints of one optimization model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    vars: Vec<Variable>,
    constraints: Vec<Constraint>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a model-level variable (not owned by any block).
    pub fn add_var(&mut self, name: impl Into<String>, domain: VarDomain) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(Variable {
            name: name.into(),
            block: None,
            group: None,
            domain,
        });
        id
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.0]
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn constraint(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Open a namespaced block; declarations made through it are tagged with
    /// `name` and grouped for introspection.
    pub fn block(&mut self, name: &str) -> Block<'_> {
        Block {
            name: name.to_string(),
            model: self,
        }
    }

    pub fn vars_in<'a>(
        &'a self,
        block: &str,
        group: &str,
    ) -> impl Iterator<Item = (VarId, &'a Variable)> + 'a {
        let block = block.to_string();
        let group = group.to_string();
        self.vars.iter().enumerate().filter_map(move |(i, v)| {
            (v.block.as_deref() == Some(block.as_str())
                && v.group.as_deref() == Some(group.as_str()))
            .then_some((VarId(i), v))
        })
    }

    pub fn constraints_in<'a>(
        &'a self,
        block: &str,
        group: &str,
    ) -> impl Iterator<Item = &'a Constraint> + 'a {
        let block = block.to_string();
        let group = group.to_string();
        self.constraints.iter().filter(move |c| {
            c.block.as_deref() == Some(block.as_str()) && c.group.as_deref() == Some(group.as_str())
        })
    }

    pub fn num_vars_in(&self, block: &str, group: &str) -> usize {
        self.vars_in(block, group).count()
    }

    pub fn num_constraints_in(&self, block: &str, group: &str) -> usize {
        self.constraints_in(block, group).count()
    }

    /// All variables declared through the named block, across groups.
    pub fn num_block_vars(&self, block: &str) -> usize {
        self.vars
            .iter()
            .filter(|v| v.block.as_deref() == Some(block))
            .count()
    }

    /// All constraints declared through the named block, across groups.
    pub fn num_block_constraints(&self, block: &str) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.block.as_deref() == Some(block))
            .count()
    }
}

/// Mutable, namespaced view over a model for the duration of one build.
pub struct Block<'m> {
    name: String,
    model: &'m mut Model,
}

impl Block<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read access to the underlying model while the block is open.
    pub fn model(&self) -> &Model {
        self.model
    }

    /// Declare a grouped variable named `{block}.{group}[{label}]`.
    pub fn add_var(&mut self, group: &str, label: &str, domain: VarDomain) -> VarId {
        let id = VarId(self.model.vars.len());
        self.model.vars.push(Variable {
            name: format!("{}.{}[{}]", self.name, group, label),
            block: Some(self.name.clone()),
            group: Some(group.to_string()),
            domain,
        });
        id
    }

    /// Declare a grouped constraint named `{block}.{group}[{label}]`.
    pub fn add_constraint(
        &mut self,
        group: &str,
        label: &str,
        expr: LinExpr,
        sense: ConstraintSense,
        rhs: f64,
    ) -> ConstraintId {
        let id = ConstraintId(self.model.constraints.len());
        self.model.constraints.push(Constraint {
            name: format!("{}.{}[{}]", self.name, group, label),
            block: Some(self.name.clone()),
            group: Some(group.to_string()),
            expr,
            sense,
            rhs,
        });
        id
    }
}
