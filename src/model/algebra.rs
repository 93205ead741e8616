//! Canonical algebraic model
//!
//! Solver-independent representation of a linear (mixed-integer) program:
//! named variables with bounds and domains, named linear constraints and a
//! linear objective to minimise. Backends translate it into their own API.

use std::fmt::{self, Write as _};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Domain {
    Continuous,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    /// `None` is unbounded above.
    pub upper: Option<f64>,
    pub domain: Domain,
}

/// Sum of weighted variables plus a constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Adds `scale * other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        for (var, coef) in &other.terms {
            self.add_term(*var, coef * scale);
        }
        self.constant += other.constant * scale;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Value of the expression for the given primal values, indexed by [`VarId`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl AddAssign<LinearExpr> for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.add_scaled(&rhs, 1.0);
    }
}

impl SubAssign<LinearExpr> for LinearExpr {
    fn sub_assign(&mut self, rhs: LinearExpr) {
        self.add_scaled(&rhs, -1.0);
    }
}

impl AddAssign<VarId> for LinearExpr {
    fn add_assign(&mut self, rhs: VarId) {
        self.add_term(rhs, 1.0);
    }
}

impl SubAssign<VarId> for LinearExpr {
    fn sub_assign(&mut self, rhs: VarId) {
        self.add_term(rhs, -1.0);
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        self += rhs.into();
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: T) -> LinearExpr {
        self -= rhs.into();
        self
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(self, rhs: f64) -> LinearExpr {
        let mut out = LinearExpr::new();
        out.add_scaled(&self, rhs);
        out
    }
}

impl Mul<VarId> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: VarId) -> LinearExpr {
        LinearExpr::term(rhs, self)
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Eq => "=",
            Relation::Le => "<=",
            Relation::Ge => ">=",
        })
    }
}

/// `expr <relation> rhs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl OptimizationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: Option<f64>, domain: Domain) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
            domain,
        });
        id
    }

    /// Non-negative continuous variable.
    pub fn continuous(&mut self, name: impl Into<String>, upper: Option<f64>) -> VarId {
        self.add_variable(name, 0.0, upper, Domain::Continuous)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, 0.0, Some(1.0), Domain::Binary)
    }

    /// Tightens the upper bound of `var`; the lower bound follows when it
    /// would exceed the new upper bound.
    pub fn cap_variable(&mut self, var: VarId, upper: f64) {
        let v = &mut self.variables[var.0];
        let upper = v.upper.map_or(upper, |u| u.min(upper));
        v.upper = Some(upper);
        if v.lower > upper {
            v.lower = upper;
        }
    }

    pub fn raise_lower(&mut self, var: VarId, lower: f64) {
        let v = &mut self.variables[var.0];
        v.lower = v.lower.max(lower);
    }

    /// Pins `var` to `value`.
    pub fn fix_variable(&mut self, var: VarId, value: f64) {
        let v = &mut self.variables[var.0];
        v.lower = value;
        v.upper = Some(value);
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: impl Into<LinearExpr>,
        relation: Relation,
        rhs: f64,
    ) -> ConstraintId {
        let mut expr = expr.into();
        let rhs = rhs - expr.constant;
        expr.constant = 0.0;
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            relation,
            rhs,
        });
        id
    }

    pub fn add_objective(&mut self, expr: impl Into<LinearExpr>) {
        self.objective += expr.into();
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id.0]
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn has_integers(&self) -> bool {
        self.variables.iter().any(|v| v.domain != Domain::Continuous)
    }

    /// Human readable dump in CPLEX LP flavour.
    pub fn to_lp_string(&self) -> String {
        let mut out = String::from("Minimize\n obj: ");
        self.write_expr(&mut out, &self.objective);
        out.push_str("\nSubject To\n");
        for c in &self.constraints {
            let _ = write!(out, " {}: ", c.name);
            self.write_expr(&mut out, &c.expr);
            let _ = writeln!(out, " {} {}", c.relation, c.rhs);
        }
        out.push_str("Bounds\n");
        for v in &self.variables {
            match v.upper {
                Some(upper) => {
                    let _ = writeln!(out, " {} <= {} <= {}", v.lower, v.name, upper);
                }
                None => {
                    let _ = writeln!(out, " {} >= {}", v.name, v.lower);
                }
            }
        }
        let binaries = self
            .variables
            .iter()
            .filter(|v| v.domain == Domain::Binary)
            .map(|v| v.name.as_str())
            .join(" ");
        if !binaries.is_empty() {
            let _ = writeln!(out, "Binary\n {binaries}");
        }
        out.push_str("End\n");
        out
    }

    fn write_expr(&self, out: &mut String, expr: &LinearExpr) {
        if expr.terms.is_empty() {
            let _ = write!(out, "{}", expr.constant);
            return;
        }
        for (i, (var, coef)) in expr.terms.iter().enumerate() {
            let sign = if *coef < 0.0 { "-" } else if i > 0 { "+" } else { "" };
            let _ = write!(out, "{sign} {} {} ", coef.abs(), self.variables[var.0].name);
        }
        if expr.constant != 0.0 {
            let _ = write!(out, "+ {}", expr.constant);
        }
    }
}
