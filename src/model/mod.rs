//! Solver-independent constraint model
//!
//! The capability set every engine behind [`crate::optimizer::ConstraintSolver`]
//! must provide:
//! - boolean and bounded integer variables
//! - linear equality/inequality constraints
//! - exact-maximum constraints over a list of existing variables
//! - a single linear objective to minimise
//!
//! The model is plain data. It can be validated up front, cloned onto a
//! worker thread, and used to independently check any assignment an engine
//! hands back.

pub mod expr;
pub mod linearize;

pub use expr::*;
pub use linearize::*;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Structural problems found by [`ConstraintModel::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Variable #{var} referenced by {context} does not exist")]
    UnknownVariable { var: usize, context: String },
    #[error("Variable '{name}' has an empty domain [{lo}, {hi}]")]
    EmptyDomain { name: String, lo: i64, hi: i64 },
    #[error("Maximum constraint on '{target}' has no member variables")]
    EmptyMaxEquality { target: String },
    #[error(
        "Variable '{name}' bounded to [{lo}, {hi}] cannot hold its reachable range [{reach_lo}, {reach_hi}]"
    )]
    BoundOverflow {
        name: String,
        lo: i64,
        hi: i64,
        reach_lo: i64,
        reach_hi: i64,
    },
    #[error("Integer overflow while evaluating bounds of {context}")]
    ArithmeticOverflow { context: String },
    #[error("Model has no objective")]
    MissingObjective,
}

/// Handle of a variable inside one [`ConstraintModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarDomain {
    Bool,
    Int { lo: i64, hi: i64 },
}

impl VarDomain {
    pub fn bounds(self) -> (i64, i64) {
        match self {
            VarDomain::Bool => (0, 1),
            VarDomain::Int { lo, hi } => (lo, hi),
        }
    }

    pub fn contains(self, value: i64) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDef {
    pub name: String,
    pub domain: VarDomain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Comparison {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">=")]
    Ge,
}

impl Comparison {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `expr <cmp> rhs`
    Linear {
        name: String,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: i64,
    },
    /// `target == expr`, where `target` exists only to name `expr`
    Definition { target: VarId, expr: LinearExpr },
    /// `target == max(members)`
    MaxEquality { target: VarId, members: Vec<VarId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Objective {
    Minimize(LinearExpr),
}

impl Objective {
    pub fn expr(&self) -> &LinearExpr {
        match self {
            Objective::Minimize(expr) => expr,
        }
    }
}

/// Concrete value for every variable of a model, indexed by [`VarId`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: VarId) -> i64 {
        self.values.get(var.0).copied().unwrap_or(0)
    }

    pub fn is_true(&self, var: VarId) -> bool {
        self.value(var) != 0
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintModel {
    name: String,
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
}

impl ConstraintModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), VarDomain::Bool)
    }

    pub fn new_int_var(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), VarDomain::Int { lo, hi })
    }

    /// Declare an integer variable equal to `expr`, bounded by the range
    /// `expr` can actually reach.
    pub fn new_defined_var(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
    ) -> Result<VarId, ModelError> {
        let name = name.into();
        let (lo, hi) = self.expr_range(&expr, &name)?;
        let var = self.new_int_var(lo, hi, name);
        self.add_definition(var, expr);
        Ok(var)
    }

    pub fn add_linear(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: i64,
    ) {
        self.constraints.push(Constraint::Linear {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    pub fn add_eq(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: i64) {
        self.add_linear(name, expr, Comparison::Eq, rhs);
    }

    pub fn add_le(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: i64) {
        self.add_linear(name, expr, Comparison::Le, rhs);
    }

    pub fn add_ge(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: i64) {
        self.add_linear(name, expr, Comparison::Ge, rhs);
    }

    pub fn add_definition(&mut self, target: VarId, expr: LinearExpr) {
        self.constraints.push(Constraint::Definition { target, expr });
    }

    pub fn add_max_equality(&mut self, target: VarId, members: Vec<VarId>) {
        self.constraints
            .push(Constraint::MaxEquality { target, members });
    }

    pub fn minimize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(Objective::Minimize(expr.into()));
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> Option<&VarDef> {
        self.vars.get(id.0)
    }

    pub fn var_name(&self, id: VarId) -> &str {
        self.var(id).map_or("<unknown>", |v| v.name.as_str())
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Smallest and largest value `expr` can take given variable bounds
    pub fn expr_range(&self, expr: &LinearExpr, context: &str) -> Result<(i64, i64), ModelError> {
        let overflow = || ModelError::ArithmeticOverflow {
            context: context.to_string(),
        };

        let mut lo = expr.constant();
        let mut hi = expr.constant();
        for &(var, coef) in expr.terms() {
            let (var_lo, var_hi) = self
                .var(var)
                .ok_or_else(|| ModelError::UnknownVariable {
                    var: var.0,
                    context: context.to_string(),
                })?
                .domain
                .bounds();
            let a = var_lo.checked_mul(coef).ok_or_else(overflow)?;
            let b = var_hi.checked_mul(coef).ok_or_else(overflow)?;
            lo = lo.checked_add(a.min(b)).ok_or_else(overflow)?;
            hi = hi.checked_add(a.max(b)).ok_or_else(overflow)?;
        }
        Ok((lo, hi))
    }

    /// Check the model is well formed before handing it to an engine.
    ///
    /// A definition or maximum whose target bound is narrower than the range
    /// it must represent is rejected: an engine would otherwise clip the
    /// optimum silently instead of reporting a problem.
    pub fn validate(&self) -> Result<(), ModelError> {
        for def in &self.vars {
            let (lo, hi) = def.domain.bounds();
            if lo > hi {
                return Err(ModelError::EmptyDomain {
                    name: def.name.clone(),
                    lo,
                    hi,
                });
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::Linear { name, expr, .. } => {
                    self.expr_range(expr, name)?;
                }
                Constraint::Definition { target, expr } => {
                    let def = self.known_var(*target, "definition")?;
                    let (reach_lo, reach_hi) = self.expr_range(expr, &def.name)?;
                    self.check_fits(def, reach_lo, reach_hi)?;
                }
                Constraint::MaxEquality { target, members } => {
                    let def = self.known_var(*target, "maximum constraint")?;
                    if members.is_empty() {
                        return Err(ModelError::EmptyMaxEquality {
                            target: def.name.clone(),
                        });
                    }
                    let mut reach_lo = i64::MIN;
                    let mut reach_hi = i64::MIN;
                    for &member in members {
                        let (lo, hi) = self.known_var(member, &def.name)?.domain.bounds();
                        reach_lo = reach_lo.max(lo);
                        reach_hi = reach_hi.max(hi);
                    }
                    self.check_fits(def, reach_lo, reach_hi)?;
                }
            }
        }

        match &self.objective {
            Some(objective) => self.expr_range(objective.expr(), "objective").map(|_| ()),
            None => Err(ModelError::MissingObjective),
        }
    }

    /// Every variable bound or constraint the assignment breaks
    pub fn violations(&self, assignment: &Assignment) -> Vec<String> {
        let mut violations = Vec::new();

        if assignment.len() != self.vars.len() {
            violations.push(format!(
                "assignment has {} values for {} variables",
                assignment.len(),
                self.vars.len()
            ));
            return violations;
        }

        for (i, def) in self.vars.iter().enumerate() {
            let value = assignment.value(VarId(i));
            if !def.domain.contains(value) {
                violations.push(format!("{} = {} outside its domain", def.name, value));
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::Linear {
                    name,
                    expr,
                    cmp,
                    rhs,
                } => {
                    let lhs = expr.eval(assignment);
                    if !cmp.holds(lhs, *rhs) {
                        violations.push(format!("{name}: {lhs} {cmp} {rhs} does not hold"));
                    }
                }
                Constraint::Definition { target, expr } => {
                    let (lhs, rhs) = (assignment.value(*target), expr.eval(assignment));
                    if lhs != rhs {
                        violations.push(format!(
                            "{} = {} but its definition evaluates to {}",
                            self.var_name(*target),
                            lhs,
                            rhs
                        ));
                    }
                }
                Constraint::MaxEquality { target, members } => {
                    let max = members.iter().map(|&m| assignment.value(m)).max();
                    let value = assignment.value(*target);
                    if max != Some(value) {
                        violations.push(format!(
                            "{} = {} but the maximum of its members is {:?}",
                            self.var_name(*target),
                            value,
                            max
                        ));
                    }
                }
            }
        }

        violations
    }

    fn push_var(&mut self, name: String, domain: VarDomain) -> VarId {
        self.vars.push(VarDef { name, domain });
        VarId(self.vars.len() - 1)
    }

    fn known_var(&self, var: VarId, context: &str) -> Result<&VarDef, ModelError> {
        self.var(var).ok_or_else(|| ModelError::UnknownVariable {
            var: var.0,
            context: context.to_string(),
        })
    }

    fn check_fits(&self, def: &VarDef, reach_lo: i64, reach_hi: i64) -> Result<(), ModelError> {
        let (lo, hi) = def.domain.bounds();
        if lo > reach_lo || hi < reach_hi {
            return Err(ModelError::BoundOverflow {
                name: def.name.clone(),
                lo,
                hi,
                reach_lo,
                reach_hi,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_range_uses_bounds_and_sign() {
        let mut model = ConstraintModel::new("range");
        let x = model.new_int_var(0, 10, "x");
        let b = model.new_bool_var("b");

        let expr = LinearExpr::from_terms([(x, 3), (b, -5)]).plus(2);
        assert_eq!(model.expr_range(&expr, "test"), Ok((-3, 32)));
    }

    #[test]
    fn test_defined_var_takes_reachable_bounds() {
        let mut model = ConstraintModel::new("define");
        let b = model.new_bool_var("b");
        let p = model
            .new_defined_var("power", LinearExpr::term(b, 150))
            .unwrap();

        assert_eq!(model.var(p).unwrap().domain, VarDomain::Int { lo: 0, hi: 150 });
        assert_eq!(model.constraints().len(), 1);
    }

    #[test]
    fn test_validate_rejects_undersized_definition() {
        let mut model = ConstraintModel::new("overflow");
        let b = model.new_bool_var("b");
        let p = model.new_int_var(0, 100, "power");
        model.add_definition(p, LinearExpr::term(b, 150));
        model.minimize(p);

        assert_eq!(
            model.validate(),
            Err(ModelError::BoundOverflow {
                name: "power".to_string(),
                lo: 0,
                hi: 100,
                reach_lo: 0,
                reach_hi: 150,
            })
        );
    }

    #[test]
    fn test_validate_rejects_undersized_maximum() {
        let mut model = ConstraintModel::new("overflow");
        let a = model.new_int_var(0, 300, "a");
        let b = model.new_int_var(0, 500, "b");
        let peak = model.new_int_var(0, 400, "peak");
        model.add_max_equality(peak, vec![a, b]);
        model.minimize(peak);

        assert!(matches!(
            model.validate(),
            Err(ModelError::BoundOverflow { reach_hi: 500, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_maximum_and_missing_objective() {
        let mut model = ConstraintModel::new("empty");
        let peak = model.new_int_var(0, 1, "peak");
        assert_eq!(model.validate(), Err(ModelError::MissingObjective));

        model.add_max_equality(peak, vec![]);
        model.minimize(peak);
        assert_eq!(
            model.validate(),
            Err(ModelError::EmptyMaxEquality {
                target: "peak".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_variable() {
        let mut model = ConstraintModel::new("unknown");
        model.add_eq("c", LinearExpr::term(VarId(7), 1), 1);
        model.minimize(LinearExpr::default());

        assert!(matches!(
            model.validate(),
            Err(ModelError::UnknownVariable { var: 7, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_domain() {
        let mut model = ConstraintModel::new("domain");
        model.new_int_var(5, 4, "x");
        model.minimize(LinearExpr::default());

        assert!(matches!(model.validate(), Err(ModelError::EmptyDomain { .. })));
    }

    #[test]
    fn test_violations() {
        let mut model = ConstraintModel::new("check");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        let sum = model.new_int_var(0, 2, "sum");
        let peak = model.new_int_var(0, 1, "peak");
        model.add_eq("one_on", LinearExpr::sum([a, b]), 1);
        model.add_definition(sum, LinearExpr::sum([a, b]));
        model.add_max_equality(peak, vec![a, b]);

        assert!(model.violations(&Assignment::new(vec![1, 0, 1, 1])).is_empty());

        let violations = model.violations(&Assignment::new(vec![1, 1, 1, 0]));
        assert_eq!(violations.len(), 3);
        assert!(violations[0].starts_with("one_on"));

        let short = model.violations(&Assignment::new(vec![1]));
        assert_eq!(short, vec!["assignment has 1 values for 4 variables".to_string()]);
    }
}
