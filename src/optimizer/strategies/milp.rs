//! MILP (Mixed-Integer Linear Programming) engine
//!
//! Solves a [`ConstraintModel`] with `good_lp` on the pure-Rust `microlp`
//! backend. Boolean and integer variables map one to one; exact-maximum
//! constraints have no direct counterpart and are lowered with one selector
//! binary per member:
//! - `target >= member_i` for every member
//! - `target <= member_i + M_i * (1 - select_i)`
//! - `sum(select_i) == 1`
//!
//! with `M_i = hi(target) - lo(member_i)`, the smallest constant that keeps
//! non-selected members unconstrained.
//!
//! microlp cannot be interrupted, so a solve that outlives its time limit
//! keeps running on its worker thread. Every solve holds one of a fixed
//! number of worker permits until the engine actually returns, and new
//! solves are turned away while all permits are taken.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;

use good_lp::{
    constraint, default_solver, variable, Constraint as LpConstraint, Expression, ProblemVariables,
    ResolutionError, Solution, SolverModel, Variable,
};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::model::{Assignment, Comparison, Constraint, ConstraintModel, LinearExpr, VarDomain};
use crate::optimizer::{ConstraintSolver, SolveParams, SolveStatus, SolverResponse};

pub const DEFAULT_WORKERS: usize = 4;

/// MILP engine backed by `good_lp`
#[derive(Debug, Clone)]
pub struct MilpSolver {
    workers: Arc<Semaphore>,
    capacity: usize,
}

impl Default for MilpSolver {
    fn default() -> Self {
        Self::with_workers(DEFAULT_WORKERS)
    }
}

impl MilpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most `workers` engine runs at once, abandoned ones included
    pub fn with_workers(workers: usize) -> Self {
        let capacity = workers.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            workers: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ConstraintSolver for MilpSolver {
    fn name(&self) -> &'static str {
        "milp-microlp"
    }

    fn idle_workers(&self) -> Option<usize> {
        Some(self.workers.available_permits())
    }

    fn solve(&self, model: &ConstraintModel, params: &SolveParams) -> SolverResponse {
        let Ok(permit) = Arc::clone(&self.workers).try_acquire_owned() else {
            warn!(workers = self.capacity, "all solver workers busy");
            return SolverResponse::failed(
                SolveStatus::Unknown,
                format!("all {} solver workers are busy", self.capacity),
            );
        };

        let Some(limit) = params.time_limit else {
            let response = solve_milp(model);
            drop(permit);
            return response;
        };

        // On timeout the worker is abandoned and keeps its permit until
        // the engine returns.
        let (tx, rx) = mpsc::channel();
        let owned = model.clone();
        let spawned = thread::Builder::new()
            .name("milp-solver".to_string())
            .spawn(move || {
                let _permit = permit;
                let _ = tx.send(solve_milp(&owned));
            });

        if let Err(e) = spawned {
            warn!(error = %e, "could not spawn solver thread");
            return SolverResponse::failed(
                SolveStatus::Unknown,
                format!("could not start solver worker: {e}"),
            );
        }

        match rx.recv_timeout(limit) {
            Ok(response) => response,
            Err(RecvTimeoutError::Timeout) => {
                warn!(limit_ms = limit.as_millis() as u64, "solver time limit reached");
                SolverResponse::failed(
                    SolveStatus::Unknown,
                    format!("time limit of {}ms reached", limit.as_millis()),
                )
            }
            Err(RecvTimeoutError::Disconnected) => SolverResponse::failed(
                SolveStatus::Unknown,
                "solver thread stopped without a result",
            ),
        }
    }
}

fn solve_milp(model: &ConstraintModel) -> SolverResponse {
    let Some(objective) = model.objective() else {
        return SolverResponse::failed(SolveStatus::ModelInvalid, "model has no objective");
    };

    let mut problem_vars = ProblemVariables::new();

    let vars: Vec<Variable> = model
        .vars()
        .iter()
        .map(|def| {
            let definition = match def.domain {
                VarDomain::Bool => variable().binary(),
                VarDomain::Int { lo, hi } => variable().integer().min(lo as f64).max(hi as f64),
            };
            problem_vars.add(definition.name(def.name.clone()))
        })
        .collect();

    // Selector binaries must exist before the problem is created
    let selectors: Vec<Vec<Variable>> = model
        .constraints()
        .iter()
        .enumerate()
        .map(|(i, constraint)| match constraint {
            Constraint::MaxEquality { members, .. } => (0..members.len())
                .map(|k| problem_vars.add(variable().binary().name(format!("max{i}_select{k}"))))
                .collect(),
            _ => Vec::new(),
        })
        .collect();

    let (objective_expr, _) = to_expression(objective.expr(), &vars);
    let mut problem = problem_vars.minimise(objective_expr).using(default_solver);

    let mut rows = 0usize;
    for (constraint, selected) in model.constraints().iter().zip(&selectors) {
        for row in lower(model, constraint, selected, &vars) {
            problem.add_constraint(row);
            rows += 1;
        }
    }

    debug!(
        model = model.name(),
        columns = vars.len() + selectors.iter().map(Vec::len).sum::<usize>(),
        rows,
        "solving MILP"
    );

    match problem.solve() {
        Ok(solution) => {
            let assignment = Assignment::new(
                vars.iter()
                    .map(|&v| solution.value(v).round() as i64)
                    .collect(),
            );
            let objective = objective.expr().eval(&assignment);
            SolverResponse::solved(SolveStatus::Optimal, assignment, objective)
        }
        Err(ResolutionError::Infeasible) => {
            SolverResponse::failed(SolveStatus::Infeasible, "problem is infeasible")
        }
        Err(ResolutionError::Unbounded) => {
            SolverResponse::failed(SolveStatus::ModelInvalid, "objective is unbounded")
        }
        Err(e) => SolverResponse::failed(SolveStatus::Unknown, e.to_string()),
    }
}

/// Solver-side rows of one model constraint
fn lower(
    model: &ConstraintModel,
    constraint: &Constraint,
    selectors: &[Variable],
    vars: &[Variable],
) -> Vec<LpConstraint> {
    match constraint {
        Constraint::Linear { expr, cmp, rhs, .. } => {
            let (lhs, constant) = to_expression(expr, vars);
            let rhs = (*rhs - constant) as f64;
            vec![match cmp {
                Comparison::Eq => constraint!(lhs == rhs),
                Comparison::Le => constraint!(lhs <= rhs),
                Comparison::Ge => constraint!(lhs >= rhs),
            }]
        }
        Constraint::Definition { target, expr } => {
            let (defined, constant) = to_expression(expr, vars);
            let difference = Expression::from(vars[target.index()]) - defined;
            let constant = constant as f64;
            vec![constraint!(difference == constant)]
        }
        Constraint::MaxEquality { target, members } => {
            let target_hi = model
                .var(*target)
                .map_or(0, |def| def.domain.bounds().1);
            let target = vars[target.index()];

            let mut rows = Vec::with_capacity(members.len() * 2 + 1);
            for (&member, &select) in members.iter().zip(selectors) {
                let member_lo = model.var(member).map_or(0, |def| def.domain.bounds().0);
                let big_m = (target_hi - member_lo) as f64;
                let member = vars[member.index()];

                rows.push(constraint!(target >= member));
                let cap = Expression::from(member) + big_m - select * big_m;
                rows.push(constraint!(target <= cap));
            }
            let chosen: Expression = selectors.iter().map(|&s| Expression::from(s)).sum();
            rows.push(constraint!(chosen == 1.0));
            rows
        }
    }
}

/// Variable part of `expr` as a `good_lp` expression, plus its constant
fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> (Expression, i64) {
    let terms = expr
        .terms()
        .iter()
        .map(|&(var, coef)| vars[var.index()] * coef as f64)
        .sum::<Expression>();
    (terms, expr.constant())
}
