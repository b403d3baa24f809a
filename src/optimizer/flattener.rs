use std::time::Instant;

use tracing::{error, info, instrument, warn};

use super::{
    build, linearize, ConstraintSolver, MilpSolver, PeakVars, ScheduleModel, SolveParams,
    SolveResult, SolveStatus, SolverResponse,
};
use crate::domain::{ProblemError, Schedule, SchedulingProblem, DEFAULT_MAX_CELLS};

/// Peak-power minimising scheduler: model builder, objective linearizer and
/// an engine behind [`ConstraintSolver`].
pub struct LoadFlattener {
    solver: Box<dyn ConstraintSolver>,
    params: SolveParams,
    max_cells: usize,
}

impl LoadFlattener {
    pub fn new(solver: Box<dyn ConstraintSolver>, params: SolveParams) -> Self {
        Self {
            solver,
            params,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }

    /// Largest `machine_count * horizon` grid accepted by [`Self::admit`]
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn with_milp(params: SolveParams) -> Self {
        Self::new(Box::new(MilpSolver::new()), params)
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn params(&self) -> &SolveParams {
        &self.params
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    /// Free engine slots, if the engine bounds them
    pub fn idle_workers(&self) -> Option<usize> {
        self.solver.idle_workers()
    }

    /// True when the engine would turn a new solve away
    pub fn is_saturated(&self) -> bool {
        self.idle_workers() == Some(0)
    }

    /// Shape and size checks run before any model is built
    pub fn admit(&self, problem: &SchedulingProblem) -> Result<(), ProblemError> {
        problem.validate()?;
        problem.check_size(self.max_cells)?;
        Ok(())
    }

    /// Schedule one problem.
    ///
    /// Only malformed input is an `Err`. Infeasible, invalid and
    /// inconclusive solves come back as a [`SolveResult`] status.
    #[instrument(skip_all, fields(horizon = problem.horizon, machines = problem.machine_count))]
    pub fn solve(&self, problem: &SchedulingProblem) -> Result<SolveResult, ProblemError> {
        let started = Instant::now();
        self.admit(problem)?;
        let mut built = build(problem)?;

        let underbudgeted = problem.underbudgeted_machines();
        if !underbudgeted.is_empty() {
            warn!(
                machines = ?underbudgeted,
                "on-time budget below required periods, model will be infeasible"
            );
        }

        let result = match linearize(&mut built, problem) {
            Ok(peak) => self.run(&built, &peak, started),
            Err(e) => self.invalid(e.to_string(), started),
        };

        match result.status {
            SolveStatus::Optimal | SolveStatus::Feasible => info!(
                status = %result.status,
                objective = ?result.objective,
                elapsed_ms = result.elapsed_ms,
                "schedule solved"
            ),
            _ => warn!(
                status = %result.status,
                diagnostic = result.diagnostic.as_deref().unwrap_or(""),
                elapsed_ms = result.elapsed_ms,
                "no schedule"
            ),
        }

        Ok(result)
    }

    /// Validate the finished model, then hand it to the engine. A model that
    /// fails validation never reaches the engine.
    fn run(&self, built: &ScheduleModel, peak: &PeakVars, started: Instant) -> SolveResult {
        if let Err(e) = built.model.validate() {
            return self.invalid(e.to_string(), started);
        }

        let response = self.solver.solve(&built.model, &self.params);
        self.extract(built, peak, response, started)
    }

    fn invalid(&self, diagnostic: String, started: Instant) -> SolveResult {
        error!(%diagnostic, "model failed validation");
        SolveResult::without_solution(
            SolveStatus::ModelInvalid,
            Some(diagnostic),
            self.solver.name(),
            started.elapsed(),
        )
    }

    fn extract(
        &self,
        built: &ScheduleModel,
        peak: &PeakVars,
        response: SolverResponse,
        started: Instant,
    ) -> SolveResult {
        let solver = self.solver.name();
        let assignment = match (response.status.has_solution(), response.assignment) {
            (true, Some(assignment)) => assignment,
            (true, None) => {
                return SolveResult::without_solution(
                    SolveStatus::Unknown,
                    Some(format!("{solver} reported {} without an assignment", response.status)),
                    solver,
                    started.elapsed(),
                );
            }
            (false, _) => {
                return SolveResult::without_solution(
                    response.status,
                    response.diagnostic,
                    solver,
                    started.elapsed(),
                );
            }
        };

        let violations = built.model.violations(&assignment);
        if !violations.is_empty() {
            error!(count = violations.len(), first = %violations[0], "engine assignment violates the model");
            return SolveResult::without_solution(
                SolveStatus::Unknown,
                Some(format!("assignment rejected: {}", violations.join("; "))),
                solver,
                started.elapsed(),
            );
        }

        let schedule = Schedule::from_rows(
            built
                .schedule
                .iter()
                .map(|row| row.iter().map(|&cell| assignment.is_true(cell)).collect())
                .collect(),
        );
        let period_totals = peak
            .period_total
            .iter()
            .map(|&total| assignment.value(total))
            .collect();

        SolveResult {
            objective: Some(assignment.value(peak.peak)),
            schedule: Some(schedule),
            period_totals,
            diagnostic: response.diagnostic,
            ..SolveResult::without_solution(response.status, None, solver, started.elapsed())
        }
    }
}
