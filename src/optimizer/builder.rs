use tracing::debug;

use crate::domain::{ProblemError, SchedulingProblem};
use crate::model::{ConstraintModel, LinearExpr, VarId};

/// Decision model of one scheduling problem
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    pub model: ConstraintModel,
    /// `schedule[m][t]` is the on/off variable of machine `m` in period `t`
    pub schedule: Vec<Vec<VarId>>,
}

impl ScheduleModel {
    pub fn cell(&self, machine: usize, t: usize) -> VarId {
        self.schedule[machine][t]
    }
}

/// Declare one boolean per (machine, period) plus the on-time and
/// required-coverage constraints.
///
/// Coverage is stated per cell (`schedule[m][t] >= 1` wherever the machine
/// is required), so a missed required period can never be compensated by an
/// extra period elsewhere.
pub fn build(problem: &SchedulingProblem) -> Result<ScheduleModel, ProblemError> {
    problem.validate()?;

    let mut model = ConstraintModel::new("load_flattening");

    let mut schedule = Vec::with_capacity(problem.machine_count);
    for m in problem.machines() {
        let row: Vec<VarId> = problem
            .periods()
            .map(|t| model.new_bool_var(format!("power_m{m}t{t}")))
            .collect();
        schedule.push(row);
    }

    for (m, (row, &budget)) in schedule.iter().zip(&problem.total_time_on).enumerate() {
        let on_time = i64::try_from(budget)
            .map_err(|_| ProblemError::BudgetOutOfRange { machine: m, budget })?;
        model.add_eq(
            format!("total_time_on_m{m}"),
            LinearExpr::sum(row.iter().copied()),
            on_time,
        );
    }

    let required = problem.required_schedule();
    for (m, t) in required.cells() {
        model.add_ge(format!("required_m{m}t{t}"), schedule[m][t].into(), 1);
    }

    debug!(
        vars = model.num_vars(),
        constraints = model.constraints().len(),
        required_cells = required.total_required(),
        "built schedule model"
    );

    Ok(ScheduleModel { model, schedule })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::problem::sample_problem;
    use crate::model::{Comparison, Constraint};

    #[test]
    fn test_build_declares_one_bool_per_cell() {
        let built = build(&sample_problem()).unwrap();

        assert_eq!(built.schedule.len(), 5);
        assert!(built.schedule.iter().all(|row| row.len() == 10));
        assert_eq!(built.model.num_vars(), 50);
        assert_eq!(built.model.var_name(built.cell(3, 7)), "power_m3t7");
    }

    #[test]
    fn test_build_emits_on_time_and_per_cell_coverage() {
        let built = build(&sample_problem()).unwrap();
        let constraints = built.model.constraints();

        // 5 on-time totals + 19 required cells
        assert_eq!(constraints.len(), 24);

        let Constraint::Linear { name, expr, cmp, rhs } = &constraints[4] else {
            panic!("expected a linear constraint");
        };
        assert_eq!(name, "total_time_on_m4");
        assert_eq!(expr.terms().len(), 10);
        assert_eq!(*cmp, Comparison::Eq);
        assert_eq!(*rhs, 7);

        let Constraint::Linear { name, expr, cmp, rhs } = &constraints[5] else {
            panic!("expected a linear constraint");
        };
        assert_eq!(name, "required_m0t2");
        assert_eq!(expr.terms(), &[(built.cell(0, 2), 1)]);
        assert_eq!(*cmp, Comparison::Ge);
        assert_eq!(*rhs, 1);
    }

    #[test]
    fn test_build_rejects_invalid_problem() {
        let mut problem = sample_problem();
        problem.total_time_on.pop();

        assert!(matches!(
            build(&problem),
            Err(ProblemError::LengthMismatch { field: "total_time_on", .. })
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_build_rejects_budget_beyond_i64() {
        let mut problem = sample_problem();
        problem.total_time_on[0] = usize::MAX;

        assert_eq!(
            build(&problem).unwrap_err(),
            ProblemError::BudgetOutOfRange { machine: 0, budget: usize::MAX }
        );
    }
}
