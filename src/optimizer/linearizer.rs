use tracing::debug;

use super::ScheduleModel;
use crate::domain::SchedulingProblem;
use crate::model::{linearize_max, LinearExpr, ModelError, VarId};

/// Auxiliary variables of the peak-power objective
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakVars {
    /// `power[m][t] == schedule[m][t] * machine_power[m]`
    pub power: Vec<Vec<VarId>>,
    /// `period_total[t] == sum over m of power[m][t]`
    pub period_total: Vec<VarId>,
    /// `peak == max(period_total)`, the minimised quantity
    pub peak: VarId,
}

/// Add the peak-power objective on top of a built schedule model.
///
/// Every auxiliary is bounded by what it can actually reach: a cell by its
/// machine's draw, a period total and the peak by the combined draw of all
/// machines.
pub fn linearize(
    built: &mut ScheduleModel,
    problem: &SchedulingProblem,
) -> Result<PeakVars, ModelError> {
    let mut power = Vec::with_capacity(problem.machine_count);
    for (m, row) in built.schedule.iter().enumerate() {
        let draw = i64::from(problem.machine_power[m]);
        let mut power_row = Vec::with_capacity(row.len());
        for (t, &cell) in row.iter().enumerate() {
            power_row.push(
                built
                    .model
                    .new_defined_var(format!("actual_power_m{m}t{t}"), LinearExpr::term(cell, draw))?,
            );
        }
        power.push(power_row);
    }

    let period_sums = problem
        .periods()
        .map(|t| LinearExpr::sum(power.iter().map(|row| row[t])));
    let max = linearize_max(&mut built.model, period_sums, "total_for_period", "peak_power")?;

    built.model.minimize(max.max);

    debug!(
        vars = built.model.num_vars(),
        constraints = built.model.constraints().len(),
        peak_bound = problem.total_power(),
        "linearized peak objective"
    );

    Ok(PeakVars {
        power,
        period_total: max.aux,
        peak: max.max,
    })
}
