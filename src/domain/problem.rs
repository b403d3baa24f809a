use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RequiredSchedule;

/// Schedule cells (`machine_count * horizon`) accepted unless configured otherwise
pub const DEFAULT_MAX_CELLS: usize = 100_000;

/// Input validation errors, raised before any model is built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    #[error("Time horizon must contain at least one period")]
    EmptyHorizon,
    #[error("Machine set must contain at least one machine")]
    NoMachines,
    #[error("{field} has {actual} entries, expected one per machine ({expected})")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Required period {interval} of machine {machine} lies outside [0, {horizon}]")]
    IntervalOutOfBounds {
        machine: usize,
        interval: Interval,
        horizon: usize,
    },
    #[error("Required period {interval} of machine {machine} is empty")]
    EmptyInterval { machine: usize, interval: Interval },
    #[error("On-time budget {budget} of machine {machine} is out of range")]
    BudgetOutOfRange { machine: usize, budget: usize },
    #[error("{machines} machines over {horizon} periods exceed the limit of {max_cells} schedule cells")]
    TooLarge {
        machines: usize,
        horizon: usize,
        max_cells: usize,
    },
}

/// Half-open period range `[start, end)`
///
/// Accepts both `{ start = 2, end = 4 }` and `[2, 4]` when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "IntervalRepr")]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntervalRepr {
    Pair(usize, usize),
    Table { start: usize, end: usize },
}

impl From<IntervalRepr> for Interval {
    fn from(repr: IntervalRepr) -> Self {
        match repr {
            IntervalRepr::Pair(start, end) | IntervalRepr::Table { start, end } => {
                Self { start, end }
            }
        }
    }
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, t: usize) -> bool {
        t >= self.start && t < self.end
    }

    pub fn periods(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A load-flattening instance: `machine_count` on/off machines over a grid
/// of `horizon` discrete periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingProblem {
    /// Number of discrete time periods (T)
    pub horizon: usize,
    /// Number of machines (n)
    pub machine_count: usize,
    /// Power draw of each machine while on
    pub machine_power: Vec<u32>,
    /// Periods during which each machine must be on
    #[serde(default)]
    pub required_periods: Vec<Vec<Interval>>,
    /// Exact number of periods each machine is on overall
    pub total_time_on: Vec<usize>,
}

impl SchedulingProblem {
    /// Fail fast on malformed shapes. Budgets are deliberately not checked
    /// here: an unreachable budget is reported by the solver as infeasible.
    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.horizon == 0 {
            return Err(ProblemError::EmptyHorizon);
        }
        if self.machine_count == 0 {
            return Err(ProblemError::NoMachines);
        }

        for (field, actual) in [
            ("machine_power", self.machine_power.len()),
            ("required_periods", self.required_periods.len()),
            ("total_time_on", self.total_time_on.len()),
        ] {
            if actual != self.machine_count {
                return Err(ProblemError::LengthMismatch {
                    field,
                    expected: self.machine_count,
                    actual,
                });
            }
        }

        self.check_size(usize::MAX)?;

        for (machine, &budget) in self.total_time_on.iter().enumerate() {
            if i64::try_from(budget).is_err() {
                return Err(ProblemError::BudgetOutOfRange { machine, budget });
            }
        }

        for (machine, intervals) in self.required_periods.iter().enumerate() {
            for &interval in intervals {
                if interval.is_empty() {
                    return Err(ProblemError::EmptyInterval { machine, interval });
                }
                if interval.end > self.horizon {
                    return Err(ProblemError::IntervalOutOfBounds {
                        machine,
                        interval,
                        horizon: self.horizon,
                    });
                }
            }
        }

        Ok(())
    }

    /// Number of (machine, period) cells, `None` when it overflows
    pub fn cell_count(&self) -> Option<usize> {
        self.machine_count.checked_mul(self.horizon)
    }

    /// Reject grids larger than `max_cells`
    pub fn check_size(&self, max_cells: usize) -> Result<usize, ProblemError> {
        self.cell_count()
            .filter(|&cells| cells <= max_cells)
            .ok_or(ProblemError::TooLarge {
                machines: self.machine_count,
                horizon: self.horizon,
                max_cells,
            })
    }

    /// Flatten the required intervals into a per-(machine, period) matrix
    pub fn required_schedule(&self) -> RequiredSchedule {
        let mut required = RequiredSchedule::new(self.machine_count, self.horizon);
        for (machine, intervals) in self.required_periods.iter().enumerate() {
            for interval in intervals {
                for t in interval.periods().take_while(|&t| t < self.horizon) {
                    required.set(machine, t);
                }
            }
        }
        required
    }

    /// Combined draw of every machine, the largest power any period can see
    pub fn total_power(&self) -> i64 {
        self.machine_power.iter().map(|&p| i64::from(p)).sum()
    }

    /// Machines whose on-time budget is smaller than their required periods
    pub fn underbudgeted_machines(&self) -> Vec<usize> {
        let required = self.required_schedule();
        self.total_time_on
            .iter()
            .enumerate()
            .filter(|&(m, &budget)| budget < required.required_count(m))
            .map(|(m, _)| m)
            .collect()
    }

    pub fn machines(&self) -> std::ops::Range<usize> {
        0..self.machine_count
    }

    pub fn periods(&self) -> std::ops::Range<usize> {
        0..self.horizon
    }
}

#[cfg(test)]
pub(crate) fn sample_problem() -> SchedulingProblem {
    SchedulingProblem {
        horizon: 10,
        machine_count: 5,
        machine_power: vec![100, 200, 150, 50, 25],
        required_periods: vec![
            vec![Interval::new(2, 4), Interval::new(5, 7)],
            vec![],
            vec![Interval::new(4, 8)],
            vec![Interval::new(1, 4), Interval::new(9, 10)],
            vec![Interval::new(2, 9)],
        ],
        total_time_on: vec![4, 1, 4, 4, 7],
    }
}
