use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::Schedule;
use crate::model::{Assignment, ConstraintModel};

/// Outcome of one solve, as reported by the engine
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal assignment
    Optimal,
    /// Valid assignment, optimality not proven
    Feasible,
    /// No assignment satisfies the constraints
    Infeasible,
    /// The model itself is malformed
    ModelInvalid,
    /// No conclusion, e.g. the time limit was reached
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveParams {
    /// Wall-clock budget for the engine; `None` waits indefinitely
    pub time_limit: Option<Duration>,
}

/// Raw engine answer, in model terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverResponse {
    pub status: SolveStatus,
    pub assignment: Option<Assignment>,
    pub objective: Option<i64>,
    pub diagnostic: Option<String>,
}

impl SolverResponse {
    pub fn solved(status: SolveStatus, assignment: Assignment, objective: i64) -> Self {
        Self {
            status,
            assignment: Some(assignment),
            objective: Some(objective),
            diagnostic: None,
        }
    }

    pub fn failed(status: SolveStatus, diagnostic: impl Into<String>) -> Self {
        Self {
            status,
            assignment: None,
            objective: None,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Engine seam: anything able to minimise a [`ConstraintModel`]
pub trait ConstraintSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &ConstraintModel, params: &SolveParams) -> SolverResponse;

    /// Free solve slots, `None` for engines without a concurrency bound
    fn idle_workers(&self) -> Option<usize> {
        None
    }
}

/// Result of scheduling one problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: SolveStatus,
    /// Peak power, present when `status` carries a solution
    pub objective: Option<i64>,
    pub schedule: Option<Schedule>,
    /// Total draw of each period, empty without a solution
    pub period_totals: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub solver: String,
    pub elapsed_ms: u64,
}

impl SolveResult {
    pub fn without_solution(
        status: SolveStatus,
        diagnostic: Option<String>,
        solver: &str,
        elapsed: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            status,
            objective: None,
            schedule: None,
            period_totals: Vec::new(),
            diagnostic,
            solver: solver.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn has_solution(&self) -> bool {
        self.status.has_solution() && self.schedule.is_some()
    }

    /// Plain-text report: status, diagnostic, objective, per-period totals
    /// and one on/off row per machine.
    pub fn render(&self) -> String {
        let mut out = format!("Status: {}\n", self.status);
        if let Some(diagnostic) = &self.diagnostic {
            out.push_str(&format!("Diagnostic: {diagnostic}\n"));
        }
        if let Some(objective) = self.objective {
            out.push_str(&format!("Objective Value: {objective}\n"));
        }
        if !self.period_totals.is_empty() {
            out.push_str(&format!("{:?}\n", self.period_totals));
        }
        if let Some(schedule) = &self.schedule {
            out.push_str(&schedule.to_string());
        }
        out
    }
}
