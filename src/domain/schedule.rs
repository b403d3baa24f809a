use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-(machine, period) "must be on" matrix derived from the required periods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSchedule {
    horizon: usize,
    cells: Vec<bool>,
}

impl RequiredSchedule {
    /// All-false matrix. A grid whose size overflows `usize` is left empty;
    /// [`SchedulingProblem::validate`](super::SchedulingProblem::validate)
    /// rejects such problems.
    pub fn new(machine_count: usize, horizon: usize) -> Self {
        let cells = machine_count.checked_mul(horizon).unwrap_or(0);
        Self {
            horizon,
            cells: vec![false; cells],
        }
    }

    pub(crate) fn set(&mut self, machine: usize, t: usize) {
        if let Some(cell) = self.index(machine, t).and_then(|i| self.cells.get_mut(i)) {
            *cell = true;
        }
    }

    pub fn is_required(&self, machine: usize, t: usize) -> bool {
        self.index(machine, t)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Number of required periods of one machine
    pub fn required_count(&self, machine: usize) -> usize {
        self.row(machine).iter().filter(|&&c| c).count()
    }

    pub fn total_required(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Every required `(machine, period)` cell, machine-major
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let horizon = self.horizon;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(move |(i, _)| (i / horizon, i % horizon))
    }

    fn row(&self, machine: usize) -> &[bool] {
        machine
            .checked_mul(self.horizon)
            .and_then(|start| self.cells.get(start..start.checked_add(self.horizon)?))
            .unwrap_or(&[])
    }

    fn index(&self, machine: usize, t: usize) -> Option<usize> {
        if t >= self.horizon {
            return None;
        }
        machine.checked_mul(self.horizon)?.checked_add(t)
    }
}

/// Solved on/off plan: `rows[m][t]` is true when machine `m` runs in period `t`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    rows: Vec<Vec<bool>>,
}

impl Schedule {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    pub fn machine_count(&self) -> usize {
        self.rows.len()
    }

    pub fn horizon(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_on(&self, machine: usize, t: usize) -> bool {
        self.rows
            .get(machine)
            .and_then(|row| row.get(t))
            .copied()
            .unwrap_or(false)
    }

    /// Number of periods a machine is on
    pub fn on_count(&self, machine: usize) -> usize {
        self.rows
            .get(machine)
            .map_or(0, |row| row.iter().filter(|&&on| on).count())
    }

    /// Total draw of each period for the given per-machine power
    pub fn period_power(&self, machine_power: &[u32]) -> Vec<i64> {
        (0..self.horizon())
            .map(|t| {
                self.rows
                    .iter()
                    .zip(machine_power)
                    .filter(|(row, _)| row.get(t).copied().unwrap_or(false))
                    .map(|(_, &p)| i64::from(p))
                    .sum()
            })
            .collect()
    }

    /// Largest per-period draw
    pub fn peak_power(&self, machine_power: &[u32]) -> i64 {
        self.period_power(machine_power).into_iter().max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let cells: String = row.iter().map(|&on| if on { '1' } else { '0' }).collect();
            writeln!(f, "[{cells}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Schedule {
        Schedule::from_rows(vec![
            vec![true, true, false, false],
            vec![false, true, true, false],
            vec![false, false, false, true],
        ])
    }

    #[test]
    fn test_on_count() {
        let s = schedule();
        assert_eq!(s.on_count(0), 2);
        assert_eq!(s.on_count(2), 1);
        assert_eq!(s.on_count(7), 0);
    }

    #[test]
    fn test_period_power_and_peak() {
        let s = schedule();
        let power = [100, 200, 50];
        assert_eq!(s.period_power(&power), vec![100, 300, 200, 50]);
        assert_eq!(s.peak_power(&power), 300);
    }

    #[test]
    fn test_display_renders_rows() {
        assert_eq!(schedule().to_string(), "[1100]\n[0110]\n[0001]\n");
    }

    #[test]
    fn test_required_cells_iterate_machine_major() {
        let mut required = RequiredSchedule::new(2, 3);
        required.set(1, 0);
        required.set(0, 2);

        assert_eq!(required.cells().collect::<Vec<_>>(), vec![(0, 2), (1, 0)]);
        assert_eq!(required.total_required(), 2);
        assert!(!required.is_required(0, 3));
    }

    #[test]
    fn test_overflowing_grid_stays_empty() {
        let mut required = RequiredSchedule::new(usize::MAX, 2);
        required.set(usize::MAX - 1, 1);

        assert_eq!(required.total_required(), 0);
        assert!(!required.is_required(usize::MAX - 1, 1));
        assert_eq!(required.required_count(usize::MAX - 1), 0);
    }
}
