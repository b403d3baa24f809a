//! End-to-end scheduling properties against the MILP engine

use itertools::Itertools;
use load_flattener::domain::{Interval, Schedule, SchedulingProblem};
use load_flattener::optimizer::{LoadFlattener, SolveParams, SolveResult, SolveStatus};
use proptest::prelude::*;
use std::time::Duration;

fn flattener() -> LoadFlattener {
    LoadFlattener::with_milp(SolveParams {
        time_limit: Some(Duration::from_secs(60)),
    })
}

fn factory_floor() -> SchedulingProblem {
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

/// Coverage, on-time, peak and period-total checks shared by every test
fn assert_schedule_properties(problem: &SchedulingProblem, result: &SolveResult) -> Schedule {
    assert!(result.status.has_solution(), "status {}", result.status);
    let schedule = result.schedule.clone().expect("solved result carries a schedule");
    let required = problem.required_schedule();

    for m in problem.machines() {
        for t in problem.periods() {
            if required.is_required(m, t) {
                assert!(schedule.is_on(m, t), "machine {m} off in required period {t}");
            }
        }
        assert_eq!(schedule.on_count(m), problem.total_time_on[m], "machine {m} on-time");
    }

    let period_power = schedule.period_power(&problem.machine_power);
    assert_eq!(result.period_totals, period_power);
    assert_eq!(
        result.objective,
        Some(period_power.iter().copied().max().unwrap_or(0))
    );

    schedule
}

/// Smallest achievable peak by enumerating every admissible schedule
fn brute_force_peak(problem: &SchedulingProblem) -> Option<i64> {
    let required = problem.required_schedule();
    let rows: Vec<Vec<Vec<usize>>> = problem
        .machines()
        .map(|m| {
            problem
                .periods()
                .combinations(problem.total_time_on[m])
                .filter(|on| {
                    problem
                        .periods()
                        .all(|t| !required.is_required(m, t) || on.contains(&t))
                })
                .collect()
        })
        .collect();

    rows.iter()
        .map(|options| options.iter())
        .multi_cartesian_product()
        .map(|choice| {
            problem
                .periods()
                .map(|t| {
                    choice
                        .iter()
                        .enumerate()
                        .filter(|(_, on)| on.contains(&t))
                        .map(|(m, _)| i64::from(problem.machine_power[m]))
                        .sum::<i64>()
                })
                .max()
                .unwrap_or(0)
        })
        .min()
}

#[test]
fn factory_floor_reaches_optimal_peak() {
    let problem = factory_floor();
    let result = flattener().solve(&problem).unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    let schedule = assert_schedule_properties(&problem, &result);

    // Required-only load peaks at 275 in periods 5 and 6; the 200 W machine
    // fits into any period whose required load is at most 75.
    let peak = result.objective.unwrap();
    assert_eq!(peak, 275);
    assert!(peak <= problem.total_power());
    assert!(!schedule.is_on(1, 5) && !schedule.is_on(1, 6));
    assert_eq!(brute_force_peak(&problem), Some(275));
}

#[test]
fn factory_floor_report_lists_every_machine() {
    let result = flattener().solve(&factory_floor()).unwrap();
    let report = result.render();

    assert!(report.starts_with("Status: OPTIMAL\nObjective Value: 275\n"));
    assert_eq!(report.lines().filter(|l| l.starts_with("[0") || l.starts_with("[1")).count(), 5);
}

#[test]
fn budget_below_required_periods_is_infeasible() {
    let mut problem = factory_floor();
    problem.total_time_on[4] = 3;

    let result = flattener().solve(&problem).unwrap();

    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result.schedule.is_none());
    assert!(result.objective.is_none());
}

#[test]
fn budget_above_horizon_is_infeasible() {
    let mut problem = factory_floor();
    problem.total_time_on[1] = 11;

    let result = flattener().solve(&problem).unwrap();
    assert_eq!(result.status, SolveStatus::Infeasible);
}

#[test]
fn required_overlap_cannot_be_shifted_away() {
    let problem = SchedulingProblem {
        horizon: 2,
        machine_count: 2,
        machine_power: vec![100, 100],
        required_periods: vec![vec![Interval::new(0, 1)], vec![Interval::new(0, 1)]],
        total_time_on: vec![1, 1],
    };

    let result = flattener().solve(&problem).unwrap();
    let schedule = assert_schedule_properties(&problem, &result);

    assert_eq!(result.objective, Some(200));
    assert!(schedule.is_on(0, 0) && schedule.is_on(1, 0));
}

#[test]
fn free_machines_spread_across_periods() {
    let problem = SchedulingProblem {
        horizon: 3,
        machine_count: 3,
        machine_power: vec![40, 40, 40],
        required_periods: vec![vec![], vec![], vec![]],
        total_time_on: vec![1, 1, 1],
    };

    let result = flattener().solve(&problem).unwrap();
    assert_schedule_properties(&problem, &result);
    assert_eq!(result.objective, Some(40));
    assert_eq!(result.period_totals, vec![40, 40, 40]);
}

#[test]
fn idle_problem_has_zero_peak() {
    let problem = SchedulingProblem {
        horizon: 4,
        machine_count: 2,
        machine_power: vec![10, 20],
        required_periods: vec![vec![], vec![]],
        total_time_on: vec![0, 0],
    };

    let result = flattener().solve(&problem).unwrap();
    assert_schedule_properties(&problem, &result);
    assert_eq!(result.objective, Some(0));
}

fn feasible_problems() -> impl Strategy<Value = SchedulingProblem> {
    (1usize..=5, 1usize..=3).prop_flat_map(|(horizon, machines)| {
        let machine = (
            0u32..=50,
            prop::collection::vec((0..horizon, 1..=horizon), 0..=2),
            0..=horizon,
        );
        prop::collection::vec(machine, machines).prop_map(move |drafts| {
            let mut problem = SchedulingProblem {
                horizon,
                machine_count: machines,
                machine_power: Vec::new(),
                required_periods: Vec::new(),
                total_time_on: Vec::new(),
            };
            let mut extras = Vec::with_capacity(machines);
            for (power, intervals, extra) in drafts {
                problem.machine_power.push(power);
                problem.required_periods.push(
                    intervals
                        .into_iter()
                        .map(|(start, len)| Interval::new(start, (start + len).min(horizon)))
                        .collect(),
                );
                problem.total_time_on.push(0);
                extras.push(extra);
            }
            let required = problem.required_schedule();
            for (m, extra) in extras.into_iter().enumerate() {
                problem.total_time_on[m] = (required.required_count(m) + extra).min(horizon);
            }
            problem
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, ..ProptestConfig::default() })]

    #[test]
    fn solved_schedules_satisfy_every_property(problem in feasible_problems()) {
        let result = flattener().solve(&problem).unwrap();

        prop_assert_eq!(result.status, SolveStatus::Optimal);
        assert_schedule_properties(&problem, &result);
        prop_assert_eq!(result.objective, brute_force_peak(&problem));
    }
}
