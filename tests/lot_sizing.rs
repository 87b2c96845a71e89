//! Cut generation on the six-period lot-sizing instance, solved with HiGHS

#![cfg(feature = "highs")]

use std::sync::Arc;

use letsrefine::{
    CutGeneration, CutGenerationConfig, HighsSolver, LotSizingInstance, LotSizingReport,
    PassEvent, SilentObserver, SolverError, Tolerance,
};

const DEMANDS: [f64; 6] = [1.0, 3.0, 5.0, 3.0, 4.0, 2.0];
const SETUP_COSTS: [f64; 6] = [17.0, 16.0, 11.0, 6.0, 9.0, 6.0];
const PRODUCTION_COSTS: [f64; 6] = [5.0, 3.0, 2.0, 1.0, 3.0, 1.0];

fn instance() -> LotSizingInstance {
    LotSizingInstance::new(
        DEMANDS.to_vec(),
        SETUP_COSTS.to_vec(),
        PRODUCTION_COSTS.to_vec(),
    )
    .unwrap()
}

fn run() -> LotSizingReport {
    CutGeneration::new(Arc::new(HighsSolver::new()), CutGenerationConfig::default())
        .run(&instance(), &mut SilentObserver)
        .unwrap()
}

/// Cheapest plan over every set of open periods. Without holding costs each
/// period's demand is made in the cheapest open period up to it.
fn brute_force_optimum() -> f64 {
    let periods = DEMANDS.len();
    let mut best = f64::INFINITY;
    for mask in 0u32..(1 << periods) {
        let open = |t: usize| mask & (1 << t) != 0;
        let mut cost: f64 = (0..periods)
            .filter(|&t| open(t))
            .map(|t| SETUP_COSTS[t])
            .sum();
        let mut feasible = true;
        for t in 0..periods {
            let unit = (0..=t)
                .filter(|&s| open(s))
                .map(|s| PRODUCTION_COSTS[s])
                .fold(f64::INFINITY, f64::min);
            if unit.is_infinite() {
                if DEMANDS[t] > 0.0 {
                    feasible = false;
                    break;
                }
                continue;
            }
            cost += unit * DEMANDS[t];
        }
        if feasible {
            best = best.min(cost);
        }
    }
    best
}

#[test]
fn terminates_with_integral_setups() {
    let report = run();
    assert_eq!(report.periods.len(), 6);
    for plan in &report.periods {
        assert!(
            plan.setup.abs() < 1e-4 || (plan.setup - 1.0).abs() < 1e-4,
            "fractional setup {}",
            plan.setup
        );
        assert!(plan.production >= -1e-6);
        if plan.production > 1e-6 {
            assert!(plan.setup > 0.5);
        }
    }
    assert!(report.total_cuts() > 0);
    assert_eq!(report.lp_objectives.len(), report.passes);
}

#[test]
fn final_lp_matches_integer_optimum() {
    let report = run();
    let optimum = brute_force_optimum();
    assert!(
        (report.objective - optimum).abs() < 1e-4,
        "LP {} vs optimum {}",
        report.objective,
        optimum
    );
}

#[test]
fn plan_covers_cumulative_demand() {
    let report = run();
    let mut produced = 0.0;
    let mut demanded = 0.0;
    for plan in &report.periods {
        produced += plan.production;
        demanded += plan.demand;
        assert!(produced >= demanded - 1e-6);
    }
}

#[test]
fn lp_objective_never_decreases() {
    let report = run();
    for pair in report.lp_objectives.windows(2) {
        assert!(pair[0] <= pair[1] + 1e-6, "{:?}", report.lp_objectives);
    }
}

#[test]
fn every_cut_holds_at_the_final_plan() {
    let report = run();
    let prod: Vec<f64> = report.periods.iter().map(|p| p.production).collect();
    let setup: Vec<f64> = report.periods.iter().map(|p| p.setup).collect();
    for cut in &report.cuts {
        assert!(cut.is_satisfied_by(&prod, &setup, Tolerance::new(1e-5)));
    }
}

#[test]
fn observer_sees_console_lines() {
    let mut lines = Vec::new();
    let report = CutGeneration::new(Arc::new(HighsSolver::new()), CutGenerationConfig::default())
        .run(&instance(), &mut |event: &PassEvent| lines.push(event.to_string()))
        .unwrap();

    assert_eq!(lines.len(), report.passes);
    assert!(lines[0].starts_with("Pass 1 ("));
    assert!(lines
        .last()
        .unwrap()
        .contains(&format!("cuts added: 0 (total {})", report.total_cuts())));
}

#[test]
fn pass_budget_is_enforced() {
    let result = CutGeneration::new(
        Arc::new(HighsSolver::new()),
        CutGenerationConfig::default().with_max_passes(1),
    )
    .run(&instance(), &mut SilentObserver);
    // The plain relaxation always has a fractional setup to cut off
    assert!(matches!(result, Err(SolverError::IterationLimit(1))));
}
