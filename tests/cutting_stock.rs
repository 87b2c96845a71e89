//! Column generation on the paper-roll instance, solved with HiGHS

#![cfg(feature = "highs")]

use std::sync::Arc;

use letsrefine::application::CuttingStockMaster;
use letsrefine::{
    ColumnGeneration, ColumnGenerationConfig, CuttingStockInstance, CuttingStockReport,
    HighsSolver, KnapsackOracle, Model, PassEvent, SilentObserver, SolverSession, Tolerance,
};

const EPS: f64 = 1e-6;

fn tolerance() -> Tolerance {
    Tolerance::new(EPS)
}

fn paper_rolls() -> CuttingStockInstance {
    CuttingStockInstance::new(
        vec![17.0, 21.0, 22.5, 24.0, 29.5],
        vec![150, 96, 48, 108, 227],
        94.0,
    )
    .unwrap()
}

fn run(max_columns: usize) -> CuttingStockReport {
    let generation = ColumnGeneration::new(
        Arc::new(HighsSolver::new()),
        ColumnGenerationConfig::default().with_max_columns(max_columns),
    );
    generation.run(&paper_rolls(), &mut SilentObserver).unwrap()
}

fn assert_covers_demand(report: &CuttingStockReport, instance: &CuttingStockInstance) {
    for (i, &demand) in instance.demands().iter().enumerate() {
        let served: f64 = report
            .patterns
            .iter()
            .zip(&report.rolls_per_pattern)
            .map(|(p, &rolls)| f64::from(p.quantities[i]) * rolls)
            .sum();
        assert!(
            served >= f64::from(demand) - EPS,
            "width {} served {} of {}",
            i,
            served,
            demand
        );
    }
}

#[test]
fn trivial_patterns_alone_need_178_rolls() {
    let report = run(0);
    assert_eq!(report.patterns.len(), 5);
    assert!((report.rolls - 178.0).abs() < EPS);
    assert!(!report.converged);
    assert!(report.lp_objectives.is_empty());
    assert_covers_demand(&report, &paper_rolls());
}

#[test]
fn default_budget_improves_on_trivial_patterns() {
    let instance = paper_rolls();
    let report = run(10);

    assert!(report.rolls <= 178.0 + EPS);
    // Total width demanded is 14934.5, so at least 159 rolls
    assert!(report.rolls >= 159.0 - EPS);
    assert!(report.passes <= 10);
    assert_eq!(report.rolls_per_pattern.len(), report.patterns.len());
    assert_covers_demand(&report, &instance);

    for pattern in report.generated_patterns(instance.num_widths()) {
        assert!(instance.is_feasible_pattern(&pattern.quantities, tolerance()));
    }
    for (pattern, &rolls) in report.patterns.iter().zip(&report.rolls_per_pattern) {
        assert!(rolls <= pattern.upper_bound + EPS);
    }
}

#[test]
fn lp_objective_never_increases() {
    let report = run(10);
    assert!(!report.lp_objectives.is_empty());
    for pair in report.lp_objectives.windows(2) {
        assert!(pair[1] <= pair[0] + EPS, "{:?}", report.lp_objectives);
    }
    // The trivial LP needs sum(d_j / floor(94 / w_j)) rolls
    let trivial = 150.0 / 5.0 + 96.0 / 4.0 + 48.0 / 4.0 + 108.0 / 3.0 + 227.0 / 3.0;
    assert!((report.lp_objectives[0] - trivial).abs() < 1e-4);
}

#[test]
fn converged_duals_price_out_every_pattern() {
    let instance = paper_rolls();
    let report = run(100);
    assert!(report.converged);
    assert_eq!(report.patterns.len(), instance.num_widths() + report.passes - 1);

    // No feasible pattern has negative reduced cost at the final duals
    let limits: Vec<u32> = instance
        .widths()
        .iter()
        .zip(instance.demands())
        .map(|(&w, &d)| d.min((instance.raw_width() / w).floor() as u32))
        .collect();
    let mut pattern = vec![0u32; limits.len()];
    loop {
        if instance.is_feasible_pattern(&pattern, tolerance()) {
            let price: f64 = pattern
                .iter()
                .zip(&report.final_duals)
                .map(|(&q, pi)| f64::from(q) * pi)
                .sum();
            assert!(price <= 1.0 + EPS, "{:?} prices at {}", pattern, price);
        }
        // odometer over the box
        let mut i = 0;
        while i < pattern.len() && pattern[i] == limits[i] {
            pattern[i] = 0;
            i += 1;
        }
        if i == pattern.len() {
            break;
        }
        pattern[i] += 1;
    }
}

#[test]
fn column_from_converged_duals_does_not_improve_lp() {
    let instance = paper_rolls();
    let report = run(100);
    let last_lp = *report.lp_objectives.last().unwrap();

    let solver = Arc::new(HighsSolver::new());
    let mut session = SolverSession::new(solver.clone(), Model::new("CutStock"));
    let mut master = CuttingStockMaster::build(&mut session, &instance, tolerance()).unwrap();
    for pattern in report.generated_patterns(instance.num_widths()) {
        master
            .add_pattern(&mut session, &instance, pattern.quantities.clone())
            .unwrap();
    }
    let before = session.solve_relaxation().unwrap();
    assert!((before - last_lp).abs() < 1e-4);

    let priced = KnapsackOracle::new(solver)
        .solve(
            &report.final_duals,
            instance.widths(),
            instance.raw_width(),
            instance.demands(),
        )
        .unwrap();
    master
        .add_pattern(&mut session, &instance, priced.quantities)
        .unwrap();
    let after = session.solve_relaxation().unwrap();
    assert!(after >= before - 1e-4, "{} improved on {}", after, before);
}

#[test]
fn observer_sees_one_event_per_pass() {
    let mut events = Vec::new();
    let generation = ColumnGeneration::new(
        Arc::new(HighsSolver::new()),
        ColumnGenerationConfig::default(),
    );
    let report = generation
        .run(&paper_rolls(), &mut |event: &PassEvent| events.push(event.clone()))
        .unwrap();

    let passes = events.iter().filter(|e| e.objective().is_some()).count();
    assert_eq!(passes, report.passes);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    for event in &events {
        if let PassEvent::ColumnAdded {
            reduced_cost,
            total_width,
            ..
        } = event
        {
            assert!(*reduced_cost > 0.0);
            assert!(*total_width <= 94.0 + EPS);
        }
    }
}
