// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// Translates the domain model into a HiGHS row problem on every solve

use crate::domain::{
    basis::Basis,
    models::{Model, Solution as DomainSolution, SolverConfig, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, SolveMode,
    },
};
use highs::{HighsModelStatus, RowProblem, Sense};
use std::time::Instant;
use tracing::{debug, trace};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(
        &self,
        model: &Model,
        mode: SolveMode,
        config: &SolverConfig,
        warm_start: Option<&Basis>,
    ) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();
        let num_vars = model.num_variables();
        let costs = model.objective().dense_coefficients(num_vars);

        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(num_vars);

        // Add columns; integrality only survives in integer mode
        for (var_def, &cost) in model.variables().iter().zip(&costs) {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let col = if mode == SolveMode::Integer && var_def.is_integer() {
                pb.add_integer_column(cost, lower..=upper)
            } else {
                pb.add_column(cost, lower..=upper)
            };
            cols.push(col);
        }

        // Add rows
        for constraint in model.constraints() {
            let terms: Vec<_> = constraint
                .expression
                .terms()
                .iter()
                .filter(|(_, coeff)| *coeff != 0.0)
                .map(|(var, coeff)| (cols[var.index()], *coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = if model.objective().optimization_type == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let mut highs_model = pb.optimise(sense);
        if !config.verbose {
            highs_model.make_quiet();
        }
        if !config.presolve {
            highs_model.set_option("presolve", "off");
        }
        if let Some(limit) = config.time_limit {
            highs_model.set_option("time_limit", limit);
        }
        if mode == SolveMode::Integer {
            let gap = config.gap_tolerance.unwrap_or(0.0);
            highs_model.set_option("mip_rel_gap", gap);
        }
        if !config.automatic_cuts && mode == SolveMode::Integer {
            debug!("HiGHS has no switch for automatic MIP cuts; running with defaults");
        }

        // HiGHS builds a simplex basis from a supplied LP point. A MIP would
        // instead try to complete the fractional point into an incumbent.
        match (warm_start, mode) {
            (Some(basis), SolveMode::Relaxation) => {
                let columns = basis.column_start(num_vars);
                let duals = basis.dual_start(model.num_constraints());
                highs_model
                    .try_set_solution(Some(columns.as_slice()), None, None, duals.as_deref())
                    .map_err(|status| {
                        SolverError::ExecutionFailed(format!(
                            "HiGHS rejected warm start from basis {}: {:?}",
                            basis.id, status
                        ))
                    })?;
                trace!(basis = basis.id, "warm start loaded");
            }
            (Some(basis), SolveMode::Integer) => {
                trace!(basis = basis.id, "LP basis ignored for integer solve");
            }
            (None, _) => {}
        }

        let solved = highs_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);

        match solved.status() {
            HighsModelStatus::Optimal => {
                let solution_data = solved.get_solution();
                let variable_values = solution_data.columns().to_vec();

                // Calculate objective value from the column values
                let actual_obj: f64 = variable_values
                    .iter()
                    .zip(&costs)
                    .map(|(value, cost)| value * cost)
                    .sum();

                let dual_values = match mode {
                    SolveMode::Relaxation => solution_data.dual_rows().to_vec(),
                    SolveMode::Integer => Vec::new(),
                };

                let mut solution = DomainSolution::optimal(mode, actual_obj, variable_values)
                    .with_duals(dual_values)
                    .with_statistics(statistics);
                solution.message = format!("Optimal {} found for '{}'", mode, model.name);

                Ok(solution)
            }
            HighsModelStatus::Infeasible => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                mode,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(DomainSolution::new(
                    DomainSolutionStatus::Unbounded,
                    mode,
                    "Problem is unbounded: objective can be improved infinitely",
                )
                .with_statistics(statistics))
            }
            HighsModelStatus::ReachedTimeLimit => Ok(DomainSolution::new(
                DomainSolutionStatus::TimeLimit,
                mode,
                format!(
                    "Time limit of {}s reached",
                    config.time_limit.unwrap_or_default()
                ),
            )
            .with_statistics(statistics)),
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }

    fn supports_duals(&self) -> bool {
        true
    }

    fn supports_warm_start(&self) -> bool {
        true
    }
}
