use crate::domain::{
    basis::Basis,
    models::{Model, Solution as DomainSolution, SolverConfig, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, SolveMode,
    },
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable, WithInitialSolution,
};
use std::time::Instant;
use tracing::trace;

/// CBC through good_lp. Solves relaxations and integer programs but does not
/// expose row duals, so it cannot drive pricing.
pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
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

        // Build variables using good_lp
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(num_vars);

        for var_def in model.variables() {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let var = if mode == SolveMode::Integer && var_def.is_integer() {
                vars.add(variable().integer().min(lower).max(upper))
            } else {
                vars.add(variable().min(lower).max(upper))
            };
            lp_variables.push(var);
        }

        // Build objective expression
        let is_maximize = model.objective().optimization_type == OptimizationType::Maximize;
        let mut obj_expr: Expression = 0.into();

        for (i, &coeff) in costs.iter().enumerate() {
            if coeff != 0.0 {
                // good_lp minimises, so negate for maximization
                let c = if is_maximize { -coeff } else { coeff };
                obj_expr += c * lp_variables[i];
            }
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);
        if !config.verbose {
            lp_model.set_parameter("log", "0");
        }
        if !config.presolve {
            lp_model.set_parameter("preprocess", "off");
            lp_model.set_parameter("presolve", "off");
        }
        if !config.automatic_cuts {
            lp_model.set_parameter("cuts", "off");
        }
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("sec", &limit.to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }

        // CBC takes the snapshot's primal values as its starting solution
        if let Some(basis) = warm_start {
            let start = basis.column_start(num_vars);
            lp_model = lp_model.with_initial_solution(lp_variables.iter().copied().zip(start));
            trace!(basis = basis.id, "initial solution loaded");
        }

        // Build constraints
        for constraint in model.constraints() {
            let mut lhs: Expression = 0.into();
            for (var, coeff) in constraint.expression.terms() {
                if *coeff != 0.0 {
                    lhs += *coeff * lp_variables[var.index()];
                }
            }

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        let solution_result = lp_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);

        match solution_result {
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();

                // Calculate actual objective value
                let actual_obj: f64 = costs
                    .iter()
                    .zip(&variable_values)
                    .map(|(c, v)| c * v)
                    .sum();

                let mut solution = DomainSolution::optimal(mode, actual_obj, variable_values)
                    .with_statistics(statistics);
                solution.message = format!("Optimal {} found for '{}'", mode, model.name);

                Ok(solution)
            }
            Err(ResolutionError::Infeasible) => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                mode,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Unbounded) => Ok(DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                mode,
                "Problem is unbounded: objective can be improved infinitely",
            )
            .with_statistics(statistics)),
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }

    fn supports_duals(&self) -> bool {
        false
    }

    fn supports_warm_start(&self) -> bool {
        true
    }
}
