// Column generation for cutting stock
//
// Root-node only: once pricing converges (or the column budget runs out) the
// integer model is solved over the patterns found so far. The result is a
// valid plan and an upper bound on the minimum roll count, not a proven
// optimum.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::pricing::KnapsackOracle;
use super::reporting::{PassEvent, PassObserver};
use crate::domain::{
    cutting_stock::{CuttingStockInstance, Pattern},
    models::{LinearExpr, Model, SolverConfig},
    session::SolverSession,
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintHandle, ConstraintType, OptimizationType, Tolerance, VariableHandle,
        VariableType,
    },
};

/// Default cap on generated columns.
pub const DEFAULT_MAX_COLUMNS: usize = 10;

#[derive(Debug, Clone)]
pub struct ColumnGenerationConfig {
    /// Maximum number of pricing passes, hence of generated patterns
    pub max_columns: usize,
    pub tolerance: Tolerance,
    pub solver: SolverConfig,
}

impl ColumnGenerationConfig {
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

impl Default for ColumnGenerationConfig {
    fn default() -> Self {
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            tolerance: Tolerance::default(),
            solver: SolverConfig::default(),
        }
    }
}

/// The restricted master problem: one integer variable per pattern and one
/// covering row per width.
#[derive(Debug, Clone)]
pub struct CuttingStockMaster {
    patterns: Vec<Pattern>,
    demand_rows: Vec<ConstraintHandle>,
    tolerance: Tolerance,
}

impl CuttingStockMaster {
    /// Declare the demand rows and seed the model with the trivial patterns,
    /// which alone already cover every demand.
    pub fn build(
        session: &mut SolverSession,
        instance: &CuttingStockInstance,
        tolerance: Tolerance,
    ) -> Result<Self> {
        session.set_objective(LinearExpr::new(), OptimizationType::Minimize);
        let demand_rows = instance
            .demands()
            .iter()
            .enumerate()
            .map(|(i, &demand)| {
                session.create_constraint(
                    format!("demand_{}", i + 1),
                    LinearExpr::new(),
                    ConstraintType::GreaterThanOrEqual,
                    f64::from(demand),
                )
            })
            .collect();

        let mut master = Self {
            patterns: Vec::with_capacity(instance.num_widths()),
            demand_rows,
            tolerance,
        };
        for j in 0..instance.num_widths() {
            master.add_pattern(session, instance, instance.trivial_pattern(j, tolerance))?;
        }
        Ok(master)
    }

    /// Add a pattern column: cost 1 in the objective, `quantities[i]` in
    /// every demand row it serves, and an upper bound of the most rolls
    /// any single width could ever need from it.
    pub fn add_pattern(
        &mut self,
        session: &mut SolverSession,
        instance: &CuttingStockInstance,
        quantities: Vec<u32>,
    ) -> Result<&Pattern> {
        if quantities.len() != self.demand_rows.len() {
            return Err(SolverError::InvalidProblem(format!(
                "pattern has {} entries for {} widths",
                quantities.len(),
                self.demand_rows.len()
            )));
        }
        if !instance.fits_roll(&quantities, self.tolerance) {
            return Err(SolverError::InvalidProblem(format!(
                "pattern {:?} is wider than the raw roll",
                quantities
            )));
        }

        let variable = session.create_variable(
            format!("pat_{}", self.patterns.len() + 1),
            VariableType::Integer,
            0.0,
            None,
        );
        session.add_term_to_objective(variable, 1.0)?;
        for (&row, &q) in self.demand_rows.iter().zip(&quantities) {
            if q > 0 {
                session.add_term_to_constraint(row, variable, f64::from(q))?;
            }
        }
        let upper_bound = instance.pattern_upper_bound(&quantities);
        session.set_variable_upper_bound(variable, upper_bound)?;
        debug!(pattern = ?quantities, upper_bound, "pattern added");

        self.patterns.push(Pattern {
            quantities,
            variable,
            upper_bound,
        });
        Ok(&self.patterns[self.patterns.len() - 1])
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn demand_rows(&self) -> &[ConstraintHandle] {
        &self.demand_rows
    }

    pub fn variables(&self) -> Vec<VariableHandle> {
        self.patterns.iter().map(|p| p.variable).collect()
    }
}

/// Result of a column-generation run.
#[derive(Debug, Clone)]
pub struct CuttingStockReport {
    /// Total rolls in the final integer solution
    pub rolls: f64,
    /// LP objective at every pass, in order
    pub lp_objectives: Vec<f64>,
    /// Demand-row duals of the last LP solved
    pub final_duals: Vec<f64>,
    pub patterns: Vec<Pattern>,
    /// Rolls cut with each pattern, parallel to `patterns`
    pub rolls_per_pattern: Vec<f64>,
    pub passes: usize,
    /// False when the column budget ran out before pricing converged
    pub converged: bool,
    pub elapsed: Duration,
    pub solver_backend: String,
}

impl CuttingStockReport {
    /// Patterns beyond the trivial ones.
    pub fn generated_patterns(&self, num_widths: usize) -> &[Pattern] {
        self.patterns.get(num_widths..).unwrap_or(&[])
    }
}

impl fmt::Display for CuttingStockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "({:.3} sec) Optimal solution: {} rolls, {} patterns",
            self.elapsed.as_secs_f64(),
            self.rolls,
            self.patterns.len()
        )?;
        write!(f, "   Rolls per pattern: ")?;
        for rolls in &self.rolls_per_pattern {
            write!(f, "{}, ", rolls)?;
        }
        if !self.converged {
            write!(f, "\n   (column budget exhausted before pricing converged)")?;
        }
        Ok(())
    }
}

pub struct ColumnGeneration {
    solver: Arc<dyn SolverService>,
    config: ColumnGenerationConfig,
}

impl ColumnGeneration {
    pub fn new(solver: Arc<dyn SolverService>, config: ColumnGenerationConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &ColumnGenerationConfig {
        &self.config
    }

    /// Price patterns against the demand duals until no pattern has negative
    /// reduced cost or the column budget is spent, then solve the integer
    /// master over every pattern found.
    pub fn run(
        &self,
        instance: &CuttingStockInstance,
        observer: &mut dyn PassObserver,
    ) -> Result<CuttingStockReport> {
        let start = Instant::now();
        let tolerance = self.config.tolerance;
        let mut session = SolverSession::new(Arc::clone(&self.solver), Model::new("CutStock"))
            .with_config(self.config.solver.clone());
        let mut master = CuttingStockMaster::build(&mut session, instance, tolerance)?;
        let oracle = KnapsackOracle::new(Arc::clone(&self.solver)).with_tolerance(tolerance);

        info!(
            widths = instance.num_widths(),
            raw_width = instance.raw_width(),
            max_columns = self.config.max_columns,
            backend = self.solver.name(),
            "starting column generation"
        );

        let mut lp_objectives = Vec::new();
        let mut final_duals = Vec::new();
        let mut converged = false;
        let mut passes = 0;

        for pass in 1..=self.config.max_columns {
            passes = pass;
            let objective = session.solve_relaxation()?;
            let basis = session.save_basis()?;
            lp_objectives.push(objective);

            let duals = session.get_dual_values(master.demand_rows())?;
            let priced = oracle.solve(
                &duals,
                instance.widths(),
                instance.raw_width(),
                instance.demands(),
            )?;
            final_duals = duals;

            if !tolerance.improves_on(priced.value, 1.0) {
                session.release_basis(basis);
                info!(pass, objective, pricing_value = priced.value, "no profitable column");
                observer.on_pass(&PassEvent::PricingConverged {
                    pass,
                    elapsed: start.elapsed(),
                    objective,
                    pricing_value: priced.value,
                });
                converged = true;
                break;
            }

            if !instance.is_feasible_pattern(&priced.quantities, tolerance) {
                return Err(SolverError::ExecutionFailed(format!(
                    "pricing returned infeasible pattern {:?}",
                    priced.quantities
                )));
            }

            let pattern = master.add_pattern(&mut session, instance, priced.quantities)?;
            let distribution: Vec<(f64, u32)> = instance
                .widths()
                .iter()
                .copied()
                .zip(pattern.quantities.iter().copied())
                .collect();
            let total_width = instance.pattern_width(&pattern.quantities);
            info!(
                pass,
                objective,
                reduced_cost = priced.value - 1.0,
                pattern = ?pattern.quantities,
                "column added"
            );
            observer.on_pass(&PassEvent::ColumnAdded {
                pass,
                elapsed: start.elapsed(),
                objective,
                reduced_cost: priced.value - 1.0,
                distribution,
                total_width,
            });

            session.reload_model()?;
            session.load_basis(&basis)?;
            session.release_basis(basis);
        }

        if !converged {
            info!(
                passes,
                patterns = master.patterns().len(),
                "column budget exhausted"
            );
            observer.on_pass(&PassEvent::ColumnBudgetExhausted {
                passes,
                elapsed: start.elapsed(),
                columns: master.patterns().len(),
            });
        }

        let rolls = session.solve_integer()?;
        let rolls_per_pattern = session.get_solution_values(&master.variables())?;
        let report = CuttingStockReport {
            rolls,
            lp_objectives,
            final_duals,
            patterns: master.patterns().to_vec(),
            rolls_per_pattern,
            passes,
            converged,
            elapsed: start.elapsed(),
            solver_backend: self.solver.name().to_string(),
        };
        info!(
            rolls = report.rolls,
            patterns = report.patterns.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "cutting stock solved"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{basis::Basis, models::Solution, value_objects::SolveMode};

    struct Unused;

    impl SolverService for Unused {
        fn solve(
            &self,
            _model: &Model,
            _mode: SolveMode,
            _config: &SolverConfig,
            _warm_start: Option<&Basis>,
        ) -> Result<Solution> {
            Err(SolverError::ExecutionFailed("not solving".to_string()))
        }

        fn name(&self) -> &str {
            "unused"
        }

        fn supports_mip(&self) -> bool {
            true
        }

        fn supports_duals(&self) -> bool {
            true
        }
    }

    fn instance() -> CuttingStockInstance {
        CuttingStockInstance::new(
            vec![17.0, 21.0, 22.5, 24.0, 29.5],
            vec![150, 96, 48, 108, 227],
            94.0,
        )
        .unwrap()
    }

    #[test]
    fn test_master_starts_with_trivial_patterns() {
        let instance = instance();
        let mut session = SolverSession::new(Arc::new(Unused), Model::new("CutStock"));
        let master =
            CuttingStockMaster::build(&mut session, &instance, Tolerance::default()).unwrap();

        assert_eq!(master.patterns().len(), 5);
        assert_eq!(master.demand_rows().len(), 5);
        let bounds: Vec<f64> = master.patterns().iter().map(|p| p.upper_bound).collect();
        assert_eq!(bounds, vec![30.0, 24.0, 12.0, 36.0, 76.0]);

        let model = session.model();
        assert_eq!(model.num_variables(), 5);
        let row = model.constraint(master.demand_rows()[4]).unwrap();
        assert_eq!(row.bound, 227.0);
        assert_eq!(row.expression.coefficient(master.patterns()[4].variable), 3.0);
        assert_eq!(row.expression.coefficient(master.patterns()[0].variable), 0.0);
    }

    #[test]
    fn test_added_pattern_enters_every_served_row() {
        let instance = instance();
        let mut session = SolverSession::new(Arc::new(Unused), Model::new("CutStock"));
        let mut master =
            CuttingStockMaster::build(&mut session, &instance, Tolerance::default()).unwrap();

        let variable = master
            .add_pattern(&mut session, &instance, vec![1, 0, 0, 0, 2])
            .unwrap()
            .variable;
        let model = session.model();
        assert_eq!(model.objective().expression.coefficient(variable), 1.0);
        assert_eq!(model.variable(variable).unwrap().upper_bound, Some(150.0));
        let rows = master.demand_rows();
        assert_eq!(model.constraint(rows[0]).unwrap().expression.coefficient(variable), 1.0);
        assert_eq!(model.constraint(rows[4]).unwrap().expression.coefficient(variable), 2.0);
        assert!(model.constraint(rows[1]).unwrap().expression.terms().len() == 1);
    }

    #[test]
    fn test_too_wide_pattern_is_rejected() {
        let instance = instance();
        let mut session = SolverSession::new(Arc::new(Unused), Model::new("CutStock"));
        let mut master =
            CuttingStockMaster::build(&mut session, &instance, Tolerance::default()).unwrap();
        assert!(master
            .add_pattern(&mut session, &instance, vec![0, 0, 0, 0, 4])
            .is_err());
        assert_eq!(master.patterns().len(), 5);
    }

    #[test]
    fn test_inexact_widths_are_accepted_within_tolerance() {
        let instance = CuttingStockInstance::new(vec![0.1], vec![10], 0.3).unwrap();
        let mut session = SolverSession::new(Arc::new(Unused), Model::new("CutStock"));
        let mut master =
            CuttingStockMaster::build(&mut session, &instance, Tolerance::default()).unwrap();

        assert_eq!(master.patterns()[0].quantities, vec![3]);
        assert_eq!(master.patterns()[0].upper_bound, 4.0);
        // a second copy of the full roll is still a valid column
        assert!(master.add_pattern(&mut session, &instance, vec![3]).is_ok());
        assert!(master.add_pattern(&mut session, &instance, vec![4]).is_err());
        assert_eq!(master.patterns().len(), 2);
    }
}
