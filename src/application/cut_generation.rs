// Cut generation for uncapacitated lot sizing
//
// Repeatedly solves the LP relaxation and adds every violated (l,S)
// inequality until none is violated. For this problem class the final LP
// optimum is integral in the setups, so no integer solve follows.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::reporting::{PassEvent, PassObserver};
use super::separation::{CutSeparator, CutTerm, LsCut};
use crate::domain::{
    lot_sizing::LotSizingInstance,
    models::{LinearExpr, Model, SolverConfig},
    session::SolverSession,
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintHandle, ConstraintType, OptimizationType, Tolerance, VariableHandle,
        VariableType,
    },
};

pub const DEFAULT_MAX_PASSES: usize = 1000;

#[derive(Debug, Clone)]
pub struct CutGenerationConfig {
    /// Passes allowed before giving up with `IterationLimit`
    pub max_passes: usize,
    pub tolerance: Tolerance,
    /// Presolve and automatic cuts are switched off regardless of this value
    pub solver: SolverConfig,
}

impl CutGenerationConfig {
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
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

impl Default for CutGenerationConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            tolerance: Tolerance::default(),
            solver: SolverConfig::default(),
        }
    }
}

/// Production and setup variables of the base lot-sizing model.
#[derive(Debug, Clone)]
pub struct LotSizingModel {
    prod: Vec<VariableHandle>,
    setup: Vec<VariableHandle>,
    cuts: Vec<ConstraintHandle>,
}

impl LotSizingModel {
    pub fn build(session: &mut SolverSession, instance: &LotSizingInstance) -> Self {
        let periods = instance.periods();
        let mut prod = Vec::with_capacity(periods);
        let mut setup = Vec::with_capacity(periods);
        for t in 0..periods {
            prod.push(session.create_variable(
                format!("prod{}", t + 1),
                VariableType::Continuous,
                0.0,
                None,
            ));
            setup.push(session.create_variable(
                format!("setup{}", t + 1),
                VariableType::Binary,
                0.0,
                Some(1.0),
            ));
        }

        let mut cost = LinearExpr::new();
        for t in 0..periods {
            cost.add_term(setup[t], instance.setup_costs()[t]);
            cost.add_term(prod[t], instance.production_costs()[t]);
        }
        session.set_objective(cost, OptimizationType::Minimize);

        // Production in t only with a setup in t, and never more than what
        // is still to be delivered
        let demand = instance.cumulative();
        for t in 0..periods {
            session.create_constraint(
                format!("production{}", t + 1),
                LinearExpr::new()
                    .with_term(prod[t], 1.0)
                    .with_term(setup[t], -demand.remaining(t)),
                ConstraintType::LessThanOrEqual,
                0.0,
            );
        }
        for t in 0..periods {
            let produced: LinearExpr = prod[..=t].iter().map(|&p| (p, 1.0)).collect();
            session.create_constraint(
                format!("demand{}", t + 1),
                produced,
                ConstraintType::GreaterThanOrEqual,
                demand.get(0, t),
            );
        }

        Self {
            prod,
            setup,
            cuts: Vec::new(),
        }
    }

    pub fn add_cut(
        &mut self,
        session: &mut SolverSession,
        cut: &LsCut,
    ) -> Result<ConstraintHandle> {
        let mut lhs = LinearExpr::new();
        for term in &cut.terms {
            let (variable, coefficient) = match *term {
                CutTerm::Production { period } => (self.prod.get(period), 1.0),
                CutTerm::Setup {
                    period,
                    coefficient,
                } => (self.setup.get(period), coefficient),
            };
            let variable = variable.copied().ok_or_else(|| {
                SolverError::InvalidProblem(format!(
                    "cut for period {} refers to a period outside the horizon",
                    cut.last_period + 1
                ))
            })?;
            lhs.add_term(variable, coefficient);
        }
        let handle = session.create_constraint(
            format!("cut{}", self.cuts.len() + 1),
            lhs,
            ConstraintType::GreaterThanOrEqual,
            cut.rhs,
        );
        self.cuts.push(handle);
        Ok(handle)
    }

    pub fn prod(&self) -> &[VariableHandle] {
        &self.prod
    }

    pub fn setup(&self) -> &[VariableHandle] {
        &self.setup
    }

    pub fn cuts(&self) -> &[ConstraintHandle] {
        &self.cuts
    }
}

/// Production plan of one period in the final solution.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodPlan {
    pub production: f64,
    pub setup: f64,
    pub demand: f64,
    pub production_cost: f64,
    pub setup_cost: f64,
}

#[derive(Debug, Clone)]
pub struct LotSizingReport {
    pub objective: f64,
    /// LP objective at every pass, in order
    pub lp_objectives: Vec<f64>,
    /// Every cut added, in the order it was added
    pub cuts: Vec<LsCut>,
    pub passes: usize,
    pub periods: Vec<PeriodPlan>,
    pub elapsed: Duration,
    pub solver_backend: String,
}

impl LotSizingReport {
    pub fn total_cuts(&self) -> usize {
        self.cuts.len()
    }
}

impl fmt::Display for LotSizingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Optimal objective {} after {} passes and {} cuts ({:.3} sec)",
            self.objective,
            self.passes,
            self.cuts.len(),
            self.elapsed.as_secs_f64()
        )?;
        for (t, plan) in self.periods.iter().enumerate() {
            writeln!(
                f,
                "Period {}: prod {} (demand: {}, cost: {}), setup {} (cost: {})",
                t + 1,
                plan.production,
                plan.demand,
                plan.production_cost,
                plan.setup,
                plan.setup_cost
            )?;
        }
        Ok(())
    }
}

pub struct CutGeneration {
    solver: Arc<dyn SolverService>,
    config: CutGenerationConfig,
}

impl CutGeneration {
    pub fn new(solver: Arc<dyn SolverService>, config: CutGenerationConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &CutGenerationConfig {
        &self.config
    }

    pub fn run(
        &self,
        instance: &LotSizingInstance,
        observer: &mut dyn PassObserver,
    ) -> Result<LotSizingReport> {
        let start = Instant::now();
        let mut session = SolverSession::new(Arc::clone(&self.solver), Model::new("Els"));
        let mut model = LotSizingModel::build(&mut session, instance);
        session.configure(self.config.solver.clone().without_preprocessing());
        let separator = CutSeparator::new(self.config.tolerance);

        info!(
            periods = instance.periods(),
            max_passes = self.config.max_passes,
            backend = self.solver.name(),
            "starting cut generation"
        );

        let mut lp_objectives = Vec::new();
        let mut cuts: Vec<LsCut> = Vec::new();

        for pass in 1..=self.config.max_passes {
            let objective = session.solve_relaxation()?;
            let basis = session.save_basis()?;
            lp_objectives.push(objective);

            let prod = session.get_solution_values(model.prod())?;
            let setup = session.get_solution_values(model.setup())?;
            let violated = separator.separate(&prod, &setup, instance.cumulative())?;

            if violated.is_empty() {
                session.release_basis(basis);
                info!(pass, objective, total_cuts = cuts.len(), "no violated inequality");
                observer.on_pass(&PassEvent::SeparationConverged {
                    pass,
                    elapsed: start.elapsed(),
                    objective,
                    total: cuts.len(),
                });

                let periods = (0..instance.periods())
                    .map(|t| PeriodPlan {
                        production: prod[t],
                        setup: setup[t],
                        demand: instance.demands()[t],
                        production_cost: instance.production_costs()[t],
                        setup_cost: instance.setup_costs()[t],
                    })
                    .collect();
                let report = LotSizingReport {
                    objective,
                    lp_objectives,
                    cuts,
                    passes: pass,
                    periods,
                    elapsed: start.elapsed(),
                    solver_backend: self.solver.name().to_string(),
                };
                info!(
                    objective = report.objective,
                    cuts = report.cuts.len(),
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "lot sizing solved"
                );
                return Ok(report);
            }

            for cut in &violated {
                model.add_cut(&mut session, cut)?;
                debug!(
                    last_period = cut.last_period,
                    violation = cut.violation,
                    "cut added"
                );
            }
            let added = violated.len();
            cuts.extend(violated);
            info!(pass, objective, added, total_cuts = cuts.len(), "cuts added");
            observer.on_pass(&PassEvent::CutsAdded {
                pass,
                elapsed: start.elapsed(),
                objective,
                added,
                total: cuts.len(),
            });

            session.reload_model()?;
            session.load_basis(&basis)?;
            session.release_basis(basis);
        }

        Err(SolverError::IterationLimit(self.config.max_passes))
    }
}
