// Solver session: the stateful adapter the refinement loops talk to.
// Owns the live model, forwards solves to a stateless backend and keeps the
// last solution and any pending warm start.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::basis::{Basis, BasisHandle};
use super::models::{LinearExpr, Model, Solution, SolverConfig};
use super::solver_service::{Result, SolverError, SolverService};
use super::value_objects::{
    ConstraintHandle, ConstraintType, OptimizationType, SolutionStatus, SolveMode, VariableHandle,
    VariableType,
};

pub struct SolverSession {
    solver: Arc<dyn SolverService>,
    model: Model,
    config: SolverConfig,
    last: Option<Solution>,
    synced: bool,
    fresh: bool,
    warm_start: Option<Basis>,
    live_bases: Arc<AtomicUsize>,
    next_basis_id: u64,
}

impl SolverSession {
    pub fn new(solver: Arc<dyn SolverService>, model: Model) -> Self {
        Self {
            solver,
            model,
            config: SolverConfig::default(),
            last: None,
            synced: false,
            fresh: false,
            warm_start: None,
            live_bases: Arc::new(AtomicUsize::new(0)),
            next_basis_id: 1,
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the external solver knobs used by subsequent solves.
    pub fn configure(&mut self, config: SolverConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    fn touch(&mut self) {
        self.synced = false;
        self.fresh = false;
    }

    pub fn create_variable(
        &mut self,
        name: impl Into<String>,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: Option<f64>,
    ) -> VariableHandle {
        self.touch();
        self.model
            .create_variable(name, variable_type, lower_bound, upper_bound)
    }

    pub fn create_constraint(
        &mut self,
        name: impl Into<String>,
        expression: LinearExpr,
        constraint_type: ConstraintType,
        bound: f64,
    ) -> ConstraintHandle {
        self.touch();
        self.model
            .create_constraint(name, expression, constraint_type, bound)
    }

    pub fn set_objective(&mut self, expression: LinearExpr, optimization_type: OptimizationType) {
        self.touch();
        self.model.set_objective(expression, optimization_type);
    }

    pub fn add_term_to_objective(
        &mut self,
        variable: VariableHandle,
        coefficient: f64,
    ) -> Result<()> {
        if self.model.variable(variable).is_none() {
            return Err(SolverError::UnknownVariable(variable));
        }
        self.touch();
        self.model.add_term_to_objective(variable, coefficient);
        Ok(())
    }

    pub fn add_term_to_constraint(
        &mut self,
        constraint: ConstraintHandle,
        variable: VariableHandle,
        coefficient: f64,
    ) -> Result<()> {
        if self.model.variable(variable).is_none() {
            return Err(SolverError::UnknownVariable(variable));
        }
        if !self
            .model
            .add_term_to_constraint(constraint, variable, coefficient)
        {
            return Err(SolverError::UnknownConstraint(constraint));
        }
        self.touch();
        Ok(())
    }

    pub fn set_variable_upper_bound(&mut self, variable: VariableHandle, value: f64) -> Result<()> {
        if !self.model.set_variable_upper_bound(variable, value) {
            return Err(SolverError::UnknownVariable(variable));
        }
        self.touch();
        Ok(())
    }

    /// Resynchronize the backend view of the model after additions.
    ///
    /// Any warm start pending from before the reload is dropped; load the
    /// saved basis again afterwards.
    pub fn reload_model(&mut self) -> Result<()> {
        self.solver.validate(&self.model)?;
        self.synced = true;
        self.warm_start = None;
        debug!(
            model = %self.model.name,
            columns = self.model.num_variables(),
            rows = self.model.num_constraints(),
            "model reloaded"
        );
        Ok(())
    }

    pub fn solve_relaxation(&mut self) -> Result<f64> {
        self.solve(SolveMode::Relaxation)
    }

    pub fn solve_integer(&mut self) -> Result<f64> {
        if !self.solver.supports_mip() {
            return Err(SolverError::SolverNotAvailable(format!(
                "{} cannot solve integer programs",
                self.solver.name()
            )));
        }
        self.solve(SolveMode::Integer)
    }

    fn solve(&mut self, mode: SolveMode) -> Result<f64> {
        if !self.synced {
            self.reload_model()?;
        }
        let warm_start = self.warm_start.take();
        let solution = self
            .solver
            .solve(&self.model, mode, &self.config, warm_start.as_ref())?;

        debug!(
            model = %self.model.name,
            %mode,
            status = %solution.status,
            solve_time_ms = solution.statistics.solve_time_ms,
            "solve finished"
        );

        let objective = match (solution.status, solution.objective_value) {
            (SolutionStatus::Optimal, Some(value)) => value,
            (SolutionStatus::Infeasible, _) => {
                return Err(SolverError::Infeasible {
                    model: self.model.name.clone(),
                    mode,
                })
            }
            (SolutionStatus::Unbounded, _) => {
                return Err(SolverError::Unbounded {
                    model: self.model.name.clone(),
                    mode,
                })
            }
            (SolutionStatus::TimeLimit, _) => {
                return Err(SolverError::TimeLimit {
                    model: self.model.name.clone(),
                    mode,
                })
            }
            (status, _) => {
                return Err(SolverError::ExecutionFailed(format!(
                    "{} returned status {}: {}",
                    self.solver.name(),
                    status,
                    solution.message
                )))
            }
        };

        self.last = Some(solution);
        self.fresh = true;
        Ok(objective)
    }

    fn current(&self) -> Result<&Solution> {
        let solution = self
            .last
            .as_ref()
            .ok_or(SolverError::NoSolution("the model has not been solved yet"))?;
        if !self.fresh {
            return Err(SolverError::StaleSolution);
        }
        Ok(solution)
    }

    pub fn objective_value(&self) -> Result<f64> {
        self.current()?
            .objective_value
            .ok_or(SolverError::NoSolution("the last solve has no objective value"))
    }

    pub fn get_solution_value(&self, variable: VariableHandle) -> Result<f64> {
        self.current()?
            .variable_values
            .get(variable.index())
            .copied()
            .ok_or(SolverError::UnknownVariable(variable))
    }

    pub fn get_solution_values(&self, variables: &[VariableHandle]) -> Result<Vec<f64>> {
        variables
            .iter()
            .map(|&v| self.get_solution_value(v))
            .collect()
    }

    pub fn get_dual_value(&self, constraint: ConstraintHandle) -> Result<f64> {
        let solution = self.current()?;
        if solution.mode != SolveMode::Relaxation {
            return Err(SolverError::NoSolution(
                "dual values require an LP relaxation solve",
            ));
        }
        if !solution.has_duals() {
            return Err(SolverError::SolverNotAvailable(format!(
                "{} does not report dual values",
                self.solver.name()
            )));
        }
        solution
            .dual_values
            .get(constraint.index())
            .copied()
            .ok_or(SolverError::UnknownConstraint(constraint))
    }

    pub fn get_dual_values(&self, constraints: &[ConstraintHandle]) -> Result<Vec<f64>> {
        constraints
            .iter()
            .map(|&c| self.get_dual_value(c))
            .collect()
    }

    /// Snapshot the current LP optimum.
    pub fn save_basis(&mut self) -> Result<BasisHandle> {
        let solution = self.current()?;
        if solution.mode != SolveMode::Relaxation {
            return Err(SolverError::NoSolution(
                "a basis can only be saved after an LP relaxation solve",
            ));
        }
        let basis = Basis {
            id: self.next_basis_id,
            num_columns: self.model.num_variables(),
            num_rows: self.model.num_constraints(),
            column_values: solution.variable_values.clone(),
            row_duals: solution.dual_values.clone(),
        };
        self.next_basis_id += 1;
        debug!(basis = basis.id, "basis saved");
        Ok(BasisHandle::acquire(basis, Arc::clone(&self.live_bases)))
    }

    /// Use `handle` as the warm start of the next solve.
    pub fn load_basis(&mut self, handle: &BasisHandle) -> Result<()> {
        if !self.synced {
            return Err(SolverError::ModelOutOfSync("loading a basis"));
        }
        let basis = handle.basis();
        if !basis.fits(self.model.num_variables(), self.model.num_constraints()) {
            return Err(SolverError::IncompatibleBasis {
                columns: basis.num_columns,
                rows: basis.num_rows,
            });
        }
        if !self.solver.supports_warm_start() {
            debug!(
                basis = basis.id,
                backend = self.solver.name(),
                "backend restarts cold; basis kept as a hint only"
            );
        }
        self.warm_start = Some(basis.clone());
        Ok(())
    }

    pub fn release_basis(&self, handle: BasisHandle) {
        drop(handle);
    }

    /// Number of basis handles issued by this session that are still alive.
    pub fn live_bases(&self) -> usize {
        self.live_bases.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays canned solutions and records warm starts.
    struct ScriptedSolver {
        script: Mutex<VecDeque<Solution>>,
        warm_starts: Mutex<Vec<Option<u64>>>,
        duals: bool,
    }

    impl ScriptedSolver {
        fn new(script: Vec<Solution>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                warm_starts: Mutex::new(Vec::new()),
                duals: true,
            }
        }
    }

    impl SolverService for ScriptedSolver {
        fn solve(
            &self,
            _model: &Model,
            mode: SolveMode,
            _config: &SolverConfig,
            warm_start: Option<&Basis>,
        ) -> Result<Solution> {
            self.warm_starts
                .lock()
                .unwrap()
                .push(warm_start.map(|b| b.id));
            let mut next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            next.mode = mode;
            if !self.duals {
                next.dual_values.clear();
            }
            Ok(next)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn supports_mip(&self) -> bool {
            true
        }

        fn supports_duals(&self) -> bool {
            self.duals
        }
    }

    fn one_row_model() -> (Model, VariableHandle, ConstraintHandle) {
        let mut model = Model::new("cover");
        let x = model.create_variable("x", VariableType::Integer, 0.0, None);
        let row = model.create_constraint(
            "demand",
            LinearExpr::new().with_term(x, 1.0),
            ConstraintType::GreaterThanOrEqual,
            2.5,
        );
        model.set_objective(LinearExpr::new().with_term(x, 1.0), OptimizationType::Minimize);
        (model, x, row)
    }

    fn lp_optimum(value: f64) -> Solution {
        Solution::optimal(SolveMode::Relaxation, value, vec![value]).with_duals(vec![1.0])
    }

    #[test]
    fn test_values_and_duals_after_relaxation() {
        let (model, x, row) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![lp_optimum(2.5)]));
        let mut session = SolverSession::new(solver, model);

        assert_eq!(session.solve_relaxation().unwrap(), 2.5);
        assert_eq!(session.get_solution_value(x).unwrap(), 2.5);
        assert_eq!(session.get_dual_value(row).unwrap(), 1.0);
        assert_eq!(session.objective_value().unwrap(), 2.5);
    }

    #[test]
    fn test_reading_before_solve_fails() {
        let (model, x, _) = one_row_model();
        let session = SolverSession::new(Arc::new(ScriptedSolver::new(vec![])), model);
        assert!(matches!(
            session.get_solution_value(x),
            Err(SolverError::NoSolution(_))
        ));
    }

    #[test]
    fn test_mutation_makes_solution_stale() {
        let (model, x, _) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![lp_optimum(2.5)]));
        let mut session = SolverSession::new(solver, model);
        session.solve_relaxation().unwrap();

        session.set_variable_upper_bound(x, 10.0).unwrap();
        assert!(matches!(
            session.get_solution_value(x),
            Err(SolverError::StaleSolution)
        ));
    }

    #[test]
    fn test_integer_solve_has_no_duals() {
        let (model, _, row) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![Solution::optimal(
            SolveMode::Integer,
            3.0,
            vec![3.0],
        )]));
        let mut session = SolverSession::new(solver, model);
        assert_eq!(session.solve_integer().unwrap(), 3.0);
        assert!(session.get_dual_value(row).is_err());
        assert!(session.save_basis().is_err());
    }

    #[test]
    fn test_backend_without_duals_is_reported() {
        let (model, _, row) = one_row_model();
        let mut solver = ScriptedSolver::new(vec![lp_optimum(2.5)]);
        solver.duals = false;
        let mut session = SolverSession::new(Arc::new(solver), model);
        session.solve_relaxation().unwrap();
        assert!(matches!(
            session.get_dual_value(row),
            Err(SolverError::SolverNotAvailable(_))
        ));
    }

    #[test]
    fn test_infeasible_status_is_fatal() {
        let (model, _, _) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![Solution::new(
            SolutionStatus::Infeasible,
            SolveMode::Relaxation,
            "no point",
        )]));
        let mut session = SolverSession::new(solver, model);
        assert!(matches!(
            session.solve_relaxation(),
            Err(SolverError::Infeasible { .. })
        ));
    }

    #[test]
    fn test_time_limit_status_is_its_own_error() {
        let (model, _, _) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![Solution::new(
            SolutionStatus::TimeLimit,
            SolveMode::Integer,
            "out of time",
        )]));
        let mut session = SolverSession::new(solver, model);
        assert!(matches!(
            session.solve_integer(),
            Err(SolverError::TimeLimit {
                mode: SolveMode::Integer,
                ..
            })
        ));
    }

    #[test]
    fn test_basis_round_trip_reaches_next_solve_once() {
        let (model, x, row) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![
            lp_optimum(2.5),
            lp_optimum(2.0),
            lp_optimum(2.0),
        ]));
        let mut session = SolverSession::new(solver.clone(), model);

        session.solve_relaxation().unwrap();
        let basis = session.save_basis().unwrap();
        assert_eq!(session.live_bases(), 1);

        let y = session.create_variable("y", VariableType::Integer, 0.0, Some(3.0));
        session.add_term_to_constraint(row, y, 2.0).unwrap();
        session.add_term_to_objective(y, 1.0).unwrap();
        assert!(matches!(
            session.load_basis(&basis),
            Err(SolverError::ModelOutOfSync(_))
        ));

        session.reload_model().unwrap();
        session.load_basis(&basis).unwrap();
        session.release_basis(basis);
        assert_eq!(session.live_bases(), 0);

        session.solve_relaxation().unwrap();
        session.solve_relaxation().unwrap();
        assert_eq!(*solver.warm_starts.lock().unwrap(), vec![None, Some(1), None]);
        assert!(session.get_solution_value(x).is_ok());
    }

    #[test]
    fn test_basis_released_on_early_return() {
        fn pass(session: &mut SolverSession) -> Result<()> {
            session.solve_relaxation()?;
            let _basis = session.save_basis()?;
            Err(SolverError::ExecutionFailed("abort pass".to_string()))
        }

        let (model, _, _) = one_row_model();
        let solver = Arc::new(ScriptedSolver::new(vec![lp_optimum(2.5)]));
        let mut session = SolverSession::new(solver, model);
        assert!(pass(&mut session).is_err());
        assert_eq!(session.live_bases(), 0);
    }

    #[test]
    fn test_unknown_handles_are_errors() {
        let (model, x, _) = one_row_model();
        let mut session = SolverSession::new(Arc::new(ScriptedSolver::new(vec![])), model);
        let bogus_row = ConstraintHandle(9);
        let bogus_var = VariableHandle(9);
        assert!(matches!(
            session.add_term_to_constraint(bogus_row, x, 1.0),
            Err(SolverError::UnknownConstraint(_))
        ));
        assert!(matches!(
            session.add_term_to_objective(bogus_var, 1.0),
            Err(SolverError::UnknownVariable(_))
        ));
    }
}
