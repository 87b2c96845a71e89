// Domain service interface for solving models
// Defines the contract that any solver backend must follow

use super::basis::Basis;
use super::models::{Model, Solution, SolverConfig};
use super::value_objects::{ConstraintHandle, SolveMode, VariableHandle};

/// Error types for the solver port and the refinement loops
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Model '{model}' is infeasible as {mode}")]
    Infeasible { model: String, mode: SolveMode },

    #[error("Model '{model}' is unbounded as {mode}")]
    Unbounded { model: String, mode: SolveMode },

    #[error("Time limit reached solving '{model}' as {mode}")]
    TimeLimit { model: String, mode: SolveMode },

    #[error("Could not allocate working storage: {0}")]
    AllocationFailure(String),

    #[error("No solution available: {0}")]
    NoSolution(&'static str),

    #[error("Solution is stale: the model changed since the last solve")]
    StaleSolution,

    #[error("Unknown variable handle {0:?}")]
    UnknownVariable(VariableHandle),

    #[error("Unknown constraint handle {0:?}")]
    UnknownConstraint(ConstraintHandle),

    #[error("Basis snapshot ({columns} columns, {rows} rows) does not fit the current model")]
    IncompatibleBasis { columns: usize, rows: usize },

    #[error("Model must be reloaded before {0}")]
    ModelOutOfSync(&'static str),

    #[error("No convergence after {0} passes")]
    IterationLimit(usize),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for LP/MIP backends
///
/// A backend is stateless: every call receives the complete model. Statuses
/// other than optimal are reported through [`Solution::status`], not as
/// errors, so callers decide what is fatal.
pub trait SolverService: Send + Sync {
    /// Solve `model` either as its LP relaxation or as an integer program.
    ///
    /// `warm_start` is the snapshot of a previous LP optimum over a prefix of
    /// the current model. Backends that cannot consume it ignore it.
    fn solve(
        &self,
        model: &Model,
        mode: SolveMode,
        config: &SolverConfig,
        warm_start: Option<&Basis>,
    ) -> Result<Solution>;

    /// Validate a model without solving it
    fn validate(&self, model: &Model) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = model.num_variables();

        if num_vars == 0 {
            errors.push("Model must have at least one variable".to_string());
        }

        for (variable, coefficient) in model.objective().expression.terms() {
            if variable.index() >= num_vars {
                errors.push(format!(
                    "Objective references unknown variable #{}",
                    variable.index()
                ));
            }
            if !coefficient.is_finite() {
                errors.push(format!(
                    "Objective coefficient of variable #{} is not finite",
                    variable.index()
                ));
            }
        }

        for (i, constraint) in model.constraints().iter().enumerate() {
            for (variable, coefficient) in constraint.expression.terms() {
                if variable.index() >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references unknown variable #{}",
                        i,
                        constraint.name,
                        variable.index()
                    ));
                }
                if !coefficient.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has a non-finite coefficient",
                        i, constraint.name
                    ));
                }
            }
            if !constraint.bound.is_finite() {
                errors.push(format!(
                    "Constraint {} '{}' has a non-finite bound",
                    i, constraint.name
                ));
            }
        }

        for (i, var) in model.variables().iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;

    /// Check if this solver reports row duals for LP relaxations
    fn supports_duals(&self) -> bool;

    /// Check if this solver can restart from a saved basis
    fn supports_warm_start(&self) -> bool {
        false
    }
}
