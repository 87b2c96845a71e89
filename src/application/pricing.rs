// Knapsack pricing oracle
//
// Solves  z = max Σ c_i x_i  s.t.  Σ a_i x_i ≤ R,  0 ≤ x_i ≤ d_i,  x_i ∈ ℤ
// as a nested integer program on a fresh model. The outer model is never
// touched.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    models::{LinearExpr, Model, SolverConfig},
    session::SolverSession,
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, Tolerance, VariableType},
};

/// Optimal knapsack filling.
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackSolution {
    pub value: f64,
    pub quantities: Vec<u32>,
}

impl KnapsackSolution {
    fn empty(items: usize) -> Self {
        Self {
            value: 0.0,
            quantities: vec![0; items],
        }
    }
}

pub struct KnapsackOracle {
    solver: Arc<dyn SolverService>,
    config: SolverConfig,
    tolerance: Tolerance,
}

impl KnapsackOracle {
    pub fn new(solver: Arc<dyn SolverService>) -> Self {
        Self {
            solver,
            config: SolverConfig::default(),
            tolerance: Tolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Bounded integer knapsack over `profits`, `weights`, `capacity` and
    /// per-item caps.
    ///
    /// Items with non-positive profit, a zero cap, or a weight above the
    /// capacity can never appear in an optimal filling and are left out of
    /// the nested model. When nothing is left the answer is the zero vector.
    pub fn solve(
        &self,
        profits: &[f64],
        weights: &[f64],
        capacity: f64,
        caps: &[u32],
    ) -> Result<KnapsackSolution> {
        let items = profits.len();
        if weights.len() != items || caps.len() != items {
            return Err(SolverError::InvalidProblem(format!(
                "knapsack data lengths differ: {} profits, {} weights, {} caps",
                items,
                weights.len(),
                caps.len()
            )));
        }
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(SolverError::InvalidProblem(format!(
                "knapsack capacity must be finite and non-negative, got {}",
                capacity
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SolverError::InvalidProblem(format!(
                "knapsack weights must be finite and non-negative, got {}",
                w
            )));
        }

        let mut candidates: Vec<usize> = Vec::new();
        candidates
            .try_reserve_exact(items)
            .map_err(|e| SolverError::AllocationFailure(format!("knapsack items: {}", e)))?;
        candidates.extend((0..items).filter(|&i| {
            self.tolerance.is_positive(profits[i])
                && caps[i] > 0
                && self.tolerance.not_above(weights[i], capacity)
        }));

        if candidates.is_empty() {
            debug!(items, "no profitable item; empty knapsack");
            return Ok(KnapsackSolution::empty(items));
        }

        let mut model = Model::new("Knapsack");
        let mut handles = Vec::new();
        handles
            .try_reserve_exact(candidates.len())
            .map_err(|e| SolverError::AllocationFailure(format!("knapsack variables: {}", e)))?;
        for &i in &candidates {
            handles.push(model.create_variable(
                format!("x_{}", i + 1),
                VariableType::Integer,
                0.0,
                Some(f64::from(caps[i])),
            ));
        }
        let objective: LinearExpr = candidates
            .iter()
            .zip(&handles)
            .map(|(&i, &x)| (x, profits[i]))
            .collect();
        let load: LinearExpr = candidates
            .iter()
            .zip(&handles)
            .map(|(&i, &x)| (x, weights[i]))
            .collect();
        model.set_objective(objective, OptimizationType::Maximize);
        model.create_constraint("capacity", load, ConstraintType::LessThanOrEqual, capacity);

        let mut session =
            SolverSession::new(Arc::clone(&self.solver), model).with_config(self.config.clone());
        session.solve_integer()?;

        let mut solution = KnapsackSolution::empty(items);
        for (&i, &x) in candidates.iter().zip(&handles) {
            let raw = session.get_solution_value(x)?;
            if !self.tolerance.is_integral(raw) {
                warn!(item = i, value = raw, "knapsack quantity is not integral; rounding");
            }
            let rounded = (raw + 0.5).floor().clamp(0.0, f64::from(caps[i]));
            solution.quantities[i] = rounded as u32;
        }

        let used: f64 = solution
            .quantities
            .iter()
            .zip(weights)
            .map(|(&q, w)| f64::from(q) * w)
            .sum();
        if !self.tolerance.not_above(used, capacity) {
            return Err(SolverError::ExecutionFailed(format!(
                "rounded knapsack uses {} of capacity {}",
                used, capacity
            )));
        }

        solution.value = solution
            .quantities
            .iter()
            .zip(profits)
            .map(|(&q, c)| f64::from(q) * c)
            .sum();

        debug!(value = solution.value, quantities = ?solution.quantities, "knapsack solved");
        Ok(solution)
    }
}
