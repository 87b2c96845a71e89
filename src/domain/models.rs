use super::value_objects::{
    ConstraintHandle, ConstraintType, OptimizationType, SolutionStatus, SolveMode, SolverBackend,
    VariableHandle, VariableType,
};

/// Decision variable in a model
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

/// Sparse linear expression `Σ coeff · var`
///
/// Adding a term for a variable that already appears merges the coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VariableHandle, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, variable: VariableHandle, coefficient: f64) -> Self {
        self.add_term(variable, coefficient);
        self
    }

    pub fn add_term(&mut self, variable: VariableHandle, coefficient: f64) {
        match self.terms.iter_mut().find(|(v, _)| *v == variable) {
            Some((_, existing)) => *existing += coefficient,
            None => self.terms.push((variable, coefficient)),
        }
    }

    pub fn terms(&self) -> &[(VariableHandle, f64)] {
        &self.terms
    }

    pub fn coefficient(&self, variable: VariableHandle) -> f64 {
        self.terms
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression for a dense vector of variable values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VariableHandle, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VariableHandle, f64)>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for (variable, coefficient) in iter {
            expr.add_term(variable, coefficient);
        }
        expr
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub expression: LinearExpr,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, expression: LinearExpr) -> Self {
        Self {
            optimization_type,
            expression,
        }
    }

    /// Dense coefficient vector over `num_variables` columns.
    pub fn dense_coefficients(&self, num_variables: usize) -> Vec<f64> {
        let mut coefficients = vec![0.0; num_variables];
        for (variable, coefficient) in self.expression.terms() {
            if let Some(slot) = coefficients.get_mut(variable.index()) {
                *slot += coefficient;
            }
        }
        coefficients
    }
}

impl Default for ObjectiveFunction {
    fn default() -> Self {
        Self::new(OptimizationType::Minimize, LinearExpr::new())
    }
}

/// Linear constraint `expression (≤ | = | ≥) bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expression: LinearExpr,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, expression: LinearExpr, bound: f64) -> Self {
        Self {
            constraint_type,
            expression,
            bound,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expression.evaluate(values);
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => lhs <= self.bound + tolerance,
            ConstraintType::Equal => (lhs - self.bound).abs() <= tolerance,
            ConstraintType::GreaterThanOrEqual => lhs >= self.bound - tolerance,
        }
    }
}

/// External solver knobs. These are consumed by the backends and never
/// interpreted by the refinement loops themselves.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub presolve: bool,
    pub automatic_cuts: bool,
    pub verbose: bool,
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = Some(gap);
        self
    }

    /// Switch off presolve and solver-generated cuts so that only
    /// user-supplied inequalities shape the relaxation.
    pub fn without_preprocessing(mut self) -> Self {
        self.presolve = false;
        self.automatic_cuts = false;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            gap_tolerance: None,
            presolve: true,
            automatic_cuts: true,
            verbose: false,
        }
    }
}

/// The live model: variables, constraints and objective.
///
/// Only ever grows. Owned by whichever loop is driving it.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: ObjectiveFunction,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn create_variable(
        &mut self,
        name: impl Into<String>,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: Option<f64>,
    ) -> VariableHandle {
        let variable = Variable {
            variable_type,
            lower_bound,
            upper_bound,
            name: name.into(),
        };
        self.add_variable(variable)
    }

    pub fn add_variable(&mut self, variable: Variable) -> VariableHandle {
        self.variables.push(variable);
        VariableHandle(self.variables.len() - 1)
    }

    pub fn create_constraint(
        &mut self,
        name: impl Into<String>,
        expression: LinearExpr,
        constraint_type: ConstraintType,
        bound: f64,
    ) -> ConstraintHandle {
        self.constraints
            .push(Constraint::new(constraint_type, expression, bound).with_name(name));
        ConstraintHandle(self.constraints.len() - 1)
    }

    pub fn set_objective(&mut self, expression: LinearExpr, optimization_type: OptimizationType) {
        self.objective = ObjectiveFunction::new(optimization_type, expression);
    }

    pub fn add_term_to_objective(&mut self, variable: VariableHandle, coefficient: f64) {
        self.objective.expression.add_term(variable, coefficient);
    }

    /// Returns `false` when the constraint handle does not belong to this model.
    pub fn add_term_to_constraint(
        &mut self,
        constraint: ConstraintHandle,
        variable: VariableHandle,
        coefficient: f64,
    ) -> bool {
        match self.constraints.get_mut(constraint.index()) {
            Some(row) => {
                row.expression.add_term(variable, coefficient);
                true
            }
            None => false,
        }
    }

    /// Returns `false` when the variable handle does not belong to this model.
    pub fn set_variable_upper_bound(&mut self, variable: VariableHandle, value: f64) -> bool {
        match self.variables.get_mut(variable.index()) {
            Some(var) => {
                var.upper_bound = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn variable(&self, handle: VariableHandle) -> Option<&Variable> {
        self.variables.get(handle.index())
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(handle.index())
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &ObjectiveFunction {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_model(model: &Model, solve_time_ms: f64) -> Self {
        let count = |kind: VariableType| {
            model
                .variables()
                .iter()
                .filter(|v| v.variable_type == kind)
                .count() as u32
        };
        Self {
            solve_time_ms,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: count(VariableType::Integer),
            num_binary_vars: count(VariableType::Binary),
        }
    }
}

/// Outcome of one backend solve
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub mode: SolveMode,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    /// One entry per constraint; empty when the backend cannot report duals
    /// or the solve was an integer solve.
    pub dual_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, mode: SolveMode, message: impl Into<String>) -> Self {
        Self {
            status,
            mode,
            objective_value: None,
            variable_values: Vec::new(),
            dual_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(mode: SolveMode, value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            mode,
            objective_value: Some(value),
            variable_values,
            dual_values: Vec::new(),
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_duals(mut self, dual_values: Vec<f64>) -> Self {
        self.dual_values = dual_values;
        self
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn has_duals(&self) -> bool {
        !self.dual_values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_expr_merges_terms() {
        let x = VariableHandle(0);
        let y = VariableHandle(1);
        let expr = LinearExpr::new()
            .with_term(x, 2.0)
            .with_term(y, 1.0)
            .with_term(x, 3.0);

        assert_eq!(expr.terms().len(), 2);
        assert_eq!(expr.coefficient(x), 5.0);
        assert_eq!(expr.evaluate(&[1.0, 4.0]), 9.0);
    }

    #[test]
    fn test_model_grows_and_handles_stay_valid() {
        let mut model = Model::new("grow");
        let x = model.create_variable("x", VariableType::Continuous, 0.0, None);
        let row = model.create_constraint(
            "cover",
            LinearExpr::new().with_term(x, 1.0),
            ConstraintType::GreaterThanOrEqual,
            3.0,
        );
        let y = model.create_variable("y", VariableType::Integer, 0.0, Some(4.0));

        assert!(model.add_term_to_constraint(row, y, 2.0));
        assert!(model.set_variable_upper_bound(y, 7.0));
        model.add_term_to_objective(x, 1.0);
        model.add_term_to_objective(y, 1.0);

        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.variable(y).and_then(|v| v.upper_bound), Some(7.0));
        assert_eq!(model.constraint(row).map(|c| c.expression.coefficient(y)), Some(2.0));
        assert_eq!(model.objective().dense_coefficients(2), vec![1.0, 1.0]);
        assert!(model.is_mixed_integer());
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let mut model = Model::new("empty");
        assert!(!model.add_term_to_constraint(ConstraintHandle(3), VariableHandle(0), 1.0));
        assert!(!model.set_variable_upper_bound(VariableHandle(1), 2.0));
    }

    #[test]
    fn test_constraint_satisfaction() {
        let x = VariableHandle(0);
        let row = Constraint::new(
            ConstraintType::GreaterThanOrEqual,
            LinearExpr::new().with_term(x, 2.0),
            4.0,
        );
        assert!(row.is_satisfied_by(&[2.0], 1e-9));
        assert!(!row.is_satisfied_by(&[1.5], 1e-9));
    }
}
