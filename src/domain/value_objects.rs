// Domain value objects representing core modelling concepts

use std::fmt;

/// Type of decision variable in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Which problem the backend is asked to solve for a given model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// Drop integrality and solve the LP relaxation
    Relaxation,
    /// Honour integrality (MIP)
    Integer,
}

impl fmt::Display for SolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveMode::Relaxation => write!(f, "LP relaxation"),
            SolveMode::Integer => write!(f, "integer program"),
        }
    }
}

/// Status of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached
    TimeLimit,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time Limit Reached"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    /// Automatically select best solver
    Auto,
    /// HiGHS solver
    Highs,
    /// COIN-OR CBC solver
    CoinCbc,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}

/// Handle to a variable of a [`Model`](super::models::Model)
///
/// Handles are dense indices. Variables are never removed, so a handle stays
/// valid for the lifetime of the model that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableHandle(pub(crate) usize);

impl VariableHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a constraint (row) of a [`Model`](super::models::Model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) usize);

impl ConstraintHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Numerical tolerance shared by every threshold decision of the engine:
/// improving columns, violated cuts, binding terms and integrality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    epsilon: f64,
}

impl Tolerance {
    pub const DEFAULT_EPSILON: f64 = 1e-6;

    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.abs(),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// `value` clears `threshold` by at least epsilon.
    pub fn improves_on(&self, value: f64, threshold: f64) -> bool {
        value >= threshold + self.epsilon
    }

    /// `value` misses `threshold` by more than epsilon.
    pub fn falls_short_of(&self, value: f64, threshold: f64) -> bool {
        value < threshold - self.epsilon
    }

    /// `value` is below `threshold` or within epsilon above it.
    pub fn not_above(&self, value: f64, threshold: f64) -> bool {
        value < threshold + self.epsilon
    }

    pub fn is_positive(&self, value: f64) -> bool {
        value > self.epsilon
    }

    pub fn is_integral(&self, value: f64) -> bool {
        (value - value.round()).abs() <= self.epsilon
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPSILON)
    }
}
