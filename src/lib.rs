//! Iterative LP refinement: column generation for cutting stock and (l,S) cut
//! generation for lot sizing, driven through a solver session over HiGHS or
//! COIN-OR CBC.

// Domain layer: models, problem instances and the solver port
pub mod domain;

// Application layer: pricing, separation and the refinement loops
pub mod application;

// Infrastructure layer: logging and the gRPC server
pub mod infrastructure;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    BasisHandle, ConstraintHandle, ConstraintType, CumulativeDemand, CuttingStockInstance,
    LinearExpr, LotSizingInstance, Model, OptimizationType, Pattern, Solution, SolutionStatus,
    SolveMode, SolverBackend, SolverConfig, SolverError, SolverService, SolverSession, Tolerance,
    VariableHandle, VariableType,
};

pub use application::{
    ColumnGeneration, ColumnGenerationConfig, ConsoleReporter, CutGeneration, CutGenerationConfig,
    CuttingStockReport, KnapsackOracle, LotSizingReport, PassEvent, PassObserver, SilentObserver,
};

pub use infrastructure::LoggingConfig;

#[cfg(feature = "server")]
pub use application::GrpcRefinementService;
#[cfg(feature = "server")]
pub use infrastructure::{start_server, ServerConfig};

pub use solver::SolverFactory;
#[cfg(feature = "cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
