// Application layer: pricing, separation, the refinement loops and the
// service that exposes them

pub mod column_generation;
pub mod cut_generation;
pub mod pricing;
pub mod reporting;
pub mod separation;

#[cfg(feature = "server")]
pub mod grpc_service;
#[cfg(feature = "server")]
pub mod mappers;

pub use column_generation::{
    ColumnGeneration, ColumnGenerationConfig, CuttingStockMaster, CuttingStockReport,
};
pub use cut_generation::{
    CutGeneration, CutGenerationConfig, LotSizingModel, LotSizingReport, PeriodPlan,
};
pub use pricing::{KnapsackOracle, KnapsackSolution};
pub use reporting::{ConsoleReporter, PassEvent, PassObserver, SilentObserver};
pub use separation::{CutSeparator, CutTerm, LsCut};

#[cfg(feature = "server")]
pub use grpc_service::GrpcRefinementService;
