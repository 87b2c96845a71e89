// Mappers: Convert between gRPC protobuf types and domain types
// Protobuf types stay out of the domain and the refinement loops

use tonic::Status;

use super::column_generation::{ColumnGenerationConfig, CuttingStockReport};
use super::cut_generation::{CutGenerationConfig, LotSizingReport};
use super::reporting::PassEvent;
use crate::domain::{
    cutting_stock::CuttingStockInstance,
    lot_sizing::LotSizingInstance,
    models::SolverConfig,
    solver_service::{SolverError, SolverService},
    value_objects::{SolverBackend, Tolerance},
};

pub mod refinement {
    tonic::include_proto!("refinement");
}

use refinement as proto;

fn millis(elapsed: std::time::Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

pub fn proto_to_domain_backend(backend: i32) -> SolverBackend {
    match proto::SolverBackend::try_from(backend) {
        Ok(proto::SolverBackend::Highs) => SolverBackend::Highs,
        Ok(proto::SolverBackend::CoinCbc) => SolverBackend::CoinCbc,
        Ok(proto::SolverBackend::Auto) | Err(_) => SolverBackend::Auto,
    }
}

/// Solver knobs and tolerance carried by a request.
pub fn proto_to_domain_options(
    options: Option<&proto::SolverOptions>,
) -> (SolverConfig, Tolerance) {
    let Some(options) = options else {
        return (SolverConfig::default(), Tolerance::default());
    };

    let mut config = SolverConfig::default()
        .with_backend(proto_to_domain_backend(options.solver))
        .verbose(options.verbose);
    if options.time_limit > 0.0 {
        config = config.with_time_limit(options.time_limit);
    }
    if options.gap_tolerance > 0.0 {
        config = config.with_gap_tolerance(options.gap_tolerance);
    }
    let tolerance = if options.epsilon > 0.0 {
        Tolerance::new(options.epsilon)
    } else {
        Tolerance::default()
    };
    (config, tolerance)
}

pub fn proto_to_cutting_stock(
    request: proto::CuttingStockRequest,
) -> Result<(CuttingStockInstance, ColumnGenerationConfig), Box<Status>> {
    let (solver, tolerance) = proto_to_domain_options(request.options.as_ref());
    let mut config = ColumnGenerationConfig::default()
        .with_solver_config(solver)
        .with_tolerance(tolerance);
    if request.max_columns > 0 {
        config = config.with_max_columns(request.max_columns as usize);
    }

    let instance = CuttingStockInstance::new(request.widths, request.demands, request.raw_width)
        .map_err(|e| Box::new(error_to_status(e)))?;
    Ok((instance, config))
}

pub fn proto_to_lot_sizing(
    request: proto::LotSizingRequest,
) -> Result<(LotSizingInstance, CutGenerationConfig), Box<Status>> {
    let (solver, tolerance) = proto_to_domain_options(request.options.as_ref());
    let mut config = CutGenerationConfig::default()
        .with_solver_config(solver)
        .with_tolerance(tolerance);
    if request.max_passes > 0 {
        config = config.with_max_passes(request.max_passes as usize);
    }

    let instance = LotSizingInstance::new(
        request.demands,
        request.setup_costs,
        request.production_costs,
    )
    .map_err(|e| Box::new(error_to_status(e)))?;
    Ok((instance, config))
}

pub fn domain_to_proto_cutting_stock(report: &CuttingStockReport) -> proto::CuttingStockResult {
    let patterns = report
        .patterns
        .iter()
        .zip(&report.rolls_per_pattern)
        .map(|(pattern, &rolls)| proto::Pattern {
            quantities: pattern.quantities.clone(),
            upper_bound: pattern.upper_bound,
            rolls,
        })
        .collect();

    proto::CuttingStockResult {
        rolls: report.rolls,
        patterns,
        lp_objectives: report.lp_objectives.clone(),
        final_duals: report.final_duals.clone(),
        passes: report.passes as u32,
        converged: report.converged,
        elapsed_ms: millis(report.elapsed),
        solver_backend: report.solver_backend.clone(),
    }
}

pub fn domain_to_proto_lot_sizing(report: &LotSizingReport) -> proto::LotSizingResult {
    proto::LotSizingResult {
        objective: report.objective,
        periods: report
            .periods
            .iter()
            .map(|plan| proto::PeriodPlan {
                production: plan.production,
                setup: plan.setup,
                demand: plan.demand,
                production_cost: plan.production_cost,
                setup_cost: plan.setup_cost,
            })
            .collect(),
        lp_objectives: report.lp_objectives.clone(),
        total_cuts: report.total_cuts() as u32,
        passes: report.passes as u32,
        elapsed_ms: millis(report.elapsed),
        solver_backend: report.solver_backend.clone(),
    }
}

pub fn domain_to_proto_event(event: &PassEvent) -> proto::PassUpdate {
    use proto::pass_update::Event;

    let payload = match event {
        PassEvent::ColumnAdded {
            objective,
            reduced_cost,
            distribution,
            total_width,
            ..
        } => Event::ColumnAdded(proto::ColumnAdded {
            objective: *objective,
            reduced_cost: *reduced_cost,
            quantities: distribution.iter().map(|&(_, pieces)| pieces).collect(),
            total_width: *total_width,
        }),
        PassEvent::PricingConverged {
            objective,
            pricing_value,
            ..
        } => Event::PricingConverged(proto::PricingConverged {
            objective: *objective,
            pricing_value: *pricing_value,
        }),
        PassEvent::ColumnBudgetExhausted { columns, .. } => {
            Event::ColumnBudgetExhausted(proto::ColumnBudgetExhausted {
                columns: *columns as u32,
            })
        }
        PassEvent::CutsAdded {
            objective,
            added,
            total,
            ..
        } => Event::CutsAdded(proto::CutsAdded {
            objective: *objective,
            added: *added as u32,
            total: *total as u32,
        }),
        PassEvent::SeparationConverged {
            objective, total, ..
        } => Event::SeparationConverged(proto::SeparationConverged {
            objective: *objective,
            total: *total as u32,
        }),
    };

    proto::PassUpdate {
        pass: event.pass() as u32,
        elapsed_ms: millis(event.elapsed()),
        summary: event.to_string(),
        event: Some(payload),
    }
}

/// Terminal stream message for a cutting-stock run.
pub fn cutting_stock_update(report: &CuttingStockReport) -> proto::PassUpdate {
    proto::PassUpdate {
        pass: report.passes as u32,
        elapsed_ms: millis(report.elapsed),
        summary: report.to_string(),
        event: Some(proto::pass_update::Event::CuttingStockResult(
            domain_to_proto_cutting_stock(report),
        )),
    }
}

/// Terminal stream message for a lot-sizing run.
pub fn lot_sizing_update(report: &LotSizingReport) -> proto::PassUpdate {
    proto::PassUpdate {
        pass: report.passes as u32,
        elapsed_ms: millis(report.elapsed),
        summary: report.to_string(),
        event: Some(proto::pass_update::Event::LotSizingResult(
            domain_to_proto_lot_sizing(report),
        )),
    }
}

pub fn domain_to_proto_solver_info(solver: &dyn SolverService) -> proto::SolverInfo {
    proto::SolverInfo {
        name: solver.name().to_string(),
        supports_mip: solver.supports_mip(),
        supports_duals: solver.supports_duals(),
        supports_warm_start: solver.supports_warm_start(),
    }
}

pub fn error_to_status(error: SolverError) -> Status {
    match error {
        SolverError::InvalidProblem(_)
        | SolverError::UnknownVariable(_)
        | SolverError::UnknownConstraint(_) => Status::invalid_argument(error.to_string()),
        SolverError::SolverNotAvailable(_) => Status::unimplemented(error.to_string()),
        SolverError::Infeasible { .. }
        | SolverError::Unbounded { .. }
        | SolverError::IterationLimit(_) => Status::failed_precondition(error.to_string()),
        SolverError::AllocationFailure(_) => Status::resource_exhausted(error.to_string()),
        SolverError::TimeLimit { .. } => Status::deadline_exceeded(error.to_string()),
        _ => Status::internal(error.to_string()),
    }
}
