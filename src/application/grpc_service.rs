use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use super::column_generation::ColumnGeneration;
use super::cut_generation::CutGeneration;
use super::mappers::{self, refinement};
use super::reporting::{PassEvent, SilentObserver};
use crate::domain::models::SolverConfig;
use crate::domain::solver_service::SolverService;
use crate::solver::SolverFactory;

/// Stream of per-pass updates for the watch RPCs
pub type UpdateStream =
    Pin<Box<dyn Stream<Item = Result<refinement::PassUpdate, Status>> + Send + 'static>>;

/// Updates buffered ahead of a slow client before the loop waits
const UPDATE_BUFFER: usize = 16;

/// gRPC service implementation
///
/// Every request builds its own model and runs its loop to completion on a
/// blocking worker, so requests never share solver state.
pub struct GrpcRefinementService;

impl GrpcRefinementService {
    pub fn new() -> Self {
        Self
    }

    fn solver_for(config: &SolverConfig) -> Result<Arc<dyn SolverService>, Status> {
        SolverFactory::create_from_backend(config.backend).map_err(mappers::error_to_status)
    }
}

impl Default for GrpcRefinementService {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_failed(error: tokio::task::JoinError) -> Status {
    Status::internal(format!("solver worker failed: {}", error))
}

#[tonic::async_trait]
impl refinement::refinement_solver_server::RefinementSolver for GrpcRefinementService {
    type WatchCuttingStockStream = UpdateStream;
    type WatchLotSizingStream = UpdateStream;

    async fn solve_cutting_stock(
        &self,
        request: Request<refinement::CuttingStockRequest>,
    ) -> Result<Response<refinement::CuttingStockResult>, Status> {
        let (instance, config) =
            mappers::proto_to_cutting_stock(request.into_inner()).map_err(|e| *e)?;
        let solver = Self::solver_for(&config.solver)?;
        info!(
            widths = instance.num_widths(),
            solver = solver.name(),
            "cutting stock request"
        );

        let report = tokio::task::spawn_blocking(move || {
            ColumnGeneration::new(solver, config).run(&instance, &mut SilentObserver)
        })
        .await
        .map_err(worker_failed)?
        .map_err(mappers::error_to_status)?;

        Ok(Response::new(mappers::domain_to_proto_cutting_stock(&report)))
    }

    async fn solve_lot_sizing(
        &self,
        request: Request<refinement::LotSizingRequest>,
    ) -> Result<Response<refinement::LotSizingResult>, Status> {
        let (instance, config) =
            mappers::proto_to_lot_sizing(request.into_inner()).map_err(|e| *e)?;
        let solver = Self::solver_for(&config.solver)?;
        info!(
            periods = instance.periods(),
            solver = solver.name(),
            "lot sizing request"
        );

        let report = tokio::task::spawn_blocking(move || {
            CutGeneration::new(solver, config).run(&instance, &mut SilentObserver)
        })
        .await
        .map_err(worker_failed)?
        .map_err(mappers::error_to_status)?;

        Ok(Response::new(mappers::domain_to_proto_lot_sizing(&report)))
    }

    async fn watch_cutting_stock(
        &self,
        request: Request<refinement::CuttingStockRequest>,
    ) -> Result<Response<Self::WatchCuttingStockStream>, Status> {
        let (instance, config) =
            mappers::proto_to_cutting_stock(request.into_inner()).map_err(|e| *e)?;
        let solver = Self::solver_for(&config.solver)?;
        info!(
            widths = instance.num_widths(),
            solver = solver.name(),
            "watching cutting stock"
        );

        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        tokio::task::spawn_blocking(move || {
            let mut forward = |event: &PassEvent| {
                if tx
                    .blocking_send(Ok(mappers::domain_to_proto_event(event)))
                    .is_err()
                {
                    debug!(pass = event.pass(), "watcher disconnected");
                }
            };
            let outcome = ColumnGeneration::new(solver, config).run(&instance, &mut forward);
            let last = outcome
                .map(|report| mappers::cutting_stock_update(&report))
                .map_err(mappers::error_to_status);
            let _ = tx.blocking_send(last);
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn watch_lot_sizing(
        &self,
        request: Request<refinement::LotSizingRequest>,
    ) -> Result<Response<Self::WatchLotSizingStream>, Status> {
        let (instance, config) =
            mappers::proto_to_lot_sizing(request.into_inner()).map_err(|e| *e)?;
        let solver = Self::solver_for(&config.solver)?;
        info!(
            periods = instance.periods(),
            solver = solver.name(),
            "watching lot sizing"
        );

        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        tokio::task::spawn_blocking(move || {
            let mut forward = |event: &PassEvent| {
                if tx
                    .blocking_send(Ok(mappers::domain_to_proto_event(event)))
                    .is_err()
                {
                    debug!(pass = event.pass(), "watcher disconnected");
                }
            };
            let outcome = CutGeneration::new(solver, config).run(&instance, &mut forward);
            let last = outcome
                .map(|report| mappers::lot_sizing_update(&report))
                .map_err(mappers::error_to_status);
            let _ = tx.blocking_send(last);
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn get_available_solvers(
        &self,
        _request: Request<refinement::Empty>,
    ) -> Result<Response<refinement::AvailableSolvers>, Status> {
        let solvers = SolverFactory::available()
            .iter()
            .map(|solver| mappers::domain_to_proto_solver_info(solver.as_ref()))
            .collect();

        Ok(Response::new(refinement::AvailableSolvers { solvers }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use refinement::refinement_solver_server::RefinementSolver;

    fn paper_rolls() -> refinement::CuttingStockRequest {
        refinement::CuttingStockRequest {
            widths: vec![17.0, 21.0, 22.5, 24.0, 29.5],
            demands: vec![150, 96, 48, 108, 227],
            raw_width: 94.0,
            max_columns: 0,
            options: None,
        }
    }

    #[tokio::test]
    async fn test_available_solvers_lists_highs() {
        let response = GrpcRefinementService::new()
            .get_available_solvers(Request::new(refinement::Empty {}))
            .await
            .unwrap()
            .into_inner();
        let highs = response
            .solvers
            .iter()
            .find(|s| s.name == "HiGHS")
            .expect("HiGHS is always built with the server");
        assert!(highs.supports_duals);
        assert!(highs.supports_mip);
        assert!(highs.supports_warm_start);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_solving() {
        let mut request = paper_rolls();
        request.demands.pop();
        let status = GrpcRefinementService::new()
            .solve_cutting_stock(Request::new(request))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_watch_ends_with_result() {
        let response = GrpcRefinementService::new()
            .watch_lot_sizing(Request::new(refinement::LotSizingRequest {
                demands: vec![1.0, 3.0, 5.0, 3.0, 4.0, 2.0],
                setup_costs: vec![17.0, 16.0, 11.0, 6.0, 9.0, 6.0],
                production_costs: vec![5.0, 3.0, 2.0, 1.0, 3.0, 1.0],
                max_passes: 0,
                options: None,
            }))
            .await
            .unwrap();
        let updates: Vec<_> = response.into_inner().collect().await;
        let last = updates
            .last()
            .expect("at least the result")
            .as_ref()
            .unwrap();
        assert!(matches!(
            last.event,
            Some(refinement::pass_update::Event::LotSizingResult(_))
        ));
        let converged = updates.iter().filter(|u| {
            matches!(
                u.as_ref().map(|u| &u.event),
                Ok(Some(refinement::pass_update::Event::SeparationConverged(_)))
            )
        });
        assert_eq!(converged.count(), 1);
    }
}
