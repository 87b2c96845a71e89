// Example client streaming a cutting-stock run from the refinement server
//
// Cuts rolls of width 94 into five widths:
//   width   17  21  22.5  24  29.5
//   demand 150  96    48 108   227
// Each pass of column generation arrives as it happens; the last message
// carries the integer plan.
//
// Start the server first:  cargo run --features server --bin letsrefine-server

use tonic::Request;

pub mod refinement {
    tonic::include_proto!("refinement");
}

use refinement::{
    pass_update::Event, refinement_solver_client::RefinementSolverClient, CuttingStockRequest,
    Empty, SolverBackend, SolverOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut client = RefinementSolverClient::connect("http://127.0.0.1:50051").await?;

    let solvers = client
        .get_available_solvers(Request::new(Empty {}))
        .await?
        .into_inner()
        .solvers;
    println!("Available solvers:");
    for solver in &solvers {
        println!(
            "  {} (MIP: {}, duals: {})",
            solver.name, solver.supports_mip, solver.supports_duals
        );
    }

    println!("\n=== Cutting Stock by Column Generation ===\n");

    let request = CuttingStockRequest {
        widths: vec![17.0, 21.0, 22.5, 24.0, 29.5],
        demands: vec![150, 96, 48, 108, 227],
        raw_width: 94.0,
        max_columns: 10,
        options: Some(SolverOptions {
            solver: SolverBackend::Highs as i32,
            ..Default::default()
        }),
    };

    let mut updates = client
        .watch_cutting_stock(Request::new(request))
        .await?
        .into_inner();

    while let Some(update) = updates.message().await? {
        match update.event {
            Some(Event::CuttingStockResult(result)) => {
                println!("\n{}", update.summary);
                println!("\nPatterns:");
                for (i, pattern) in result.patterns.iter().enumerate() {
                    println!(
                        "  pat_{:<3} {:?}  rolls {}",
                        i + 1,
                        pattern.quantities,
                        pattern.rolls
                    );
                }
                println!(
                    "\n{} passes, {:.1} ms on {}",
                    result.passes, result.elapsed_ms, result.solver_backend
                );
            }
            Some(_) => println!("{}", update.summary),
            None => {}
        }
    }

    Ok(())
}
