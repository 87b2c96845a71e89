// Cutting stock solved by column generation at the root node
//
// Rolls of width 94 are cut into five widths. Starting from one trivial
// pattern per width, each pass prices a new pattern against the demand
// duals; the integer model over all patterns found gives the plan.
//
//   cargo run --example cutting_stock

use letsrefine::{
    ColumnGeneration, ColumnGenerationConfig, ConsoleReporter, CuttingStockInstance,
    LoggingConfig, SolverFactory,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    LoggingConfig::default().with_level("warn").init();

    let instance = CuttingStockInstance::new(
        vec![17.0, 21.0, 22.5, 24.0, 29.5],
        vec![150, 96, 48, 108, 227],
        94.0,
    )?;

    let solver = SolverFactory::default_solver()?;
    println!("=== Cutting Stock ({}) ===\n", solver.name());

    let generation = ColumnGeneration::new(solver, ColumnGenerationConfig::default());
    let report = generation.run(&instance, &mut ConsoleReporter)?;

    println!("{}", report);
    println!("\nPatterns:");
    for (pattern, rolls) in report.patterns.iter().zip(&report.rolls_per_pattern) {
        println!(
            "  {:?}  width {:>5}  rolls {}",
            pattern.quantities,
            instance.pattern_width(&pattern.quantities),
            rolls
        );
    }

    Ok(())
}
