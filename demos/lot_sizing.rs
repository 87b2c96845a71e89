// Economic lot sizing solved by adding (l,S) inequalities at the root node
//
// Six periods with a setup cost and a unit production cost each and no
// holding cost. Cuts are added in rounds until the LP optimum violates
// none of them, at which point the setups are integral.
//
//   cargo run --example lot_sizing

use letsrefine::{
    ConsoleReporter, CutGeneration, CutGenerationConfig, LoggingConfig, LotSizingInstance,
    SolverFactory,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    LoggingConfig::default().with_level("warn").init();

    let instance = LotSizingInstance::new(
        vec![1.0, 3.0, 5.0, 3.0, 4.0, 2.0],
        vec![17.0, 16.0, 11.0, 6.0, 9.0, 6.0],
        vec![5.0, 3.0, 2.0, 1.0, 3.0, 1.0],
    )?;

    let solver = SolverFactory::default_solver()?;
    println!("=== Economic Lot Sizing ({}) ===\n", solver.name());

    let generation = CutGeneration::new(solver, CutGenerationConfig::default());
    let report = generation.run(&instance, &mut ConsoleReporter)?;

    print!("{}", report);

    Ok(())
}
