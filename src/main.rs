use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::env;
use std::process;
use vaccine_rollout::io::reporting;
use vaccine_rollout::simulation::config::SimulationConfig;
use vaccine_rollout::simulation::scenarios::run_scenario_grid;

fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).init() {
        eprintln!("Could not install logger: {}", e);
    }

    println!("=== Vaccine Rollout Simulation ===");

    // 1. LOAD CONFIGURATION
    let args: Vec<String> = env::args().collect();
    let config_path = args.get(1).map(String::as_str).unwrap_or("rollout.toml");
    let output_dir = args.get(2).map(String::as_str).unwrap_or(".");

    let config = match SimulationConfig::from_toml_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading '{}': {}", config_path, e);
            process::exit(1);
        }
    };

    // 2. RUN EVERY CAPACITY SCENARIO AGAINST EVERY SUPPLIER SET
    println!(
        "Running {} scenarios for {} weeks...",
        config.capacity_scenarios.len() * config.supplier_sets.len(),
        config.horizon_weeks
    );
    let outcomes = match run_scenario_grid(&config) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            process::exit(1);
        }
    };

    // 3. EXPORT RESULTS
    match reporting::write_scenario_outcomes(output_dir, &outcomes) {
        Ok(files) => println!("Success! {} files written to {}", files.len(), output_dir),
        Err(e) => eprintln!("Error writing CSV: {}", e),
    }

    // 4. PRINT SUMMARY
    println!("\n=== Scenario Summary ===");
    let week_label = |week: Option<usize>| match week {
        Some(w) => format!("week {}", w),
        None => "not reached".to_string(),
    };
    for outcome in &outcomes {
        println!(
            "{}: {:.0} doses, {:.1}% mean utilization, 50% protected: {}, 70% protected: {}",
            outcome.label(),
            outcome.total_administered(),
            outcome.mean_utilization() * 100.0,
            week_label(outcome.week_reaching_coverage(0.5)),
            week_label(outcome.week_reaching_coverage(0.7)),
        );
        let corrected = outcome.corrected_weeks();
        if !corrected.is_empty() {
            println!("  population limit applied in weeks {:?}", corrected);
        }
    }

    println!("\nSimulation Complete.");
}
