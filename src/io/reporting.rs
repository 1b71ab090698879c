// src/io/reporting.rs

use crate::error::Result;
use crate::simulation::engine::OutcomesRow;
use crate::simulation::scenarios::ScenarioOutcome;
use log::info;
use std::path::{Path, PathBuf};

/// Writes one run's weekly outcomes to a CSV file.
///
/// # Arguments
/// * `file_path` - Where to save the file (e.g., "results/outcomes_high_all.csv").
/// * `data` - Rows in week order.
pub fn write_outcomes<P: AsRef<Path>>(file_path: P, data: &[OutcomesRow]) -> Result<()> {
    let path = file_path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    for record in data {
        wtr.serialize(record)?;
    }

    // Flush the buffer to ensure all data is written
    wtr.flush()?;

    info!("Exported {} rows to '{}'", data.len(), path.display());
    Ok(())
}

/// File name for a scenario's outcomes, safe to use on any platform.
pub fn outcome_file_name(outcome: &ScenarioOutcome) -> String {
    let label: String = outcome
        .label()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("outcomes_{}.csv", label)
}

/// Writes every scenario into `dir`, returning the files written.
pub fn write_scenario_outcomes<P: AsRef<Path>>(
    dir: P,
    outcomes: &[ScenarioOutcome],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir.as_ref())?;
    outcomes
        .iter()
        .map(|outcome| {
            let path = dir.as_ref().join(outcome_file_name(outcome));
            write_outcomes(&path, &outcome.history)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::SimulationConfig;
    use crate::simulation::scenarios::run_scenario;

    #[test]
    fn file_names_are_sanitized() {
        let outcome = ScenarioOutcome {
            capacity: "high ceiling".to_string(),
            suppliers: "a+b".to_string(),
            total_population: 1.0,
            history: Vec::new(),
        };
        assert_eq!(outcome_file_name(&outcome), "outcomes_high_ceiling_a_b.csv");
    }

    #[test]
    fn csv_has_header_and_one_line_per_week() {
        let config = SimulationConfig::default();
        let outcome = run_scenario(
            &config,
            &config.capacity_scenarios[0],
            &config.supplier_sets[0],
        )
        .unwrap();

        let dir = std::env::temp_dir()
            .join(format!("vaccine_rollout_report_{}", std::process::id()));
        let written = write_scenario_outcomes(&dir, &[outcome]).unwrap();
        let text = std::fs::read_to_string(&written[0]).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("week,date,allocation_case,doses_administered"));
        assert!(header.ends_with("fully_protected,corrected"));
        assert_eq!(lines.count(), config.horizon_weeks);
        assert!(text.contains("2021-01-04"));
        assert!(text.contains("CapacityBoundDemand"));
    }
}
