// src/simulation/config.rs

use crate::error::{Result, SimulationError};
use crate::io::capacity::{estimate_growth, linear_capacity_curve, read_observed_administration};
use crate::io::supply::{build_delivery_schedule, Tranche};
use crate::model::population::PopulationCounts;
use crate::model::product::{PerProduct, Product};
use crate::{Doses, People, WeekIndex, EPSILON};
use chrono::{Duration, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoDoseProductConfig {
    /// Weeks between first and second dose.
    pub interval_weeks: usize,
    #[serde(default)]
    pub initial_stock: Doses,
    /// Second doses already due in weeks 1..=interval_weeks.
    #[serde(default)]
    pub initial_schedule: Vec<Doses>,
    /// Doses delivered every week of the horizon.
    #[serde(default)]
    pub constant_weekly: Doses,
    #[serde(default)]
    pub weekly_deliveries: Vec<Doses>,
    #[serde(default)]
    pub tranches: Vec<Tranche>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleDoseProductConfig {
    #[serde(default)]
    pub initial_stock: Doses,
    /// Doses delivered every week of the horizon.
    #[serde(default)]
    pub constant_weekly: Doses,
    #[serde(default)]
    pub weekly_deliveries: Vec<Doses>,
    #[serde(default)]
    pub tranches: Vec<Tranche>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsConfig {
    pub a: TwoDoseProductConfig,
    pub b: TwoDoseProductConfig,
    #[serde(default)]
    pub single: SingleDoseProductConfig,
}

/// Linear capacity growth. With `observed_history`, baseline and growth are
/// estimated from the file instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityGrowth {
    pub baseline: Doses,
    #[serde(default)]
    pub weekly_growth: Doses,
    #[serde(default)]
    pub observed_history: Option<PathBuf>,
}

impl CapacityGrowth {
    /// Baseline and weekly growth to build curves from.
    pub fn resolve(&self) -> Result<(Doses, Doses)> {
        match &self.observed_history {
            None => Ok((self.baseline, self.weekly_growth)),
            Some(path) => {
                let observed = read_observed_administration(path)?;
                estimate_growth(&observed).ok_or_else(|| {
                    SimulationError::config(format!(
                        "{} needs at least two observed weeks",
                        path.display()
                    ))
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub two_dose: CapacityGrowth,
    pub single_dose: CapacityGrowth,
}

/// Saturation levels for both capacity curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityScenario {
    pub name: String,
    pub two_dose_ceiling: Doses,
    pub single_dose_ceiling: Doses,
}

/// Products whose deliveries are included in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSet {
    pub name: String,
    pub products: Vec<Product>,
}

impl SupplierSet {
    pub fn includes(&self, product: Product) -> bool {
        self.products.contains(&product)
    }
}

/// Contents of the rollout TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub horizon_weeks: usize,
    pub start_date: NaiveDate,
    pub total_population: People,
    #[serde(default)]
    pub carry_over_unmet_seconds: bool,
    pub population: PopulationCounts,
    pub products: ProductsConfig,
    pub capacity: CapacityConfig,
    pub capacity_scenarios: Vec<CapacityScenario>,
    pub supplier_sets: Vec<SupplierSet>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_weeks: 26,
            start_date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap_or_default(),
            total_population: 100_000.0,
            carry_over_unmet_seconds: false,
            population: PopulationCounts {
                unprotected: 100_000.0,
                partially_protected: 0.0,
                fully_protected: 0.0,
            },
            products: ProductsConfig {
                a: TwoDoseProductConfig {
                    interval_weeks: 3,
                    initial_stock: 4_000.0,
                    initial_schedule: Vec::new(),
                    constant_weekly: 0.0,
                    weekly_deliveries: Vec::new(),
                    tranches: vec![Tranche {
                        first_week: 1,
                        last_week: 26,
                        doses: 78_000.0,
                    }],
                },
                b: TwoDoseProductConfig {
                    interval_weeks: 4,
                    initial_stock: 0.0,
                    initial_schedule: Vec::new(),
                    constant_weekly: 0.0,
                    weekly_deliveries: Vec::new(),
                    tranches: vec![Tranche {
                        first_week: 5,
                        last_week: 26,
                        doses: 44_000.0,
                    }],
                },
                single: SingleDoseProductConfig {
                    initial_stock: 0.0,
                    constant_weekly: 0.0,
                    weekly_deliveries: Vec::new(),
                    tranches: vec![Tranche {
                        first_week: 10,
                        last_week: 26,
                        doses: 17_000.0,
                    }],
                },
            },
            capacity: CapacityConfig {
                two_dose: CapacityGrowth {
                    baseline: 2_000.0,
                    weekly_growth: 250.0,
                    observed_history: None,
                },
                single_dose: CapacityGrowth {
                    baseline: 500.0,
                    weekly_growth: 50.0,
                    observed_history: None,
                },
            },
            capacity_scenarios: vec![
                CapacityScenario {
                    name: "low".to_string(),
                    two_dose_ceiling: 4_000.0,
                    single_dose_ceiling: 800.0,
                },
                CapacityScenario {
                    name: "high".to_string(),
                    two_dose_ceiling: 8_000.0,
                    single_dose_ceiling: 1_500.0,
                },
            ],
            supplier_sets: vec![
                SupplierSet {
                    name: "all".to_string(),
                    products: Product::ALL.to_vec(),
                },
                SupplierSet {
                    name: "two_dose_only".to_string(),
                    products: vec![Product::A, Product::B],
                },
            ],
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(data: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }

    /// Checks the parts of the file that are shared by every scenario run.
    pub fn validate(&self) -> Result<()> {
        if self.capacity_scenarios.is_empty() {
            return Err(SimulationError::config("no capacity scenarios defined"));
        }
        if self.supplier_sets.is_empty() {
            return Err(SimulationError::config("no supplier sets defined"));
        }
        for scenario in &self.capacity_scenarios {
            let name = &scenario.name;
            non_negative(&format!("{} two-dose ceiling", name), scenario.two_dose_ceiling)?;
            non_negative(&format!("{} single-dose ceiling", name), scenario.single_dose_ceiling)?;
        }
        for tranche in self.all_tranches() {
            tranche.validate()?;
        }
        Ok(())
    }

    fn all_tranches(&self) -> impl Iterator<Item = &Tranche> {
        self.products
            .a
            .tranches
            .iter()
            .chain(&self.products.b.tranches)
            .chain(&self.products.single.tranches)
    }

    /// Builds the immutable inputs of one run. Every call returns fresh,
    /// independently owned data.
    pub fn build_inputs(
        &self,
        scenario: &CapacityScenario,
        suppliers: &SupplierSet,
    ) -> Result<SimulationInputs> {
        let weeks = self.horizon_weeks;
        let products = &self.products;

        let mut deliveries = PerProduct::new(
            build_delivery_schedule(
                weeks,
                products.a.constant_weekly,
                &products.a.weekly_deliveries,
                &products.a.tranches,
            )?,
            build_delivery_schedule(
                weeks,
                products.b.constant_weekly,
                &products.b.weekly_deliveries,
                &products.b.tranches,
            )?,
            build_delivery_schedule(
                weeks,
                products.single.constant_weekly,
                &products.single.weekly_deliveries,
                &products.single.tranches,
            )?,
        );
        for product in Product::ALL {
            if !suppliers.includes(product) {
                deliveries[product] = vec![0.0; weeks];
            }
        }

        let (two_base, two_growth) = self.capacity.two_dose.resolve()?;
        let (single_base, single_growth) = self.capacity.single_dose.resolve()?;

        let inputs = SimulationInputs {
            horizon_weeks: weeks,
            start_date: self.start_date,
            total_population: self.total_population,
            carry_over_unmet_seconds: self.carry_over_unmet_seconds,
            initial_population: self.population,
            initial_stock: PerProduct::new(
                products.a.initial_stock,
                products.b.initial_stock,
                products.single.initial_stock,
            ),
            interval_a: products.a.interval_weeks,
            interval_b: products.b.interval_weeks,
            initial_schedule_a: products.a.initial_schedule.clone(),
            initial_schedule_b: products.b.initial_schedule.clone(),
            deliveries,
            capacity_two_dose: linear_capacity_curve(
                two_base,
                two_growth,
                scenario.two_dose_ceiling,
                weeks,
            ),
            capacity_single_dose: linear_capacity_curve(
                single_base,
                single_growth,
                scenario.single_dose_ceiling,
                weeks,
            ),
        };
        inputs.validate()?;
        Ok(inputs)
    }
}

/// Everything a single run consumes. Built once before week 1 and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInputs {
    pub horizon_weeks: usize,
    pub start_date: NaiveDate,
    pub total_population: People,
    pub carry_over_unmet_seconds: bool,
    pub initial_population: PopulationCounts,
    pub initial_stock: PerProduct<Doses>,
    pub interval_a: usize,
    pub interval_b: usize,
    pub initial_schedule_a: Vec<Doses>,
    pub initial_schedule_b: Vec<Doses>,
    /// Indexed by week - 1.
    pub deliveries: PerProduct<Vec<Doses>>,
    pub capacity_two_dose: Vec<Doses>,
    pub capacity_single_dose: Vec<Doses>,
}

impl SimulationInputs {
    pub fn validate(&self) -> Result<()> {
        if self.horizon_weeks < 1 {
            return Err(SimulationError::config("horizon must be at least one week"));
        }
        for (name, interval, seed) in [
            ("a", self.interval_a, &self.initial_schedule_a),
            ("b", self.interval_b, &self.initial_schedule_b),
        ] {
            if interval < 1 {
                return Err(SimulationError::config(format!(
                    "product {} needs a dose interval of at least one week",
                    name
                )));
            }
            if seed.len() > interval {
                return Err(SimulationError::config(format!(
                    "product {} schedules {} weeks of second doses but its interval is {}",
                    name,
                    seed.len(),
                    interval
                )));
            }
            all_non_negative(&format!("product {} initial schedule", name), seed)?;
        }

        let pop = &self.initial_population;
        non_negative("total population", self.total_population)?;
        non_negative("unprotected population", pop.unprotected)?;
        non_negative("partially protected population", pop.partially_protected)?;
        non_negative("fully protected population", pop.fully_protected)?;
        if (pop.total() - self.total_population).abs() > EPSILON {
            return Err(SimulationError::config(format!(
                "population segments sum to {} but total population is {}",
                pop.total(),
                self.total_population
            )));
        }

        for product in Product::ALL {
            let label = format!("{:?}", product);
            non_negative(&format!("{} initial stock", label), self.initial_stock[product])?;
            curve_covers_horizon(
                &format!("{} deliveries", label),
                &self.deliveries[product],
                self.horizon_weeks,
            )?;
        }
        curve_covers_horizon("two-dose capacity", &self.capacity_two_dose, self.horizon_weeks)?;
        curve_covers_horizon(
            "single-dose capacity",
            &self.capacity_single_dose,
            self.horizon_weeks,
        )?;

        let scheduled: Doses = self.initial_schedule_a.iter().chain(&self.initial_schedule_b).sum();
        if (scheduled - pop.partially_protected).abs() > EPSILON {
            warn!(
                "{} people are partially protected but {} second doses are scheduled",
                pop.partially_protected, scheduled
            );
        }
        Ok(())
    }

    /// Deliveries arriving in `week`.
    pub fn deliveries_at(&self, week: WeekIndex) -> PerProduct<Doses> {
        self.deliveries
            .map(|_, schedule| schedule.get(week - 1).copied().unwrap_or(0.0))
    }

    pub fn capacity_at(&self, week: WeekIndex) -> (Doses, Doses) {
        (
            self.capacity_two_dose.get(week - 1).copied().unwrap_or(0.0),
            self.capacity_single_dose.get(week - 1).copied().unwrap_or(0.0),
        )
    }

    /// Calendar date on which `week` starts.
    pub fn date_of(&self, week: WeekIndex) -> NaiveDate {
        self.start_date + Duration::weeks(week as i64 - 1)
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value < 0.0 || value.is_nan() {
        return Err(SimulationError::config(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn all_non_negative(name: &str, values: &[f64]) -> Result<()> {
    values.iter().try_for_each(|v| non_negative(name, *v))
}

fn curve_covers_horizon(name: &str, values: &[f64], weeks: usize) -> Result<()> {
    if values.len() < weeks {
        return Err(SimulationError::config(format!(
            "{} cover {} weeks, horizon is {}",
            name,
            values.len(),
            weeks
        )));
    }
    all_non_negative(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
horizon_weeks = 4
start_date = "2021-03-01"
total_population = 1000.0
carry_over_unmet_seconds = true

[population]
unprotected = 990.0
partially_protected = 10.0
fully_protected = 0.0

[products.a]
interval_weeks = 3
initial_stock = 200.0
initial_schedule = [10.0]
tranches = [{ first_week = 1, last_week = 4, doses = 400.0 }]

[products.b]
interval_weeks = 4
constant_weekly = 5.0
weekly_deliveries = [0.0, 50.0, 50.0, 50.0]

[products.single]
constant_weekly = 8.0

[capacity.two_dose]
baseline = 100.0
weekly_growth = 20.0

[capacity.single_dose]
baseline = 10.0

[[capacity_scenarios]]
name = "base"
two_dose_ceiling = 130.0
single_dose_ceiling = 10.0

[[supplier_sets]]
name = "a_only"
products = ["a"]
"#;

    #[test]
    fn parse_sample_toml() {
        let config = SimulationConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.horizon_weeks, 4);
        assert!(config.carry_over_unmet_seconds);
        assert_eq!(config.products.single.constant_weekly, 8.0);
        assert!(config.products.single.tranches.is_empty());
        assert_eq!(config.supplier_sets[0].products, vec![Product::A]);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
    }

    #[test]
    fn inputs_follow_scenario_and_suppliers() {
        let config = SimulationConfig::from_toml_str(SAMPLE).unwrap();
        let inputs = config
            .build_inputs(&config.capacity_scenarios[0], &config.supplier_sets[0])
            .unwrap();

        assert_eq!(inputs.deliveries.a, vec![100.0; 4]);
        // products b and single are not in the supplier set
        assert_eq!(inputs.deliveries.b, vec![0.0; 4]);
        assert_eq!(inputs.deliveries.single, vec![0.0; 4]);

        let everyone = SupplierSet {
            name: "all".to_string(),
            products: Product::ALL.to_vec(),
        };
        let inputs = config
            .build_inputs(&config.capacity_scenarios[0], &everyone)
            .unwrap();
        assert_eq!(inputs.deliveries.b, vec![5.0, 55.0, 55.0, 55.0]);
        assert_eq!(inputs.deliveries.single, vec![8.0; 4]);
        assert_eq!(inputs.capacity_two_dose, vec![100.0, 120.0, 130.0, 130.0]);
        assert_eq!(inputs.capacity_single_dose, vec![10.0; 4]);
        assert_eq!(inputs.deliveries_at(2).a, 100.0);
        assert_eq!(inputs.capacity_at(3), (130.0, 10.0));
        assert_eq!(inputs.date_of(2), NaiveDate::from_ymd_opt(2021, 3, 8).unwrap());
    }

    #[test]
    fn default_config_builds() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        for scenario in &config.capacity_scenarios {
            for suppliers in &config.supplier_sets {
                config.build_inputs(scenario, suppliers).unwrap();
            }
        }
    }

    fn default_inputs() -> SimulationInputs {
        let config = SimulationConfig::default();
        config
            .build_inputs(&config.capacity_scenarios[0], &config.supplier_sets[0])
            .unwrap()
    }

    #[test]
    fn population_must_sum_to_total() {
        let mut inputs = default_inputs();
        inputs.initial_population.unprotected -= 1.0;
        assert!(matches!(inputs.validate(), Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let mut inputs = default_inputs();
        inputs.horizon_weeks = 0;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn negative_values_are_rejected() {
        let mut inputs = default_inputs();
        inputs.capacity_two_dose[3] = -1.0;
        assert!(inputs.validate().is_err());

        let mut inputs = default_inputs();
        inputs.deliveries.single[0] = -5.0;
        assert!(inputs.validate().is_err());

        let mut inputs = default_inputs();
        inputs.initial_stock.b = -1.0;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn short_curves_and_long_seeds_are_rejected() {
        let mut inputs = default_inputs();
        inputs.capacity_single_dose.pop();
        assert!(inputs.validate().is_err());

        let mut inputs = default_inputs();
        inputs.initial_schedule_a = vec![0.0; inputs.interval_a + 1];
        assert!(inputs.validate().is_err());

        let mut inputs = default_inputs();
        inputs.interval_b = 0;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut config = SimulationConfig::default();
        config.supplier_sets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bundled_rollout_file_is_valid() {
        let config = SimulationConfig::from_toml_str(include_str!("../../rollout.toml")).unwrap();
        assert_eq!(config.capacity_scenarios.len(), 3);
        assert_eq!(config.products.a.initial_schedule.len(), 3);
        let inputs = config
            .build_inputs(&config.capacity_scenarios[2], &config.supplier_sets[1])
            .unwrap();
        assert_eq!(inputs.deliveries.single, vec![0.0; 30]);
        assert_eq!(inputs.capacity_two_dose[0], 40_000.0);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SimulationConfig::from_toml_str("horizon_weeks = \"ten\"").unwrap_err();
        assert!(matches!(err, SimulationError::Toml(_)));
    }
}
