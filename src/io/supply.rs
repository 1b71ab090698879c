// src/io/supply.rs

use crate::error::{Result, SimulationError};
use crate::{Doses, WeekIndex};
use serde::{Deserialize, Serialize};

/// A published supply commitment: `doses` delivered evenly over the
/// inclusive week range `first_week..=last_week`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tranche {
    pub first_week: WeekIndex,
    pub last_week: WeekIndex,
    pub doses: Doses,
}

impl Tranche {
    pub fn weekly_doses(&self) -> Doses {
        self.doses / (self.last_week - self.first_week + 1) as Doses
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_week < 1 || self.last_week < self.first_week {
            return Err(SimulationError::config(format!(
                "tranche weeks {}..={} are not a valid range",
                self.first_week, self.last_week
            )));
        }
        if self.doses < 0.0 {
            return Err(SimulationError::config(format!(
                "tranche for weeks {}..={} has negative size {}",
                self.first_week, self.last_week, self.doses
            )));
        }
        Ok(())
    }
}

/// Generates a schedule where every week delivers the same amount.
pub fn generate_constant_deliveries(weeks: usize, value: Doses) -> Vec<Doses> {
    vec![value; weeks]
}

/// Spreads each tranche evenly over its weeks. Weeks past the horizon are
/// dropped; overlapping tranches add up.
pub fn spread_tranches(weeks: usize, tranches: &[Tranche]) -> Result<Vec<Doses>> {
    let mut schedule = vec![0.0; weeks];
    for tranche in tranches {
        tranche.validate()?;
        let per_week = tranche.weekly_doses();
        for week in tranche.first_week..=tranche.last_week.min(weeks) {
            schedule[week - 1] += per_week;
        }
    }
    Ok(schedule)
}

/// Full delivery schedule for one product: a constant weekly amount,
/// explicit weekly amounts and tranches added together, cut to `weeks`.
pub fn build_delivery_schedule(
    weeks: usize,
    constant: Doses,
    weekly: &[Doses],
    tranches: &[Tranche],
) -> Result<Vec<Doses>> {
    if let Some(bad) = weekly.iter().chain([&constant]).find(|d| **d < 0.0) {
        return Err(SimulationError::config(format!(
            "weekly delivery of {} doses is negative",
            bad
        )));
    }
    let mut schedule = generate_constant_deliveries(weeks, constant);
    for (slot, tranche_doses) in schedule.iter_mut().zip(spread_tranches(weeks, tranches)?) {
        *slot += tranche_doses;
    }
    for (slot, extra) in schedule.iter_mut().zip(weekly) {
        *slot += extra;
    }
    Ok(schedule)
}
