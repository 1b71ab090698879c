// src/io/capacity.rs

//! Weekly administration ceilings: linear growth from an observed baseline,
//! saturating at a scenario ceiling.

use crate::error::Result;
use crate::Doses;
use serde::Deserialize;
use std::path::Path;

/// Straight line `intercept + slope * x` fitted to weekly observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
}

/// Ordinary least squares fit over x = 1..=n.
///
/// Returns `None` with fewer than two observations.
pub fn fit_linear_trend(observations: &[Doses]) -> Option<LinearTrend> {
    let n = observations.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f + 1.0) / 2.0;
    let mean_y = observations.iter().sum::<f64>() / n_f;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in observations.iter().enumerate() {
        let dx = (i + 1) as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;

    Some(LinearTrend {
        intercept: mean_y - slope * mean_x,
        slope,
    })
}

/// Builds a weekly capacity curve.
///
/// Formula: capacity(w) = clamp(baseline + weekly_growth * (w - 1), 0, ceiling)
pub fn linear_capacity_curve(
    baseline: Doses,
    weekly_growth: Doses,
    ceiling: Doses,
    weeks: usize,
) -> Vec<Doses> {
    (0..weeks)
        .map(|w| {
            let raw = baseline + weekly_growth * w as f64;
            raw.min(ceiling).max(0.0)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ObservedRow {
    week: usize,
    doses: Doses,
}

/// Reads observed weekly administrations from a CSV file with `week` and
/// `doses` columns. Rows come back ordered by week.
pub fn read_observed_administration<P: AsRef<Path>>(path: P) -> Result<Vec<Doses>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: ObservedRow = record?;
        rows.push(row);
    }
    rows.sort_by_key(|r| r.week);
    Ok(rows.into_iter().map(|r| r.doses).collect())
}

/// Baseline and weekly growth estimated from observed administrations:
/// the last observation and the fitted slope.
pub fn estimate_growth(observations: &[Doses]) -> Option<(Doses, Doses)> {
    let trend = fit_linear_trend(observations)?;
    let last = *observations.last()?;
    Some((last, trend.slope))
}
