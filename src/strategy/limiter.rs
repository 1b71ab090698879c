// src/strategy/limiter.rs

use crate::error::{Result, SimulationError};
use crate::model::plan::AdministrationPlan;
use crate::{People, WeekIndex, EPSILON};
use log::warn;

/// Rewrites a plan that would start or complete protection for more people
/// than are left unprotected.
///
/// Allocations are peeled back in a fixed order: single doses, then first
/// doses of product A, then first doses of product B. Scheduled second doses
/// are never touched.
#[derive(Debug, Clone, Default)]
pub struct PopulationLimiter;

impl PopulationLimiter {
    pub fn new() -> Self {
        Self
    }

    /// Returns `plan` with exactly `-unprotected_next` doses removed.
    ///
    /// `unprotected_next` is the unprotected count the plan would produce.
    /// A non-negative value needs no correction and returns the plan as is.
    pub fn correct(
        &self,
        plan: &AdministrationPlan,
        unprotected_next: People,
        week: WeekIndex,
    ) -> Result<AdministrationPlan> {
        if unprotected_next >= 0.0 {
            return Ok(*plan);
        }
        let deficit = unprotected_next.abs();
        let mut corrected = *plan;
        corrected.corrected = true;

        if plan.single >= deficit {
            corrected.single = plan.single - deficit;
        } else if plan.single + plan.a.first >= deficit {
            corrected.single = 0.0;
            corrected.a.first = plan.a.first - (deficit - plan.single);
        } else {
            let remaining = deficit - plan.single - plan.a.first;
            if remaining > plan.b.first + EPSILON {
                return Err(SimulationError::UnrecoverableOverflow {
                    week,
                    shortfall: remaining - plan.b.first,
                });
            }
            corrected.single = 0.0;
            corrected.a.first = 0.0;
            corrected.b.first = (plan.b.first - remaining).max(0.0);
        }

        warn!(
            "week {}: population overshoot of {:.2}, plan reduced from {:.2} to {:.2} doses",
            week,
            deficit,
            plan.total(),
            corrected.total()
        );
        Ok(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan::{AllocationCase, DosePair};
    use assert_approx_eq::assert_approx_eq;

    fn plan(single: f64, first_a: f64, first_b: f64) -> AdministrationPlan {
        AdministrationPlan::new(
            AllocationCase::DemandBound,
            DosePair::new(first_a, 6.0),
            DosePair::new(first_b, 2.0),
            single,
        )
    }

    #[test]
    fn single_doses_absorb_small_deficit() {
        let corrected = PopulationLimiter::new()
            .correct(&plan(10.0, 4.0, 4.0), -3.0, 1)
            .unwrap();
        assert_eq!(corrected.single, 7.0);
        assert_eq!(corrected.a.first, 4.0);
        assert_eq!(corrected.b.first, 4.0);
        assert!(corrected.corrected);
    }

    #[test]
    fn first_doses_of_a_are_next() {
        let corrected = PopulationLimiter::new()
            .correct(&plan(3.0, 4.0, 10.0), -5.0, 2)
            .unwrap();
        assert_eq!(corrected.single, 0.0);
        assert_eq!(corrected.a.first, 2.0);
        assert_eq!(corrected.b.first, 10.0);
        assert_eq!(corrected.a.second, 6.0);
        assert_eq!(corrected.b.second, 2.0);
    }

    #[test]
    fn first_doses_of_b_are_last() {
        let corrected = PopulationLimiter::new()
            .correct(&plan(3.0, 4.0, 10.0), -8.0, 3)
            .unwrap();
        assert_eq!(corrected.single, 0.0);
        assert_eq!(corrected.a.first, 0.0);
        assert_eq!(corrected.b.first, 9.0);
        assert_eq!(corrected.second_doses(), 8.0);
        assert_approx_eq!(plan(3.0, 4.0, 10.0).total() - corrected.total(), 8.0);
    }

    #[test]
    fn deficit_beyond_first_doses_is_fatal() {
        let err = PopulationLimiter::new()
            .correct(&plan(1.0, 1.0, 1.0), -5.0, 7)
            .unwrap_err();
        match err {
            SimulationError::UnrecoverableOverflow { week, shortfall } => {
                assert_eq!(week, 7);
                assert_approx_eq!(shortfall, 2.0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn non_negative_projection_is_untouched() {
        let original = plan(1.0, 2.0, 3.0);
        let same = PopulationLimiter::new().correct(&original, 0.0, 1).unwrap();
        assert_eq!(same, original);
        assert!(!same.corrected);
    }
}
