use crate::model::plan::AdministrationPlan;
use crate::People;
use serde::{Deserialize, Serialize};

/// Population split by dose history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub unprotected: People,
    pub partially_protected: People,
    pub fully_protected: People,
}

impl PopulationCounts {
    pub fn total(&self) -> People {
        self.unprotected + self.partially_protected + self.fully_protected
    }
}

/// Tracks protection status for a fixed total population.
///
/// Partial protection is re-derived every week from the pending second-dose
/// obligations rather than kept as a running counter.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationTracker {
    total: People,
    counts: PopulationCounts,
}

impl PopulationTracker {
    pub fn new(total: People, counts: PopulationCounts) -> Self {
        Self { total, counts }
    }

    pub fn counts(&self) -> &PopulationCounts {
        &self.counts
    }

    pub fn unprotected(&self) -> People {
        self.counts.unprotected
    }

    /// Counts that would result from committing `plan`, where
    /// `pending_next` is every second dose still owed after this week.
    pub fn project(&self, pending_next: People, plan: &AdministrationPlan) -> PopulationCounts {
        let fully_protected = self.counts.fully_protected + plan.completions();
        PopulationCounts {
            unprotected: self.total - fully_protected - pending_next,
            partially_protected: pending_next,
            fully_protected,
        }
    }

    pub fn apply(&mut self, pending_next: People, plan: &AdministrationPlan) {
        self.counts = self.project(pending_next, plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan::{AllocationCase, DosePair};

    fn plan(first_a: f64, second_a: f64, second_b: f64, single: f64) -> AdministrationPlan {
        AdministrationPlan::new(
            AllocationCase::DemandBound,
            DosePair::new(first_a, second_a),
            DosePair::new(0.0, second_b),
            single,
        )
    }

    #[test]
    fn partial_comes_from_pending_obligations() {
        let mut tracker = PopulationTracker::new(
            100.0,
            PopulationCounts {
                unprotected: 80.0,
                partially_protected: 15.0,
                fully_protected: 5.0,
            },
        );
        // 10 seconds for A, 2 for B, 3 single doses; 20 people still owed a second
        tracker.apply(20.0, &plan(7.0, 10.0, 2.0, 3.0));

        let counts = tracker.counts();
        assert_eq!(counts.fully_protected, 20.0);
        assert_eq!(counts.partially_protected, 20.0);
        assert_eq!(counts.unprotected, 60.0);
        assert_eq!(counts.total(), 100.0);
    }

    #[test]
    fn projection_does_not_commit() {
        let tracker = PopulationTracker::new(
            10.0,
            PopulationCounts {
                unprotected: 10.0,
                ..Default::default()
            },
        );
        let projected = tracker.project(12.0, &plan(12.0, 0.0, 0.0, 0.0));
        assert_eq!(projected.unprotected, -2.0);
        assert_eq!(tracker.unprotected(), 10.0);
    }
}
