use crate::Doses;
use serde::Serialize;

/// Which row of the allocation decision table produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationCase {
    /// Capacity does not even cover the second doses due this week.
    CapacityBoundSeconds,
    /// Nobody is left without a first dose.
    NoFirstDoseDemand,
    /// Capacity covers the seconds but not every first dose stock allows.
    CapacityBoundDemand,
    /// Capacity exceeds everything stock allows.
    DemandBound,
}

/// First and second doses of one two-dose product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DosePair {
    pub first: Doses,
    pub second: Doses,
}

impl DosePair {
    pub fn new(first: Doses, second: Doses) -> Self {
        Self { first, second }
    }

    pub fn total(&self) -> Doses {
        self.first + self.second
    }
}

/// The weekly administration decision. This is the only thing the ledgers
/// are advanced with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdministrationPlan {
    pub case: AllocationCase,
    pub a: DosePair,
    pub b: DosePair,
    pub single: Doses,
    /// Set when the plan was rewritten by the population limiter.
    pub corrected: bool,
}

impl AdministrationPlan {
    pub fn new(case: AllocationCase, a: DosePair, b: DosePair, single: Doses) -> Self {
        Self {
            case,
            a,
            b,
            single,
            corrected: false,
        }
    }

    pub fn first_doses(&self) -> Doses {
        self.a.first + self.b.first
    }

    pub fn second_doses(&self) -> Doses {
        self.a.second + self.b.second
    }

    pub fn two_dose_total(&self) -> Doses {
        self.a.total() + self.b.total()
    }

    pub fn total(&self) -> Doses {
        self.two_dose_total() + self.single
    }

    /// People who become fully protected through this plan.
    pub fn completions(&self) -> Doses {
        self.second_doses() + self.single
    }
}
