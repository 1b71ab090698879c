// src/strategy/allocator.rs

use crate::model::plan::{AdministrationPlan, AllocationCase, DosePair};
use crate::model::product::Product;
use crate::strategy::split::{max_first_doses, proportional_share};
use crate::strategy::traits::{AllocationContext, AllocationPolicy};
use crate::{Doses, EPSILON};
use log::debug;

/// Second doses first, then as many first doses as stock and capacity allow.
///
/// The decision table is evaluated top to bottom and the first matching row
/// wins:
///
/// | case                   | guard                                         |
/// |------------------------|-----------------------------------------------|
/// | `CapacityBoundSeconds` | capacity <= seconds due                       |
/// | `NoFirstDoseDemand`    | nobody is unprotected                         |
/// | `CapacityBoundDemand`  | capacity <= seconds due + max first doses     |
/// | `DemandBound`          | otherwise                                     |
///
/// The single-dose product has its own ceiling and is allocated the same
/// way in every case.
#[derive(Debug, Clone, Default)]
pub struct SecondDosePriority;

impl SecondDosePriority {
    pub fn new() -> Self {
        Self
    }
}

/// Upper bound on first doses for both two-dose products.
pub fn first_dose_limits(ctx: &AllocationContext) -> (Doses, Doses) {
    (
        max_first_doses(ctx.stock.a, ctx.deliveries.a, ctx.committed_a),
        max_first_doses(ctx.stock.b, ctx.deliveries.b, ctx.committed_b),
    )
}

/// Picks the row of the decision table that applies to `ctx`.
pub fn classify(ctx: &AllocationContext) -> AllocationCase {
    let due = ctx.total_due();
    if ctx.capacity_two_dose <= due {
        return AllocationCase::CapacityBoundSeconds;
    }
    if ctx.unprotected <= EPSILON {
        return AllocationCase::NoFirstDoseDemand;
    }
    let (max_a, max_b) = first_dose_limits(ctx);
    if ctx.capacity_two_dose <= due + max_a + max_b {
        AllocationCase::CapacityBoundDemand
    } else {
        AllocationCase::DemandBound
    }
}

fn single_dose_allocation(ctx: &AllocationContext) -> Doses {
    ctx.capacity_single_dose
        .min(ctx.available(Product::Single))
        .max(0.0)
}

impl AllocationPolicy for SecondDosePriority {
    fn allocate(&mut self, ctx: &AllocationContext) -> AdministrationPlan {
        let case = classify(ctx);
        let single = single_dose_allocation(ctx);
        let due = ctx.total_due();

        let (a, b) = match case {
            AllocationCase::CapacityBoundSeconds => {
                let capacity = ctx.capacity_two_dose;
                (
                    DosePair::new(0.0, proportional_share(capacity, ctx.due_a, due)),
                    DosePair::new(0.0, proportional_share(capacity, ctx.due_b, due)),
                )
            }
            AllocationCase::NoFirstDoseDemand => {
                (DosePair::new(0.0, ctx.due_a), DosePair::new(0.0, ctx.due_b))
            }
            AllocationCase::CapacityBoundDemand => {
                let (max_a, max_b) = first_dose_limits(ctx);
                let remaining = ctx.capacity_two_dose - due;
                (
                    DosePair::new(proportional_share(remaining, max_a, max_a + max_b), ctx.due_a),
                    DosePair::new(proportional_share(remaining, max_b, max_a + max_b), ctx.due_b),
                )
            }
            AllocationCase::DemandBound => {
                let (max_a, max_b) = first_dose_limits(ctx);
                (DosePair::new(max_a, ctx.due_a), DosePair::new(max_b, ctx.due_b))
            }
        };

        debug!(
            "week {}: {:?} a={:?} b={:?} single={:.1}",
            ctx.week, case, a, b, single
        );
        AdministrationPlan::new(case, a, b, single)
    }
}
