// src/strategy/split.rs

//! Proportional splitting and stock reservation arithmetic used by the
//! allocation policy.

use crate::Doses;

/// Share of `amount` that goes to one party with `weight`, out of all
/// parties' `total_weight`.
///
/// Formula: share = amount * weight / total_weight
///
/// A zero (or negative) total weight means nobody has a claim, so the share
/// is 0 rather than a NaN.
pub fn proportional_share(amount: Doses, weight: Doses, total_weight: Doses) -> Doses {
    if total_weight <= 0.0 {
        return 0.0;
    }
    amount * weight / total_weight
}

/// Largest number of first doses a two-dose product can start this week
/// while keeping enough stock for every second dose already promised.
///
/// Each first dose started now costs two doses in total (the first now, the
/// second later), hence the halving.
///
/// # Arguments
/// * `stock` - On-hand doses at the start of the week.
/// * `delivery` - Doses arriving this week.
/// * `committed` - Second doses owed from this week onward.
pub fn max_first_doses(stock: Doses, delivery: Doses, committed: Doses) -> Doses {
    let spare = stock + delivery - committed;
    (spare / 2.0).floor().max(0.0)
}
