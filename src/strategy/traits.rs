// src/strategy/traits.rs

use crate::model::plan::AdministrationPlan;
use crate::model::product::{PerProduct, Product};
use crate::{Doses, People, WeekIndex};
use std::fmt::Debug;

/// Everything an allocation policy may look at for one week.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationContext {
    pub week: WeekIndex,
    /// On-hand stock at the start of the week.
    pub stock: PerProduct<Doses>,
    /// Doses arriving this week.
    pub deliveries: PerProduct<Doses>,
    /// Shared ceiling for both two-dose products.
    pub capacity_two_dose: Doses,
    /// Ceiling for the single-dose product.
    pub capacity_single_dose: Doses,
    /// Second doses due this week, per two-dose product.
    pub due_a: Doses,
    pub due_b: Doses,
    /// Second doses owed from this week onward, per two-dose product.
    pub committed_a: Doses,
    pub committed_b: Doses,
    /// People who have not had any dose yet.
    pub unprotected: People,
}

impl AllocationContext {
    pub fn total_due(&self) -> Doses {
        self.due_a + self.due_b
    }

    /// Doses usable this week for a product: stock plus this week's delivery.
    pub fn available(&self, product: Product) -> Doses {
        self.stock[product] + self.deliveries[product]
    }
}

/// Decides how many doses of each kind to administer in a week.
///
/// `Send` is required so independent scenario runs can be spread over
/// threads.
pub trait AllocationPolicy: Debug + Send {
    fn allocate(&mut self, ctx: &AllocationContext) -> AdministrationPlan;
}
