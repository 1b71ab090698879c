use crate::model::plan::AdministrationPlan;
use crate::model::product::{PerProduct, Product};
use crate::Doses;
use log::warn;

/// On-hand dose inventory per product.
#[derive(Debug, Clone, PartialEq)]
pub struct StockLedger {
    on_hand: PerProduct<Doses>,

    // Last week's flows, kept for reporting
    pub last_delivered: PerProduct<Doses>,
    pub last_administered: PerProduct<Doses>,
}

impl StockLedger {
    pub fn new(initial: PerProduct<Doses>) -> Self {
        Self {
            on_hand: initial,
            last_delivered: PerProduct::default(),
            last_administered: PerProduct::default(),
        }
    }

    pub fn on_hand(&self) -> &PerProduct<Doses> {
        &self.on_hand
    }

    pub fn get(&self, product: Product) -> Doses {
        self.on_hand[product]
    }

    pub fn total(&self) -> Doses {
        self.on_hand.total()
    }

    /// Removes this week's administered doses and adds this week's
    /// deliveries. Stock is not clamped; going negative means the
    /// allocation overdrew a product.
    pub fn apply(&mut self, plan: &AdministrationPlan, delivered: &PerProduct<Doses>) {
        let administered = PerProduct::new(plan.a.total(), plan.b.total(), plan.single);

        for product in Product::ALL {
            self.on_hand[product] += delivered[product] - administered[product];
            if self.on_hand[product] < 0.0 {
                warn!(
                    "stock of product {:?} went negative: {:.2}",
                    product, self.on_hand[product]
                );
            }
        }

        self.last_delivered = *delivered;
        self.last_administered = administered;
    }
}
