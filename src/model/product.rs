use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Supply sources tracked by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    /// First two-dose product.
    A,
    /// Second two-dose product.
    B,
    /// Single-dose product.
    Single,
}

impl Product {
    pub const ALL: [Product; 3] = [Product::A, Product::B, Product::Single];

    pub fn is_two_dose(self) -> bool {
        !matches!(self, Product::Single)
    }
}

/// One value per product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerProduct<T> {
    pub a: T,
    pub b: T,
    pub single: T,
}

impl<T> PerProduct<T> {
    pub fn new(a: T, b: T, single: T) -> Self {
        Self { a, b, single }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Product, &T) -> U) -> PerProduct<U> {
        PerProduct {
            a: f(Product::A, &self.a),
            b: f(Product::B, &self.b),
            single: f(Product::Single, &self.single),
        }
    }
}

impl PerProduct<f64> {
    pub fn total(&self) -> f64 {
        self.a + self.b + self.single
    }
}

impl<T> Index<Product> for PerProduct<T> {
    type Output = T;

    fn index(&self, product: Product) -> &T {
        match product {
            Product::A => &self.a,
            Product::B => &self.b,
            Product::Single => &self.single,
        }
    }
}

impl<T> IndexMut<Product> for PerProduct<T> {
    fn index_mut(&mut self, product: Product) -> &mut T {
        match product {
            Product::A => &mut self.a,
            Product::B => &mut self.b,
            Product::Single => &mut self.single,
        }
    }
}
