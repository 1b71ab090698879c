pub mod plan;
pub mod population;
pub mod product;
pub mod schedule;
pub mod stock;
