pub mod capacity;
pub mod reporting;
pub mod supply;
