pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use crate::error::{Result, SimulationError};

/// Number of vaccine doses. Proportional splits yield fractional doses, so
/// this is real-valued.
pub type Doses = f64;

/// Number of people in a population segment.
pub type People = f64;

/// Simulation week, starting at 1.
pub type WeekIndex = usize;

/// Absolute tolerance used when comparing derived population counts to zero.
pub const EPSILON: f64 = 1e-6;
