//! PostgreSQL implementation of the unit-of-work seam.

mod unit_of_work;

pub use unit_of_work::*;
