//! Domain model of the user aggregate.

pub mod relation;
pub mod user_aggregate;

pub use relation::*;
pub use user_aggregate::*;
