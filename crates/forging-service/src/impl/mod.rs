//! User aggregate service implementations.
//!
//! Trait definitions live in the parent module (`user_aggregate_service.rs`).

pub mod user_aggregate_service_impl;

pub use user_aggregate_service_impl::{UserAggregateServiceComponent, UserAggregateServiceImpl};
