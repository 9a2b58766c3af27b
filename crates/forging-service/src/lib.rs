//! # Forging Service
//!
//! Application service for user aggregate writes: request DTOs, validation,
//! the aggregate writer call and the mapping of its result to an [`Outcome`].

pub mod di;
pub mod dto;
pub mod r#impl;
pub mod outcome;
pub mod user_aggregate_service;

pub use dto::*;
pub use outcome::*;
pub use r#impl::{UserAggregateServiceComponent, UserAggregateServiceImpl};
pub use user_aggregate_service::*;
