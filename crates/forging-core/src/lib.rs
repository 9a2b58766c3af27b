//! # Forging Core
//!
//! Core types, domain model, and error definitions shared by every layer of
//! the user aggregate store: the error taxonomy, typed identifiers, the
//! `UserAggregate` itself and request validation helpers.

pub mod domain;
pub mod error;
pub mod id;
pub mod result;
pub mod telemetry;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use result::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
