//! # Forging Config
//!
//! Configuration management for the user aggregate store.
//! Supports layered configuration from files and environment variables,
//! validated before use.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
