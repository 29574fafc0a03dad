//! Common types module for the aligner portal service.
//!
//! This module defines the core data types and structures used throughout
//! the portal system. It provides a centralized location for shared types
//! to ensure consistency across all portal components.

/// API error shapes for HTTP endpoints.
pub mod api;
/// Customer (clinician) account types.
pub mod customer;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Treatment request types: statuses, prescription fields, write models.
pub mod request;
/// Storage namespace keys.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use customer::*;
pub use registry::*;
pub use request::*;
pub use storage::*;
pub use validation::*;
