//! Cache revalidation module for the portal system.
//!
//! After a request record changes, the rendered pages that show it must be
//! invalidated so visitors see fresh data. Backends receive one path per
//! call; invalidation is best effort and failures are logged, never
//! propagated to the write that triggered them.

use async_trait::async_trait;
use portal_types::{ConfigSchema, ImplementationRegistry};
use thiserror::Error;
use tracing::warn;

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod memory;
}

/// Errors that can occur during revalidation operations.
#[derive(Debug, Error)]
pub enum RevalidateError {
	/// Error connecting to the revalidation endpoint.
	#[error("Network error: {0}")]
	Network(String),
	/// The endpoint refused the invalidation.
	#[error("Rejected: {0}")]
	Rejected(String),
	/// Error in the backend configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for revalidation backends.
#[async_trait]
pub trait RevalidationInterface: Send + Sync {
	/// Invalidates the cached rendering of a single path.
	///
	/// Must be idempotent: invalidating an uncached path succeeds.
	async fn invalidate(&self, path: &str) -> Result<(), RevalidateError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for revalidation factory functions.
pub type RevalidationFactory =
	fn(&toml::Value) -> Result<Box<dyn RevalidationInterface>, RevalidateError>;

/// Registry trait for revalidation implementations.
pub trait RevalidationRegistry: ImplementationRegistry<Factory = RevalidationFactory> {}

/// Get all registered revalidation implementations.
pub fn get_all_implementations() -> Vec<(&'static str, RevalidationFactory)> {
	use implementations::{http, memory};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level revalidation service.
pub struct RevalidationService {
	backend: Box<dyn RevalidationInterface>,
}

impl RevalidationService {
	/// Creates a new RevalidationService with the specified backend.
	pub fn new(backend: Box<dyn RevalidationInterface>) -> Self {
		Self { backend }
	}

	/// Invalidates every path, continuing past failures.
	///
	/// Each failure is logged at warn level and swallowed; a stale page is
	/// preferable to failing the write that made it stale.
	pub async fn invalidate_paths(&self, paths: &[String]) {
		for path in paths {
			if let Err(e) = self.backend.invalidate(path).await {
				warn!(path = %path, error = %e, "cache revalidation failed");
			}
		}
	}
}
