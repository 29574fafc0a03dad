//! In-memory revalidation implementation.
//!
//! Records invalidated paths instead of calling a frontend. Used in tests
//! and development configurations.

use crate::{RevalidateError, RevalidationFactory, RevalidationInterface, RevalidationRegistry};
use async_trait::async_trait;
use portal_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Revalidation backend that records every invalidated path.
#[derive(Clone, Default)]
pub struct MemoryRevalidation {
	invalidated: Arc<RwLock<Vec<String>>>,
}

impl MemoryRevalidation {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a snapshot of the paths invalidated so far.
	pub async fn invalidated(&self) -> Vec<String> {
		self.invalidated.read().await.clone()
	}
}

#[async_trait]
impl RevalidationInterface for MemoryRevalidation {
	async fn invalidate(&self, path: &str) -> Result<(), RevalidateError> {
		self.invalidated.write().await.push(path.to_string());
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryRevalidationSchema)
	}
}

/// Configuration schema for MemoryRevalidation.
pub struct MemoryRevalidationSchema;

impl ConfigSchema for MemoryRevalidationSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No configuration required
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry for the memory revalidation implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = RevalidationFactory;

	fn factory() -> Self::Factory {
		create_revalidation
	}
}

impl RevalidationRegistry for Registry {}

/// Factory function to create a memory revalidation backend.
pub fn create_revalidation(
	_config: &toml::Value,
) -> Result<Box<dyn RevalidationInterface>, RevalidateError> {
	Ok(Box::new(MemoryRevalidation::new()))
}
