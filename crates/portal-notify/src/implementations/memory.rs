//! In-memory notifier implementation.
//!
//! Captures notifications instead of delivering them. Used in tests and
//! in development configurations where no mail gateway is available.

use crate::{Notification, NotifierFactory, NotifierInterface, NotifierRegistry, NotifyError};
use async_trait::async_trait;
use portal_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Notifier that records every send in a shared outbox.
#[derive(Clone, Default)]
pub struct MemoryNotifier {
	outbox: Arc<RwLock<Vec<Notification>>>,
	/// When set, every send fails with a network error.
	fail: bool,
}

impl MemoryNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a notifier whose sends always fail.
	pub fn failing() -> Self {
		Self {
			outbox: Arc::new(RwLock::new(Vec::new())),
			fail: true,
		}
	}

	/// Returns a snapshot of everything sent so far.
	pub async fn sent(&self) -> Vec<Notification> {
		self.outbox.read().await.clone()
	}
}

#[async_trait]
impl NotifierInterface for MemoryNotifier {
	async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
		if self.fail {
			return Err(NotifyError::Network("simulated delivery failure".to_string()));
		}
		self.outbox.write().await.push(notification.clone());
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryNotifierSchema)
	}
}

/// Configuration schema for MemoryNotifier.
pub struct MemoryNotifierSchema;

impl ConfigSchema for MemoryNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![], vec![Field::new("fail", FieldType::Boolean)]);
		schema.validate(config)
	}
}

/// Registry for the memory notifier implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifierRegistry for Registry {}

/// Factory function to create a memory notifier from configuration.
///
/// Configuration parameters:
/// - `fail`: when true, every send fails (default: false)
pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	let fail = config.get("fail").and_then(|v| v.as_bool()).unwrap_or(false);
	if fail {
		Ok(Box::new(MemoryNotifier::failing()))
	} else {
		Ok(Box::new(MemoryNotifier::new()))
	}
}
