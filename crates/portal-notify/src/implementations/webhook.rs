//! Webhook notifier implementation.
//!
//! Posts each notification as JSON to a mail-gateway endpoint which renders
//! and dispatches the actual email.

use crate::{Notification, NotifierFactory, NotifierInterface, NotifierRegistry, NotifyError};
use async_trait::async_trait;
use portal_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::time::Duration;

/// Notifier that delivers through an HTTP mail gateway.
pub struct WebhookNotifier {
	client: reqwest::Client,
	endpoint: String,
	api_key: Option<String>,
}

impl WebhookNotifier {
	pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, NotifyError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(10))
			.build()
			.map_err(|e| NotifyError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			endpoint,
			api_key,
		})
	}
}

#[async_trait]
impl NotifierInterface for WebhookNotifier {
	async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
		let mut request = self.client.post(&self.endpoint).json(notification);
		if let Some(key) = &self.api_key {
			request = request.bearer_auth(key);
		}

		let response = request
			.send()
			.await
			.map_err(|e| NotifyError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(NotifyError::Rejected(format!("{}: {}", status, body)));
		}

		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookNotifierSchema)
	}
}

/// Configuration schema for WebhookNotifier.
pub struct WebhookNotifierSchema;

impl ConfigSchema for WebhookNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("endpoint", FieldType::String).with_validator(|v| {
				let s = v.as_str().unwrap_or_default();
				if s.starts_with("http://") || s.starts_with("https://") {
					Ok(())
				} else {
					Err("must be an http(s) URL".to_string())
				}
			})],
			vec![Field::new("api_key", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Registry for the webhook notifier implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifierRegistry for Registry {}

/// Factory function to create a webhook notifier from configuration.
///
/// Configuration parameters:
/// - `endpoint`: URL of the mail gateway (required)
/// - `api_key`: bearer token for the gateway (optional)
pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NotifyError::Configuration("'endpoint' is required".to_string()))?
		.to_string();

	let api_key = config
		.get("api_key")
		.and_then(|v| v.as_str())
		.map(|s| s.to_string());

	Ok(Box::new(WebhookNotifier::new(endpoint, api_key)?))
}
