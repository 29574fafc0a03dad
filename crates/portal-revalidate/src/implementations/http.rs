//! HTTP revalidation implementation.
//!
//! Posts `{"path": "..."}` to a frontend revalidation endpoint, one request
//! per path. The endpoint treats unknown or uncached paths as a no-op, so
//! retried invalidations are harmless.

use crate::{RevalidateError, RevalidationFactory, RevalidationInterface, RevalidationRegistry};
use async_trait::async_trait;
use portal_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct RevalidateBody<'a> {
	path: &'a str,
}

/// Revalidation backend that calls a frontend HTTP endpoint.
pub struct HttpRevalidation {
	client: reqwest::Client,
	endpoint: String,
	secret: Option<String>,
}

impl HttpRevalidation {
	pub fn new(endpoint: String, secret: Option<String>) -> Result<Self, RevalidateError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(5))
			.build()
			.map_err(|e| RevalidateError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			endpoint,
			secret,
		})
	}
}

#[async_trait]
impl RevalidationInterface for HttpRevalidation {
	async fn invalidate(&self, path: &str) -> Result<(), RevalidateError> {
		let mut request = self
			.client
			.post(&self.endpoint)
			.json(&RevalidateBody { path });
		if let Some(secret) = &self.secret {
			request = request.bearer_auth(secret);
		}

		let response = request
			.send()
			.await
			.map_err(|e| RevalidateError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(RevalidateError::Rejected(status.to_string()));
		}

		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpRevalidationSchema)
	}
}

/// Configuration schema for HttpRevalidation.
pub struct HttpRevalidationSchema;

impl ConfigSchema for HttpRevalidationSchema {
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
			vec![Field::new("secret", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Registry for the HTTP revalidation implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = RevalidationFactory;

	fn factory() -> Self::Factory {
		create_revalidation
	}
}

impl RevalidationRegistry for Registry {}

/// Factory function to create an HTTP revalidation backend from configuration.
///
/// Configuration parameters:
/// - `endpoint`: URL of the revalidation endpoint (required)
/// - `secret`: bearer token for the endpoint (optional)
pub fn create_revalidation(
	config: &toml::Value,
) -> Result<Box<dyn RevalidationInterface>, RevalidateError> {
	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| RevalidateError::Configuration("'endpoint' is required".to_string()))?
		.to_string();

	let secret = config
		.get("secret")
		.and_then(|v| v.as_str())
		.map(|s| s.to_string());

	Ok(Box::new(HttpRevalidation::new(endpoint, secret)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_requires_http_endpoint() {
		let schema = HttpRevalidationSchema;
		let ok = "endpoint = \"https://portal.example/api/revalidate\""
			.parse::<toml::Value>()
			.unwrap();
		assert!(schema.validate(&ok).is_ok());

		let bad = "endpoint = \"portal.example\"".parse::<toml::Value>().unwrap();
		assert!(schema.validate(&bad).is_err());
	}

	#[test]
	fn factory_requires_endpoint() {
		let config = "secret = \"s\"".parse::<toml::Value>().unwrap();
		assert!(matches!(
			create_revalidation(&config),
			Err(RevalidateError::Configuration(_))
		));
	}
}
