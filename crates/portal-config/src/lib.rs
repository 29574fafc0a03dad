//! Configuration module for the portal system.
//!
//! This module provides structures and utilities for managing portal
//! configuration. It supports loading configuration from TOML files with
//! environment variable resolution and validates that all required values
//! are properly set before the service starts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the portal service.
///
/// Contains all configuration sections the service needs to operate:
/// portal identity, storage backend, notification gateway, cache
/// revalidation, and the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this portal instance.
	pub portal: PortalConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the notification gateway.
	pub notifier: NotifierConfig,
	/// Configuration for cache revalidation.
	pub revalidate: RevalidateConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to this portal instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
	/// Unique identifier for this portal instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the notification gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of notifier implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for cache revalidation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevalidateConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of revalidation implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Paths invalidated after every request write, e.g. the home and
	/// listing pages.
	#[serde(default = "default_revalidate_paths")]
	pub paths: Vec<String>,
	/// Base path of the request detail pages; the written request's
	/// public id is appended to it.
	#[serde(default = "default_listing_path")]
	pub listing_path: String,
}

fn default_revalidate_paths() -> Vec<String> {
	vec!["/".to_string(), "/solicitacoes".to_string()]
}

fn default_listing_path() -> String {
	"/solicitacoes".to_string()
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
	/// Allowed headers for CORS.
	pub allowed_headers: Vec<String>,
	/// Allowed methods for CORS.
	pub allowed_methods: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = match cap.get(0) {
			Some(m) => m,
			None => continue,
		};
		let var_name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

/// Checks that a section's primary implementation is among its configured
/// implementations.
fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	pub fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are set.
	///
	/// - Ensures the portal id is not empty
	/// - Checks each pluggable section names a configured primary
	/// - Ensures revalidation paths are well-formed
	/// - Validates API bounds when the server is enabled
	fn validate(&self) -> Result<(), ConfigError> {
		if self.portal.id.is_empty() {
			return Err(ConfigError::Validation("Portal ID cannot be empty".into()));
		}

		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;
		validate_primary(
			"notifier",
			&self.notifier.primary,
			&self.notifier.implementations,
		)?;
		validate_primary(
			"revalidate",
			&self.revalidate.primary,
			&self.revalidate.implementations,
		)?;

		for path in &self.revalidate.paths {
			if !path.starts_with('/') {
				return Err(ConfigError::Validation(format!(
					"Revalidation path '{}' must start with '/'",
					path
				)));
			}
		}
		if !self.revalidate.listing_path.starts_with('/') {
			return Err(ConfigError::Validation(format!(
				"Listing path '{}' must start with '/'",
				self.revalidate.listing_path
			)));
		}

		if let Some(ref api) = self.api {
			if api.enabled {
				if api.port == 0 {
					return Err(ConfigError::Validation("API port cannot be 0".into()));
				}
				if api.max_request_size == 0 {
					return Err(ConfigError::Validation(
						"API max_request_size must be greater than 0".into(),
					));
				}
			}
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[portal]
id = "aligner-portal"

[storage]
primary = "memory"
[storage.implementations.memory]

[notifier]
primary = "memory"
[notifier.implementations.memory]

[revalidate]
primary = "memory"
paths = ["/", "/solicitacoes"]
listing_path = "/solicitacoes"
[revalidate.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_HOST", "localhost");
		std::env::set_var("TEST_PORT", "5432");

		let input = "host = \"${TEST_HOST}:${TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("TEST_HOST");
		std::env::remove_var("TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_parses() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.portal.id, "aligner-portal");
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(config.revalidate.paths.len(), 2);
		assert!(config.api.is_none());
	}

	#[test]
	fn test_primary_must_be_configured() {
		let config_str = BASE_CONFIG.replace("primary = \"memory\"\n[storage.implementations.memory]", "primary = \"redis\"\n[storage.implementations.memory]");
		let result = config_str.parse::<Config>();
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Primary storage 'redis' not found"));
	}

	#[test]
	fn test_empty_portal_id_rejected() {
		let config_str = BASE_CONFIG.replace("id = \"aligner-portal\"", "id = \"\"");
		assert!(config_str.parse::<Config>().is_err());
	}

	#[test]
	fn test_revalidate_paths_must_be_absolute() {
		let config_str =
			BASE_CONFIG.replace("paths = [\"/\", \"/solicitacoes\"]", "paths = [\"solicitacoes\"]");
		let result = config_str.parse::<Config>();
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("must start with '/'"));
	}

	#[test]
	fn test_api_defaults() {
		let config_str = format!("{}\n[api]\nenabled = true\n", BASE_CONFIG);
		let config: Config = config_str.parse().unwrap();
		let api = config.api.unwrap();
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 3000);
		assert_eq!(api.timeout_seconds, 30);
		assert_eq!(api.max_request_size, 1024 * 1024);
	}
}
