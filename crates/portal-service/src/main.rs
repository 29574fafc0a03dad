//! Main entry point for the portal service.
//!
//! This binary runs the treatment request portal backend: a lifecycle
//! engine with pluggable storage, notification and cache-revalidation
//! backends, exposed through an HTTP API.

use clap::Parser;
use portal_config::Config;
use portal_core::{PortalBuilder, PortalEngine};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the portal service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the portal service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine with all registered backend implementations
/// 5. Runs the HTTP API server until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started portal");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path)?;
	tracing::info!("Loaded configuration [{}]", config.portal.id);

	let api_config = match &config.api {
		Some(api) if api.enabled => api.clone(),
		_ => {
			return Err("API server is disabled in configuration; nothing to run".into());
		},
	};

	let engine = Arc::new(build_portal(config)?);

	server::start_server(api_config, engine).await?;

	tracing::info!("Stopped portal");
	Ok(())
}

/// Builds the engine with every registered backend implementation.
///
/// The configuration's `primary` selections pick which implementation each
/// section actually uses at runtime.
fn build_portal(config: Config) -> Result<PortalEngine, Box<dyn std::error::Error>> {
	let mut builder = PortalBuilder::new();

	for (name, factory) in portal_storage::get_all_implementations() {
		builder = builder.with_storage_factory(name, factory);
	}
	for (name, factory) in portal_notify::get_all_implementations() {
		builder = builder.with_notifier_factory(name, factory);
	}
	for (name, factory) in portal_revalidate::get_all_implementations() {
		builder = builder.with_revalidation_factory(name, factory);
	}

	Ok(builder.build(config)?)
}
