//! Registry trait for self-registering implementations.
//!
//! This module provides the base trait that pluggable implementations
//! (storage backends, notifiers, revalidation clients) implement to declare
//! their configuration name and factory function.

/// Base trait for implementation registries.
///
/// Each implementation module provides a Registry struct implementing this
/// trait, so every implementation declares the name it is referenced by in
/// configuration and the factory that constructs it.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "memory" for storage.implementations.memory
	/// - "webhook" for notifier.implementations.webhook
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	///
	/// Each module defines its own factory type, for example
	/// StorageFactory for storage implementations.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
