//! Capability-to-factory resolution across both registration systems.
//!
//! # Role
//!
//! Callers ask for a capability without knowing which system bound it.
//! Declared bindings in the [`Registry`] are consulted first; capabilities of
//! native origin then fall back to a [`NativeResolver`].
//!
//! Resolution is a pure read and may run at any time, including before launch.

use std::sync::Arc;

use crate::capability::{CapabilityKey, ConfigCapability, DestinationCapability};
use crate::factory::{RouteFamily, RouterFactory, TableId};
use crate::registry::Registry;

/// Lookup into the native dynamic-protocol registration system.
pub trait NativeResolver: Send + Sync + 'static {
	fn resolve_native(&self, table: TableId, capability: &CapabilityKey) -> Option<Arc<dyn RouterFactory>>;
}

impl<F> NativeResolver for F
where
	F: Fn(TableId, &CapabilityKey) -> Option<Arc<dyn RouterFactory>> + Send + Sync + 'static,
{
	fn resolve_native(&self, table: TableId, capability: &CapabilityKey) -> Option<Arc<dyn RouterFactory>> {
		self(table, capability)
	}
}

#[derive(Clone)]
pub struct Discovery {
	registry: Arc<Registry>,
	native: Option<Arc<dyn NativeResolver>>,
}

impl Discovery {
	pub fn new(registry: Arc<Registry>) -> Self {
		Self { registry, native: None }
	}

	/// Installs the fallback used for native capabilities.
	pub fn with_native_resolver(mut self, resolver: impl NativeResolver) -> Self {
		self.native = Some(Arc::new(resolver));
		self
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	/// Resolves `capability` in `table`, falling back to the native resolver
	/// for native capabilities.
	pub fn resolve(&self, table: TableId, capability: &CapabilityKey) -> Option<Arc<dyn RouterFactory>> {
		if let Some(factory) = self.registry.lookup(table, capability) {
			return Some(factory);
		}
		if !capability.is_native() || !self.registry.settings().native_fallback {
			return None;
		}

		let factory = self.native.as_ref()?.resolve_native(table, capability)?;
		// The native side is keyed independently of family; drop factories of the wrong kind.
		if factory.family() != table.family {
			tracing::debug!(
				%table,
				%capability,
				factory = factory.name(),
				"native resolver returned a factory of another family"
			);
			return None;
		}
		tracing::trace!(%table, %capability, factory = factory.name(), "resolved through native fallback");
		Some(factory)
	}

	pub fn resolve_destination<C: DestinationCapability>(&self, family: RouteFamily) -> Option<Arc<dyn RouterFactory>> {
		self.resolve(TableId::destination(family), &C::key())
	}

	pub fn resolve_config<C: ConfigCapability>(&self, family: RouteFamily) -> Option<Arc<dyn RouterFactory>> {
		self.resolve(TableId::config(family), &C::key())
	}
}

impl core::fmt::Debug for Discovery {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Discovery")
			.field("registry", &self.registry)
			.field("native", &self.native.is_some())
			.finish()
	}
}
