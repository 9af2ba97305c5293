//! Capability registration tables with a one-way launch lock.
//!
//! # Role
//!
//! Binds capabilities to router factories in four independent tables
//! (view/service x destination/config). Registration happens during startup;
//! once [`Registry::finish_launch`] is called the tables are frozen.
//!
//! # Invariants
//!
//! - A capability is bound at most once per table, for the lifetime of the
//!   registry. There is no unregistration.
//! - Registration after launch is a fatal violation, even for unused keys.
//! - Readers always observe a complete [`TableSet`]; writers publish a new
//!   snapshot per binding.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::capability::{CapabilityKey, ConfigCapability, DestinationCapability};
use crate::config::RouterSettings;
use crate::error::{RouteError, ViolationPolicy};
use crate::factory::{RouteFamily, RouterFactory, TableId};

mod table;

pub use table::{Bindings, TableSet};

type OptionsCheck = fn(&dyn Any) -> bool;

fn options_conform<C: ConfigCapability>(options: &dyn Any) -> bool {
	options.is::<C::Options>()
}

pub struct Registry {
	tables: ArcSwap<TableSet>,
	/// Serializes writers; readers never take it.
	write: Mutex<()>,
	launched: AtomicBool,
	settings: RouterSettings,
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	/// Creates an empty registry with default settings.
	pub fn new() -> Self {
		Self::with_settings(RouterSettings::default())
	}

	pub fn with_policy(policy: ViolationPolicy) -> Self {
		Self::with_settings(RouterSettings::default().with_policy(policy))
	}

	pub fn with_settings(settings: RouterSettings) -> Self {
		Self {
			tables: ArcSwap::from_pointee(TableSet::default()),
			write: Mutex::new(()),
			launched: AtomicBool::new(false),
			settings,
		}
	}

	pub fn settings(&self) -> &RouterSettings {
		&self.settings
	}

	pub fn policy(&self) -> ViolationPolicy {
		self.settings.violation_policy
	}

	/// Binds a view destination capability to `factory`.
	pub fn register_view<C: DestinationCapability>(
		&self,
		factory: Arc<dyn RouterFactory>,
	) -> Result<(), RouteError> {
		self.register_destination::<C>(RouteFamily::View, factory)
	}

	/// Binds a view configuration capability to `factory`.
	pub fn register_view_config<C: ConfigCapability>(
		&self,
		factory: Arc<dyn RouterFactory>,
	) -> Result<(), RouteError> {
		self.register_config::<C>(RouteFamily::View, factory)
	}

	/// Binds a service destination capability to `factory`.
	pub fn register_service<C: DestinationCapability>(
		&self,
		factory: Arc<dyn RouterFactory>,
	) -> Result<(), RouteError> {
		self.register_destination::<C>(RouteFamily::Service, factory)
	}

	/// Binds a service configuration capability to `factory`.
	pub fn register_service_config<C: ConfigCapability>(
		&self,
		factory: Arc<dyn RouterFactory>,
	) -> Result<(), RouteError> {
		self.register_config::<C>(RouteFamily::Service, factory)
	}

	pub fn register_destination<C: DestinationCapability>(
		&self,
		family: RouteFamily,
		factory: Arc<dyn RouterFactory>,
	) -> Result<(), RouteError> {
		self.bind(TableId::destination(family), C::key(), factory, None)
	}

	/// Binds a configuration capability, requiring the factory's default
	/// options to be a `C::Options`.
	pub fn register_config<C: ConfigCapability>(
		&self,
		family: RouteFamily,
		factory: Arc<dyn RouterFactory>,
	) -> Result<(), RouteError> {
		self.bind(TableId::config(family), C::key(), factory, Some(options_conform::<C> as OptionsCheck))
	}

	fn bind(
		&self,
		table: TableId,
		key: CapabilityKey,
		factory: Arc<dyn RouterFactory>,
		options_conform: Option<OptionsCheck>,
	) -> Result<(), RouteError> {
		let _writer = self.write.lock();
		self.check(table, &key, &*factory, options_conform)
			.map_err(|err| self.policy().enforce(err))?;

		// Copy-on-write per binding; tables only grow during startup.
		let mut next = TableSet::clone(&self.tables.load());
		next.table_mut(table).insert(key, Arc::clone(&factory));
		self.tables.store(Arc::new(next));

		tracing::debug!(%table, capability = %key, factory = factory.name(), "registered capability");
		Ok(())
	}

	fn check(
		&self,
		table: TableId,
		key: &CapabilityKey,
		factory: &dyn RouterFactory,
		options_conform: Option<OptionsCheck>,
	) -> Result<(), RouteError> {
		if self.is_launch_finished() {
			return Err(RouteError::RegistrationClosed {
				table,
				capability: key.tag(),
			});
		}
		if key.is_native() {
			return Err(RouteError::NativeCapability {
				capability: key.tag(),
			});
		}
		if factory.family() != table.family {
			return Err(RouteError::FamilyMismatch {
				table,
				factory: factory.name(),
				found: factory.family(),
			});
		}
		if let Some(conforms) = options_conform
			&& !conforms(&*factory.default_options())
		{
			return Err(RouteError::ConfigMismatch {
				capability: key.tag(),
				factory: factory.name(),
			});
		}
		if let Some(existing) = self.tables.load().get(table, key) {
			return Err(RouteError::DuplicateRegistration {
				table,
				capability: key.tag(),
				existing: existing.name(),
			});
		}
		Ok(())
	}

	/// Looks up a binding without any fallback.
	pub fn lookup(&self, table: TableId, key: &CapabilityKey) -> Option<Arc<dyn RouterFactory>> {
		self.tables.load().get(table, key).cloned()
	}

	/// Returns the current tables. Stable once launch has finished.
	pub fn snapshot(&self) -> Arc<TableSet> {
		self.tables.load_full()
	}

	/// Closes the registration phase. Idempotent; the flag never reverts.
	pub fn finish_launch(&self) {
		let _writer = self.write.lock();
		if !self.launched.swap(true, Ordering::AcqRel) {
			let tables = self.tables.load();
			tracing::info!(
				views = tables.len(TableId::VIEW),
				view_configs = tables.len(TableId::VIEW_CONFIG),
				services = tables.len(TableId::SERVICE),
				service_configs = tables.len(TableId::SERVICE_CONFIG),
				"registration closed"
			);
		}
	}

	pub fn is_launch_finished(&self) -> bool {
		self.launched.load(Ordering::Acquire)
	}
}

impl core::fmt::Debug for Registry {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let tables = self.tables.load();
		f.debug_struct("Registry")
			.field("views", &tables.len(TableId::VIEW))
			.field("view_configs", &tables.len(TableId::VIEW_CONFIG))
			.field("services", &tables.len(TableId::SERVICE))
			.field("service_configs", &tables.len(TableId::SERVICE_CONFIG))
			.field("launched", &self.is_launch_finished())
			.finish()
	}
}
