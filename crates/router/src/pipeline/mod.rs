//! Turns a capability request into a configured factory invocation.
//!
//! # Role
//!
//! [`Router`] is the caller-facing entry point. It resolves a capability
//! through [`Discovery`], builds a [`RouteConfiguration`] from the factory's
//! default options, wires the caller's callbacks into it and invokes the
//! factory. Two shapes exist for both destination and configuration
//! capabilities:
//!
//! - `perform` is fire-and-forget. Absence is a normal outcome and yields
//!   `None`; the factory may finish on a later turn of the event loop.
//! - `make_destination` requires a synchronous factory and returns the
//!   produced destination from the same call frame.
//!
//! # Invariants
//!
//! - Caller prepare callbacks only ever see a destination of the requested
//!   type. Values of another type are skipped on `perform` and rejected on
//!   `make_destination`.
//! - `make_destination` never waits. A synchronous factory that returns
//!   without completing yields [`RouteError::Incomplete`].

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::capability::{ConfigCapability, DestinationCapability};
use crate::discovery::{Discovery, NativeResolver};
use crate::error::{RouteError, ViolationPolicy};
use crate::factory::{Destination, RouteFamily, RouterFactory, TableId};
use crate::registry::Registry;
use crate::route::{RouteConfiguration, RouteHandle, RouteIntent, RouteState};

mod request;

pub use request::{ConfigRequest, DestinationRequest};

type OptionsFn<'r> = Box<dyn FnOnce(&mut RouteConfiguration) + 'r>;

/// Caller-facing capability router.
#[derive(Clone, Debug)]
pub struct Router {
	discovery: Discovery,
}

impl Router {
	pub fn new(registry: Arc<Registry>) -> Self {
		Self::from_discovery(Discovery::new(registry))
	}

	pub fn from_discovery(discovery: Discovery) -> Self {
		Self { discovery }
	}

	/// Installs the fallback used for native capabilities.
	pub fn with_native_resolver(self, resolver: impl NativeResolver) -> Self {
		Self::from_discovery(self.discovery.with_native_resolver(resolver))
	}

	pub fn discovery(&self) -> &Discovery {
		&self.discovery
	}

	pub fn registry(&self) -> &Arc<Registry> {
		self.discovery.registry()
	}

	fn policy(&self) -> ViolationPolicy {
		self.registry().policy()
	}

	/// Starts a request for a destination capability.
	pub fn route<C: DestinationCapability>(&self, family: RouteFamily) -> DestinationRequest<'_, C> {
		DestinationRequest::new(self, family)
	}

	/// Starts a request keyed by a configuration capability.
	pub fn route_config<C: ConfigCapability>(&self, family: RouteFamily) -> ConfigRequest<'_, C> {
		ConfigRequest::new(self, family)
	}

	/// Resolves a factory for the synchronous path, where absence and
	/// asynchronous factories are both violations.
	fn resolve_synchronous(
		&self,
		table: TableId,
		capability: &'static str,
		resolved: Option<Arc<dyn RouterFactory>>,
	) -> Result<Arc<dyn RouterFactory>, RouteError> {
		let policy = self.policy();
		let Some(factory) = resolved else {
			return Err(policy.enforce(RouteError::Unregistered { table, capability }));
		};
		if !factory.completes_synchronously() {
			return Err(policy.enforce(RouteError::Asynchronous {
				factory: factory.name(),
			}));
		}
		Ok(factory)
	}
}

/// Builds a fresh configuration for `factory` and runs the caller's options callback.
fn configure(
	factory: &dyn RouterFactory,
	family: RouteFamily,
	options: Option<OptionsFn<'_>>,
) -> (RouteConfiguration, RouteHandle) {
	let handle = RouteHandle::new(factory.name());
	let mut config = RouteConfiguration::new(family, factory.default_options(), handle.clone());
	if let Some(options) = options {
		options(&mut config);
	}
	(config, handle)
}

/// Wraps a typed prepare callback so it only runs for destinations of type `T`.
fn downcasting<T: 'static>(mut prepare: Box<dyn FnMut(&mut T)>) -> impl FnMut(&mut dyn Any) + 'static {
	move |destination: &mut dyn Any| match destination.downcast_mut::<T>() {
		Some(destination) => prepare(destination),
		None => tracing::debug!(
			expected = std::any::type_name::<T>(),
			"skipping prepare callback for destination of another type"
		),
	}
}

/// Invokes `factory` with a get-destination intent and captures what it delivers.
fn deliver_now(
	factory: &dyn RouterFactory,
	mut config: RouteConfiguration,
	handle: &RouteHandle,
) -> Result<Destination, RouteError> {
	config.set_intent(RouteIntent::GetDestination);

	let slot: Rc<RefCell<Option<Destination>>> = Rc::default();
	let sink = Rc::clone(&slot);
	config.on_complete(move |destination| {
		*sink.borrow_mut() = Some(destination);
	});

	tracing::debug!(factory = factory.name(), family = %config.family(), "making destination");
	factory.invoke(config);

	let delivered = slot.borrow_mut().take();
	delivered.ok_or_else(|| undelivered(handle))
}

fn undelivered(handle: &RouteHandle) -> RouteError {
	match handle.state() {
		RouteState::Failed(reason) => RouteError::Failed {
			factory: handle.factory(),
			reason,
		},
		state => {
			tracing::warn!(
				factory = handle.factory(),
				?state,
				"synchronous factory returned without completing the route"
			);
			RouteError::Incomplete {
				factory: handle.factory(),
			}
		}
	}
}
