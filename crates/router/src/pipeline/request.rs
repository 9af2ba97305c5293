use std::marker::PhantomData;

use super::{OptionsFn, Router, configure, deliver_now, downcasting};
use crate::capability::{ConfigCapability, DestinationCapability};
use crate::error::RouteError;
use crate::factory::{Destination, RouteFamily, RouterFactory, TableId};
use crate::route::{RouteConfiguration, RouteHandle};

/// Pending request for a destination capability.
///
/// Built by [`Router::route`]; nothing is resolved until
/// [`perform`](Self::perform) or [`make_destination`](Self::make_destination).
#[must_use = "requests do nothing until performed"]
pub struct DestinationRequest<'r, C: DestinationCapability> {
	router: &'r Router,
	family: RouteFamily,
	options: Option<OptionsFn<'r>>,
	prepare: Option<Box<dyn FnMut(&mut C::Destination)>>,
	_capability: PhantomData<fn() -> C>,
}

impl<'r, C: DestinationCapability> DestinationRequest<'r, C> {
	pub(super) fn new(router: &'r Router, family: RouteFamily) -> Self {
		Self {
			router,
			family,
			options: None,
			prepare: None,
			_capability: PhantomData,
		}
	}

	/// Adjusts the configuration before the factory sees it.
	pub fn options(mut self, options: impl FnOnce(&mut RouteConfiguration) + 'r) -> Self {
		self.options = Some(Box::new(options));
		self
	}

	/// Runs on the constructed destination before it is delivered.
	pub fn prepare(mut self, prepare: impl FnMut(&mut C::Destination) + 'static) -> Self {
		self.prepare = Some(Box::new(prepare));
		self
	}

	/// Invokes the bound factory without waiting for it.
	///
	/// Returns `None` when nothing is bound for the capability.
	pub fn perform(self) -> Option<RouteHandle> {
		let factory = self.router.discovery().resolve_destination::<C>(self.family)?;
		let (mut config, handle) = configure(&*factory, self.family, self.options);
		if let Some(prepare) = self.prepare {
			config.on_prepare(downcasting(prepare));
		}

		tracing::debug!(
			capability = C::TAG,
			factory = factory.name(),
			intent = ?config.intent(),
			"performing route"
		);
		factory.invoke(config);
		Some(handle)
	}

	/// Produces the destination synchronously.
	///
	/// The capability must be bound to a factory that completes synchronously.
	pub fn make_destination(self) -> Result<C::Destination, RouteError> {
		let table = TableId::destination(self.family);
		let resolved = self.router.discovery().resolve_destination::<C>(self.family);
		let factory = self.router.resolve_synchronous(table, C::TAG, resolved)?;

		let (mut config, handle) = configure(&*factory, self.family, self.options);
		if let Some(prepare) = self.prepare {
			config.on_prepare(downcasting(prepare));
		}

		let destination = deliver_now(&*factory, config, &handle)?;
		match destination.downcast::<C::Destination>() {
			Ok(destination) => Ok(*destination),
			Err(_) => Err(self.router.policy().enforce(RouteError::DestinationMismatch {
				factory: factory.name(),
				capability: C::TAG,
			})),
		}
	}
}

/// Pending request keyed by a configuration capability.
///
/// The prepare callback receives the factory's options rather than the
/// destination, and runs before the factory is invoked.
#[must_use = "requests do nothing until performed"]
pub struct ConfigRequest<'r, C: ConfigCapability> {
	router: &'r Router,
	family: RouteFamily,
	options: Option<OptionsFn<'r>>,
	prepare: Option<Box<dyn FnOnce(&mut C::Options) + 'r>>,
	_capability: PhantomData<fn() -> C>,
}

impl<'r, C: ConfigCapability> ConfigRequest<'r, C> {
	pub(super) fn new(router: &'r Router, family: RouteFamily) -> Self {
		Self {
			router,
			family,
			options: None,
			prepare: None,
			_capability: PhantomData,
		}
	}

	pub fn options(mut self, options: impl FnOnce(&mut RouteConfiguration) + 'r) -> Self {
		self.options = Some(Box::new(options));
		self
	}

	/// Edits the factory's options, typed as the capability's options.
	pub fn prepare(mut self, prepare: impl FnOnce(&mut C::Options) + 'r) -> Self {
		self.prepare = Some(Box::new(prepare));
		self
	}

	fn configure(self, factory: &dyn RouterFactory) -> (RouteConfiguration, RouteHandle) {
		let (mut config, handle) = configure(factory, self.family, self.options);
		if let Some(prepare) = self.prepare {
			match config.options_mut::<C::Options>() {
				Some(options) => prepare(options),
				None => tracing::debug!(
					capability = C::TAG,
					factory = factory.name(),
					"factory options do not match the capability; skipping prepare"
				),
			}
		}
		(config, handle)
	}

	/// Invokes the bound factory without waiting for it.
	pub fn perform(self) -> Option<RouteHandle> {
		let factory = self.router.discovery().resolve_config::<C>(self.family)?;
		let (config, handle) = self.configure(&*factory);

		tracing::debug!(
			capability = C::TAG,
			factory = factory.name(),
			intent = ?config.intent(),
			"performing configured route"
		);
		factory.invoke(config);
		Some(handle)
	}

	/// Produces an untyped destination synchronously.
	pub fn make_destination(self) -> Result<Destination, RouteError> {
		let router = self.router;
		let table = TableId::config(self.family);
		let resolved = router.discovery().resolve_config::<C>(self.family);
		let factory = router.resolve_synchronous(table, C::TAG, resolved)?;

		let (config, handle) = self.configure(&*factory);
		deliver_now(&*factory, config, &handle)
	}
}
