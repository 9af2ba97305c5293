//! Stub factories and capabilities shared by unit tests.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::factory::{Destination, ProducerClass, RouteFamily, RouterFactory};
use crate::route::{RouteConfiguration, RouteIntent};

pub(crate) trait Greet {
	fn greet(&self) -> String;
}

pub(crate) struct Hello(pub String);

impl Greet for Hello {
	fn greet(&self) -> String {
		format!("hello, {}", self.0)
	}
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct GreeterOptions {
	pub name: String,
}

crate::destination_capability!(pub(crate) Greeter => String);
crate::destination_capability!(pub(crate) GreeterService => Box<dyn Greet>);
crate::destination_capability!(pub(crate) LegacyGreeter => String, tag = "legacy.greeter", native);
crate::config_capability!(pub(crate) GreeterConfig => GreeterOptions);
crate::config_capability!(pub(crate) LegacyConfig => GreeterOptions, tag = "legacy.config", native);

/// How a [`StubFactory`] handles an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
	/// Prepares and completes before returning.
	Complete,
	/// Prepares, then completes on the next [`run_deferred`].
	Defer,
	/// Returns without touching the configuration.
	Silent,
	/// Reports a failure.
	Fail,
}

thread_local! {
	static DEFERRED: RefCell<Vec<(RouteConfiguration, Destination)>> = const { RefCell::new(Vec::new()) };
}

/// Completes every deferred route, as a later event loop turn would.
pub(crate) fn run_deferred() -> usize {
	let pending = DEFERRED.with(|queue| std::mem::take(&mut *queue.borrow_mut()));
	let count = pending.len();
	for (config, destination) in pending {
		config.complete(destination);
	}
	count
}

fn no_options() -> Box<dyn Any> {
	Box::new(())
}

fn hello() -> Destination {
	Box::new(String::from("hello"))
}

/// Produces a [`GreeterService`] destination.
pub(crate) fn hello_service() -> Destination {
	let greeter: Box<dyn Greet> = Box::new(Hello("world".into()));
	Box::new(greeter)
}

pub(crate) fn greeter_options() -> Box<dyn Any> {
	Box::new(GreeterOptions::default())
}

pub(crate) struct StubFactory {
	name: &'static str,
	family: RouteFamily,
	synchronous: bool,
	behavior: Behavior,
	options: fn() -> Box<dyn Any>,
	produce: fn() -> Destination,
	producers: Vec<ProducerClass>,
	invocations: AtomicUsize,
	intents: Mutex<Vec<RouteIntent>>,
}

impl StubFactory {
	pub fn new(name: &'static str, family: RouteFamily) -> Self {
		Self {
			name,
			family,
			synchronous: true,
			behavior: Behavior::Complete,
			options: no_options,
			produce: hello,
			producers: Vec::new(),
			invocations: AtomicUsize::new(0),
			intents: Mutex::new(Vec::new()),
		}
	}

	pub fn view(name: &'static str) -> Self {
		Self::new(name, RouteFamily::View)
	}

	pub fn service(name: &'static str) -> Self {
		Self::new(name, RouteFamily::Service)
	}

	pub fn behavior(mut self, behavior: Behavior) -> Self {
		self.behavior = behavior;
		self.synchronous = behavior != Behavior::Defer;
		self
	}

	/// Claims synchronous completion regardless of behavior.
	pub fn claims_synchronous(mut self, synchronous: bool) -> Self {
		self.synchronous = synchronous;
		self
	}

	pub fn options(mut self, options: fn() -> Box<dyn Any>) -> Self {
		self.options = options;
		self
	}

	pub fn producing(mut self, produce: fn() -> Destination) -> Self {
		self.produce = produce;
		self
	}

	pub fn producers(mut self, producers: Vec<ProducerClass>) -> Self {
		self.producers = producers;
		self
	}

	pub fn arc(self) -> Arc<Self> {
		Arc::new(self)
	}

	pub fn invocations(&self) -> usize {
		self.invocations.load(Ordering::SeqCst)
	}

	pub fn intents(&self) -> Vec<RouteIntent> {
		self.intents.lock().clone()
	}
}

impl RouterFactory for StubFactory {
	fn name(&self) -> &'static str {
		self.name
	}

	fn family(&self) -> RouteFamily {
		self.family
	}

	fn completes_synchronously(&self) -> bool {
		self.synchronous
	}

	fn default_options(&self) -> Box<dyn Any> {
		(self.options)()
	}

	fn registered_producers(&self) -> Vec<ProducerClass> {
		self.producers.clone()
	}

	fn invoke(&self, mut config: RouteConfiguration) {
		self.invocations.fetch_add(1, Ordering::SeqCst);
		self.intents.lock().push(config.intent());

		match self.behavior {
			Behavior::Complete => {
				let mut destination = (self.produce)();
				config.prepare(&mut *destination);
				config.complete(destination);
			}
			Behavior::Defer => {
				let mut destination = (self.produce)();
				config.prepare(&mut *destination);
				DEFERRED.with(|queue| queue.borrow_mut().push((config, destination)));
			}
			Behavior::Silent => {}
			Behavior::Fail => config.fail("stub failure"),
		}
	}
}
