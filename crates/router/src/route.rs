//! Per-invocation route state: configuration, staged delivery and the live handle.
//!
//! # Role
//!
//! A [`RouteConfiguration`] is created for every factory invocation and owned
//! by the factory until it completes or fails. The caller keeps a
//! [`RouteHandle`] observing the same route.
//!
//! # Invariants
//!
//! - The prepare stage always runs before the completion stage; completing an
//!   unprepared route prepares it first.
//! - Each stage runs at most once. Completing consumes the configuration.
//! - A cancelled route never reaches its completion callback.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::factory::{Destination, RouteFamily};

/// What the factory is asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RouteIntent {
	/// Construct the destination and perform the full transition.
	#[default]
	Perform,
	/// Construct and deliver the destination without performing anything.
	GetDestination,
	/// Tear down a previously performed route.
	Remove,
}

/// Observable progress of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteState {
	/// Invoked but nothing delivered yet.
	Pending,
	/// The destination exists and was handed to the prepare stage.
	Prepared,
	/// The destination was delivered to the completion stage.
	Completed,
	/// The factory reported a failure.
	Failed(String),
	/// The caller cancelled before completion.
	Cancelled,
}

impl RouteState {
	/// Returns true once the route can no longer change state.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
	}
}

struct HandleInner {
	factory: &'static str,
	state: Mutex<RouteState>,
	cancelled: AtomicBool,
}

/// Caller-side view of an in-flight route.
#[derive(Clone)]
pub struct RouteHandle {
	inner: Arc<HandleInner>,
}

impl RouteHandle {
	pub(crate) fn new(factory: &'static str) -> Self {
		Self {
			inner: Arc::new(HandleInner {
				factory,
				state: Mutex::new(RouteState::Pending),
				cancelled: AtomicBool::new(false),
			}),
		}
	}

	/// Name of the factory executing the route.
	pub fn factory(&self) -> &'static str {
		self.inner.factory
	}

	pub fn state(&self) -> RouteState {
		self.inner.state.lock().clone()
	}

	/// Requests cancellation. Returns false if the route already finished.
	pub fn cancel(&self) -> bool {
		let mut state = self.inner.state.lock();
		if state.is_terminal() {
			return false;
		}
		self.inner.cancelled.store(true, Ordering::Release);
		*state = RouteState::Cancelled;
		true
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.cancelled.load(Ordering::Acquire)
	}

	/// Moves to `next` unless the route already finished.
	fn advance(&self, next: RouteState) -> bool {
		let mut state = self.inner.state.lock();
		if state.is_terminal() {
			return false;
		}
		*state = next;
		true
	}
}

impl core::fmt::Debug for RouteHandle {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("RouteHandle")
			.field("factory", &self.inner.factory)
			.field("state", &*self.inner.state.lock())
			.finish()
	}
}

type PrepareFn = Box<dyn FnMut(&mut dyn Any)>;
type CompletionFn = Box<dyn FnOnce(Destination)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
	Configured,
	Prepared,
}

/// Mutable configuration for one factory invocation.
pub struct RouteConfiguration {
	family: RouteFamily,
	intent: RouteIntent,
	options: Box<dyn Any>,
	prepare: Option<PrepareFn>,
	completion: Option<CompletionFn>,
	stage: Stage,
	handle: RouteHandle,
}

impl RouteConfiguration {
	pub(crate) fn new(family: RouteFamily, options: Box<dyn Any>, handle: RouteHandle) -> Self {
		Self {
			family,
			intent: RouteIntent::default(),
			options,
			prepare: None,
			completion: None,
			stage: Stage::Configured,
			handle,
		}
	}

	pub fn family(&self) -> RouteFamily {
		self.family
	}

	pub fn intent(&self) -> RouteIntent {
		self.intent
	}

	pub fn set_intent(&mut self, intent: RouteIntent) {
		self.intent = intent;
	}

	/// Factory-specific options, if they are of type `T`.
	pub fn options<T: 'static>(&self) -> Option<&T> {
		self.options.downcast_ref()
	}

	/// Mutable factory-specific options, if they are of type `T`.
	pub fn options_mut<T: 'static>(&mut self) -> Option<&mut T> {
		self.options.downcast_mut()
	}

	/// Handle shared with the caller.
	pub fn handle(&self) -> &RouteHandle {
		&self.handle
	}

	pub fn is_cancelled(&self) -> bool {
		self.handle.is_cancelled()
	}

	/// Sets the callback run on the destination before it is delivered.
	///
	/// Replaces any callback set earlier.
	pub fn on_prepare(&mut self, prepare: impl FnMut(&mut dyn Any) + 'static) {
		self.prepare = Some(Box::new(prepare));
	}

	/// Sets the callback receiving the delivered destination.
	///
	/// Replaces any callback set earlier.
	pub fn on_complete(&mut self, completion: impl FnOnce(Destination) + 'static) {
		self.completion = Some(Box::new(completion));
	}

	/// Runs the prepare stage on a freshly constructed destination.
	///
	/// Calling it again after the first time has no effect.
	pub fn prepare(&mut self, destination: &mut dyn Any) {
		if self.stage == Stage::Prepared || self.is_cancelled() {
			return;
		}
		self.stage = Stage::Prepared;
		if let Some(prepare) = self.prepare.as_mut() {
			prepare(destination);
		}
		self.handle.advance(RouteState::Prepared);
	}

	/// Delivers the destination to the completion stage.
	pub fn complete(mut self, mut destination: Destination) {
		if self.is_cancelled() {
			tracing::debug!(factory = self.handle.factory(), "route cancelled before completion");
			return;
		}
		if self.stage == Stage::Configured {
			self.prepare(&mut *destination);
		}
		if let Some(completion) = self.completion.take() {
			completion(destination);
		}
		self.handle.advance(RouteState::Completed);
	}

	/// Ends the route without a destination.
	pub fn fail(self, reason: impl Into<String>) {
		let reason = reason.into();
		tracing::debug!(factory = self.handle.factory(), %reason, "route failed");
		self.handle.advance(RouteState::Failed(reason));
	}
}

impl core::fmt::Debug for RouteConfiguration {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("RouteConfiguration")
			.field("family", &self.family)
			.field("intent", &self.intent)
			.field("stage", &self.stage)
			.field("handle", &self.handle)
			.finish_non_exhaustive()
	}
}
