//! Deferred integrity validation of registered producers.
//!
//! # Role
//!
//! Producers and capabilities are registered in any order across
//! independently loaded modules, so conformance can only be asserted once a
//! family's registration phase is complete. An [`IntegrityValidator`] waits
//! for that [`RegistrationEvents`] signal, then checks every producer of every
//! factory in the family's destination table against a [`Conformance`]
//! predicate.
//!
//! # Invariants
//!
//! - A validator scans at most once. It moves from [`ValidatorState::Armed`]
//!   to [`ValidatorState::Fired`] before unsubscribing and scanning, so
//!   repeated or re-entrant firings are no-ops.
//! - Every non-conforming producer is a fatal [`RouteError::NonConformingProducer`]
//!   under the registry's [`ViolationPolicy`](crate::ViolationPolicy).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::conformance::Conformance;
use crate::error::RouteError;
use crate::events::{RegistrationEvents, SubscriptionId};
use crate::factory::{RouteFamily, TableId};
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorState {
	/// Waiting for the registration-complete signal.
	Armed,
	/// Unsubscribed; the scan ran or was disabled.
	Fired,
}

/// Outcome of one validation scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
	pub family: RouteFamily,
	/// Number of (capability, producer) pairs checked.
	pub checked: usize,
	pub violations: Vec<RouteError>,
}

impl ValidationReport {
	pub fn is_clean(&self) -> bool {
		self.violations.is_empty()
	}
}

pub struct IntegrityValidator {
	family: RouteFamily,
	registry: Arc<Registry>,
	conformance: Arc<dyn Conformance>,
	events: Weak<RegistrationEvents>,
	subscription: Mutex<Option<SubscriptionId>>,
	fired: AtomicBool,
	report: Mutex<Option<ValidationReport>>,
}

impl IntegrityValidator {
	/// Subscribes a validator for `family` to `events`.
	///
	/// The scan runs even if the returned handle is dropped; keep it to read
	/// the [`ValidationReport`].
	///
	/// When the registry's settings disable validation the returned validator
	/// is already fired and never scans.
	pub fn arm(
		family: RouteFamily,
		registry: Arc<Registry>,
		events: &Arc<RegistrationEvents>,
		conformance: Arc<dyn Conformance>,
	) -> Arc<Self> {
		let enabled = registry.settings().validate_on_complete;
		let validator = Arc::new(Self {
			family,
			registry,
			conformance,
			events: Arc::downgrade(events),
			subscription: Mutex::new(None),
			fired: AtomicBool::new(!enabled),
			report: Mutex::new(None),
		});
		if !enabled {
			tracing::debug!(%family, "integrity validation disabled");
			return validator;
		}

		// The subscription keeps the validator alive until it fires and unsubscribes.
		let armed = Arc::clone(&validator);
		let id = events.subscribe(family, Arc::new(move || armed.fire()));
		*validator.subscription.lock() = Some(id);
		validator
	}

	/// Arms one validator per route family sharing `conformance`.
	pub fn arm_all(
		registry: &Arc<Registry>,
		events: &Arc<RegistrationEvents>,
		conformance: Arc<dyn Conformance>,
	) -> Vec<Arc<Self>> {
		RouteFamily::ALL
			.into_iter()
			.map(|family| Self::arm(family, Arc::clone(registry), events, Arc::clone(&conformance)))
			.collect()
	}

	pub fn family(&self) -> RouteFamily {
		self.family
	}

	pub fn state(&self) -> ValidatorState {
		if self.fired.load(Ordering::Acquire) {
			ValidatorState::Fired
		} else {
			ValidatorState::Armed
		}
	}

	/// Result of the scan, once it has run.
	pub fn report(&self) -> Option<ValidationReport> {
		self.report.lock().clone()
	}

	fn fire(&self) {
		if self
			.fired
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return;
		}
		let subscription = self.subscription.lock().take();
		if let (Some(events), Some(id)) = (self.events.upgrade(), subscription) {
			events.unsubscribe(self.family, id);
		}

		let report = self.scan();
		tracing::info!(
			family = %self.family,
			checked = report.checked,
			violations = report.violations.len(),
			"integrity validation finished"
		);
		let violations = report.violations.clone();
		*self.report.lock() = Some(report);

		let policy = self.registry.policy();
		for violation in violations {
			policy.enforce(violation);
		}
	}

	fn scan(&self) -> ValidationReport {
		let table = TableId::destination(self.family);
		let snapshot = self.registry.snapshot();
		let mut report = ValidationReport {
			family: self.family,
			checked: 0,
			violations: Vec::new(),
		};

		for (capability, factory) in snapshot.iter(table) {
			for producer in factory.registered_producers() {
				report.checked += 1;
				if !self.conformance.conforms(&producer, capability) {
					report.violations.push(RouteError::NonConformingProducer {
						capability: capability.tag(),
						factory: factory.name(),
						producer: producer.name(),
					});
				}
			}
		}
		report
	}
}

impl core::fmt::Debug for IntegrityValidator {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("IntegrityValidator")
			.field("family", &self.family)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}
