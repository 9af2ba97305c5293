//! Per-family "registration complete" signal.
//!
//! Subscribers are cloned out of the lock before they run, so a subscriber may
//! unsubscribe itself (or subscribe others) while the event is firing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::factory::RouteFamily;

/// Callback run when a family's registration phase completes.
pub type Subscriber = Arc<dyn Fn() + Send + Sync>;

/// Token returned by [`RegistrationEvents::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct RegistrationEvents {
	subscribers: Mutex<HashMap<RouteFamily, Vec<(SubscriptionId, Subscriber)>>>,
	next_id: AtomicU64,
}

impl RegistrationEvents {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&self, family: RouteFamily, subscriber: Subscriber) -> SubscriptionId {
		let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.subscribers.lock().entry(family).or_default().push((id, subscriber));
		id
	}

	/// Removes a subscription. Returns false if it was already gone.
	pub fn unsubscribe(&self, family: RouteFamily, id: SubscriptionId) -> bool {
		let mut subscribers = self.subscribers.lock();
		let Some(list) = subscribers.get_mut(&family) else {
			return false;
		};
		let before = list.len();
		list.retain(|(existing, _)| *existing != id);
		before != list.len()
	}

	pub fn subscriber_count(&self, family: RouteFamily) -> usize {
		self.subscribers.lock().get(&family).map_or(0, Vec::len)
	}

	/// Signals that registration for `family` is complete.
	///
	/// May be called more than once; subscribers decide whether to react again.
	pub fn fire(&self, family: RouteFamily) {
		let subscribers: Vec<Subscriber> = self
			.subscribers
			.lock()
			.get(&family)
			.map(|list| list.iter().map(|(_, subscriber)| Arc::clone(subscriber)).collect())
			.unwrap_or_default();

		tracing::debug!(%family, subscribers = subscribers.len(), "registration complete");
		for subscriber in subscribers {
			subscriber();
		}
	}
}

impl core::fmt::Debug for RegistrationEvents {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let subscribers = self.subscribers.lock();
		f.debug_struct("RegistrationEvents")
			.field("views", &subscribers.get(&RouteFamily::View).map_or(0, Vec::len))
			.field("services", &subscribers.get(&RouteFamily::Service).map_or(0, Vec::len))
			.finish()
	}
}
