use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use crate::capability::CapabilityKey;
use crate::factory::{KeySpace, RouteFamily, RouterFactory, TableId};

/// Capability-to-factory bindings for one [`TableId`].
pub type Bindings = HashMap<CapabilityKey, Arc<dyn RouterFactory>>;

/// Immutable snapshot of all four registration tables.
#[derive(Clone, Default)]
pub struct TableSet {
	view: Bindings,
	view_config: Bindings,
	service: Bindings,
	service_config: Bindings,
}

impl TableSet {
	pub fn table(&self, id: TableId) -> &Bindings {
		match (id.family, id.space) {
			(RouteFamily::View, KeySpace::Destination) => &self.view,
			(RouteFamily::View, KeySpace::Config) => &self.view_config,
			(RouteFamily::Service, KeySpace::Destination) => &self.service,
			(RouteFamily::Service, KeySpace::Config) => &self.service_config,
		}
	}

	pub(super) fn table_mut(&mut self, id: TableId) -> &mut Bindings {
		match (id.family, id.space) {
			(RouteFamily::View, KeySpace::Destination) => &mut self.view,
			(RouteFamily::View, KeySpace::Config) => &mut self.view_config,
			(RouteFamily::Service, KeySpace::Destination) => &mut self.service,
			(RouteFamily::Service, KeySpace::Config) => &mut self.service_config,
		}
	}

	#[inline]
	pub fn get(&self, id: TableId, key: &CapabilityKey) -> Option<&Arc<dyn RouterFactory>> {
		self.table(id).get(key)
	}

	/// Iterates bindings of one table in unspecified order.
	pub fn iter(
		&self,
		id: TableId,
	) -> impl Iterator<Item = (&CapabilityKey, &Arc<dyn RouterFactory>)> + '_ {
		self.table(id).iter()
	}

	pub fn len(&self, id: TableId) -> usize {
		self.table(id).len()
	}

	pub fn is_empty(&self, id: TableId) -> bool {
		self.table(id).is_empty()
	}
}
