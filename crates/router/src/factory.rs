//! Producer-side contract consumed by the registry and the route pipeline.

use std::any::{Any, TypeId};

use crate::route::RouteConfiguration;

/// A constructed destination before it is downcast to a capability's handle.
pub type Destination = Box<dyn Any>;

/// Route family a factory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteFamily {
	/// Factories producing presentable views.
	View,
	/// Factories producing services.
	Service,
}

impl RouteFamily {
	pub const ALL: [RouteFamily; 2] = [RouteFamily::View, RouteFamily::Service];
}

impl core::fmt::Display for RouteFamily {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::View => f.write_str("view"),
			Self::Service => f.write_str("service"),
		}
	}
}

/// What a table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpace {
	/// Keyed by the capability the destination satisfies.
	Destination,
	/// Keyed by the capability the configuration object satisfies.
	Config,
}

/// Address of one of the four registration tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId {
	pub family: RouteFamily,
	pub space: KeySpace,
}

impl TableId {
	pub const VIEW: TableId = TableId::destination(RouteFamily::View);
	pub const VIEW_CONFIG: TableId = TableId::config(RouteFamily::View);
	pub const SERVICE: TableId = TableId::destination(RouteFamily::Service);
	pub const SERVICE_CONFIG: TableId = TableId::config(RouteFamily::Service);

	pub const ALL: [TableId; 4] = [
		Self::VIEW,
		Self::VIEW_CONFIG,
		Self::SERVICE,
		Self::SERVICE_CONFIG,
	];

	pub const fn destination(family: RouteFamily) -> Self {
		Self {
			family,
			space: KeySpace::Destination,
		}
	}

	pub const fn config(family: RouteFamily) -> Self {
		Self {
			family,
			space: KeySpace::Config,
		}
	}
}

impl core::fmt::Display for TableId {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self.space {
			KeySpace::Destination => write!(f, "{} table", self.family),
			KeySpace::Config => write!(f, "{} config table", self.family),
		}
	}
}

/// Descriptor of a concrete type a factory has registered as a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProducerClass {
	name: &'static str,
	type_id: TypeId,
}

impl ProducerClass {
	/// Describes the concrete type `T`.
	pub fn of<T: 'static>() -> Self {
		Self {
			name: std::any::type_name::<T>(),
			type_id: TypeId::of::<T>(),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn type_id(&self) -> TypeId {
		self.type_id
	}
}

/// A producer bound to capabilities in the [`Registry`](crate::Registry).
///
/// Factories are process-lifetime singletons. The registry and the pipeline
/// only hold shared references; all per-route state lives in the
/// [`RouteConfiguration`] handed to [`RouterFactory::invoke`].
pub trait RouterFactory: Send + Sync + 'static {
	/// Name used in diagnostics.
	fn name(&self) -> &'static str;

	/// Family of tables this factory may be registered in.
	fn family(&self) -> RouteFamily;

	/// Returns true if [`RouterFactory::invoke`] always completes the route
	/// before returning.
	fn completes_synchronously(&self) -> bool;

	/// Builds the options object a fresh configuration starts from.
	fn default_options(&self) -> Box<dyn Any>;

	/// Concrete producer types this factory constructs destinations from.
	fn registered_producers(&self) -> Vec<ProducerClass> {
		Vec::new()
	}

	/// Executes a configured route.
	///
	/// Implementations deliver the destination through
	/// [`RouteConfiguration::prepare`] and [`RouteConfiguration::complete`],
	/// either before returning or on a later turn of the event loop.
	fn invoke(&self, config: RouteConfiguration);
}

impl core::fmt::Debug for dyn RouterFactory {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("RouterFactory")
			.field("name", &self.name())
			.field("family", &self.family())
			.finish()
	}
}
