//! Producer-to-capability conformance checks used by integrity validation.
//!
//! Rust has no runtime reflection over trait implementations, so producers
//! declare what they satisfy with [`declare_conformance!`](crate::declare_conformance).
//! Each declaration is submitted via `inventory::submit!` and gathered at
//! startup by [`DeclaredConformance::collect`].

use std::any::TypeId;

use rustc_hash::FxHashSet as HashSet;

use crate::capability::{Capability, CapabilityKey};
use crate::factory::ProducerClass;

/// Answers whether a concrete producer type satisfies a capability.
pub trait Conformance: Send + Sync + 'static {
	fn conforms(&self, producer: &ProducerClass, capability: &CapabilityKey) -> bool;
}

impl<F> Conformance for F
where
	F: Fn(&ProducerClass, &CapabilityKey) -> bool + Send + Sync + 'static,
{
	fn conforms(&self, producer: &ProducerClass, capability: &CapabilityKey) -> bool {
		self(producer, capability)
	}
}

/// Static conformance entry collected via `inventory`.
pub struct ConformanceDecl {
	pub producer: fn() -> ProducerClass,
	pub capability: fn() -> CapabilityKey,
}

inventory::collect!(ConformanceDecl);

/// Conformance backed by explicit declarations.
#[derive(Debug, Default, Clone)]
pub struct DeclaredConformance {
	declared: HashSet<(TypeId, &'static str)>,
}

impl DeclaredConformance {
	pub fn new() -> Self {
		Self::default()
	}

	/// Gathers every [`declare_conformance!`](crate::declare_conformance) in the binary.
	pub fn collect() -> Self {
		let mut conformance = Self::new();
		for decl in inventory::iter::<ConformanceDecl> {
			conformance.insert((decl.producer)(), (decl.capability)());
		}
		tracing::debug!(declarations = conformance.len(), "collected producer conformances");
		conformance
	}

	/// Records that `P` satisfies `C`.
	pub fn declare<P: 'static, C: Capability>(mut self) -> Self {
		self.insert(ProducerClass::of::<P>(), C::key());
		self
	}

	pub fn insert(&mut self, producer: ProducerClass, capability: CapabilityKey) {
		self.declared.insert((producer.type_id(), capability.tag()));
	}

	pub fn len(&self) -> usize {
		self.declared.len()
	}

	pub fn is_empty(&self) -> bool {
		self.declared.is_empty()
	}
}

impl Conformance for DeclaredConformance {
	fn conforms(&self, producer: &ProducerClass, capability: &CapabilityKey) -> bool {
		self.declared.contains(&(producer.type_id(), capability.tag()))
	}
}

/// Declares that a producer type satisfies one or more capabilities.
///
/// ```ignore
/// declare_conformance!(WelcomeScreen => Greeter, GreeterService);
/// ```
#[macro_export]
macro_rules! declare_conformance {
	($producer:ty => $($capability:ty),+ $(,)?) => {
		$(
			$crate::inventory::submit! {
				$crate::conformance::ConformanceDecl {
					producer: $crate::ProducerClass::of::<$producer>,
					capability: <$capability as $crate::Capability>::key,
				}
			}
		)+
	};
}
