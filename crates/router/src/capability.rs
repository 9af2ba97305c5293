//! Capability descriptors and their table keys.
//!
//! # Role
//!
//! A capability is a marker type naming a contract a producer can satisfy. It
//! carries a stable string tag chosen when the capability is declared, so key
//! identity never depends on runtime reflection.
//!
//! # Invariants
//!
//! - Two [`CapabilityKey`]s are equal iff their tags are equal. The origin is
//!   carried alongside but does not participate in identity.
//! - Tags are `'static` and never change after declaration.

use std::hash::{Hash, Hasher};

/// Which registration system a capability belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityOrigin {
	/// Expressed purely in Rust types; bound through [`crate::Registry`].
	Declared,
	/// Owned by the native dynamic-protocol system; bound on the native side
	/// and reachable only through the discovery fallback.
	Native,
}

impl core::fmt::Display for CapabilityOrigin {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Declared => f.write_str("declared"),
			Self::Native => f.write_str("native"),
		}
	}
}

/// A type-level contract identified by a self-registered tag.
///
/// Implement through [`destination_capability!`](crate::destination_capability)
/// or [`config_capability!`](crate::config_capability) rather than by hand.
pub trait Capability: 'static {
	/// Canonical identity of the capability.
	const TAG: &'static str;
	/// Registration system the capability belongs to.
	const ORIGIN: CapabilityOrigin = CapabilityOrigin::Declared;

	/// Returns the table key for this capability.
	fn key() -> CapabilityKey {
		CapabilityKey::new(Self::TAG, Self::ORIGIN)
	}
}

/// A capability satisfied by a produced destination.
pub trait DestinationCapability: Capability {
	/// Handle type delivered to callers, usually a boxed trait object.
	type Destination: 'static;
}

/// A capability satisfied by a factory's configuration object.
pub trait ConfigCapability: Capability {
	/// Options type the factory's configuration must carry.
	type Options: 'static;
}

/// Hashable identity of a capability.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityKey {
	tag: &'static str,
	origin: CapabilityOrigin,
}

impl CapabilityKey {
	/// Creates a key from a raw tag.
	pub const fn new(tag: &'static str, origin: CapabilityOrigin) -> Self {
		Self { tag, origin }
	}

	/// Creates a key for a declared capability.
	pub const fn declared(tag: &'static str) -> Self {
		Self::new(tag, CapabilityOrigin::Declared)
	}

	/// Creates a key for a native dynamic-protocol capability.
	pub const fn native(tag: &'static str) -> Self {
		Self::new(tag, CapabilityOrigin::Native)
	}

	/// Returns the key for capability `C`.
	pub fn of<C: Capability>() -> Self {
		C::key()
	}

	pub const fn tag(&self) -> &'static str {
		self.tag
	}

	pub const fn origin(&self) -> CapabilityOrigin {
		self.origin
	}

	pub const fn is_native(&self) -> bool {
		matches!(self.origin, CapabilityOrigin::Native)
	}
}

impl PartialEq for CapabilityKey {
	fn eq(&self, other: &Self) -> bool {
		self.tag == other.tag
	}
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.tag.hash(state);
	}
}

impl core::fmt::Display for CapabilityKey {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.tag)
	}
}

/// Declares a [`DestinationCapability`] marker type.
///
/// The tag defaults to `module_path!()::Name`; pass `tag = "..."` to pin it.
/// Native capabilities always carry an explicit tag followed by `native`.
///
/// ```ignore
/// destination_capability!(pub Greeter => Box<dyn Greet>);
/// destination_capability!(pub Legacy => Box<dyn Greet>, tag = "legacy.greeter", native);
/// ```
#[macro_export]
macro_rules! destination_capability {
	($(#[$attr:meta])* $vis:vis $name:ident => $dest:ty, tag = $tag:literal, native) => {
		$crate::__capability_marker!($(#[$attr])* $vis $name, $tag, $crate::CapabilityOrigin::Native);

		impl $crate::DestinationCapability for $name {
			type Destination = $dest;
		}
	};
	($(#[$attr:meta])* $vis:vis $name:ident => $dest:ty $(, tag = $tag:literal)?) => {
		$crate::__capability_marker!(
			$(#[$attr])* $vis $name,
			$crate::__capability_tag!($name $(, $tag)?),
			$crate::CapabilityOrigin::Declared
		);

		impl $crate::DestinationCapability for $name {
			type Destination = $dest;
		}
	};
}

/// Declares a [`ConfigCapability`] marker type.
///
/// Accepts the same `tag = "..."` and `native` suffixes as
/// [`destination_capability!`](crate::destination_capability).
#[macro_export]
macro_rules! config_capability {
	($(#[$attr:meta])* $vis:vis $name:ident => $options:ty, tag = $tag:literal, native) => {
		$crate::__capability_marker!($(#[$attr])* $vis $name, $tag, $crate::CapabilityOrigin::Native);

		impl $crate::ConfigCapability for $name {
			type Options = $options;
		}
	};
	($(#[$attr:meta])* $vis:vis $name:ident => $options:ty $(, tag = $tag:literal)?) => {
		$crate::__capability_marker!(
			$(#[$attr])* $vis $name,
			$crate::__capability_tag!($name $(, $tag)?),
			$crate::CapabilityOrigin::Declared
		);

		impl $crate::ConfigCapability for $name {
			type Options = $options;
		}
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __capability_marker {
	($(#[$attr:meta])* $vis:vis $name:ident, $tag:expr, $origin:expr) => {
		$(#[$attr])*
		#[derive(Debug, Clone, Copy)]
		#[allow(dead_code)]
		$vis struct $name;

		impl $crate::Capability for $name {
			const TAG: &'static str = $tag;
			const ORIGIN: $crate::CapabilityOrigin = $origin;
		}
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __capability_tag {
	($name:ident, $tag:literal) => {
		$tag
	};
	($name:ident) => {
		concat!(module_path!(), "::", stringify!($name))
	};
}
