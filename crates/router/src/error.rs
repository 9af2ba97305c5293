//! Route contract violations and the policy applied to them.

use serde::{Deserialize, Serialize};

use crate::factory::TableId;

/// Errors raised by registration, discovery and the route pipeline.
///
/// Every variant except [`RouteError::Incomplete`] and [`RouteError::Failed`]
/// is a defect in how the program was wired, not a runtime condition. See
/// [`RouteError::is_fatal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
	#[error("can't register {capability} in {table} after launch finished")]
	RegistrationClosed {
		table: TableId,
		capability: &'static str,
	},

	#[error("{capability} is a native capability; register it on the native side")]
	NativeCapability { capability: &'static str },

	#[error("factory {factory} is a {found} factory and can't be registered in {table}")]
	FamilyMismatch {
		table: TableId,
		factory: &'static str,
		found: crate::factory::RouteFamily,
	},

	#[error("default configuration of factory {factory} does not satisfy {capability}")]
	ConfigMismatch {
		capability: &'static str,
		factory: &'static str,
	},

	#[error("{capability} was already registered in {table} with factory {existing}")]
	DuplicateRegistration {
		table: TableId,
		capability: &'static str,
		existing: &'static str,
	},

	#[error("no factory registered for {capability} in {table}")]
	Unregistered {
		table: TableId,
		capability: &'static str,
	},

	#[error("factory {factory} can't produce a destination synchronously")]
	Asynchronous { factory: &'static str },

	#[error("bad implementation in factory {factory}: destination is not {capability}")]
	DestinationMismatch {
		factory: &'static str,
		capability: &'static str,
	},

	#[error("producer {producer} registered by factory {factory} does not conform to {capability}")]
	NonConformingProducer {
		capability: &'static str,
		factory: &'static str,
		producer: &'static str,
	},

	#[error("factory {factory} returned without completing the route")]
	Incomplete { factory: &'static str },

	#[error("factory {factory} failed: {reason}")]
	Failed {
		factory: &'static str,
		reason: String,
	},
}

impl RouteError {
	/// Returns true for wiring defects that the active [`ViolationPolicy`]
	/// applies to.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Self::Incomplete { .. } | Self::Failed { .. })
	}
}

/// What a fatal [`RouteError`] does at the point it is detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationPolicy {
	/// Panic with the error message.
	Panic,
	/// Emit an error event and hand the error back to the caller.
	Log,
}

impl ViolationPolicy {
	/// Returns the appropriate policy based on build configuration.
	#[inline]
	pub fn for_build() -> Self {
		if cfg!(debug_assertions) {
			ViolationPolicy::Panic
		} else {
			ViolationPolicy::Log
		}
	}

	/// Applies the policy to `err`, returning it when execution continues.
	///
	/// Non-fatal errors pass through untouched.
	#[track_caller]
	pub fn enforce(self, err: RouteError) -> RouteError {
		if !err.is_fatal() {
			return err;
		}
		match self {
			ViolationPolicy::Panic => panic!("{err}"),
			ViolationPolicy::Log => {
				tracing::error!(error = %err, "route contract violation");
				err
			}
		}
	}
}

impl Default for ViolationPolicy {
	fn default() -> Self {
		Self::for_build()
	}
}
