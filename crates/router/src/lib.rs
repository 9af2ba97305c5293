//! Capability-keyed router factories.
//!
//! Application modules ask for "something that satisfies capability X" and
//! receive a correctly typed destination, while the decision of what provides
//! X is made elsewhere at startup.
//!
//! # Modules
//!
//! - [`capability`] - Capability marker traits, keys and declaration macros
//! - [`registry`] - The four registration tables and the launch lock
//! - [`discovery`] - Resolution with the native fallback
//! - [`pipeline`] - `perform` and `make_destination` requests
//! - [`route`] - Per-invocation configuration and the live route handle
//! - [`validate`] - Deferred producer conformance checks
//!
//! # Lifecycle
//!
//! 1. Build a [`Registry`] and bind capabilities with `register_*`.
//! 2. Arm [`IntegrityValidator`]s against a [`RegistrationEvents`] source.
//! 3. Call [`Registry::finish_launch`] and fire the registration events.
//! 4. Route requests through a [`Router`].

pub mod capability;
pub mod config;
pub mod conformance;
pub mod discovery;
pub mod error;
pub mod events;
pub mod factory;
pub mod pipeline;
pub mod registry;
pub mod route;
pub mod validate;

#[cfg(test)]
mod testing;

pub use capability::{Capability, CapabilityKey, CapabilityOrigin, ConfigCapability, DestinationCapability};
pub use config::{RouterSettings, SettingsError};
pub use conformance::{Conformance, DeclaredConformance};
pub use discovery::{Discovery, NativeResolver};
pub use error::{RouteError, ViolationPolicy};
pub use events::{RegistrationEvents, Subscriber, SubscriptionId};
pub use factory::{Destination, KeySpace, ProducerClass, RouteFamily, RouterFactory, TableId};
pub use pipeline::{ConfigRequest, DestinationRequest, Router};
pub use registry::{Registry, TableSet};
pub use route::{RouteConfiguration, RouteHandle, RouteIntent, RouteState};
pub use validate::{IntegrityValidator, ValidationReport, ValidatorState};

#[doc(hidden)]
pub use inventory;
