//! Router settings.
//!
//! Settings are plain data, typically embedded in a host's TOML configuration:
//!
//! ```toml
//! violation-policy = "log"
//! native-fallback = false
//! validate-on-complete = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ViolationPolicy;

/// Error returned when settings fail to parse.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("invalid router settings: {0}")]
	Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RouterSettings {
	/// Applied to every fatal [`RouteError`](crate::RouteError).
	pub violation_policy: ViolationPolicy,
	/// Whether discovery consults the native resolver for native capabilities.
	pub native_fallback: bool,
	/// Whether integrity validators scan when registration completes.
	pub validate_on_complete: bool,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			violation_policy: ViolationPolicy::for_build(),
			native_fallback: true,
			validate_on_complete: true,
		}
	}
}

impl RouterSettings {
	/// Parses settings from TOML. Missing keys keep their defaults.
	pub fn from_toml(src: &str) -> Result<Self, SettingsError> {
		Ok(toml::from_str(src)?)
	}

	pub fn with_policy(mut self, policy: ViolationPolicy) -> Self {
		self.violation_policy = policy;
		self
	}
}
