//! Construction-time configuration.
//!
//! A [`PagesConfig`] is handed to every store, component and router through
//! [`Runtime`](crate::runtime::Runtime). It replaces a process-wide debug
//! switch: the `debug` flag decides whether recoverable misuse surfaces as an
//! error or is logged and absorbed.
//!
//! ```
//! use coral_pages::config::PagesConfig;
//!
//! let config = PagesConfig::from_toml_str("debug = true\nmax_redirects = 5").unwrap();
//! assert!(config.debug);
//! assert_eq!(config.max_redirects, 5);
//! assert!(!config.allow_html);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PagesError, Result};

/// Default number of redirect hops a router follows before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 3;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
	/// Surface recoverable errors instead of absorbing them.
	pub debug: bool,
	/// Default for snapshots: keep strings unescaped.
	pub allow_html: bool,
	/// Maximum redirect hops per navigation.
	pub max_redirects: usize,
}

impl Default for PagesConfig {
	fn default() -> Self {
		Self {
			debug: false,
			allow_html: false,
			max_redirects: DEFAULT_MAX_REDIRECTS,
		}
	}
}

impl PagesConfig {
	/// Configuration for development: errors are returned to the caller.
	pub fn development() -> Self {
		Self {
			debug: true,
			..Self::default()
		}
	}

	/// Configuration for production: errors are logged and absorbed.
	pub fn production() -> Self {
		Self::default()
	}

	/// Parses a configuration from TOML. Missing keys take their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		toml::from_str(source).map_err(|e| PagesError::Configuration(e.message().to_string()))
	}

	/// Sets the debug flag.
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	/// Sets the redirect hop limit.
	pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
		self.max_redirects = max_redirects;
		self
	}

	/// Sets the default HTML escaping behavior for snapshots.
	pub fn with_allow_html(mut self, allow_html: bool) -> Self {
		self.allow_html = allow_html;
		self
	}

	/// Applies the error policy.
	///
	/// In debug mode the error is returned. Otherwise it is logged at `warn`
	/// and the operation's neutral value is returned instead.
	pub fn report<T: Default>(&self, err: PagesError) -> Result<T> {
		if self.debug {
			return Err(err);
		}
		tracing::warn!(error = %err, "absorbed error");
		Ok(T::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		// Act
		let config = PagesConfig::default();

		// Assert
		assert!(!config.debug);
		assert!(!config.allow_html);
		assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
	}

	#[rstest]
	fn test_from_toml_partial() {
		// Arrange
		let source = "allow_html = true";

		// Act
		let config = PagesConfig::from_toml_str(source).unwrap();

		// Assert
		assert!(config.allow_html);
		assert!(!config.debug);
		assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
	}

	#[rstest]
	fn test_from_toml_rejects_wrong_type() {
		// Act
		let result = PagesConfig::from_toml_str("debug = \"yes\"");

		// Assert
		assert!(matches!(result, Err(PagesError::Configuration(_))));
	}

	#[rstest]
	#[case(true, true)]
	#[case(false, false)]
	fn test_report_policy(#[case] debug: bool, #[case] expect_err: bool) {
		// Arrange
		let config = PagesConfig::default().with_debug(debug);

		// Act
		let result: Result<Option<u8>> = config.report(PagesError::MissingElement("#x".into()));

		// Assert
		assert_eq!(result.is_err(), expect_err);
		if !expect_err {
			assert_eq!(result.unwrap(), None);
		}
	}
}
