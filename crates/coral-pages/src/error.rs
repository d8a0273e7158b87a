//! Error types for the rendering engine, the store and the router.

use thiserror::Error;

/// Result type used throughout `coral-pages`.
pub type Result<T> = std::result::Result<T, PagesError>;

/// The kind of named store operation that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// A state-mutating setter.
	Setter,
	/// A read-only getter.
	Getter,
}

impl std::fmt::Display for OperationKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Setter => write!(f, "setter"),
			Self::Getter => write!(f, "getter"),
		}
	}
}

/// Errors raised by components, stores, routers and the document model.
///
/// Whether one of these reaches the caller or is absorbed as a no-op is
/// decided by [`PagesConfig::report`](crate::config::PagesConfig::report).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PagesError {
	/// Invalid construction-time options.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// A component was asked to render without a template.
	#[error("no template was provided for the component mounted at {0}")]
	MissingTemplate(String),

	/// A setter or getter name is not registered on the store.
	#[error("there is no {kind} named '{name}'")]
	UnknownOperation {
		/// Setter or getter.
		kind: OperationKind,
		/// The name that was looked up.
		name: String,
	},

	/// The mount element could not be found at render time.
	#[error("the element to render into was not found: {0}")]
	MissingElement(String),

	/// A component is reachable from its own attached children.
	#[error("{0} has attached components that it is also attached to")]
	AttachmentCycle(String),

	/// A route URL could not be compiled into a matcher.
	#[error("invalid route pattern '{pattern}': {reason}")]
	InvalidRoutePattern {
		/// The route URL as registered.
		pattern: String,
		/// Why compilation failed.
		reason: String,
	},

	/// A URL could not be parsed or joined against the current location.
	#[error("invalid url '{url}': {reason}")]
	InvalidUrl {
		/// The offending input.
		url: String,
		/// Parser message.
		reason: String,
	},

	/// A redirect chain did not settle within the configured number of hops.
	#[error("redirect chain starting at '{url}' exceeded {limit} hops")]
	RedirectLimit {
		/// The URL that started the chain.
		url: String,
		/// The configured hop limit.
		limit: usize,
	},

	/// A tree mutation would have produced an invalid hierarchy.
	#[error("invalid node hierarchy: {0}")]
	Hierarchy(String),

	/// A selector string could not be parsed.
	#[error("invalid selector '{selector}': {reason}")]
	InvalidSelector {
		/// The selector as given.
		selector: String,
		/// Why parsing failed.
		reason: String,
	},
}

impl PagesError {
	/// Shorthand for an unknown setter.
	pub fn unknown_setter(name: impl Into<String>) -> Self {
		Self::UnknownOperation {
			kind: OperationKind::Setter,
			name: name.into(),
		}
	}

	/// Shorthand for an unknown getter.
	pub fn unknown_getter(name: impl Into<String>) -> Self {
		Self::UnknownOperation {
			kind: OperationKind::Getter,
			name: name.into(),
		}
	}
}
