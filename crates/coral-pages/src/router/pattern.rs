//! Route URL compilation.
//!
//! A route URL is normalized to one leading slash and no trailing slash,
//! then compiled into an anchored regular expression:
//!
//! | token   | matches                         | captured as |
//! |---------|---------------------------------|-------------|
//! | `:name` | one or more non-slash chars     | `name`      |
//! | `*name` | anything, slashes included      | `name`      |
//! | `*`     | anything, slashes included      | not captured|
//!
//! The match must end at the end of the path or at a trailing slash.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PagesError, Result};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"([:*])(\w+)|\*").expect("token pattern is valid")
});

const SEGMENT: &str = "([^/]+)";
const CATCH_ALL: &str = "(.*)";
const WILDCARD: &str = "(?:.*)";
const FOLLOWED_BY_SLASH: &str = "(?:/$|$)";

/// Normalizes a path to `/` plus the path without one leading and one
/// trailing slash. `""`, `"/"` and `"//"` all become `"/"`.
pub fn normalize(path: &str) -> String {
	let trimmed = path.strip_prefix('/').unwrap_or(path);
	let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
	format!("/{trimmed}")
}

/// A compiled route URL.
#[derive(Debug, Clone)]
pub struct RoutePattern {
	source: String,
	regex: Regex,
	param_names: Vec<String>,
}

impl RoutePattern {
	/// Compiles a route URL.
	pub fn compile(url: &str) -> Result<Self> {
		let normalized = normalize(url);
		let mut expr = String::from("^");
		let mut param_names = Vec::new();
		let mut last = 0;
		for caps in TOKEN.captures_iter(&normalized) {
			let Some(whole) = caps.get(0) else {
				continue;
			};
			expr.push_str(&regex::escape(&normalized[last..whole.start()]));
			match (caps.get(1).map(|m| m.as_str()), caps.get(2)) {
				(Some(":"), Some(name)) => {
					param_names.push(name.as_str().to_string());
					expr.push_str(SEGMENT);
				}
				(Some(_), Some(name)) => {
					param_names.push(name.as_str().to_string());
					expr.push_str(CATCH_ALL);
				}
				_ => expr.push_str(WILDCARD),
			}
			last = whole.end();
		}
		expr.push_str(&regex::escape(&normalized[last..]));
		expr.push_str(FOLLOWED_BY_SLASH);
		let regex = Regex::new(&expr).map_err(|e| PagesError::InvalidRoutePattern {
			pattern: url.to_string(),
			reason: e.to_string(),
		})?;
		Ok(Self {
			source: url.to_string(),
			regex,
			param_names,
		})
	}

	/// The URL as registered.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Parameter names in order of appearance.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Matches a normalized path and returns percent-decoded parameters.
	pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
		let caps = self.regex.captures(path)?;
		let params = self
			.param_names
			.iter()
			.enumerate()
			.filter_map(|(i, name)| {
				let raw = caps.get(i + 1)?.as_str();
				Some((name.clone(), decode(raw)))
			})
			.collect();
		Some(params)
	}
}

/// Percent-decodes a component, keeping the raw text when it is not valid UTF-8.
pub(crate) fn decode(raw: &str) -> String {
	urlencoding::decode(raw)
		.map(|s| s.into_owned())
		.unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	#[rstest]
	#[case("", "/")]
	#[case("/", "/")]
	#[case("//", "/")]
	#[case("jobs", "/jobs")]
	#[case("/jobs/", "/jobs")]
	#[case("/a/b/", "/a/b")]
	fn test_normalize(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize(input), expected);
	}

	#[rstest]
	#[case("/jobs/:id", "/jobs/42", Some(vec![("id", "42")]))]
	#[case("/jobs/:id", "/jobs/42/", Some(vec![("id", "42")]))]
	#[case("/jobs/:id", "/jobs/42/runs", None)]
	#[case("/jobs/:id/runs/:run", "/jobs/a%20b/runs/7", Some(vec![("id", "a b"), ("run", "7")]))]
	#[case("/files/*path", "/files/a/b/c.txt", Some(vec![("path", "a/b/c.txt")]))]
	#[case("/docs/*", "/docs/x/y", Some(vec![]))]
	#[case("/jobs/", "/jobs", Some(vec![]))]
	#[case("/jobs/", "/jobsx", None)]
	#[case("/jobs/", "/other/jobs", None)]
	#[case("/v1.0/", "/v1x0", None)]
	fn test_matches(
		#[case] pattern: &str,
		#[case] path: &str,
		#[case] expected: Option<Vec<(&str, &str)>>,
	) {
		// Arrange
		let pattern = RoutePattern::compile(pattern).unwrap();

		// Act
		let result = pattern.matches(path);

		// Assert
		let expected = expected.map(|pairs| {
			pairs
				.into_iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect::<BTreeMap<_, _>>()
		});
		assert_eq!(result, expected);
	}

	#[rstest]
	fn test_param_names_in_order() {
		let pattern = RoutePattern::compile("/:b/:a/*rest").unwrap();
		assert_eq!(pattern.param_names(), &["b", "a", "rest"]);
	}

	proptest! {
		#[test]
		fn prop_single_param_roundtrips(id in "[A-Za-z0-9_-]{1,16}") {
			let pattern = RoutePattern::compile("/jobs/:id").unwrap();
			let params = pattern.matches(&format!("/jobs/{id}")).unwrap();
			prop_assert_eq!(params.get("id"), Some(&id));
		}
	}
}
