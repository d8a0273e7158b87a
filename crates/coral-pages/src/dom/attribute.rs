//! Static attribute table.
//!
//! Every attribute name the renderer treats specially is listed here once.
//! Names carrying the `default` prefix are creation-only: `defaultchecked`
//! sets `checked` when a node is first built and is then stripped.

/// Prefix marking a creation-only attribute.
pub const DEFAULT_PREFIX: &str = "default";

/// How the renderer handles an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRole {
	/// Kept in sync with the template by string comparison.
	Plain,
	/// Replaced wholesale.
	Class,
	/// Diffed declaration by declaration.
	Style,
	/// Compared against the live property and never removed.
	Dynamic(DynamicKind),
}

/// Value shape of a dynamic attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicKind {
	/// Present or absent, e.g. `checked`.
	Flag,
	/// Free text, e.g. `value`.
	Text,
}

struct AttributeRule {
	name: &'static str,
	role: AttributeRole,
}

static RULES: &[AttributeRule] = &[
	AttributeRule {
		name: "class",
		role: AttributeRole::Class,
	},
	AttributeRule {
		name: "style",
		role: AttributeRole::Style,
	},
	AttributeRule {
		name: "checked",
		role: AttributeRole::Dynamic(DynamicKind::Flag),
	},
	AttributeRule {
		name: "selected",
		role: AttributeRole::Dynamic(DynamicKind::Flag),
	},
	AttributeRule {
		name: "value",
		role: AttributeRole::Dynamic(DynamicKind::Text),
	},
];

/// Looks up the role of an attribute name.
pub fn role(name: &str) -> AttributeRole {
	RULES
		.iter()
		.find(|rule| rule.name == name)
		.map(|rule| rule.role)
		.unwrap_or(AttributeRole::Plain)
}

/// Returns true for `checked`, `selected` and `value`.
pub fn is_dynamic(name: &str) -> bool {
	matches!(role(name), AttributeRole::Dynamic(_))
}

/// Names of all dynamic attributes, in table order.
pub fn dynamic_names() -> impl Iterator<Item = (&'static str, DynamicKind)> {
	RULES.iter().filter_map(|rule| match rule.role {
		AttributeRole::Dynamic(kind) => Some((rule.name, kind)),
		_ => None,
	})
}

/// Whether `tag` exposes `name` as a live property users can change.
///
/// Only then is a dynamic attribute compared by property; elsewhere
/// `checked`, `selected` and `value` are ordinary attributes.
pub fn is_live_property(tag: &str, name: &str) -> bool {
	match name {
		"checked" => tag == "input",
		"selected" => tag == "option",
		"value" => matches!(
			tag,
			"input"
				| "textarea" | "select"
				| "option" | "button"
				| "output" | "data"
				| "li" | "meter"
				| "progress" | "param"
		),
		_ => false,
	}
}

/// For a creation-only attribute, returns the attribute it initializes.
///
/// The prefix alone (`default`) is an ordinary attribute.
pub fn default_target(name: &str) -> Option<String> {
	if name.len() <= DEFAULT_PREFIX.len() || !name.starts_with(DEFAULT_PREFIX) {
		return None;
	}
	Some(name[DEFAULT_PREFIX.len()..].to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("class", AttributeRole::Class)]
	#[case("style", AttributeRole::Style)]
	#[case("checked", AttributeRole::Dynamic(DynamicKind::Flag))]
	#[case("value", AttributeRole::Dynamic(DynamicKind::Text))]
	#[case("href", AttributeRole::Plain)]
	fn test_role(#[case] name: &str, #[case] expected: AttributeRole) {
		assert_eq!(role(name), expected);
	}

	#[rstest]
	#[case("defaultchecked", Some("checked"))]
	#[case("defaultValue", Some("value"))]
	#[case("default", None)]
	#[case("data-default", None)]
	fn test_default_target(#[case] name: &str, #[case] expected: Option<&str>) {
		assert_eq!(default_target(name).as_deref(), expected);
	}

	#[rstest]
	#[case("input", "checked", true)]
	#[case("div", "checked", false)]
	#[case("option", "selected", true)]
	#[case("textarea", "value", true)]
	#[case("div", "value", false)]
	#[case("input", "href", false)]
	fn test_is_live_property(#[case] tag: &str, #[case] name: &str, #[case] expected: bool) {
		assert_eq!(is_live_property(tag, name), expected);
	}

	#[rstest]
	fn test_dynamic_names_order() {
		let names: Vec<_> = dynamic_names().map(|(n, _)| n).collect();
		assert_eq!(names, vec!["checked", "selected", "value"]);
	}
}
