//! Attribute diffing.
//!
//! Attributes are compared as `(name, value)` lists built from the template
//! element and the live element. Live-property attributes (`checked`,
//! `selected`, `value` on form controls) are read from the live property on
//! the live side, are only ever set, and are never removed: whatever the
//! user typed or toggled survives a render that does not mention it.

use crate::dom::attribute::{self, AttributeRole, DynamicKind};
use crate::dom::style::{self, Declaration};
use crate::dom::{Document, NodeId, PropertyValue, VElement};

/// Comparable attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
	/// Markup text.
	Text(String),
	/// A set boolean attribute or a true boolean property.
	Flag,
}

impl AttributeValue {
	fn as_text(&self) -> &str {
		match self {
			Self::Text(text) => text,
			Self::Flag => "",
		}
	}
}

/// The changes that bring a live element in line with its template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePatch {
	/// Attributes to add or update.
	pub set: Vec<(String, AttributeValue)>,
	/// Attributes to remove.
	pub remove: Vec<String>,
}

impl AttributePatch {
	/// True when nothing needs to change.
	pub fn is_empty(&self) -> bool {
		self.set.is_empty() && self.remove.is_empty()
	}
}

fn is_dynamic_on(tag: &str, name: &str) -> bool {
	attribute::is_dynamic(name) && attribute::is_live_property(tag, name)
}

/// Attributes a template element asks for.
pub fn template_attributes(el: &VElement) -> Vec<(String, AttributeValue)> {
	let mut out = Vec::new();
	for (name, value) in &el.attributes {
		if attribute::default_target(name).is_some() {
			continue;
		}
		if is_dynamic_on(&el.tag, name) {
			// A selected option is stated in markup, not typed by the user.
			if name == "selected" {
				out.push((name.clone(), AttributeValue::Flag));
			}
			continue;
		}
		out.push((name.clone(), AttributeValue::Text(value.clone())));
	}
	for (name, kind) in attribute::dynamic_names() {
		if name == "selected" || !attribute::is_live_property(&el.tag, name) {
			continue;
		}
		if el.tag == "select" && name == "value" {
			continue;
		}
		match (kind, el.attribute(name)) {
			(DynamicKind::Flag, Some(_)) => out.push((name.to_string(), AttributeValue::Flag)),
			(DynamicKind::Text, Some(value)) if !value.is_empty() => {
				out.push((name.to_string(), AttributeValue::Text(value.to_string())))
			}
			_ => {}
		}
	}
	out
}

/// Attributes a live element currently has, with live properties resolved.
pub fn live_attributes(doc: &Document, node: NodeId) -> Vec<(String, AttributeValue)> {
	let Some(el) = doc.element(node) else {
		return Vec::new();
	};
	let mut out = Vec::new();
	for (name, value) in el.attributes() {
		if attribute::default_target(name).is_some() || is_dynamic_on(el.tag(), name) {
			continue;
		}
		out.push((name.clone(), AttributeValue::Text(value.clone())));
	}
	for (name, _) in attribute::dynamic_names() {
		if !attribute::is_live_property(el.tag(), name) {
			continue;
		}
		match el.property(name) {
			Some(PropertyValue::Bool(true)) => out.push((name.to_string(), AttributeValue::Flag)),
			Some(PropertyValue::Text(text)) if !text.is_empty() => {
				out.push((name.to_string(), AttributeValue::Text(text)))
			}
			_ => {}
		}
	}
	out
}

fn same_value(name: &str, a: &AttributeValue, b: &AttributeValue) -> bool {
	match (attribute::role(name), a, b) {
		(AttributeRole::Style, AttributeValue::Text(x), AttributeValue::Text(y)) => {
			style::equivalent(x, y)
		}
		_ => a == b,
	}
}

/// Computes the patch between template and live attribute lists.
///
/// Live attributes missing from the template are removed unless they are
/// live properties of `tag`. Template attributes missing from the live list
/// or carrying a different value are set.
pub fn compute(
	tag: &str,
	template: &[(String, AttributeValue)],
	live: &[(String, AttributeValue)],
) -> AttributePatch {
	let remove = live
		.iter()
		.filter(|(name, _)| !is_dynamic_on(tag, name))
		.filter(|(name, _)| !template.iter().any(|(t, _)| t == name))
		.map(|(name, _)| name.clone())
		.collect();
	let set = template
		.iter()
		.filter(|(name, value)| {
			match live.iter().find(|(l, _)| l == name) {
				Some((_, current)) => !same_value(name, value, current),
				None => true,
			}
		})
		.cloned()
		.collect();
	AttributePatch { set, remove }
}

/// Writes one attribute the way the renderer does: class wholesale, style
/// per declaration, live properties through the property and the attribute.
pub fn apply_attribute(doc: &mut Document, node: NodeId, name: &str, value: &AttributeValue) {
	let tag = doc.tag_name(node).unwrap_or_default().to_string();
	match attribute::role(name) {
		AttributeRole::Class => doc.set_attribute(node, name, value.as_text()),
		AttributeRole::Style => diff_styles(doc, node, value.as_text()),
		AttributeRole::Dynamic(kind) if attribute::is_live_property(&tag, name) => {
			let property = match (kind, value) {
				(DynamicKind::Flag, _) | (_, AttributeValue::Flag) => PropertyValue::Bool(true),
				(DynamicKind::Text, AttributeValue::Text(text)) => PropertyValue::Text(text.clone()),
			};
			doc.set_property(node, name, property);
			doc.set_attribute(node, name, value.as_text());
		}
		_ => doc.set_attribute(node, name, value.as_text()),
	}
}

/// Applies a computed patch.
pub fn apply(doc: &mut Document, node: NodeId, patch: &AttributePatch) {
	for (name, value) in &patch.set {
		apply_attribute(doc, node, name, value);
	}
	for name in &patch.remove {
		match attribute::role(name) {
			AttributeRole::Style => doc.set_style_declarations(node, &[]),
			_ => doc.remove_attribute(node, name),
		}
	}
}

/// Diffs a live element's attributes against a template element in place.
pub fn diff(doc: &mut Document, node: NodeId, template: &VElement) {
	let patch = compute(
		&template.tag,
		&template_attributes(template),
		&live_attributes(doc, node),
	);
	if !patch.is_empty() {
		tracing::trace!(tag = %template.tag, set = patch.set.len(), remove = patch.remove.len(), "attribute patch");
		apply(doc, node, &patch);
	}
}

/// Brings inline styles in line with a style string.
///
/// Live declarations not present with the same value are dropped, then every
/// template declaration is written. The attribute is rewritten at most once.
pub fn diff_styles(doc: &mut Document, node: NodeId, styles: &str) {
	let wanted = style::parse(styles);
	let live = doc.style_declarations(node);
	let mut next: Vec<Declaration> = live
		.iter()
		.filter(|d| wanted.iter().any(|w| w == *d))
		.cloned()
		.collect();
	for decl in wanted {
		match next.iter_mut().find(|d| d.name == decl.name) {
			Some(slot) => *slot = decl,
			None => next.push(decl),
		}
	}
	if next != live {
		doc.set_style_declarations(node, &next);
	}
}

/// Resolves creation-only attributes on a freshly built subtree.
///
/// `defaultvalue="x"` becomes `value="x"` and the prefixed attribute is
/// dropped.
pub fn apply_defaults(doc: &mut Document, node: NodeId) {
	let pending: Vec<(String, String, String)> = doc
		.attributes(node)
		.into_iter()
		.filter_map(|(name, value)| {
			attribute::default_target(&name).map(|target| (name, target, value))
		})
		.collect();
	for (name, target, value) in pending {
		let value = match attribute::role(&target) {
			AttributeRole::Dynamic(DynamicKind::Flag) => AttributeValue::Flag,
			_ => AttributeValue::Text(value),
		};
		apply_attribute(doc, node, &target, &value);
		doc.remove_attribute(node, &name);
	}
	for child in doc.children(node) {
		apply_defaults(doc, child);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::parse_fragment;
	use rstest::rstest;

	fn text(value: &str) -> AttributeValue {
		AttributeValue::Text(value.to_string())
	}

	fn pairs(items: &[(&str, &str)]) -> Vec<(String, AttributeValue)> {
		items.iter().map(|(n, v)| (n.to_string(), text(v))).collect()
	}

	fn mounted(markup: &str) -> (Document, NodeId) {
		let doc = Document::with_body(markup).unwrap();
		let node = doc.children(doc.body())[0];
		(doc, node)
	}

	fn template(markup: &str) -> VElement {
		parse_fragment(markup)[0].as_element().unwrap().clone()
	}

	#[rstest]
	fn test_compute_class_id_data() {
		// Arrange
		let live = pairs(&[("class", "a"), ("id", "x")]);
		let wanted = pairs(&[("class", "b"), ("data-y", "1")]);

		// Act
		let patch = compute("div", &wanted, &live);

		// Assert
		assert_eq!(patch.set, pairs(&[("class", "b"), ("data-y", "1")]));
		assert_eq!(patch.remove, vec!["id".to_string()]);
	}

	#[rstest]
	fn test_style_is_compared_semantically() {
		// Arrange
		let live = pairs(&[("style", "margin: 0; color: red;")]);
		let wanted = pairs(&[("style", "color:red;margin:0")]);

		// Act
		let patch = compute("div", &wanted, &live);

		// Assert
		assert!(patch.is_empty());
	}

	#[rstest]
	fn test_user_input_survives_when_template_is_silent() {
		// Arrange
		let (mut doc, input) = mounted(r#"<input type="text">"#);
		doc.set_property(input, "value", PropertyValue::Text("typed".into()));

		// Act
		diff(&mut doc, input, &template(r#"<input type="text">"#));

		// Assert
		assert_eq!(
			doc.property(input, "value"),
			Some(PropertyValue::Text("typed".into()))
		);
	}

	#[rstest]
	fn test_template_value_overrides_property() {
		// Arrange
		let (mut doc, input) = mounted(r#"<input type="checkbox">"#);
		doc.set_property(input, "checked", PropertyValue::Bool(false));

		// Act
		diff(&mut doc, input, &template(r#"<input type="checkbox" checked>"#));

		// Assert
		assert_eq!(doc.property(input, "checked"), Some(PropertyValue::Bool(true)));
		assert!(doc.has_attribute(input, "checked"));
	}

	#[rstest]
	fn test_unchecking_in_template_keeps_live_state() {
		// Arrange
		let (mut doc, input) = mounted(r#"<input type="checkbox" checked>"#);

		// Act
		diff(&mut doc, input, &template(r#"<input type="checkbox">"#));

		// Assert
		assert_eq!(doc.property(input, "checked"), Some(PropertyValue::Bool(true)));
	}

	#[rstest]
	fn test_value_on_plain_element_is_ordinary() {
		// Arrange
		let (mut doc, div) = mounted(r#"<div value="1"></div>"#);

		// Act
		diff(&mut doc, div, &template("<div></div>"));

		// Assert
		assert!(!doc.has_attribute(div, "value"));
	}

	#[rstest]
	fn test_diff_styles_keeps_unrelated_order() {
		// Arrange
		let (mut doc, div) = mounted(r#"<div style="color: red; margin: 0;"></div>"#);

		// Act
		diff_styles(&mut doc, div, "margin: 0; padding: 1px");

		// Assert
		assert_eq!(doc.attribute(div, "style"), Some("margin: 0; padding: 1px;"));
	}

	#[rstest]
	fn test_removed_style_and_class_drop_attribute() {
		// Arrange
		let (mut doc, div) = mounted(r#"<div class="a" style="color: red"></div>"#);

		// Act
		diff(&mut doc, div, &template("<div></div>"));

		// Assert
		assert!(doc.attributes(div).is_empty());
	}

	#[rstest]
	fn test_apply_defaults() {
		// Arrange
		let mut doc = Document::new();
		let vnode = &parse_fragment(r#"<p><input defaultvalue="hi" defaultchecked type="checkbox"></p>"#)[0];
		let p = doc.instantiate(vnode);
		let input = doc.children(p)[0];

		// Act
		apply_defaults(&mut doc, p);

		// Assert
		assert_eq!(doc.attribute(input, "value"), Some("hi"));
		assert_eq!(doc.property(input, "checked"), Some(PropertyValue::Bool(true)));
		assert!(!doc.has_attribute(input, "defaultvalue"));
		assert!(!doc.has_attribute(input, "defaultchecked"));
	}

	#[rstest]
	fn test_default_attributes_are_ignored_when_diffing() {
		// Arrange
		let (mut doc, input) = mounted(r#"<input value="typed">"#);
		let before = doc.mutation_count();

		// Act
		diff(&mut doc, input, &template(r#"<input defaultvalue="initial">"#));

		// Assert
		assert_eq!(doc.mutation_count(), before);
		assert_eq!(doc.attribute(input, "value"), Some("typed"));
	}
}
