//! Node payloads stored in the document arena and the owned template tree.

use std::collections::BTreeMap;

/// Live value of an element property.
///
/// Properties shadow their attribute once written, the way form controls
/// keep user input separate from markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
	/// Boolean property such as `checked`.
	Bool(bool),
	/// Text property such as `value`.
	Text(String),
}

impl PropertyValue {
	/// Falsy values are `false` and the empty string.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Bool(b) => *b,
			Self::Text(s) => !s.is_empty(),
		}
	}
}

/// Element payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
	pub(crate) tag: String,
	pub(crate) attributes: Vec<(String, String)>,
	pub(crate) properties: BTreeMap<String, PropertyValue>,
}

impl ElementData {
	pub(crate) fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into().to_ascii_lowercase(),
			attributes: Vec::new(),
			properties: BTreeMap::new(),
		}
	}

	/// Lowercase tag name.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// Attributes in insertion order.
	pub fn attributes(&self) -> &[(String, String)] {
		&self.attributes
	}

	/// Looks up an attribute value.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_str())
	}

	pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
		match self.attributes.iter_mut().find(|(n, _)| n == name) {
			Some(slot) => slot.1 = value.to_string(),
			None => self.attributes.push((name.to_string(), value.to_string())),
		}
	}

	pub(crate) fn remove_attribute(&mut self, name: &str) -> bool {
		let before = self.attributes.len();
		self.attributes.retain(|(n, _)| n != name);
		before != self.attributes.len()
	}

	/// Reads a property, falling back to the attribute it reflects.
	pub fn property(&self, name: &str) -> Option<PropertyValue> {
		if let Some(value) = self.properties.get(name) {
			return Some(value.clone());
		}
		match name {
			"checked" | "selected" | "disabled" => {
				Some(PropertyValue::Bool(self.attribute(name).is_some()))
			}
			"value" => Some(PropertyValue::Text(
				self.attribute("value").unwrap_or_default().to_string(),
			)),
			_ => None,
		}
	}
}

/// Arena node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// The document root.
	Document,
	/// An element.
	Element(ElementData),
	/// A text node.
	Text(String),
	/// A comment node.
	Comment(String),
	/// A detached container whose children are moved on insertion.
	Fragment,
}

impl NodeKind {
	/// Kind label used when deciding whether two nodes can be patched in place.
	///
	/// Elements compare by tag name, so `div` and `span` differ.
	pub fn label(&self) -> &str {
		match self {
			Self::Document => "#document",
			Self::Element(el) => &el.tag,
			Self::Text(_) => "#text",
			Self::Comment(_) => "#comment",
			Self::Fragment => "#fragment",
		}
	}

	/// Returns the element payload, if any.
	pub fn as_element(&self) -> Option<&ElementData> {
		match self {
			Self::Element(el) => Some(el),
			_ => None,
		}
	}
}

/// A parsed template node. Owned and detached from any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
	/// An element with attributes and children.
	Element(VElement),
	/// Character data.
	Text(String),
	/// A comment.
	Comment(String),
}

/// A template element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VElement {
	/// Lowercase tag name.
	pub tag: String,
	/// Attributes sorted by name.
	pub attributes: Vec<(String, String)>,
	/// Child nodes in document order.
	pub children: Vec<VNode>,
}

impl VElement {
	/// Creates an element without attributes or children.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into().to_ascii_lowercase(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Looks up an attribute value.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_str())
	}
}

impl VNode {
	/// Kind label compatible with [`NodeKind::label`].
	pub fn label(&self) -> &str {
		match self {
			Self::Element(el) => &el.tag,
			Self::Text(_) => "#text",
			Self::Comment(_) => "#comment",
		}
	}

	/// Child nodes; empty for character data.
	pub fn children(&self) -> &[VNode] {
		match self {
			Self::Element(el) => &el.children,
			_ => &[],
		}
	}

	/// Text content of a leaf node. `None` when the node has children.
	pub fn leaf_content(&self) -> Option<&str> {
		match self {
			Self::Element(el) if el.children.is_empty() => Some(""),
			Self::Element(_) => None,
			Self::Text(text) | Self::Comment(text) => Some(text),
		}
	}

	/// Returns the element payload, if any.
	pub fn as_element(&self) -> Option<&VElement> {
		match self {
			Self::Element(el) => Some(el),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_property_reflects_attribute_until_written() {
		// Arrange
		let mut el = ElementData::new("INPUT");
		el.set_attribute("value", "a");
		el.set_attribute("checked", "");

		// Act
		let before = el.property("value");
		el.properties
			.insert("value".into(), PropertyValue::Text("typed".into()));
		let after = el.property("value");

		// Assert
		assert_eq!(el.tag(), "input");
		assert_eq!(before, Some(PropertyValue::Text("a".into())));
		assert_eq!(after, Some(PropertyValue::Text("typed".into())));
		assert_eq!(el.property("checked"), Some(PropertyValue::Bool(true)));
		assert_eq!(el.property("title"), None);
	}

	#[rstest]
	#[case(PropertyValue::Bool(false), false)]
	#[case(PropertyValue::Text(String::new()), false)]
	#[case(PropertyValue::Text("0".into()), true)]
	fn test_truthiness(#[case] value: PropertyValue, #[case] expected: bool) {
		assert_eq!(value.is_truthy(), expected);
	}
}
