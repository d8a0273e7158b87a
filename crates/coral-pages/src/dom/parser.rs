//! Template parsing.
//!
//! Markup is parsed as an HTML5 fragment in body context, then copied into
//! an owned [`VNode`] tree so the parser's arena can be dropped right away.

use scraper::{ElementRef, Html, Node};

use super::node::{VElement, VNode};

/// Parses markup into template nodes.
///
/// Whitespace-only text nodes are kept: the tree diff is positional and must
/// see the same node list the markup describes. Attributes are sorted by name.
pub fn parse_fragment(markup: &str) -> Vec<VNode> {
	let fragment = Html::parse_fragment(markup);
	convert_children(fragment.root_element())
}

fn convert_children(parent: ElementRef<'_>) -> Vec<VNode> {
	let mut out = Vec::new();
	for child in parent.children() {
		match child.value() {
			Node::Text(text) => out.push(VNode::Text(text.to_string())),
			Node::Comment(comment) => out.push(VNode::Comment(comment.to_string())),
			Node::Element(_) => {
				if let Some(el) = ElementRef::wrap(child) {
					out.push(VNode::Element(convert_element(el)));
				}
			}
			_ => {}
		}
	}
	out
}

fn convert_element(el: ElementRef<'_>) -> VElement {
	let mut attributes: Vec<(String, String)> = el
		.value()
		.attrs()
		.map(|(name, value)| (name.to_string(), value.to_string()))
		.collect();
	attributes.sort_by(|a, b| a.0.cmp(&b.0));
	VElement {
		tag: el.value().name().to_ascii_lowercase(),
		attributes,
		children: convert_children(el),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_nested() {
		// Act
		let nodes = parse_fragment(r#"<ul id="jobs" class="list"><li>a</li><!--x--><li>b</li></ul>"#);

		// Assert
		assert_eq!(nodes.len(), 1);
		let ul = nodes[0].as_element().unwrap();
		assert_eq!(ul.tag, "ul");
		assert_eq!(
			ul.attributes,
			vec![
				("class".to_string(), "list".to_string()),
				("id".to_string(), "jobs".to_string())
			]
		);
		assert_eq!(ul.children.len(), 3);
		assert_eq!(ul.children[1], VNode::Comment("x".into()));
		assert_eq!(ul.children[2].children(), &[VNode::Text("b".into())]);
	}

	#[rstest]
	fn test_parse_keeps_text_siblings() {
		// Act
		let nodes = parse_fragment("Hello <b>world</b>!");

		// Assert
		let labels: Vec<_> = nodes.iter().map(|n| n.label().to_string()).collect();
		assert_eq!(labels, vec!["#text", "b", "#text"]);
	}

	#[rstest]
	fn test_parse_lowercases_attribute_names() {
		// Act
		let nodes = parse_fragment(r#"<input defaultValue="x">"#);

		// Assert
		let input = nodes[0].as_element().unwrap();
		assert_eq!(input.attribute("defaultvalue"), Some("x"));
	}

	#[rstest]
	fn test_parse_empty() {
		assert!(parse_fragment("").is_empty());
	}
}
