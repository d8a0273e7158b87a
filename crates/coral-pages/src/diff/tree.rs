//! Positional tree patching.
//!
//! Children are compared by index, without keys. For each template node:
//!
//! 1. no live node at that index: build it (resolving creation-only
//!    attributes) and append it
//! 2. different kind (tag name, text or comment): build and replace
//! 3. otherwise patch attributes, then stop if the node is the mount point
//!    of an attached component
//! 4. update leaf text when it differs
//! 5. template childless but live node not: clear the live node
//! 6. live node empty but template not: build the children in a fragment
//!    and insert them at once
//! 7. otherwise recurse
//!
//! Surplus trailing live nodes are removed first. Removed and replaced
//! nodes are freed by the document.

use super::attributes;
use crate::dom::{Document, NodeId, Selector, VNode};
use crate::error::Result;

/// Identifies the mount point of an attached component. Subtrees at mount
/// points are left alone; the attached component renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountMarker {
	/// Live elements matching the selector once their attributes are patched.
	Selector(Selector),
	/// This exact live node.
	Node(NodeId),
}

impl MountMarker {
	fn matches(&self, doc: &Document, live: NodeId) -> bool {
		match self {
			Self::Selector(selector) => doc.matches(live, selector),
			Self::Node(node) => *node == live,
		}
	}
}

/// Builds a detached node from a template, resolving creation-only attributes.
pub fn create_node(doc: &mut Document, template: &VNode) -> NodeId {
	let node = doc.instantiate(template);
	attributes::apply_defaults(doc, node);
	node
}

/// Patches the children of `parent` to match `template`.
pub fn patch_children(
	doc: &mut Document,
	parent: NodeId,
	template: &[VNode],
	markers: &[MountMarker],
) -> Result<()> {
	let live = doc.children(parent);
	for surplus in live.iter().skip(template.len()) {
		doc.remove(*surplus);
	}

	for (index, wanted) in template.iter().enumerate() {
		let Some(&current) = live.get(index) else {
			let node = create_node(doc, wanted);
			doc.append_child(parent, node)?;
			continue;
		};

		let same_kind = doc
			.kind(current)
			.is_some_and(|kind| kind.label() == wanted.label());
		if !same_kind {
			let node = create_node(doc, wanted);
			doc.replace(current, node)?;
			continue;
		}

		if let VNode::Element(el) = wanted {
			attributes::diff(doc, current, el);
		}

		if markers.iter().any(|m| m.matches(doc, current)) {
			continue;
		}

		let live_children = doc.child_count(current);
		if let Some(content) = wanted.leaf_content()
			&& !content.is_empty()
			&& (live_children > 0 || doc.text_content(current) != content)
		{
			doc.set_text_content(current, content);
		}

		let wanted_children = wanted.children();
		let live_children = doc.child_count(current);
		if live_children > 0 && wanted_children.is_empty() {
			doc.clear_children(current);
			continue;
		}

		if live_children == 0 && !wanted_children.is_empty() {
			let fragment = doc.create_fragment();
			patch_children(doc, fragment, wanted_children, markers)?;
			doc.append_fragment(current, fragment)?;
			continue;
		}

		if !wanted_children.is_empty() {
			patch_children(doc, current, wanted_children, markers)?;
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::{PropertyValue, parse_fragment};
	use rstest::rstest;

	fn render(doc: &mut Document, markup: &str) {
		let body = doc.body();
		patch_children(doc, body, &parse_fragment(markup), &[]).unwrap();
	}

	#[rstest]
	#[case("", "<p>a</p>")]
	#[case("<p>a</p>", "")]
	#[case("<p>a</p><p>b</p>", "<p>a</p>")]
	#[case("<p>a</p>", "<span>a</span>")]
	#[case("<p>a</p>", "<p>b</p>")]
	#[case("<ul></ul>", "<ul><li>1</li><li>2</li></ul>")]
	#[case("<ul><li>1</li></ul>", "<ul></ul>")]
	#[case("text<!--c--><b>x</b>", "<!--c-->text<i>y</i>")]
	#[case(r#"<div class="a" id="x">k</div>"#, r#"<div class="b" data-y="1">k</div>"#)]
	fn test_patch_converges(#[case] before: &str, #[case] after: &str) {
		// Arrange
		let mut doc = Document::with_body(before).unwrap();
		let expected = Document::with_body(after).unwrap();

		// Act
		render(&mut doc, after);

		// Assert
		assert_eq!(doc.inner_html(doc.body()), expected.inner_html(expected.body()));
	}

	#[rstest]
	fn test_second_render_is_idempotent() {
		// Arrange
		let markup = r#"<h1 class="title">Jobs</h1><ul><li style="color: red">a</li><li>b<!--n--></li></ul><input type="text" value="v">"#;
		let mut doc = Document::new();
		render(&mut doc, markup);
		let before = doc.mutation_count();

		// Act
		render(&mut doc, markup);

		// Assert
		assert_eq!(doc.mutation_count(), before);
	}

	#[rstest]
	fn test_empty_container_is_filled_in_one_mutation() {
		// Arrange
		let mut doc = Document::with_body("<ul></ul>").unwrap();

		// Act
		render(&mut doc, "<ul><li>1</li><li>2</li><li>3</li></ul>");

		// Assert
		assert_eq!(doc.mutation_count(), 1);
	}

	#[rstest]
	fn test_surplus_nodes_are_removed_from_the_end() {
		// Arrange
		let mut doc = Document::with_body("<p>1</p><p>2</p><p>3</p>").unwrap();
		let first = doc.children(doc.body())[0];

		// Act
		render(&mut doc, "<p>1</p>");

		// Assert
		assert_eq!(doc.children(doc.body()), vec![first]);
	}

	#[rstest]
	fn test_marked_subtree_is_skipped() {
		// Arrange
		let mut doc = Document::with_body(r#"<div id="nav"><a>owned by child</a></div>"#).unwrap();
		let body = doc.body();
		let markers = vec![MountMarker::Selector(Selector::parse("#nav").unwrap())];

		// Act
		patch_children(
			&mut doc,
			body,
			&parse_fragment(r#"<div id="nav" class="dark"></div>"#),
			&markers,
		)
		.unwrap();

		// Assert
		assert_eq!(
			doc.inner_html(body),
			r#"<div id="nav" class="dark"><a>owned by child</a></div>"#
		);
	}

	#[rstest]
	fn test_marker_with_combinator_uses_live_ancestry() {
		// Arrange
		let mut doc = Document::with_body(
			r#"<main id="app"><section class="list"><p>owned by child</p></section></main>"#,
		)
		.unwrap();
		let body = doc.body();
		let markers = vec![MountMarker::Selector(Selector::parse("#app > .list").unwrap())];

		// Act
		patch_children(
			&mut doc,
			body,
			&parse_fragment(r#"<main id="app"><section class="list"></section></main>"#),
			&markers,
		)
		.unwrap();

		// Assert
		assert_eq!(
			doc.inner_html(body),
			r#"<main id="app"><section class="list"><p>owned by child</p></section></main>"#
		);
	}

	#[rstest]
	fn test_alternating_kinds_keep_arena_bounded() {
		// Arrange
		let mut doc = Document::new();
		render(&mut doc, "<ul><li>a</li><li>b</li></ul>");
		let baseline = doc.node_count();

		// Act
		for i in 0..1000 {
			let markup = if i % 2 == 0 {
				"<ol><li>a</li><li>b</li></ol>"
			} else {
				"<ul><li>a</li><li>b</li></ul>"
			};
			render(&mut doc, markup);
		}

		// Assert
		assert_eq!(doc.node_count(), baseline);
		assert_eq!(doc.inner_html(doc.body()), "<ul><li>a</li><li>b</li></ul>");
	}

	#[rstest]
	fn test_node_marker_is_skipped() {
		// Arrange
		let mut doc = Document::with_body("<section><p>child</p></section>").unwrap();
		let body = doc.body();
		let section = doc.children(body)[0];

		// Act
		patch_children(
			&mut doc,
			body,
			&parse_fragment("<section></section>"),
			&[MountMarker::Node(section)],
		)
		.unwrap();

		// Assert
		assert_eq!(doc.inner_html(body), "<section><p>child</p></section>");
	}

	#[rstest]
	fn test_defaults_apply_to_created_nodes_only() {
		// Arrange
		let mut doc = Document::new();
		render(&mut doc, r#"<input defaultvalue="start">"#);
		let input = doc.children(doc.body())[0];
		doc.set_property(input, "value", PropertyValue::Text("edited".into()));

		// Act
		render(&mut doc, r#"<input defaultvalue="start">"#);

		// Assert
		assert_eq!(
			doc.property(input, "value"),
			Some(PropertyValue::Text("edited".into()))
		);
		assert_eq!(doc.attribute(input, "value"), Some("start"));
	}

	#[rstest]
	fn test_kind_change_replaces_node() {
		// Arrange
		let mut doc = Document::with_body("<p>a</p>").unwrap();
		let old = doc.children(doc.body())[0];

		// Act
		render(&mut doc, "<div>a</div>");

		// Assert
		assert!(!doc.is_connected(old));
		assert!(!doc.contains(old));
		assert_eq!(doc.inner_html(doc.body()), "<div>a</div>");
	}
}
