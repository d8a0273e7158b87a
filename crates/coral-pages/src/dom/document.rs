//! The in-memory document.
//!
//! Nodes live in an [`indextree`] arena and are addressed by [`NodeId`].
//! Nodes removed from the tree, replaced, or dropped by a content change are
//! freed together with their subtree and their slots are reused. A handle to
//! a freed node is stale: [`Document::contains`] returns false for it and
//! every query treats it as absent.
//!
//! Every mutation that touches a node connected to the document bumps a
//! counter exposed by [`Document::mutation_count`]. Work done on detached
//! nodes, such as building a subtree in a fragment, is free until the
//! subtree is inserted.

use indextree::Arena;
pub use indextree::NodeId;

use super::node::{ElementData, NodeKind, PropertyValue, VNode};
use super::parser::parse_fragment;
use super::selector::Selector;
use super::style::{self, Declaration};
use crate::error::{PagesError, Result};

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

/// An HTML document: a `html` element with a `body`, plus focus, scroll
/// and title state.
#[derive(Debug)]
pub struct Document {
	arena: Arena<NodeKind>,
	root: NodeId,
	html: NodeId,
	body: NodeId,
	title: String,
	active: Option<NodeId>,
	scrolled: Option<NodeId>,
	mutations: u64,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates an empty document.
	pub fn new() -> Self {
		let mut arena = Arena::new();
		let root = arena.new_node(NodeKind::Document);
		let html = arena.new_node(NodeKind::Element(ElementData::new("html")));
		let body = arena.new_node(NodeKind::Element(ElementData::new("body")));
		root.append(html, &mut arena);
		html.append(body, &mut arena);
		Self {
			arena,
			root,
			html,
			body,
			title: String::new(),
			active: None,
			scrolled: None,
			mutations: 0,
		}
	}

	/// Creates a document whose body holds the given markup.
	pub fn with_body(markup: &str) -> Result<Self> {
		let mut doc = Self::new();
		let body = doc.body;
		doc.set_inner_html(body, markup)?;
		doc.mutations = 0;
		Ok(doc)
	}

	/// The document node.
	pub fn root(&self) -> NodeId {
		self.root
	}

	/// The `html` element.
	pub fn document_element(&self) -> NodeId {
		self.html
	}

	/// The `body` element.
	pub fn body(&self) -> NodeId {
		self.body
	}

	/// Number of mutations applied to connected nodes so far.
	pub fn mutation_count(&self) -> u64 {
		self.mutations
	}

	/// Document title.
	pub fn title(&self) -> &str {
		&self.title
	}

	/// Sets the document title.
	pub fn set_title(&mut self, title: impl Into<String>) {
		self.title = title.into();
	}

	// Node creation

	/// Creates a detached element.
	pub fn create_element(&mut self, tag: &str) -> NodeId {
		self.arena.new_node(NodeKind::Element(ElementData::new(tag)))
	}

	/// Creates a detached text node.
	pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
		self.arena.new_node(NodeKind::Text(text.into()))
	}

	/// Creates a detached comment.
	pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
		self.arena.new_node(NodeKind::Comment(text.into()))
	}

	/// Creates an empty fragment.
	pub fn create_fragment(&mut self) -> NodeId {
		self.arena.new_node(NodeKind::Fragment)
	}

	/// Copies a template node into the arena as a detached subtree.
	///
	/// Attributes are copied verbatim.
	pub fn instantiate(&mut self, vnode: &VNode) -> NodeId {
		match vnode {
			VNode::Text(text) => self.create_text(text.clone()),
			VNode::Comment(text) => self.create_comment(text.clone()),
			VNode::Element(el) => {
				let mut data = ElementData::new(&el.tag);
				data.attributes = el.attributes.clone();
				let id = self.arena.new_node(NodeKind::Element(data));
				for child in &el.children {
					let child_id = self.instantiate(child);
					id.append(child_id, &mut self.arena);
				}
				id
			}
		}
	}

	// Structure

	/// True while the handle refers to a live node of this document.
	pub fn contains(&self, node: NodeId) -> bool {
		self.arena.get(node).is_some()
	}

	/// Number of live nodes, attached or not.
	pub fn node_count(&self) -> usize {
		self.arena.live_count()
	}

	/// Node payload, if the handle belongs to this document.
	pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
		self.arena.get(node).map(|n| n.get())
	}

	/// Element payload, if the node is an element.
	pub fn element(&self, node: NodeId) -> Option<&ElementData> {
		self.kind(node).and_then(NodeKind::as_element)
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
		match self.arena.get_mut(node).map(|n| n.get_mut()) {
			Some(NodeKind::Element(el)) => Some(el),
			_ => None,
		}
	}

	/// Lowercase tag name of an element.
	pub fn tag_name(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(ElementData::tag)
	}

	/// Parent node.
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.arena.get(node).and_then(|n| n.parent())
	}

	/// Child nodes in order.
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		if !self.contains(node) {
			return Vec::new();
		}
		node.children(&self.arena).collect()
	}

	/// Number of child nodes.
	pub fn child_count(&self, node: NodeId) -> usize {
		if !self.contains(node) {
			return 0;
		}
		node.children(&self.arena).count()
	}

	/// The node followed by its ancestors up to the root it is attached to.
	pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
		if !self.contains(node) {
			return Vec::new();
		}
		node.ancestors(&self.arena).collect()
	}

	/// True when the node is reachable from the document node.
	pub fn is_connected(&self, node: NodeId) -> bool {
		self.contains(node) && node.ancestors(&self.arena).any(|a| a == self.root)
	}

	fn touch(&mut self, connected: bool) {
		if connected {
			self.mutations += 1;
		}
	}

	/// Appends a node. Appending a fragment moves its children instead.
	pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
		if matches!(self.kind(child), Some(NodeKind::Fragment)) {
			return self.append_fragment(parent, child);
		}
		let connected = self.is_connected(parent);
		parent
			.checked_append(child, &mut self.arena)
			.map_err(|e| PagesError::Hierarchy(e.to_string()))?;
		self.touch(connected);
		Ok(())
	}

	/// Moves every child of `fragment` to the end of `parent` in one
	/// mutation, then frees the emptied fragment.
	pub fn append_fragment(&mut self, parent: NodeId, fragment: NodeId) -> Result<()> {
		let connected = self.is_connected(parent);
		let moved = self.children(fragment);
		for child in &moved {
			parent
				.checked_append(*child, &mut self.arena)
				.map_err(|e| PagesError::Hierarchy(e.to_string()))?;
		}
		if self.contains(fragment) {
			fragment.remove_subtree(&mut self.arena);
		}
		if !moved.is_empty() {
			self.touch(connected);
		}
		Ok(())
	}

	/// Replaces `old` with `new` at the same position and frees `old`.
	pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
		if self.parent(old).is_none() {
			return Err(PagesError::Hierarchy(
				"cannot replace a node without a parent".to_string(),
			));
		}
		let connected = self.is_connected(old);
		old.checked_insert_before(new, &mut self.arena)
			.map_err(|e| PagesError::Hierarchy(e.to_string()))?;
		old.remove_subtree(&mut self.arena);
		self.touch(connected);
		Ok(())
	}

	/// Removes a node from its parent and frees its subtree.
	pub fn remove(&mut self, node: NodeId) {
		if self.parent(node).is_none() {
			return;
		}
		let connected = self.is_connected(node);
		node.remove_subtree(&mut self.arena);
		self.touch(connected);
	}

	/// Removes and frees every child of a node.
	pub fn clear_children(&mut self, node: NodeId) {
		let children = self.children(node);
		if children.is_empty() {
			return;
		}
		let connected = self.is_connected(node);
		for child in children {
			child.remove_subtree(&mut self.arena);
		}
		self.touch(connected);
	}

	/// Replaces a node's content with markup.
	pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<()> {
		let fragment = self.create_fragment();
		for vnode in parse_fragment(markup) {
			let child = self.instantiate(&vnode);
			fragment.append(child, &mut self.arena);
		}
		self.clear_children(node);
		self.append_fragment(node, fragment)
	}

	// Content

	/// Concatenated text of the node and its descendants.
	pub fn text_content(&self, node: NodeId) -> String {
		match self.kind(node) {
			Some(NodeKind::Text(text) | NodeKind::Comment(text)) => text.clone(),
			Some(_) => node
				.descendants(&self.arena)
				.filter_map(|id| match self.kind(id) {
					Some(NodeKind::Text(text)) => Some(text.as_str()),
					_ => None,
				})
				.collect(),
			None => String::new(),
		}
	}

	/// Replaces character data, or an element's children with one text node.
	pub fn set_text_content(&mut self, node: NodeId, text: &str) {
		let connected = self.is_connected(node);
		if let Some(NodeKind::Text(data) | NodeKind::Comment(data)) =
			self.arena.get_mut(node).map(|n| n.get_mut())
		{
			*data = text.to_string();
			self.touch(connected);
			return;
		}
		if !matches!(
			self.kind(node),
			Some(NodeKind::Element(_) | NodeKind::Fragment)
		) {
			return;
		}
		for child in self.children(node) {
			child.remove_subtree(&mut self.arena);
		}
		if !text.is_empty() {
			let text_node = self.create_text(text);
			node.append(text_node, &mut self.arena);
		}
		self.touch(connected);
	}

	// Attributes and properties

	/// Attribute value of an element.
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node).and_then(|el| el.attribute(name))
	}

	/// True when the element carries the attribute.
	pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
		self.attribute(node, name).is_some()
	}

	/// All attributes of an element in insertion order.
	pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
		self.element(node)
			.map(|el| el.attributes().to_vec())
			.unwrap_or_default()
	}

	/// Sets an attribute.
	pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
		let connected = self.is_connected(node);
		if let Some(el) = self.element_mut(node) {
			el.set_attribute(name, value);
			self.touch(connected);
		}
	}

	/// Removes an attribute. Counts as a mutation only when it was present.
	pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
		let connected = self.is_connected(node);
		let removed = self
			.element_mut(node)
			.is_some_and(|el| el.remove_attribute(name));
		if removed {
			self.touch(connected);
		}
	}

	/// Live property value, falling back to the reflected attribute.
	pub fn property(&self, node: NodeId, name: &str) -> Option<PropertyValue> {
		self.element(node).and_then(|el| el.property(name))
	}

	/// Writes a live property without touching the attribute.
	pub fn set_property(&mut self, node: NodeId, name: &str, value: PropertyValue) {
		let connected = self.is_connected(node);
		if let Some(el) = self.element_mut(node) {
			el.properties.insert(name.to_string(), value);
			self.touch(connected);
		}
	}

	// Inline style

	/// Parsed inline style declarations.
	pub fn style_declarations(&self, node: NodeId) -> Vec<Declaration> {
		self.attribute(node, "style")
			.map(style::parse)
			.unwrap_or_default()
	}

	/// Rewrites the inline style. An empty list removes the attribute.
	pub fn set_style_declarations(&mut self, node: NodeId, declarations: &[Declaration]) {
		if declarations.is_empty() {
			self.remove_attribute(node, "style");
		} else {
			let serialized = style::serialize(declarations);
			self.set_attribute(node, "style", &serialized);
		}
	}

	/// Reads one inline style property.
	pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
		self.style_declarations(node)
			.into_iter()
			.find(|d| d.name == name)
			.map(|d| d.value)
	}

	/// Sets one inline style property.
	pub fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
		let mut decls = self.style_declarations(node);
		match decls.iter_mut().find(|d| d.name == name) {
			Some(slot) => slot.value = value.to_string(),
			None => decls.push(Declaration {
				name: name.to_string(),
				value: value.to_string(),
			}),
		}
		self.set_style_declarations(node, &decls);
	}

	/// Removes one inline style property.
	pub fn remove_style(&mut self, node: NodeId, name: &str) {
		let mut decls = self.style_declarations(node);
		let before = decls.len();
		decls.retain(|d| d.name != name);
		if decls.len() != before {
			self.set_style_declarations(node, &decls);
		}
	}

	// Queries

	/// True when the node is an element matching the selector.
	pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
		selector.matches(self, node)
	}

	/// First element in the document matching the selector.
	pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
		let selector = Selector::parse(selector)?;
		Ok(self.query_selector_in(self.root, &selector))
	}

	/// Every element in the document matching the selector, in document order.
	pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
		let selector = Selector::parse(selector)?;
		Ok(self
			.descendants(self.root)
			.filter(|id| self.matches(*id, &selector))
			.collect())
	}

	/// First descendant of `scope` matching the selector. `scope` itself is excluded.
	pub fn query_selector_in(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
		self.descendants(scope)
			.find(|id| self.matches(*id, selector))
	}

	/// Nearest inclusive ancestor matching the selector.
	pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
		self.ancestors(node)
			.into_iter()
			.find(|id| self.matches(*id, selector))
	}

	/// Descendants of `scope` in document order, excluding `scope`.
	fn descendants(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		self.contains(scope)
			.then(|| scope.descendants(&self.arena).skip(1))
			.into_iter()
			.flatten()
	}

	pub(crate) fn first_child(&self, node: NodeId) -> Option<NodeId> {
		self.arena.get(node).and_then(indextree::Node::first_child)
	}

	pub(crate) fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
		self.arena.get(node).and_then(indextree::Node::previous_sibling)
	}

	pub(crate) fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
		self.arena.get(node).and_then(indextree::Node::next_sibling)
	}

	/// Connected element with the given `id` attribute.
	pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
		if id.is_empty() {
			return None;
		}
		self.descendants(self.root)
			.find(|node| self.attribute(*node, "id") == Some(id))
	}

	// Focus and scrolling

	/// Moves focus to a node.
	pub fn focus(&mut self, node: NodeId) {
		self.active = Some(node);
	}

	/// Focused node, if it is still connected.
	pub fn active_element(&self) -> Option<NodeId> {
		self.active.filter(|node| self.is_connected(*node))
	}

	/// Records that a node was scrolled into view.
	pub fn scroll_into_view(&mut self, node: NodeId) {
		self.scrolled = Some(node);
	}

	/// The node most recently scrolled into view, while it is live.
	pub fn last_scrolled(&self) -> Option<NodeId> {
		self.scrolled.filter(|node| self.contains(*node))
	}

	// Serialization

	/// Markup of the node's children.
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut out = String::new();
		for child in self.children(node) {
			self.write_node(child, &mut out);
		}
		out
	}

	/// Markup of the node itself.
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut out = String::new();
		self.write_node(node, &mut out);
		out
	}

	fn write_node(&self, node: NodeId, out: &mut String) {
		match self.kind(node) {
			Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
			Some(NodeKind::Comment(text)) => {
				out.push_str("<!--");
				out.push_str(text);
				out.push_str("-->");
			}
			Some(NodeKind::Element(el)) => {
				out.push('<');
				out.push_str(el.tag());
				for (name, value) in el.attributes() {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&escape_attribute(value));
					out.push('"');
				}
				out.push('>');
				if VOID_ELEMENTS.contains(&el.tag()) {
					return;
				}
				out.push_str(&self.inner_html(node));
				out.push_str("</");
				out.push_str(el.tag());
				out.push('>');
			}
			Some(NodeKind::Document | NodeKind::Fragment) => out.push_str(&self.inner_html(node)),
			None => {}
		}
	}
}

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
	value.replace('&', "&amp;").replace('"', "&quot;")
}
