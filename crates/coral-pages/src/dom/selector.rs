//! CSS selectors over the live document.
//!
//! Parsing and matching are done by the [`selectors`] crate with the
//! [`scraper`] selector implementation, so compound selectors, combinators,
//! attribute operators and structural pseudo-classes all behave like in a
//! browser. Pseudo-elements and state pseudo-classes such as `:hover` are
//! rejected at parse time.

use cssparser::ParserInput;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, Parser, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
	self, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
	NeedsSelectorFlags, QuirksMode, SelectorCaches,
};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorList};
use selectors::{Element, OpaqueElement};

use super::document::{Document, NodeId};
use super::node::{ElementData, NodeKind};
use crate::error::{PagesError, Result};

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
	source: String,
	list: SelectorList<Simple>,
}

impl Selector {
	/// Parses a comma-separated selector list.
	pub fn parse(source: &str) -> Result<Self> {
		let mut input = ParserInput::new(source);
		let mut parser = cssparser::Parser::new(&mut input);
		let list = SelectorList::parse(&Parser, &mut parser, ParseRelative::No).map_err(|e| {
			PagesError::InvalidSelector {
				selector: source.to_string(),
				reason: scraper::error::SelectorErrorKind::from(e).to_string(),
			}
		})?;
		Ok(Self {
			source: source.to_string(),
			list,
		})
	}

	/// The selector as written.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// True when `node` is a live element matching any selector of the list.
	pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
		let Some(element) = DomElement::new(doc, node) else {
			return false;
		};
		let mut caches = SelectorCaches::default();
		let mut context = MatchingContext::new(
			MatchingMode::Normal,
			None,
			&mut caches,
			QuirksMode::NoQuirks,
			NeedsSelectorFlags::No,
			MatchingForInvalidation::No,
		);
		matching::matches_selector_list(&self.list, &element, &mut context)
	}
}

impl std::fmt::Display for Selector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.source)
	}
}

/// An element of a [`Document`] seen through the [`selectors`] tree API.
#[derive(Clone, Copy)]
struct DomElement<'a> {
	doc: &'a Document,
	node: NodeId,
	data: &'a ElementData,
}

impl<'a> DomElement<'a> {
	fn new(doc: &'a Document, node: NodeId) -> Option<Self> {
		doc.element(node).map(|data| Self { doc, node, data })
	}

	fn sibling_element(
		&self,
		step: impl Fn(&Document, NodeId) -> Option<NodeId>,
	) -> Option<Self> {
		std::iter::successors(step(self.doc, self.node), |id| step(self.doc, *id))
			.find_map(|id| Self::new(self.doc, id))
	}
}

impl std::fmt::Debug for DomElement<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DomElement")
			.field("node", &self.node)
			.field("tag", &self.data.tag())
			.finish()
	}
}

/// State pseudo-classes and pseudo-elements never match.
impl Element for DomElement<'_> {
	type Impl = Simple;

	fn opaque(&self) -> OpaqueElement {
		OpaqueElement::new(self.data)
	}

	fn parent_element(&self) -> Option<Self> {
		self.doc
			.parent(self.node)
			.and_then(|parent| Self::new(self.doc, parent))
	}

	fn parent_node_is_shadow_root(&self) -> bool {
		false
	}

	fn containing_shadow_host(&self) -> Option<Self> {
		None
	}

	fn is_pseudo_element(&self) -> bool {
		false
	}

	fn prev_sibling_element(&self) -> Option<Self> {
		self.sibling_element(Document::previous_sibling)
	}

	fn next_sibling_element(&self) -> Option<Self> {
		self.sibling_element(Document::next_sibling)
	}

	fn first_element_child(&self) -> Option<Self> {
		std::iter::successors(self.doc.first_child(self.node), |id| {
			self.doc.next_sibling(*id)
		})
		.find_map(|id| Self::new(self.doc, id))
	}

	fn is_html_element_in_html_document(&self) -> bool {
		true
	}

	fn has_local_name(&self, name: &<Simple as SelectorImpl>::BorrowedLocalName) -> bool {
		&*name.0 == self.data.tag()
	}

	fn has_namespace(&self, ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
		let ns: &str = ns;
		ns.is_empty() || ns == XHTML_NAMESPACE
	}

	fn is_same_type(&self, other: &Self) -> bool {
		self.data.tag() == other.data.tag()
	}

	fn attr_matches(
		&self,
		ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
		local_name: &CssLocalName,
		operation: &AttrSelectorOperation<&CssString>,
	) -> bool {
		if let NamespaceConstraint::Specific(url) = ns {
			let url: &str = url;
			if !url.is_empty() {
				return false;
			}
		}
		self.data
			.attributes()
			.iter()
			.any(|(name, value)| name.as_str() == &*local_name.0 && operation.eval_str(value))
	}

	fn match_non_ts_pseudo_class(
		&self,
		_pc: &NonTSPseudoClass,
		_context: &mut MatchingContext<'_, Simple>,
	) -> bool {
		false
	}

	fn match_pseudo_element(
		&self,
		_pe: &PseudoElement,
		_context: &mut MatchingContext<'_, Simple>,
	) -> bool {
		false
	}

	fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

	fn is_link(&self) -> bool {
		false
	}

	fn is_html_slot_element(&self) -> bool {
		false
	}

	fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
		self.data
			.attribute("id")
			.is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
	}

	fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
		self.data
			.attribute("class")
			.unwrap_or_default()
			.split_ascii_whitespace()
			.any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
	}

	fn has_custom_state(&self, _name: &CssLocalName) -> bool {
		false
	}

	fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
		None
	}

	fn is_part(&self, _name: &CssLocalName) -> bool {
		false
	}

	fn is_empty(&self) -> bool {
		!self.doc.children(self.node).into_iter().any(|child| {
			matches!(
				self.doc.kind(child),
				Some(NodeKind::Element(_) | NodeKind::Text(_))
			)
		})
	}

	fn is_root(&self) -> bool {
		self.doc
			.parent(self.node)
			.is_some_and(|parent| matches!(self.doc.kind(parent), Some(NodeKind::Document)))
	}

	fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn doc() -> Document {
		Document::with_body(concat!(
			r#"<main id="app">"#,
			r#"<ul class="menu dark"><li>one</li><li class="open" data-role="main">two</li></ul>"#,
			r#"<p>after</p>"#,
			r#"</main>"#,
		))
		.unwrap()
	}

	fn target(doc: &Document) -> NodeId {
		doc.query_selector(".open").unwrap().unwrap()
	}

	#[rstest]
	#[case("li", true)]
	#[case("li.open", true)]
	#[case(".open.closed", false)]
	#[case("[data-role]", true)]
	#[case("[data-role=main]", true)]
	#[case("[data-role='side']", false)]
	#[case("[data-role^=ma]", true)]
	#[case("span, .open", true)]
	#[case("*", true)]
	#[case("a", false)]
	#[case("ul > li", true)]
	#[case("#app li", true)]
	#[case("#app > li", false)]
	#[case("li + li", true)]
	#[case("li:first-child", false)]
	#[case("li:last-child", true)]
	#[case("ul.menu.dark li:nth-child(2)", true)]
	#[case(":is(ol, ul) > li", true)]
	fn test_matches(doc: Document, #[case] selector: &str, #[case] expected: bool) {
		// Arrange
		let node = target(&doc);

		// Act
		let selector = Selector::parse(selector).unwrap();

		// Assert
		assert_eq!(selector.matches(&doc, node), expected);
	}

	#[rstest]
	fn test_combinators_resolve_through_ancestry(doc: Document) {
		// Arrange
		let selector = Selector::parse("main > ul ~ p").unwrap();

		// Act
		let found = doc.query_selector_in(doc.root(), &selector);

		// Assert
		assert_eq!(found.map(|p| doc.text_content(p)).as_deref(), Some("after"));
	}

	#[rstest]
	fn test_non_elements_never_match(doc: Document) {
		// Arrange
		let li = target(&doc);
		let text = doc.children(li)[0];
		let selector = Selector::parse("*").unwrap();

		// Act
		let matched = selector.matches(&doc, text);

		// Assert
		assert!(!matched);
	}

	#[rstest]
	#[case("")]
	#[case("a,")]
	#[case("#")]
	#[case("div >")]
	#[case("a:hover")]
	#[case("p::before")]
	fn test_rejects(#[case] selector: &str) {
		assert!(matches!(
			Selector::parse(selector),
			Err(PagesError::InvalidSelector { .. })
		));
	}
}
