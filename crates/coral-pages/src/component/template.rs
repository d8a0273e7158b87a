//! Templates, markup conversion and mount targets.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::dom::NodeId;
use crate::router::ResolvedRoute;

/// Converts a template function's return value into markup.
///
/// `None` means there is nothing to render and leaves the DOM untouched.
pub trait IntoMarkup {
	/// Produces the markup, if any.
	fn into_markup(self) -> Option<String>;
}

impl IntoMarkup for String {
	fn into_markup(self) -> Option<String> {
		Some(self)
	}
}

impl IntoMarkup for &str {
	fn into_markup(self) -> Option<String> {
		Some(self.to_string())
	}
}

impl IntoMarkup for () {
	fn into_markup(self) -> Option<String> {
		None
	}
}

impl<T: IntoMarkup> IntoMarkup for Option<T> {
	fn into_markup(self) -> Option<String> {
		self.and_then(IntoMarkup::into_markup)
	}
}

macro_rules! impl_into_markup_for_number {
	($($ty:ty),*) => {
		$(
			impl IntoMarkup for $ty {
				fn into_markup(self) -> Option<String> {
					Some(self.to_string())
				}
			}
		)*
	};
}

impl_into_markup_for_number!(i32, i64, u32, u64, usize, f32, f64);

/// Function form of a template.
pub type TemplateFn = Rc<dyn Fn(&Value, Option<&ResolvedRoute>) -> Option<String>>;

/// What a component renders.
#[derive(Clone)]
pub enum Template {
	/// Fixed markup.
	Static(String),
	/// Markup computed from data and the current route.
	Dynamic(TemplateFn),
}

impl Template {
	/// Wraps a template function.
	pub fn from_fn<F, M>(template: F) -> Self
	where
		F: Fn(&Value, Option<&ResolvedRoute>) -> M + 'static,
		M: IntoMarkup,
	{
		Self::Dynamic(Rc::new(move |data, route| template(data, route).into_markup()))
	}

	/// Produces markup for one render.
	pub fn render(&self, data: &Value, route: Option<&ResolvedRoute>) -> Option<String> {
		match self {
			Self::Static(markup) => Some(markup.clone()),
			Self::Dynamic(template) => template(data, route),
		}
	}
}

impl fmt::Debug for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Static(markup) => f.debug_tuple("Static").field(markup).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic(..)"),
		}
	}
}

/// Where a component renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
	/// The first element matching a selector, looked up on every render.
	Selector(String),
	/// A specific node.
	Node(NodeId),
}

impl fmt::Display for MountTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Selector(selector) => f.write_str(selector),
			Self::Node(node) => write!(f, "node {node:?}"),
		}
	}
}

impl From<&str> for MountTarget {
	fn from(selector: &str) -> Self {
		Self::Selector(selector.to_string())
	}
}

impl From<String> for MountTarget {
	fn from(selector: String) -> Self {
		Self::Selector(selector)
	}
}

impl From<NodeId> for MountTarget {
	fn from(node: NodeId) -> Self {
		Self::Node(node)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(Some("<p>x</p>".to_string()).into_markup(), Some("<p>x</p>"))]
	#[case(None::<String>.into_markup(), None)]
	#[case(().into_markup(), None)]
	#[case(42_i64.into_markup(), Some("42"))]
	#[case(1.5_f64.into_markup(), Some("1.5"))]
	fn test_into_markup(#[case] markup: Option<String>, #[case] expected: Option<&str>) {
		assert_eq!(markup.as_deref(), expected);
	}

	#[rstest]
	fn test_dynamic_template_reads_data() {
		// Arrange
		let template = Template::from_fn(|data, route| {
			route.map_or_else(|| format!("<p>{}</p>", data["name"].as_str().unwrap_or_default()), |_| String::new())
		});

		// Act
		let markup = template.render(&json!({"name": "kala"}), None);

		// Assert
		assert_eq!(markup.as_deref(), Some("<p>kala</p>"));
	}
}
