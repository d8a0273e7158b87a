//! Component construction.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use super::template::{IntoMarkup, MountTarget, Template};
use super::{Component, ComponentInner, Mount};
use crate::dom::Selector;
use crate::error::{PagesError, Result};
use crate::reactive::Store;
use crate::router::{ResolvedRoute, Router};
use crate::runtime::Runtime;

/// Builder for [`Component`].
///
/// ```
/// use coral_pages::prelude::*;
/// use serde_json::json;
///
/// let window = Window::builder("http://localhost/").body(r#"<div id="app"></div>"#).build().unwrap();
/// let runtime = Runtime::new(window, PagesConfig::development());
/// let hello = Component::builder("#app")
///     .template(|data, _| format!("<p>Hello, {}!</p>", data["name"].as_str().unwrap_or("world")))
///     .data(json!({"name": "Coral"}))
///     .build(&runtime)
///     .unwrap();
/// hello.render().unwrap();
/// assert_eq!(runtime.window().document().inner_html(runtime.window().document().body()), "<div id=\"app\"><p>Hello, Coral!</p></div>");
/// ```
#[derive(Debug)]
pub struct ComponentBuilder {
	mount: MountTarget,
	template: Option<Template>,
	store: Option<Store>,
	router: Option<Router>,
	parents: Vec<Component>,
	data: Value,
	allow_html: Option<bool>,
}

impl ComponentBuilder {
	pub(super) fn new(mount: MountTarget) -> Self {
		Self {
			mount,
			template: None,
			store: None,
			router: None,
			parents: Vec::new(),
			data: Value::Null,
			allow_html: None,
		}
	}

	/// Renders the function's output.
	pub fn template<F, M>(mut self, template: F) -> Self
	where
		F: Fn(&Value, Option<&ResolvedRoute>) -> M + 'static,
		M: IntoMarkup,
	{
		self.template = Some(Template::from_fn(template));
		self
	}

	/// Renders fixed markup.
	pub fn static_template(mut self, markup: impl Into<String>) -> Self {
		self.template = Some(Template::Static(markup.into()));
		self
	}

	/// Reads data from a store and renders whenever it changes.
	pub fn store(mut self, store: &Store) -> Self {
		self.store = Some(store.clone());
		self
	}

	/// Passes the current route to the template and renders on navigation.
	pub fn router(mut self, router: &Router) -> Self {
		self.router = Some(router.clone());
		self
	}

	/// Attaches the component to a parent. May be called more than once.
	pub fn attach_to(mut self, parent: &Component) -> Self {
		self.parents.push(parent.clone());
		self
	}

	/// Local data, used when no store is bound.
	pub fn data(mut self, data: Value) -> Self {
		self.data = data;
		self
	}

	/// Keeps strings unescaped in the data handed to the template.
	pub fn allow_html(mut self, allow: bool) -> Self {
		self.allow_html = Some(allow);
		self
	}

	/// Builds the component and registers it with its store, router and parents.
	pub fn build(self, runtime: &Runtime) -> Result<Component> {
		let config = runtime.config();
		let mount = match &self.mount {
			MountTarget::Selector(selector) if selector.trim().is_empty() => {
				return Err(PagesError::Configuration(
					"a component needs an element to render into".to_string(),
				));
			}
			MountTarget::Selector(selector) => Mount::Selector(Selector::parse(selector)?),
			MountTarget::Node(node) => Mount::Node(*node),
		};
		if self.template.is_none() {
			config.report::<()>(PagesError::Configuration(format!(
				"component for {} has no template",
				self.mount
			)))?;
		}

		let component = Component::from_inner(Rc::new(ComponentInner {
			window: Rc::clone(runtime.window()),
			config: config.clone(),
			target: self.mount,
			mount,
			template: self.template,
			store: self.store,
			router: self.router,
			data: RefCell::new(self.data),
			allow_html: self.allow_html,
			attached: RefCell::new(Vec::new()),
			renders: Cell::new(0),
			pending: Cell::new(None),
		}));

		if let Some(store) = &component.inner().store {
			store.attach(&component);
		}
		if let Some(router) = &component.inner().router {
			router.add_component(&component);
		}
		for parent in &self.parents {
			parent.attach(&component);
		}
		Ok(component)
	}
}
