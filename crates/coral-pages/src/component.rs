//! Components: templates bound to a mount point.
//!
//! A render resolves the mount node, computes markup from the component's
//! data (its store's snapshot, or local data) and the router's current route,
//! and patches the live subtree to match. Subtrees owned by attached child
//! components are skipped by the patch and rendered by the children
//! themselves, depth-first in attachment order, once the parent is done.

pub mod builder;
pub mod template;

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::config::PagesConfig;
use crate::diff::{MountMarker, patch_children};
use crate::dom::{NodeId, Selector, parse_fragment};
use crate::error::{PagesError, Result};
use crate::host::{Event, EventDetail, EventTarget, FrameHandle, Window, event};
use crate::reactive::{Store, snapshot};
use crate::router::Router;

pub use builder::ComponentBuilder;
pub use template::{IntoMarkup, MountTarget, Template, TemplateFn};

/// A mount target with its selector parsed.
#[derive(Debug, Clone)]
pub(crate) enum Mount {
	Selector(Selector),
	Node(NodeId),
}

impl Mount {
	fn marker(&self) -> MountMarker {
		match self {
			Self::Selector(selector) => MountMarker::Selector(selector.clone()),
			Self::Node(node) => MountMarker::Node(*node),
		}
	}
}

pub(crate) struct ComponentInner {
	window: Rc<Window>,
	config: PagesConfig,
	target: MountTarget,
	mount: Mount,
	template: Option<Template>,
	store: Option<Store>,
	router: Option<Router>,
	data: RefCell<Value>,
	allow_html: Option<bool>,
	attached: RefCell<Vec<Weak<ComponentInner>>>,
	renders: Cell<usize>,
	pending: Cell<Option<FrameHandle>>,
}

impl ComponentInner {
	fn attached(&self) -> Vec<Rc<ComponentInner>> {
		let mut attached = self.attached.borrow_mut();
		attached.retain(|c| c.strong_count() > 0);
		attached.iter().filter_map(Weak::upgrade).collect()
	}
}

/// Shared handle to a component.
#[derive(Clone)]
pub struct Component(Rc<ComponentInner>);

impl std::fmt::Debug for Component {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Component")
			.field("mount", &self.0.target)
			.field("template", &self.0.template)
			.field("has_store", &self.0.store.is_some())
			.field("has_router", &self.0.router.is_some())
			.field("attached", &self.0.attached.borrow().len())
			.finish()
	}
}

impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Component {}

impl Component {
	/// Starts building a component that renders into `mount`.
	pub fn builder(mount: impl Into<MountTarget>) -> ComponentBuilder {
		ComponentBuilder::new(mount.into())
	}

	pub(crate) fn from_inner(inner: Rc<ComponentInner>) -> Self {
		Self(inner)
	}

	pub(crate) fn inner(&self) -> &Rc<ComponentInner> {
		&self.0
	}

	/// Where the component renders.
	pub fn mount(&self) -> &MountTarget {
		&self.0.target
	}

	/// Number of completed renders.
	pub fn render_count(&self) -> usize {
		self.0.renders.get()
	}

	/// The data the next render would hand to the template.
	pub fn data(&self) -> Value {
		match (&self.0.store, self.0.allow_html) {
			(Some(store), Some(allow_html)) => store.snapshot(allow_html),
			(Some(store), None) => store.data(),
			(None, allow_html) => snapshot(
				&self.0.data.borrow(),
				allow_html.unwrap_or(self.0.config.allow_html),
			),
		}
	}

	/// Replaces local data and schedules a render.
	///
	/// Components bound to a store take their data from it; the call is
	/// ignored for them.
	pub fn set_data(&self, data: Value) {
		if self.0.store.is_some() {
			tracing::warn!(mount = %self.0.target, "component is bound to a store; local data ignored");
			return;
		}
		*self.0.data.borrow_mut() = data;
		self.schedule_render();
	}

	/// Renders on the next animation frame, replacing any render already scheduled.
	pub fn schedule_render(&self) {
		if let Some(handle) = self.0.pending.take() {
			self.0.window.cancel_animation_frame(handle);
		}
		let weak = Rc::downgrade(&self.0);
		let handle = self.0.window.request_animation_frame(move || {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			inner.pending.set(None);
			if let Err(err) = Component(inner).render() {
				tracing::error!(error = %err, "scheduled component render failed");
			}
		});
		self.0.pending.set(Some(handle));
	}

	/// Attaches a child. Its mount point is skipped when this component
	/// patches, and it renders after this component.
	pub fn attach(&self, child: &Component) {
		let mut attached = self.0.attached.borrow_mut();
		if attached.iter().any(|c| c.as_ptr() == Rc::as_ptr(&child.0)) {
			return;
		}
		attached.push(Rc::downgrade(&child.0));
	}

	/// Detaches a child. Returns false if it was not attached.
	pub fn detach(&self, child: &Component) -> bool {
		let mut attached = self.0.attached.borrow_mut();
		let before = attached.len();
		attached.retain(|c| c.as_ptr() != Rc::as_ptr(&child.0));
		before != attached.len()
	}

	/// Live attached children in attachment order.
	pub fn attached(&self) -> Vec<Component> {
		self.0.attached().into_iter().map(Component).collect()
	}

	fn resolve_mount(&self) -> Option<NodeId> {
		let doc = self.0.window.document();
		match &self.0.mount {
			Mount::Selector(selector) => doc.query_selector_in(doc.root(), selector),
			Mount::Node(node) => doc.is_connected(*node).then_some(*node),
		}
	}

	/// True when `self` can be reached from `start` through attachments.
	fn reachable_from(&self, start: &Rc<ComponentInner>) -> bool {
		let target = Rc::as_ptr(&self.0);
		let mut seen = BTreeSet::new();
		let mut stack = vec![Rc::clone(start)];
		while let Some(next) = stack.pop() {
			if Rc::as_ptr(&next) == target {
				return true;
			}
			if !seen.insert(Rc::as_ptr(&next) as usize) {
				continue;
			}
			stack.extend(next.attached());
		}
		false
	}

	/// Renders the component, then its attached children.
	pub fn render(&self) -> Result<()> {
		let config = &self.0.config;
		let Some(mount) = self.resolve_mount() else {
			return config.report(PagesError::MissingElement(self.0.target.to_string()));
		};
		let Some(template) = &self.0.template else {
			return config.report(PagesError::MissingTemplate(self.0.target.to_string()));
		};

		let mut children = Vec::new();
		for child in self.0.attached() {
			if self.reachable_from(&child) {
				config.report::<()>(PagesError::AttachmentCycle(format!(
					"{} is attached to itself through {}",
					self.0.target, child.target
				)))?;
				continue;
			}
			children.push(child);
		}

		let data = self.data();
		let route = self.0.router.as_ref().and_then(Router::current);
		let Some(markup) = template.render(&data, route.as_ref()) else {
			tracing::debug!(mount = %self.0.target, "template produced nothing to render");
			return Ok(());
		};

		let markers: Vec<MountMarker> = children.iter().map(|c| c.mount.marker()).collect();
		let nodes = parse_fragment(&markup);
		patch_children(&mut self.0.window.document_mut(), mount, &nodes, &markers)?;
		self.0.renders.set(self.0.renders.get() + 1);
		tracing::debug!(mount = %self.0.target, renders = self.0.renders.get(), "component rendered");

		let rendered = Event::new(event::RENDER, EventTarget::Node(mount))
			.bubbling()
			.with_detail(EventDetail::Render(data));
		self.0.window.dispatch_event(&rendered);

		for child in children {
			Component(child).render()?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::Window;
	use crate::runtime::Runtime;
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn runtime_with(config: PagesConfig) -> Runtime {
		let window = Window::builder("http://localhost/")
			.body(r#"<main id="app"></main><aside id="side"></aside>"#)
			.build()
			.unwrap();
		Runtime::new(window, config)
	}

	#[fixture]
	fn runtime() -> Runtime {
		runtime_with(PagesConfig::development())
	}

	fn app_html(runtime: &Runtime) -> String {
		let doc = runtime.window().document();
		let app = doc.get_element_by_id("app").unwrap();
		doc.inner_html(app)
	}

	#[rstest]
	fn test_render_patches_mount(runtime: Runtime) {
		// Arrange
		let component = Component::builder("#app")
			.template(|data, _| format!("<h1>{}</h1>", data["title"].as_str().unwrap_or_default()))
			.data(json!({"title": "<Jobs>"}))
			.build(&runtime)
			.unwrap();

		// Act
		component.render().unwrap();

		// Assert
		assert_eq!(app_html(&runtime), "<h1>&lt;Jobs&gt;</h1>");
		assert_eq!(component.render_count(), 1);
	}

	#[rstest]
	fn test_missing_mount(runtime: Runtime) {
		// Arrange
		let component = Component::builder("#nowhere")
			.static_template("<p></p>")
			.build(&runtime)
			.unwrap();

		// Act
		let result = component.render();

		// Assert
		assert_eq!(result, Err(PagesError::MissingElement("#nowhere".to_string())));
	}

	#[rstest]
	fn test_missing_template_rejected_in_debug(runtime: Runtime) {
		// Act
		let result = Component::builder("#app").build(&runtime);

		// Assert
		assert!(matches!(result, Err(PagesError::Configuration(_))));
	}

	#[rstest]
	fn test_missing_template_absorbed_in_production() {
		// Arrange
		let runtime = runtime_with(PagesConfig::production());
		let component = Component::builder("#app").build(&runtime).unwrap();

		// Act
		let result = component.render();

		// Assert
		assert_eq!(result, Ok(()));
		assert_eq!(component.render_count(), 0);
	}

	#[rstest]
	fn test_nothing_to_render_keeps_dom(runtime: Runtime) {
		// Arrange
		let component = Component::builder("#app")
			.template(|data, _| data["show"].as_bool().unwrap_or(false).then_some("<p>on</p>"))
			.data(json!({"show": true}))
			.build(&runtime)
			.unwrap();
		component.render().unwrap();

		// Act
		component.set_data(json!({"show": false}));
		runtime.flush();

		// Assert
		assert_eq!(app_html(&runtime), "<p>on</p>");
		assert_eq!(component.render_count(), 1);
	}

	#[rstest]
	fn test_attached_child_owns_its_subtree(runtime: Runtime) {
		// Arrange
		let parent = Component::builder("#app")
			.template(|data, _| format!(r#"<h1>{}</h1><section id="child"></section>"#, data["n"]))
			.data(json!({"n": 1}))
			.build(&runtime)
			.unwrap();
		let child = Component::builder("#child")
			.static_template("<p>child</p>")
			.attach_to(&parent)
			.build(&runtime)
			.unwrap();

		// Act
		parent.render().unwrap();
		parent.set_data(json!({"n": 2}));
		runtime.flush();

		// Assert
		assert_eq!(
			app_html(&runtime),
			r#"<h1>2</h1><section id="child"><p>child</p></section>"#
		);
		assert_eq!(child.render_count(), 2);
	}

	#[rstest]
	fn test_child_mounted_by_descendant_selector(runtime: Runtime) {
		// Arrange
		let parent = Component::builder("#app")
			.template(|data, _| format!(r#"<h1>{}</h1><section class="list"></section>"#, data["n"]))
			.data(json!({"n": 1}))
			.build(&runtime)
			.unwrap();
		let child = Component::builder("#app .list")
			.static_template("<p>child</p>")
			.attach_to(&parent)
			.build(&runtime)
			.unwrap();

		// Act
		parent.render().unwrap();
		parent.set_data(json!({"n": 2}));
		runtime.flush();

		// Assert
		assert_eq!(
			app_html(&runtime),
			r#"<h1>2</h1><section class="list"><p>child</p></section>"#
		);
		assert_eq!(child.render_count(), 2);
	}

	#[rstest]
	fn test_attachment_cycle_detected(runtime: Runtime) {
		// Arrange
		let a = Component::builder("#app")
			.static_template("<p>a</p>")
			.build(&runtime)
			.unwrap();
		let b = Component::builder("#side")
			.static_template("<p>b</p>")
			.build(&runtime)
			.unwrap();
		a.attach(&b);
		b.attach(&a);

		// Act
		let result = a.render();

		// Assert
		assert!(matches!(result, Err(PagesError::AttachmentCycle(_))));
		assert_eq!(app_html(&runtime), "");
	}

	#[rstest]
	fn test_attachment_cycle_skipped_in_production() {
		// Arrange
		let runtime = runtime_with(PagesConfig::production());
		let a = Component::builder("#app")
			.static_template("<p>a</p>")
			.build(&runtime)
			.unwrap();
		a.attach(&a);

		// Act
		let result = a.render();

		// Assert
		assert_eq!(result, Ok(()));
		assert_eq!(a.render_count(), 1);
	}

	#[rstest]
	fn test_render_event_carries_snapshot(runtime: Runtime) {
		// Arrange
		let seen = Rc::new(RefCell::new(None));
		let sink = Rc::clone(&seen);
		runtime
			.window()
			.add_event_listener(EventTarget::Document, event::RENDER, move |e| {
				if let EventDetail::Render(data) = e.detail() {
					*sink.borrow_mut() = Some(data.clone());
				}
			});
		let component = Component::builder("#app")
			.static_template("<p></p>")
			.data(json!({"k": "v"}))
			.build(&runtime)
			.unwrap();

		// Act
		component.render().unwrap();

		// Assert
		assert_eq!(*seen.borrow(), Some(json!({"k": "v"})));
	}

	#[rstest]
	fn test_store_bound_component_ignores_local_data(runtime: Runtime) {
		// Arrange
		let store = Store::builder(json!({"n": 1}))
			.setter("inc", |state, _| {
				state["n"] = json!(state["n"].as_i64().unwrap_or_default() + 1);
			})
			.build(&runtime);
		let component = Component::builder("#app")
			.template(|data, _| format!("<b>{}</b>", data["n"]))
			.store(&store)
			.build(&runtime)
			.unwrap();

		// Act
		component.set_data(json!({"n": 99}));
		store.dispatch("inc", &[]).unwrap();
		store.dispatch("inc", &[]).unwrap();
		runtime.flush();

		// Assert
		assert_eq!(app_html(&runtime), "<b>3</b>");
		assert_eq!(component.render_count(), 1);
	}
}
