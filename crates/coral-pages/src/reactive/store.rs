//! The reactive store.
//!
//! State is a [`serde_json::Value`] owned by the store and changed only
//! through named setters. Every successful [`Store::dispatch`] cancels the
//! store's pending animation frame and requests a new one, so any number of
//! dispatches between two frames produce a single render of the bound
//! components, reflecting the last state.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::snapshot::snapshot;
use crate::component::{Component, ComponentInner};
use crate::config::PagesConfig;
use crate::error::{PagesError, Result};
use crate::host::{FrameHandle, Window};
use crate::runtime::Runtime;

/// A named state mutation.
pub type Setter = Rc<dyn Fn(&mut Value, &[Value])>;

/// A named read-only computation over state.
pub type Getter = Rc<dyn Fn(&Value, &[Value]) -> Value>;

/// Builder for [`Store`].
pub struct StoreBuilder {
	state: Value,
	setters: BTreeMap<String, Setter>,
	getters: BTreeMap<String, Getter>,
	allow_html: Option<bool>,
}

impl StoreBuilder {
	/// Registers a setter.
	pub fn setter<F>(mut self, name: impl Into<String>, setter: F) -> Self
	where
		F: Fn(&mut Value, &[Value]) + 'static,
	{
		self.setters.insert(name.into(), Rc::new(setter));
		self
	}

	/// Registers a getter.
	pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
	where
		F: Fn(&Value, &[Value]) -> Value + 'static,
	{
		self.getters.insert(name.into(), Rc::new(getter));
		self
	}

	/// Keeps strings unescaped in [`Store::data`].
	pub fn allow_html(mut self, allow: bool) -> Self {
		self.allow_html = Some(allow);
		self
	}

	/// Builds the store.
	pub fn build(self, runtime: &Runtime) -> Store {
		let allow_html = self.allow_html.unwrap_or(runtime.config().allow_html);
		Store(Rc::new(StoreInner {
			window: Rc::clone(runtime.window()),
			config: runtime.config().clone(),
			state: RefCell::new(self.state),
			setters: self.setters,
			getters: self.getters,
			allow_html,
			components: RefCell::new(Vec::new()),
			pending: Cell::new(None),
		}))
	}
}

struct StoreInner {
	window: Rc<Window>,
	config: PagesConfig,
	state: RefCell<Value>,
	setters: BTreeMap<String, Setter>,
	getters: BTreeMap<String, Getter>,
	allow_html: bool,
	components: RefCell<Vec<Weak<ComponentInner>>>,
	pending: Cell<Option<FrameHandle>>,
}

/// Shared handle to a reactive store.
#[derive(Clone)]
pub struct Store(Rc<StoreInner>);

impl std::fmt::Debug for Store {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Store")
			.field("setters", &self.0.setters.keys().collect::<Vec<_>>())
			.field("getters", &self.0.getters.keys().collect::<Vec<_>>())
			.field("components", &self.0.components.borrow().len())
			.field("render_pending", &self.0.pending.get().is_some())
			.finish()
	}
}

impl Store {
	/// Starts a store with the given initial state.
	pub fn builder(initial: Value) -> StoreBuilder {
		StoreBuilder {
			state: initial,
			setters: BTreeMap::new(),
			getters: BTreeMap::new(),
			allow_html: None,
		}
	}

	/// Runs the named setter with `args`, then schedules a render.
	pub fn dispatch(&self, name: &str, args: &[Value]) -> Result<()> {
		let Some(setter) = self.0.setters.get(name).cloned() else {
			return self.0.config.report(PagesError::unknown_setter(name));
		};
		setter(&mut self.0.state.borrow_mut(), args);
		tracing::debug!(setter = name, "store updated");
		self.schedule_render();
		Ok(())
	}

	/// Runs the named getter against the current state.
	///
	/// Returns `Value::Null` for an unknown getter when errors are absorbed.
	pub fn get(&self, name: &str, args: &[Value]) -> Result<Value> {
		let Some(getter) = self.0.getters.get(name).cloned() else {
			return self.0.config.report(PagesError::unknown_getter(name));
		};
		let state = self.0.state.borrow();
		Ok(getter(&state, args))
	}

	/// Escaped (unless the store allows HTML) deep copy of the state.
	pub fn data(&self) -> Value {
		self.snapshot(self.0.allow_html)
	}

	/// Deep copy of the state with explicit escaping.
	pub fn snapshot(&self, allow_html: bool) -> Value {
		snapshot(&self.0.state.borrow(), allow_html)
	}

	/// Binds a component: it renders whenever the store's scheduled render runs.
	pub fn attach(&self, component: &Component) {
		let mut components = self.0.components.borrow_mut();
		if components
			.iter()
			.any(|c| c.as_ptr() == Rc::as_ptr(component.inner()))
		{
			return;
		}
		components.push(Rc::downgrade(component.inner()));
	}

	/// Unbinds a component.
	pub fn detach(&self, component: &Component) {
		self.0
			.components
			.borrow_mut()
			.retain(|c| c.as_ptr() != Rc::as_ptr(component.inner()));
	}

	/// Live bound components in binding order.
	pub fn components(&self) -> Vec<Component> {
		let mut components = self.0.components.borrow_mut();
		components.retain(|c| c.strong_count() > 0);
		components
			.iter()
			.filter_map(Weak::upgrade)
			.map(Component::from_inner)
			.collect()
	}

	/// True while a render is scheduled and has not run yet.
	pub fn render_pending(&self) -> bool {
		self.0.pending.get().is_some()
	}

	/// Renders every bound component now, in binding order.
	///
	/// All components are rendered; the first error is returned.
	pub fn render(&self) -> Result<()> {
		let mut first_error = None;
		for component in self.components() {
			if let Err(err) = component.render()
				&& first_error.is_none()
			{
				first_error = Some(err);
			}
		}
		first_error.map_or(Ok(()), Err)
	}

	fn schedule_render(&self) {
		if let Some(handle) = self.0.pending.take() {
			self.0.window.cancel_animation_frame(handle);
		}
		let weak = Rc::downgrade(&self.0);
		let handle = self.0.window.request_animation_frame(move || {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			inner.pending.set(None);
			if let Err(err) = Store(inner).render() {
				tracing::error!(error = %err, "scheduled store render failed");
			}
		});
		self.0.pending.set(Some(handle));
	}
}
