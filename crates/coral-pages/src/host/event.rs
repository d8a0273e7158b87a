//! Host events.

use std::cell::Cell;

use serde_json::Value;

use crate::dom::NodeId;
use crate::router::ResolvedRoute;

/// Emitted on a component's mount node after each render.
pub const RENDER: &str = "render";
/// Emitted on the window before the router switches routes.
pub const BEFORE_ROUTE_UPDATED: &str = "beforeRouteUpdated";
/// Emitted on the window after the router switched routes.
pub const ROUTE_UPDATED: &str = "routeUpdated";
/// User click.
pub const CLICK: &str = "click";
/// History traversal.
pub const POPSTATE: &str = "popstate";
/// Fragment change.
pub const HASHCHANGE: &str = "hashchange";

/// Where an event is dispatched or a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
	/// The global window.
	Window,
	/// The document node.
	Document,
	/// A node in the document.
	Node(NodeId),
}

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
	/// Command on macOS, Windows key elsewhere.
	pub meta: bool,
	/// Control.
	pub ctrl: bool,
	/// Shift.
	pub shift: bool,
	/// Alt or Option.
	pub alt: bool,
}

impl Modifiers {
	/// No modifier held.
	pub const NONE: Self = Self {
		meta: false,
		ctrl: false,
		shift: false,
		alt: false,
	};
}

/// Typed event payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventDetail {
	/// No payload.
	#[default]
	None,
	/// Snapshot a component rendered with.
	Render(Value),
	/// Route pair before a navigation.
	BeforeRouteUpdated {
		/// Route being left.
		current: Option<ResolvedRoute>,
		/// Route being entered.
		next: Option<ResolvedRoute>,
	},
	/// Route pair after a navigation.
	RouteUpdated {
		/// Route now active.
		current: Option<ResolvedRoute>,
		/// Route that was left.
		previous: Option<ResolvedRoute>,
	},
	/// State stored with the history entry being restored.
	PopState(Option<Value>),
	/// URLs around a fragment change.
	HashChange {
		/// URL before the change.
		old_url: String,
		/// URL after the change.
		new_url: String,
	},
}

/// A dispatched event.
#[derive(Debug)]
pub struct Event {
	name: String,
	target: EventTarget,
	bubbles: bool,
	detail: EventDetail,
	modifiers: Modifiers,
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
}

impl Event {
	/// Creates a non-bubbling event without payload.
	pub fn new(name: impl Into<String>, target: EventTarget) -> Self {
		Self {
			name: name.into(),
			target,
			bubbles: false,
			detail: EventDetail::None,
			modifiers: Modifiers::NONE,
			default_prevented: Cell::new(false),
			propagation_stopped: Cell::new(false),
		}
	}

	/// Makes the event bubble through ancestors, the document and the window.
	pub fn bubbling(mut self) -> Self {
		self.bubbles = true;
		self
	}

	/// Attaches a payload.
	pub fn with_detail(mut self, detail: EventDetail) -> Self {
		self.detail = detail;
		self
	}

	/// Sets the modifier keys.
	pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
		self.modifiers = modifiers;
		self
	}

	/// Event name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Original target.
	pub fn target(&self) -> EventTarget {
		self.target
	}

	/// Whether the event bubbles.
	pub fn bubbles(&self) -> bool {
		self.bubbles
	}

	/// Payload.
	pub fn detail(&self) -> &EventDetail {
		&self.detail
	}

	/// Modifier keys.
	pub fn modifiers(&self) -> Modifiers {
		self.modifiers
	}

	/// Cancels the default action.
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	/// True once a listener called [`Event::prevent_default`].
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	/// Stops the event from reaching further targets on its path.
	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	pub(crate) fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}
}
