//! The window: document, location, history, listeners and the two queues
//! that drive everything asynchronous.
//!
//! Nothing runs on its own. Animation-frame callbacks wait for
//! [`Window::run_animation_frame`]; `popstate` and `hashchange` events wait
//! for [`Window::run_tasks`]. [`Window::flush`] drains both until idle.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;
use url::Url;

use super::event::{self, Event, EventDetail, EventTarget, Modifiers};
use super::history::History;
use crate::dom::{Document, NodeId};
use crate::error::{PagesError, Result};

/// Upper bound on task/frame rounds in [`Window::flush`].
const MAX_FLUSH_ROUNDS: usize = 64;

/// Handle returned by [`Window::request_animation_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(u64);

/// Handle returned by [`Window::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Handler = Rc<dyn Fn(&Event)>;

struct Listener {
	id: ListenerId,
	target: EventTarget,
	name: String,
	handler: Handler,
}

/// Builder for [`Window`].
#[derive(Debug, Clone)]
pub struct WindowBuilder {
	url: String,
	body: Option<String>,
	title: String,
	supports_history: bool,
}

impl WindowBuilder {
	/// Seeds the body with markup.
	pub fn body(mut self, markup: impl Into<String>) -> Self {
		self.body = Some(markup.into());
		self
	}

	/// Sets the initial document title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	/// Declares whether `push_state` is available. Defaults to true.
	pub fn supports_history(mut self, supported: bool) -> Self {
		self.supports_history = supported;
		self
	}

	/// Builds the window.
	pub fn build(self) -> Result<Window> {
		let url = Url::parse(&self.url).map_err(|e| PagesError::InvalidUrl {
			url: self.url.clone(),
			reason: e.to_string(),
		})?;
		let mut document = match &self.body {
			Some(markup) => Document::with_body(markup)?,
			None => Document::new(),
		};
		document.set_title(self.title);
		Ok(Window {
			document: RefCell::new(document),
			history: RefCell::new(History::new(url)),
			listeners: RefCell::new(Vec::new()),
			next_listener: Cell::new(0),
			tasks: RefCell::new(VecDeque::new()),
			frames: RefCell::new(BTreeMap::new()),
			next_frame: Cell::new(0),
			supports_history: self.supports_history,
		})
	}
}

/// A single-threaded browser window.
pub struct Window {
	document: RefCell<Document>,
	history: RefCell<History>,
	listeners: RefCell<Vec<Listener>>,
	next_listener: Cell<u64>,
	tasks: RefCell<VecDeque<Event>>,
	frames: RefCell<BTreeMap<FrameHandle, Box<dyn FnOnce()>>>,
	next_frame: Cell<u64>,
	supports_history: bool,
}

impl std::fmt::Debug for Window {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Window")
			.field("location", &self.location().as_str())
			.field("listeners", &self.listeners.borrow().len())
			.field("pending_tasks", &self.tasks.borrow().len())
			.field("pending_frames", &self.frames.borrow().len())
			.field("supports_history", &self.supports_history)
			.finish()
	}
}

impl Window {
	/// Starts building a window at the given absolute URL.
	pub fn builder(url: impl Into<String>) -> WindowBuilder {
		WindowBuilder {
			url: url.into(),
			body: None,
			title: String::new(),
			supports_history: true,
		}
	}

	/// Creates a window with an empty body.
	pub fn new(url: &str) -> Result<Self> {
		Self::builder(url).build()
	}

	/// Borrows the document.
	///
	/// # Panics
	///
	/// Panics if the document is mutably borrowed, e.g. from inside a render.
	pub fn document(&self) -> Ref<'_, Document> {
		self.document.borrow()
	}

	/// Mutably borrows the document.
	pub fn document_mut(&self) -> RefMut<'_, Document> {
		self.document.borrow_mut()
	}

	/// Whether the history API is available.
	pub fn supports_history(&self) -> bool {
		self.supports_history
	}

	// Location and history

	/// Current URL.
	pub fn location(&self) -> Url {
		self.history.borrow().current().url.clone()
	}

	/// State of the active history entry.
	pub fn history_state(&self) -> Option<Value> {
		self.history.borrow().current().state.clone()
	}

	/// Number of history entries.
	pub fn history_len(&self) -> usize {
		self.history.borrow().len()
	}

	/// Resolves a possibly relative URL against the current location.
	pub fn resolve_url(&self, url: &str) -> Result<Url> {
		self.location()
			.join(url)
			.map_err(|e| PagesError::InvalidUrl {
				url: url.to_string(),
				reason: e.to_string(),
			})
	}

	/// Pushes a history entry. No event is fired.
	pub fn push_state(&self, state: Option<Value>, url: &str) -> Result<()> {
		let url = self.resolve_url(url)?;
		tracing::trace!(url = %url, "push_state");
		self.history.borrow_mut().push(url, state);
		Ok(())
	}

	/// Rewrites the active history entry. `None` keeps the current URL.
	pub fn replace_state(&self, state: Option<Value>, url: Option<&str>) -> Result<()> {
		let url = match url {
			Some(url) => self.resolve_url(url)?,
			None => self.location(),
		};
		self.history.borrow_mut().replace(url, state);
		Ok(())
	}

	/// Sets the URL fragment (without the leading `#`).
	///
	/// Returns false and does nothing when the fragment is unchanged.
	/// Otherwise pushes an entry and queues `hashchange`.
	pub fn set_location_hash(&self, hash: &str) -> bool {
		let hash = hash.strip_prefix('#').unwrap_or(hash);
		let old = self.location();
		if old.fragment().unwrap_or_default() == hash {
			return false;
		}
		let mut new = old.clone();
		new.set_fragment(Some(hash));
		self.history.borrow_mut().push(new.clone(), None);
		self.queue_task(
			Event::new(event::HASHCHANGE, EventTarget::Window).with_detail(EventDetail::HashChange {
				old_url: old.to_string(),
				new_url: new.to_string(),
			}),
		);
		true
	}

	/// Goes back one entry.
	pub fn back(&self) -> bool {
		self.go(-1)
	}

	/// Goes forward one entry.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	/// Traverses history. Queues `popstate`, plus `hashchange` when only the
	/// fragment differs. Returns false when the target is out of range.
	pub fn go(&self, delta: isize) -> bool {
		let Some((left, entered)) = self.history.borrow_mut().traverse(delta) else {
			return false;
		};
		self.queue_task(
			Event::new(event::POPSTATE, EventTarget::Window)
				.with_detail(EventDetail::PopState(entered.state.clone())),
		);
		let mut left_base = left.url.clone();
		left_base.set_fragment(None);
		let mut entered_base = entered.url.clone();
		entered_base.set_fragment(None);
		if left_base == entered_base && left.url.fragment() != entered.url.fragment() {
			self.queue_task(Event::new(event::HASHCHANGE, EventTarget::Window).with_detail(
				EventDetail::HashChange {
					old_url: left.url.to_string(),
					new_url: entered.url.to_string(),
				},
			));
		}
		true
	}

	// Events

	/// Registers a listener.
	pub fn add_event_listener<F>(&self, target: EventTarget, name: &str, handler: F) -> ListenerId
	where
		F: Fn(&Event) + 'static,
	{
		let id = ListenerId(self.next_listener.get());
		self.next_listener.set(id.0 + 1);
		self.listeners.borrow_mut().push(Listener {
			id,
			target,
			name: name.to_string(),
			handler: Rc::new(handler),
		});
		id
	}

	/// Unregisters a listener. Returns false if it was not registered.
	pub fn remove_event_listener(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|l| l.id != id);
		before != listeners.len()
	}

	/// Number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	fn propagation_path(&self, target: EventTarget, bubbles: bool) -> Vec<EventTarget> {
		if !bubbles {
			return vec![target];
		}
		match target {
			EventTarget::Window => vec![EventTarget::Window],
			EventTarget::Document => vec![EventTarget::Document, EventTarget::Window],
			EventTarget::Node(node) => {
				let doc = self.document();
				let mut path: Vec<EventTarget> = doc
					.ancestors(node)
					.into_iter()
					.filter(|id| *id != doc.root())
					.map(EventTarget::Node)
					.collect();
				if doc.is_connected(node) {
					path.push(EventTarget::Document);
					path.push(EventTarget::Window);
				}
				path
			}
		}
	}

	/// Dispatches an event synchronously along its propagation path.
	///
	/// Returns false when a listener prevented the default action.
	pub fn dispatch_event(&self, event: &Event) -> bool {
		for target in self.propagation_path(event.target(), event.bubbles()) {
			let handlers: Vec<Handler> = self
				.listeners
				.borrow()
				.iter()
				.filter(|l| l.target == target && l.name == event.name())
				.map(|l| Rc::clone(&l.handler))
				.collect();
			for handler in handlers {
				handler(event);
			}
			if event.propagation_stopped() {
				break;
			}
		}
		!event.default_prevented()
	}

	/// Simulates a plain left click on a node.
	pub fn click(&self, node: NodeId) -> bool {
		self.click_with(node, Modifiers::NONE)
	}

	/// Simulates a click with modifier keys.
	///
	/// Returns true when a listener prevented the default action. When
	/// nobody did and the click landed on an in-page fragment link, the
	/// fragment is applied the way a browser would.
	pub fn click_with(&self, node: NodeId, modifiers: Modifiers) -> bool {
		let click = Event::new(event::CLICK, EventTarget::Node(node))
			.bubbling()
			.with_modifiers(modifiers);
		if !self.dispatch_event(&click) {
			return true;
		}
		self.follow_fragment_link(node);
		false
	}

	fn follow_fragment_link(&self, node: NodeId) {
		let href = {
			let doc = self.document();
			let Ok(anchor) = crate::dom::Selector::parse("a[href]") else {
				return;
			};
			doc.closest(node, &anchor)
				.and_then(|a| doc.attribute(a, "href").map(str::to_string))
		};
		let Some(href) = href else {
			return;
		};
		let Ok(target) = self.resolve_url(&href) else {
			return;
		};
		let mut here = self.location();
		here.set_fragment(None);
		let mut there = target.clone();
		there.set_fragment(None);
		if here != there {
			return;
		}
		if let Some(fragment) = target.fragment() {
			self.set_location_hash(fragment);
		}
	}

	// Tasks

	pub(crate) fn queue_task(&self, event: Event) {
		self.tasks.borrow_mut().push_back(event);
	}

	/// Number of queued tasks.
	pub fn pending_tasks(&self) -> usize {
		self.tasks.borrow().len()
	}

	/// Dispatches queued events, including ones queued while running.
	/// Returns how many ran.
	pub fn run_tasks(&self) -> usize {
		let mut ran = 0;
		loop {
			let next = self.tasks.borrow_mut().pop_front();
			let Some(event) = next else {
				break;
			};
			self.dispatch_event(&event);
			ran += 1;
		}
		ran
	}

	// Animation frames

	/// Schedules a callback for the next animation frame.
	pub fn request_animation_frame<F>(&self, callback: F) -> FrameHandle
	where
		F: FnOnce() + 'static,
	{
		let handle = FrameHandle(self.next_frame.get());
		self.next_frame.set(handle.0 + 1);
		self.frames.borrow_mut().insert(handle, Box::new(callback));
		handle
	}

	/// Cancels a scheduled callback. Returns false if it already ran.
	pub fn cancel_animation_frame(&self, handle: FrameHandle) -> bool {
		self.frames.borrow_mut().remove(&handle).is_some()
	}

	/// Number of scheduled frame callbacks.
	pub fn pending_frames(&self) -> usize {
		self.frames.borrow().len()
	}

	/// Runs the callbacks scheduled before this call, in request order.
	///
	/// Callbacks requested while running wait for the next frame; callbacks
	/// cancelled while running are skipped. Returns how many ran.
	pub fn run_animation_frame(&self) -> usize {
		let handles: Vec<FrameHandle> = self.frames.borrow().keys().copied().collect();
		let mut ran = 0;
		for handle in handles {
			let callback = self.frames.borrow_mut().remove(&handle);
			if let Some(callback) = callback {
				callback();
				ran += 1;
			}
		}
		ran
	}

	/// Alternates tasks and frames until both queues are empty.
	pub fn flush(&self) {
		for _ in 0..MAX_FLUSH_ROUNDS {
			let ran = self.run_tasks() + self.run_animation_frame();
			if ran == 0 {
				return;
			}
		}
		tracing::warn!(
			rounds = MAX_FLUSH_ROUNDS,
			"window did not settle; work keeps rescheduling itself"
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::cell::RefCell;

	#[fixture]
	fn window() -> Window {
		Window::builder("http://localhost/app/")
			.body(r##"<div id="outer"><a id="link" href="#section">go</a></div><h2 id="section">S</h2>"##)
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_frames_coalesce_and_cancel(window: Window) {
		// Arrange
		let log = Rc::new(RefCell::new(Vec::new()));
		let first = {
			let log = Rc::clone(&log);
			window.request_animation_frame(move || log.borrow_mut().push("first"))
		};
		{
			let log = Rc::clone(&log);
			window.request_animation_frame(move || log.borrow_mut().push("second"));
		}

		// Act
		let cancelled = window.cancel_animation_frame(first);
		let ran = window.run_animation_frame();

		// Assert
		assert!(cancelled);
		assert_eq!(ran, 1);
		assert_eq!(*log.borrow(), vec!["second"]);
		assert!(!window.cancel_animation_frame(first));
	}

	#[rstest]
	fn test_frame_requested_during_run_waits(window: Window) {
		// Arrange
		let window = Rc::new(window);
		let count = Rc::new(Cell::new(0));
		{
			let inner_window = Rc::clone(&window);
			let count = Rc::clone(&count);
			window.request_animation_frame(move || {
				count.set(count.get() + 1);
				let count = Rc::clone(&count);
				inner_window.request_animation_frame(move || count.set(count.get() + 10));
			});
		}

		// Act
		let first = window.run_animation_frame();

		// Assert
		assert_eq!(first, 1);
		assert_eq!(count.get(), 1);
		assert_eq!(window.pending_frames(), 1);
		window.flush();
		assert_eq!(count.get(), 11);
	}

	#[rstest]
	fn test_dispatch_bubbles_to_window(window: Window) {
		// Arrange
		let seen = Rc::new(RefCell::new(Vec::new()));
		let (outer, link) = {
			let doc = window.document();
			(
				doc.get_element_by_id("outer").unwrap(),
				doc.get_element_by_id("link").unwrap(),
			)
		};
		for (target, label) in [
			(EventTarget::Node(outer), "outer"),
			(EventTarget::Document, "document"),
			(EventTarget::Window, "window"),
		] {
			let seen = Rc::clone(&seen);
			window.add_event_listener(target, "ping", move |_| seen.borrow_mut().push(label));
		}

		// Act
		window.dispatch_event(&Event::new("ping", EventTarget::Node(link)).bubbling());

		// Assert
		assert_eq!(*seen.borrow(), vec!["outer", "document", "window"]);
	}

	#[rstest]
	fn test_remove_listener(window: Window) {
		// Arrange
		let hits = Rc::new(Cell::new(0));
		let id = {
			let hits = Rc::clone(&hits);
			window.add_event_listener(EventTarget::Window, "ping", move |_| hits.set(hits.get() + 1))
		};

		// Act
		assert!(window.remove_event_listener(id));
		window.dispatch_event(&Event::new("ping", EventTarget::Window));

		// Assert
		assert_eq!(hits.get(), 0);
		assert_eq!(window.listener_count(), 0);
	}

	#[rstest]
	fn test_hash_change_is_queued_once(window: Window) {
		// Arrange
		let hits = Rc::new(Cell::new(0));
		{
			let hits = Rc::clone(&hits);
			window.add_event_listener(EventTarget::Window, event::HASHCHANGE, move |_| {
				hits.set(hits.get() + 1)
			});
		}

		// Act
		let changed = window.set_location_hash("#!/jobs");
		let unchanged = window.set_location_hash("!/jobs");
		window.run_tasks();

		// Assert
		assert!(changed);
		assert!(!unchanged);
		assert_eq!(hits.get(), 1);
		assert_eq!(window.location().fragment(), Some("!/jobs"));
		assert_eq!(window.history_len(), 2);
	}

	#[rstest]
	fn test_back_queues_popstate_with_state(window: Window) {
		// Arrange
		let states = Rc::new(RefCell::new(Vec::new()));
		{
			let states = Rc::clone(&states);
			window.add_event_listener(EventTarget::Window, event::POPSTATE, move |e| {
				if let EventDetail::PopState(state) = e.detail() {
					states.borrow_mut().push(state.clone());
				}
			});
		}
		window
			.replace_state(Some(serde_json::json!({"page": 1})), None)
			.unwrap();
		window.push_state(None, "/app/two").unwrap();

		// Act
		let moved = window.back();
		window.run_tasks();

		// Assert
		assert!(moved);
		assert_eq!(window.location().path(), "/app/");
		assert_eq!(*states.borrow(), vec![Some(serde_json::json!({"page": 1}))]);
		assert!(!window.back());
	}

	#[rstest]
	fn test_unhandled_fragment_click_sets_hash(window: Window) {
		// Arrange
		let link = window.document().get_element_by_id("link").unwrap();

		// Act
		let prevented = window.click(link);

		// Assert
		assert!(!prevented);
		assert_eq!(window.location().fragment(), Some("section"));
		assert_eq!(window.pending_tasks(), 1);
	}

	#[rstest]
	fn test_invalid_url() {
		assert!(matches!(
			Window::new("not a url"),
			Err(PagesError::InvalidUrl { .. })
		));
	}
}
