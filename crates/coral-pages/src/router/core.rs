//! Core Router Implementation.
//!
//! The router resolves the window location to a [`ResolvedRoute`], keeps it
//! as `current`, and re-renders its components on every route change. The
//! backend is picked once at construction:
//!
//! - hash mode keeps the route in the fragment as `#!/path`. It is used when
//!   asked for, when the history API is unavailable, and for `file:` pages.
//! - history mode pushes real entries and restores routes on `popstate`.
//!
//! A route change fires `beforeRouteUpdated`, updates `current`, the history
//! entry and the document title, renders, moves focus, then fires
//! `routeUpdated`. Both events bubble from the document.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use url::Url;

use super::pattern::normalize;
use super::route::{ResolvedRoute, Route, RouteTable};
use crate::component::{Component, ComponentInner};
use crate::config::PagesConfig;
use crate::dom::Selector;
use crate::error::{PagesError, Result};
use crate::host::{Event, EventDetail, EventTarget, ListenerId, Window, event};
use crate::runtime::Runtime;

/// Placeholder replaced by the route title.
pub const TITLE_PLACEHOLDER: &str = "{{title}}";

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

/// Builds the document title for a route.
#[derive(Clone)]
pub enum TitleTemplate {
	/// Text whose first `{{title}}` is replaced by the route title.
	Pattern(String),
	/// Computes the title from the route.
	Fn(Rc<dyn Fn(&ResolvedRoute) -> String>),
}

impl TitleTemplate {
	fn render(&self, route: &ResolvedRoute) -> String {
		match self {
			Self::Pattern(pattern) => pattern.replacen(TITLE_PLACEHOLDER, route.title(), 1),
			Self::Fn(title) => title(route),
		}
	}
}

impl Default for TitleTemplate {
	fn default() -> Self {
		Self::Pattern(TITLE_PLACEHOLDER.to_string())
	}
}

impl fmt::Debug for TitleTemplate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
			Self::Fn(_) => f.write_str("Fn(..)"),
		}
	}
}

/// Router construction options.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
	/// Routes in matching order.
	pub routes: Vec<Route>,
	/// Path prefix the app is served under, e.g. `/app`.
	pub root: String,
	/// Document title template.
	pub title: TitleTemplate,
	/// Forces hash mode.
	pub use_hash: bool,
	/// Overrides [`PagesConfig::max_redirects`].
	pub max_redirects: Option<usize>,
}

impl RouterOptions {
	/// Options for the given routes with defaults elsewhere.
	pub fn new(routes: Vec<Route>) -> Self {
		Self {
			routes,
			..Self::default()
		}
	}

	/// Sets the root prefix.
	pub fn with_root(mut self, root: impl Into<String>) -> Self {
		self.root = root.into();
		self
	}

	/// Sets a title pattern containing `{{title}}`.
	pub fn with_title(mut self, pattern: impl Into<String>) -> Self {
		self.title = TitleTemplate::Pattern(pattern.into());
		self
	}

	/// Computes titles with a function.
	pub fn with_title_fn<F>(mut self, title: F) -> Self
	where
		F: Fn(&ResolvedRoute) -> String + 'static,
	{
		self.title = TitleTemplate::Fn(Rc::new(title));
		self
	}

	/// Forces hash mode.
	pub fn use_hash(mut self, use_hash: bool) -> Self {
		self.use_hash = use_hash;
		self
	}

	/// Sets the redirect hop limit.
	pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
		self.max_redirects = Some(max_redirects);
		self
	}
}

/// Outcome of [`Router::navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
	/// A route change happened.
	Routed(ResolvedRoute),
	/// Same route; scrolled to the fragment (with its `#`).
	Anchor(String),
	/// Nothing matched the href; `current` is unchanged.
	NotFound(String),
}

struct RouterInner {
	window: Rc<Window>,
	config: PagesConfig,
	table: RefCell<RouteTable>,
	root: String,
	title: TitleTemplate,
	hash_mode: bool,
	max_redirects: usize,
	current: RefCell<Option<ResolvedRoute>>,
	components: RefCell<Vec<Weak<ComponentInner>>>,
	hashing: Cell<bool>,
	anchor: Selector,
	headings: Selector,
	listeners: RefCell<Vec<ListenerId>>,
}

impl Drop for RouterInner {
	fn drop(&mut self) {
		for id in self.listeners.get_mut().drain(..) {
			self.window.remove_event_listener(id);
		}
	}
}

/// Shared handle to a router.
#[derive(Clone)]
pub struct Router(Rc<RouterInner>);

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("routes_count", &self.0.table.borrow().len())
			.field("root", &self.0.root)
			.field("hash_mode", &self.0.hash_mode)
			.field("current", &self.0.current.borrow())
			.finish()
	}
}

impl Router {
	/// Creates a router, resolves the current location and starts listening
	/// for clicks and history changes.
	pub fn new(options: RouterOptions, runtime: &Runtime) -> Result<Self> {
		let config = runtime.config().clone();
		if options.routes.is_empty() {
			config.report::<()>(PagesError::Configuration(
				"a router needs at least one route".to_string(),
			))?;
		}
		let window = Rc::clone(runtime.window());
		let location = window.location();
		let hash_mode =
			options.use_hash || !window.supports_history() || location.scheme() == "file";
		let root = if options.root.trim_matches('/').is_empty() {
			String::new()
		} else {
			normalize(&options.root)
		};

		let router = Self(Rc::new(RouterInner {
			max_redirects: options.max_redirects.unwrap_or(config.max_redirects),
			table: RefCell::new(RouteTable::new(options.routes)?),
			title: options.title,
			anchor: Selector::parse("a")?,
			headings: Selector::parse(HEADINGS)?,
			current: RefCell::new(None),
			components: RefCell::new(Vec::new()),
			hashing: Cell::new(false),
			listeners: RefCell::new(Vec::new()),
			window,
			config,
			root,
			hash_mode,
		}));

		let link = router.effective_link(location)?;
		let initial = router.table_resolve(&link);
		if let Some(route) = &initial {
			router.update_title(route);
		}
		*router.0.current.borrow_mut() = initial;
		tracing::debug!(
			hash_mode,
			current = ?router.current().map(|r| r.route.id),
			"router started"
		);

		let weak = Rc::downgrade(&router.0);
		router.listen(EventTarget::Document, event::CLICK, weak.clone(), Router::handle_click);
		if hash_mode {
			router.listen(EventTarget::Window, event::HASHCHANGE, weak, Router::handle_hash_change);
		} else {
			router.0.window.replace_state(router.current_state(), None)?;
			router.listen(EventTarget::Window, event::POPSTATE, weak, Router::handle_pop_state);
		}
		Ok(router)
	}

	fn listen(
		&self,
		target: EventTarget,
		name: &str,
		weak: Weak<RouterInner>,
		handler: fn(&Router, &Event),
	) {
		let id = self.0.window.add_event_listener(target, name, move |e| {
			if let Some(inner) = weak.upgrade() {
				handler(&Router(inner), e);
			}
		});
		self.0.listeners.borrow_mut().push(id);
	}

	/// The active route, if the location matched one.
	pub fn current(&self) -> Option<ResolvedRoute> {
		self.0.current.borrow().clone()
	}

	/// Route definitions in matching order.
	pub fn routes(&self) -> Vec<Route> {
		self.0.table.borrow().routes()
	}

	/// True when routes live in the URL fragment.
	pub fn is_hash_mode(&self) -> bool {
		self.0.hash_mode
	}

	/// Normalized root prefix; empty when the app is served from `/`.
	pub fn root(&self) -> &str {
		&self.0.root
	}

	/// Appends a route.
	pub fn add_route(&self, route: Route) -> Result<()> {
		self.0.table.borrow_mut().push(route)
	}

	/// Appends several routes, stopping at the first invalid one.
	pub fn add_routes(&self, routes: impl IntoIterator<Item = Route>) -> Result<()> {
		let mut table = self.0.table.borrow_mut();
		for route in routes {
			table.push(route)?;
		}
		Ok(())
	}

	/// Resolves a root-relative path, with an optional `?query`, without
	/// navigating. Redirects are not followed.
	pub fn match_path(&self, path: &str) -> Option<ResolvedRoute> {
		let (path, query) = match path.split_once('?') {
			Some((path, query)) => (path, Some(query)),
			None => (path, None),
		};
		self.0.table.borrow().resolve(path, query)
	}

	/// Renders this router's components on every route change.
	pub fn add_component(&self, component: &Component) {
		let mut components = self.0.components.borrow_mut();
		if components
			.iter()
			.any(|c| c.as_ptr() == Rc::as_ptr(component.inner()))
		{
			return;
		}
		components.push(Rc::downgrade(component.inner()));
	}

	/// Stops rendering a component on route changes.
	pub fn remove_component(&self, component: &Component) {
		self.0
			.components
			.borrow_mut()
			.retain(|c| c.as_ptr() != Rc::as_ptr(component.inner()));
	}

	fn components(&self) -> Vec<Component> {
		let mut components = self.0.components.borrow_mut();
		components.retain(|c| c.strong_count() > 0);
		components
			.iter()
			.filter_map(Weak::upgrade)
			.map(Component::from_inner)
			.collect()
	}

	/// Navigates to a root-relative URL, which may carry a query and a fragment.
	pub fn navigate(&self, url: &str) -> Result<Navigation> {
		let link = self.link(url)?;
		self.update_route(link)
	}

	// URL handling

	/// Absolute URL for a root-relative one.
	fn link(&self, url: &str) -> Result<Url> {
		let (path, rest) = match url.find(['?', '#']) {
			Some(at) => url.split_at(at),
			None => (url, ""),
		};
		let path = path.trim_start_matches('/');
		self.0
			.window
			.resolve_url(&format!("{}/{path}{rest}", self.0.root))
	}

	/// In hash mode a `#!` fragment, or a `.html` page, carries the route.
	fn effective_link(&self, link: Url) -> Result<Url> {
		if !self.0.hash_mode {
			return Ok(link);
		}
		let fragment = link.fragment().unwrap_or_default();
		if let Some(route) = fragment.strip_prefix('!') {
			return self.link(route);
		}
		if link.path().ends_with(".html") {
			return self.link("/");
		}
		Ok(link)
	}

	/// Root-relative normalized path of a link.
	fn href(&self, link: &Url) -> String {
		let path = normalize(link.path());
		if self.0.root.is_empty() {
			return path;
		}
		match path.strip_prefix(self.0.root.as_str()) {
			Some(rest) if rest.is_empty() || rest.starts_with('/') => normalize(rest),
			_ => path,
		}
	}

	fn table_resolve(&self, link: &Url) -> Option<ResolvedRoute> {
		self.0.table.borrow().resolve(&self.href(link), link.query())
	}

	/// Resolves a link, following redirects up to the hop limit.
	fn resolve(&self, link: Url) -> Result<Option<(ResolvedRoute, Url)>> {
		let mut link = self.effective_link(link)?;
		for _ in 0..=self.0.max_redirects {
			let Some(route) = self.table_resolve(&link) else {
				return Ok(None);
			};
			let Some(redirect) = route.route.redirect.clone() else {
				return Ok(Some((route, link)));
			};
			tracing::debug!(from = %link, to = %redirect, "following redirect");
			link = self.link(&redirect)?;
		}
		self.0.config.report(PagesError::RedirectLimit {
			url: link.to_string(),
			limit: self.0.max_redirects,
		})
	}

	fn current_state(&self) -> Option<Value> {
		self.current()
			.and_then(|route| serde_json::to_value(route).ok())
	}

	// Navigation

	fn update_route(&self, link: Url) -> Result<Navigation> {
		let requested = self.href(&link);
		let Some((route, link)) = self.resolve(link)? else {
			tracing::warn!(href = %requested, "no route matches");
			return Ok(Navigation::NotFound(requested));
		};
		let href = self.href(&link);
		let hash = link
			.fragment()
			.filter(|f| !f.is_empty())
			.map(|f| format!("#{f}"));

		let previous = self.current();
		if let Some(hash) = &hash
			&& previous.as_ref().is_some_and(|p| p.route == route.route && p.params == route.params)
		{
			if self.0.hash_mode {
				self.set_hash(&format!("!{href}{hash}"));
			} else {
				self.0.window.push_state(self.current_state(), link.as_str())?;
			}
			self.scroll_to_anchor(hash);
			return Ok(Navigation::Anchor(hash.clone()));
		}

		self.emit_before(previous.clone(), Some(route.clone()));
		*self.0.current.borrow_mut() = Some(route.clone());
		if self.0.hash_mode {
			let search = link.query().map(|q| format!("?{q}")).unwrap_or_default();
			self.set_hash(&format!("!{href}{search}"));
		} else {
			self.0.window.push_state(self.current_state(), link.as_str())?;
		}
		tracing::debug!(route = %route.id(), href = %href, "route updated");
		self.finish(&route, previous, hash.as_deref(), true)?;
		Ok(Navigation::Routed(route))
	}

	/// Title, render, focus, then `routeUpdated`.
	fn finish(
		&self,
		route: &ResolvedRoute,
		previous: Option<ResolvedRoute>,
		hash: Option<&str>,
		manage_focus: bool,
	) -> Result<()> {
		self.update_title(route);
		let rendered = self.render_components();
		if manage_focus {
			match hash {
				Some(hash) => self.scroll_to_anchor(hash),
				None => self.focus_heading(),
			}
		}
		self.emit_after(Some(route.clone()), previous);
		rendered
	}

	fn set_hash(&self, fragment: &str) {
		if self.0.window.set_location_hash(fragment) {
			self.0.hashing.set(true);
		}
	}

	fn update_title(&self, route: &ResolvedRoute) {
		if route.title().is_empty() {
			return;
		}
		let title = self.0.title.render(route);
		self.0.window.document_mut().set_title(title);
	}

	/// Renders every live component; all render, the first error is returned.
	fn render_components(&self) -> Result<()> {
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

	fn scroll_to_anchor(&self, hash: &str) {
		let id = hash.strip_prefix('#').unwrap_or(hash);
		let id = super::pattern::decode(id);
		let mut doc = self.0.window.document_mut();
		let Some(target) = doc.get_element_by_id(&id) else {
			return;
		};
		doc.scroll_into_view(target);
		if doc.active_element() == Some(target) {
			return;
		}
		if !doc.has_attribute(target, "tabindex") {
			doc.set_attribute(target, "tabindex", "-1");
		}
		doc.focus(target);
	}

	fn focus_heading(&self) {
		let mut doc = self.0.window.document_mut();
		let root = doc.root();
		let Some(heading) = doc.query_selector_in(root, &self.0.headings) else {
			return;
		};
		if !doc.has_attribute(heading, "tabindex") {
			doc.set_attribute(heading, "tabindex", "-1");
		}
		doc.focus(heading);
	}

	fn emit_before(&self, current: Option<ResolvedRoute>, next: Option<ResolvedRoute>) {
		let event = Event::new(event::BEFORE_ROUTE_UPDATED, EventTarget::Document)
			.bubbling()
			.with_detail(EventDetail::BeforeRouteUpdated { current, next });
		self.0.window.dispatch_event(&event);
	}

	fn emit_after(&self, current: Option<ResolvedRoute>, previous: Option<ResolvedRoute>) {
		let event = Event::new(event::ROUTE_UPDATED, EventTarget::Document)
			.bubbling()
			.with_detail(EventDetail::RouteUpdated { current, previous });
		self.0.window.dispatch_event(&event);
	}

	// Event handlers

	fn handle_click(&self, e: &Event) {
		let modifiers = e.modifiers();
		if modifiers.meta || modifiers.ctrl || modifiers.shift || e.default_prevented() {
			return;
		}
		let EventTarget::Node(node) = e.target() else {
			return;
		};
		let link = {
			let doc = self.0.window.document();
			let Some(anchor) = doc.closest(node, &self.0.anchor) else {
				return;
			};
			let Some(href) = doc.attribute(anchor, "href") else {
				return;
			};
			if doc.has_attribute(anchor, "download")
				|| doc.attribute(anchor, "rel") == Some("external")
				|| href.starts_with("mailto:")
			{
				return;
			}
			let Ok(link) = self.0.window.resolve_url(href) else {
				return;
			};
			link
		};
		let location = self.0.window.location();
		if !same_origin(&link, &location) {
			return;
		}
		if !self.0.hash_mode
			&& link.path() == location.path()
			&& link.query() == location.query()
			&& link.fragment().is_some()
		{
			return;
		}
		e.prevent_default();
		if let Err(err) = self.update_route(link) {
			tracing::error!(error = %err, "navigation from link failed");
		}
	}

	fn handle_pop_state(&self, e: &Event) {
		let EventDetail::PopState(state) = e.detail() else {
			return;
		};
		let Some(state) = state else {
			if let Err(err) = self.0.window.replace_state(self.current_state(), None) {
				tracing::error!(error = %err, "could not record route in history");
			}
			return;
		};
		let route: ResolvedRoute = match serde_json::from_value(state.clone()) {
			Ok(route) => route,
			Err(err) => {
				tracing::warn!(error = %err, "history entry does not hold a route");
				return;
			}
		};
		let previous = self.current();
		self.emit_before(previous.clone(), Some(route.clone()));
		*self.0.current.borrow_mut() = Some(route.clone());
		if let Err(err) = self.finish(&route, previous, None, false) {
			tracing::error!(error = %err, "render after popstate failed");
		}
	}

	fn handle_hash_change(&self, _: &Event) {
		if self.0.hashing.replace(false) {
			return;
		}
		let (route, link) = match self.resolve(self.0.window.location()) {
			Ok(Some(found)) => found,
			Ok(None) => {
				tracing::warn!(location = %self.0.window.location(), "no route matches");
				return;
			}
			Err(err) => {
				tracing::error!(error = %err, "hash navigation failed");
				return;
			}
		};
		let hash = link
			.fragment()
			.filter(|f| !f.is_empty())
			.map(|f| format!("#{f}"));
		let previous = self.current();
		self.emit_before(previous.clone(), Some(route.clone()));
		*self.0.current.borrow_mut() = Some(route.clone());
		if let Err(err) = self.finish(&route, previous, hash.as_deref(), hash.is_some()) {
			tracing::error!(error = %err, "render after hashchange failed");
		}
	}
}

/// Scheme, host and port agree. Unlike [`Url::origin`], two `file:` URLs
/// compare equal.
fn same_origin(a: &Url, b: &Url) -> bool {
	a.scheme() == b.scheme()
		&& a.host_str() == b.host_str()
		&& a.port_or_known_default() == b.port_or_known_default()
}
