//! Route definitions and resolved routes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pattern::{RoutePattern, normalize};
use crate::error::Result;

/// A declarative route.
///
/// ```
/// use coral_pages::router::Route;
///
/// let routes: Vec<Route> = serde_json::from_str(
///     r#"[{"id": "jobs", "title": "Jobs", "url": "/jobs/"},
///         {"id": "home", "url": "/", "redirect": "/jobs/"}]"#,
/// ).unwrap();
/// assert_eq!(routes[1].redirect.as_deref(), Some("/jobs/"));
/// assert!(routes[1].title.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
	/// Identifier templates switch on. Several routes may share one.
	pub id: String,
	/// Substituted into the title template. Empty means "leave the title".
	#[serde(default)]
	pub title: String,
	/// URL pattern.
	pub url: String,
	/// URL to resolve instead when this route matches.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect: Option<String>,
}

impl Route {
	/// Creates a route.
	pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			url: url.into(),
			redirect: None,
		}
	}

	/// Turns the route into a redirect to `url`.
	pub fn redirect_to(mut self, url: impl Into<String>) -> Self {
		self.redirect = Some(url.into());
		self
	}
}

/// A route matched against a concrete URL.
///
/// Built fresh for every navigation and handed out by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRoute {
	/// The matched definition.
	#[serde(flatten)]
	pub route: Route,
	/// Path parameters.
	#[serde(default)]
	pub params: BTreeMap<String, String>,
	/// Query parameters.
	#[serde(default)]
	pub search: BTreeMap<String, String>,
}

impl ResolvedRoute {
	/// Route id.
	pub fn id(&self) -> &str {
		&self.route.id
	}

	/// Route title.
	pub fn title(&self) -> &str {
		&self.route.title
	}

	/// Route URL pattern.
	pub fn url(&self) -> &str {
		&self.route.url
	}

	/// Path parameter by name.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// Query parameter by name.
	pub fn query(&self, name: &str) -> Option<&str> {
		self.search.get(name).map(String::as_str)
	}
}

/// Ordered routes with their compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	entries: Vec<(Route, RoutePattern)>,
}

impl RouteTable {
	/// Compiles every route. Fails on the first invalid pattern.
	pub fn new(routes: Vec<Route>) -> Result<Self> {
		let mut table = Self::default();
		for route in routes {
			table.push(route)?;
		}
		Ok(table)
	}

	/// Appends a route after the existing ones.
	pub fn push(&mut self, route: Route) -> Result<()> {
		let pattern = RoutePattern::compile(&route.url)?;
		self.entries.push((route, pattern));
		Ok(())
	}

	/// Route definitions in registration order.
	pub fn routes(&self) -> Vec<Route> {
		self.entries.iter().map(|(r, _)| r.clone()).collect()
	}

	/// Number of routes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when no route is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Finds the route for a normalized href.
	///
	/// `/` first looks for a route registered literally as `/`. Otherwise the
	/// first route in registration order whose pattern matches wins.
	pub fn find(&self, href: &str) -> Option<(Route, BTreeMap<String, String>)> {
		if href == "/"
			&& let Some((route, _)) = self.entries.iter().find(|(r, _)| r.url == "/")
		{
			return Some((route.clone(), BTreeMap::new()));
		}
		let path = if href.starts_with('/') {
			format!("/{}", href.trim_start_matches('/'))
		} else {
			href.to_string()
		};
		self.entries
			.iter()
			.find_map(|(route, pattern)| pattern.matches(&path).map(|p| (route.clone(), p)))
	}

	/// Resolves an href plus query string into a [`ResolvedRoute`].
	pub fn resolve(&self, href: &str, query: Option<&str>) -> Option<ResolvedRoute> {
		let (route, params) = self.find(&normalize(href))?;
		Some(ResolvedRoute {
			route,
			params,
			search: parse_search(query.unwrap_or_default()),
		})
	}
}

/// Splits a query string into decoded pairs. A key without `=` maps to "".
pub fn parse_search(query: &str) -> BTreeMap<String, String> {
	let query = query.strip_prefix('?').unwrap_or(query);
	query
		.split('&')
		.filter(|pair| !pair.is_empty())
		.map(|pair| {
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
			(super::pattern::decode(key), super::pattern::decode(value))
		})
		.collect()
}
