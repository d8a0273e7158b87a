//! Coral Pages - reactive store, tree-diff renderer and URL router
//!
//! The engine behind Coral single-page applications. Markup produced by
//! template functions is parsed into a virtual tree and reconciled with the
//! live document; state lives in a store that batches renders onto animation
//! frames; a router maps the location to routes and re-renders on navigation.
//!
//! ## Architecture
//!
//! - [`host`]: the in-memory window (document, history, events, frames)
//! - [`dom`]: the document tree, template parser and selectors
//! - [`diff`]: positional tree patching and attribute diffing
//! - [`reactive`]: the [`Store`] and data snapshots
//! - [`component`]: templates bound to mount points
//! - [`router`]: route patterns, resolution and navigation
//! - [`config`]: construction-time settings, including the debug switch
//!
//! ## Example
//!
//! ```
//! use coral_pages::prelude::*;
//! use serde_json::json;
//!
//! let window = Window::builder("http://localhost/")
//!     .body(r#"<div id="app"></div>"#)
//!     .build()
//!     .unwrap();
//! let runtime = Runtime::new(window, PagesConfig::development());
//!
//! let store = Store::builder(json!({"count": 0}))
//!     .setter("increment", |state, _| {
//!         let next = state["count"].as_i64().unwrap_or_default() + 1;
//!         state["count"] = json!(next);
//!     })
//!     .build(&runtime);
//!
//! let counter = Component::builder("#app")
//!     .template(|data, _| format!("<p>Count: {}</p>", data["count"]))
//!     .store(&store)
//!     .build(&runtime)
//!     .unwrap();
//! counter.render().unwrap();
//!
//! store.dispatch("increment", &[]).unwrap();
//! store.dispatch("increment", &[]).unwrap();
//! runtime.flush();
//!
//! let doc = runtime.window().document();
//! let app = doc.get_element_by_id("app").unwrap();
//! assert_eq!(doc.inner_html(app), "<p>Count: 2</p>");
//! assert_eq!(counter.render_count(), 2);
//! ```

pub mod component;
pub mod config;
pub mod diff;
pub mod dom;
pub mod error;
pub mod host;
pub mod prelude;
pub mod reactive;
pub mod router;
pub mod runtime;

pub use component::{Component, ComponentBuilder, IntoMarkup, MountTarget, Template};
pub use config::PagesConfig;
pub use error::{OperationKind, PagesError, Result};
pub use host::{Event, EventDetail, EventTarget, Window};
pub use reactive::{Store, StoreBuilder};
pub use router::{Navigation, ResolvedRoute, Route, Router, RouterOptions, TitleTemplate};
pub use runtime::Runtime;
