//! # Coral
//!
//! A small client-side UI runtime: a reactive store, a tree-diff renderer,
//! components bound to mount points and a URL router.
//!
//! This crate re-exports the workspace members under one name.
//!
//! ## Feature Flags
//!
//! - `dashboard` (default) - the job scheduler dashboard layer
//!
//! ## Quick Example
//!
//! ```
//! use coral::prelude::*;
//!
//! let window = Window::builder("http://localhost/")
//!     .body(r#"<main id="app"></main>"#)
//!     .build()
//!     .unwrap();
//! let runtime = Runtime::new(window, PagesConfig::development());
//!
//! let hello = Component::builder("#app")
//!     .static_template("<h1>Hello</h1>")
//!     .build(&runtime)
//!     .unwrap();
//! hello.render().unwrap();
//! assert_eq!(hello.render_count(), 1);
//! ```

pub use coral_pages as pages;

#[cfg(feature = "dashboard")]
pub use coral_dashboard as dashboard;

/// Common imports for Coral applications.
pub mod prelude {
	pub use coral_pages::prelude::*;

	#[cfg(feature = "dashboard")]
	pub use coral_dashboard::{Actions, HttpJobsApi, JobsApi, dashboard_store};
}
