//! Client-side routing.
//!
//! - [`pattern`]: route URL compilation
//! - [`route`]: route definitions, resolved routes and the route table
//! - [`core`]: the [`Router`] and its navigation backends

pub mod core;
pub mod pattern;
pub mod route;

pub use self::core::{Navigation, Router, RouterOptions, TITLE_PLACEHOLDER, TitleTemplate};
pub use pattern::{RoutePattern, normalize};
pub use route::{ResolvedRoute, Route, RouteTable, parse_search};
