//! Common imports for applications built on Coral Pages.

pub use crate::component::{Component, IntoMarkup, MountTarget};
pub use crate::config::PagesConfig;
pub use crate::error::{PagesError, Result};
pub use crate::host::{Event, EventDetail, EventTarget, Modifiers, Window, event};
pub use crate::reactive::Store;
pub use crate::router::{Navigation, ResolvedRoute, Route, Router, RouterOptions};
pub use crate::runtime::Runtime;
