//! The host environment the engine renders into.
//!
//! [`Window`] stands in for a browser window: it owns the [`Document`],
//! session history, event listeners, a task queue for `popstate` and
//! `hashchange`, and the animation-frame queue the store debounces renders
//! on. Everything is single-threaded and driven explicitly.
//!
//! [`Document`]: crate::dom::Document

pub mod event;
pub mod history;
pub mod window;

pub use event::{Event, EventDetail, EventTarget, Modifiers};
pub use history::{History, HistoryEntry};
pub use window::{FrameHandle, ListenerId, Window, WindowBuilder};
