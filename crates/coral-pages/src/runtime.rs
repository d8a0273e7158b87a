//! The handle every store, component and router is built from.

use std::rc::Rc;

use crate::config::PagesConfig;
use crate::host::Window;

/// A window plus the configuration that governs everything rendered into it.
///
/// Cloning is cheap and shares the window.
#[derive(Debug, Clone)]
pub struct Runtime {
	window: Rc<Window>,
	config: PagesConfig,
}

impl Runtime {
	/// Wraps a window.
	pub fn new(window: Window, config: PagesConfig) -> Self {
		Self {
			window: Rc::new(window),
			config,
		}
	}

	/// Shares an existing window.
	pub fn from_shared(window: Rc<Window>, config: PagesConfig) -> Self {
		Self { window, config }
	}

	/// The window.
	pub fn window(&self) -> &Rc<Window> {
		&self.window
	}

	/// The configuration.
	pub fn config(&self) -> &PagesConfig {
		&self.config
	}

	/// Runs queued tasks and animation frames until the window is idle.
	pub fn flush(&self) {
		self.window.flush();
	}
}
