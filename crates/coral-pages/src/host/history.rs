//! Session history.

use serde_json::Value;
use url::Url;

/// One history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
	/// Absolute URL.
	pub url: Url,
	/// State attached by `push_state`/`replace_state`.
	pub state: Option<Value>,
}

/// Entry stack with a cursor.
#[derive(Debug, Clone)]
pub struct History {
	entries: Vec<HistoryEntry>,
	index: usize,
}

impl History {
	pub(crate) fn new(url: Url) -> Self {
		Self {
			entries: vec![HistoryEntry { url, state: None }],
			index: 0,
		}
	}

	/// The active entry.
	pub fn current(&self) -> &HistoryEntry {
		&self.entries[self.index]
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Always false: history starts with the initial entry.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Position of the active entry.
	pub fn index(&self) -> usize {
		self.index
	}

	/// Drops forward entries and appends a new active one.
	pub(crate) fn push(&mut self, url: Url, state: Option<Value>) {
		self.entries.truncate(self.index + 1);
		self.entries.push(HistoryEntry { url, state });
		self.index = self.entries.len() - 1;
	}

	/// Overwrites the active entry.
	pub(crate) fn replace(&mut self, url: Url, state: Option<Value>) {
		self.entries[self.index] = HistoryEntry { url, state };
	}

	/// Moves the cursor. Returns the entry left and the entry entered, or
	/// `None` when the target is out of range or `delta` is zero.
	pub(crate) fn traverse(&mut self, delta: isize) -> Option<(HistoryEntry, HistoryEntry)> {
		if delta == 0 {
			return None;
		}
		let target = self.index.checked_add_signed(delta)?;
		if target >= self.entries.len() {
			return None;
		}
		let left = self.entries[self.index].clone();
		self.index = target;
		Some((left, self.entries[target].clone()))
	}
}
