//! State management: the [`Store`] and its snapshot helpers.

pub mod snapshot;
pub mod store;

pub use snapshot::{escape_html, snapshot};
pub use store::{Getter, Setter, Store, StoreBuilder};
