//! In-memory document model.
//!
//! - [`document`]: the arena-backed live tree
//! - [`node`]: node payloads and the owned template tree ([`VNode`])
//! - [`parser`]: markup to [`VNode`] conversion
//! - [`selector`]: CSS selector parsing and matching against live nodes
//! - [`attribute`]: the attribute role table used by the differ
//! - [`style`]: inline style declaration lists

pub mod attribute;
pub mod document;
pub mod node;
pub mod parser;
pub mod selector;
pub mod style;

pub use document::{Document, NodeId};
pub use node::{ElementData, NodeKind, PropertyValue, VElement, VNode};
pub use parser::parse_fragment;
pub use selector::Selector;
