//! Reconciling a live subtree with a freshly parsed template.
//!
//! [`tree::patch_children`] walks both child lists positionally and delegates
//! per-element attribute work to [`attributes`].

pub mod attributes;
pub mod tree;

pub use attributes::{AttributePatch, AttributeValue};
pub use tree::{MountMarker, create_node, patch_children};
