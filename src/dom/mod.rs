//! Document tree model shared by every normalization stage.
//!
//! ## Layout
//!
//! - [`node`]      — arena storage, [`NodeId`] handles, mutation primitives
//!   (detach, insert-before/after, unwrap, decompose) and the
//!   whitespace-skipping "significant node" lookups
//! - [`role`]      — closed [`Role`] enumeration resolved from the tag name
//! - [`parse`]     — html5ever-backed parsing into a [`Fragment`]
//! - [`serialize`] — back to markup
//! - [`style`]     — inline `style` declaration matching

pub mod node;
pub mod parse;
pub mod role;
pub mod serialize;
pub mod style;

pub use node::{Element, Fragment, NodeId, NodeKind};
pub use role::{Role, TextStyle};
pub use style::StyleDeclaration;

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
