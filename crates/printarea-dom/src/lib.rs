//! printarea-dom - Element trees for the print pipeline
//!
//! This crate provides the in-memory HTML representation used by printarea:
//! an arena of nodes addressed by [`NodeId`], a permissive loader built on
//! html5ever, and a serializer.
//!
//! # Example
//!
//! ```
//! use printarea_dom::{load_fragment, to_html};
//!
//! let loaded = load_fragment("<p>Hello <b>world</p>");
//! assert_eq!(to_html(&loaded.document), "<p>Hello <b>world</b></p>");
//! ```

pub mod error;
pub mod loader;
pub mod serialize;
pub mod tree;

pub use error::{DomError, Result};
pub use loader::{load_document, load_fragment, LoadOutcome, Loaded};
pub use serialize::{inner_html, outer_html, to_html, VISUALLY_HIDDEN_CLASS};
pub use tree::{heading_level, Attributes, Document, Element, NodeId, NodeKind, Role};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
