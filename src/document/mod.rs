//! Media server configuration document subsystem.
//!
//! # Data Flow
//! ```text
//! Server.xml text
//!     → codec.rs (streaming parse into an ordered element tree)
//!     → model.rs (Document / Element / Node)
//!     → path.rs (dotted-path reads and edits)
//!     → summary.rs (well-known fields for display)
//!     → codec.rs (serialize back to text, compact or indented)
//! ```
//!
//! # Design Decisions
//! - The tree keeps element order and attribute order as written
//! - Repeated elements are plain sibling children, so a single `VirtualHost`
//!   and many `VirtualHost`s are read the same way
//! - Syntax validation streams events and never builds a tree

pub mod codec;
pub mod model;
pub mod path;
pub mod summary;

pub use codec::{parse, serialize, serialize_element, validate_syntax};
pub use model::{Attribute, Document, Element, Node};
pub use path::{get_path, set_path};
pub use summary::{extract_summary, ServerSummary};

use thiserror::Error;

/// Errors raised while reading or editing a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Malformed markup or invalid encoding.
    #[error("Error parsing XML: {0}")]
    Parse(String),

    /// A dotted path that cannot address anything in the document.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Serialization failed.
    #[error("Error converting document to XML: {0}")]
    Serialize(String),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
