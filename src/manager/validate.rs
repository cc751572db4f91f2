//! Semantic validation of a media server configuration document.

use thiserror::Error;

use crate::document::{self, Document};

/// Root element every configuration must have.
pub const ROOT_ELEMENT: &str = "Server";

/// Why a document was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("XML validation error: {0}")]
    Syntax(String),

    #[error("Missing required '{}' root element", ROOT_ELEMENT)]
    MissingRoot,

    #[error("Missing server version attribute")]
    MissingVersion,

    #[error("Missing 'Bind' section in configuration")]
    MissingBind,
}

/// Check a document before it may replace the live configuration.
///
/// The serialized form must be well-formed, the root must be `<Server>`
/// with a `version` attribute, and it must contain a `<Bind>` section.
pub fn validate_document(doc: &Document) -> Result<(), ValidationError> {
    let text = document::serialize(doc, false).map_err(|e| ValidationError::Syntax(e.to_string()))?;
    document::validate_syntax(&text).map_err(|e| ValidationError::Syntax(e.to_string()))?;

    let root = &doc.root;
    if root.name != ROOT_ELEMENT {
        return Err(ValidationError::MissingRoot);
    }
    if root.attribute("version").is_none() {
        return Err(ValidationError::MissingVersion);
    }
    if root.child("Bind").is_none() {
        return Err(ValidationError::MissingBind);
    }
    Ok(())
}
