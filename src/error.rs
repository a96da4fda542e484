//! Structured error types for the Folio rendering engine.
//!
//! The document is deterministic input, so every failure here is a hard
//! failure of the job — there is nothing transient to retry.

use thiserror::Error;

/// Result type alias for folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;

/// The unified error type returned by all public Folio API functions.
#[derive(Error, Debug)]
pub enum FolioError {
    /// A construct is missing an attribute it cannot be rendered without,
    /// e.g. a table without `lineheight` or a circle without `radX`.
    #[error("<{node}> is missing required attribute '{attr}'")]
    MissingAttribute { node: String, attr: String },

    /// An attribute that must be numeric failed to parse.
    #[error("<{node}> attribute '{attr}' is not a number: '{value}'")]
    InvalidNumber {
        node: String,
        attr: String,
        value: String,
    },

    /// The document tree violates structural expectations, e.g. a table
    /// without a `columns` or `data` block.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// XML input failed to parse.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON input failed to parse as a document tree.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_node_and_attribute() {
        let err = FolioError::MissingAttribute {
            node: "table".to_string(),
            attr: "lineheight".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "<table> is missing required attribute 'lineheight'"
        );

        let err = FolioError::InvalidNumber {
            node: "circle".to_string(),
            attr: "radX".to_string(),
            value: "wide".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "<circle> attribute 'radX' is not a number: 'wide'"
        );
    }
}
