use docket_store::{MetadataError, RepositoryError, StoreError};

/// Everything that can make a conformance scenario fail.
///
/// Setup errors abort the current case only; the scenario boundary turns
/// any of these into the case's single failure message.
#[derive(Debug, thiserror::Error)]
pub enum ConformanceError {
    /// The document type's metadata cannot be resolved. Aborts suite setup.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A store hit cannot be bound back to the document's identity field.
    #[error("cannot bind identity {id:?} to field `{field}` of {rust_type}: {reason}")]
    IdentityBinding {
        rust_type: &'static str,
        field: String,
        id: String,
        reason: String,
    },

    /// Expected and actual values differ.
    #[error("{context}: expected {expected}, got {actual}")]
    Assertion {
        context: String,
        expected: String,
        actual: String,
    },

    /// The HTTP boundary answered with an unexpected status code.
    #[error("{context}: expected HTTP {expected}, got {actual}; body: {body}")]
    HttpStatusMismatch {
        context: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("direct store call failed: {0}")]
    Store(#[from] StoreError),

    #[error("repository call failed: {0}")]
    Repository(#[from] RepositoryError),

    /// Transport-level HTTP failure (connection refused, timeout, bad body).
    #[error("http request failed: {0}")]
    Http(String),

    #[error("fixture setup failed: {0}")]
    Setup(String),

    #[error("invalid suite configuration: {0}")]
    Config(String),
}
