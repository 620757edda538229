/// Errors raised while resolving a document type's store metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The type was never registered with [`register`](crate::register).
    #[error("document type {type_name} is not registered")]
    NotRegistered { type_name: &'static str },

    /// The registration does not name an identity field.
    #[error("document type {type_name} declares no identity field")]
    MissingIdentityField { type_name: &'static str },

    /// The registration has a blank collection or type name.
    #[error("document type {type_name} declares no store location")]
    MissingLocation { type_name: &'static str },

    /// The type was already registered with different metadata.
    #[error("document type {type_name} already registered with different metadata")]
    Conflict { type_name: &'static str },
}

/// All errors that can be returned by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The collection/type pair does not exist in the store.
    #[error("store location not found: {collection}/{type_name}")]
    LocationNotFound {
        collection: String,
        type_name: String,
    },

    /// A document body could not be encoded or decoded.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-specific failure (connection, cluster state, etc.).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// All errors that can be returned by a [`DocumentRepository`](crate::DocumentRepository).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// An absent document or identifier was passed where one is required.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A repository-specific failure.
    #[error("repository error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn invalid_argument(what: &str) -> Self {
        RepositoryError::InvalidArgument(format!("{what} must not be null"))
    }
}
