use async_trait::async_trait;
use serde_json::Value;

use crate::document::Document;
use crate::error::{RepositoryError, StoreError};
use crate::page::{Page, PageRequest, Sort};
use crate::record::{Filter, Hit, KeyedDocument, Location, SearchRequest};

/// Low-level access to the underlying document store.
///
/// This is the path the conformance engine uses to seed fixtures and to
/// compute ground truth, bypassing the repository under test.
///
/// ## Visibility
///
/// Writes made by [`bulk_write`](Self::bulk_write) are not required to be
/// visible to [`search`](Self::search) or [`count`](Self::count) until
/// [`refresh`](Self::refresh) has been called for the location with
/// `wait = true`.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static`; the engine holds one
/// long-lived handle for the whole run.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Whether the location has been created.
    async fn location_exists(&self, location: &Location) -> Result<bool, StoreError>;

    /// Create the location and register its field mapping.
    async fn create_location(&self, location: &Location, mapping: &Value)
        -> Result<(), StoreError>;

    /// Delete every document at the location matching `filter`.
    async fn delete_matching(&self, location: &Location, filter: &Filter)
        -> Result<(), StoreError>;

    /// Write all documents in one bulk operation, each under its explicit key.
    /// Existing documents with the same key are replaced.
    async fn bulk_write(
        &self,
        location: &Location,
        documents: Vec<KeyedDocument>,
    ) -> Result<(), StoreError>;

    /// Make previous writes visible to reads. With `wait = true` the call
    /// returns only once the refresh has completed.
    async fn refresh(&self, location: &Location, wait: bool) -> Result<(), StoreError>;

    /// Search the location, optionally sorted and windowed.
    async fn search(
        &self,
        location: &Location,
        request: &SearchRequest,
    ) -> Result<Vec<Hit>, StoreError>;

    /// Number of visible documents at the location.
    async fn count(&self, location: &Location) -> Result<u64, StoreError>;
}

/// The repository abstraction certified by the CRUD conformance suite.
///
/// Arguments that the contract allows to be absent are `Option`s. Every
/// operation must reject `None` with [`RepositoryError::InvalidArgument`]
/// and leave the store untouched.
#[async_trait]
pub trait DocumentRepository<T: Document>: Send + Sync {
    /// Index a single document, inserting or replacing it.
    async fn index(&self, document: Option<T>) -> Result<T, RepositoryError>;

    /// Save a single document, inserting or replacing it.
    async fn save(&self, document: Option<T>) -> Result<T, RepositoryError>;

    /// Save a batch atomically. A batch holding any `None` is rejected as a
    /// whole, with nothing written.
    async fn save_all(&self, documents: Vec<Option<T>>) -> Result<Vec<T>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<T>, RepositoryError>;

    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<T>, RepositoryError>;

    async fn find_all_sorted(&self, sort: &Sort) -> Result<Vec<T>, RepositoryError>;

    async fn find_all_paged(&self, page: &PageRequest) -> Result<Page<T>, RepositoryError>;

    /// `Ok(None)` when no document has the identifier.
    async fn find_by_id(&self, id: Option<&str>) -> Result<Option<T>, RepositoryError>;

    async fn exists_by_id(&self, id: Option<&str>) -> Result<bool, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;

    async fn delete_all(&self) -> Result<(), RepositoryError>;

    /// Delete every document whose identifier is listed. Unknown identifiers
    /// are ignored.
    async fn delete_all_by_id(&self, ids: &[String]) -> Result<(), RepositoryError>;

    /// Delete every listed document. Documents not in the store are ignored.
    async fn delete_all_of(&self, documents: &[T]) -> Result<(), RepositoryError>;

    /// Delete one document; a document not in the store is a no-op.
    async fn delete(&self, document: Option<&T>) -> Result<(), RepositoryError>;

    /// Delete by identifier; an unknown identifier is a no-op.
    async fn delete_by_id(&self, id: Option<&str>) -> Result<(), RepositoryError>;
}
