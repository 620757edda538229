//! Contracts certified by the docket conformance engine.
//!
//! - [`Document`] and the metadata registry ([`register`], [`resolve`])
//! - [`DocumentStore`]: low-level access to the underlying store
//! - [`DocumentRepository`]: the repository abstraction under test
//! - paging and sorting types shared by all of the above

mod document;
mod error;
mod metadata;
mod page;
mod record;
mod traits;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use document::Document;
pub use error::{MetadataError, RepositoryError, StoreError};
pub use metadata::{register, resolve, DocumentMetadata, DocumentRegistration};
pub use page::{last_page_index, page_count, Direction, Page, PageRequest, Sort};
pub use record::{Filter, Hit, KeyedDocument, Location, SearchRequest};
pub use traits::{DocumentRepository, DocumentStore};
