//! Fixture loading: seeds the store directly, bypassing the repository.
//!
//! A fixture is an ordered list of documents that may mix several document
//! types sharing one physical collection. Loading wipes every touched
//! location (or creates it with its mapping), bulk-writes the documents under
//! their own identities, and refreshes before returning, so the first read of
//! the case already sees them.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;

use docket_store::{
    resolve, Document, DocumentMetadata, DocumentStore, Filter, KeyedDocument, Location,
};
use tracing::debug;

use crate::error::ConformanceError;

/// One fixture document, type-erased but remembering its concrete type.
#[derive(Debug, Clone)]
pub struct FixtureDocument {
    type_id: TypeId,
    metadata: Arc<DocumentMetadata>,
    id: String,
    source: serde_json::Value,
}

impl FixtureDocument {
    /// Capture a document together with its resolved metadata.
    ///
    /// The document must carry an identity; fixtures never rely on
    /// store-generated keys.
    pub fn of<T: Document>(document: &T) -> Result<Self, ConformanceError> {
        let metadata = resolve::<T>()?;
        let id = metadata.identity_of(document).ok_or_else(|| {
            ConformanceError::Setup(format!(
                "fixture document of {} has no identity",
                metadata.rust_type
            ))
        })?;
        let source = serde_json::to_value(document)
            .map_err(|e| ConformanceError::Setup(format!("cannot serialize fixture: {e}")))?;
        Ok(Self {
            type_id: TypeId::of::<T>(),
            metadata,
            id,
            source,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is<T: Document>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Ordered documents seeded before a test case.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    documents: Vec<FixtureDocument>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append documents of one type.
    pub fn with<T: Document>(
        mut self,
        documents: impl IntoIterator<Item = T>,
    ) -> Result<Self, ConformanceError> {
        for document in documents {
            self.documents.push(FixtureDocument::of(&document)?);
        }
        Ok(self)
    }

    pub fn documents(&self) -> &[FixtureDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of documents whose concrete type is `T`.
    pub fn count_of<T: Document>(&self) -> u64 {
        self.documents.iter().filter(|d| d.is::<T>()).count() as u64
    }
}

/// Locations touched by one load, handed back to [`FixtureLoader::teardown`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFixture {
    /// Loaded documents whose concrete type is the type under test.
    pub loaded_count: u64,
    pub locations: Vec<Location>,
}

/// Seeds the store for one test case at a time.
///
/// Assumes exclusive ownership of every location it touches for the
/// duration of the case.
pub struct FixtureLoader<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> FixtureLoader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Wipe-and-load `fixture`, with `T` as the type under test.
    ///
    /// `T`'s own location is always prepared, even when the fixture holds no
    /// document of that type.
    pub async fn load<T: Document>(&self, fixture: &Fixture) -> Result<LoadedFixture, ConformanceError> {
        let under_test = resolve::<T>()?;

        let mut groups: BTreeMap<Location, (Arc<DocumentMetadata>, Vec<KeyedDocument>)> =
            BTreeMap::new();
        groups.insert(under_test.location(), (Arc::clone(&under_test), Vec::new()));
        for document in fixture.documents() {
            groups
                .entry(document.metadata.location())
                .or_insert_with(|| (Arc::clone(&document.metadata), Vec::new()))
                .1
                .push(KeyedDocument {
                    id: document.id.clone(),
                    source: document.source.clone(),
                });
        }

        for (location, (metadata, documents)) in &groups {
            if self.store.location_exists(location).await? {
                self.store.delete_matching(location, &Filter::MatchAll).await?;
            } else {
                self.store.create_location(location, &metadata.mapping).await?;
            }
            if !documents.is_empty() {
                self.store.bulk_write(location, documents.clone()).await?;
            }
            self.store.refresh(location, true).await?;
            debug!(%location, documents = documents.len(), "fixture location loaded");
        }

        let loaded_count = fixture.count_of::<T>();
        debug!(
            rust_type = under_test.rust_type,
            loaded_count,
            total = fixture.len(),
            "fixture loaded"
        );
        Ok(LoadedFixture {
            loaded_count,
            locations: groups.into_keys().collect(),
        })
    }

    /// Release what the load held. Documents stay in place; the next load
    /// wipes them.
    pub async fn teardown(&self, loaded: LoadedFixture) -> Result<(), ConformanceError> {
        debug!(locations = loaded.locations.len(), "fixture torn down");
        Ok(())
    }
}
