//! In-memory store and a reference repository built on top of any
//! [`DocumentStore`].
//!
//! Both exist to exercise the conformance engine; the store keeps nothing
//! beyond the process. Like a search-engine backed store, writes land in a
//! pending buffer and only become visible to reads after
//! [`refresh`](DocumentStore::refresh).

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::Document;
use crate::error::{MetadataError, RepositoryError, StoreError};
use crate::metadata::{resolve, DocumentMetadata};
use crate::page::{Page, PageRequest, Sort};
use crate::record::{Filter, Hit, KeyedDocument, Location, SearchRequest};
use crate::traits::{DocumentRepository, DocumentStore};

/// Number of hits returned by a search that does not ask for a size.
pub const DEFAULT_SEARCH_SIZE: usize = 10;

#[derive(Debug, Default)]
struct LocationState {
    mapping: Value,
    visible: BTreeMap<String, Value>,
    pending: BTreeMap<String, Value>,
}

/// In-memory [`DocumentStore`] with an explicit refresh barrier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    locations: RwLock<HashMap<Location, LocationState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field mapping registered for a location, if it exists.
    pub async fn mapping(&self, location: &Location) -> Option<Value> {
        self.locations
            .read()
            .await
            .get(location)
            .map(|state| state.mapping.clone())
    }

    /// Number of written documents still waiting for a refresh.
    pub async fn pending(&self, location: &Location) -> usize {
        self.locations
            .read()
            .await
            .get(location)
            .map_or(0, |state| state.pending.len())
    }
}

fn not_found(location: &Location) -> StoreError {
    StoreError::LocationNotFound {
        collection: location.collection.clone(),
        type_name: location.type_name.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn location_exists(&self, location: &Location) -> Result<bool, StoreError> {
        Ok(self.locations.read().await.contains_key(location))
    }

    async fn create_location(
        &self,
        location: &Location,
        mapping: &Value,
    ) -> Result<(), StoreError> {
        let mut locations = self.locations.write().await;
        let state = locations.entry(location.clone()).or_default();
        state.mapping = mapping.clone();
        Ok(())
    }

    async fn delete_matching(
        &self,
        location: &Location,
        filter: &Filter,
    ) -> Result<(), StoreError> {
        let mut locations = self.locations.write().await;
        let state = locations
            .get_mut(location)
            .ok_or_else(|| not_found(location))?;
        state.visible.retain(|key, _| !filter.matches(key));
        state.pending.retain(|key, _| !filter.matches(key));
        Ok(())
    }

    async fn bulk_write(
        &self,
        location: &Location,
        documents: Vec<KeyedDocument>,
    ) -> Result<(), StoreError> {
        let mut locations = self.locations.write().await;
        let state = locations.entry(location.clone()).or_default();
        for document in documents {
            state.pending.insert(document.id, document.source);
        }
        Ok(())
    }

    async fn refresh(&self, location: &Location, _wait: bool) -> Result<(), StoreError> {
        let mut locations = self.locations.write().await;
        let state = locations
            .get_mut(location)
            .ok_or_else(|| not_found(location))?;
        let pending = std::mem::take(&mut state.pending);
        state.visible.extend(pending);
        Ok(())
    }

    async fn search(
        &self,
        location: &Location,
        request: &SearchRequest,
    ) -> Result<Vec<Hit>, StoreError> {
        let locations = self.locations.read().await;
        let state = locations.get(location).ok_or_else(|| not_found(location))?;
        let mut hits: Vec<Hit> = state
            .visible
            .iter()
            .map(|(id, source)| Hit {
                id: id.clone(),
                source: source.clone(),
            })
            .collect();
        if let Some(sort) = &request.sort {
            hits.sort_by(|a, b| sort.compare((&a.id, &a.source), (&b.id, &b.source)));
        }
        Ok(hits
            .into_iter()
            .skip(request.from.unwrap_or(0))
            .take(request.size.unwrap_or(DEFAULT_SEARCH_SIZE))
            .collect())
    }

    async fn count(&self, location: &Location) -> Result<u64, StoreError> {
        let locations = self.locations.read().await;
        let state = locations.get(location).ok_or_else(|| not_found(location))?;
        Ok(state.visible.len() as u64)
    }
}

/// Reference [`DocumentRepository`] over any [`DocumentStore`].
///
/// Every write is followed by a waiting refresh, so the repository reads its
/// own writes.
pub struct StoreRepository<S, T> {
    store: Arc<S>,
    metadata: Arc<DocumentMetadata>,
    _document: PhantomData<fn() -> T>,
}

impl<S: DocumentStore, T: Document> StoreRepository<S, T> {
    pub fn new(store: Arc<S>) -> Result<Self, MetadataError> {
        Ok(Self {
            store,
            metadata: resolve::<T>()?,
            _document: PhantomData,
        })
    }

    fn location(&self) -> Location {
        self.metadata.location()
    }

    fn keyed(&self, document: &T) -> Result<KeyedDocument, RepositoryError> {
        let id = document
            .id()
            .ok_or_else(|| RepositoryError::invalid_argument("document identity"))?;
        let source = serde_json::to_value(document).map_err(StoreError::from)?;
        Ok(KeyedDocument { id, source })
    }

    fn to_document(&self, hit: Hit) -> Result<T, RepositoryError> {
        let mut source = hit.source;
        if let Value::Object(fields) = &mut source {
            fields.insert(self.metadata.identity_field.clone(), Value::String(hit.id));
        }
        Ok(serde_json::from_value(source).map_err(StoreError::from)?)
    }

    async fn write(&self, documents: Vec<KeyedDocument>) -> Result<(), RepositoryError> {
        let location = self.location();
        self.store.bulk_write(&location, documents).await?;
        self.store.refresh(&location, true).await?;
        Ok(())
    }

    async fn search_all(&self, sort: Option<Sort>) -> Result<Vec<T>, RepositoryError> {
        let location = self.location();
        let total = self.store.count(&location).await? as usize;
        let mut request = SearchRequest::all().window(0, total);
        request.sort = sort;
        self.store
            .search(&location, &request)
            .await?
            .into_iter()
            .map(|hit| self.to_document(hit))
            .collect()
    }

    async fn remove(&self, filter: Filter) -> Result<(), RepositoryError> {
        let location = self.location();
        self.store.delete_matching(&location, &filter).await?;
        self.store.refresh(&location, true).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore, T: Document> DocumentRepository<T> for StoreRepository<S, T> {
    async fn index(&self, document: Option<T>) -> Result<T, RepositoryError> {
        self.save(document).await
    }

    async fn save(&self, document: Option<T>) -> Result<T, RepositoryError> {
        let document = document.ok_or_else(|| RepositoryError::invalid_argument("document"))?;
        self.write(vec![self.keyed(&document)?]).await?;
        Ok(document)
    }

    async fn save_all(&self, documents: Vec<Option<T>>) -> Result<Vec<T>, RepositoryError> {
        let documents = documents
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| RepositoryError::invalid_argument("document in batch"))?;
        let keyed = documents
            .iter()
            .map(|document| self.keyed(document))
            .collect::<Result<Vec<_>, _>>()?;
        self.write(keyed).await?;
        Ok(documents)
    }

    async fn find_all(&self) -> Result<Vec<T>, RepositoryError> {
        self.search_all(None).await
    }

    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<T>, RepositoryError> {
        let mut found = self.search_all(None).await?;
        found.retain(|document| document.id().is_some_and(|id| ids.contains(&id)));
        Ok(found)
    }

    async fn find_all_sorted(&self, sort: &Sort) -> Result<Vec<T>, RepositoryError> {
        self.search_all(Some(sort.clone())).await
    }

    async fn find_all_paged(&self, page: &PageRequest) -> Result<Page<T>, RepositoryError> {
        let location = self.location();
        let total_elements = self.store.count(&location).await?;
        let mut request = SearchRequest::all().window(page.offset(), page.size);
        request.sort = page.sort.clone();
        let content = self
            .store
            .search(&location, &request)
            .await?
            .into_iter()
            .map(|hit| self.to_document(hit))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            content,
            number: page.page,
            size: page.size,
            total_elements,
        })
    }

    async fn find_by_id(&self, id: Option<&str>) -> Result<Option<T>, RepositoryError> {
        let id = id.ok_or_else(|| RepositoryError::invalid_argument("id"))?;
        let found = self.search_all(None).await?;
        Ok(found
            .into_iter()
            .find(|document| document.id().as_deref() == Some(id)))
    }

    async fn exists_by_id(&self, id: Option<&str>) -> Result<bool, RepositoryError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.store.count(&self.location()).await?)
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        self.remove(Filter::MatchAll).await
    }

    async fn delete_all_by_id(&self, ids: &[String]) -> Result<(), RepositoryError> {
        self.remove(Filter::Ids(ids.to_vec())).await
    }

    async fn delete_all_of(&self, documents: &[T]) -> Result<(), RepositoryError> {
        let ids = documents.iter().filter_map(|document| document.id()).collect();
        self.remove(Filter::Ids(ids)).await
    }

    async fn delete(&self, document: Option<&T>) -> Result<(), RepositoryError> {
        let document = document.ok_or_else(|| RepositoryError::invalid_argument("document"))?;
        let id = document
            .id()
            .ok_or_else(|| RepositoryError::invalid_argument("document identity"))?;
        self.remove(Filter::Ids(vec![id])).await
    }

    async fn delete_by_id(&self, id: Option<&str>) -> Result<(), RepositoryError> {
        let id = id.ok_or_else(|| RepositoryError::invalid_argument("id"))?;
        self.remove(Filter::Ids(vec![id.to_string()])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{register, DocumentRegistration};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        rank: i64,
    }

    impl Document for Note {
        fn id(&self) -> Option<String> {
            self.key.clone()
        }
    }

    fn note(key: &str, rank: i64) -> Note {
        Note {
            key: Some(key.to_string()),
            rank,
        }
    }

    fn repository(store: &Arc<MemoryStore>) -> StoreRepository<MemoryStore, Note> {
        register::<Note>(DocumentRegistration::new("memos", "note").identity_field("key"))
            .unwrap();
        StoreRepository::new(Arc::clone(store)).unwrap()
    }

    #[tokio::test]
    async fn writes_are_invisible_until_refresh() {
        let store = MemoryStore::new();
        let location = Location::new("memos", "note");
        store.create_location(&location, &json!({})).await.unwrap();
        store
            .bulk_write(
                &location,
                vec![KeyedDocument {
                    id: "a".into(),
                    source: json!({"rank": 1}),
                }],
            )
            .await
            .unwrap();

        assert_eq!(store.count(&location).await.unwrap(), 0);
        assert_eq!(store.pending(&location).await, 1);

        store.refresh(&location, true).await.unwrap();
        assert_eq!(store.count(&location).await.unwrap(), 1);
        assert_eq!(store.pending(&location).await, 0);
    }

    #[tokio::test]
    async fn search_applies_sort_and_window() {
        let store = MemoryStore::new();
        let location = Location::new("memos", "note");
        let documents = (0..5)
            .map(|i| KeyedDocument {
                id: format!("k{i}"),
                source: json!({"rank": 10 - i}),
            })
            .collect();
        store.bulk_write(&location, documents).await.unwrap();
        store.refresh(&location, true).await.unwrap();

        let hits = store
            .search(
                &location,
                &SearchRequest::all().sorted(Sort::asc("rank")).window(1, 2),
            )
            .await
            .unwrap();
        let ids: Vec<_> = hits.into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["k3", "k2"]);
    }

    #[tokio::test]
    async fn search_without_size_uses_default() {
        let store = MemoryStore::new();
        let location = Location::new("memos", "note");
        let documents = (0..DEFAULT_SEARCH_SIZE + 3)
            .map(|i| KeyedDocument {
                id: format!("{i:03}"),
                source: json!({}),
            })
            .collect();
        store.bulk_write(&location, documents).await.unwrap();
        store.refresh(&location, true).await.unwrap();

        let hits = store.search(&location, &SearchRequest::all()).await.unwrap();
        assert_eq!(hits.len(), DEFAULT_SEARCH_SIZE);
    }

    #[tokio::test]
    async fn missing_location_is_an_error() {
        let store = MemoryStore::new();
        let err = store
            .count(&Location::new("nowhere", "nothing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LocationNotFound { .. }));
    }

    #[tokio::test]
    async fn repository_injects_identity_from_hit_key() {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(&store);
        store
            .bulk_write(
                &Location::new("memos", "note"),
                vec![KeyedDocument {
                    id: "n1".into(),
                    source: json!({"rank": 3}),
                }],
            )
            .await
            .unwrap();
        store
            .refresh(&Location::new("memos", "note"), true)
            .await
            .unwrap();

        let found = repo.find_by_id(Some("n1")).await.unwrap();
        assert_eq!(found, Some(note("n1", 3)));
    }

    #[tokio::test]
    async fn repository_rejects_batch_with_absent_document() {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(&store);
        repo.save(Some(note("a", 1))).await.unwrap();

        let err = repo
            .save_all(vec![Some(note("b", 2)), None])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidArgument(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn repository_pages_sorted_results() {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(&store);
        repo.save_all((1..=5).map(|i| Some(note(&format!("n{i}"), i))).collect())
            .await
            .unwrap();

        let page = repo
            .find_all_paged(&PageRequest::new(2, 2).with_sort(Sort::desc("rank")))
            .await
            .unwrap();
        assert_eq!(page.content, vec![note("n1", 1)]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn repository_delete_of_unknown_id_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(&store);
        repo.save(Some(note("a", 1))).await.unwrap();
        repo.delete_by_id(Some("zzz")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(matches!(
            repo.delete_by_id(None).await,
            Err(RepositoryError::InvalidArgument(_))
        ));
    }
}
