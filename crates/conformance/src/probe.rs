//! Direct store probe: the ground truth every scenario compares against.
//!
//! The probe talks to the [`DocumentStore`] directly, never through the
//! repository under test. Store hits carry their key beside the body, so
//! every conversion injects the key into the document's identity field
//! before decoding.

use std::marker::PhantomData;
use std::sync::Arc;

use docket_store::{
    resolve, Document, DocumentMetadata, DocumentStore, Hit, PageRequest, SearchRequest, Sort,
};
use serde_json::Value;
use tracing::debug;

use crate::error::ConformanceError;

pub struct StoreProbe<S, T> {
    store: Arc<S>,
    metadata: Arc<DocumentMetadata>,
    default_page_size: usize,
    _document: PhantomData<fn() -> T>,
}

impl<S: DocumentStore, T: Document> StoreProbe<S, T> {
    pub fn new(store: Arc<S>, default_page_size: usize) -> Result<Self, ConformanceError> {
        Ok(Self {
            store,
            metadata: resolve::<T>()?,
            default_page_size,
            _document: PhantomData,
        })
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub async fn count(&self) -> Result<u64, ConformanceError> {
        Ok(self.store.count(&self.metadata.location()).await?)
    }

    /// Every document of the type, in storage order.
    pub async fn find_all(&self) -> Result<Vec<T>, ConformanceError> {
        let total = self.count().await? as usize;
        self.search(SearchRequest::all().window(0, total)).await
    }

    /// One unsorted page, in storage order.
    pub async fn find_all_paged(&self, page: &PageRequest) -> Result<Vec<T>, ConformanceError> {
        self.search(SearchRequest::all().window(page.offset(), page.size))
            .await
    }

    /// Documents sorted on `sort`, windowed by `page` or by the default page
    /// size from the first document. Any sort carried by `page` is ignored in
    /// favour of `sort`.
    pub async fn find_all_sorted(
        &self,
        sort: &Sort,
        page: Option<&PageRequest>,
    ) -> Result<Vec<T>, ConformanceError> {
        let (from, size) = page.map_or((0, self.default_page_size), |p| (p.offset(), p.size));
        self.search(SearchRequest::all().sorted(sort.clone()).window(from, size))
            .await
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<T>, ConformanceError> {
        let location = self.metadata.location();
        let hits = self.store.search(&location, &request).await?;
        debug!(
            %location,
            from = ?request.from,
            size = ?request.size,
            hits = hits.len(),
            "probe search"
        );
        hits.into_iter().map(|hit| self.bind(hit)).collect()
    }

    /// Decode a hit, injecting its key into the identity field.
    pub fn bind(&self, hit: Hit) -> Result<T, ConformanceError> {
        bind_identity(&self.metadata, hit)
    }
}

/// Decode a store hit into `T` with the store key bound to the identity
/// field. Fails if the body is not an object, if the bound body does not
/// decode, or if the decoded identity differs from the key.
pub fn bind_identity<T: Document>(
    metadata: &DocumentMetadata,
    hit: Hit,
) -> Result<T, ConformanceError> {
    let binding_error = |id: &str, reason: String| ConformanceError::IdentityBinding {
        rust_type: metadata.rust_type,
        field: metadata.identity_field.clone(),
        id: id.to_string(),
        reason,
    };

    let Hit { id, source } = hit;
    let mut body = match source {
        Value::Object(fields) => fields,
        other => {
            return Err(binding_error(
                &id,
                format!("document body is not an object: {other}"),
            ))
        }
    };
    body.insert(metadata.identity_field.clone(), Value::String(id.clone()));

    let document: T = serde_json::from_value(Value::Object(body))
        .map_err(|e| binding_error(&id, e.to_string()))?;
    match metadata.identity_of(&document) {
        Some(bound) if bound == id => Ok(document),
        other => Err(binding_error(
            &id,
            format!("identity accessor reads {other:?} after binding"),
        )),
    }
}
