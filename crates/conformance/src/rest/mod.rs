//! HTTP resource conformance suite.
//!
//! Same orchestration as the repository suite, with the resource endpoints as
//! the system under test:
//!
//! - `POST /{resource}` (Create)
//! - `GET /{resource}/{id}` (FindOne)
//! - `GET /{resource}?sort=&page=&size=` (FindAll, FindAllPageable)
//! - `PUT` and `PATCH /{resource}/{id}` (Update, Patch)
//! - `DELETE /{resource}/{id}` and `DELETE /{resource}` (Delete, DeleteById, DeleteAll)
//!
//! Ground truth still comes from the direct store probe.

mod client;
mod create;
mod delete;
mod envelope;
mod read;
mod update;

pub use client::{HttpResourceClient, HttpResponse, Method, ResourceClient};
pub use envelope::{
    expected_page_links, ErrorReport, Link, PageMetadata, PagedResources, Resource,
    ValidationError,
};

use std::sync::Arc;

use docket_store::{resolve, Document, DocumentMetadata, DocumentStore};
use serde_json::Value;
use tracing::info;

use crate::config::{RestConfig, SuiteConfig};
use crate::context::{identity, CaseRunner, SuiteContext};
use crate::crud::CrudFixture;
use crate::error::ConformanceError;
use crate::probe::StoreProbe;
use crate::report::ConformanceReport;
use crate::selector::{RestCategory, Selection};

/// A body the server must reject, and the errors it must report, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidDocument {
    pub body: Value,
    pub errors: Vec<ValidationError>,
}

/// Test data for one resource.
pub trait RestFixture<T: Document>: CrudFixture<T> {
    /// Path segment of the collection, e.g. `books`.
    fn resource(&self) -> String;

    fn invalid_document(&self) -> InvalidDocument;

    /// Partial body sent with `PATCH` to the identity of
    /// [`updated_document`](CrudFixture::updated_document).
    fn patch(&self) -> Value;
}

/// The resource suite for document type `T` over store `S`.
pub struct RestSuite<T: Document, S: DocumentStore> {
    context: SuiteContext<S>,
    client: Arc<dyn ResourceClient>,
    fixture: Arc<dyn RestFixture<T>>,
    metadata: Arc<DocumentMetadata>,
    selection: Selection<RestCategory>,
}

impl<T: Document, S: DocumentStore> RestSuite<T, S> {
    pub fn new(
        store: Arc<S>,
        client: impl ResourceClient + 'static,
        fixture: impl RestFixture<T> + 'static,
    ) -> Result<Self, ConformanceError> {
        Ok(Self {
            context: SuiteContext::new(store),
            client: Arc::new(client),
            fixture: Arc::new(fixture),
            metadata: resolve::<T>()?,
            selection: Selection::all(),
        })
    }

    /// Build the suite with an [`HttpResourceClient`] pointed at
    /// `config.rest.base_url`.
    pub fn from_config(
        store: Arc<S>,
        fixture: impl RestFixture<T> + 'static,
        config: SuiteConfig,
    ) -> Result<Self, ConformanceError> {
        let client = HttpResourceClient::from_config(&config.rest)?;
        Ok(Self::new(store, client, fixture)?.with_config(config))
    }

    /// Use `config`, including its category selection.
    pub fn with_config(mut self, config: SuiteConfig) -> Self {
        self.selection = config.rest_selection();
        self.context = self.context.with_config(config);
        self
    }

    pub fn with_categories(mut self, selection: Selection<RestCategory>) -> Self {
        self.selection = selection;
        self
    }

    pub async fn run(&self) -> ConformanceReport {
        self.run_where(&|_| true).await
    }

    pub async fn run_category(&self, category: RestCategory) -> ConformanceReport {
        self.run_where(&|c| c == Some(category)).await
    }

    async fn run_where(&self, include: &dyn Fn(Option<RestCategory>) -> bool) -> ConformanceReport {
        info!(
            rust_type = self.metadata.rust_type,
            resource = %self.fixture.resource(),
            base_url = self.client.base_url(),
            "running resource conformance suite"
        );

        let build = || self.fixture.fixture();
        let mut runner: CaseRunner<'_, S, T, RestCategory> =
            CaseRunner::new(self.context.loader(), &build, &self.selection, include);

        create::run(self, &mut runner).await;
        read::run(self, &mut runner).await;
        update::run(self, &mut runner).await;
        delete::run(self, &mut runner).await;

        runner.finish()
    }

    fn probe(&self) -> Result<StoreProbe<S, T>, ConformanceError> {
        self.context.probe()
    }

    fn rest(&self) -> &RestConfig {
        &self.context.config().rest
    }

    fn collection_path(&self) -> String {
        format!("/{}", self.fixture.resource())
    }

    fn item_path(&self, id: &str) -> String {
        format!("/{}/{id}", self.fixture.resource())
    }

    /// The JSON body of `document`, identity field included.
    fn body_of(&self, document: &T) -> Result<Value, ConformanceError> {
        let id = identity(document)?;
        let mut body = serde_json::to_value(document)
            .map_err(|e| ConformanceError::Setup(format!("cannot serialize document: {e}")))?;
        if let Value::Object(fields) = &mut body {
            fields.insert(self.metadata.identity_field.clone(), Value::String(id));
        }
        Ok(body)
    }

    fn expected_resource(&self, document: T) -> Result<Resource<T>, ConformanceError> {
        let id = identity(&document)?;
        Ok(Resource::expected(
            document,
            self.client.base_url(),
            &self.fixture.resource(),
            &self.metadata.type_name,
            &id,
        ))
    }

    /// The stored document with identity `id`, read through the probe.
    async fn stored(&self, id: &str) -> Result<Option<T>, ConformanceError> {
        Ok(self
            .probe()?
            .find_all()
            .await?
            .into_iter()
            .find(|document| document.id().as_deref() == Some(id)))
    }
}
