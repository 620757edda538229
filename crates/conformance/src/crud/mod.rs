//! Repository conformance suite.
//!
//! Each scenario loads a fresh fixture directly into the store, makes one
//! repository call, and checks the result and the store's side effects
//! against the direct store probe. The scenarios cover:
//!
//! - **Index / Save**: null guards, insert, update, round trip
//! - **SaveBulk**: atomic rejection of batches with a null, mixed batches
//! - **FindAll / FindAllById / FindAllSorted / FindAllPageable / FindOne**
//! - **Exist / Count**
//! - **DeleteAll / DeleteAllById / Delete / DeleteById**
//!
//! # Usage
//!
//! ```ignore
//! use docket_conformance::{CrudSuite, Selection, CrudCategory};
//!
//! #[tokio::test]
//! async fn book_repository_conformance() {
//!     let store = Arc::new(connect_store().await);
//!     let suite = CrudSuite::new(store.clone(), BookRepository::new(store), BookFixture)
//!         .unwrap()
//!         .with_categories(Selection::only([CrudCategory::Save, CrudCategory::FindAll]));
//!     suite.run().await.assert_conformant();
//! }
//! ```

mod delete;
mod exists;
mod find;
mod save;

use std::sync::Arc;

use docket_store::{resolve, Document, DocumentRepository, DocumentStore, RepositoryError};
use tracing::info;

use crate::config::SuiteConfig;
use crate::context::{CaseRunner, SuiteContext};
use crate::error::ConformanceError;
use crate::fixture::Fixture;
use crate::hooks::{CrudHooks, NoHooks};
use crate::probe::StoreProbe;
use crate::report::ConformanceReport;
use crate::selector::{CrudCategory, Selection};

/// Test data for one document type.
pub trait CrudFixture<T: Document>: Send + Sync {
    /// Documents seeded before every scenario. May include documents of
    /// other types sharing the collection.
    fn fixture(&self) -> Result<Fixture, ConformanceError>;

    /// A document whose identity is not in the fixture.
    fn new_document(&self) -> T;

    /// A fixture document of type `T` with changed content and the same
    /// identity.
    fn updated_document(&self) -> T;

    /// An identifier not in the fixture.
    fn missing_id(&self) -> String {
        "docket-missing-id".to_string()
    }

    /// Field used by the sorted and paged scenarios. Values should be
    /// distinct across the fixture.
    fn sort_field(&self) -> String;

    /// Page size of the paged scenarios.
    fn page_size(&self) -> usize {
        2
    }
}

/// The repository suite for document type `T` over store `S`.
pub struct CrudSuite<T: Document, S: DocumentStore> {
    context: SuiteContext<S>,
    repository: Arc<dyn DocumentRepository<T>>,
    fixture: Arc<dyn CrudFixture<T>>,
    hooks: Arc<dyn CrudHooks<T>>,
    selection: Selection<CrudCategory>,
}

impl<T: Document, S: DocumentStore> CrudSuite<T, S> {
    /// Fails with [`ConformanceError::Metadata`] if `T` cannot be resolved.
    pub fn new(
        store: Arc<S>,
        repository: impl DocumentRepository<T> + 'static,
        fixture: impl CrudFixture<T> + 'static,
    ) -> Result<Self, ConformanceError> {
        resolve::<T>()?;
        Ok(Self {
            context: SuiteContext::new(store),
            repository: Arc::new(repository),
            fixture: Arc::new(fixture),
            hooks: Arc::new(NoHooks),
            selection: Selection::all(),
        })
    }

    /// Use `config`, including its category selection.
    pub fn with_config(mut self, config: SuiteConfig) -> Self {
        self.selection = config.crud_selection();
        self.context = self.context.with_config(config);
        self
    }

    pub fn with_hooks(mut self, hooks: impl CrudHooks<T> + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_categories(mut self, selection: Selection<CrudCategory>) -> Self {
        self.selection = selection;
        self
    }

    /// Run every scenario.
    pub async fn run(&self) -> ConformanceReport {
        self.run_where(&|_| true).await
    }

    /// Run the scenarios of one category.
    pub async fn run_category(&self, category: CrudCategory) -> ConformanceReport {
        self.run_where(&|c| c == Some(category)).await
    }

    /// Run the scenarios that belong to no category.
    pub async fn run_uncategorized(&self) -> ConformanceReport {
        self.run_where(&|c| c.is_none()).await
    }

    async fn run_where(&self, include: &dyn Fn(Option<CrudCategory>) -> bool) -> ConformanceReport {
        if let Ok(metadata) = resolve::<T>() {
            info!(
                rust_type = metadata.rust_type,
                collection = %metadata.collection,
                type_name = %metadata.type_name,
                "running repository conformance suite"
            );
        }

        let build = || self.fixture.fixture();
        let mut runner: CaseRunner<'_, S, T, CrudCategory> =
            CaseRunner::new(self.context.loader(), &build, &self.selection, include);

        exists::run(self, &mut runner).await;
        save::run(self, &mut runner).await;
        find::run(self, &mut runner).await;
        delete::run(self, &mut runner).await;

        runner.finish()
    }

    fn probe(&self) -> Result<StoreProbe<S, T>, ConformanceError> {
        self.context.probe()
    }
}

/// Succeed only if `result` is the invalid-argument rejection.
fn expect_invalid_argument<V: std::fmt::Debug>(
    call: &str,
    result: Result<V, RepositoryError>,
) -> Result<(), ConformanceError> {
    match result {
        Err(RepositoryError::InvalidArgument(_)) => Ok(()),
        other => Err(ConformanceError::Assertion {
            context: call.to_string(),
            expected: "InvalidArgument".to_string(),
            actual: format!("{other:?}"),
        }),
    }
}
