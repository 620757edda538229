use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use docket_store::{Document, DocumentStore};
use tracing::{debug, info, warn};

use crate::config::SuiteConfig;
use crate::error::ConformanceError;
use crate::fixture::{Fixture, FixtureLoader};
use crate::probe::StoreProbe;
use crate::report::{ConformanceReport, TestResult};
use crate::selector::{Category, Selection};

/// Long-lived handles shared by the repository and resource suites.
pub struct SuiteContext<S> {
    store: Arc<S>,
    loader: FixtureLoader<S>,
    config: SuiteConfig,
}

impl<S: DocumentStore> SuiteContext<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            loader: FixtureLoader::new(Arc::clone(&store)),
            store,
            config: SuiteConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SuiteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn loader(&self) -> &FixtureLoader<S> {
        &self.loader
    }

    /// A probe for `T` using the configured default page size.
    pub fn probe<T: Document>(&self) -> Result<StoreProbe<S, T>, ConformanceError> {
        StoreProbe::new(Arc::clone(&self.store), self.config.probe_page_size)
    }
}

/// Runs scenarios one at a time, each against a freshly loaded fixture.
pub(crate) struct CaseRunner<'a, S, T, C: Category> {
    loader: &'a FixtureLoader<S>,
    build: &'a dyn Fn() -> Result<Fixture, ConformanceError>,
    selection: &'a Selection<C>,
    include: &'a dyn Fn(Option<C>) -> bool,
    results: Vec<TestResult>,
    _document: PhantomData<fn() -> T>,
}

impl<'a, S: DocumentStore, T: Document, C: Category> CaseRunner<'a, S, T, C> {
    pub(crate) fn new(
        loader: &'a FixtureLoader<S>,
        build: &'a dyn Fn() -> Result<Fixture, ConformanceError>,
        selection: &'a Selection<C>,
        include: &'a dyn Fn(Option<C>) -> bool,
    ) -> Self {
        Self {
            loader,
            build,
            selection,
            include,
            results: Vec::new(),
            _document: PhantomData,
        }
    }

    /// Run one scenario. `body` receives the number of loaded documents of
    /// the type under test.
    ///
    /// Scenarios filtered out by `include` are not reported at all; those
    /// whose category is not selected are reported as skipped.
    pub(crate) async fn case<F, Fut>(&mut self, category: Option<C>, name: &str, body: F)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = Result<(), ConformanceError>>,
    {
        if !(self.include)(category) {
            return;
        }
        let label = category.map_or("uncategorized", |c| c.name());
        if !self.selection.is_selected(category) {
            debug!(category = label, scenario = name, "scenario skipped");
            self.results.push(TestResult::skipped(label, name));
            return;
        }

        let result = self.execute(body).await;
        match &result {
            Ok(()) => info!(category = label, scenario = name, "scenario passed"),
            Err(e) => warn!(category = label, scenario = name, error = %e, "scenario failed"),
        }
        self.results.push(TestResult::from_result(label, name, result));
    }

    async fn execute<F, Fut>(&self, body: F) -> Result<(), ConformanceError>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = Result<(), ConformanceError>>,
    {
        let fixture = (self.build)()?;
        let loaded = self
            .loader
            .load::<T>(&fixture)
            .await
            .map_err(|e| match e {
                ConformanceError::Setup(_) => e,
                other => ConformanceError::Setup(other.to_string()),
            })?;
        let outcome = body(loaded.loaded_count).await;
        let teardown = self.loader.teardown(loaded).await;
        outcome.and(teardown)
    }

    pub(crate) fn finish(self) -> ConformanceReport {
        let report = ConformanceReport::from_results(self.results);
        info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "suite finished"
        );
        report
    }
}

/// The first `n` documents, or a setup error if the fixture is too small.
pub(crate) fn take_documents<T: Document>(
    documents: Vec<T>,
    n: usize,
) -> Result<Vec<T>, ConformanceError> {
    if documents.len() < n {
        return Err(ConformanceError::Setup(format!(
            "scenario needs {n} fixture documents of the type under test, found {}",
            documents.len()
        )));
    }
    Ok(documents.into_iter().take(n).collect())
}

pub(crate) fn identity<T: Document>(document: &T) -> Result<String, ConformanceError> {
    document.id().ok_or_else(|| {
        ConformanceError::Setup(format!("document without identity: {document:?}"))
    })
}

/// A fixture's page size, rejected as a setup failure when zero.
pub(crate) fn fixture_page_size(size: usize) -> Result<usize, ConformanceError> {
    if size == 0 {
        return Err(ConformanceError::Setup(
            "fixture page size must be positive".to_string(),
        ));
    }
    Ok(size)
}
