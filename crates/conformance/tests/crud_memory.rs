//! The repository suite against the in-memory store, plus broken
//! repositories that the suite must catch.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docket_conformance::{
    crud_conformance_tests, ConformanceError, CrudCategory, CrudHooks, CrudSuite, Outcome,
    Selection, SuiteConfig,
};
use docket_store::memory::MemoryStore;
use support::{
    book_repository, register_library, Book, BookFixture, Fault, FaultyRepository,
    SingleBookFixture, ZeroPageFixture,
};
use tracing_test::traced_test;

fn book_suite() -> CrudSuite<Book, MemoryStore> {
    register_library();
    let store = Arc::new(MemoryStore::new());
    let repository = book_repository(&store);
    CrudSuite::new(store, repository, BookFixture).unwrap()
}

fn faulty_suite(fault: Fault) -> CrudSuite<Book, MemoryStore> {
    register_library();
    let store = Arc::new(MemoryStore::new());
    let repository = FaultyRepository::new(&store, fault);
    CrudSuite::new(store, repository, BookFixture).unwrap()
}

crud_conformance_tests!(book_suite());

#[tokio::test]
async fn full_run_passes() {
    let report = book_suite().run().await;
    report.assert_conformant();
    assert_eq!(report.skipped, 0);
    assert!(report.total >= 36, "{report}");
    assert!(report.result("fixture_is_visible_to_store").unwrap().passed());
    assert!(report.result("index_new_document_increments_count").unwrap().passed());
    assert!(report.result("find_all_paged_desc_first_and_last_page").unwrap().passed());
}

#[tokio::test]
async fn unselected_categories_are_skipped() {
    let report = book_suite()
        .with_categories(Selection::only([CrudCategory::Save, CrudCategory::Count]))
        .run()
        .await;

    assert_eq!(report.failed, 0, "{report}");
    for result in &report.results {
        let selected = matches!(result.category.as_str(), "save" | "count" | "uncategorized");
        assert_eq!(result.outcome == Outcome::Skipped, !selected, "{}", result.name);
    }
    assert!(report.result("count_matches_fixture").unwrap().passed());
    assert_eq!(
        report.result("delete_all_empties_collection").unwrap().outcome,
        Outcome::Skipped
    );
}

#[tokio::test]
async fn config_selects_categories() {
    let config = SuiteConfig::from_toml_str(r#"crud_categories = ["FindOne"]"#).unwrap();
    let report = book_suite()
        .with_config(config)
        .run_category(CrudCategory::Exist)
        .await;

    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, report.total);
    assert!(report.total > 0);
}

#[tokio::test]
async fn non_atomic_batch_is_caught() {
    let report = faulty_suite(Fault::PartialBatch)
        .run_category(CrudCategory::SaveBulk)
        .await;

    assert!(report.result("save_all_with_null_is_atomic").unwrap().failed(), "{report}");
    assert!(report.result("save_all_mixed_batch_preserves_order").unwrap().passed());
}

#[tokio::test]
async fn ignored_sort_direction_is_caught() {
    let report = faulty_suite(Fault::IgnoresSortDirection)
        .run_category(CrudCategory::FindAllSorted)
        .await;

    assert!(report.result("find_all_sorted_asc").unwrap().passed(), "{report}");
    assert!(report.result("find_all_sorted_desc").unwrap().failed(), "{report}");
}

#[tokio::test]
async fn accepted_null_id_is_caught() {
    let report = faulty_suite(Fault::AcceptsNullId)
        .run_category(CrudCategory::Exist)
        .await;

    let Outcome::Failed(message) = &report.result("exists_by_id_null_fails").unwrap().outcome else {
        panic!("null id was not rejected: {report}");
    };
    assert!(message.contains("InvalidArgument"), "{message}");
    assert!(report.result("exists_by_id_present").unwrap().passed());
}

#[tokio::test]
async fn small_fixture_fails_only_the_scenarios_that_need_more() {
    register_library();
    let store = Arc::new(MemoryStore::new());
    let repository = book_repository(&store);
    let report = CrudSuite::new(store, repository, SingleBookFixture)
        .unwrap()
        .run_category(CrudCategory::DeleteAllById)
        .await;

    let Outcome::Failed(message) = &report
        .result("delete_all_by_id_removes_documents")
        .unwrap()
        .outcome
    else {
        panic!("expected a setup failure: {report}");
    };
    assert!(message.starts_with("fixture setup failed"), "{message}");
    assert!(report.result("delete_all_by_id_missing_is_noop").unwrap().passed());
}

#[tokio::test]
async fn zero_page_size_is_a_setup_failure() {
    register_library();
    let store = Arc::new(MemoryStore::new());
    let repository = book_repository(&store);
    let report = CrudSuite::new(store, repository, ZeroPageFixture)
        .unwrap()
        .run_category(CrudCategory::FindAllPageable)
        .await;

    assert!(report.total > 0);
    assert_eq!(report.failed, report.total, "{report}");
    for result in &report.results {
        let Outcome::Failed(message) = &result.outcome else {
            unreachable!();
        };
        assert!(message.contains("page size must be positive"), "{message}");
    }
}

#[derive(Default)]
struct CountingHooks {
    saved: Arc<AtomicUsize>,
    deleted: Arc<AtomicUsize>,
}

#[async_trait]
impl CrudHooks<Book> for CountingHooks {
    async fn on_saved(&self, input: &Book, output: &Book) -> Result<(), ConformanceError> {
        assert_eq!(input, output);
        self.saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_deleted(&self, deleted: &[Book]) -> Result<(), ConformanceError> {
        self.deleted.fetch_add(deleted.len(), Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn hooks_observe_writes() {
    let hooks = CountingHooks::default();
    let saved = Arc::clone(&hooks.saved);
    let deleted = Arc::clone(&hooks.deleted);
    let suite = book_suite().with_hooks(hooks);

    suite.run_category(CrudCategory::Save).await.assert_conformant();
    suite.run_category(CrudCategory::Delete).await.assert_conformant();

    assert!(saved.load(Ordering::SeqCst) > 0);
    assert!(deleted.load(Ordering::SeqCst) > 0);
}

struct RejectingHooks;

#[async_trait]
impl CrudHooks<Book> for RejectingHooks {
    async fn on_saved(&self, _input: &Book, output: &Book) -> Result<(), ConformanceError> {
        Err(ConformanceError::Assertion {
            context: "audit stamp".to_string(),
            expected: "present".to_string(),
            actual: format!("{output:?}"),
        })
    }
}

#[tokio::test]
async fn failing_hook_fails_the_scenario() {
    let report = book_suite()
        .with_hooks(RejectingHooks)
        .run_category(CrudCategory::Save)
        .await;

    let Outcome::Failed(message) = &report
        .result("save_new_document_increments_count")
        .unwrap()
        .outcome
    else {
        panic!("hook failure was not reported: {report}");
    };
    assert!(message.starts_with("audit stamp"), "{message}");
    assert!(report.result("save_null_fails").unwrap().passed());
}

#[tokio::test]
#[traced_test]
async fn scenario_outcomes_are_logged() {
    faulty_suite(Fault::IgnoresSortDirection)
        .run_category(CrudCategory::FindAllSorted)
        .await;

    assert!(logs_contain("running repository conformance suite"));
    assert!(logs_contain("scenario passed"));
    assert!(logs_contain("scenario failed"));
    assert!(logs_contain("find_all_sorted_desc"));
    assert!(logs_contain("suite finished"));
}
