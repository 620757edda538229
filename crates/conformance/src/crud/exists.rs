use docket_store::{Document, DocumentStore};

use super::{expect_invalid_argument, CrudSuite};
use crate::compare::ensure_eq;
use crate::context::{identity, take_documents, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::CrudCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, CrudCategory>,
) {
    runner
        .case(None, "fixture_is_visible_to_store", |loaded| {
            fixture_is_visible_to_store(suite, loaded)
        })
        .await;

    runner
        .case(Some(CrudCategory::Exist), "exists_by_id_null_fails", |_| {
            exists_by_id_null_fails(suite)
        })
        .await;
    runner
        .case(Some(CrudCategory::Exist), "exists_by_id_present", |_| {
            exists_by_id_present(suite)
        })
        .await;
    runner
        .case(Some(CrudCategory::Exist), "exists_by_id_missing", |_| {
            exists_by_id_missing(suite)
        })
        .await;

    runner
        .case(Some(CrudCategory::Count), "count_matches_fixture", |loaded| {
            count_matches_fixture(suite, loaded)
        })
        .await;
}

/// The loader's refresh barrier: the first read sees every fixture document.
async fn fixture_is_visible_to_store<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    loaded: u64,
) -> Result<(), ConformanceError> {
    ensure_eq("store count after fixture load", loaded, suite.probe()?.count().await?)
}

async fn exists_by_id_null_fails<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    expect_invalid_argument("exists_by_id(null)", suite.repository.exists_by_id(None).await)
}

async fn exists_by_id_present<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    for document in take_documents(suite.probe()?.find_all().await?, 1)? {
        let id = identity(&document)?;
        let exists = suite.repository.exists_by_id(Some(id.as_str())).await?;
        ensure_eq(&format!("exists_by_id({id})"), true, exists)?;
    }
    Ok(())
}

async fn exists_by_id_missing<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let missing = suite.fixture.missing_id();
    let exists = suite.repository.exists_by_id(Some(missing.as_str())).await?;
    ensure_eq(&format!("exists_by_id({missing})"), false, exists)
}

async fn count_matches_fixture<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    loaded: u64,
) -> Result<(), ConformanceError> {
    let counted = suite.repository.count().await?;
    ensure_eq("count against loaded fixture", loaded, counted)?;
    ensure_eq("count against store", suite.probe()?.count().await?, counted)
}
