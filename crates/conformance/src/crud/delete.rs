use docket_store::{Document, DocumentStore};

use super::{expect_invalid_argument, CrudSuite};
use crate::compare::ensure_eq;
use crate::context::{identity, take_documents, CaseRunner};
use crate::error::ConformanceError;
use crate::probe::StoreProbe;
use crate::selector::CrudCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, CrudCategory>,
) {
    runner
        .case(Some(CrudCategory::DeleteAll), "delete_all_empties_collection", |_| {
            delete_all_empties_collection(suite)
        })
        .await;

    runner
        .case(
            Some(CrudCategory::DeleteAllById),
            "delete_all_by_id_missing_is_noop",
            |_| delete_all_by_id_missing_is_noop(suite),
        )
        .await;
    runner
        .case(
            Some(CrudCategory::DeleteAllById),
            "delete_all_by_id_removes_documents",
            |_| delete_all_by_id_removes_documents(suite),
        )
        .await;

    runner
        .case(Some(CrudCategory::Delete), "delete_null_fails", |_| {
            delete_null_fails(suite)
        })
        .await;
    runner
        .case(Some(CrudCategory::Delete), "delete_missing_document_is_noop", |_| {
            delete_missing_document_is_noop(suite)
        })
        .await;
    runner
        .case(
            Some(CrudCategory::Delete),
            "delete_existing_document_removes_it",
            |_| delete_existing_document_removes_it(suite),
        )
        .await;
    runner
        .case(
            Some(CrudCategory::Delete),
            "delete_all_of_missing_documents_is_noop",
            |_| delete_all_of_missing_documents_is_noop(suite),
        )
        .await;
    runner
        .case(
            Some(CrudCategory::Delete),
            "delete_all_of_existing_documents_removes_them",
            |_| delete_all_of_existing_documents_removes_them(suite),
        )
        .await;

    runner
        .case(Some(CrudCategory::DeleteById), "delete_by_id_null_fails", |_| {
            delete_by_id_null_fails(suite)
        })
        .await;
    runner
        .case(Some(CrudCategory::DeleteById), "delete_by_id_missing_is_noop", |_| {
            delete_by_id_missing_is_noop(suite)
        })
        .await;
    runner
        .case(
            Some(CrudCategory::DeleteById),
            "delete_by_id_removes_document",
            |_| delete_by_id_removes_document(suite),
        )
        .await;
}

/// Fail if any of `ids` is still visible in the store.
async fn ensure_gone<S: DocumentStore, T: Document>(
    probe: &StoreProbe<S, T>,
    ids: &[String],
) -> Result<(), ConformanceError> {
    let remaining: Vec<String> = probe
        .find_all()
        .await?
        .iter()
        .filter_map(|document| document.id())
        .filter(|id| ids.contains(id))
        .collect();
    ensure_eq("deleted documents still stored", Vec::<String>::new(), remaining)
}

async fn delete_all_empties_collection<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let stored = probe.find_all().await?;
    suite.repository.delete_all().await?;
    ensure_eq("count after delete_all", 0, probe.count().await?)?;
    suite.hooks.on_deleted(&stored).await
}

async fn delete_all_by_id_missing_is_noop<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let missing = [suite.fixture.missing_id()];
    // Repeated to show the call stays idempotent.
    for attempt in 1..=2 {
        suite.repository.delete_all_by_id(&missing).await?;
        ensure_eq(
            &format!("count after delete_all_by_id of a missing id (attempt {attempt})"),
            before,
            probe.count().await?,
        )?;
    }
    Ok(())
}

async fn delete_all_by_id_removes_documents<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let doomed = take_documents(probe.find_all().await?, 2)?;
    let ids = doomed.iter().map(identity).collect::<Result<Vec<_>, _>>()?;

    suite.repository.delete_all_by_id(&ids).await?;

    ensure_eq(
        "count after delete_all_by_id",
        before - ids.len() as u64,
        probe.count().await?,
    )?;
    ensure_gone(&probe, &ids).await?;
    suite.hooks.on_deleted(&doomed).await
}

async fn delete_null_fails<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    expect_invalid_argument("delete(null)", suite.repository.delete(None).await)
}

async fn delete_missing_document_is_noop<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let missing = suite.fixture.new_document();
    for attempt in 1..=2 {
        suite.repository.delete(Some(&missing)).await?;
        ensure_eq(
            &format!("count after delete of a missing document (attempt {attempt})"),
            before,
            probe.count().await?,
        )?;
    }
    Ok(())
}

async fn delete_existing_document_removes_it<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let doomed = take_documents(probe.find_all().await?, 1)?;

    for document in &doomed {
        suite.repository.delete(Some(document)).await?;
    }

    ensure_eq("count after delete", before - 1, probe.count().await?)?;
    let ids = doomed.iter().map(identity).collect::<Result<Vec<_>, _>>()?;
    ensure_gone(&probe, &ids).await?;
    suite.hooks.on_deleted(&doomed).await
}

async fn delete_all_of_missing_documents_is_noop<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let missing = [suite.fixture.new_document()];
    for attempt in 1..=2 {
        suite.repository.delete_all_of(&missing).await?;
        ensure_eq(
            &format!("count after delete_all_of missing documents (attempt {attempt})"),
            before,
            probe.count().await?,
        )?;
    }
    Ok(())
}

async fn delete_all_of_existing_documents_removes_them<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let doomed = take_documents(probe.find_all().await?, 2)?;

    suite.repository.delete_all_of(&doomed).await?;

    ensure_eq(
        "count after delete_all_of",
        before - doomed.len() as u64,
        probe.count().await?,
    )?;
    let ids = doomed.iter().map(identity).collect::<Result<Vec<_>, _>>()?;
    ensure_gone(&probe, &ids).await?;
    suite.hooks.on_deleted(&doomed).await
}

async fn delete_by_id_null_fails<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    expect_invalid_argument("delete_by_id(null)", suite.repository.delete_by_id(None).await)
}

async fn delete_by_id_missing_is_noop<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let missing = suite.fixture.missing_id();
    for attempt in 1..=2 {
        suite.repository.delete_by_id(Some(missing.as_str())).await?;
        ensure_eq(
            &format!("count after delete_by_id({missing}) (attempt {attempt})"),
            before,
            probe.count().await?,
        )?;
    }
    Ok(())
}

async fn delete_by_id_removes_document<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let doomed = take_documents(probe.find_all().await?, 1)?;
    let ids = doomed.iter().map(identity).collect::<Result<Vec<_>, _>>()?;

    for id in &ids {
        suite.repository.delete_by_id(Some(id.as_str())).await?;
    }

    ensure_eq("count after delete_by_id", before - 1, probe.count().await?)?;
    ensure_gone(&probe, &ids).await?;
    suite.hooks.on_deleted(&doomed).await
}
