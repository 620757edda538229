use docket_store::{Document, DocumentStore};

use super::client::{ensure_status, Method};
use super::RestSuite;
use crate::compare::ensure_eq;
use crate::context::{identity, take_documents, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::RestCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, RestCategory>,
) {
    runner
        .case(Some(RestCategory::Delete), "delete_existing_removes_resource", |_| {
            delete_existing_removes_resource(suite)
        })
        .await;
    runner
        .case(Some(RestCategory::DeleteById), "delete_missing_is_not_found", |_| {
            delete_missing_is_not_found(suite)
        })
        .await;
    runner
        .case(Some(RestCategory::DeleteAll), "delete_collection_empties_it", |_| {
            delete_collection_empties_it(suite)
        })
        .await;
}

async fn delete_existing_removes_resource<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;

    for document in take_documents(probe.find_all().await?, 1)? {
        let path = suite.item_path(&identity(&document)?);
        let response = suite.client.send(Method::Delete, &path, None).await?;
        ensure_status(&format!("DELETE {path}"), 204, &response)?;

        let response = suite.client.send(Method::Get, &path, None).await?;
        ensure_status(&format!("GET {path} after DELETE"), 404, &response)?;
    }
    ensure_eq("count after DELETE", before - 1, probe.count().await?)
}

async fn delete_missing_is_not_found<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.item_path(&suite.fixture.missing_id());

    for attempt in 1..=2 {
        let response = suite.client.send(Method::Delete, &path, None).await?;
        ensure_status(&format!("DELETE {path} (attempt {attempt})"), 404, &response)?;
        ensure_eq(
            &format!("count after DELETE {path} (attempt {attempt})"),
            before,
            probe.count().await?,
        )?;
    }
    Ok(())
}

async fn delete_collection_empties_it<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let path = suite.collection_path();
    let response = suite.client.send(Method::Delete, &path, None).await?;
    ensure_status(&format!("DELETE {path}"), 204, &response)?;
    ensure_eq("count after DELETE of the collection", 0, suite.probe()?.count().await?)
}
