use docket_store::{Document, DocumentStore};
use serde_json::Value;

use super::client::{ensure_status, Method};
use super::envelope::{ErrorReport, Resource};
use super::RestSuite;
use crate::compare::{ensure_eq, ComparisonPair};
use crate::context::{identity, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::RestCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, RestCategory>,
) {
    runner
        .case(
            Some(RestCategory::Update),
            "put_without_id_is_not_allowed",
            |_| put_without_id_is_not_allowed(suite),
        )
        .await;
    runner
        .case(Some(RestCategory::Update), "put_missing_is_not_found", |_| {
            put_missing_is_not_found(suite)
        })
        .await;
    runner
        .case(
            Some(RestCategory::Update),
            "put_invalid_body_reports_errors",
            |_| put_invalid_body_reports_errors(suite),
        )
        .await;
    runner
        .case(Some(RestCategory::Update), "put_existing_returns_resource", |_| {
            put_existing_returns_resource(suite)
        })
        .await;
    runner
        .case(Some(RestCategory::Patch), "patch_missing_is_not_found", |_| {
            patch_missing_is_not_found(suite)
        })
        .await;
    runner
        .case(Some(RestCategory::Patch), "patch_existing_merges_body", |_| {
            patch_existing_merges_body(suite)
        })
        .await;
}

async fn put_without_id_is_not_allowed<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let path = suite.collection_path();
    let body = suite.body_of(&suite.fixture.updated_document())?;
    let response = suite.client.send(Method::Put, &path, Some(&body)).await?;
    ensure_status(&format!("PUT {path}"), 405, &response)
}

async fn put_missing_is_not_found<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.item_path(&suite.fixture.missing_id());
    let body = suite.body_of(&suite.fixture.new_document())?;

    let response = suite.client.send(Method::Put, &path, Some(&body)).await?;

    ensure_status(&format!("PUT {path}"), 404, &response)?;
    ensure_eq("count after PUT to a missing target", before, probe.count().await?)
}

async fn put_invalid_body_reports_errors<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let id = identity(&suite.fixture.updated_document())?;
    let before = suite.stored(&id).await?;
    let path = suite.item_path(&id);
    let invalid = suite.fixture.invalid_document();

    let response = suite
        .client
        .send(Method::Put, &path, Some(&invalid.body))
        .await?;

    ensure_status(&format!("PUT {path} with invalid body"), 400, &response)?;
    let report: ErrorReport = response.json()?;
    ComparisonPair::new(invalid.errors, report.errors)
        .assert_equal(&format!("validation errors of PUT {path}"))?;
    ensure_eq(
        &format!("stored document {id} after rejected PUT"),
        before,
        suite.stored(&id).await?,
    )
}

async fn put_existing_returns_resource<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let document = suite.fixture.updated_document();
    let id = identity(&document)?;
    let path = suite.item_path(&id);

    let response = suite
        .client
        .send(Method::Put, &path, Some(&suite.body_of(&document)?))
        .await?;

    ensure_status(&format!("PUT {path}"), 200, &response)?;
    let actual: Resource<T> = response.json()?;
    ensure_eq(
        &format!("resource returned by PUT {path}"),
        suite.expected_resource(document.clone())?,
        actual.normalized(),
    )?;
    ensure_eq("count after PUT", before, probe.count().await?)?;
    ensure_eq(
        &format!("stored document {id} after PUT"),
        Some(document),
        suite.stored(&id).await?,
    )
}

async fn patch_missing_is_not_found<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.item_path(&suite.fixture.missing_id());

    let response = suite
        .client
        .send(Method::Patch, &path, Some(&suite.fixture.patch()))
        .await?;

    ensure_status(&format!("PATCH {path}"), 404, &response)?;
    ensure_eq("count after PATCH to a missing target", before, probe.count().await?)
}

/// The echoed and stored document is the stored one with the patch merged in.
async fn patch_existing_merges_body<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let id = identity(&suite.fixture.updated_document())?;
    let path = suite.item_path(&id);
    let stored = suite.stored(&id).await?.ok_or_else(|| {
        ConformanceError::Setup(format!(
            "updated document {id} does not share an identity with the fixture"
        ))
    })?;
    let patch = suite.fixture.patch();
    let mut merged = suite.body_of(&stored)?;
    merge_patch(&mut merged, &patch);
    let expected: T = serde_json::from_value(merged)
        .map_err(|e| ConformanceError::Setup(format!("patch does not fit the document: {e}")))?;

    let response = suite.client.send(Method::Patch, &path, Some(&patch)).await?;

    ensure_status(&format!("PATCH {path}"), 200, &response)?;
    let actual: Resource<T> = response.json()?;
    ensure_eq(
        &format!("resource returned by PATCH {path}"),
        suite.expected_resource(expected.clone())?,
        actual.normalized(),
    )?;
    ensure_eq(
        &format!("stored document {id} after PATCH"),
        Some(expected),
        suite.stored(&id).await?,
    )
}

/// JSON merge patch: objects merge recursively, `null` removes a member, and
/// anything else replaces the target.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(members) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(fields) = target {
        for (key, value) in members {
            if value.is_null() {
                fields.remove(key);
            } else {
                merge_patch(fields.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}
