use docket_store::{Document, DocumentStore};

use super::client::{ensure_status, Method};
use super::envelope::ErrorReport;
use super::RestSuite;
use crate::compare::{ensure_eq, ComparisonPair};
use crate::context::{identity, take_documents, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::RestCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, RestCategory>,
) {
    runner
        .case(Some(RestCategory::Create), "create_empty_body_is_bad_request", |_| {
            create_empty_body_is_bad_request(suite)
        })
        .await;
    runner
        .case(
            Some(RestCategory::Create),
            "create_invalid_body_reports_errors",
            |_| create_invalid_body_reports_errors(suite),
        )
        .await;
    runner
        .case(
            Some(RestCategory::Create),
            "create_duplicate_identity_conflicts",
            |_| create_duplicate_identity_conflicts(suite),
        )
        .await;
    runner
        .case(Some(RestCategory::Create), "create_new_document", |_| {
            create_new_document(suite)
        })
        .await;
}

async fn create_empty_body_is_bad_request<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.collection_path();

    let response = suite.client.send(Method::Post, &path, None).await?;

    ensure_status(&format!("POST {path} without body"), 400, &response)?;
    ensure_eq("count after rejected POST", before, probe.count().await?)
}

/// The error payload lists exactly the declared violations, in order.
async fn create_invalid_body_reports_errors<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.collection_path();
    let invalid = suite.fixture.invalid_document();

    let response = suite
        .client
        .send(Method::Post, &path, Some(&invalid.body))
        .await?;

    ensure_status(&format!("POST {path} with invalid body"), 400, &response)?;
    let report: ErrorReport = response.json()?;
    ComparisonPair::new(invalid.errors, report.errors)
        .assert_equal(&format!("validation errors of POST {path}"))?;
    ensure_eq("count after rejected POST", before, probe.count().await?)
}

async fn create_duplicate_identity_conflicts<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.collection_path();
    let existing = take_documents(probe.find_all().await?, 1)?;

    for document in &existing {
        let body = suite.body_of(document)?;
        let response = suite.client.send(Method::Post, &path, Some(&body)).await?;
        ensure_status(
            &format!("POST {path} with existing identity {}", identity(document)?),
            409,
            &response,
        )?;
    }
    ensure_eq("count after conflicting POST", before, probe.count().await?)
}

async fn create_new_document<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let path = suite.collection_path();
    let document = suite.fixture.new_document();
    let id = identity(&document)?;

    let response = suite
        .client
        .send(Method::Post, &path, Some(&suite.body_of(&document)?))
        .await?;

    ensure_status(&format!("POST {path}"), 201, &response)?;
    ensure_eq("count after POST", before + 1, probe.count().await?)?;
    ensure_eq(
        &format!("stored document {id} after POST"),
        Some(document),
        suite.stored(&id).await?,
    )
}
