use docket_store::{Document, DocumentStore, RepositoryError};

use super::{expect_invalid_argument, CrudSuite};
use crate::compare::{ensure_eq, ComparisonPair};
use crate::context::{identity, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::CrudCategory;

/// `index` and `save` share one contract.
#[derive(Debug, Clone, Copy)]
enum Write {
    Index,
    Save,
}

impl Write {
    fn category(self) -> CrudCategory {
        match self {
            Write::Index => CrudCategory::Index,
            Write::Save => CrudCategory::Save,
        }
    }

    fn call(self) -> &'static str {
        match self {
            Write::Index => "index",
            Write::Save => "save",
        }
    }

    async fn apply<T: Document, S: DocumentStore>(
        self,
        suite: &CrudSuite<T, S>,
        document: Option<T>,
    ) -> Result<T, RepositoryError> {
        match self {
            Write::Index => suite.repository.index(document).await,
            Write::Save => suite.repository.save(document).await,
        }
    }
}

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, CrudCategory>,
) {
    for write in [Write::Index, Write::Save] {
        let category = Some(write.category());
        let call = write.call();
        runner
            .case(category, &format!("{call}_null_fails"), |_| {
                write_null_fails(suite, write)
            })
            .await;
        runner
            .case(
                category,
                &format!("{call}_new_document_increments_count"),
                |_| write_new_document_increments_count(suite, write),
            )
            .await;
        runner
            .case(
                category,
                &format!("{call}_existing_document_keeps_count"),
                |_| write_existing_document_keeps_count(suite, write),
            )
            .await;
    }
    runner
        .case(
            Some(CrudCategory::Save),
            "saved_document_found_by_id",
            |_| saved_document_found_by_id(suite),
        )
        .await;
    runner
        .case(
            Some(CrudCategory::SaveBulk),
            "save_all_with_null_is_atomic",
            |_| save_all_with_null_is_atomic(suite),
        )
        .await;
    runner
        .case(
            Some(CrudCategory::SaveBulk),
            "save_all_mixed_batch_preserves_order",
            |_| save_all_mixed_batch_preserves_order(suite),
        )
        .await;
}

/// A null document is rejected and the store is untouched.
async fn write_null_fails<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    write: Write,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    expect_invalid_argument(
        &format!("{}(null)", write.call()),
        write.apply(suite, None).await,
    )?;
    ensure_eq(
        &format!("count after {}(null)", write.call()),
        before,
        probe.count().await?,
    )
}

/// Writing a new document adds exactly one and echoes the input.
async fn write_new_document_increments_count<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    write: Write,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let document = suite.fixture.new_document();

    let written = write.apply(suite, Some(document.clone())).await?;

    ensure_eq(
        &format!("document returned by {}", write.call()),
        &document,
        &written,
    )?;
    ensure_eq(
        &format!("count after {} of a new document", write.call()),
        before + 1,
        probe.count().await?,
    )?;
    suite.hooks.on_saved(&document, &written).await
}

/// Rewriting an existing document keeps the count and stores the new body.
async fn write_existing_document_keeps_count<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    write: Write,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let document = suite.fixture.updated_document();
    let id = identity(&document)?;
    let stored = probe.find_all().await?;
    let existing = stored
        .iter()
        .find(|d| d.id().as_deref() == Some(id.as_str()))
        .ok_or_else(|| {
            ConformanceError::Setup(format!(
                "updated document {id} does not share an identity with the fixture"
            ))
        })?;
    let captured = suite.hooks.capture(existing).await?;
    let before = stored.len() as u64;

    let written = write.apply(suite, Some(document.clone())).await?;

    ensure_eq(
        &format!("document returned by {}", write.call()),
        &document,
        &written,
    )?;
    ensure_eq(
        &format!("count after {} of an existing document", write.call()),
        before,
        probe.count().await?,
    )?;
    let after = probe.find_all().await?;
    ensure_eq(
        &format!("stored document after {}", write.call()),
        Some(&document),
        after.iter().find(|d| d.id().as_deref() == Some(id.as_str())),
    )?;
    suite.hooks.on_updated(&document, &written, &captured).await
}

/// A document saved and immediately found by id is structurally equal.
async fn saved_document_found_by_id<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let document = suite.fixture.new_document();
    let id = identity(&document)?;
    suite.repository.save(Some(document.clone())).await?;
    let found = suite.repository.find_by_id(Some(id.as_str())).await?;
    ensure_eq("find_by_id after save", Some(document), found)
}

/// A batch holding one null fails as a whole, with nothing committed.
async fn save_all_with_null_is_atomic<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let batch = vec![Some(suite.fixture.new_document()), None];
    expect_invalid_argument(
        "save_all with a null document",
        suite.repository.save_all(batch).await,
    )?;
    ensure_eq(
        "count after rejected save_all",
        before,
        probe.count().await?,
    )
}

/// One new plus one existing document adds exactly one; the returned batch
/// matches the input element-wise and in order.
async fn save_all_mixed_batch_preserves_order<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let before = probe.count().await?;
    let batch = vec![
        suite.fixture.new_document(),
        suite.fixture.updated_document(),
    ];

    let saved = suite
        .repository
        .save_all(batch.iter().cloned().map(Some).collect())
        .await?;

    ComparisonPair::new(batch.clone(), saved.clone())
        .assert_equal("documents returned by save_all")?;
    ensure_eq(
        "count after save_all of one new and one existing document",
        before + 1,
        probe.count().await?,
    )?;
    suite.hooks.on_saved_all(&batch, &saved).await
}
