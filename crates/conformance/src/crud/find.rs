use std::collections::BTreeSet;

use docket_store::{page_count, Document, DocumentStore, PageRequest, Sort};

use super::{expect_invalid_argument, CrudSuite};
use crate::compare::{ensure_eq, ComparisonPair};
use crate::context::{fixture_page_size, identity, take_documents, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::CrudCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, CrudCategory>,
) {
    runner
        .case(Some(CrudCategory::FindAll), "find_all_matches_store", |loaded| {
            find_all_matches_store(suite, loaded)
        })
        .await;

    runner
        .case(
            Some(CrudCategory::FindAllById),
            "find_all_by_id_ignores_missing_ids",
            |_| find_all_by_id_ignores_missing_ids(suite),
        )
        .await;
    runner
        .case(
            Some(CrudCategory::FindAllById),
            "find_all_by_id_with_only_missing_ids_is_empty",
            |_| find_all_by_id_with_only_missing_ids_is_empty(suite),
        )
        .await;

    for direction in [SortDirection::Asc, SortDirection::Desc] {
        runner
            .case(
                Some(CrudCategory::FindAllSorted),
                &format!("find_all_sorted_{}", direction.label()),
                |_| find_all_sorted_matches_store(suite, direction),
            )
            .await;
        runner
            .case(
                Some(CrudCategory::FindAllPageable),
                &format!("find_all_paged_{}_first_and_last_page", direction.label()),
                |_| find_all_paged_sorted(suite, direction),
            )
            .await;
    }
    runner
        .case(
            Some(CrudCategory::FindAllPageable),
            "find_all_paged_unsorted_partitions_collection",
            |_| find_all_paged_unsorted_partitions_collection(suite),
        )
        .await;

    runner
        .case(Some(CrudCategory::FindOne), "find_by_id_null_fails", |_| {
            find_by_id_null_fails(suite)
        })
        .await;
    runner
        .case(Some(CrudCategory::FindOne), "find_by_id_missing_is_empty", |_| {
            find_by_id_missing_is_empty(suite)
        })
        .await;
    runner
        .case(
            Some(CrudCategory::FindOne),
            "find_by_id_returns_stored_document",
            |_| find_by_id_returns_stored_document(suite),
        )
        .await;
}

#[derive(Debug, Clone, Copy)]
enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn label(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn sort(self, field: &str) -> Sort {
        match self {
            SortDirection::Asc => Sort::asc(field),
            SortDirection::Desc => Sort::desc(field),
        }
    }
}

async fn find_all_matches_store<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    loaded: u64,
) -> Result<(), ConformanceError> {
    let expected = suite
        .hooks
        .on_find_all_fixture(suite.probe()?.find_all().await?);
    ensure_eq("documents in store", loaded, expected.len() as u64)?;

    let actual = suite.repository.find_all().await?;
    ComparisonPair::new(expected, actual)
        .ordered_by_identity()
        .assert_equal("find_all")
}

async fn find_all_by_id_ignores_missing_ids<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let expected = take_documents(suite.probe()?.find_all().await?, 2)?;
    let mut ids = expected
        .iter()
        .map(identity)
        .collect::<Result<Vec<_>, _>>()?;
    ids.push(suite.fixture.missing_id());

    let actual = suite.repository.find_all_by_id(&ids).await?;
    ComparisonPair::new(expected, actual)
        .ordered_by_identity()
        .assert_equal("find_all_by_id with one missing id")
}

async fn find_all_by_id_with_only_missing_ids_is_empty<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let found = suite
        .repository
        .find_all_by_id(&[suite.fixture.missing_id()])
        .await?;
    ComparisonPair::new(Vec::new(), found).assert_equal("find_all_by_id with only missing ids")
}

/// The whole collection sorted on the fixture's sort field, in strict order.
async fn find_all_sorted_matches_store<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    direction: SortDirection,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let sort = direction.sort(&suite.fixture.sort_field());
    let total = probe.count().await? as usize;
    let everything = PageRequest::new(0, total.max(1));
    let expected = probe.find_all_sorted(&sort, Some(&everything)).await?;

    let actual = suite.repository.find_all_sorted(&sort).await?;
    ComparisonPair::new(expected, actual)
        .assert_equal(&format!("find_all_sorted on {} {}", sort.field, sort.direction))
}

/// First and last page of a sorted paging, checked for content and totals.
async fn find_all_paged_sorted<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
    direction: SortDirection,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let sort = direction.sort(&suite.fixture.sort_field());
    let size = fixture_page_size(suite.fixture.page_size())?;
    let total = probe.count().await?;
    let pages = page_count(total, size);

    let mut indexes = vec![0];
    if pages > 1 {
        indexes.push(pages as usize - 1);
    }
    for index in indexes {
        let request = PageRequest::new(index, size).with_sort(sort.clone());
        let context = format!("page {index} of size {size} sorted {} {}", sort.field, sort.direction);

        let page = suite.repository.find_all_paged(&request).await?;
        let expected = probe.find_all_sorted(&sort, Some(&request)).await?;

        ComparisonPair::new(expected, page.content.clone()).assert_equal(&context)?;
        ensure_eq(&format!("{context}: number"), index, page.number)?;
        ensure_eq(&format!("{context}: size"), size, page.size)?;
        ensure_eq(&format!("{context}: total elements"), total, page.total_elements)?;
        ensure_eq(&format!("{context}: total pages"), pages, page.total_pages())?;
    }
    Ok(())
}

/// Unsorted pages cover the collection exactly once.
async fn find_all_paged_unsorted_partitions_collection<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let size = fixture_page_size(suite.fixture.page_size())?;
    let total = probe.count().await?;
    let pages = page_count(total, size) as usize;

    let mut seen = BTreeSet::new();
    for index in 0..pages {
        let request = PageRequest::new(index, size);
        let page = suite.repository.find_all_paged(&request).await?;
        let expected = probe.find_all_paged(&request).await?;
        ensure_eq(
            &format!("unsorted page {index}: total elements"),
            total,
            page.total_elements,
        )?;
        for document in &page.content {
            let id = identity(document)?;
            if !seen.insert(id.clone()) {
                return Err(ConformanceError::Assertion {
                    context: format!("unsorted page {index}"),
                    expected: "documents not returned by an earlier page".to_string(),
                    actual: format!("{id} returned twice"),
                });
            }
        }
        ComparisonPair::new(expected, page.content)
            .ordered_by_identity()
            .assert_equal(&format!("unsorted page {index} of size {size}"))?;
    }

    let all = probe
        .find_all()
        .await?
        .iter()
        .map(identity)
        .collect::<Result<BTreeSet<_>, _>>()?;
    ensure_eq("identities across all unsorted pages", all, seen)
}

async fn find_by_id_null_fails<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    expect_invalid_argument("find_by_id(null)", suite.repository.find_by_id(None).await)
}

async fn find_by_id_missing_is_empty<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let missing = suite.fixture.missing_id();
    let found = suite.repository.find_by_id(Some(missing.as_str())).await?;
    ensure_eq(&format!("find_by_id({missing})"), None, found)
}

async fn find_by_id_returns_stored_document<T: Document, S: DocumentStore>(
    suite: &CrudSuite<T, S>,
) -> Result<(), ConformanceError> {
    let stored = take_documents(suite.probe()?.find_all().await?, 1)?;
    for document in stored {
        let id = identity(&document)?;
        let found = suite.repository.find_by_id(Some(id.as_str())).await?;
        ensure_eq(&format!("find_by_id({id})"), Some(document), found)?;
    }
    Ok(())
}
