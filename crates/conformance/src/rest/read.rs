use docket_store::{page_count, Document, DocumentStore, PageRequest, Sort};

use super::client::{ensure_status, Method};
use super::envelope::{expected_page_links, PagedResources, Resource};
use super::RestSuite;
use crate::compare::{ensure_eq, ComparisonPair};
use crate::context::{fixture_page_size, identity, take_documents, CaseRunner};
use crate::error::ConformanceError;
use crate::selector::RestCategory;

pub(super) async fn run<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    runner: &mut CaseRunner<'_, S, T, RestCategory>,
) {
    runner
        .case(Some(RestCategory::FindOne), "get_missing_is_not_found", |_| {
            get_missing_is_not_found(suite)
        })
        .await;
    runner
        .case(Some(RestCategory::FindOne), "get_returns_resource", |_| {
            get_returns_resource(suite)
        })
        .await;
    for sort in ["asc", "desc"] {
        runner
            .case(
                Some(RestCategory::FindAll),
                &format!("list_sorted_{sort}_uses_default_page"),
                |_| list_sorted_uses_default_page(suite, sort),
            )
            .await;
    }
    for sort in ["asc", "desc"] {
        runner
            .case(
                Some(RestCategory::FindAllPageable),
                &format!("list_sorted_{sort}_first_and_last_page"),
                |_| list_sorted_first_and_last_page(suite, sort),
            )
            .await;
    }
}

async fn get_missing_is_not_found<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    let path = suite.item_path(&suite.fixture.missing_id());
    let response = suite.client.send(Method::Get, &path, None).await?;
    ensure_status(&format!("GET {path}"), 404, &response)
}

/// The resource carries the stored document plus its self and typed links.
async fn get_returns_resource<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
) -> Result<(), ConformanceError> {
    for document in take_documents(suite.probe()?.find_all().await?, 1)? {
        let path = suite.item_path(&identity(&document)?);
        let response = suite.client.send(Method::Get, &path, None).await?;
        ensure_status(&format!("GET {path}"), 200, &response)?;

        let actual: Resource<T> = response.json()?;
        ensure_eq(
            &format!("resource at {path}"),
            suite.expected_resource(document)?,
            actual.normalized(),
        )?;
    }
    Ok(())
}

/// A sorted listing without paging parameters is the server's default page,
/// in sort order.
async fn list_sorted_uses_default_page<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    direction: &str,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let sort = sort_for(&suite.fixture.sort_field(), direction);
    let size = suite.rest().default_page_size;
    let total = probe.count().await?;
    let path = format!("{}?{}", suite.collection_path(), sort_query(&sort)?);

    let response = suite.client.send(Method::Get, &path, None).await?;
    ensure_status(&format!("GET {path}"), 200, &response)?;
    let page: PagedResources<T> = response.json()?;

    check_page(suite, &path, &page, 0, size, total)?;
    let expected = probe
        .find_all_sorted(&sort, None)
        .await?
        .into_iter()
        .take(size)
        .map(|document| suite.expected_resource(document))
        .collect::<Result<Vec<_>, _>>()?;
    ComparisonPair::new(expected, page.into_normalized_content())
        .assert_equal(&format!("content of GET {path}"))
}

async fn list_sorted_first_and_last_page<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    direction: &str,
) -> Result<(), ConformanceError> {
    let probe = suite.probe()?;
    let sort = sort_for(&suite.fixture.sort_field(), direction);
    let query = sort_query(&sort)?;
    let size = fixture_page_size(suite.fixture.page_size())?;
    let total = probe.count().await?;
    let pages = page_count(total, size);

    let mut indexes = vec![0];
    if pages > 1 {
        indexes.push(pages as usize - 1);
    }
    for index in indexes {
        let path = format!(
            "{}?{query}&page={index}&size={size}",
            suite.collection_path()
        );
        let response = suite.client.send(Method::Get, &path, None).await?;
        ensure_status(&format!("GET {path}"), 200, &response)?;
        let page: PagedResources<T> = response.json()?;

        check_page(suite, &path, &page, index, size, total)?;
        let request = PageRequest::new(index, size).with_sort(sort.clone());
        let expected = probe
            .find_all_sorted(&sort, Some(&request))
            .await?
            .into_iter()
            .map(|document| suite.expected_resource(document))
            .collect::<Result<Vec<_>, _>>()?;
        ComparisonPair::new(expected, page.into_normalized_content())
            .assert_equal(&format!("content of GET {path}"))?;
    }
    Ok(())
}

fn sort_for(field: &str, direction: &str) -> Sort {
    if direction == "desc" {
        Sort::desc(field)
    } else {
        Sort::asc(field)
    }
}

/// `sort={field},{direction}`. Field names are limited to URL-unreserved
/// characters so they travel unencoded.
fn sort_query(sort: &Sort) -> Result<String, ConformanceError> {
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');
    if sort.field.is_empty() || !sort.field.chars().all(unreserved) {
        return Err(ConformanceError::Setup(format!(
            "sort field {:?} cannot be sent in a query string",
            sort.field
        )));
    }
    Ok(format!("sort={},{}", sort.field, sort.direction))
}

/// Page metadata and navigation links of page `index`.
fn check_page<T: Document, S: DocumentStore>(
    suite: &RestSuite<T, S>,
    path: &str,
    page: &PagedResources<T>,
    index: usize,
    size: usize,
    total: u64,
) -> Result<(), ConformanceError> {
    ensure_eq(&format!("{path}: page number"), index as u64, page.page.number)?;
    ensure_eq(&format!("{path}: page size"), size as u64, page.page.size)?;
    ensure_eq(&format!("{path}: total elements"), total, page.page.total_elements)?;
    ensure_eq(
        &format!("{path}: total pages"),
        page_count(total, size),
        page.page.total_pages,
    )?;
    ensure_eq(
        &format!("{path}: links"),
        expected_page_links(index, total, size),
        page.rels(),
    )?;

    let profile = format!(
        "{}/{}/{}",
        suite.client.base_url(),
        suite.rest().profile_path,
        suite.fixture.resource()
    );
    ensure_eq(
        &format!("{path}: profile link"),
        Some(profile.as_str()),
        page.link("profile").map(|link| link.href.as_str()),
    )
}
