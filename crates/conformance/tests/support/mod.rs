//! Shared test support: a small library domain, its fixture, deliberately
//! broken repositories, and an axum reference server for the resource suite.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use docket_conformance::rest::{ErrorReport, Link, PageMetadata, PagedResources, Resource};
use docket_conformance::{
    ConformanceError, CrudFixture, Fixture, InvalidDocument, RestFixture, ValidationError,
};
use docket_store::memory::{MemoryStore, StoreRepository};
use docket_store::{
    last_page_index, page_count, register, Document, DocumentRegistration, DocumentRepository,
    Page, PageRequest, RepositoryError, Sort,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub title: String,
    pub pages: i64,
}

impl Document for Book {
    fn id(&self) -> Option<String> {
        self.isbn.clone()
    }
}

/// Shares the `library` collection with [`Book`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magazine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    pub title: String,
}

impl Document for Magazine {
    fn id(&self) -> Option<String> {
        self.issn.clone()
    }
}

pub fn register_library() {
    register::<Book>(
        DocumentRegistration::new("library", "book")
            .identity_field("isbn")
            .mapping(json!({
                "properties": {
                    "title": {"type": "text"},
                    "pages": {"type": "integer"}
                }
            })),
    )
    .unwrap();
    register::<Magazine>(DocumentRegistration::new("library", "magazine").identity_field("issn"))
        .unwrap();
}

pub fn book(isbn: &str, title: &str, pages: i64) -> Book {
    Book {
        isbn: Some(isbn.to_string()),
        title: title.to_string(),
        pages,
    }
}

fn magazine(issn: &str, title: &str) -> Magazine {
    Magazine {
        issn: Some(issn.to_string()),
        title: title.to_string(),
    }
}

/// Five books with distinct page counts, plus two magazines in the same
/// collection.
pub struct BookFixture;

impl CrudFixture<Book> for BookFixture {
    fn fixture(&self) -> Result<Fixture, ConformanceError> {
        Fixture::new()
            .with([
                book("b01", "Dune", 412),
                book("b02", "Emma", 288),
                book("b03", "Ulysses", 730),
                book("b04", "Beloved", 324),
                book("b05", "Walden", 352),
            ])?
            .with([magazine("m01", "Wired"), magazine("m02", "Byte")])
    }

    fn new_document(&self) -> Book {
        book("b99", "Middlemarch", 880)
    }

    fn updated_document(&self) -> Book {
        book("b03", "Ulysses (annotated)", 730)
    }

    fn sort_field(&self) -> String {
        "pages".to_string()
    }
}

impl RestFixture<Book> for BookFixture {
    fn resource(&self) -> String {
        "books".to_string()
    }

    fn invalid_document(&self) -> InvalidDocument {
        InvalidDocument {
            body: json!({"isbn": "b77", "title": "", "pages": 0}),
            errors: vec![
                ValidationError::new("Book", "title", "must not be blank", json!("")),
                ValidationError::new("Book", "pages", "must be positive", json!(0)),
            ],
        }
    }

    fn patch(&self) -> Value {
        json!({"title": "Ulysses (patched)"})
    }
}

/// A fixture too small for scenarios that need two documents.
pub struct SingleBookFixture;

impl CrudFixture<Book> for SingleBookFixture {
    fn fixture(&self) -> Result<Fixture, ConformanceError> {
        Fixture::new().with([book("b01", "Dune", 412)])
    }

    fn new_document(&self) -> Book {
        book("b99", "Middlemarch", 880)
    }

    fn updated_document(&self) -> Book {
        book("b01", "Dune (revised)", 412)
    }

    fn sort_field(&self) -> String {
        "pages".to_string()
    }
}

/// [`BookFixture`] with a page size of zero.
pub struct ZeroPageFixture;

impl CrudFixture<Book> for ZeroPageFixture {
    fn fixture(&self) -> Result<Fixture, ConformanceError> {
        BookFixture.fixture()
    }

    fn new_document(&self) -> Book {
        BookFixture.new_document()
    }

    fn updated_document(&self) -> Book {
        BookFixture.updated_document()
    }

    fn sort_field(&self) -> String {
        BookFixture.sort_field()
    }

    fn page_size(&self) -> usize {
        0
    }
}

impl RestFixture<Book> for ZeroPageFixture {
    fn resource(&self) -> String {
        BookFixture.resource()
    }

    fn invalid_document(&self) -> InvalidDocument {
        BookFixture.invalid_document()
    }

    fn patch(&self) -> Value {
        BookFixture.patch()
    }
}

pub fn book_repository(store: &Arc<MemoryStore>) -> StoreRepository<MemoryStore, Book> {
    StoreRepository::new(Arc::clone(store)).unwrap()
}

// ──────────────────────────────────────────────
// Broken repositories
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `save_all` commits the documents before the first null, then fails.
    PartialBatch,
    /// `find_all_sorted` always sorts ascending.
    IgnoresSortDirection,
    /// `exists_by_id(None)` answers `false` instead of rejecting.
    AcceptsNullId,
}

pub struct FaultyRepository {
    inner: StoreRepository<MemoryStore, Book>,
    fault: Fault,
}

impl FaultyRepository {
    pub fn new(store: &Arc<MemoryStore>, fault: Fault) -> Self {
        Self {
            inner: book_repository(store),
            fault,
        }
    }
}

#[async_trait]
impl DocumentRepository<Book> for FaultyRepository {
    async fn index(&self, document: Option<Book>) -> Result<Book, RepositoryError> {
        self.inner.index(document).await
    }

    async fn save(&self, document: Option<Book>) -> Result<Book, RepositoryError> {
        self.inner.save(document).await
    }

    async fn save_all(&self, documents: Vec<Option<Book>>) -> Result<Vec<Book>, RepositoryError> {
        if self.fault != Fault::PartialBatch {
            return self.inner.save_all(documents).await;
        }
        let mut saved = Vec::new();
        for document in documents {
            saved.push(self.inner.save(document).await?);
        }
        Ok(saved)
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        self.inner.find_all().await
    }

    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<Book>, RepositoryError> {
        self.inner.find_all_by_id(ids).await
    }

    async fn find_all_sorted(&self, sort: &Sort) -> Result<Vec<Book>, RepositoryError> {
        if self.fault == Fault::IgnoresSortDirection {
            return self.inner.find_all_sorted(&Sort::asc(&sort.field)).await;
        }
        self.inner.find_all_sorted(sort).await
    }

    async fn find_all_paged(&self, page: &PageRequest) -> Result<Page<Book>, RepositoryError> {
        self.inner.find_all_paged(page).await
    }

    async fn find_by_id(&self, id: Option<&str>) -> Result<Option<Book>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn exists_by_id(&self, id: Option<&str>) -> Result<bool, RepositoryError> {
        match (self.fault, id) {
            (Fault::AcceptsNullId, None) => Ok(false),
            _ => self.inner.exists_by_id(id).await,
        }
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.inner.count().await
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        self.inner.delete_all().await
    }

    async fn delete_all_by_id(&self, ids: &[String]) -> Result<(), RepositoryError> {
        self.inner.delete_all_by_id(ids).await
    }

    async fn delete_all_of(&self, documents: &[Book]) -> Result<(), RepositoryError> {
        self.inner.delete_all_of(documents).await
    }

    async fn delete(&self, document: Option<&Book>) -> Result<(), RepositoryError> {
        self.inner.delete(document).await
    }

    async fn delete_by_id(&self, id: Option<&str>) -> Result<(), RepositoryError> {
        self.inner.delete_by_id(id).await
    }
}

// ──────────────────────────────────────────────
// Reference resource server
// ──────────────────────────────────────────────

pub const SERVER_PAGE_SIZE: usize = 20;

/// Deviations the reference server can be told to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quirk {
    /// Uses the page count as the last page index, so the last page still
    /// advertises `next`.
    NextOnLastPage,
    /// Answers a successful `POST` with 200 instead of 201.
    CreatedAsOk,
    /// Applies `sort` only when the listing is explicitly paged.
    UnpagedIgnoresSort,
    /// Reports validation errors in reverse order.
    SwappedErrors,
}

struct ServerState {
    repository: StoreRepository<MemoryStore, Book>,
    base_url: String,
    quirk: Option<Quirk>,
}

impl ServerState {
    fn resource(&self, book: Book) -> Resource<Book> {
        let id = book.isbn.clone().unwrap_or_default();
        Resource::expected(book, &self.base_url, "books", "book", &id)
    }

    /// Decode and validate a request body, or the 400 response to send instead.
    fn parse_book(&self, body: &[u8]) -> Result<Book, Response> {
        if body.is_empty() {
            return Err(bad_request("request body is required"));
        }
        let book: Book =
            serde_json::from_slice(body).map_err(|e| bad_request(&e.to_string()))?;
        let mut errors = validate(&book);
        if errors.is_empty() {
            return Ok(book);
        }
        if self.quirk == Some(Quirk::SwappedErrors) {
            errors.reverse();
        }
        Err((StatusCode::BAD_REQUEST, Json(ErrorReport { errors })).into_response())
    }
}

/// Serve `/books` over `store` on an ephemeral port; returns the base URL.
pub async fn spawn_book_server(store: Arc<MemoryStore>, quirk: Option<Quirk>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let state = Arc::new(ServerState {
        repository: book_repository(&store),
        base_url: base_url.clone(),
        quirk,
    });

    let app = Router::new()
        .route(
            "/books",
            get(handle_list).post(handle_create).delete(handle_delete_all),
        )
        .route(
            "/books/{id}",
            get(handle_get)
                .put(handle_replace)
                .patch(handle_patch)
                .delete(handle_delete),
        )
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base_url
}

fn internal(e: RepositoryError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

fn validate(book: &Book) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if book.title.trim().is_empty() {
        errors.push(ValidationError::new(
            "Book",
            "title",
            "must not be blank",
            json!(book.title),
        ));
    }
    if book.pages <= 0 {
        errors.push(ValidationError::new(
            "Book",
            "pages",
            "must be positive",
            json!(book.pages),
        ));
    }
    errors
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<usize>,
    size: Option<usize>,
    sort: Option<String>,
}

async fn handle_list(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let size = params.size.unwrap_or(SERVER_PAGE_SIZE);
    if size == 0 {
        return bad_request("size must be positive");
    }
    let number = params.page.unwrap_or(0);
    let mut request = PageRequest::new(number, size);
    let unpaged = params.page.is_none() && params.size.is_none();
    let sort = match state.quirk {
        Some(Quirk::UnpagedIgnoresSort) if unpaged => None,
        _ => params.sort.as_ref(),
    };
    if let Some(sort) = sort {
        let (field, direction) = sort.split_once(',').unwrap_or((sort.as_str(), "asc"));
        request = request.with_sort(if direction == "desc" {
            Sort::desc(field)
        } else {
            Sort::asc(field)
        });
    }

    let page = match state.repository.find_all_paged(&request).await {
        Ok(page) => page,
        Err(e) => return internal(e),
    };
    let total = page.total_elements;
    let last = match state.quirk {
        Some(Quirk::NextOnLastPage) => page_count(total, size) as i64,
        _ => last_page_index(total, size),
    };

    let sort_query = params
        .sort
        .as_ref()
        .map(|s| format!("&sort={s}"))
        .unwrap_or_default();
    let href = |n: i64| format!("{}/books?page={n}&size={size}{sort_query}", state.base_url);
    let mut links = vec![
        Link::new("first", &href(0)),
        Link::new("last", &href(last.max(0))),
        Link::new("profile", &format!("{}/profile/books", state.base_url)),
    ];
    if number > 0 {
        links.push(Link::new("prev", &href(number as i64 - 1)));
    }
    if (number as i64) < last {
        links.push(Link::new("next", &href(number as i64 + 1)));
    }

    let body = PagedResources {
        page: PageMetadata {
            size: size as u64,
            total_elements: total,
            total_pages: page.total_pages(),
            number: number as u64,
        },
        content: page
            .content
            .into_iter()
            .map(|book| state.resource(book))
            .collect(),
        links,
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn handle_create(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let book = match state.parse_book(&body) {
        Ok(book) => book,
        Err(response) => return response,
    };
    let Some(id) = book.isbn.clone() else {
        return bad_request("isbn is required");
    };
    match state.repository.exists_by_id(Some(id.as_str())).await {
        Ok(true) => return StatusCode::CONFLICT.into_response(),
        Ok(false) => {}
        Err(e) => return internal(e),
    }
    let status = match state.quirk {
        Some(Quirk::CreatedAsOk) => StatusCode::OK,
        _ => StatusCode::CREATED,
    };
    match state.repository.save(Some(book)).await {
        Ok(saved) => (status, Json(state.resource(saved))).into_response(),
        Err(e) => internal(e),
    }
}

async fn handle_get(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> Response {
    match state.repository.find_by_id(Some(id.as_str())).await {
        Ok(Some(book)) => (StatusCode::OK, Json(state.resource(book))).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal(e),
    }
}

async fn handle_replace(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    match state.repository.exists_by_id(Some(id.as_str())).await {
        Ok(true) => {}
        Ok(false) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal(e),
    }
    let mut book = match state.parse_book(&body) {
        Ok(book) => book,
        Err(response) => return response,
    };
    book.isbn = Some(id);
    match state.repository.save(Some(book)).await {
        Ok(saved) => (StatusCode::OK, Json(state.resource(saved))).into_response(),
        Err(e) => internal(e),
    }
}

async fn handle_patch(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let stored = match state.repository.find_by_id(Some(id.as_str())).await {
        Ok(Some(book)) => book,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal(e),
    };
    let patch: Value = match serde_json::from_slice(&body) {
        Ok(Value::Object(patch)) => Value::Object(patch),
        _ => return bad_request("patch must be a JSON object"),
    };
    let mut merged = match serde_json::to_value(&stored) {
        Ok(value) => value,
        Err(e) => return bad_request(&e.to_string()),
    };
    if let (Value::Object(fields), Value::Object(changes)) = (&mut merged, patch) {
        for (key, value) in changes {
            if value.is_null() {
                fields.remove(&key);
            } else {
                fields.insert(key, value);
            }
        }
    }
    let mut book = match state.parse_book(merged.to_string().as_bytes()) {
        Ok(book) => book,
        Err(response) => return response,
    };
    book.isbn = Some(id);
    match state.repository.save(Some(book)).await {
        Ok(saved) => (StatusCode::OK, Json(state.resource(saved))).into_response(),
        Err(e) => internal(e),
    }
}

async fn handle_delete(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> Response {
    match state.repository.exists_by_id(Some(id.as_str())).await {
        Ok(true) => {}
        Ok(false) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal(e),
    }
    match state.repository.delete_by_id(Some(id.as_str())).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal(e),
    }
}

async fn handle_delete_all(State(state): State<Arc<ServerState>>) -> Response {
    match state.repository.delete_all().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal(e),
    }
}
