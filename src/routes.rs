use axum::{
    Json, Router,
    extract::{OriginalUri, Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::LOCATION},
    routing::get,
};
use std::sync::Arc;

use crate::config::Config;
use crate::criteria::{BookField, BooksCriteria};
use crate::errors::{ApiError, ID_EXISTS, ID_INVALID, ID_NOT_FOUND, ID_NULL};
use crate::models::{Book, BookPatch, BookPayload};
use crate::openapi;
use crate::pagination::{PageRequest, generate_pagination_headers};
use crate::service::BooksService;

pub const BOOKS_PATH: &str = "/api/books";
const ENTITY_NAME: &str = "books";

#[derive(Clone)]
pub struct AppState {
    pub service: BooksService,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(service: BooksService, config: Config) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}

/// `X-{app}-alert: {app}.books.{action}` and `X-{app}-params: {id}`.
///
/// Headers are skipped when the configured application name is not a valid
/// header token.
fn alert_headers(app_name: &str, action: &str, id: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let entries = [
        (
            format!("x-{app_name}-alert"),
            format!("{app_name}.{ENTITY_NAME}.{action}"),
        ),
        (format!("x-{app_name}-params"), id.to_string()),
    ];

    for (name, value) in entries {
        match (
            HeaderName::try_from(name.to_ascii_lowercase()),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(app_name, "Application name is not usable in alert headers"),
        }
    }
    headers
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn entity_not_found() -> ApiError {
    ApiError::bad_request_with_key("Entity not found", ID_NOT_FOUND)
}

/// Checks the body id of an update against the path id and the store.
async fn check_update_target(
    service: &BooksService,
    body_id: Option<i64>,
    path_id: i64,
) -> Result<(), ApiError> {
    let Some(body_id) = body_id else {
        return Err(ApiError::bad_request_with_key("Invalid id", ID_NULL));
    };
    if body_id != path_id {
        return Err(ApiError::bad_request_with_key("Invalid ID", ID_INVALID));
    }
    if !service.exists(path_id).await? {
        return Err(entity_not_found());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Body carries an id or fails validation")
    ),
    tag = "books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<Book>), ApiError> {
    let payload = json_body(body)?;
    tracing::debug!(?payload, "REST request to save Book");
    if payload.id.is_some() {
        return Err(ApiError::bad_request_with_key(
            "A new book cannot already have an ID",
            ID_EXISTS,
        ));
    }

    let book = state.service.save(payload.validate()?).await?;

    let mut headers = alert_headers(&state.config.app_name, "created", book.id);
    if let Ok(location) = HeaderValue::try_from(format!("{BOOKS_PATH}/{}", book.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(book)))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Id of the book to replace")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book replaced", body = Book),
        (status = 400, description = "Missing, mismatched or unknown id, or invalid body")
    ),
    tag = "books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(HeaderMap, Json<Book>), ApiError> {
    let payload = json_body(body)?;
    tracing::debug!(id, ?payload, "REST request to update Book");
    let body_id = payload.id;
    let book = payload.validate()?;
    check_update_target(&state.service, body_id, id).await?;

    let updated = state
        .service
        .update(id, book)
        .await?
        .ok_or_else(entity_not_found)?;
    Ok((
        alert_headers(&state.config.app_name, "updated", updated.id),
        Json(updated),
    ))
}

/// Accepts `application/json` and `application/merge-patch+json`.
#[utoipa::path(
    patch,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Id of the book to update")),
    request_body(content = BookPatch, content_type = "application/merge-patch+json"),
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Missing, mismatched or unknown id, or invalid body")
    ),
    tag = "books"
)]
pub async fn partial_update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<BookPatch>, JsonRejection>,
) -> Result<(HeaderMap, Json<Book>), ApiError> {
    let patch = json_body(body)?;
    tracing::debug!(id, ?patch, "REST request to partial update Book");
    patch.validate()?;
    check_update_target(&state.service, patch.id, id).await?;

    let updated = state
        .service
        .partial_update(id, patch)
        .await?
        .ok_or_else(entity_not_found)?;
    Ok((
        alert_headers(&state.config.app_name, "updated", updated.id),
        Json(updated),
    ))
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("page" = Option<u64>, Query, description = "Zero-based page index"),
        ("size" = Option<u64>, Query, description = "Page size"),
        ("sort" = Option<String>, Query, description = "property[,asc|desc], repeatable"),
        ("id.equals" = Option<i64>, Query, description = "Also notEquals, in, notIn, specified, greaterThan, lessThan, ..."),
        ("title.contains" = Option<String>, Query, description = "Also equals, doesNotContain, in, ..."),
        ("price.greaterThanOrEqual" = Option<f64>, Query, description = "Also lessThan, equals, ..."),
        ("authorId.equals" = Option<i64>, Query, description = "Filters on the joined author"),
        ("distinct" = Option<bool>, Query, description = "De-duplicate the result rows")
    ),
    responses(
        (status = 200, description = "One page of matching books", body = [Book],
            headers(
                ("X-Total-Count" = u64, description = "Number of matching books"),
                ("Link" = String, description = "RFC 5988 pagination links")
            )
        ),
        (status = 400, description = "Malformed filter value or unknown sort property")
    ),
    tag = "books"
)]
pub async fn get_all_books(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<(HeaderMap, Json<Vec<Book>>), ApiError> {
    let criteria = BooksCriteria::from_query(&params)?;
    let page_request =
        PageRequest::from_query(&params, &state.config.pagination, BookField::from_name)?;
    tracing::debug!(%criteria, "REST request to get Books by criteria");

    let page = state
        .service
        .find_page_by_criteria(&criteria, &page_request)
        .await?;
    let headers = generate_pagination_headers(&uri, &page);
    Ok((headers, Json(page.content)))
}

#[utoipa::path(
    get,
    path = "/api/books/count",
    responses(
        (status = 200, description = "Number of books matching the criteria", body = u64),
        (status = 400, description = "Malformed filter value")
    ),
    tag = "books"
)]
pub async fn count_books(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<u64>, ApiError> {
    let criteria = BooksCriteria::from_query(&params)?;
    tracing::debug!(%criteria, "REST request to count Books by criteria");
    Ok(Json(state.service.count_by_criteria(&criteria).await?))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Id of the book")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "No book with this id")
    ),
    tag = "books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    tracing::debug!(id, "REST request to get Book");
    state
        .service
        .find_one(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Book", Some(id.to_string())))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Id of the book")),
    responses((status = 204, description = "Book deleted or already absent")),
    tag = "books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, HeaderMap), ApiError> {
    tracing::debug!(id, "REST request to delete Book");
    state.service.delete(id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        alert_headers(&state.config.app_name, "deleted", id),
    ))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(BOOKS_PATH, get(get_all_books).post(create_book))
        .route("/api/books/count", get(count_books))
        .route(
            "/api/books/{id}",
            get(get_book)
                .put(update_book)
                .patch(partial_update_book)
                .delete(delete_book),
        )
        .route("/v3/api-docs", get(openapi::api_docs))
        .with_state(state)
}
