use axum::Json;
use utoipa::OpenApi;

use crate::models::{Book, BookPatch, BookPayload};
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "Books API", description = "CRUD and criteria queries for books"),
    paths(
        routes::create_book,
        routes::update_book,
        routes::partial_update_book,
        routes::get_all_books,
        routes::count_books,
        routes::get_book,
        routes::delete_book,
    ),
    components(schemas(Book, BookPayload, BookPatch)),
    tags((name = "books", description = "Book resource"))
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn api_docs() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
