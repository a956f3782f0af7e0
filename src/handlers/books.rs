use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{info, instrument, warn};

use super::{parse_object_id, JsonBody, QueryParams};
use crate::error::{AppError, AppResult};
use crate::models::{Book, MessageResponse};
use crate::query::{BookListParams, BookQuery, CategoryParams};
use crate::state::AppState;

fn book_not_found() -> AppError {
    AppError::NotFound("Book not found".to_string())
}

#[utoipa::path(
    post,
    path = "/book",
    request_body = Book,
    responses(
        (status = 200, description = "Created book with its new id", body = Book),
        (status = 400, description = "Malformed body")
    ),
    tag = "Books"
)]
#[instrument(name = "handler::create_book", skip_all)]
pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(book): JsonBody<Book>,
) -> AppResult<Json<Book>> {
    let mut book = Book { id: None, ..book };
    let id = state.store.insert_book(&book).await?;
    book.id = Some(id);
    info!("Created book {}", id);
    Ok(Json(book))
}

/// Filtered, sorted and paginated listing.
#[utoipa::path(
    get,
    path = "/books",
    params(BookListParams),
    responses((status = 200, description = "One page of matching books", body = [Book])),
    tag = "Books"
)]
#[instrument(name = "handler::list_books", skip(state))]
pub async fn list_books(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<BookListParams>,
) -> AppResult<Json<Vec<Book>>> {
    let query = BookQuery::from_params(&params);
    let books = state.store.find_books(&query).await?;
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/book/{id}",
    params(("id" = String, Path, description = "Book object id")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "Missing book or malformed id")
    ),
    tag = "Books"
)]
#[instrument(name = "handler::get_book", skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let id = parse_object_id(&id).map_err(|_| book_not_found())?;
    state
        .store
        .find_book(id)
        .await?
        .map(Json)
        .ok_or_else(book_not_found)
}

/// Sets every field present in the body; absent fields are left as stored.
#[utoipa::path(
    put,
    path = "/book/{id}",
    params(("id" = String, Path, description = "Book object id")),
    request_body = Book,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "Malformed id or empty update"),
        (status = 404, description = "No book with this id")
    ),
    tag = "Books"
)]
#[instrument(name = "handler::update_book", skip(state, patch))]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Book>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_object_id(&id)?;
    if patch.is_empty_patch() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let matched = state.store.update_book(id, &patch).await?;
    if matched == 0 {
        warn!("Update matched no book {}", id);
        return Err(book_not_found());
    }
    info!("Updated book {}", id);
    Ok(Json(MessageResponse::new("Book updated")))
}

/// Reports success whether or not a book was removed.
#[utoipa::path(
    delete,
    path = "/book/{id}",
    params(("id" = String, Path, description = "Book object id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Malformed id")
    ),
    tag = "Books"
)]
#[instrument(name = "handler::delete_book", skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_object_id(&id)?;
    let deleted = state.store.delete_book(id).await?;
    info!("Deleted {} book(s) with id {}", deleted, id);
    Ok(Json(MessageResponse::new("Book deleted")))
}

#[utoipa::path(
    get,
    path = "/book/related/{id}",
    params(("id" = String, Path, description = "Book object id")),
    responses(
        (status = 200, description = "Up to 12 books of the same productType", body = [Book]),
        (status = 404, description = "Missing book or malformed id")
    ),
    tag = "Books"
)]
#[instrument(name = "handler::related_books", skip(state))]
pub async fn related_books(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let id = parse_object_id(&id).map_err(|_| book_not_found())?;
    let book = state.store.find_book(id).await?.ok_or_else(book_not_found)?;

    let related = state
        .store
        .find_books(&BookQuery::related_to(id, &book))
        .await?;
    Ok(Json(related))
}

#[utoipa::path(
    get,
    path = "/book-info",
    params(CategoryParams),
    responses((status = 200, description = "Books in the category, or all for \"All\"", body = [Book])),
    tag = "Books"
)]
#[instrument(name = "handler::books_by_category", skip(state))]
pub async fn books_by_category(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<CategoryParams>,
) -> AppResult<Json<Vec<Book>>> {
    let query = BookQuery::in_category(params.category.as_deref());
    Ok(Json(state.store.find_books(&query).await?))
}

#[utoipa::path(
    get,
    path = "/book-data",
    responses((status = 200, description = "Every book, unpaginated", body = [Book])),
    tag = "Books"
)]
#[instrument(name = "handler::all_books", skip(state))]
pub async fn all_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(state.store.find_books(&BookQuery::all()).await?))
}
