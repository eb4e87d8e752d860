use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    state::AppState,
    uploads::{self, MAX_UPLOAD_BYTES},
};

use super::dto::CreateBookResponse;
use super::repo::Book;
use super::services;

/// Two files at the per-file cap plus form-field overhead.
const MULTIPART_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES as usize + 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/:id", get(get_book))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/books", post(create_book))
        .route(
            "/books/:id",
            axum::routing::patch(update_book).delete(delete_book),
        )
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
}

#[instrument(skip(state, mp))]
pub async fn create_book(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<CreateBookResponse>), AppError> {
    let dir = std::path::PathBuf::from(&state.config.upload.dir);
    let form = uploads::stage_book_form(mp, &dir).await?;
    let book = services::create_book(&state, user_id, form).await?;
    Ok((StatusCode::CREATED, Json(CreateBookResponse { id: book.id })))
}

#[instrument(skip(state, mp))]
pub async fn update_book(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Book>, AppError> {
    let dir = std::path::PathBuf::from(&state.config.upload.dir);
    let form = uploads::stage_book_form(mp, &dir).await?;
    let book = services::update_book(&state, user_id, id, form).await?;
    Ok(Json(book))
}

#[instrument(skip(state))]
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, AppError> {
    let books = Book::list(&state.db).await?;
    Ok(Json(books))
}

#[instrument(skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Book>, AppError> {
    let book = Book::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;
    Ok(Json(book))
}

#[instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_book(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
