use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Claims;
use crate::domain::DomainError;
use crate::models::book::BookSummary;
use crate::services::auth_service;
use crate::services::book_service::{self, BookFilter, CreateBookInput, UpdateBookInput};

#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    pub genre: Option<String>,
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("genre" = Option<String>, Query, description = "Case-insensitive exact genre match"),
        ("status" = Option<String>, Query, description = "Reading status: planned, reading or completed"),
    ),
    responses(
        (status = 200, description = "Books visible to the caller"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_books(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<BookListQuery>,
) -> Result<Json<Vec<BookSummary>>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;

    let books = book_service::list_books(
        &db,
        &user,
        BookFilter {
            genre: params.genre,
            status: params.status,
        },
    )
    .await?;

    Ok(Json(books.into_iter().map(BookSummary::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/books",
    responses(
        (status = 201, description = "Book created"),
        (status = 400, description = "Validation failed"),
    )
)]
pub async fn create_book(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(input): Json<CreateBookInput>,
) -> Result<(StatusCode, Json<BookSummary>), DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let book = book_service::create_book(&db, &user, input).await?;
    Ok((StatusCode::CREATED, Json(BookSummary::from(book))))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    responses(
        (status = 200, description = "Book updated"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "No such book"),
    )
)]
pub async fn update_book(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(input): Json<UpdateBookInput>,
) -> Result<Json<BookSummary>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let book = book_service::update_book(&db, &user, id, input).await?;
    Ok(Json(BookSummary::from(book)))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    responses(
        (status = 200, description = "Book deleted"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "No such book"),
    )
)]
pub async fn delete_book(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    book_service::delete_book(&db, &user, id).await?;
    Ok(Json(json!({ "message": "Book deleted" })))
}
