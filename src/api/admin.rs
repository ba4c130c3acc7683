use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::auth::Claims;
use crate::domain::DomainError;
use crate::models::book::BookDetail;
use crate::models::user::UserDetail;
use crate::services::admin_service::{self, CreateUserInput, UpdateUserInput};
use crate::services::auth_service;
use crate::services::book_service::BookFilter;

use super::books::BookListQuery;

pub async fn list_users(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<Json<Vec<UserDetail>>, DomainError> {
    let current = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let users = admin_service::list_users(&db, &current).await?;
    Ok(Json(users.into_iter().map(UserDetail::from).collect()))
}

pub async fn create_user(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserDetail>), DomainError> {
    let current = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let user = admin_service::create_user(&db, &current, input).await?;
    Ok((StatusCode::CREATED, Json(UserDetail::from(user))))
}

pub async fn update_user(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<UserDetail>, DomainError> {
    let current = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let user = admin_service::update_user(&db, &current, id, input).await?;
    Ok(Json(UserDetail::from(user)))
}

pub async fn delete_user(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let current = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    admin_service::delete_user(&db, &current, id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}

pub async fn list_books(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<BookListQuery>,
) -> Result<Json<Vec<BookDetail>>, DomainError> {
    let current = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let books = admin_service::list_books(
        &db,
        &current,
        BookFilter {
            genre: params.genre,
            status: params.status,
        },
    )
    .await?;
    Ok(Json(books.into_iter().map(BookDetail::from).collect()))
}

pub async fn delete_book(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let current = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    admin_service::delete_book(&db, &current, id).await?;
    Ok(Json(json!({ "message": "Book deleted" })))
}
