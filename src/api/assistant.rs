use axum::{extract::State, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::assistant::models::{Insights, QueryAnswer, Recommendations};
use crate::assistant::service;
use crate::auth::Claims;
use crate::domain::DomainError;
use crate::services::auth_service;

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    pub question: Option<String>,
}

pub async fn query(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let question = payload.question.unwrap_or_default();
    let answer = service::handle_query(&db, &user, &question).await?;
    Ok(Json(answer))
}

pub async fn recommendations(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<Json<Recommendations>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let result = service::get_recommendations(&db, &user).await?;
    Ok(Json(result))
}

pub async fn insights(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<Json<Insights>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    let result = service::get_insights(&db, &user).await?;
    Ok(Json(result))
}
