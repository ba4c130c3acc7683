use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::{create_jwt, Claims};
use crate::domain::DomainError;
use crate::models::user::UserSummary;
use crate::services::auth_service;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Field-keyed validation, mirrored in the response body so forms can
/// attach messages to individual inputs.
fn validate_register_payload(payload: &RegisterRequest) -> Map<String, Value> {
    let mut errors = Map::new();

    let name = payload.name.as_deref().unwrap_or("").trim();
    let email = payload.email.as_deref().unwrap_or("").trim();
    let password = payload.password.as_deref().unwrap_or("");

    if name.is_empty() {
        errors.insert("name".to_string(), json!("Name is required."));
    }

    if email.is_empty() {
        errors.insert("email".to_string(), json!("Email is required."));
    } else if !email.contains('@') {
        errors.insert("email".to_string(), json!("Email is not valid."));
    }

    if password.is_empty() {
        errors.insert("password".to_string(), json!("Password is required."));
    } else if !auth_service::password_is_strong(password) {
        errors.insert(
            "password".to_string(),
            json!(auth_service::PASSWORD_POLICY_MESSAGE),
        );
    }

    errors
}

pub async fn register(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, DomainError> {
    let errors = validate_register_payload(&payload);
    if !errors.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response());
    }

    auth_service::register_user(
        &db,
        payload.name.as_deref().unwrap_or(""),
        payload.email.as_deref().unwrap_or(""),
        payload.password.as_deref().unwrap_or(""),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created" })),
    )
        .into_response())
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, DomainError> {
    let mut errors = Map::new();
    if payload.email.as_deref().unwrap_or("").trim().is_empty() {
        errors.insert("email".to_string(), json!("Email is required."));
    }
    if payload.password.as_deref().unwrap_or("").is_empty() {
        errors.insert("password".to_string(), json!("Password is required."));
    }
    if !errors.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response());
    }

    let user = auth_service::authenticate_user(
        &db,
        payload.email.as_deref().unwrap_or(""),
        payload.password.as_deref().unwrap_or(""),
    )
    .await?;

    tracing::info!("Login succeeded for user {}", user.id);
    let token = create_jwt(user.id, user.role.as_str()).map_err(DomainError::Database)?;

    Ok(Json(json!({
        "access_token": token,
        "user": UserSummary::from(user),
    }))
    .into_response())
}

pub async fn me(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<Json<UserSummary>, DomainError> {
    let user = auth_service::get_user_or_fail(&db, claims.user_id()?).await?;
    Ok(Json(UserSummary::from(user)))
}
