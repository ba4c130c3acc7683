//! Registration and authentication rules.
//!
//! Email normalization (trim + lowercase) happens here, before the
//! uniqueness check and before storage, so every lookup sees one canonical
//! form. Password hashes never leave this layer in plaintext-comparable form.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::auth::{hash_password, verify_password};
use crate::domain::{DomainError, DomainResult};
use crate::models::user::{self, Entity as UserEntity, Role};

pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be at least 8 characters and contain \
     one uppercase letter, one number, and one special character.";

/// At least 8 chars, one uppercase, one digit, one non-alphanumeric symbol.
pub fn password_is_strong(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

pub async fn register_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> DomainResult<user::Model> {
    register_user_with_role(db, name, email, password, Role::User).await
}

pub async fn register_user_with_role(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> DomainResult<user::Model> {
    let name = name.trim();
    let email = email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(DomainError::Validation(
            "Name, email and password are required.".to_string(),
        ));
    }

    if !email.contains('@') {
        return Err(DomainError::Validation("Email is not valid.".to_string()));
    }

    let existing = UserEntity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(DomainError::Validation(
            "Email already registered".to_string(),
        ));
    }

    if !password_is_strong(password) {
        return Err(DomainError::Validation(PASSWORD_POLICY_MESSAGE.to_string()));
    }

    let password_hash = hash_password(password).map_err(DomainError::Database)?;

    let new_user = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    let model = new_user.insert(db).await?;
    tracing::info!("Registered user {} ({})", model.id, model.email);
    Ok(model)
}

/// The failure message is identical for an unknown email and a wrong
/// password, so callers cannot probe which addresses are registered.
pub async fn authenticate_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> DomainResult<user::Model> {
    let email = email.trim().to_lowercase();

    if email.is_empty() || password.is_empty() {
        return Err(DomainError::Auth("Invalid credentials".to_string()));
    }

    let user = match UserEntity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
    {
        Some(u) => u,
        None => {
            tracing::warn!("Login failed: no user for {}", email);
            return Err(DomainError::Auth("Invalid credentials".to_string()));
        }
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        _ => {
            tracing::warn!("Login failed: bad password for {}", email);
            Err(DomainError::Auth("Invalid credentials".to_string()))
        }
    }
}

/// Resolve the identity embedded in a bearer credential. The user may have
/// been deleted after the token was issued.
pub async fn get_user_or_fail(db: &DatabaseConnection, user_id: i32) -> DomainResult<user::Model> {
    UserEntity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("User not found.".to_string()))
}
