//! Admin-only operations on users and the full catalog.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::domain::{DomainError, DomainResult};
use crate::models::book::{self, Entity as BookEntity};
use crate::models::user::{self, Entity as UserEntity, Role};
use crate::services::{auth_service, book_service};

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Admin user update. Empty or omitted fields are skipped.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

fn require_admin(user: &user::Model) -> DomainResult<()> {
    if !user.is_admin() {
        return Err(DomainError::Authorization(
            "Not authorized. Admins only.".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_users(
    db: &DatabaseConnection,
    current_user: &user::Model,
) -> DomainResult<Vec<user::Model>> {
    require_admin(current_user)?;
    Ok(UserEntity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?)
}

pub async fn create_user(
    db: &DatabaseConnection,
    current_user: &user::Model,
    input: CreateUserInput,
) -> DomainResult<user::Model> {
    require_admin(current_user)?;

    let role = match input.role.as_deref() {
        None => Role::User,
        Some(raw) if raw.trim().is_empty() => Role::User,
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            DomainError::Validation("Role must be 'user' or 'admin'".to_string())
        })?,
    };

    auth_service::register_user_with_role(
        db,
        input.name.as_deref().unwrap_or(""),
        input.email.as_deref().unwrap_or(""),
        input.password.as_deref().unwrap_or(""),
        role,
    )
    .await
}

pub async fn update_user(
    db: &DatabaseConnection,
    current_user: &user::Model,
    user_id: i32,
    input: UpdateUserInput,
) -> DomainResult<user::Model> {
    require_admin(current_user)?;

    let target = UserEntity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("User not found.".to_string()))?;

    let new_email = match input.email.as_deref().map(|e| e.trim().to_lowercase()) {
        Some(email) if !email.is_empty() => {
            let taken = UserEntity::find()
                .filter(user::Column::Email.eq(&email))
                .filter(user::Column::Id.ne(user_id))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(DomainError::Validation(
                    "Email already registered".to_string(),
                ));
            }
            Some(email)
        }
        _ => None,
    };

    let new_role = match input.role.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(Role::parse(raw).ok_or_else(|| {
            DomainError::Validation("Invalid role. Allowed values: 'user', 'admin'.".to_string())
        })?),
        _ => None,
    };

    let mut active: user::ActiveModel = target.into();

    if let Some(name) = input.name.as_deref().map(str::trim)
        && !name.is_empty()
    {
        active.name = Set(name.to_string());
    }
    if let Some(email) = new_email {
        active.email = Set(email);
    }
    if let Some(role) = new_role {
        active.role = Set(role);
    }

    Ok(active.update(db).await?)
}

/// Deletes a user together with every book they own. The books go first so
/// the catalog never holds rows pointing at a missing owner.
pub async fn delete_user(
    db: &DatabaseConnection,
    current_user: &user::Model,
    target_user_id: i32,
) -> DomainResult<()> {
    require_admin(current_user)?;

    if current_user.id == target_user_id {
        return Err(DomainError::Validation(
            "You cannot delete yourself.".to_string(),
        ));
    }

    let target = UserEntity::find_by_id(target_user_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("User not found.".to_string()))?;

    BookEntity::delete_many()
        .filter(book::Column::UserId.eq(target.id))
        .exec(db)
        .await?;

    let email = target.email.clone();
    target.delete(db).await?;
    tracing::info!("Admin {} deleted user {}", current_user.id, email);
    Ok(())
}

pub async fn list_books(
    db: &DatabaseConnection,
    current_user: &user::Model,
    filter: book_service::BookFilter,
) -> DomainResult<Vec<book::Model>> {
    require_admin(current_user)?;
    // The caller is an admin, so the catalog listing is already unscoped.
    book_service::list_books(db, current_user, filter).await
}

pub async fn delete_book(
    db: &DatabaseConnection,
    current_user: &user::Model,
    book_id: i32,
) -> DomainResult<()> {
    require_admin(current_user)?;
    book_service::delete_book(db, current_user, book_id).await
}
