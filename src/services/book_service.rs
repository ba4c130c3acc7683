//! Catalog rules: listing, creation, partial update, deletion.
//!
//! Every operation takes the requesting user; listing scopes to the caller
//! unless they are an admin, and mutation requires owner-or-admin.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::domain::{DomainError, DomainResult};
use crate::models::book::{self, Entity as BookEntity, ReadingStatus};
use crate::models::user;

pub const INVALID_STATUS_MESSAGE: &str =
    "Invalid reading status. Allowed values: planned, reading, completed.";

/// Filter parameters for listing books
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    pub genre: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub pages: Option<i32>,
    pub reading_status: Option<String>,
}

/// Partial update payload. The double `Option` distinguishes an omitted
/// field (outer `None`, preserved) from an explicit JSON `null` (inner
/// `None`, clears the column). `title` and `reading_status` are not
/// nullable, so a single `Option` is enough for them.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<Option<String>>,
    #[serde(default)]
    pub genre: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<Option<f64>>,
    #[serde(default)]
    pub pages: Option<Option<i32>>,
    pub reading_status: Option<String>,
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::Validation(
            "Price must be a non-negative number.".to_string(),
        ));
    }
    Ok(())
}

fn validate_pages(pages: i32) -> DomainResult<()> {
    if pages < 0 {
        return Err(DomainError::Validation(
            "Pages must be a non-negative integer.".to_string(),
        ));
    }
    Ok(())
}

fn parse_status_filter(raw: &str) -> DomainResult<Option<ReadingStatus>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    ReadingStatus::parse(raw)
        .map(Some)
        .ok_or_else(|| DomainError::Validation(INVALID_STATUS_MESSAGE.to_string()))
}

/// List books visible to the caller, newest first.
///
/// Admins see the full catalog, everyone else their own shelf. Filters are
/// applied after scoping: genre matches case-insensitively, and a status
/// outside the allowed set is rejected rather than silently ignored.
pub async fn list_books(
    db: &DatabaseConnection,
    user: &user::Model,
    filter: BookFilter,
) -> DomainResult<Vec<book::Model>> {
    let mut query = BookEntity::find();
    if !user.is_admin() {
        query = query.filter(book::Column::UserId.eq(user.id));
    }

    // Creation order, newest first; equal timestamps fall back to id.
    let mut books = query
        .order_by_desc(book::Column::CreatedAt)
        .order_by_desc(book::Column::Id)
        .all(db)
        .await?;

    if let Some(genre) = &filter.genre {
        let genre = genre.trim().to_lowercase();
        if !genre.is_empty() {
            books.retain(|b| {
                b.genre
                    .as_deref()
                    .is_some_and(|g| g.to_lowercase() == genre)
            });
        }
    }

    if let Some(status) = &filter.status
        && let Some(status) = parse_status_filter(status)?
    {
        books.retain(|b| b.reading_status == status);
    }

    Ok(books)
}

pub async fn create_book(
    db: &DatabaseConnection,
    user: &user::Model,
    input: CreateBookInput,
) -> DomainResult<book::Model> {
    let title = input.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return Err(DomainError::Validation("Title is required.".to_string()));
    }

    let reading_status = match input.reading_status.as_deref() {
        None => ReadingStatus::Planned,
        Some(raw) if raw.trim().is_empty() => ReadingStatus::Planned,
        Some(raw) => ReadingStatus::parse(raw)
            .ok_or_else(|| DomainError::Validation(INVALID_STATUS_MESSAGE.to_string()))?,
    };

    if let Some(price) = input.price {
        validate_price(price)?;
    }
    if let Some(pages) = input.pages {
        validate_pages(pages)?;
    }

    let genre = input
        .genre
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty());

    let new_book = book::ActiveModel {
        title: Set(title),
        author: Set(input.author),
        genre: Set(genre),
        price: Set(input.price),
        pages: Set(input.pages),
        reading_status: Set(reading_status),
        user_id: Set(user.id),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    Ok(new_book.insert(db).await?)
}

pub async fn update_book(
    db: &DatabaseConnection,
    user: &user::Model,
    book_id: i32,
    input: UpdateBookInput,
) -> DomainResult<book::Model> {
    let existing = BookEntity::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Book not found.".to_string()))?;

    if existing.user_id != user.id && !user.is_admin() {
        return Err(DomainError::Authorization(
            "Not authorized to edit this book.".to_string(),
        ));
    }

    let mut active: book::ActiveModel = existing.into();

    if let Some(title) = input.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("Title is required.".to_string()));
        }
        active.title = Set(title);
    }

    if let Some(raw) = input.reading_status
        && !raw.trim().is_empty()
    {
        let status = ReadingStatus::parse(&raw)
            .ok_or_else(|| DomainError::Validation(INVALID_STATUS_MESSAGE.to_string()))?;
        active.reading_status = Set(status);
    }

    if let Some(author) = input.author {
        active.author = Set(author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()));
    }

    if let Some(genre) = input.genre {
        active.genre = Set(genre
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty()));
    }

    if let Some(price) = input.price {
        if let Some(p) = price {
            validate_price(p)?;
        }
        active.price = Set(price);
    }

    if let Some(pages) = input.pages {
        if let Some(p) = pages {
            validate_pages(p)?;
        }
        active.pages = Set(pages);
    }

    Ok(active.update(db).await?)
}

pub async fn delete_book(
    db: &DatabaseConnection,
    user: &user::Model,
    book_id: i32,
) -> DomainResult<()> {
    let book = BookEntity::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Book not found.".to_string()))?;

    if book.user_id != user.id && !user.is_admin() {
        return Err(DomainError::Authorization(
            "Not authorized to delete this book.".to_string(),
        ));
    }

    book.delete(db).await?;
    Ok(())
}
