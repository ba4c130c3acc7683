use sea_orm::*;

use crate::models::book::{self, ReadingStatus};
use crate::models::user::{self, Role};
use crate::services::auth_service;

/// Demo data for local development: one admin, one reader, a small shelf.
/// Safe to run twice; existing accounts are left alone.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), String> {
    let admin = find_or_register(db, "Admin", "admin@example.com", "Admin123!", Role::Admin).await?;
    let reader =
        find_or_register(db, "Reader", "reader@example.com", "Reader123!", Role::User).await?;

    let existing = book::Entity::find()
        .filter(book::Column::UserId.eq(reader.id))
        .count(db)
        .await
        .map_err(|e| e.to_string())?;
    if existing > 0 {
        return Ok(());
    }

    let shelf: [(&str, &str, &str, f64, i32, ReadingStatus, i32); 5] = [
        (
            "The Hobbit",
            "J.R.R. Tolkien",
            "Fantasy",
            14.99,
            310,
            ReadingStatus::Completed,
            reader.id,
        ),
        (
            "Dune",
            "Frank Herbert",
            "Sci-Fi",
            19.50,
            412,
            ReadingStatus::Reading,
            reader.id,
        ),
        (
            "The Fellowship of the Ring",
            "J.R.R. Tolkien",
            "Fantasy",
            16.00,
            423,
            ReadingStatus::Planned,
            reader.id,
        ),
        (
            "Foundation",
            "Isaac Asimov",
            "Sci-Fi",
            12.25,
            255,
            ReadingStatus::Completed,
            admin.id,
        ),
        (
            "I, Robot",
            "Isaac Asimov",
            "Sci-Fi",
            9.99,
            224,
            ReadingStatus::Planned,
            admin.id,
        ),
    ];

    for (title, author, genre, price, pages, status, owner) in shelf {
        let entry = book::ActiveModel {
            title: Set(title.to_owned()),
            author: Set(Some(author.to_owned())),
            genre: Set(Some(genre.to_owned())),
            price: Set(Some(price)),
            pages: Set(Some(pages)),
            reading_status: Set(status),
            user_id: Set(owner),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };
        entry.insert(db).await.map_err(|e| e.to_string())?;
    }

    Ok(())
}

async fn find_or_register(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<user::Model, String> {
    if let Some(existing) = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(|e| e.to_string())?
    {
        return Ok(existing);
    }

    auth_service::register_user_with_role(db, name, email, password, role)
        .await
        .map_err(|e| e.to_string())
}
