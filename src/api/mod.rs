pub mod admin;
pub mod assistant;
pub mod auth;
pub mod books;
pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sea_orm::DatabaseConnection;

pub fn api_router(db: DatabaseConnection) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            put(books::update_book).delete(books::delete_book),
        )
        // Admin
        .route(
            "/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/admin/users/:id",
            patch(admin::update_user).delete(admin::delete_user),
        )
        .route("/admin/books", get(admin::list_books))
        .route("/admin/books/:id", delete(admin::delete_book))
        // Assistant
        .route("/ai/query", post(assistant::query))
        .route("/ai/recommendations", get(assistant::recommendations))
        .route("/ai/insights", get(assistant::insights))
        .with_state(db)
}
