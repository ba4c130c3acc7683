//! Services Layer
//!
//! Pure business logic extracted from HTTP handlers: identity rules,
//! catalog rules, and the admin operations built on top of them.

pub mod admin_service;
pub mod auth_service;
pub mod book_service;
