//! Domain layer - business-level error taxonomy shared by services and handlers.

pub mod errors;

pub use errors::{DomainError, DomainResult};
