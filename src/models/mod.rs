pub mod book;
pub mod user;

pub use book::{BookDetail, BookSummary, ReadingStatus};
pub use user::{Role, UserDetail, UserSummary};
