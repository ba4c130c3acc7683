use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed reading-status set, stored as TEXT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[sea_orm(string_value = "planned")]
    Planned,
    #[sea_orm(string_value = "reading")]
    Reading,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Planned => "planned",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
        }
    }

    /// Case-insensitive parse; returns None for anything outside the set.
    pub fn parse(raw: &str) -> Option<ReadingStatus> {
        match raw.trim().to_lowercase().as_str() {
            "planned" => Some(ReadingStatus::Planned),
            "reading" => Some(ReadingStatus::Reading),
            "completed" => Some(ReadingStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub pages: Option<i32>,
    pub reading_status: ReadingStatus,
    pub user_id: i32,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// DTO for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub pages: Option<i32>,
    pub reading_status: ReadingStatus,
    pub user_id: i32,
}

impl From<Model> for BookSummary {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            author: model.author,
            genre: model.genre,
            price: model.price,
            pages: model.pages,
            reading_status: model.reading_status,
            user_id: model.user_id,
        }
    }
}

/// DTO for admin listings, includes the creation timestamp
#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub pages: Option<i32>,
    pub reading_status: ReadingStatus,
    pub user_id: i32,
    pub created_at: String,
}

impl From<Model> for BookDetail {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            author: model.author,
            genre: model.genre,
            price: model.price,
            pages: model.pages,
            reading_status: model.reading_status,
            user_id: model.user_id,
            created_at: model.created_at,
        }
    }
}
