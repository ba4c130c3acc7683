use serde::Serialize;
use std::collections::BTreeMap;

/// The closed set of questions the engine can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryIntent {
    OwnerWithMostBooks,
    MostPopularBook,
    FiveMostExpensiveBooks,
}

impl QueryIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryIntent::OwnerWithMostBooks => "owner_with_most_books",
            QueryIntent::MostPopularBook => "most_popular_book",
            QueryIntent::FiveMostExpensiveBooks => "five_most_expensive_books",
        }
    }
}

/// Which slice of the catalog an answer was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryScope {
    AllUsers,
    AllBooks,
    YourBooks,
}

#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BookExample {
    pub author: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PricedBook {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: f64,
    pub owner_id: i32,
}

/// Shaped query result. The serde tag is the externally observable `type`
/// discriminator and matches the intent name.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryAnswer {
    OwnerWithMostBooks {
        user: OwnerSummary,
        book_count: i64,
        scope: QueryScope,
    },
    MostPopularBook {
        title: String,
        count: i64,
        example: BookExample,
        scope: QueryScope,
    },
    FiveMostExpensiveBooks {
        books: Vec<PricedBook>,
        scope: QueryScope,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrategy {
    UserPreference,
    MostPopularGenre,
}

#[derive(Debug, Serialize)]
pub struct RecommendedBook {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Recommendations {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub based_on_genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RecommendationStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub books: Vec<RecommendedBook>,
}

#[derive(Debug, Serialize)]
pub struct Insights {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user_genre_distribution: BTreeMap<String, i64>,
    pub status_distribution: BTreeMap<String, i64>,
    pub average_pages: Option<f64>,
    pub min_pages: Option<i32>,
    pub max_pages: Option<i32>,
    pub total_pages: Option<i64>,
    pub average_price: Option<f64>,
    pub total_books: i64,
    pub favorite_genre: Option<String>,
    pub most_popular_genre_overall: Option<String>,
    pub summary: String,
}
