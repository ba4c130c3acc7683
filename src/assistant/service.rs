//! The query engine: sanitize -> classify -> authorize-scope -> execute ->
//! shape. One shot per request, no state between calls.
//!
//! Classification is deliberately dumb: literal phrase lists plus a
//! conjunctive keyword fallback per intent, evaluated in a fixed priority
//! order with the first match winning. Matched intents must still be members
//! of `ALLOWED_INTENTS` before anything touches the database.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::collections::{BTreeMap, HashSet};

use crate::domain::{DomainError, DomainResult};
use crate::models::book::{self, Entity as BookEntity, ReadingStatus};
use crate::models::user::{self, Entity as UserEntity};

use super::models::{
    BookExample, Insights, OwnerSummary, PricedBook, QueryAnswer, QueryIntent, QueryScope,
    RecommendationStrategy, RecommendedBook, Recommendations,
};

const MAX_QUESTION_CHARS: usize = 500;
const MIN_QUESTION_CHARS: usize = 3;

const UNRECOGNIZED_QUESTION_MESSAGE: &str = "I don't understand this question. \
     Try: 'Who owns the most books?', \
     'Which is the most popular book?', or \
     'Show the five most expensive books.'";

/// Characters commonly used in injection payloads, stripped before matching.
static DENYLIST: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>"';\\]"#).expect("denylist pattern"));

/// Every intent the engine may execute. `parse_intent` can only produce
/// members of this set today; the check stays as a guard against future
/// intents being added to the classifier without being vetted here.
static ALLOWED_INTENTS: Lazy<HashSet<QueryIntent>> = Lazy::new(|| {
    [
        QueryIntent::OwnerWithMostBooks,
        QueryIntent::MostPopularBook,
        QueryIntent::FiveMostExpensiveBooks,
    ]
    .into_iter()
    .collect()
});

/// Truncate to the maximum length, strip denylisted characters, trim.
pub fn sanitize_question(text: &str) -> String {
    let truncated: String = text.chars().take(MAX_QUESTION_CHARS).collect();
    DENYLIST.replace_all(&truncated, "").trim().to_string()
}

/// Classify a free-text question into one of the three intents.
///
/// Intents are tried in a fixed priority order and the first match wins:
/// owner-with-most-books, then most-popular-book, then
/// five-most-expensive-books.
pub fn parse_intent(question: &str) -> Option<QueryIntent> {
    if question.is_empty() {
        return None;
    }

    let q = sanitize_question(question).to_lowercase();
    let q = q.split_whitespace().collect::<Vec<_>>().join(" ");

    const OWNER_PHRASES: [&str; 6] = [
        "who owns the most books",
        "who has the most books",
        "which user has the most books",
        "top book owner",
        "biggest book collector",
        "user with most books",
    ];
    if OWNER_PHRASES.iter().any(|p| q.contains(p))
        || (q.contains("books")
            && (q.contains("own") || q.contains("has") || q.contains("collect") || q.contains("user"))
            && (q.contains("most") || q.contains("top") || q.contains("biggest")))
    {
        return Some(QueryIntent::OwnerWithMostBooks);
    }

    const POPULAR_PHRASES: [&str; 7] = [
        "most popular book",
        "which is the most popular book",
        "what is the most popular book",
        "popular book",
        "most read book",
        "top book",
        "favorite book",
    ];
    if POPULAR_PHRASES.iter().any(|p| q.contains(p))
        || ((q.contains("popular") || q.contains("most read") || q.contains("favorite"))
            && q.contains("book"))
    {
        return Some(QueryIntent::MostPopularBook);
    }

    const EXPENSIVE_PHRASES: [&str; 7] = [
        "five most expensive",
        "5 most expensive",
        "most expensive books",
        "top expensive books",
        "highest priced books",
        "costliest books",
        "top 5 expensive",
    ];
    if EXPENSIVE_PHRASES.iter().any(|p| q.contains(p))
        || ((q.contains("expensive") || q.contains("price") || q.contains("cost"))
            && (q.contains("most") || q.contains("top") || q.contains("highest"))
            && q.contains("book"))
    {
        return Some(QueryIntent::FiveMostExpensiveBooks);
    }

    None
}

/// Entry point for `POST /api/ai/query`.
pub async fn handle_query(
    db: &DatabaseConnection,
    user: &user::Model,
    question: &str,
) -> DomainResult<QueryAnswer> {
    if question.is_empty() {
        return Err(DomainError::Query("Question is required.".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(DomainError::Query(
            "Question is too long (max 500 characters).".to_string(),
        ));
    }

    let sanitized = sanitize_question(question);
    if sanitized.chars().count() < MIN_QUESTION_CHARS {
        return Err(DomainError::Query("Question is too short.".to_string()));
    }

    let intent = parse_intent(&sanitized)
        .ok_or_else(|| DomainError::Query(UNRECOGNIZED_QUESTION_MESSAGE.to_string()))?;

    if !ALLOWED_INTENTS.contains(&intent) {
        return Err(DomainError::Query("Invalid query intent.".to_string()));
    }

    tracing::info!("Query intent {} for user {}", intent.as_str(), user.id);

    match intent {
        QueryIntent::OwnerWithMostBooks => owner_with_most_books(db, user).await,
        QueryIntent::MostPopularBook => most_popular_book(db, user).await,
        QueryIntent::FiveMostExpensiveBooks => five_most_expensive_books(db, user).await,
    }
}

/// Books the caller is allowed to aggregate over: the whole catalog for an
/// admin, their own shelf otherwise.
async fn scoped_books(
    db: &DatabaseConnection,
    user: &user::Model,
) -> DomainResult<Vec<book::Model>> {
    let mut query = BookEntity::find();
    if !user.is_admin() {
        query = query.filter(book::Column::UserId.eq(user.id));
    }
    Ok(query.all(db).await?)
}

/// Pick the entry with the highest count. Iteration over a `BTreeMap` is
/// ascending by key, and only a strictly greater count replaces the current
/// best, so ties resolve to the smallest key.
fn max_count_entry<K: Clone + Ord>(counts: &BTreeMap<K, i64>) -> Option<(K, i64)> {
    let mut best: Option<(&K, i64)> = None;
    for (key, &count) in counts {
        if best.is_none_or(|(_, b)| count > b) {
            best = Some((key, count));
        }
    }
    best.map(|(k, c)| (k.clone(), c))
}

async fn owner_with_most_books(
    db: &DatabaseConnection,
    user: &user::Model,
) -> DomainResult<QueryAnswer> {
    let books = scoped_books(db, user).await?;

    let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
    for b in &books {
        *counts.entry(b.user_id).or_insert(0) += 1;
    }

    // An empty scope fails for admins too: an entirely empty library has no
    // top owner to report.
    let (owner_id, book_count) =
        max_count_entry(&counts).ok_or_else(|| DomainError::Query("No books found.".to_string()))?;

    let owner = UserEntity::find_by_id(owner_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::Query("No books found.".to_string()))?;

    Ok(QueryAnswer::OwnerWithMostBooks {
        user: OwnerSummary {
            id: owner.id,
            name: owner.name,
            email: owner.email,
        },
        book_count,
        scope: if user.is_admin() {
            QueryScope::AllUsers
        } else {
            QueryScope::YourBooks
        },
    })
}

async fn most_popular_book(
    db: &DatabaseConnection,
    user: &user::Model,
) -> DomainResult<QueryAnswer> {
    let books = scoped_books(db, user).await?;

    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for b in &books {
        *counts.entry(b.title.clone()).or_insert(0) += 1;
    }

    let (title, count) =
        max_count_entry(&counts).ok_or_else(|| DomainError::Query("No books found.".to_string()))?;

    // One representative copy from the same scope, lowest id for stability.
    let example = books
        .iter()
        .filter(|b| b.title == title)
        .min_by_key(|b| b.id)
        .map(|b| BookExample {
            author: b.author.clone(),
            genre: b.genre.clone(),
        })
        .unwrap_or(BookExample {
            author: None,
            genre: None,
        });

    Ok(QueryAnswer::MostPopularBook {
        title,
        count,
        example,
        scope: if user.is_admin() {
            QueryScope::AllBooks
        } else {
            QueryScope::YourBooks
        },
    })
}

async fn five_most_expensive_books(
    db: &DatabaseConnection,
    user: &user::Model,
) -> DomainResult<QueryAnswer> {
    let books = scoped_books(db, user).await?;

    let mut priced: Vec<&book::Model> = books.iter().filter(|b| b.price.is_some()).collect();
    if priced.is_empty() {
        return Err(DomainError::Query(
            "No books with price information found.".to_string(),
        ));
    }

    // Price descending; equal prices fall back to ascending id.
    priced.sort_by(|a, b| {
        let pa = a.price.unwrap_or_default();
        let pb = b.price.unwrap_or_default();
        pb.total_cmp(&pa).then(a.id.cmp(&b.id))
    });
    priced.truncate(5);

    Ok(QueryAnswer::FiveMostExpensiveBooks {
        books: priced
            .into_iter()
            .map(|b| PricedBook {
                id: b.id,
                title: b.title.clone(),
                author: b.author.clone(),
                genre: b.genre.clone(),
                price: b.price.unwrap_or_default(),
                owner_id: b.user_id,
            })
            .collect(),
        scope: if user.is_admin() {
            QueryScope::AllBooks
        } else {
            QueryScope::YourBooks
        },
    })
}

fn genre_counts(books: &[book::Model]) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for b in books {
        if let Some(genre) = &b.genre {
            *counts.entry(genre.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Genre-based recommendations: books in the caller's favorite genre owned
/// by other users, padded with recent additions when the genre alone is too
/// thin. Falls back to the library-wide favorite genre for callers with no
/// genre-tagged books of their own.
pub async fn get_recommendations(
    db: &DatabaseConnection,
    user: &user::Model,
) -> DomainResult<Recommendations> {
    let own_books = BookEntity::find()
        .filter(book::Column::UserId.eq(user.id))
        .all(db)
        .await?;

    let (genre, strategy) = match max_count_entry(&genre_counts(&own_books)) {
        Some((genre, _)) => (genre, RecommendationStrategy::UserPreference),
        None => {
            let tagged = BookEntity::find()
                .filter(book::Column::Genre.is_not_null())
                .all(db)
                .await?;
            match max_count_entry(&genre_counts(&tagged)) {
                Some((genre, _)) => (genre, RecommendationStrategy::MostPopularGenre),
                None => {
                    return Ok(Recommendations {
                        kind: "recommendations",
                        based_on_genre: None,
                        strategy: None,
                        reason: None,
                        message: Some(
                            "No books in the library yet. Add some books to get recommendations!"
                                .to_string(),
                        ),
                        books: vec![],
                    });
                }
            }
        }
    };

    let mut recommended = BookEntity::find()
        .filter(book::Column::Genre.eq(&genre))
        .filter(book::Column::UserId.ne(user.id))
        .order_by_asc(book::Column::Id)
        .limit(5)
        .all(db)
        .await?;

    // Too few genre matches: pad with the latest additions from other
    // shelves, skipping anything already picked.
    if recommended.len() < 3 {
        let selected: Vec<i32> = recommended.iter().map(|b| b.id).collect();
        let additional = BookEntity::find()
            .filter(book::Column::UserId.ne(user.id))
            .filter(book::Column::Id.is_not_in(selected))
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .limit((5 - recommended.len()) as u64)
            .all(db)
            .await?;
        recommended.extend(additional);
    }
    recommended.truncate(5);

    let reason = match strategy {
        RecommendationStrategy::UserPreference => {
            format!("Based on your preference for {} genre", genre)
        }
        RecommendationStrategy::MostPopularGenre => {
            format!("Based on the most popular genre in the library: {}", genre)
        }
    };

    Ok(Recommendations {
        kind: "recommendations",
        based_on_genre: Some(genre),
        strategy: Some(strategy),
        reason: Some(reason),
        message: None,
        books: recommended
            .into_iter()
            .map(|b| RecommendedBook {
                id: b.id,
                title: b.title,
                author: b.author,
                genre: b.genre,
                price: b.price,
            })
            .collect(),
    })
}

fn generate_reading_summary(
    total_books: i64,
    favorite_genre: Option<(&str, i64)>,
    completed: i64,
    reading: i64,
    average_pages: Option<f64>,
) -> String {
    if total_books == 0 {
        return "You haven't added any books to your library yet.".to_string();
    }

    let mut parts = vec![format!(
        "You have {} book{} in your library.",
        total_books,
        if total_books != 1 { "s" } else { "" }
    )];

    if let Some((genre, count)) = favorite_genre {
        parts.push(format!(
            "Your favorite genre is {} ({} books).",
            genre, count
        ));
    }

    if completed > 0 {
        parts.push(format!(
            "You've completed {} book{}.",
            completed,
            if completed != 1 { "s" } else { "" }
        ));
    }
    if reading > 0 {
        parts.push(format!(
            "You're currently reading {} book{}.",
            reading,
            if reading != 1 { "s" } else { "" }
        ));
    }

    if let Some(avg) = average_pages {
        parts.push(
            if avg < 200.0 {
                "You tend to read shorter books (under 200 pages)."
            } else if avg > 400.0 {
                "You prefer longer books (over 400 pages)."
            } else {
                "You read books of average length (200-400 pages)."
            }
            .to_string(),
        );
    }

    parts.join(" ")
}

/// Reading-habit statistics, scoped strictly to the caller no matter their
/// role. Never fails on an empty shelf; everything degrades to zero/None.
pub async fn get_insights(
    db: &DatabaseConnection,
    user: &user::Model,
) -> DomainResult<Insights> {
    let own_books = BookEntity::find()
        .filter(book::Column::UserId.eq(user.id))
        .all(db)
        .await?;

    let user_genre_distribution = genre_counts(&own_books);

    let mut status_distribution: BTreeMap<String, i64> = BTreeMap::new();
    for b in &own_books {
        *status_distribution
            .entry(b.reading_status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let pages: Vec<i64> = own_books
        .iter()
        .filter_map(|b| b.pages)
        .map(i64::from)
        .collect();
    let (average_pages, min_pages, max_pages, total_pages) = if pages.is_empty() {
        (None, None, None, None)
    } else {
        let total: i64 = pages.iter().sum();
        (
            Some(total as f64 / pages.len() as f64),
            pages.iter().min().map(|&p| p as i32),
            pages.iter().max().map(|&p| p as i32),
            Some(total),
        )
    };

    let prices: Vec<f64> = own_books.iter().filter_map(|b| b.price).collect();
    let average_price = if prices.is_empty() {
        None
    } else {
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    };

    let favorite = max_count_entry(&user_genre_distribution);

    let tagged = BookEntity::find()
        .filter(book::Column::Genre.is_not_null())
        .all(db)
        .await?;
    let most_popular_genre_overall = max_count_entry(&genre_counts(&tagged)).map(|(g, _)| g);

    let total_books = own_books.len() as i64;
    let completed = own_books
        .iter()
        .filter(|b| b.reading_status == ReadingStatus::Completed)
        .count() as i64;
    let reading = own_books
        .iter()
        .filter(|b| b.reading_status == ReadingStatus::Reading)
        .count() as i64;

    let summary = generate_reading_summary(
        total_books,
        favorite.as_ref().map(|(g, c)| (g.as_str(), *c)),
        completed,
        reading,
        average_pages,
    );

    Ok(Insights {
        kind: "insights",
        user_genre_distribution,
        status_distribution,
        average_pages,
        min_pages,
        max_pages,
        total_pages,
        average_price,
        total_books,
        favorite_genre: favorite.map(|(g, _)| g),
        most_popular_genre_overall,
        summary,
    })
}
