use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use bookden::assistant::models::{QueryAnswer, QueryIntent, QueryScope};
use bookden::assistant::service::{
    get_insights, get_recommendations, handle_query, parse_intent, sanitize_question,
};
use bookden::auth::hash_password;
use bookden::db;
use bookden::domain::DomainError;
use bookden::models::book::{self, ReadingStatus};
use bookden::models::user::{self, Role};
use bookden::services::auth_service;

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
) -> user::Model {
    let hash = hash_password("Secret123!").expect("Failed to hash password");
    user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash),
        role: Set(role),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

#[allow(clippy::too_many_arguments)]
async fn create_test_book(
    db: &DatabaseConnection,
    owner_id: i32,
    title: &str,
    author: Option<&str>,
    genre: Option<&str>,
    price: Option<f64>,
    pages: Option<i32>,
    status: ReadingStatus,
) -> book::Model {
    book::ActiveModel {
        title: Set(title.to_string()),
        author: Set(author.map(String::from)),
        genre: Set(genre.map(String::from)),
        price: Set(price),
        pages: Set(pages),
        reading_status: Set(status),
        user_id: Set(owner_id),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create book")
}

/// The three-book fixture from the scoping tests: two books for the regular
/// user, one for the admin.
async fn seed_fixture(db: &DatabaseConnection, regular: &user::Model, admin: &user::Model) {
    create_test_book(
        db,
        regular.id,
        "Test Book 1",
        Some("Author 1"),
        Some("Fantasy"),
        Some(10.50),
        Some(300),
        ReadingStatus::Completed,
    )
    .await;
    create_test_book(
        db,
        regular.id,
        "Test Book 2",
        Some("Author 2"),
        Some("Sci-Fi"),
        Some(15.00),
        Some(250),
        ReadingStatus::Reading,
    )
    .await;
    create_test_book(
        db,
        admin.id,
        "Admin Book",
        Some("Admin Author"),
        Some("Fantasy"),
        Some(20.00),
        Some(400),
        ReadingStatus::Planned,
    )
    .await;
}

#[test]
fn test_sanitize_question() {
    // Normal input passes through
    assert_eq!(
        sanitize_question("Who owns the most books?"),
        "Who owns the most books?"
    );

    // Injection characters are stripped
    let sanitized = sanitize_question("'; DROP TABLE books; --");
    assert!(!sanitized.contains('\''));
    assert!(!sanitized.contains(';'));

    let sanitized = sanitize_question("<script>alert('xss')</script>");
    assert!(!sanitized.contains("<script>"));

    // Length limit
    let long_input = "a".repeat(600);
    assert!(sanitize_question(&long_input).chars().count() <= 500);
}

#[test]
fn test_parse_intent_valid_queries() {
    assert_eq!(
        parse_intent("Who owns the most books?"),
        Some(QueryIntent::OwnerWithMostBooks)
    );
    assert_eq!(
        parse_intent("Which is the most popular book?"),
        Some(QueryIntent::MostPopularBook)
    );
    assert_eq!(
        parse_intent("Show the five most expensive books"),
        Some(QueryIntent::FiveMostExpensiveBooks)
    );
    assert_eq!(
        parse_intent("5 most expensive"),
        Some(QueryIntent::FiveMostExpensiveBooks)
    );
}

#[test]
fn test_parse_intent_enhanced_patterns() {
    assert_eq!(
        parse_intent("biggest book collector"),
        Some(QueryIntent::OwnerWithMostBooks)
    );
    assert_eq!(
        parse_intent("most read book"),
        Some(QueryIntent::MostPopularBook)
    );
    assert_eq!(
        parse_intent("top 5 expensive"),
        Some(QueryIntent::FiveMostExpensiveBooks)
    );
    assert_eq!(
        parse_intent("costliest books"),
        Some(QueryIntent::FiveMostExpensiveBooks)
    );
}

#[test]
fn test_parse_intent_malicious_inputs() {
    // SQL injection attempts
    assert_eq!(parse_intent("'; DROP TABLE books; --"), None);
    assert_eq!(parse_intent("1' OR '1'='1"), None);

    // XSS attempt
    assert_eq!(parse_intent("<script>alert('xss')</script>"), None);

    // Raw SQL is not an intent
    assert_eq!(parse_intent("DELETE FROM books"), None);
    assert_eq!(parse_intent("SELECT * FROM users"), None);
}

#[tokio::test]
async fn test_query_authorization_scoping() {
    let db = setup_test_db().await;
    let regular = create_test_user(&db, "Regular User", "user@test.com", Role::User).await;
    let admin = create_test_user(&db, "Admin User", "admin@test.com", Role::Admin).await;
    seed_fixture(&db, &regular, &admin).await;

    // Regular users only ever see their own count
    let answer = handle_query(&db, &regular, "Who owns the most books?")
        .await
        .expect("query should succeed");
    match answer {
        QueryAnswer::OwnerWithMostBooks {
            user,
            book_count,
            scope,
        } => {
            assert_eq!(user.id, regular.id);
            assert_eq!(book_count, 2);
            assert_eq!(scope, QueryScope::YourBooks);
        }
        other => panic!("wrong intent: {:?}", other),
    }

    // Admins aggregate over everyone; the regular user holds the record
    let answer = handle_query(&db, &admin, "Who owns the most books?")
        .await
        .expect("query should succeed");
    match answer {
        QueryAnswer::OwnerWithMostBooks {
            user,
            book_count,
            scope,
        } => {
            assert_eq!(user.id, regular.id);
            assert_eq!(book_count, 2);
            assert_eq!(scope, QueryScope::AllUsers);
        }
        other => panic!("wrong intent: {:?}", other),
    }
}

#[tokio::test]
async fn test_query_rejections() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;

    match handle_query(&db, &user, "").await {
        Err(DomainError::Query(msg)) => assert_eq!(msg, "Question is required."),
        other => panic!("expected QueryError, got {:?}", other),
    }

    match handle_query(&db, &user, "ab").await {
        Err(DomainError::Query(msg)) => assert_eq!(msg, "Question is too short."),
        other => panic!("expected QueryError, got {:?}", other),
    }

    let long_question = "a".repeat(501);
    match handle_query(&db, &user, &long_question).await {
        Err(DomainError::Query(msg)) => {
            assert_eq!(msg, "Question is too long (max 500 characters).")
        }
        other => panic!("expected QueryError, got {:?}", other),
    }

    // Off-topic questions get the guidance message
    match handle_query(&db, &user, "What is the weather?").await {
        Err(DomainError::Query(msg)) => assert!(msg.contains("Who owns the most books?")),
        other => panic!("expected QueryError, got {:?}", other),
    }

    // Injection payloads never classify
    match handle_query(&db, &user, "'; DROP TABLE books; --").await {
        Err(DomainError::Query(_)) => {}
        other => panic!("expected QueryError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_owner_query_with_empty_scope() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;
    let admin = create_test_user(&db, "Admin", "admin@test.com", Role::Admin).await;

    // A user with no books has no answer
    match handle_query(&db, &user, "Who owns the most books?").await {
        Err(DomainError::Query(msg)) => assert_eq!(msg, "No books found."),
        other => panic!("expected QueryError, got {:?}", other),
    }

    // So does an admin over an entirely empty library
    match handle_query(&db, &admin, "Who owns the most books?").await {
        Err(DomainError::Query(msg)) => assert_eq!(msg, "No books found."),
        other => panic!("expected QueryError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_most_popular_book_with_example() {
    let db = setup_test_db().await;
    let regular = create_test_user(&db, "Regular", "user@test.com", Role::User).await;
    let admin = create_test_user(&db, "Admin", "admin@test.com", Role::Admin).await;

    // "Dune" exists twice across shelves, once for each user
    create_test_book(
        &db,
        regular.id,
        "Dune",
        Some("Frank Herbert"),
        Some("Sci-Fi"),
        None,
        None,
        ReadingStatus::Planned,
    )
    .await;
    create_test_book(
        &db,
        admin.id,
        "Dune",
        Some("Frank Herbert"),
        Some("Sci-Fi"),
        None,
        None,
        ReadingStatus::Planned,
    )
    .await;
    create_test_book(
        &db,
        admin.id,
        "Foundation",
        Some("Isaac Asimov"),
        Some("Sci-Fi"),
        None,
        None,
        ReadingStatus::Planned,
    )
    .await;

    let answer = handle_query(&db, &admin, "Which is the most popular book?")
        .await
        .expect("query should succeed");
    match answer {
        QueryAnswer::MostPopularBook {
            title,
            count,
            example,
            scope,
        } => {
            assert_eq!(title, "Dune");
            assert_eq!(count, 2);
            assert_eq!(example.author.as_deref(), Some("Frank Herbert"));
            assert_eq!(example.genre.as_deref(), Some("Sci-Fi"));
            assert_eq!(scope, QueryScope::AllBooks);
        }
        other => panic!("wrong intent: {:?}", other),
    }
}

#[tokio::test]
async fn test_popular_book_tie_breaks_lexicographically() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;
    create_test_book(&db, user.id, "Zebra", None, None, None, None, ReadingStatus::Planned).await;
    create_test_book(&db, user.id, "Aardvark", None, None, None, None, ReadingStatus::Planned)
        .await;

    let answer = handle_query(&db, &user, "most popular book")
        .await
        .expect("query should succeed");
    match answer {
        QueryAnswer::MostPopularBook { title, count, .. } => {
            assert_eq!(title, "Aardvark");
            assert_eq!(count, 1);
        }
        other => panic!("wrong intent: {:?}", other),
    }
}

#[tokio::test]
async fn test_expensive_books_ordering_and_cap() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;

    for (i, price) in [5.0, 30.0, 10.0, 25.0, 15.0, 20.0].iter().enumerate() {
        create_test_book(
            &db,
            user.id,
            &format!("Book {}", i),
            None,
            None,
            Some(*price),
            None,
            ReadingStatus::Planned,
        )
        .await;
    }
    // Unpriced books never appear in the answer
    create_test_book(&db, user.id, "Freebie", None, None, None, None, ReadingStatus::Planned)
        .await;

    let answer = handle_query(&db, &user, "Show the five most expensive books")
        .await
        .expect("query should succeed");
    match answer {
        QueryAnswer::FiveMostExpensiveBooks { books, scope } => {
            assert_eq!(scope, QueryScope::YourBooks);
            let prices: Vec<f64> = books.iter().map(|b| b.price).collect();
            assert_eq!(prices, vec![30.0, 25.0, 20.0, 15.0, 10.0]);
            assert!(books.iter().all(|b| b.owner_id == user.id));
        }
        other => panic!("wrong intent: {:?}", other),
    }
}

#[tokio::test]
async fn test_expensive_books_requires_prices() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;
    create_test_book(&db, user.id, "Freebie", None, None, None, None, ReadingStatus::Planned)
        .await;

    match handle_query(&db, &user, "5 most expensive").await {
        Err(DomainError::Query(msg)) => {
            assert_eq!(msg, "No books with price information found.")
        }
        other => panic!("expected QueryError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_query_answer_serialization_contract() {
    let db = setup_test_db().await;
    let regular = create_test_user(&db, "Regular", "user@test.com", Role::User).await;
    let admin = create_test_user(&db, "Admin", "admin@test.com", Role::Admin).await;
    seed_fixture(&db, &regular, &admin).await;

    let answer = handle_query(&db, &regular, "Who owns the most books?")
        .await
        .unwrap();
    let value = serde_json::to_value(&answer).unwrap();
    assert_eq!(value["type"], "owner_with_most_books");
    assert_eq!(value["scope"], "your_books");
    assert_eq!(value["book_count"], 2);
    assert_eq!(value["user"]["email"], "user@test.com");

    let answer = handle_query(&db, &admin, "Show the five most expensive books")
        .await
        .unwrap();
    let value = serde_json::to_value(&answer).unwrap();
    assert_eq!(value["type"], "five_most_expensive_books");
    assert_eq!(value["scope"], "all_books");
    for book in value["books"].as_array().unwrap() {
        assert!(book["title"].is_string());
        assert!(book["price"].is_number());
        assert!(book["owner_id"].is_number());
    }
}

#[tokio::test]
async fn test_recommendations_exclude_own_books() {
    let db = setup_test_db().await;
    let regular = create_test_user(&db, "Regular", "user@test.com", Role::User).await;
    let admin = create_test_user(&db, "Admin", "admin@test.com", Role::Admin).await;
    seed_fixture(&db, &regular, &admin).await;

    let result = get_recommendations(&db, &regular)
        .await
        .expect("recommendations should succeed");
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["type"], "recommendations");
    assert_eq!(value["strategy"], "user_preference");
    assert!(value["reason"].as_str().unwrap().contains("Fantasy"));

    // Never recommend the caller's own books
    let own_titles = ["Test Book 1", "Test Book 2"];
    for book in value["books"].as_array().unwrap() {
        assert!(!own_titles.contains(&book["title"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn test_recommendations_fall_back_to_library_genre() {
    let db = setup_test_db().await;
    let newcomer = create_test_user(&db, "Newcomer", "new@test.com", Role::User).await;
    let other = create_test_user(&db, "Other", "other@test.com", Role::User).await;
    create_test_book(
        &db,
        other.id,
        "The Hobbit",
        None,
        Some("Fantasy"),
        None,
        None,
        ReadingStatus::Planned,
    )
    .await;

    let result = get_recommendations(&db, &newcomer).await.unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["strategy"], "most_popular_genre");
    assert_eq!(value["based_on_genre"], "Fantasy");
    assert_eq!(value["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recommendations_empty_library_message() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;

    let result = get_recommendations(&db, &user).await.unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["type"], "recommendations");
    assert!(value["message"].as_str().unwrap().contains("No books"));
    assert!(value["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_insights_zero_state() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, "User", "user@test.com", Role::User).await;

    let insights = get_insights(&db, &user).await.unwrap();

    assert_eq!(insights.total_books, 0);
    assert!(insights.user_genre_distribution.is_empty());
    assert!(insights.status_distribution.is_empty());
    assert!(insights.average_pages.is_none());
    assert!(insights.total_pages.is_none());
    assert!(insights.average_price.is_none());
    assert!(insights.favorite_genre.is_none());
    assert_eq!(
        insights.summary,
        "You haven't added any books to your library yet."
    );
}

#[tokio::test]
async fn test_insights_favorite_genre_scenario() {
    let db = setup_test_db().await;
    let alice = auth_service::register_user(&db, "Alice", "alice@test.com", "Abc12345!")
        .await
        .expect("registration should succeed");

    create_test_book(
        &db,
        alice.id,
        "The Hobbit",
        None,
        Some("Fantasy"),
        None,
        Some(310),
        ReadingStatus::Completed,
    )
    .await;
    create_test_book(
        &db,
        alice.id,
        "The Two Towers",
        None,
        Some("Fantasy"),
        None,
        Some(352),
        ReadingStatus::Reading,
    )
    .await;

    let insights = get_insights(&db, &alice).await.unwrap();

    assert_eq!(insights.favorite_genre.as_deref(), Some("Fantasy"));
    assert_eq!(insights.user_genre_distribution.get("Fantasy"), Some(&2));
    assert_eq!(insights.total_books, 2);
    assert_eq!(insights.status_distribution.get("completed"), Some(&1));
    assert_eq!(insights.status_distribution.get("reading"), Some(&1));
    assert_eq!(insights.min_pages, Some(310));
    assert_eq!(insights.max_pages, Some(352));
    assert_eq!(insights.total_pages, Some(662));
    assert_eq!(insights.average_pages, Some(331.0));

    // The summary references the computed numbers
    assert!(insights.summary.contains("2 books"));
    assert!(insights.summary.contains("Fantasy"));
    assert!(insights
        .summary
        .contains("You read books of average length (200-400 pages)."));
}

#[tokio::test]
async fn test_insights_scoped_to_caller_even_for_admins() {
    let db = setup_test_db().await;
    let regular = create_test_user(&db, "Regular", "user@test.com", Role::User).await;
    let admin = create_test_user(&db, "Admin", "admin@test.com", Role::Admin).await;
    seed_fixture(&db, &regular, &admin).await;

    let insights = get_insights(&db, &admin).await.unwrap();

    // The admin owns one book; the other two never leak in
    assert_eq!(insights.total_books, 1);
    assert_eq!(insights.user_genre_distribution.get("Fantasy"), Some(&1));
    // Library-wide context is informational only
    assert_eq!(insights.most_popular_genre_overall.as_deref(), Some("Fantasy"));
}
