use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, Set};
use tower::util::ServiceExt; // for `oneshot`

use bookden::api;
use bookden::auth::{create_jwt, decode_jwt, hash_password, verify_password};
use bookden::db;
use bookden::models::user::{self, Role};

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
    password: &str,
    role: Role,
) -> user::Model {
    let hash = hash_password(password).expect("Failed to hash password");
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

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

#[tokio::test]
async fn test_password_hashing() {
    let password = "super_secret_password";
    let hash = hash_password(password).expect("Failed to hash password");

    assert_ne!(password, hash);
    assert!(verify_password(password, &hash).unwrap());
    assert!(!verify_password("wrong_password", &hash).unwrap());
}

#[tokio::test]
async fn test_jwt_creation_and_verification() {
    let token = create_jwt(42, "admin").expect("Failed to create JWT");
    assert!(!token.is_empty());

    let claims = decode_jwt(&token).expect("Failed to verify JWT");
    assert_eq!(claims.sub, "42");
    assert_eq!(claims.role, "admin");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let db = setup_test_db().await;
    let app = api::api_router(db);

    // Register
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            serde_json::json!({
                "name": "Alice",
                "email": "Alice@Test.com",
                "password": "Abc12345!"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User created");

    // Login with the normalized email
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({
                "email": "alice@test.com",
                "password": "Abc12345!"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["access_token"].as_str().expect("token").to_string();
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@test.com");
    assert_eq!(body["user"]["role"], "user");

    // /auth/me with the issued token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .method("GET")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "alice@test.com");

    // /auth/me without a token is rejected before any handler logic
    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let db = setup_test_db().await;
    let app = api::api_router(db);

    // No uppercase, no symbol
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            serde_json::json!({
                "name": "Bob",
                "email": "bob@test.com",
                "password": "password1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["errors"]["password"].is_string(),
        "rejection must name the password field: {}",
        body
    );
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let db = setup_test_db().await;
    create_test_user(&db, "Alice", "alice@test.com", "Abc12345!", Role::User).await;
    let app = api::api_router(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            serde_json::json!({
                "name": "Other Alice",
                "email": "ALICE@test.com",
                "password": "Abc12345!"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn test_login_does_not_reveal_which_field_failed() {
    let db = setup_test_db().await;
    create_test_user(&db, "Alice", "alice@test.com", "Abc12345!", Role::User).await;
    let app = api::api_router(db);

    // Wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": "alice@test.com", "password": "WrongPass1!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(response).await;

    // Unknown email
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": "nobody@test.com", "password": "WrongPass1!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_email = body_json(response).await;

    // Same message either way
    assert_eq!(wrong_password["message"], "Invalid credentials");
    assert_eq!(wrong_password["message"], unknown_email["message"]);
}

#[tokio::test]
async fn test_me_fails_after_user_deleted() {
    let db = setup_test_db().await;
    let alice = create_test_user(&db, "Alice", "alice@test.com", "Abc12345!", Role::User).await;
    let token = create_jwt(alice.id, alice.role.as_str()).unwrap();

    let stored = user::Entity::find_by_id(alice.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    stored.delete(&db).await.unwrap();

    let app = api::api_router(db);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .method("GET")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User not found.");
}
