//! API integration tests, driven in-process over the memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use catalog_server::{
    api,
    clock::FixedClock,
    config::AppConfig,
    models::{Capability, UserClaims},
    repository::MemoryRepository,
    services::{renewal::RenewalPolicy, Services},
    AppState,
};

const TODAY: &str = "2024-01-01";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn test_app() -> (Router, Arc<AppConfig>) {
    let config = Arc::new(AppConfig::default());
    let services = Services::new(
        Arc::new(MemoryRepository::new()),
        RenewalPolicy::default(),
        Arc::new(FixedClock(today())),
    );
    let state = AppState {
        config: config.clone(),
        services: Arc::new(services),
    };
    (api::create_router(state), config)
}

fn token(config: &AppConfig, user_id: i32, permissions: Vec<Capability>) -> String {
    let claims = UserClaims::new(user_id, &format!("user{}", user_id), permissions, 1);
    tokio_test::assert_ok!(claims.create_token(&config.auth.jwt_secret))
}

fn staff(config: &AppConfig) -> String {
    token(config, 100, vec![Capability::CanManageCatalog, Capability::CanMarkReturned])
}

fn librarian(config: &AppConfig) -> String {
    token(config, 50, vec![Capability::CanMarkReturned])
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_book(app: &Router, token: &str, title: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(token),
        Some(json!({
            "title": title,
            "summary": "A summary",
            "isbn": "9780553293357"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_loan(app: &Router, token: &str, book_id: i64, borrower: i32, due: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/instances",
        Some(token),
        Some(json!({
            "book_id": book_id,
            "imprint": "Bantam, 1991",
            "status": "on_loan",
            "due_back": due,
            "borrower_id": borrower
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_mutation_requires_token() {
    let (app, _) = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/genres",
        None,
        Some(json!({ "name": "Fantasy" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthenticated");

    let (status, _) = send(
        &app,
        Method::POST,
        "/genres",
        Some("not-a-jwt"),
        Some(json!({ "name": "Fantasy" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_crud_with_genres() {
    let (app, config) = test_app();
    let token = staff(&config);

    let (_, genre) = send(&app, Method::POST, "/genres", Some(token.as_str()), Some(json!({ "name": "Science Fiction" }))).await;
    let (_, author) = send(
        &app,
        Method::POST,
        "/authors",
        Some(token.as_str()),
        Some(json!({ "first_name": "Isaac", "last_name": "Asimov" })),
    )
    .await;

    let (status, book) = send(
        &app,
        Method::POST,
        "/books",
        Some(token.as_str()),
        Some(json!({
            "title": "Foundation",
            "summary": "Psychohistory",
            "isbn": "9780553293357",
            "author_id": author["id"],
            "genre_ids": [genre["id"]]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["genres"][0]["name"], "Science Fiction");

    let uri = format!("/authors/{}", author["id"]);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/books/{}", book["id"]);
    let (status, book) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(book["author_id"].is_null());
}

#[tokio::test]
async fn test_book_search_by_title() {
    let (app, config) = test_app();
    let token = staff(&config);
    for title in ["Foundation", "Second Foundation", "Dune"] {
        create_book(&app, &token, title).await;
    }

    let (status, books) = send(&app, Method::GET, "/books?title=FOUNDATION", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Foundation", "Second Foundation"]);

    let (_, books) = send(&app, Method::GET, "/books?limit=1", None, None).await;
    assert_eq!(books.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_isbn_is_bad_request() {
    let (app, config) = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(staff(&config).as_str()),
        Some(json!({ "title": "Dune", "isbn": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_new_copy_defaults_to_maintenance() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;

    let (status, copy) = send(
        &app,
        Method::POST,
        "/instances",
        Some(token.as_str()),
        Some(json!({ "book_id": book_id, "imprint": "Ace, 1990" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["status"], "maintenance");
    assert_eq!(copy["book_title"], "Dune");
    assert_eq!(copy["is_overdue"], false);

    let (_, stats) = send(&app, Method::GET, "/stats", None, None).await;
    assert_eq!(stats["num_books"], 1);
    assert_eq!(stats["num_instances"], 1);
    assert_eq!(stats["num_instances_available"], 0);
}

#[tokio::test]
async fn test_my_loans_sorted_by_due_date() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;

    create_loan(&app, &token, book_id, 7, "2024-01-20").await;
    let overdue = create_loan(&app, &token, book_id, 7, "2023-12-20").await;
    create_loan(&app, &token, book_id, 8, "2024-01-05").await;

    let reader = token_for_reader(&config, 7);
    let (status, loans) = send(&app, Method::GET, "/loans/mine", Some(reader.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let loans = loans.as_array().unwrap();
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["id"], overdue.as_str());
    assert_eq!(loans[0]["is_overdue"], true);
    assert_eq!(loans[1]["due_back"], "2024-01-20");
}

fn token_for_reader(config: &AppConfig, user_id: i32) -> String {
    token(config, user_id, vec![])
}

#[tokio::test]
async fn test_all_loans_needs_librarian() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    create_loan(&app, &token, book_id, 7, "2024-01-20").await;
    create_loan(&app, &token, book_id, 8, "2024-01-05").await;

    let reader = token_for_reader(&config, 7);
    let (status, body) = send(&app, Method::GET, "/loans", Some(reader.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PermissionDenied");

    let (status, loans) = send(&app, Method::GET, "/loans", Some(librarian(&config).as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = loans
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["due_back"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-01-05", "2024-01-20"]);
}

#[tokio::test]
async fn test_renewal_form_suggests_three_weeks() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    let id = create_loan(&app, &token, book_id, 7, "2024-01-05").await;

    let uri = format!("/instances/{}/renew", id);
    let (status, form) = send(&app, Method::GET, &uri, Some(librarian(&config).as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(form["suggested_due_back"], "2024-01-22");
    assert_eq!(form["latest_due_back"], "2024-01-29");
    assert_eq!(form["max_weeks"], 4);
    assert_eq!(form["instance"]["due_back"], "2024-01-05");
}

#[tokio::test]
async fn test_renewal_accepts_window_bounds() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    let id = create_loan(&app, &token, book_id, 7, "2024-01-05").await;
    let uri = format!("/instances/{}/renew", id);

    for due in [TODAY, "2024-01-29"] {
        let (status, copy) = send(
            &app,
            Method::POST,
            &uri,
            Some(librarian(&config).as_str()),
            Some(json!({ "due_back": due })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(copy["due_back"], due);
        assert_eq!(copy["status"], "on_loan");
    }
}

#[tokio::test]
async fn test_renewal_rejects_dates_outside_window() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    let id = create_loan(&app, &token, book_id, 7, "2024-01-05").await;
    let uri = format!("/instances/{}/renew", id);

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(librarian(&config).as_str()),
        Some(json!({ "due_back": "2023-12-31" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "PastDateError");

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(librarian(&config).as_str()),
        Some(json!({ "due_back": "2024-01-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "TooFarAheadError");
    assert_eq!(body["message"], "renewal date cannot exceed 4 weeks from today");

    // Nothing was written
    let (_, copy) = send(&app, Method::GET, &format!("/instances/{}", id), None, None).await;
    assert_eq!(copy["due_back"], "2024-01-05");
}

#[tokio::test]
async fn test_renewal_guards() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    let id = create_loan(&app, &token, book_id, 7, "2024-01-05").await;
    let uri = format!("/instances/{}/renew", id);
    let payload = json!({ "due_back": "2024-01-10" });

    // Borrowers cannot renew their own loans
    let reader = token_for_reader(&config, 7);
    let (status, _) = send(&app, Method::POST, &uri, Some(reader.as_str()), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/instances/{}/renew", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::POST, &missing, Some(librarian(&config).as_str()), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let (_, copy) = send(
        &app,
        Method::POST,
        "/instances",
        Some(token.as_str()),
        Some(json!({ "book_id": book_id, "imprint": "Ace, 1990", "status": "available" })),
    )
    .await;
    let shelved = format!("/instances/{}/renew", copy["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &shelved, Some(librarian(&config).as_str()), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvalidState");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = test_app();
    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"]["/instances/{id}/renew"].is_object());
}

#[tokio::test]
async fn test_renewal_without_capability_is_forbidden_before_parsing() {
    let (app, config) = test_app();
    let reader = token_for_reader(&config, 7);

    // Impossible calendar date
    let uri = format!("/instances/{}/renew", uuid::Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(reader.as_str()),
        Some(json!({ "due_back": "2024-02-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PermissionDenied");

    // Malformed instance id
    let (status, _) = send(
        &app,
        Method::POST,
        "/instances/not-a-uuid/renew",
        Some(reader.as_str()),
        Some(json!({ "due_back": "2024-01-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/instances/not-a-uuid/renew", Some(reader.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_librarian_malformed_renewal_is_bad_request() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    let id = create_loan(&app, &token, book_id, 7, "2024-01-05").await;

    let uri = format!("/instances/{}/renew", id);
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(librarian(&config).as_str()),
        Some(json!({ "due_back": "2024-02-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = send(
        &app,
        Method::POST,
        "/instances/not-a-uuid/renew",
        Some(librarian(&config).as_str()),
        Some(json!({ "due_back": "2024-01-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_returning_copy_through_update_clears_loan() {
    let (app, config) = test_app();
    let token = staff(&config);
    let book_id = create_book(&app, &token, "Dune").await;
    let id = create_loan(&app, &token, book_id, 7, "2023-12-01").await;

    let (status, copy) = send(
        &app,
        Method::PUT,
        &format!("/instances/{}", id),
        Some(token.as_str()),
        Some(json!({ "status": "available" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["status"], "available");
    assert!(copy["borrower_id"].is_null());
    assert!(copy["due_back"].is_null());
    assert_eq!(copy["is_overdue"], false);

    let (_, stats) = send(&app, Method::GET, "/stats", None, None).await;
    assert_eq!(stats["num_instances_available"], 1);
}
