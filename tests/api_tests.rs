use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use cineai_api::error::{AppError, AppResult};
use cineai_api::models::CatalogExtras;
use cineai_api::routes::{create_router, AppState};
use cineai_api::services::catalog::{CatalogClient, CatalogDetail, SearchPage, SearchResult};
use cineai_api::services::generator::ContentGenerator;
use cineai_api::services::{AccountService, Aggregator, Argon2Verifier, ChatService};
use cineai_api::store::MemoryStore;

/// Canned catalog: one movie ("603"), everything else is a miss.
struct StubCatalog;

#[async_trait]
impl CatalogClient for StubCatalog {
    async fn search(&self, query: &str, _page: u32) -> AppResult<SearchPage> {
        let results = vec![SearchResult {
            id: "603".to_string(),
            media_type: cineai_api::services::catalog::MediaType::Movie,
            title: format!("Result for {}", query),
            overview: None,
            poster_path: None,
            release_date: Some("1999-03-31".to_string()),
            vote_average: 8.2,
            vote_count: 24000,
        }];
        Ok(SearchPage {
            total_results: results.len(),
            results,
            total_pages: 1,
        })
    }

    async fn detail(&self, id: &str) -> AppResult<CatalogDetail> {
        if id != "603" {
            return Err(AppError::CatalogUnavailable(format!(
                "TMDB returned status 404 for {}",
                id
            )));
        }
        Ok(CatalogDetail {
            id: id.to_string(),
            title: "The Matrix".to_string(),
            overview: Some("A hacker learns the truth.".to_string()),
            release_date: None,
            runtime_minutes: Some(136),
            genres: vec!["Action".to_string(), "Science Fiction".to_string()],
            poster_path: Some("/matrix.jpg".to_string()),
            backdrop_path: None,
            production_companies: vec![],
            status: None,
            extras: CatalogExtras {
                credits: Some(json!({"cast": []})),
                videos: None,
                reviews: Some(json!({"results": [{"content": "Loved it"}]})),
                similar: None,
            },
            raw: json!({"id": 603, "title": "The Matrix"}),
        })
    }

    async fn trending(&self) -> AppResult<SearchPage> {
        self.search("trending", 1).await
    }

    async fn popular(&self) -> AppResult<SearchPage> {
        self.search("popular", 1).await
    }
}

/// Echo generator so chat tests are deterministic.
struct StubGenerator;

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str, _system_instruction: &str) -> AppResult<String> {
        Ok("Try Dark City.".to_string())
    }
}

fn x_user_id() -> HeaderName {
    HeaderName::from_static("x-user-id")
}

fn uid(user_id: Uuid) -> HeaderValue {
    HeaderValue::from_str(&user_id.to_string()).unwrap()
}

fn create_test_server() -> TestServer {
    let store = MemoryStore::new();
    let generator = Arc::new(StubGenerator);
    let aggregator = Arc::new(Aggregator::new(
        Arc::new(StubCatalog),
        generator.clone(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));
    let accounts = Arc::new(AccountService::new(
        Arc::new(store.clone()),
        Arc::new(Argon2Verifier),
    ));
    let chat = Arc::new(ChatService::new(Arc::new(store), generator));

    let app = create_router(AppState {
        aggregator,
        accounts,
        chat,
    });
    TestServer::new(app).unwrap()
}

async fn register_user(server: &TestServer, username: &str) -> Uuid {
    let response = server
        .post("/api/users/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "longenough"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let server = create_test_server();
    register_user(&server, "alice").await;

    let response = server
        .post("/api/users/register")
        .json(&json!({
            "username": "alice",
            "email": "second@example.com",
            "password": "longenough"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_missing_identity_header_is_unauthorized() {
    let server = create_test_server();
    let response = server.get("/api/users/profile").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_watchlist_add_duplicate_and_remove() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    let response = server
        .post("/api/users/watchlist")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"movie_id": "m1", "title": "Alien"}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    // Duplicate add is a conflict and the list stays at one entry.
    let response = server
        .post("/api/users/watchlist")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"movie_id": "m1", "title": "Alien"}))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let response = server
        .get("/api/users/watchlist")
        .add_header(x_user_id(), uid(user_id))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Remove twice; the second is a no-op, not an error.
    for _ in 0..2 {
        let response = server
            .delete("/api/users/watchlist/m1")
            .add_header(x_user_id(), uid(user_id))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }
}

#[tokio::test]
async fn test_rating_resubmission_replaces_entry() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    let response = server
        .post("/api/movies/603/rating")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"rating": 8}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["average_user_rating"], 8.0);
    assert_eq!(body["data"]["total_ratings"], 1);

    let response = server
        .post("/api/movies/603/rating")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"rating": 5}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["average_user_rating"], 5.0);
    assert_eq!(body["data"]["total_ratings"], 1);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    let response = server
        .post("/api/movies/603/rating")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"rating": 11}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detail_view_merges_catalog_and_community() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    server
        .post("/api/movies/603/rating")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"rating": 9}))
        .await
        .assert_status_ok();

    let response = server.get("/api/movies/603").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["title"], "The Matrix");
    assert_eq!(body["data"]["average_user_rating"], 9.0);
    assert!(body["data"]["catalog"]["reviews"].is_object());
}

#[tokio::test]
async fn test_unknown_movie_surfaces_catalog_failure() {
    let server = create_test_server();
    let response = server.get("/api/movies/999").await;
    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_search_returns_envelope() {
    let server = create_test_server();
    let response = server.get("/api/movies/search").add_query_param("q", "matrix").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_results"], 1);
}

#[tokio::test]
async fn test_chat_round_trip_and_history() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    let response = server
        .post("/api/chat")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"message": "something like The Matrix?"}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["response"], "Try Dark City.");

    let response = server
        .get("/api/chat/history")
        .add_header(x_user_id(), uid(user_id))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let turns = body["data"].as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["message"], "something like The Matrix?");

    let response = server
        .delete("/api/chat/history")
        .add_header(x_user_id(), uid(user_id))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/chat/history")
        .add_header(x_user_id(), uid(user_id))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_login_stamps_last_active_in_stats() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    let response = server
        .get("/api/users/stats")
        .add_header(x_user_id(), uid(user_id))
        .await;
    let body: serde_json::Value = response.json();
    assert!(body["data"]["last_active"].is_null());

    let response = server
        .post("/api/users/login")
        .json(&json!({"username": "alice", "password": "longenough"}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["data"]["last_login"].is_string());

    let response = server
        .get("/api/users/stats")
        .add_header(x_user_id(), uid(user_id))
        .await;
    let body: serde_json::Value = response.json();
    assert!(body["data"]["last_active"].is_string());
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let server = create_test_server();
    register_user(&server, "alice").await;

    let response = server
        .post("/api/users/login")
        .json(&json!({"username": "alice", "password": "wrong-password"}))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stats_and_deactivation_flow() {
    let server = create_test_server();
    let user_id = register_user(&server, "alice").await;

    server
        .post("/api/users/watched")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"movie_id": "m1", "title": "Alien", "rating": 9}))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/users/stats")
        .add_header(x_user_id(), uid(user_id))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["watched_count"], 1);
    assert_eq!(body["data"]["average_personal_rating"], 9.0);

    // Wrong password leaves the account active.
    let response = server
        .post("/api/users/deactivate")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"password": "wrong-password"}))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/users/deactivate")
        .add_header(x_user_id(), uid(user_id))
        .json(&json!({"password": "longenough"}))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/users/profile")
        .add_header(x_user_id(), uid(user_id))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["is_active"], false);
}
