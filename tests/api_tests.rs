use chrono::Duration;
use posts_api::{
    AppConfig, AppState, MemoryRepository, auth::issue_token, create_router, models::PostResponse,
    models::User, pagination::Collection,
};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
    pub config: AppConfig,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn token_for(&self, user_id: i32) -> String {
        issue_token(user_id, &self.config.jwt_secret, Duration::hours(1)).unwrap()
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::with_users([
        User {
            id: 1,
            username: "susan".to_string(),
        },
        User {
            id: 2,
            username: "david".to_string(),
        },
    ]));
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone(),
        config: config.clone(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        config,
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.token_for(1);

    // Create, trying to post on behalf of someone else.
    let response = client
        .post(app.url("/api/posts"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "hello", "user_id": 2 }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 201);
    let location = response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let created: PostResponse = response.json().await.unwrap();
    assert_eq!(created.user_id, 1);
    assert_eq!(location, format!("/api/posts/{}", created.id));

    // The Location header resolves to the new post.
    let fetched = client.get(app.url(&location)).send().await.unwrap();
    assert_eq!(fetched.status(), 200);
    let fetched: PostResponse = fetched.json().await.unwrap();
    assert_eq!(fetched, created);

    // Update as another user: allowed, timestamp refreshed.
    let other_token = app.token_for(2);
    let updated = client
        .put(app.url(&location))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({ "body": "edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let updated: PostResponse = updated.json().await.unwrap();
    assert_eq!(updated.body, "edited");
    assert_eq!(updated.user_id, 1);
    assert!(updated.timestamp >= created.timestamp);

    // Listed under its owner.
    let listing = client
        .get(app.url("/api/user-1/posts"))
        .send()
        .await
        .unwrap();
    assert_eq!(listing.status(), 200);
    let listing: Collection<PostResponse> = listing.json().await.unwrap();
    assert_eq!(listing.meta.total_items, 1);
    assert_eq!(listing.items[0].id, created.id);
}

#[tokio::test]
async fn test_create_post_without_body_creates_nothing() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.url("/api/posts"))
        .bearer_auth(app.token_for(1))
        .json(&serde_json::json!({ "title": "no body here" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Post body is empty! No post created.");
    assert_eq!(app.repo.post_count().await, 0);
}

#[tokio::test]
async fn test_write_routes_require_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let create = client
        .post(app.url("/api/posts"))
        .json(&serde_json::json!({ "body": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(create.status(), 401);

    let update = client
        .put(app.url("/api/posts/1"))
        .bearer_auth("not-a-jwt")
        .json(&serde_json::json!({ "body": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), 401);

    assert_eq!(app.repo.post_count().await, 0);
}

#[tokio::test]
async fn test_missing_resources() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let post = client.get(app.url("/api/posts/999")).send().await.unwrap();
    assert_eq!(post.status(), 404);

    let update = client
        .put(app.url("/api/posts/999"))
        .bearer_auth(app.token_for(1))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), 404);

    let user_posts = client
        .get(app.url("/api/user-999/posts"))
        .send()
        .await
        .unwrap();
    assert_eq!(user_posts.status(), 400);
    let body: serde_json::Value = user_posts.json().await.unwrap();
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["message"], "No such user");
}

#[tokio::test]
async fn test_list_posts_query_parameters() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.token_for(2);

    for n in 0..3 {
        let response = client
            .post(app.url("/api/posts"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "body": format!("post {}", n) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = client
        .get(app.url("/api/posts?page=2&per_page=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let listing: Collection<PostResponse> = response.json().await.unwrap();
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.meta.total_pages, 2);
    assert_eq!(
        listing.links.prev.as_deref(),
        Some("/api/posts?page=1&per_page=2")
    );

    // Garbage falls back to defaults instead of failing the request.
    let response = client
        .get(app.url("/api/posts?page=x&per_page=y"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let listing: Collection<PostResponse> = response.json().await.unwrap();
    assert_eq!(listing.meta.page, 1);
    assert_eq!(listing.meta.per_page, 10);
    assert_eq!(listing.items.len(), 3);
}
