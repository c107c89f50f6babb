use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{
    blog::BlogService,
    models::Limits,
    store::{Dataset, InMemoryStore, UserSettingsModel},
    web::AppState,
};

fn setup_app() -> Router {
    let store = InMemoryStore::with_dataset(Dataset {
        users: vec![
            UserSettingsModel::new("uid_a", "alice", Some("Alice")),
            UserSettingsModel::new("uid_b", "bob", None),
        ],
        ..Dataset::default()
    });
    let blog = BlogService::new(Arc::new(store), Limits::default());
    super::app(AppState::new(blog))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_post(app: &Router) -> String {
    let response = send(app, "POST", "/api/blog/posts", Some(json!({ "author_id": "uid_a" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();
    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_widget_repository() {
    let app = setup_app();
    let response = send(&app, "GET", "/widgetrepository/interactive", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let basic = body["widgetRepository"]["Basic Input"].as_array().unwrap();
    let ids: Vec<&str> = basic
        .iter()
        .map(|w| w["widget_id"].as_str().unwrap())
        .collect();

    assert_eq!(ids, vec!["MultipleChoiceInput", "NumericInput", "TextInput"]);
}

#[tokio::test]
async fn test_widget_repository_unknown_kind() {
    let app = setup_app();
    let response = send(&app, "GET", "/widgetrepository/gadgets", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_widget_instance_with_args() {
    let app = setup_app();
    let response = send(
        &app,
        "POST",
        "/widgets/interactive/TextInput",
        Some(json!({ "customization_args": { "placeholder": "F4" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["widget_id"], "TextInput");
    assert_eq!(body["customization_args"][0]["value"], "F4");
    assert_eq!(body["customization_args"][1]["value"], 1);
    assert!(body["tag"]
        .as_str()
        .unwrap()
        .starts_with("<quill-interactive-text-input "));
}

#[tokio::test]
async fn test_widget_instance_without_body_uses_defaults() {
    let app = setup_app();
    let response = send(&app, "POST", "/widgets/noninteractive/Link", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(
        body["customization_args"][0]["value"],
        "https://www.example.com"
    );
}

#[tokio::test]
async fn test_widget_instance_errors() {
    let app = setup_app();

    let response = send(&app, "POST", "/widgets/interactive/Nope", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/widgets/interactive/TextInput",
        Some(json!({ "customization_args": { "colour": "red" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("colour"));
}

#[tokio::test]
async fn test_widget_instance_rejects_malformed_body() {
    let app = setup_app();

    let response = send(
        &app,
        "POST",
        "/widgets/interactive/TextInput",
        Some(json!({ "customization_args": 5 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/widgets/interactive/TextInput")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/widgets/interactive/TextInput")
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"customization_args": {}}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_post_for_unknown_author() {
    let app = setup_app();
    let response = send(
        &app,
        "POST",
        "/api/blog/posts",
        Some(json!({ "author_id": "uid_nobody" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registered_user_can_create_posts() {
    let app = setup_app();
    let response = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "id": "uid_c", "username": "carol", "display_name": "Carol" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "POST",
        "/api/blog/posts",
        Some(json!({ "author_id": "uid_c" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["author_name"], "carol");

    let response = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "id": "uid_d", "username": "carol" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = setup_app();
    let id = create_post(&app).await;

    let response = send(&app, "GET", &format!("/api/blog/posts/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["author_name"], "alice");
    assert_eq!(body["title"], "");

    // A fresh draft has no content, so it cannot be published yet.
    let response = send(&app, "POST", &format!("/api/blog/posts/{}/publish", id), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PUT",
        &format!("/api/blog/posts/{}", id),
        Some(json!({
            "title": "Sample Title",
            "thumbnail_filename": "thumbnail.svg",
            "content": "<p>Hello</p>",
            "tags": ["news"]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["url_fragment"], "sample-title");

    let response = send(&app, "POST", &format!("/api/blog/posts/{}/publish", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["published_on"].is_string());

    let response = send(&app, "GET", &format!("/api/blog/summaries/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["author_name"], "Alice");
    assert_eq!(body["summary"], "Hello...");

    let response = send(&app, "GET", &format!("/api/blog/rights/{}", id), None).await;
    let body = json_body(response).await;
    assert_eq!(body["blog_post_is_published"], true);
    assert_eq!(body["editor_names"], json!(["Alice"]));

    let response = send(&app, "POST", &format!("/api/blog/posts/{}/unpublish", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body.get("published_on").map_or(true, Value::is_null));

    let response = send(&app, "DELETE", &format!("/api/blog/posts/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/api/blog/posts/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_title_conflicts() {
    let app = setup_app();
    let first = create_post(&app).await;
    let second = create_post(&app).await;

    let response = send(
        &app,
        "PUT",
        &format!("/api/blog/posts/{}", first),
        Some(json!({ "title": "Sample Title" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "PUT",
        &format!("/api/blog/posts/{}", second),
        Some(json!({ "title": "Sample Title" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "Blog Post with given title already exists: Sample Title"
    );
}

#[tokio::test]
async fn test_invalid_tags_rejected() {
    let app = setup_app();
    let id = create_post(&app).await;

    let response = send(
        &app,
        "PUT",
        &format!("/api/blog/posts/{}", id),
        Some(json!({ "tags": ["Bad Tag"] })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_post_is_not_found() {
    let app = setup_app();

    for uri in [
        "/api/blog/posts/missingpost1",
        "/api/blog/summaries/missingpost1",
        "/api/blog/rights/missingpost1",
    ] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let response = send(&app, "DELETE", "/api/blog/posts/missingpost1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
