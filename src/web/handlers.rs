use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    blog::PostChange,
    models::{PostDict, PostRightsDict, PostSummaryDict, ValidationError},
    store::UserSettingsModel,
    widgets::{self, WidgetInstance, WidgetKind},
    Result,
};

use super::{AppState, CreatePostPayload, CreateUserPayload, WidgetPayload};

pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub async fn widget_repository(Path(kind): Path<String>) -> Result<Json<Value>> {
    let kind: WidgetKind = kind.parse()?;
    let repository = widgets::repository(kind)?;

    Ok(Json(json!({ "widgetRepository": repository })))
}

/// An empty body means "all defaults". Any other body must be a JSON
/// `WidgetPayload`.
fn widget_payload(headers: &HeaderMap, body: &Bytes) -> Result<WidgetPayload> {
    if body.is_empty() {
        return Ok(WidgetPayload::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("application/json"));
    if !is_json {
        return Err(ValidationError::CustomizationArg(
            "Expected request with `Content-Type: application/json`".to_string(),
        )
        .into());
    }

    let Json(payload) = Json::<WidgetPayload>::from_bytes(body)
        .map_err(|rejection| ValidationError::CustomizationArg(rejection.body_text()))?;
    Ok(payload)
}

pub async fn widget_instance(
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WidgetInstance>> {
    let kind: WidgetKind = kind.parse()?;
    let payload = widget_payload(&headers, &body)?;
    let widget = widgets::get_widget(kind, &id)?;

    Ok(Json(widget.instance_dict(&payload.customization_args)?))
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserSettingsModel>)> {
    let user = state
        .blog
        .register_user(
            &payload.id,
            &payload.username,
            payload.display_name.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePostPayload>,
) -> Result<(StatusCode, Json<PostDict>)> {
    let post = state.blog.create_new_post(&payload.author_id).await?;

    Ok((StatusCode::CREATED, Json(post.to_dict(state.blog.users())?)))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostDict>> {
    let post = state.blog.get_post(&id).await?;
    Ok(Json(post.to_dict(state.blog.users())?))
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(change): Json<PostChange>,
) -> Result<Json<PostDict>> {
    let post = state.blog.update_post(&id, change).await?;
    Ok(Json(post.to_dict(state.blog.users())?))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.blog.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostDict>> {
    let post = state.blog.publish(&id).await?;
    Ok(Json(post.to_dict(state.blog.users())?))
}

pub async fn unpublish_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostDict>> {
    let post = state.blog.unpublish(&id).await?;
    Ok(Json(post.to_dict(state.blog.users())?))
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostSummaryDict>> {
    let summary = state.blog.get_summary(&id).await?;
    Ok(Json(summary.to_dict(state.blog.users())?))
}

pub async fn get_rights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostRightsDict>> {
    let rights = state.blog.get_rights(&id).await?;
    Ok(Json(rights.to_dict(state.blog.users())))
}
