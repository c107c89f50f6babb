use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Post, PostRights, PostSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostModel {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub url_fragment: String,
    pub tags: Vec<String>,
    pub thumbnail_filename: Option<String>,
    pub published_on: Option<NaiveDateTime>,
    pub created_on: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostSummaryModel {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub summary: String,
    pub url_fragment: String,
    pub tags: Vec<String>,
    pub thumbnail_filename: Option<String>,
    pub published_on: Option<NaiveDateTime>,
    pub created_on: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRightsModel {
    pub id: String,
    pub editor_ids: Vec<String>,
    pub published: bool,
    pub created_on: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSettingsModel {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

impl PostModel {
    /// Row for `post`; `last_updated` falls back to `now` for posts never saved.
    pub fn from_post(post: &Post, created_on: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: post.id.clone(),
            author_id: post.author_id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            url_fragment: post.url_fragment.clone(),
            tags: post.tags.clone(),
            thumbnail_filename: post.thumbnail_filename.clone(),
            published_on: post.published_on,
            created_on,
            last_updated: post.last_updated.unwrap_or(now),
        }
    }
}

impl PostSummaryModel {
    pub fn from_summary(summary: &PostSummary, created_on: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: summary.id.clone(),
            author_id: summary.author_id.clone(),
            title: summary.title.clone(),
            summary: summary.summary.clone(),
            url_fragment: summary.url_fragment.clone(),
            tags: summary.tags.clone(),
            thumbnail_filename: summary.thumbnail_filename.clone(),
            published_on: summary.published_on,
            created_on,
            last_updated: summary.last_updated.unwrap_or(now),
        }
    }
}

impl PostRightsModel {
    pub fn from_rights(rights: &PostRights, created_on: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: rights.id.clone(),
            editor_ids: rights.editor_ids.clone(),
            published: rights.published,
            created_on,
            last_updated: now,
        }
    }
}

impl UserSettingsModel {
    pub fn new(id: &str, username: &str, display_name: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            display_name: display_name.map(str::to_string),
        }
    }
}

/// The three records of one post, always written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBundle {
    pub post: PostModel,
    pub summary: PostSummaryModel,
    pub rights: PostRightsModel,
}

/// Every stored record, as read for an audit run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub posts: Vec<PostModel>,
    pub summaries: Vec<PostSummaryModel>,
    pub rights: Vec<PostRightsModel>,
    pub users: Vec<UserSettingsModel>,
}
