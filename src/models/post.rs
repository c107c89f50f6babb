use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{html, identity::UserDirectory, store::PostModel, Error, Result};

use super::{timestamp, validate, Limits, ValidationError, ValidationResult};

/// A blog post as edited by its authors. Content is always sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub url_fragment: String,
    pub tags: Vec<String>,
    pub thumbnail_filename: Option<String>,
    pub last_updated: Option<NaiveDateTime>,
    pub published_on: Option<NaiveDateTime>,
}

/// Transport form of a [`Post`]. The author travels by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDict {
    pub id: String,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub thumbnail_filename: Option<String>,
    pub tags: Vec<String>,
    pub url_fragment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<String>,
}

impl Post {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        title: impl Into<String>,
        content: &str,
        url_fragment: impl Into<String>,
        tags: Vec<String>,
        thumbnail_filename: Option<String>,
        last_updated: Option<NaiveDateTime>,
        published_on: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            title: title.into(),
            content: html::clean(content),
            url_fragment: url_fragment.into(),
            tags,
            thumbnail_filename,
            last_updated,
            published_on,
        }
    }

    /// An empty, unpublished post.
    pub fn draft(id: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self::new(id, author_id, "", "", "", Vec::new(), None, None, None)
    }

    pub fn is_published(&self) -> bool {
        self.published_on.is_some()
    }

    /// `strict` is required before a post may be published.
    pub fn validate(&self, strict: bool, limits: &Limits) -> ValidationResult {
        validate::post_id(&self.id)?;
        validate::title(&self.title, strict, true, limits)?;
        validate::tags(&self.tags, strict)?;
        validate::thumbnail(self.thumbnail_filename.as_deref(), strict)?;

        if strict {
            validate::url_fragment(&self.url_fragment, limits)?;
            if self.content.is_empty() {
                return Err(ValidationError::Content(
                    "Content can not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn update_title(&mut self, new_title: &str, limits: &Limits) -> ValidationResult {
        validate::title(new_title, true, true, limits)?;
        self.title = new_title.to_string();
        Ok(())
    }

    pub fn update_url_fragment(&mut self, new_fragment: &str, limits: &Limits) -> ValidationResult {
        validate::url_fragment(new_fragment, limits)?;
        self.url_fragment = new_fragment.to_string();
        Ok(())
    }

    pub fn update_thumbnail(&mut self, new_filename: Option<String>) -> ValidationResult {
        validate::thumbnail(new_filename.as_deref(), true)?;
        self.thumbnail_filename = new_filename;
        Ok(())
    }

    pub fn update_content(&mut self, new_content: &str) -> ValidationResult {
        let cleaned = html::clean(new_content);
        if cleaned.is_empty() {
            return Err(ValidationError::Content(
                "Content can not be empty".to_string(),
            ));
        }
        self.content = cleaned;
        Ok(())
    }

    pub fn update_tags(&mut self, new_tags: Vec<String>) -> ValidationResult {
        validate::tags(&new_tags, true)?;
        self.tags = new_tags;
        Ok(())
    }

    pub fn to_dict(&self, users: &dyn UserDirectory) -> Result<PostDict> {
        let author_name = users
            .username(&self.author_id)
            .ok_or_else(|| Error::UnknownUser(self.author_id.clone()))?;

        Ok(PostDict {
            id: self.id.clone(),
            author_name,
            title: self.title.clone(),
            content: self.content.clone(),
            thumbnail_filename: self.thumbnail_filename.clone(),
            tags: self.tags.clone(),
            url_fragment: self.url_fragment.clone(),
            last_updated: self.last_updated.as_ref().map(timestamp::to_string),
            published_on: self.published_on.as_ref().map(timestamp::to_string),
        })
    }

    pub fn from_dict(dict: PostDict, users: &dyn UserDirectory) -> Result<Self> {
        let author_id = users
            .user_id(&dict.author_name)
            .ok_or_else(|| Error::UnknownUser(dict.author_name.clone()))?;
        let last_updated = dict.last_updated.as_deref().map(timestamp::parse).transpose()?;
        let published_on = dict.published_on.as_deref().map(timestamp::parse).transpose()?;

        Ok(Self::new(
            dict.id,
            author_id,
            dict.title,
            &dict.content,
            dict.url_fragment,
            dict.tags,
            dict.thumbnail_filename,
            last_updated,
            published_on,
        ))
    }

    /// UTF-8 JSON encoding of [`Post::to_dict`].
    pub fn serialize(&self, users: &dyn UserDirectory) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_dict(users)?)?)
    }

    pub fn deserialize(bytes: &[u8], users: &dyn UserDirectory) -> Result<Self> {
        let dict: PostDict = serde_json::from_slice(bytes)?;
        Self::from_dict(dict, users)
    }
}

impl From<&PostModel> for Post {
    fn from(model: &PostModel) -> Self {
        Self {
            id: model.id.clone(),
            author_id: model.author_id.clone(),
            title: model.title.clone(),
            content: model.content.clone(),
            url_fragment: model.url_fragment.clone(),
            tags: model.tags.clone(),
            thumbnail_filename: model.thumbnail_filename.clone(),
            last_updated: Some(model.last_updated),
            published_on: model.published_on,
        }
    }
}
