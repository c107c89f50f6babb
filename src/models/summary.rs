use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{identity::UserDirectory, store::PostSummaryModel, Error, Result};

use super::{timestamp, validate, Limits, ValidationError, ValidationResult};

/// Denormalized projection of a post, with a plain-text excerpt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub summary: String,
    pub url_fragment: String,
    pub tags: Vec<String>,
    pub thumbnail_filename: Option<String>,
    pub last_updated: Option<NaiveDateTime>,
    pub published_on: Option<NaiveDateTime>,
}

/// Public transport form; the author travels by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummaryDict {
    pub id: String,
    pub author_name: String,
    pub title: String,
    pub summary: String,
    pub thumbnail_filename: Option<String>,
    pub tags: Vec<String>,
    pub url_fragment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<String>,
}

impl PostSummary {
    pub fn validate(&self, strict: bool, limits: &Limits) -> ValidationResult {
        validate::post_id(&self.id)?;
        validate::title(&self.title, strict, false, limits)?;
        validate::tags(&self.tags, strict)?;
        validate::thumbnail(self.thumbnail_filename.as_deref(), strict)?;

        if strict {
            validate::url_fragment(&self.url_fragment, limits)?;
            if self.summary.is_empty() {
                return Err(ValidationError::Summary(
                    "Summary can not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn to_dict(&self, users: &dyn UserDirectory) -> Result<PostSummaryDict> {
        let author_name = users
            .display_name(&self.author_id)
            .ok_or_else(|| Error::UnknownUser(self.author_id.clone()))?;

        Ok(PostSummaryDict {
            id: self.id.clone(),
            author_name,
            title: self.title.clone(),
            summary: self.summary.clone(),
            thumbnail_filename: self.thumbnail_filename.clone(),
            tags: self.tags.clone(),
            url_fragment: self.url_fragment.clone(),
            last_updated: self.last_updated.as_ref().map(timestamp::to_string),
            published_on: self.published_on.as_ref().map(timestamp::to_string),
        })
    }

    pub fn serialize(&self, users: &dyn UserDirectory) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_dict(users)?)?)
    }
}

impl From<&PostSummaryModel> for PostSummary {
    fn from(model: &PostSummaryModel) -> Self {
        Self {
            id: model.id.clone(),
            author_id: model.author_id.clone(),
            title: model.title.clone(),
            summary: model.summary.clone(),
            url_fragment: model.url_fragment.clone(),
            tags: model.tags.clone(),
            thumbnail_filename: model.thumbnail_filename.clone(),
            last_updated: Some(model.last_updated),
            published_on: model.published_on,
        }
    }
}
