//! Operations on the post/summary/rights triple.
//!
//! Every mutation loads the current records, applies and validates the change
//! on domain objects, and only then writes the whole triple back in one
//! [`BlogStore::save`]. A rejected change leaves the stored records untouched.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    html,
    identity::{StoreDirectory, UserDirectory},
    models::{
        timestamp, validate::BLOG_POST_ID_LENGTH, Limits, Post, PostRights, PostSummary,
        ValidationError,
    },
    store::{
        self, BlogStore, PostBundle, PostModel, PostRightsModel, PostSummaryModel,
        UserSettingsModel,
    },
    Error, Result,
};

const MAX_ID_ATTEMPTS: usize = 10;

/// Fields an editor may change in one update. Absent fields are left alone.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostChange {
    pub title: Option<String>,
    pub thumbnail_filename: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn BlogStore>,
    users: Arc<StoreDirectory>,
    limits: Limits,
}

struct Loaded {
    post: Post,
    rights: PostRights,
    created_on: NaiveDateTime,
    summary_created_on: NaiveDateTime,
    rights_created_on: NaiveDateTime,
}

impl BlogService {
    pub fn new(store: Arc<dyn BlogStore>, limits: Limits) -> Self {
        Self {
            users: Arc::new(StoreDirectory::new(store.clone())),
            store,
            limits,
        }
    }

    /// Resolves every user referenced by objects this service has returned.
    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    pub async fn register_user(
        &self,
        id: &str,
        username: &str,
        display_name: Option<&str>,
    ) -> Result<UserSettingsModel> {
        if id.is_empty() {
            return Err(ValidationError::User("User id should not be empty".to_string()).into());
        }
        if username.is_empty() {
            return Err(ValidationError::User("Username should not be empty".to_string()).into());
        }

        let user = UserSettingsModel::new(id, username, display_name);
        self.users.register(user.clone()).await?;
        Ok(user)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub async fn new_post_id(&self) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(BLOG_POST_ID_LENGTH)
                .collect();
            if self.store.post(&id).await?.is_none() {
                return Ok(id);
            }
        }

        Err(Error::Internal(
            "New blog post id generator is producing too many collisions.".to_string(),
        ))
    }

    /// Creates an empty draft whose only editor is its author.
    pub async fn create_new_post(&self, author_id: &str) -> Result<Post> {
        self.users.refresh(&[author_id]).await?;
        if self.users.username(author_id).is_none() {
            return Err(Error::UnknownUser(author_id.to_string()));
        }

        let now = timestamp::now();
        let mut post = Post::draft(self.new_post_id().await?, author_id);
        post.last_updated = Some(now);
        let rights = PostRights::new(post.id.clone(), vec![author_id.to_string()]);

        self.store
            .save(&self.bundle(&post, &rights, now, now, now, now))
            .await?;

        tracing::info!(post_id = %post.id, author_id, "Created blog post");
        Ok(post)
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        let model = self
            .store
            .post(id)
            .await?
            .ok_or_else(|| Error::not_found("Blog post", id))?;
        self.users.refresh(&[model.author_id.as_str()]).await?;
        Ok(Post::from(&model))
    }

    pub async fn get_summary(&self, id: &str) -> Result<PostSummary> {
        let model = self
            .store
            .summary(id)
            .await?
            .ok_or_else(|| Error::not_found("Blog post summary", id))?;
        self.users.refresh(&[model.author_id.as_str()]).await?;
        Ok(PostSummary::from(&model))
    }

    pub async fn get_rights(&self, id: &str) -> Result<PostRights> {
        let model = self
            .store
            .rights(id)
            .await?
            .ok_or_else(|| Error::not_found("Blog post rights", id))?;
        let editors: Vec<&str> = model.editor_ids.iter().map(String::as_str).collect();
        self.users.refresh(&editors).await?;
        Ok(PostRights::from(&model))
    }

    pub async fn get_post_by_url_fragment(&self, url_fragment: &str) -> Result<Post> {
        let model = self
            .store
            .post_by_url_fragment(url_fragment)
            .await?
            .ok_or_else(|| Error::not_found("Blog post with url fragment", url_fragment))?;
        self.users.refresh(&[model.author_id.as_str()]).await?;
        Ok(Post::from(&model))
    }

    pub async fn url_fragment_exists(&self, url_fragment: &str) -> Result<bool> {
        Ok(self.store.post_by_url_fragment(url_fragment).await?.is_some())
    }

    /// Applies `change`; a new title also regenerates the URL fragment.
    pub async fn update_post(&self, id: &str, change: PostChange) -> Result<Post> {
        let mut loaded = self.load(id).await?;
        let post = &mut loaded.post;

        if let Some(title) = change.title.as_deref() {
            if title != post.title {
                self.ensure_title_available(id, title).await?;
                post.update_title(title, &self.limits)?;

                let fragment = generate_url_fragment(title);
                self.ensure_url_fragment_available(id, &fragment).await?;
                post.update_url_fragment(&fragment, &self.limits)?;
            }
        }
        if let Some(filename) = change.thumbnail_filename {
            post.update_thumbnail(Some(filename))?;
        }
        if let Some(content) = change.content.as_deref() {
            post.update_content(content)?;
        }
        if let Some(tags) = change.tags {
            post.update_tags(tags)?;
        }

        if loaded.rights.published {
            post.validate(true, &self.limits)?;
        }

        let now = timestamp::now();
        post.last_updated = Some(now);
        self.store.save(&self.bundle_loaded(&loaded, now)).await?;

        tracing::debug!(post_id = id, "Updated blog post");
        Ok(loaded.post)
    }

    /// Validates strictly, then stamps `published_on` on post and summary.
    pub async fn publish(&self, id: &str) -> Result<Post> {
        let mut loaded = self.load(id).await?;

        if let Err(e) = loaded.post.validate(true, &self.limits) {
            tracing::warn!(post_id = id, "Refusing to publish: {}", e);
            return Err(e.into());
        }

        let now = timestamp::now();
        loaded.post.published_on = Some(now);
        loaded.post.last_updated = Some(now);
        loaded.rights.published = true;
        self.store.save(&self.bundle_loaded(&loaded, now)).await?;

        tracing::info!(post_id = id, "Published blog post");
        Ok(loaded.post)
    }

    pub async fn unpublish(&self, id: &str) -> Result<Post> {
        let mut loaded = self.load(id).await?;

        let now = timestamp::now();
        loaded.post.published_on = None;
        loaded.post.last_updated = Some(now);
        loaded.rights.published = false;
        self.store.save(&self.bundle_loaded(&loaded, now)).await?;

        tracing::info!(post_id = id, "Unpublished blog post");
        Ok(loaded.post)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(Error::not_found("Blog post", id));
        }
        tracing::info!(post_id = id, "Deleted blog post");
        Ok(())
    }

    pub fn check_can_edit(&self, user_id: Option<&str>, rights: &PostRights) -> bool {
        rights.is_editor(user_id)
    }

    /// Removes `user_id` from the editors of every post.
    pub async fn deassign_user(&self, user_id: &str) -> Result<usize> {
        let assigned = self.store.rights_for_editor(user_id).await?;
        let now = timestamp::now();

        for mut rights in assigned.iter().cloned() {
            rights.editor_ids.retain(|id| id != user_id);
            rights.last_updated = now;
            self.store.save_rights(&rights).await?;
        }

        tracing::info!(user_id, posts = assigned.len(), "Removed editor from blog posts");
        Ok(assigned.len())
    }

    async fn ensure_title_available(&self, id: &str, title: &str) -> Result<()> {
        let taken = self
            .store
            .posts_with_title(title)
            .await?
            .iter()
            .any(|p| p.id != id);
        if taken {
            return Err(store::title_conflict(title));
        }
        Ok(())
    }

    async fn ensure_url_fragment_available(&self, id: &str, fragment: &str) -> Result<()> {
        if let Some(existing) = self.store.post_by_url_fragment(fragment).await? {
            if existing.id != id {
                return Err(store::url_fragment_conflict(fragment));
            }
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Loaded> {
        let post = self
            .store
            .post(id)
            .await?
            .ok_or_else(|| Error::not_found("Blog post", id))?;
        let summary = self
            .store
            .summary(id)
            .await?
            .ok_or_else(|| Error::not_found("Blog post summary", id))?;
        let rights = self
            .store
            .rights(id)
            .await?
            .ok_or_else(|| Error::not_found("Blog post rights", id))?;
        self.users.refresh(&[post.author_id.as_str()]).await?;

        Ok(Loaded {
            post: Post::from(&post),
            rights: PostRights::from(&rights),
            created_on: post.created_on,
            summary_created_on: summary.created_on,
            rights_created_on: rights.created_on,
        })
    }

    fn bundle_loaded(&self, loaded: &Loaded, now: NaiveDateTime) -> PostBundle {
        self.bundle(
            &loaded.post,
            &loaded.rights,
            loaded.created_on,
            loaded.summary_created_on,
            loaded.rights_created_on,
            now,
        )
    }

    fn bundle(
        &self,
        post: &Post,
        rights: &PostRights,
        created_on: NaiveDateTime,
        summary_created_on: NaiveDateTime,
        rights_created_on: NaiveDateTime,
        now: NaiveDateTime,
    ) -> PostBundle {
        let summary = compute_summary(post, &self.limits);
        PostBundle {
            post: PostModel::from_post(post, created_on, now),
            summary: PostSummaryModel::from_summary(&summary, summary_created_on, now),
            rights: PostRightsModel::from_rights(rights, rights_created_on, now),
        }
    }
}

/// Plain-text excerpt of post content, always ending in `...`.
pub fn generate_summary(content: &str, limits: &Limits) -> String {
    let text = html::raw_text(content);
    let max_chars = limits.max_summary_chars.saturating_sub(3);

    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        format!("{}...", text)
    }
}

pub fn generate_url_fragment(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Summary projection of `post`; timestamps are carried over unchanged.
pub fn compute_summary(post: &Post, limits: &Limits) -> PostSummary {
    PostSummary {
        id: post.id.clone(),
        author_id: post.author_id.clone(),
        title: post.title.clone(),
        summary: generate_summary(&post.content, limits),
        url_fragment: post.url_fragment.clone(),
        tags: post.tags.clone(),
        thumbnail_filename: post.thumbnail_filename.clone(),
        last_updated: post.last_updated,
        published_on: post.published_on,
    }
}
