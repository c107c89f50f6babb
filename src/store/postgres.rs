use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{Error, Result};

use super::{
    title_conflict, url_fragment_conflict, username_conflict, BlogStore, Dataset, PostBundle, PostModel, PostRightsModel, PostSummaryModel,
    UserSettingsModel,
};

const POST_COLUMNS: &str = "id, author_id, title, content, url_fragment, tags, \
     thumbnail_filename, published_on, created_on, last_updated";
const SUMMARY_COLUMNS: &str = "id, author_id, title, summary, url_fragment, tags, \
     thumbnail_filename, published_on, created_on, last_updated";
const RIGHTS_COLUMNS: &str = "id, editor_ids, published, created_on, last_updated";
const USER_COLUMNS: &str = "id, username, display_name";

/// Translates a violation of one of the uniqueness indexes into a conflict.
fn unique_violation(e: sqlx::Error, post: &PostModel) -> Error {
    let constraint = e
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint().map(str::to_string));

    match constraint.as_deref() {
        Some("blog_posts_title_unique") => title_conflict(&post.title),
        Some("blog_posts_url_fragment_unique") => url_fragment_conflict(&post.url_fragment),
        _ => e.into(),
    }
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(|e| crate::Error::Internal(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn post(&self, id: &str) -> Result<Option<PostModel>> {
        let post = sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM blog_posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(post)
    }

    async fn summary(&self, id: &str) -> Result<Option<PostSummaryModel>> {
        let summary = sqlx::query_as::<_, PostSummaryModel>(&format!(
            "SELECT {} FROM blog_post_summaries WHERE id = $1",
            SUMMARY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(summary)
    }

    async fn rights(&self, id: &str) -> Result<Option<PostRightsModel>> {
        let rights = sqlx::query_as::<_, PostRightsModel>(&format!(
            "SELECT {} FROM blog_post_rights WHERE id = $1",
            RIGHTS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(rights)
    }

    async fn posts_with_title(&self, title: &str) -> Result<Vec<PostModel>> {
        let posts = sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM blog_posts WHERE title = $1",
            POST_COLUMNS
        ))
        .bind(title)
        .fetch_all(&self.db)
        .await?;

        Ok(posts)
    }

    async fn post_by_url_fragment(&self, url_fragment: &str) -> Result<Option<PostModel>> {
        let post = sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM blog_posts WHERE url_fragment = $1 LIMIT 1",
            POST_COLUMNS
        ))
        .bind(url_fragment)
        .fetch_optional(&self.db)
        .await?;

        Ok(post)
    }

    async fn rights_for_editor(&self, user_id: &str) -> Result<Vec<PostRightsModel>> {
        let rights = sqlx::query_as::<_, PostRightsModel>(&format!(
            "SELECT {} FROM blog_post_rights WHERE $1 = ANY(editor_ids)",
            RIGHTS_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rights)
    }

    async fn save(&self, bundle: &PostBundle) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let post = &bundle.post;
        sqlx::query(
            "INSERT INTO blog_posts (id, author_id, title, content, url_fragment, tags, \
             thumbnail_filename, published_on, created_on, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET author_id = $2, title = $3, content = $4, \
             url_fragment = $5, tags = $6, thumbnail_filename = $7, published_on = $8, \
             last_updated = $10",
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.url_fragment)
        .bind(&post.tags)
        .bind(&post.thumbnail_filename)
        .bind(post.published_on)
        .bind(post.created_on)
        .bind(post.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, post))?;

        let summary = &bundle.summary;
        sqlx::query(
            "INSERT INTO blog_post_summaries (id, author_id, title, summary, url_fragment, tags, \
             thumbnail_filename, published_on, created_on, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET author_id = $2, title = $3, summary = $4, \
             url_fragment = $5, tags = $6, thumbnail_filename = $7, published_on = $8, \
             last_updated = $10",
        )
        .bind(&summary.id)
        .bind(&summary.author_id)
        .bind(&summary.title)
        .bind(&summary.summary)
        .bind(&summary.url_fragment)
        .bind(&summary.tags)
        .bind(&summary.thumbnail_filename)
        .bind(summary.published_on)
        .bind(summary.created_on)
        .bind(summary.last_updated)
        .execute(&mut *tx)
        .await?;

        upsert_rights(&mut tx, &bundle.rights).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save_rights(&self, rights: &PostRightsModel) -> Result<()> {
        let mut tx = self.db.begin().await?;
        upsert_rights(&mut tx, rights).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let mut removed = 0;

        for table in ["blog_posts", "blog_post_summaries", "blog_post_rights"] {
            removed += sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(removed > 0)
    }

    async fn user(&self, id: &str) -> Result<Option<UserSettingsModel>> {
        let user = sqlx::query_as::<_, UserSettingsModel>(&format!(
            "SELECT {} FROM user_settings WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn save_user(&self, user: &UserSettingsModel) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_settings (id, username, display_name) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET username = $2, display_name = $3",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .execute(&self.db)
        .await
        .map_err(|e| {
            let taken = e
                .as_database_error()
                .map_or(false, |db| db.is_unique_violation());
            if taken {
                username_conflict(&user.username)
            } else {
                e.into()
            }
        })?;

        Ok(())
    }

    async fn users(&self) -> Result<Vec<UserSettingsModel>> {
        let users = sqlx::query_as::<_, UserSettingsModel>(&format!(
            "SELECT {} FROM user_settings",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn snapshot(&self) -> Result<Dataset> {
        let posts = sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM blog_posts",
            POST_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        let summaries = sqlx::query_as::<_, PostSummaryModel>(&format!(
            "SELECT {} FROM blog_post_summaries",
            SUMMARY_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        let rights = sqlx::query_as::<_, PostRightsModel>(&format!(
            "SELECT {} FROM blog_post_rights",
            RIGHTS_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(Dataset {
            posts,
            summaries,
            rights,
            users: self.users().await?,
        })
    }
}

async fn upsert_rights(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    rights: &PostRightsModel,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO blog_post_rights (id, editor_ids, published, created_on, last_updated) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (id) DO UPDATE SET editor_ids = $2, published = $3, last_updated = $5",
    )
    .bind(&rights.id)
    .bind(&rights.editor_ids)
    .bind(rights.published)
    .bind(rights.created_on)
    .bind(rights.last_updated)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
