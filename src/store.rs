//! Persistence of blog records behind the [`BlogStore`] seam.

mod memory;
mod postgres;
mod records;

pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use records::{
    Dataset, PostBundle, PostModel, PostRightsModel, PostSummaryModel, UserSettingsModel,
};

use async_trait::async_trait;

use crate::{Error, Result};

#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn post(&self, id: &str) -> Result<Option<PostModel>>;

    async fn summary(&self, id: &str) -> Result<Option<PostSummaryModel>>;

    async fn rights(&self, id: &str) -> Result<Option<PostRightsModel>>;

    async fn posts_with_title(&self, title: &str) -> Result<Vec<PostModel>>;

    async fn post_by_url_fragment(&self, url_fragment: &str) -> Result<Option<PostModel>>;

    async fn rights_for_editor(&self, user_id: &str) -> Result<Vec<PostRightsModel>>;

    /// Writes all three records of a post, or none of them. Fails with
    /// [`Error::Conflict`] when another post already holds the same non-empty
    /// title or URL fragment.
    async fn save(&self, bundle: &PostBundle) -> Result<()>;

    async fn save_rights(&self, rights: &PostRightsModel) -> Result<()>;

    /// Removes all three records of a post. Returns false if the post did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn user(&self, id: &str) -> Result<Option<UserSettingsModel>>;

    /// Inserts or replaces a user. Usernames are unique.
    async fn save_user(&self, user: &UserSettingsModel) -> Result<()>;

    async fn users(&self) -> Result<Vec<UserSettingsModel>>;

    async fn snapshot(&self) -> Result<Dataset>;
}

pub fn title_conflict(title: &str) -> Error {
    Error::Conflict(format!("Blog Post with given title already exists: {}", title))
}

pub fn url_fragment_conflict(url_fragment: &str) -> Error {
    Error::Conflict(format!(
        "Blog Post with given url fragment already exists: {}",
        url_fragment
    ))
}

pub fn username_conflict(username: &str) -> Error {
    Error::Conflict(format!("Username already taken: {}", username))
}
