use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;

use super::{
    title_conflict, url_fragment_conflict, username_conflict, BlogStore, Dataset, PostBundle, PostModel, PostRightsModel, PostSummaryModel,
    UserSettingsModel,
};

#[derive(Debug, Default)]
struct Tables {
    posts: HashMap<String, PostModel>,
    summaries: HashMap<String, PostSummaryModel>,
    rights: HashMap<String, PostRightsModel>,
    users: HashMap<String, UserSettingsModel>,
}

/// Store kept in process memory. All writes of a bundle happen under one lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads records as given, including partial triples.
    pub fn with_dataset(dataset: Dataset) -> Self {
        let tables = Tables {
            posts: dataset.posts.into_iter().map(|m| (m.id.clone(), m)).collect(),
            summaries: dataset
                .summaries
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
            rights: dataset.rights.into_iter().map(|m| (m.id.clone(), m)).collect(),
            users: dataset.users.into_iter().map(|m| (m.id.clone(), m)).collect(),
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Tables {
    fn check_unique(&self, post: &PostModel) -> Result<()> {
        let others = self.posts.values().filter(|p| p.id != post.id);
        for other in others {
            if !post.title.is_empty() && other.title == post.title {
                return Err(title_conflict(&post.title));
            }
            if !post.url_fragment.is_empty() && other.url_fragment == post.url_fragment {
                return Err(url_fragment_conflict(&post.url_fragment));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlogStore for InMemoryStore {
    async fn post(&self, id: &str) -> Result<Option<PostModel>> {
        Ok(self.tables.read().await.posts.get(id).cloned())
    }

    async fn summary(&self, id: &str) -> Result<Option<PostSummaryModel>> {
        Ok(self.tables.read().await.summaries.get(id).cloned())
    }

    async fn rights(&self, id: &str) -> Result<Option<PostRightsModel>> {
        Ok(self.tables.read().await.rights.get(id).cloned())
    }

    async fn posts_with_title(&self, title: &str) -> Result<Vec<PostModel>> {
        Ok(self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.title == title)
            .cloned()
            .collect())
    }

    async fn post_by_url_fragment(&self, url_fragment: &str) -> Result<Option<PostModel>> {
        Ok(self
            .tables
            .read()
            .await
            .posts
            .values()
            .find(|p| p.url_fragment == url_fragment)
            .cloned())
    }

    async fn rights_for_editor(&self, user_id: &str) -> Result<Vec<PostRightsModel>> {
        Ok(self
            .tables
            .read()
            .await
            .rights
            .values()
            .filter(|r| r.editor_ids.iter().any(|id| id == user_id))
            .cloned()
            .collect())
    }

    async fn save(&self, bundle: &PostBundle) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_unique(&bundle.post)?;
        tables
            .posts
            .insert(bundle.post.id.clone(), bundle.post.clone());
        tables
            .summaries
            .insert(bundle.summary.id.clone(), bundle.summary.clone());
        tables
            .rights
            .insert(bundle.rights.id.clone(), bundle.rights.clone());
        Ok(())
    }

    async fn save_rights(&self, rights: &PostRightsModel) -> Result<()> {
        self.tables
            .write()
            .await
            .rights
            .insert(rights.id.clone(), rights.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.remove(id);
        let summary = tables.summaries.remove(id);
        let rights = tables.rights.remove(id);
        Ok(post.is_some() || summary.is_some() || rights.is_some())
    }

    async fn user(&self, id: &str) -> Result<Option<UserSettingsModel>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn save_user(&self, user: &UserSettingsModel) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(username_conflict(&user.username));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn users(&self) -> Result<Vec<UserSettingsModel>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn snapshot(&self) -> Result<Dataset> {
        let tables = self.tables.read().await;
        Ok(Dataset {
            posts: tables.posts.values().cloned().collect(),
            summaries: tables.summaries.values().cloned().collect(),
            rights: tables.rights.values().cloned().collect(),
            users: tables.users.values().cloned().collect(),
        })
    }
}
