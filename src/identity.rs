//! Resolution between internal user ids and human-readable names.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::{BlogStore, UserSettingsModel};
use crate::Result;

/// Identity lookups used when blog objects cross the transport boundary.
///
/// Usernames are unique and reversible; display names are public-facing and
/// only resolve one way.
pub trait UserDirectory: Send + Sync {
    fn username(&self, user_id: &str) -> Option<String>;

    fn user_id(&self, username: &str) -> Option<String>;

    fn display_name(&self, user_id: &str) -> Option<String>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    by_id: HashMap<String, UserSettingsModel>,
    by_username: HashMap<String, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserSettingsModel>) -> Self {
        let mut directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        directory
    }

    /// Adds or replaces a user. A renamed user no longer resolves by the old name.
    pub fn insert(&mut self, user: UserSettingsModel) {
        self.remove(&user.id);
        self.by_username
            .insert(user.username.clone(), user.id.clone());
        self.by_id.insert(user.id.clone(), user);
    }

    pub fn remove(&mut self, user_id: &str) {
        if let Some(old) = self.by_id.remove(user_id) {
            self.by_username.remove(&old.username);
        }
    }
}

impl UserDirectory for InMemoryDirectory {
    fn username(&self, user_id: &str) -> Option<String> {
        self.by_id.get(user_id).map(|u| u.username.clone())
    }

    fn user_id(&self, username: &str) -> Option<String> {
        self.by_username.get(username).cloned()
    }

    fn display_name(&self, user_id: &str) -> Option<String> {
        self.by_id.get(user_id).map(|u| {
            u.display_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| u.username.clone())
        })
    }
}

/// Directory backed by the user table of a [`BlogStore`].
///
/// Lookups are synchronous and answer from a cache. Callers refresh the ids
/// they are about to resolve, so users added or renamed after start-up are
/// seen on the next request.
pub struct StoreDirectory {
    store: Arc<dyn BlogStore>,
    cache: RwLock<InMemoryDirectory>,
}

impl StoreDirectory {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(InMemoryDirectory::new()),
        }
    }

    /// Reloads `user_ids` from the store. Ids the store no longer knows are dropped.
    pub async fn refresh(&self, user_ids: &[&str]) -> Result<()> {
        for &id in user_ids {
            let user = self.store.user(id).await?;
            let mut cache = self.write();
            match user {
                Some(user) => cache.insert(user),
                None => cache.remove(id),
            }
        }
        Ok(())
    }

    pub async fn register(&self, user: UserSettingsModel) -> Result<()> {
        self.store.save_user(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        self.write().insert(user);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryDirectory> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryDirectory> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserDirectory for StoreDirectory {
    fn username(&self, user_id: &str) -> Option<String> {
        self.read().username(user_id)
    }

    fn user_id(&self, username: &str) -> Option<String> {
        self.read().user_id(username)
    }

    fn display_name(&self, user_id: &str) -> Option<String> {
        self.read().display_name(user_id)
    }
}
