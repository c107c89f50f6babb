use serde::{Deserialize, Serialize};

use crate::{identity::UserDirectory, store::PostRightsModel};

/// Who may edit a post, and whether it is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRights {
    pub id: String,
    pub editor_ids: Vec<String>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRightsDict {
    pub blog_post_id: String,
    pub editor_names: Vec<String>,
    pub blog_post_is_published: bool,
}

impl PostRights {
    pub fn new(id: impl Into<String>, editor_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            editor_ids,
            published: false,
        }
    }

    pub fn is_editor(&self, user_id: Option<&str>) -> bool {
        match user_id {
            Some(user_id) => self.editor_ids.iter().any(|id| id == user_id),
            None => false,
        }
    }

    /// Editors unknown to the directory are reported by their raw id.
    pub fn to_dict(&self, users: &dyn UserDirectory) -> PostRightsDict {
        PostRightsDict {
            blog_post_id: self.id.clone(),
            editor_names: self
                .editor_ids
                .iter()
                .map(|id| users.display_name(id).unwrap_or_else(|| id.clone()))
                .collect(),
            blog_post_is_published: self.published,
        }
    }
}

impl From<&PostRightsModel> for PostRights {
    fn from(model: &PostRightsModel) -> Self {
        Self {
            id: model.id.clone(),
            editor_ids: model.editor_ids.clone(),
            published: model.published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryDirectory;
    use crate::store::UserSettingsModel;

    #[test]
    fn test_is_editor() {
        let rights = PostRights::new("validblogid1", vec!["uid_a".to_string()]);

        assert!(rights.is_editor(Some("uid_a")));
        assert!(!rights.is_editor(Some("uid_b")));
        assert!(!rights.is_editor(None));
        assert!(!rights.published);
    }

    #[test]
    fn test_to_dict_resolves_editor_names() {
        let users = InMemoryDirectory::with_users([
            UserSettingsModel::new("uid_a", "alice", Some("Alice")),
            UserSettingsModel::new("uid_b", "bob", None),
        ]);
        let rights = PostRights::new(
            "validblogid1",
            vec!["uid_a".to_string(), "uid_b".to_string(), "uid_c".to_string()],
        );

        let dict = rights.to_dict(&users);
        assert_eq!(dict.editor_names, vec!["Alice", "bob", "uid_c"]);
        assert!(!dict.blog_post_is_published);
    }
}
