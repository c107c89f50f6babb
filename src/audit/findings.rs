use std::fmt;

use serde::Serialize;

/// Stored record kinds an audit can report on or refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RecordKind {
    BlogPostModel,
    BlogPostSummaryModel,
    BlogPostRightsModel,
    UserSettingsModel,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::BlogPostModel => "BlogPostModel",
            RecordKind::BlogPostSummaryModel => "BlogPostSummaryModel",
            RecordKind::BlogPostRightsModel => "BlogPostRightsModel",
            RecordKind::UserSettingsModel => "UserSettingsModel",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FindingKind {
    DuplicateBlogTitleError,
    DuplicateBlogUrlError,
    ValidateTitleMatchesSummaryTitleError,
    ModelDomainObjectValidateError,
    ModelRelationshipError,
    InconsistentPublishTimestampsError,
    ModelMutatedDuringJobError,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One inconsistency detected in one stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AuditFinding {
    pub kind: FindingKind,
    pub model_kind: RecordKind,
    pub model_id: String,
    pub message: String,
}

impl AuditFinding {
    pub fn new(
        kind: FindingKind,
        model_kind: RecordKind,
        model_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            model_kind,
            model_id: model_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}(id={}): {}",
            self.kind,
            self.model_kind,
            quoted(&self.model_id),
            self.message
        )
    }
}

/// JSON string literal of `value`, as used in finding messages.
pub fn quoted(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
