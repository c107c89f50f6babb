use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::models::Limits;
use crate::store::Dataset;
use crate::{Error, Result};

use super::findings::{AuditFinding, RecordKind};
use super::rules::{self, AuditIndex, Record, UniqueProperty};

type PerRecord = fn(&Record, &AuditIndex) -> Vec<AuditFinding>;

#[derive(Debug, Clone, Copy)]
pub enum Audit {
    PerRecord(PerRecord),
    Unique(UniqueProperty),
}

/// One audit and the record kinds it applies to.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub name: &'static str,
    pub kinds: &'static [RecordKind],
    pub audit: Audit,
}

impl Registration {
    fn applies_to(&self, kind: RecordKind) -> bool {
        self.kinds.contains(&kind)
    }
}

const BLOG_KINDS: &[RecordKind] = &[RecordKind::BlogPostModel, RecordKind::BlogPostSummaryModel];
const ALL_KINDS: &[RecordKind] = &[
    RecordKind::BlogPostModel,
    RecordKind::BlogPostSummaryModel,
    RecordKind::BlogPostRightsModel,
];

pub const REGISTRY: &[Registration] = &[
    Registration {
        name: "title_uniqueness",
        kinds: BLOG_KINDS,
        audit: Audit::Unique(UniqueProperty::Title),
    },
    Registration {
        name: "url_uniqueness",
        kinds: BLOG_KINDS,
        audit: Audit::Unique(UniqueProperty::UrlFragment),
    },
    Registration {
        name: "title_matches_summary",
        kinds: &[RecordKind::BlogPostModel],
        audit: Audit::PerRecord(rules::title_matches_summary),
    },
    Registration {
        name: "domain_objects",
        kinds: BLOG_KINDS,
        audit: Audit::PerRecord(rules::domain_objects),
    },
    Registration {
        name: "relationships",
        kinds: ALL_KINDS,
        audit: Audit::PerRecord(rules::relationships),
    },
    Registration {
        name: "publish_timestamps",
        kinds: BLOG_KINDS,
        audit: Audit::PerRecord(rules::publish_timestamps),
    },
];

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub findings: Vec<AuditFinding>,
    pub records_checked: usize,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Runs every registered audit over a snapshot.
#[derive(Debug, Clone)]
pub struct AuditRunner {
    workers: usize,
    limits: Limits,
}

impl AuditRunner {
    pub fn new(workers: usize, limits: Limits) -> Self {
        Self {
            workers: workers.max(1),
            limits,
        }
    }

    /// Findings are sorted for stable output; their order carries no meaning.
    pub async fn run(&self, dataset: &Dataset, started_at: NaiveDateTime) -> Result<AuditReport> {
        let index = Arc::new(AuditIndex::new(dataset, self.limits, started_at));
        let records = rules::records(dataset);
        let records_checked = records.len();

        let mut findings = Vec::new();

        for registration in REGISTRY {
            if let Audit::Unique(property) = registration.audit {
                let applicable: Vec<&Record> = records
                    .iter()
                    .filter(|r| registration.applies_to(r.kind()))
                    .collect();
                let found = rules::duplicates(&applicable, property);
                debug!(audit = registration.name, findings = found.len(), "Audit finished");
                findings.extend(found);
            }
        }

        let chunk_size = records.len().div_ceil(self.workers).max(1);
        let mut units = JoinSet::new();
        for chunk in records.chunks(chunk_size) {
            let chunk = chunk.to_vec();
            let index = Arc::clone(&index);
            units.spawn_blocking(move || check_records(&chunk, &index));
        }

        while let Some(result) = units.join_next().await {
            let found = result.map_err(|e| Error::Internal(format!("Audit unit failed: {}", e)))?;
            findings.extend(found);
        }

        findings.sort();
        info!(
            records = records_checked,
            findings = findings.len(),
            "Audit run complete"
        );

        Ok(AuditReport {
            findings,
            records_checked,
        })
    }
}

fn check_records(records: &[Record], index: &AuditIndex) -> Vec<AuditFinding> {
    let mut findings = Vec::new();
    for record in records {
        for registration in REGISTRY {
            if let Audit::PerRecord(audit) = registration.audit {
                if registration.applies_to(record.kind()) {
                    findings.extend(audit(record, index));
                }
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::FindingKind;
    use crate::store::{PostModel, PostRightsModel, PostSummaryModel, UserSettingsModel};
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn triple(data: &mut Dataset, id: &str, title: &str, fragment: &str) {
        data.posts.push(PostModel {
            id: id.to_string(),
            author_id: "uid_a".to_string(),
            title: title.to_string(),
            content: "<p>Hello</p>".to_string(),
            url_fragment: fragment.to_string(),
            tags: vec!["news".to_string()],
            thumbnail_filename: Some("thumb.svg".to_string()),
            published_on: None,
            created_on: at(1),
            last_updated: at(2),
        });
        data.summaries.push(PostSummaryModel {
            id: id.to_string(),
            author_id: "uid_a".to_string(),
            title: title.to_string(),
            summary: "Hello...".to_string(),
            url_fragment: fragment.to_string(),
            tags: vec!["news".to_string()],
            thumbnail_filename: Some("thumb.svg".to_string()),
            published_on: None,
            created_on: at(1),
            last_updated: at(2),
        });
        data.rights.push(PostRightsModel {
            id: id.to_string(),
            editor_ids: vec!["uid_a".to_string()],
            published: false,
            created_on: at(1),
            last_updated: at(2),
        });
    }

    fn base() -> Dataset {
        Dataset {
            users: vec![UserSettingsModel::new("uid_a", "alice", Some("Alice"))],
            ..Dataset::default()
        }
    }

    fn runner() -> AuditRunner {
        AuditRunner::new(3, Limits::default())
    }

    fn of_kind(report: &AuditReport, kind: FindingKind) -> Vec<&AuditFinding> {
        report.findings.iter().filter(|f| f.kind == kind).collect()
    }

    #[tokio::test]
    async fn test_consistent_dataset_is_clean() {
        let mut data = base();
        triple(&mut data, "validblogid1", "First Post", "first-post");
        triple(&mut data, "validblogid2", "Second Post", "second-post");

        let report = runner().run(&data, at(20)).await.unwrap();

        assert!(report.is_clean(), "{:?}", report.findings);
        assert_eq!(report.records_checked, 6);
    }

    #[tokio::test]
    async fn test_empty_titles_are_not_duplicates() {
        let mut data = base();
        triple(&mut data, "validblogid1", "", "");
        triple(&mut data, "validblogid2", "", "");

        let report = runner().run(&data, at(20)).await.unwrap();

        assert!(of_kind(&report, FindingKind::DuplicateBlogTitleError).is_empty());
        assert!(of_kind(&report, FindingKind::DuplicateBlogUrlError).is_empty());
    }

    #[tokio::test]
    async fn test_stale_summary_title_yields_one_error() {
        let mut data = base();
        triple(&mut data, "validblogid1", "Sample Title", "sample-title");
        data.summaries[0].title = "Old Title".to_string();

        let report = runner().run(&data, at(20)).await.unwrap();

        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].to_string(),
            r#"ValidateTitleMatchesSummaryTitleError in BlogPostModel(id="validblogid1"): Title for both blog post and its summary model should be same. Received: "Sample Title" and "Old Title"."#
        );
    }

    #[tokio::test]
    async fn test_duplicate_titles_report_non_canonical_members() {
        let mut data = base();
        triple(&mut data, "validblogid1", "Sample Title", "sample-one");
        triple(&mut data, "validblogid2", "Sample Title", "sample-two");

        let report = runner().run(&data, at(20)).await.unwrap();
        let dupes = of_kind(&report, FindingKind::DuplicateBlogTitleError);

        // One per kind: the post group and the summary group.
        assert_eq!(dupes.len(), 2);
        for finding in dupes {
            assert!(["validblogid1", "validblogid2"].contains(&finding.model_id.as_str()));
            assert_eq!(finding.message, r#"title="Sample Title" is not unique"#);
        }
    }

    #[tokio::test]
    async fn test_missing_summary_reports_relationships() {
        let mut data = base();
        triple(&mut data, "validblogid1", "Sample Title", "sample-title");
        data.summaries.clear();

        let report = runner().run(&data, at(20)).await.unwrap();
        let broken = of_kind(&report, FindingKind::ModelRelationshipError);

        assert_eq!(broken.len(), 2);
        assert!(broken
            .iter()
            .any(|f| f.model_kind == RecordKind::BlogPostModel));
        assert!(broken
            .iter()
            .any(|f| f.model_kind == RecordKind::BlogPostRightsModel));
        assert!(broken
            .iter()
            .all(|f| f.message.contains("BlogPostSummaryModel")));
    }

    #[tokio::test]
    async fn test_repeated_missing_editor_is_reported_per_reference() {
        let mut data = base();
        triple(&mut data, "validblogid1", "Sample Title", "sample-title");
        data.rights[0].editor_ids = vec!["uid_x".to_string(), "uid_x".to_string()];

        let report = runner().run(&data, at(20)).await.unwrap();
        let broken = of_kind(&report, FindingKind::ModelRelationshipError);

        assert_eq!(broken.len(), 2);
        assert!(broken
            .iter()
            .all(|f| f.model_kind == RecordKind::BlogPostRightsModel && f.message.contains("uid_x")));
    }

    #[tokio::test]
    async fn test_published_rights_select_strict_validation() {
        let mut data = base();
        triple(&mut data, "validblogid1", "Sample Title", "sample-title");
        data.posts[0].tags.clear();

        let report = runner().run(&data, at(20)).await.unwrap();
        assert!(of_kind(&report, FindingKind::ModelDomainObjectValidateError).is_empty());

        data.rights[0].published = true;
        let report = runner().run(&data, at(20)).await.unwrap();
        let invalid = of_kind(&report, FindingKind::ModelDomainObjectValidateError);

        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].model_kind, RecordKind::BlogPostModel);
        assert!(invalid[0]
            .message
            .ends_with("Atleast one tag should be selected"));
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let mut data = base();
        triple(&mut data, "validblogid1", "Sample Title", "sample-title");
        triple(&mut data, "validblogid2", "Sample Title", "sample-title");
        data.summaries[1].title = "Drifted".to_string();
        data.users.clear();

        let first = runner().run(&data, at(20)).await.unwrap();
        let second = AuditRunner::new(1, Limits::default())
            .run(&data, at(20))
            .await
            .unwrap();

        assert!(!first.is_clean());
        assert_eq!(first.findings, second.findings);
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let report = runner().run(&Dataset::default(), at(20)).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.records_checked, 0);
    }

    #[test]
    fn test_registry_covers_every_blog_kind() {
        for kind in ALL_KINDS {
            assert!(REGISTRY.iter().any(|r| r.applies_to(*kind)));
        }
        assert!(REGISTRY
            .iter()
            .all(|r| !r.applies_to(RecordKind::UserSettingsModel)));
    }
}
