//! The individual consistency checks.
//!
//! Per-record checks are pure functions of one record and the read-only
//! [`AuditIndex`]; grouped checks see every record of the audited kinds at
//! once. None of them mutate anything, so re-running them is harmless.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDateTime};

use crate::models::{Limits, Post, PostSummary};
use crate::store::{Dataset, PostModel, PostRightsModel, PostSummaryModel};

use super::findings::{quoted, AuditFinding, FindingKind, RecordKind};

/// Tolerated difference between clocks that stamped the records.
pub const MAX_CLOCK_SKEW_SECS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Post(PostModel),
    Summary(PostSummaryModel),
    Rights(PostRightsModel),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Post(_) => RecordKind::BlogPostModel,
            Record::Summary(_) => RecordKind::BlogPostSummaryModel,
            Record::Rights(_) => RecordKind::BlogPostRightsModel,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Post(m) => &m.id,
            Record::Summary(m) => &m.id,
            Record::Rights(m) => &m.id,
        }
    }

    /// Values of `field` that refer to other records.
    fn field_values(&self, field: &str) -> Vec<&str> {
        match (self, field) {
            (_, "id") => vec![self.id()],
            (Record::Post(m), "author_id") => vec![m.author_id.as_str()],
            (Record::Summary(m), "author_id") => vec![m.author_id.as_str()],
            (Record::Rights(m), "editor_ids") => m.editor_ids.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn published_on(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self {
            Record::Post(m) => m.published_on.map(|p| (p, m.created_on)),
            Record::Summary(m) => m.published_on.map(|p| (p, m.created_on)),
            Record::Rights(_) => None,
        }
    }
}

/// Lists every record in `dataset` in a stable order.
pub fn records(dataset: &Dataset) -> Vec<Record> {
    let mut records: Vec<Record> = dataset
        .posts
        .iter()
        .cloned()
        .map(Record::Post)
        .chain(dataset.summaries.iter().cloned().map(Record::Summary))
        .chain(dataset.rights.iter().cloned().map(Record::Rights))
        .collect();
    records.sort_by(|a, b| (a.kind(), a.id()).cmp(&(b.kind(), b.id())));
    records
}

/// Read-only lookup over a snapshot, shared by every audit unit.
#[derive(Debug)]
pub struct AuditIndex {
    posts: HashMap<String, PostModel>,
    summaries: HashMap<String, PostSummaryModel>,
    rights: HashMap<String, PostRightsModel>,
    users: HashSet<String>,
    pub limits: Limits,
    pub started_at: NaiveDateTime,
}

impl AuditIndex {
    pub fn new(dataset: &Dataset, limits: Limits, started_at: NaiveDateTime) -> Self {
        Self {
            posts: dataset.posts.iter().map(|m| (m.id.clone(), m.clone())).collect(),
            summaries: dataset
                .summaries
                .iter()
                .map(|m| (m.id.clone(), m.clone()))
                .collect(),
            rights: dataset.rights.iter().map(|m| (m.id.clone(), m.clone())).collect(),
            users: dataset.users.iter().map(|u| u.id.clone()).collect(),
            limits,
            started_at,
        }
    }

    pub fn contains(&self, kind: RecordKind, id: &str) -> bool {
        match kind {
            RecordKind::BlogPostModel => self.posts.contains_key(id),
            RecordKind::BlogPostSummaryModel => self.summaries.contains_key(id),
            RecordKind::BlogPostRightsModel => self.rights.contains_key(id),
            RecordKind::UserSettingsModel => self.users.contains(id),
        }
    }

    pub fn summary(&self, id: &str) -> Option<&PostSummaryModel> {
        self.summaries.get(id)
    }

    pub fn rights(&self, id: &str) -> Option<&PostRightsModel> {
        self.rights.get(id)
    }
}

/// A field of one record kind that names records of other kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub targets: &'static [RecordKind],
}

const POST_REFERENCES: &[Reference] = &[
    Reference {
        field: "id",
        targets: &[RecordKind::BlogPostSummaryModel, RecordKind::BlogPostRightsModel],
    },
    Reference {
        field: "author_id",
        targets: &[RecordKind::UserSettingsModel],
    },
];

const SUMMARY_REFERENCES: &[Reference] = &[
    Reference {
        field: "id",
        targets: &[RecordKind::BlogPostModel, RecordKind::BlogPostRightsModel],
    },
    Reference {
        field: "author_id",
        targets: &[RecordKind::UserSettingsModel],
    },
];

const RIGHTS_REFERENCES: &[Reference] = &[
    Reference {
        field: "id",
        targets: &[RecordKind::BlogPostModel, RecordKind::BlogPostSummaryModel],
    },
    Reference {
        field: "editor_ids",
        targets: &[RecordKind::UserSettingsModel],
    },
];

pub fn references_of(kind: RecordKind) -> &'static [Reference] {
    match kind {
        RecordKind::BlogPostModel => POST_REFERENCES,
        RecordKind::BlogPostSummaryModel => SUMMARY_REFERENCES,
        RecordKind::BlogPostRightsModel => RIGHTS_REFERENCES,
        RecordKind::UserSettingsModel => &[],
    }
}

/// Kinds that `kind.field` must point at.
pub fn model_kind_references(kind: RecordKind, field: &str) -> Vec<RecordKind> {
    references_of(kind)
        .iter()
        .filter(|r| r.field == field)
        .flat_map(|r| r.targets.iter().copied())
        .collect()
}

/// Every reference of the record must resolve to an existing record.
pub fn relationships(record: &Record, index: &AuditIndex) -> Vec<AuditFinding> {
    let mut findings = Vec::new();

    for reference in references_of(record.kind()) {
        for value in record.field_values(reference.field) {
            for &target in reference.targets {
                if !index.contains(target, value) {
                    findings.push(AuditFinding::new(
                        FindingKind::ModelRelationshipError,
                        record.kind(),
                        record.id(),
                        format!(
                            "{}={} should correspond to the ID of an existing {}, \
                             but that model does not exist",
                            reference.field,
                            quoted(value),
                            target
                        ),
                    ));
                }
            }
        }
    }

    findings
}

/// Posts and summaries must pass domain validation, strictly when published.
pub fn domain_objects(record: &Record, index: &AuditIndex) -> Vec<AuditFinding> {
    let Some(rights) = index.rights(record.id()) else {
        return Vec::new();
    };
    let strict = rights.published;

    let result = match record {
        Record::Post(model) => Post::from(model).validate(strict, &index.limits),
        Record::Summary(model) => PostSummary::from(model).validate(strict, &index.limits),
        Record::Rights(_) => Ok(()),
    };

    match result {
        Ok(()) => Vec::new(),
        Err(e) => vec![AuditFinding::new(
            FindingKind::ModelDomainObjectValidateError,
            record.kind(),
            record.id(),
            format!(
                "Entity fails domain validation ({}) with the error: {}",
                if strict { "strict" } else { "non-strict" },
                e
            ),
        )],
    }
}

/// A titled post's summary must carry the same title.
pub fn title_matches_summary(record: &Record, index: &AuditIndex) -> Vec<AuditFinding> {
    let Record::Post(post) = record else {
        return Vec::new();
    };
    if post.title.is_empty() {
        return Vec::new();
    }

    match index.summary(&post.id) {
        Some(summary) if summary.title != post.title => vec![AuditFinding::new(
            FindingKind::ValidateTitleMatchesSummaryTitleError,
            record.kind(),
            record.id(),
            format!(
                "Title for both blog post and its summary model should be same. \
                 Received: {} and {}.",
                quoted(&post.title),
                quoted(&summary.title)
            ),
        )],
        _ => Vec::new(),
    }
}

/// `published_on` must not precede creation or lie after the job started.
pub fn publish_timestamps(record: &Record, index: &AuditIndex) -> Vec<AuditFinding> {
    let Some((published_on, created_on)) = record.published_on() else {
        return Vec::new();
    };
    let skew = Duration::seconds(MAX_CLOCK_SKEW_SECS);
    let mut findings = Vec::new();

    if created_on > published_on + skew {
        findings.push(AuditFinding::new(
            FindingKind::InconsistentPublishTimestampsError,
            record.kind(),
            record.id(),
            format!(
                "created_on={} is later than published_on={}",
                created_on, published_on
            ),
        ));
    }

    if published_on - skew > index.started_at {
        findings.push(AuditFinding::new(
            FindingKind::ModelMutatedDuringJobError,
            record.kind(),
            record.id(),
            format!(
                "published_on={} is later than the audit start time {}",
                published_on, index.started_at
            ),
        ));
    }

    findings
}

/// Property whose values must be unique across records of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueProperty {
    Title,
    UrlFragment,
}

impl UniqueProperty {
    fn value<'a>(&self, record: &'a Record) -> Option<&'a str> {
        let value = match (self, record) {
            (UniqueProperty::Title, Record::Post(m)) => &m.title,
            (UniqueProperty::Title, Record::Summary(m)) => &m.title,
            (UniqueProperty::UrlFragment, Record::Post(m)) => &m.url_fragment,
            (UniqueProperty::UrlFragment, Record::Summary(m)) => &m.url_fragment,
            (_, Record::Rights(_)) => return None,
        };
        Some(value.as_str()).filter(|v| !v.is_empty())
    }

    fn finding(&self, record: &Record, value: &str) -> AuditFinding {
        let (kind, label) = match self {
            UniqueProperty::Title => (FindingKind::DuplicateBlogTitleError, "title"),
            UniqueProperty::UrlFragment => (FindingKind::DuplicateBlogUrlError, "url"),
        };
        AuditFinding::new(
            kind,
            record.kind(),
            record.id(),
            format!("{}={} is not unique", label, quoted(value)),
        )
    }
}

/// Groups `records` by `property` and reports each duplicate except one
/// canonical record per group, the one with the smallest id. Empty values are
/// exempt.
pub fn duplicates(records: &[&Record], property: UniqueProperty) -> Vec<AuditFinding> {
    let mut groups: BTreeMap<(RecordKind, &str), Vec<&Record>> = BTreeMap::new();
    for &record in records {
        if let Some(value) = property.value(record) {
            groups.entry((record.kind(), value)).or_default().push(record);
        }
    }

    let mut findings = Vec::new();
    for ((_, value), mut group) in groups {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| a.id().cmp(b.id()));
        group.dedup_by(|a, b| a.id() == b.id());
        findings.extend(group.iter().skip(1).map(|r| property.finding(r, value)));
    }

    findings
}
