//! Read-only consistency audits over a snapshot of the blog tables.
//!
//! Findings are data, not errors: every record is checked even when others
//! fail, and a run over a fixed snapshot always yields the same findings.

mod findings;
mod rules;
mod runner;

pub use findings::{AuditFinding, FindingKind, RecordKind};
pub use rules::{model_kind_references, Record, Reference, UniqueProperty, MAX_CLOCK_SKEW_SECS};
pub use runner::{Audit, AuditReport, AuditRunner, Registration, REGISTRY};
