use serde::Serialize;
use std::collections::BTreeMap;

use super::action::DoctorAction;
use crate::note::NoteKey;

/// What happened (or, in a dry run, would happen) to one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Rewritten with this title and body.
    Modified {
        /// Resulting title.
        title: String,
        /// Resulting body.
        body: String,
    },
    /// Looked at, nothing to change.
    Unchanged,
    /// Materialized as a stub.
    Created {
        /// Stub title.
        title: String,
    },
    /// Not processed.
    Skipped {
        /// Why.
        reason: String,
    },
}

/// Kind of link problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkFindingKind {
    /// The vault selector names an unknown vault.
    Unresolved,
    /// The target note does not exist.
    Missing,
}

/// Link problem found in a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkFinding {
    /// Note containing the link.
    pub source: NoteKey,
    /// Target as written.
    pub target: String,
    /// Resolved target, when resolution succeeded.
    pub resolved: Option<NoteKey>,
    /// 1-based line in the source body.
    pub line: usize,
    /// Problem kind.
    pub kind: LinkFindingKind,
}

/// Aggregate result of one doctor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    /// Action that ran.
    pub action: DoctorAction,
    /// Whether commits were skipped.
    pub dry_run: bool,
    /// Outcome per note.
    pub outcomes: BTreeMap<NoteKey, DocumentOutcome>,
    /// Unresolvable and missing link targets.
    pub links: Vec<LinkFinding>,
    /// Number of `created` outcomes.
    pub created_count: usize,
    /// Number of `modified` outcomes.
    pub modified_count: usize,
    /// Number of `skipped` outcomes.
    pub skipped_count: usize,
}

impl DoctorReport {
    pub(crate) fn new(action: DoctorAction, dry_run: bool) -> Self {
        Self {
            action,
            dry_run,
            outcomes: BTreeMap::new(),
            links: Vec::new(),
            created_count: 0,
            modified_count: 0,
            skipped_count: 0,
        }
    }

    pub(crate) fn record(&mut self, key: NoteKey, outcome: DocumentOutcome) {
        self.outcomes.insert(key, outcome);
    }

    pub(crate) fn finish(mut self) -> Self {
        let mut created = 0;
        let mut modified = 0;
        let mut skipped = 0;
        for outcome in self.outcomes.values() {
            match outcome {
                DocumentOutcome::Created { .. } => created += 1,
                DocumentOutcome::Modified { .. } => modified += 1,
                DocumentOutcome::Skipped { .. } => skipped += 1,
                DocumentOutcome::Unchanged => {}
            }
        }
        self.created_count = created;
        self.modified_count = modified;
        self.skipped_count = skipped;
        self
    }

    /// Outcome for one note.
    #[must_use]
    pub fn outcome(&self, key: &NoteKey) -> Option<&DocumentOutcome> {
        self.outcomes.get(key)
    }

    /// Keys with a `created` outcome, in key order.
    #[must_use]
    pub fn created(&self) -> Vec<&NoteKey> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DocumentOutcome::Created { .. }))
            .map(|(key, _)| key)
            .collect()
    }

    /// Keys with a `skipped` outcome, in key order; feed these back as
    /// candidates to retry.
    #[must_use]
    pub fn skipped(&self) -> Vec<&NoteKey> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DocumentOutcome::Skipped { .. }))
            .map(|(key, _)| key)
            .collect()
    }
}
