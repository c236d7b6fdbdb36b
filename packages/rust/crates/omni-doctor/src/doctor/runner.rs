use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;

use super::DoctorError;
use super::action::{ActionPlan, DefaultScope, DoctorAction};
use super::report::{DoctorReport, DocumentOutcome, LinkFinding, LinkFindingKind};
use crate::config::DoctorSettings;
use crate::links::{LinkResolver, UnresolvableLink, parse_wikilinks};
use crate::note::{Note, NoteKey, default_title};
use crate::store::{NoteStore, StoreError};
use crate::workspace::Workspace;

/// Parameters of one doctor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorOptions {
    /// Action to run.
    pub action: DoctorAction,
    /// Explicit candidates, in processing order. `None` or empty selects the
    /// action's default scope.
    pub candidates: Option<Vec<NoteKey>>,
    /// Compute outcomes without committing anything.
    pub dry_run: bool,
    /// Cap on the number of candidates processed.
    pub limit: Option<usize>,
}

impl DoctorOptions {
    /// Options for `action` over its default scope, committing changes.
    #[must_use]
    pub fn new(action: DoctorAction) -> Self {
        Self {
            action,
            candidates: None,
            dry_run: false,
            limit: None,
        }
    }

    /// Seed dry-run and limit from configuration.
    #[must_use]
    pub fn from_settings(action: DoctorAction, settings: &DoctorSettings) -> Self {
        Self::new(action)
            .with_dry_run(settings.dry_run)
            .with_limit(settings.limit)
    }

    /// Restrict the run to these notes.
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<NoteKey>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Toggle dry-run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Cap the candidate count.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// A link occurrence after resolution.
struct ScannedLink {
    source: NoteKey,
    target: String,
    line: usize,
    resolved: Result<NoteKey, UnresolvableLink>,
}

/// A distinct target to check against the store.
struct PendingTarget {
    key: NoteKey,
    source: NoteKey,
    target: String,
    line: usize,
}

fn scan_links(resolver: LinkResolver<'_>, note: &Note) -> Vec<ScannedLink> {
    let source = note.key();
    parse_wikilinks(&note.body)
        .map(|link| ScannedLink {
            source: source.clone(),
            target: link.target.to_string(),
            line: link.line,
            resolved: resolver.resolve(&link.target, &note.vault),
        })
        .collect()
}

fn skipped(reason: impl ToString) -> DocumentOutcome {
    DocumentOutcome::Skipped {
        reason: reason.to_string(),
    }
}

/// Runs doctor actions against a workspace through a note store.
///
/// Per-note computation is parallel; every store read used for existence
/// checks and every write happens on the calling thread, in candidate order.
#[derive(Debug)]
pub struct Doctor<'a, S: NoteStore + ?Sized> {
    workspace: &'a Workspace,
    store: &'a S,
}

impl<'a, S: NoteStore + ?Sized> Doctor<'a, S> {
    /// Doctor over `workspace`, reading and writing through `store`.
    #[must_use]
    pub fn new(workspace: &'a Workspace, store: &'a S) -> Self {
        Self { workspace, store }
    }

    /// Run one action.
    ///
    /// # Errors
    ///
    /// Returns [`DoctorError::NoVaults`] for an empty workspace and
    /// [`DoctorError::Store`] when the default candidate set cannot be
    /// listed. Per-note failures are reported as `skipped` outcomes.
    pub fn run(&self, options: &DoctorOptions) -> Result<DoctorReport, DoctorError> {
        if self.workspace.vaults().is_empty() {
            return Err(DoctorError::NoVaults);
        }
        let mut report = DoctorReport::new(options.action, options.dry_run);
        let candidates = self.resolve_candidates(options, &mut report)?;
        info!(
            "doctor {}: {} candidate(s){}",
            options.action,
            candidates.len(),
            if options.dry_run { " (dry run)" } else { "" }
        );

        match options.action.plan() {
            ActionPlan::Rewrite(transform) => {
                self.run_rewrite(transform, &candidates, options.dry_run, &mut report);
            }
            ActionPlan::Links { create_missing } => {
                self.run_links(create_missing, &candidates, options.dry_run, &mut report);
            }
        }

        let report = report.finish();
        info!(
            "doctor {}: created={} modified={} skipped={}",
            options.action, report.created_count, report.modified_count, report.skipped_count
        );
        Ok(report)
    }

    fn resolve_candidates(
        &self,
        options: &DoctorOptions,
        report: &mut DoctorReport,
    ) -> Result<Vec<Note>, DoctorError> {
        let explicit = options
            .candidates
            .as_ref()
            .filter(|candidates| !candidates.is_empty());

        let mut notes = match explicit {
            Some(keys) => self.load_explicit(keys, report),
            None => match options.action.default_scope() {
                DefaultScope::All => self
                    .store
                    .list_notes(None)?
                    .into_iter()
                    .filter(|note| self.workspace.has_vault(&note.vault))
                    .collect(),
                DefaultScope::None => {
                    info!(
                        "doctor {}: no explicit candidates and no workspace default; nothing to do",
                        options.action
                    );
                    Vec::new()
                }
            },
        };
        if let Some(limit) = options.limit {
            notes.truncate(limit);
        }
        Ok(notes)
    }

    fn load_explicit(&self, keys: &[NoteKey], report: &mut DoctorReport) -> Vec<Note> {
        let mut seen: HashSet<&NoteKey> = HashSet::new();
        let mut notes = Vec::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            match self.store.get_note(key) {
                Ok(Some(note)) => notes.push(note),
                Ok(None) => {
                    let err = DoctorError::InvalidCandidate(key.clone());
                    warn!("{err}");
                    report.record(key.clone(), skipped(err));
                }
                Err(err) => {
                    warn!("failed to load candidate {key}: {err}");
                    report.record(key.clone(), skipped(err));
                }
            }
        }
        notes
    }

    fn run_rewrite(
        &self,
        transform: fn(&Note) -> Option<Note>,
        candidates: &[Note],
        dry_run: bool,
        report: &mut DoctorReport,
    ) {
        let planned: Vec<(NoteKey, Option<Note>)> = candidates
            .par_iter()
            .map(|note| (note.key(), transform(note)))
            .collect();

        for (key, rewritten) in planned {
            let Some(mut note) = rewritten else {
                debug!("{key}: unchanged");
                report.record(key, DocumentOutcome::Unchanged);
                continue;
            };
            let outcome = DocumentOutcome::Modified {
                title: note.title.clone(),
                body: note.body.clone(),
            };
            if dry_run {
                debug!("{key}: would modify");
                report.record(key, outcome);
                continue;
            }
            note.touch();
            match self.store.persist(&note) {
                Ok(()) => {
                    debug!("{key}: modified");
                    report.record(key, outcome);
                }
                Err(source) => {
                    let err = DoctorError::Persistence {
                        key: key.clone(),
                        source,
                    };
                    warn!("{err}");
                    report.record(key, skipped(err));
                }
            }
        }
    }

    fn run_links(
        &self,
        create_missing: bool,
        candidates: &[Note],
        dry_run: bool,
        report: &mut DoctorReport,
    ) {
        let resolver = LinkResolver::new(self.workspace);
        let scanned: Vec<(NoteKey, Vec<ScannedLink>)> = candidates
            .par_iter()
            .map(|note| (note.key(), scan_links(resolver, note)))
            .collect();

        // Creation dedups per target across the whole run; reporting dedups
        // per (source, target) so every linking note shows up.
        let mut seen: HashSet<(Option<NoteKey>, NoteKey)> = HashSet::new();
        let mut pending: Vec<PendingTarget> = Vec::new();
        for (source, links) in scanned {
            report.record(source, DocumentOutcome::Unchanged);
            for link in links {
                match link.resolved {
                    Ok(key) => {
                        let dedup_source = (!create_missing).then(|| link.source.clone());
                        if seen.insert((dedup_source, key.clone())) {
                            pending.push(PendingTarget {
                                key,
                                source: link.source,
                                target: link.target,
                                line: link.line,
                            });
                        } else {
                            debug!("{}: duplicate target {key} collapsed", link.source);
                        }
                    }
                    Err(err) => {
                        warn!("{}:{}: {err}", link.source, link.line);
                        report.links.push(LinkFinding {
                            source: link.source,
                            target: link.target,
                            resolved: None,
                            line: link.line,
                            kind: LinkFindingKind::Unresolved,
                        });
                    }
                }
            }
        }

        for target in pending {
            match self.store.exists(&target.key) {
                Ok(true) => debug!("{}: target exists", target.key),
                Ok(false) if !create_missing => {
                    report.links.push(LinkFinding {
                        source: target.source,
                        target: target.target,
                        resolved: Some(target.key),
                        line: target.line,
                        kind: LinkFindingKind::Missing,
                    });
                }
                Ok(false) => self.create_stub(target.key, dry_run, report),
                Err(err) => {
                    warn!("{}: existence check failed: {err}", target.key);
                    report.record(target.key, skipped(err));
                }
            }
        }
    }

    fn create_stub(&self, key: NoteKey, dry_run: bool, report: &mut DoctorReport) {
        if dry_run {
            debug!("{key}: would create stub");
            let title = default_title(&key.name);
            report.record(key, DocumentOutcome::Created { title });
            return;
        }
        match self.store.create_stub(&key) {
            Ok(note) => {
                info!("{key}: created stub");
                report.record(key, DocumentOutcome::Created { title: note.title });
            }
            Err(StoreError::AlreadyExists(_)) => {
                debug!("{key}: appeared before creation; left as is");
            }
            Err(source) => {
                let err = DoctorError::Persistence {
                    key: key.clone(),
                    source,
                };
                warn!("{err}");
                report.record(key, skipped(err));
            }
        }
    }
}
