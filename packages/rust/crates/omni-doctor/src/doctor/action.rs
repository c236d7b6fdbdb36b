use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::headings::{ExtractedTitle, extract_title, shift_heading_levels};
use crate::note::Note;

/// Candidate set used when none is supplied explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultScope {
    /// Every note in the workspace.
    All,
    /// Nothing; the action only runs on explicit candidates.
    None,
}

/// What an action may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Rewrites candidate notes in place.
    RewriteNotes,
    /// Creates new stub notes; candidates are left untouched.
    CreateNotes,
    /// Changes nothing.
    ReadOnly,
}

/// Corrective actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DoctorAction {
    /// Push every heading one level deeper.
    HeadingShift,
    /// Move the shallowest first heading into the title.
    TitleExtract,
    /// Create stubs for link targets that do not exist.
    CreateMissingLinks,
    /// Report link targets that do not exist.
    FindBrokenLinks,
}

/// How the runner executes an action.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ActionPlan {
    /// Per-note rewrite; `None` means unchanged.
    Rewrite(fn(&Note) -> Option<Note>),
    /// Parse and resolve links, then check targets against the store.
    Links {
        /// Materialize missing targets as stubs.
        create_missing: bool,
    },
}

fn heading_shift(note: &Note) -> Option<Note> {
    let body = shift_heading_levels(&note.body)?;
    let mut out = note.clone();
    out.body = body;
    Some(out)
}

fn title_extract(note: &Note) -> Option<Note> {
    let ExtractedTitle { title, body } = extract_title(&note.body)?;
    let mut out = note.clone();
    out.title = title;
    out.body = body;
    Some(out)
}

impl DoctorAction {
    /// Every action, in CLI order.
    pub const ALL: [Self; 4] = [
        Self::HeadingShift,
        Self::TitleExtract,
        Self::CreateMissingLinks,
        Self::FindBrokenLinks,
    ];

    /// Kebab-case identifier.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeadingShift => "heading-shift",
            Self::TitleExtract => "title-extract",
            Self::CreateMissingLinks => "create-missing-links",
            Self::FindBrokenLinks => "find-broken-links",
        }
    }

    /// Candidate set when none is supplied.
    ///
    /// Link creation touches the filesystem beyond the candidates, so it never
    /// defaults to the whole workspace.
    #[must_use]
    pub fn default_scope(self) -> DefaultScope {
        match self {
            Self::HeadingShift | Self::TitleExtract | Self::FindBrokenLinks => DefaultScope::All,
            Self::CreateMissingLinks => DefaultScope::None,
        }
    }

    /// What the action may change.
    #[must_use]
    pub fn side_effect(self) -> SideEffect {
        match self {
            Self::HeadingShift | Self::TitleExtract => SideEffect::RewriteNotes,
            Self::CreateMissingLinks => SideEffect::CreateNotes,
            Self::FindBrokenLinks => SideEffect::ReadOnly,
        }
    }

    pub(crate) fn plan(self) -> ActionPlan {
        match self {
            Self::HeadingShift => ActionPlan::Rewrite(heading_shift),
            Self::TitleExtract => ActionPlan::Rewrite(title_extract),
            Self::CreateMissingLinks => ActionPlan::Links {
                create_missing: true,
            },
            Self::FindBrokenLinks => ActionPlan::Links {
                create_missing: false,
            },
        }
    }
}

impl fmt::Display for DoctorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoctorAction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| format!("unknown doctor action '{raw}'"))
    }
}
