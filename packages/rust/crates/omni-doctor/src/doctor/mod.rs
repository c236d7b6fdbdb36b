//! Doctor: corrective actions over a candidate set of notes.
//!
//! Modular design:
//! - `mod.rs`: `DoctorError`
//! - `action.rs`: Closed action set with per-action transform and default scope
//! - `runner.rs`: Candidate resolution, parallel compute, serialized commits
//! - `report.rs`: Per-note outcomes and link findings

mod action;
mod report;
mod runner;

use thiserror::Error;

use crate::links::UnresolvableLink;
use crate::note::NoteKey;
use crate::store::StoreError;

pub use action::{DefaultScope, DoctorAction, SideEffect};
pub use report::{DoctorReport, DocumentOutcome, LinkFinding, LinkFindingKind};
pub use runner::{Doctor, DoctorOptions};

/// Doctor errors.
///
/// Only [`DoctorError::NoVaults`] and [`DoctorError::Store`] abort a run; the
/// rest are folded into the report.
#[derive(Debug, Error)]
pub enum DoctorError {
    /// The workspace has no vaults at all.
    #[error("workspace has no vaults configured")]
    NoVaults,
    /// An explicit candidate is not an existing note.
    #[error("candidate {0} does not exist")]
    InvalidCandidate(NoteKey),
    /// A link selects a vault outside the workspace.
    #[error(transparent)]
    UnresolvableLink(#[from] UnresolvableLink),
    /// The note store failed to write one note.
    #[error("failed to write {key}: {source}")]
    Persistence {
        /// Note being written.
        key: NoteKey,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The note store failed while listing the workspace.
    #[error("note store failure: {0}")]
    Store(#[from] StoreError),
}
