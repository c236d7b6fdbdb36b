//! omni-doctor - corrective actions for hierarchical markdown note vaults.
//!
//! Module layout (by domain):
//! - `workspace` / `config`: Vaults, workspace root, `workspace.yaml` loading
//! - `note`: Note model, default titles, frontmatter codec
//! - `store`: `NoteStore` seam plus file-backed and in-memory engines
//! - `links`: Wikilink parsing and vault-aware target resolution
//! - `headings`: Heading-level shift and title extraction transforms
//! - `fence`: Fenced code block tracking shared by `links` and `headings`
//! - `doctor`: Action registry, candidate resolution, runner, report
//!
//! # Examples
//!
//! ```rust
//! use omni_doctor::{
//!     Doctor, DoctorAction, DoctorOptions, MemoryNoteStore, NoteKey, Vault, Workspace,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let workspace = Workspace::new("/notes", vec![Vault::new("vault", "vault")])?;
//! let store = MemoryNoteStore::new();
//! store.insert_note("vault", "foo", "[[foo.bar]]\n", None);
//!
//! let options = DoctorOptions::new(DoctorAction::CreateMissingLinks)
//!     .with_candidates(vec![NoteKey::new("vault", "foo")]);
//! let report = Doctor::new(&workspace, &store).run(&options)?;
//! assert_eq!(report.created_count, 1);
//! # Ok(())
//! # }
//! ```

// ---------------------------------------------------------------------------
// Core domain modules
// ---------------------------------------------------------------------------
pub mod config;
pub mod doctor;
pub mod headings;
pub mod links;
pub mod note;
pub mod store;
pub mod workspace;

mod fence;

// ---------------------------------------------------------------------------
// Public re-exports (crate API)
// ---------------------------------------------------------------------------
pub use config::{
    ConfigError, DOCTOR_CONFIG_ENV, DoctorSettings, WORKSPACE_CONFIG_FILE, WorkspaceConfig,
    load_workspace_config,
};
pub use doctor::{
    DefaultScope, Doctor, DoctorAction, DoctorError, DoctorOptions, DoctorReport,
    DocumentOutcome, LinkFinding, LinkFindingKind, SideEffect,
};
pub use headings::{ExtractedTitle, extract_title, shift_heading_levels};
pub use links::{
    LinkResolver, LinkTarget, UnresolvableLink, VAULT_SCHEME, WikiLink, WikiLinks,
    parse_link_target, parse_wikilinks,
};
pub use note::{Note, NoteKey, default_title};
pub use store::{FsNoteStore, MemoryNoteStore, NoteStore, StoreError};
pub use workspace::{Vault, Workspace};
