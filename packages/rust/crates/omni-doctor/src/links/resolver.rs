use thiserror::Error;

use super::parser::LinkTarget;
use crate::note::NoteKey;
use crate::workspace::Workspace;

/// A vault selector names a vault the workspace does not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("link '{target}' selects unknown vault '{vault}'")]
pub struct UnresolvableLink {
    /// Target as written.
    pub target: String,
    /// Unknown vault name.
    pub vault: String,
}

/// Maps link targets onto fully-qualified note keys.
///
/// Resolution is pure: the same target and home vault always produce the
/// same key, and nothing is looked up in the note store.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'a> {
    workspace: &'a Workspace,
}

impl<'a> LinkResolver<'a> {
    /// Resolver over the vaults of `workspace`.
    #[must_use]
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Resolve `target` as seen from a note in `home_vault`.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvableLink`] when an explicit vault selector names a
    /// vault outside the workspace.
    pub fn resolve(
        &self,
        target: &LinkTarget,
        home_vault: &str,
    ) -> Result<NoteKey, UnresolvableLink> {
        match target {
            LinkTarget::Unqualified { name } => Ok(NoteKey::new(home_vault, name.clone())),
            LinkTarget::Qualified { vault, name } => {
                if self.workspace.has_vault(vault) {
                    Ok(NoteKey::new(vault.clone(), name.clone()))
                } else {
                    Err(UnresolvableLink {
                        target: target.to_string(),
                        vault: vault.clone(),
                    })
                }
            }
        }
    }
}
