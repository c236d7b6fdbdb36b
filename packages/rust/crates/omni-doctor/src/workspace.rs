//! Vaults and the workspace that groups them.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// A named root collection of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vault {
    /// Unique vault name inside the workspace.
    pub name: String,
    /// Vault directory, relative to the workspace root.
    pub fs_path: PathBuf,
}

impl Vault {
    /// Create a vault entry.
    #[must_use]
    pub fn new(name: impl Into<String>, fs_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            fs_path: fs_path.into(),
        }
    }
}

/// Ordered, uniquely named set of vaults under one root directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    vaults: Vec<Vault>,
}

impl Workspace {
    /// Build a workspace, rejecting duplicate vault names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateVault`] when two vaults share a name.
    pub fn new(root: impl Into<PathBuf>, vaults: Vec<Vault>) -> Result<Self, ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for vault in &vaults {
            if !seen.insert(vault.name.as_str()) {
                return Err(ConfigError::DuplicateVault(vault.name.clone()));
            }
        }
        Ok(Self {
            root: root.into(),
            vaults,
        })
    }

    /// Workspace root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vaults in configuration order.
    #[must_use]
    pub fn vaults(&self) -> &[Vault] {
        &self.vaults
    }

    /// Look up a vault by exact name.
    #[must_use]
    pub fn vault(&self, name: &str) -> Option<&Vault> {
        self.vaults.iter().find(|vault| vault.name == name)
    }

    /// Whether the workspace has a vault with this name.
    #[must_use]
    pub fn has_vault(&self, name: &str) -> bool {
        self.vault(name).is_some()
    }

    /// Absolute directory of a vault.
    #[must_use]
    pub fn vault_dir(&self, vault: &Vault) -> PathBuf {
        if vault.fs_path.is_absolute() {
            vault.fs_path.clone()
        } else {
            self.root.join(&vault.fs_path)
        }
    }
}
