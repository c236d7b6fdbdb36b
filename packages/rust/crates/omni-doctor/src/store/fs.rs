use log::{debug, warn};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{NoteStore, StoreError, validate_name};
use crate::note::{Note, NoteKey, default_title, parse_note_file, render_note_file};
use crate::workspace::{Vault, Workspace};

const NOTE_EXTENSION: &str = "md";

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `content` into a file this call just created. On failure the file
/// is removed so a half-written note never counts as existing.
fn fill_new_file<W: Write>(path: &Path, mut file: W, content: &[u8]) -> Result<(), StoreError> {
    let written = file.write_all(content).and_then(|()| file.flush());
    drop(file);
    if let Err(err) = written {
        if let Err(remove_err) = std::fs::remove_file(path) {
            warn!("failed to remove partial note {}: {remove_err}", path.display());
        }
        return Err(io_error(path, err));
    }
    Ok(())
}

/// File-backed notes: `<root>/<vault fs_path>/<name>.md`.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    workspace: Workspace,
}

impl FsNoteStore {
    /// Store over the vaults of `workspace`.
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Workspace backing this store.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn vault(&self, name: &str) -> Result<&Vault, StoreError> {
        self.workspace
            .vault(name)
            .ok_or_else(|| StoreError::UnknownVault(name.to_string()))
    }

    /// File path of a note.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for unknown vaults and unusable names.
    pub fn note_path(&self, vault: &str, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        let vault = self.vault(vault)?;
        Ok(self
            .workspace
            .vault_dir(vault)
            .join(format!("{name}.{NOTE_EXTENSION}")))
    }

    fn read_note(vault: &str, name: &str, path: &Path) -> Result<Note, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        parse_note_file(vault, name, &content).map_err(|source| StoreError::Frontmatter {
            path: path.to_path_buf(),
            source,
        })
    }

    fn ensure_parent(path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        Ok(())
    }

    fn list_vault(&self, vault: &Vault) -> Vec<Note> {
        let dir = self.workspace.vault_dir(vault);
        if !dir.is_dir() {
            debug!("vault '{}' has no directory at {}", vault.name, dir.display());
            return Vec::new();
        }
        let mut notes = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry in {}: {err}", dir.display());
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let is_note = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION));
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_note || name.starts_with('.') {
                continue;
            }
            match Self::read_note(&vault.name, name, path) {
                Ok(note) => notes.push(note),
                Err(err) => warn!("skipping note {}: {err}", path.display()),
            }
        }
        notes
    }
}

impl NoteStore for FsNoteStore {
    fn get_note_by_path(
        &self,
        vault: &str,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Option<Note>, StoreError> {
        let path = self.note_path(vault, name)?;
        if path.is_file() {
            return Self::read_note(vault, name, &path).map(Some);
        }
        if create_if_missing {
            return self
                .create_note(vault, name, "", &default_title(name))
                .map(Some);
        }
        Ok(None)
    }

    fn list_notes(&self, vault: Option<&str>) -> Result<Vec<Note>, StoreError> {
        match vault {
            Some(name) => Ok(self.list_vault(self.vault(name)?)),
            None => Ok(self
                .workspace
                .vaults()
                .iter()
                .flat_map(|vault| self.list_vault(vault))
                .collect()),
        }
    }

    fn create_note(
        &self,
        vault: &str,
        name: &str,
        body: &str,
        title: &str,
    ) -> Result<Note, StoreError> {
        let path = self.note_path(vault, name)?;
        let note = Note::new(vault, name).with_body(body).with_title(title);
        let content = render_note_file(&note).map_err(|source| StoreError::Frontmatter {
            path: path.clone(),
            source,
        })?;
        Self::ensure_parent(&path)?;
        // create_new makes check-then-create a single filesystem step.
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| {
                if err.kind() == ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists(NoteKey::new(vault, name))
                } else {
                    io_error(&path, err)
                }
            })?;
        fill_new_file(&path, file, content.as_bytes())?;
        debug!("created note {}", path.display());
        Ok(note)
    }

    fn persist(&self, note: &Note) -> Result<(), StoreError> {
        let path = self.note_path(&note.vault, &note.name)?;
        let content = render_note_file(note).map_err(|source| StoreError::Frontmatter {
            path: path.clone(),
            source,
        })?;
        Self::ensure_parent(&path)?;
        let tmp = path.with_file_name(format!(".{}.{NOTE_EXTENSION}.tmp", note.name));
        std::fs::write(&tmp, content).map_err(|e| io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;
        debug!("persisted note {}", path.display());
        Ok(())
    }
}
