//! Note engine seam.
//!
//! - `mod.rs`: `NoteStore` trait, `StoreError`, lock helpers
//! - `fs.rs`: One markdown file per note under each vault directory
//! - `memory.rs`: `RwLock`-guarded map for previews and tests

mod fs;
mod memory;

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::note::{FrontmatterError, Note, NoteKey, default_title};

pub use fs::FsNoteStore;
pub use memory::MemoryNoteStore;

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Note engine errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The vault is not part of the workspace.
    #[error("unknown vault: {0}")]
    UnknownVault(String),
    /// Creation refused because the note exists.
    #[error("note already exists: {0}")]
    AlreadyExists(NoteKey),
    /// The name cannot be mapped onto a note file.
    #[error("invalid note name: {0:?}")]
    InvalidName(String),
    /// Filesystem failure.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A note file has an unreadable frontmatter block.
    #[error("failed to decode '{path}': {source}")]
    Frontmatter {
        /// Offending path.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: FrontmatterError,
    },
    /// The store refused the write.
    #[error("write rejected for {0}")]
    WriteRejected(NoteKey),
}

/// Storage and retrieval of notes, shared across worker threads.
///
/// Implementations do not deduplicate creations on behalf of callers beyond
/// refusing to overwrite an existing note.
pub trait NoteStore: Send + Sync {
    /// Look up a note by vault and name, optionally creating an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on unknown vaults or unreadable notes.
    fn get_note_by_path(
        &self,
        vault: &str,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Option<Note>, StoreError>;

    /// All notes, or the notes of one vault, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a vault cannot be listed.
    fn list_notes(&self, vault: Option<&str>) -> Result<Vec<Note>, StoreError>;

    /// Create a new note.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the note exists, or another
    /// [`StoreError`] when the write fails.
    fn create_note(
        &self,
        vault: &str,
        name: &str,
        body: &str,
        title: &str,
    ) -> Result<Note, StoreError>;

    /// Write a note back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn persist(&self, note: &Note) -> Result<(), StoreError>;

    /// Look up a note by key without creating it.
    ///
    /// # Errors
    ///
    /// See [`NoteStore::get_note_by_path`].
    fn get_note(&self, key: &NoteKey) -> Result<Option<Note>, StoreError> {
        self.get_note_by_path(&key.vault, &key.name, false)
    }

    /// Whether a note exists.
    ///
    /// # Errors
    ///
    /// See [`NoteStore::get_note_by_path`].
    fn exists(&self, key: &NoteKey) -> Result<bool, StoreError> {
        Ok(self.get_note(key)?.is_some())
    }

    /// Create an empty note with the default title.
    ///
    /// # Errors
    ///
    /// See [`NoteStore::create_note`].
    fn create_stub(&self, key: &NoteKey) -> Result<Note, StoreError> {
        self.create_note(&key.vault, &key.name, "", &default_title(&key.name))
    }
}

/// Reject names that would escape the vault directory.
pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
