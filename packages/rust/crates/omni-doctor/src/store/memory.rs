use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use super::{NoteStore, StoreError, read_lock, validate_name, write_lock};
use crate::note::{Note, NoteKey, default_title};

/// In-memory note store.
///
/// Any vault name is accepted. Writes to keys registered with
/// [`MemoryNoteStore::reject_writes_for`] fail with
/// [`StoreError::WriteRejected`].
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: RwLock<BTreeMap<NoteKey, Note>>,
    rejected_writes: RwLock<HashSet<NoteKey>>,
}

impl MemoryNoteStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a note directly, bypassing write rejection.
    pub fn insert_note(&self, vault: &str, name: &str, body: &str, title: Option<&str>) -> Note {
        let note = Note::new(vault, name)
            .with_body(body)
            .with_title(title.map_or_else(|| default_title(name), str::to_string));
        write_lock(&self.notes).insert(note.key(), note.clone());
        note
    }

    /// Make every later write to `key` fail.
    pub fn reject_writes_for(&self, key: NoteKey) {
        write_lock(&self.rejected_writes).insert(key);
    }

    /// Snapshot of one note.
    #[must_use]
    pub fn note(&self, vault: &str, name: &str) -> Option<Note> {
        read_lock(&self.notes)
            .get(&NoteKey::new(vault, name))
            .cloned()
    }

    /// Number of stored notes.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.notes).len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.notes).is_empty()
    }

    fn check_writable(&self, key: &NoteKey) -> Result<(), StoreError> {
        validate_name(&key.name)?;
        if read_lock(&self.rejected_writes).contains(key) {
            return Err(StoreError::WriteRejected(key.clone()));
        }
        Ok(())
    }
}

impl NoteStore for MemoryNoteStore {
    fn get_note_by_path(
        &self,
        vault: &str,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Option<Note>, StoreError> {
        if let Some(note) = self.note(vault, name) {
            return Ok(Some(note));
        }
        if create_if_missing {
            return self
                .create_note(vault, name, "", &default_title(name))
                .map(Some);
        }
        Ok(None)
    }

    fn list_notes(&self, vault: Option<&str>) -> Result<Vec<Note>, StoreError> {
        Ok(read_lock(&self.notes)
            .values()
            .filter(|note| vault.is_none_or(|vault| note.vault == vault))
            .cloned()
            .collect())
    }

    fn create_note(
        &self,
        vault: &str,
        name: &str,
        body: &str,
        title: &str,
    ) -> Result<Note, StoreError> {
        let key = NoteKey::new(vault, name);
        self.check_writable(&key)?;
        let mut notes = write_lock(&self.notes);
        if notes.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        let note = Note::new(vault, name).with_body(body).with_title(title);
        notes.insert(key, note.clone());
        Ok(note)
    }

    fn persist(&self, note: &Note) -> Result<(), StoreError> {
        let key = note.key();
        self.check_writable(&key)?;
        write_lock(&self.notes).insert(key, note.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_guarded() {
        let store = MemoryNoteStore::new();
        store.insert_note("v", "foo", "", None);
        assert!(matches!(
            store.create_note("v", "foo", "", "Foo"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejected_writes_fail() {
        let store = MemoryNoteStore::new();
        let note = store.insert_note("v", "foo", "# Foo", None);
        store.reject_writes_for(note.key());
        assert!(matches!(
            store.persist(&note),
            Err(StoreError::WriteRejected(_))
        ));
    }

    #[test]
    fn test_list_filters_by_vault() -> Result<(), StoreError> {
        let store = MemoryNoteStore::new();
        store.insert_note("v1", "a", "", None);
        store.insert_note("v2", "b", "", Some("Bee"));
        assert_eq!(store.list_notes(None)?.len(), 2);
        let v2 = store.list_notes(Some("v2"))?;
        assert_eq!(v2.len(), 1);
        assert_eq!(v2[0].title, "Bee");
        Ok(())
    }
}
