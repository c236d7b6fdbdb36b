//! Note model: identity, default titles, frontmatter codec.

pub mod frontmatter;

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_yaml::Mapping;
use std::fmt;

pub use frontmatter::{FrontmatterError, parse_note_file, render_note_file};

/// Fully-qualified note identity: `(vault, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteKey {
    /// Owning vault name.
    pub vault: String,
    /// Dot-delimited hierarchical name, e.g. `foo.bar`.
    pub name: String,
}

impl NoteKey {
    /// Create a key.
    #[must_use]
    pub fn new(vault: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            vault: vault.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vault, self.name)
    }
}

// Rendered as `vault/name` so keys work as JSON object keys.
impl Serialize for NoteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A markdown note belonging to exactly one vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// Stable note id (frontmatter `id`).
    pub id: String,
    /// Owning vault name.
    pub vault: String,
    /// Hierarchical name, unique within the vault.
    pub name: String,
    /// Title attribute.
    pub title: String,
    /// Short description.
    pub desc: String,
    /// Markdown body without frontmatter.
    pub body: String,
    /// Creation time, epoch milliseconds.
    pub created: i64,
    /// Last update time, epoch milliseconds.
    pub updated: i64,
    /// Frontmatter keys this crate does not interpret.
    #[serde(skip)]
    pub extra: Mapping,
}

impl Note {
    /// New note with default title, empty body and a fresh id.
    #[must_use]
    pub fn new(vault: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vault: vault.into(),
            title: default_title(&name),
            name,
            desc: String::new(),
            body: String::new(),
            created: now,
            updated: now,
            extra: Mapping::new(),
        }
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Identity of this note.
    #[must_use]
    pub fn key(&self) -> NoteKey {
        NoteKey::new(self.vault.clone(), self.name.clone())
    }

    /// Bump `updated` to now.
    pub fn touch(&mut self) {
        self.updated = Utc::now().timestamp_millis();
    }
}

/// Title for a note that has none: the last name segment, capitalized.
///
/// `foo.bar` becomes `Bar`, `fake.LINK` becomes `Link`.
#[must_use]
pub fn default_title(name: &str) -> String {
    let leaf = name.rsplit('.').next().unwrap_or(name).trim();
    let mut chars = leaf.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
