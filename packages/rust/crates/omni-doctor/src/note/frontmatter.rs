use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;
use thiserror::Error;

use super::{Note, default_title};

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

static FRONTMATTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)")
});

/// Frontmatter decoding errors.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// The block is not valid YAML.
    #[error("invalid frontmatter yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The block parsed, but not to a mapping.
    #[error("frontmatter must be a mapping")]
    NotAMapping,
}

fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(caps) = FRONTMATTER_REGEX.captures(content) else {
        return (None, content);
    };
    let body = caps.get(0).map_or(content, |m| &content[m.end()..]);
    (caps.get(1).map(|m| m.as_str()), body)
}

fn take_string(map: &mut Mapping, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(raw) => Some(raw),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn take_millis(map: &mut Mapping, key: &str) -> Option<i64> {
    match map.remove(key)? {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Decode a note file (`---` YAML frontmatter + markdown body).
///
/// Missing fields fall back to note defaults: a fresh id, a title derived
/// from `name`, and "now" timestamps. Unknown keys are preserved in
/// [`Note::extra`].
///
/// # Errors
///
/// Returns [`FrontmatterError`] when the frontmatter block is not a YAML
/// mapping.
pub fn parse_note_file(vault: &str, name: &str, content: &str) -> Result<Note, FrontmatterError> {
    let (raw_frontmatter, body) = split_frontmatter(content);
    let mut note = Note::new(vault, name).with_body(body);
    let Some(raw) = raw_frontmatter else {
        return Ok(note);
    };

    let mut map = match serde_yaml::from_str::<Value>(raw)? {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => return Err(FrontmatterError::NotAMapping),
    };

    if let Some(id) = take_string(&mut map, "id").filter(|id| !id.trim().is_empty()) {
        note.id = id;
    }
    note.title = take_string(&mut map, "title").unwrap_or_else(|| default_title(name));
    note.desc = take_string(&mut map, "desc").unwrap_or_default();
    if let Some(created) = take_millis(&mut map, "created") {
        note.created = created;
    }
    if let Some(updated) = take_millis(&mut map, "updated") {
        note.updated = updated;
    }
    note.extra = map;
    Ok(note)
}

/// Encode a note as frontmatter + body.
///
/// # Errors
///
/// Returns [`FrontmatterError::Yaml`] if the frontmatter cannot be serialized.
pub fn render_note_file(note: &Note) -> Result<String, FrontmatterError> {
    let mut map = Mapping::new();
    map.insert("id".into(), Value::String(note.id.clone()));
    map.insert("title".into(), Value::String(note.title.clone()));
    map.insert("desc".into(), Value::String(note.desc.clone()));
    map.insert("updated".into(), Value::Number(note.updated.into()));
    map.insert("created".into(), Value::Number(note.created.into()));
    for (key, value) in &note.extra {
        if !map.contains_key(key) {
            map.insert(key.clone(), value.clone());
        }
    }
    let yaml = serde_yaml::to_string(&Value::Mapping(map))?;
    Ok(format!("---\n{yaml}---\n{}", note.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_frontmatter_uses_defaults() -> Result<(), FrontmatterError> {
        let note = parse_note_file("vault", "foo.bar", "# Heading\nbody\n")?;
        assert_eq!(note.title, "Bar");
        assert_eq!(note.body, "# Heading\nbody\n");
        Ok(())
    }

    #[test]
    fn test_parse_reads_known_fields_and_keeps_extra() -> Result<(), FrontmatterError> {
        let content = "---\nid: abc\ntitle: Foo Title\ndesc: ''\nupdated: 20\ncreated: 10\ntags: [a]\n---\n[[foo.bar]]\n";
        let note = parse_note_file("vault", "foo", content)?;
        assert_eq!(note.id, "abc");
        assert_eq!(note.title, "Foo Title");
        assert_eq!(note.created, 10);
        assert_eq!(note.updated, 20);
        assert_eq!(note.body, "[[foo.bar]]\n");
        assert!(note.extra.contains_key("tags"));
        Ok(())
    }

    #[test]
    fn test_render_then_parse_preserves_note() -> Result<(), FrontmatterError> {
        let mut note = Note::new("vault", "foo").with_body("## Foo Content\n");
        note.extra.insert("stub".into(), Value::Bool(true));
        let rendered = render_note_file(&note)?;
        assert!(rendered.starts_with("---\n"));
        let parsed = parse_note_file("vault", "foo", &rendered)?;
        assert_eq!(parsed, note);
        Ok(())
    }

    #[test]
    fn test_scalar_frontmatter_is_rejected() {
        let result = parse_note_file("vault", "foo", "---\njust text\n---\nbody");
        assert!(matches!(result, Err(FrontmatterError::NotAMapping)));
    }
}
