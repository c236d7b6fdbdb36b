//! Heading-level transforms over note bodies.
//!
//! Only ATX headings (`#` through `######`, followed by whitespace) outside
//! fenced code blocks are recognized. Line endings are preserved.

use crate::fence::FenceTracker;

const MAX_HEADING_LEVEL: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadingLine {
    level: usize,
    /// Byte offset of the first `#`.
    marker_start: usize,
    text: String,
}

/// Title pulled out of a body by [`extract_title`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTitle {
    /// Heading text, whitespace-normalized.
    pub title: String,
    /// Body with the heading line removed.
    pub body: String,
}

fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_closing_sequence(text: &str) -> &str {
    let trimmed = text.trim();
    let stripped = trimmed.trim_end_matches('#');
    if stripped.len() == trimmed.len() {
        return trimmed;
    }
    if stripped.is_empty() || stripped.ends_with([' ', '\t']) {
        stripped
    } else {
        trimmed
    }
}

fn parse_markdown_heading(line: &str) -> Option<HeadingLine> {
    let content = line.trim_end_matches(['\n', '\r']);
    let marker_start = content.len() - content.trim_start_matches(' ').len();
    if marker_start > 3 {
        return None;
    }
    let rest = &content[marker_start..];
    let level = rest.bytes().take_while(|byte| *byte == b'#').count();
    if level == 0 || level > MAX_HEADING_LEVEL {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    let text = normalize_whitespace(strip_closing_sequence(after));
    if text.is_empty() {
        return None;
    }
    Some(HeadingLine {
        level,
        marker_start,
        text,
    })
}

/// Split `body` into lines (with endings) paired with their parsed heading.
fn scan(body: &str) -> Vec<(&str, Option<HeadingLine>)> {
    let mut fences = FenceTracker::default();
    body.split_inclusive('\n')
        .map(|line| {
            if fences.is_code(line) {
                return (line, None);
            }
            (line, parse_markdown_heading(line))
        })
        .collect()
}

/// Push every heading one level deeper (`#` becomes `##`).
///
/// Level-6 headings stay at level 6. Returns `None` when nothing changes.
#[must_use]
pub fn shift_heading_levels(body: &str) -> Option<String> {
    let mut changed = false;
    let mut out = String::with_capacity(body.len() + 16);
    for (line, heading) in scan(body) {
        match heading {
            Some(heading) if heading.level < MAX_HEADING_LEVEL => {
                out.push_str(&line[..heading.marker_start]);
                out.push('#');
                out.push_str(&line[heading.marker_start..]);
                changed = true;
            }
            _ => out.push_str(line),
        }
    }
    changed.then_some(out)
}

/// Take the first heading at the shallowest level present as the title.
///
/// The heading line is removed from the body, together with one blank line
/// directly after it. Returns `None` when the body has no heading.
#[must_use]
pub fn extract_title(body: &str) -> Option<ExtractedTitle> {
    let lines = scan(body);
    let shallowest = lines
        .iter()
        .filter_map(|(_, heading)| heading.as_ref().map(|h| h.level))
        .min()?;
    let (index, title) = lines.iter().enumerate().find_map(|(idx, (_, heading))| {
        heading
            .as_ref()
            .filter(|h| h.level == shallowest)
            .map(|h| (idx, h.text.clone()))
    })?;

    let skip_blank = lines
        .get(index + 1)
        .is_some_and(|(line, _)| line.trim().is_empty());
    let body = lines
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != index && !(skip_blank && *idx == index + 1))
        .map(|(_, (line, _))| *line)
        .collect::<String>();
    Some(ExtractedTitle { title, body })
}
