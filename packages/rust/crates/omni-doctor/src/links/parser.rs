use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::iter::Enumerate;
use std::ops::Range;
use std::str::Lines;
use std::sync::LazyLock;

use crate::fence::FenceTracker;

/// Marker introducing an explicit vault selector: `dendron://<vault>/<name>`.
pub const VAULT_SCHEME: &str = "dendron://";

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

// Brackets are excluded from the inner text, so nested or unbalanced
// occurrences never match.
static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(!?)\[\[([^\[\]\n]+)\]\]"));

/// Link target as written, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    /// Plain hierarchical name, resolved in the source note's vault.
    Unqualified {
        /// Hierarchical note name.
        name: String,
    },
    /// Name with an explicit vault selector.
    Qualified {
        /// Selected vault name.
        vault: String,
        /// Hierarchical note name.
        name: String,
    },
}

impl LinkTarget {
    /// Hierarchical note name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unqualified { name } | Self::Qualified { name, .. } => name,
        }
    }

    /// Explicit vault selector, if any.
    #[must_use]
    pub fn vault(&self) -> Option<&str> {
        match self {
            Self::Unqualified { .. } => None,
            Self::Qualified { vault, .. } => Some(vault),
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unqualified { name } => f.write_str(name),
            Self::Qualified { vault, name } => write!(f, "{VAULT_SCHEME}{vault}/{name}"),
        }
    }
}

/// One wikilink occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiLink {
    /// Display alias (`[[alias|target]]`); never part of the target.
    pub alias: Option<String>,
    /// Parsed target.
    pub target: LinkTarget,
    /// `![[target]]` note reference.
    pub embed: bool,
    /// 1-based line of the occurrence.
    pub line: usize,
}

/// Parse the target half of a wikilink.
///
/// `dendron://vault/name` yields [`LinkTarget::Qualified`]; anything else is
/// [`LinkTarget::Unqualified`]. A `#heading` suffix is dropped. Returns
/// `None` for empty names, anchor-only targets and selectors without a vault
/// or `/`.
#[must_use]
pub fn parse_link_target(raw: &str) -> Option<LinkTarget> {
    let trimmed = raw.trim();
    let (vault, rest) = match trimmed.strip_prefix(VAULT_SCHEME) {
        Some(qualified) => {
            let (vault, name) = qualified.split_once('/')?;
            (Some(vault.trim()), name)
        }
        None => (None, trimmed),
    };
    let name = rest.split_once('#').map_or(rest, |(left, _)| left).trim();
    if name.is_empty() {
        return None;
    }
    match vault {
        Some("") => None,
        Some(vault) => Some(LinkTarget::Qualified {
            vault: vault.to_string(),
            name: name.to_string(),
        }),
        None => Some(LinkTarget::Unqualified {
            name: name.to_string(),
        }),
    }
}

fn parse_occurrence(inner: &str, embed: bool, line: usize) -> Option<WikiLink> {
    let (alias, raw_target) = match inner.split_once('|') {
        Some((alias, target)) => {
            let alias = alias.trim();
            ((!alias.is_empty()).then(|| alias.to_string()), target)
        }
        None => (None, inner),
    };
    Some(WikiLink {
        alias,
        target: parse_link_target(raw_target)?,
        embed,
        line,
    })
}

/// Byte ranges of inline code spans: a backtick run closed by a run of the
/// same length. Unclosed runs are literal text.
fn code_span_ranges(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let mut ranges = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let mut idx = 0usize;
    while idx < bytes.len() {
        if bytes[idx] != b'`' {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < bytes.len() && bytes[idx] == b'`' {
            idx += 1;
        }
        let run = idx - start;
        match open {
            Some((open_start, open_run)) if open_run == run => {
                ranges.push(open_start..idx);
                open = None;
            }
            Some(_) => {}
            None => open = Some((start, run)),
        }
    }
    ranges
}

fn links_in_line(line: &str, line_no: usize) -> Vec<WikiLink> {
    if !line.contains("[[") {
        return Vec::new();
    }
    let spans = code_span_ranges(line);
    WIKILINK_REGEX
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if spans
                .iter()
                .any(|span| span.start < whole.end() && whole.start() < span.end)
            {
                return None;
            }
            let embed = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            parse_occurrence(caps.get(2)?.as_str(), embed, line_no)
        })
        .collect()
}

/// Lazy iterator over the wikilinks of a note body, in body order.
///
/// Fenced code blocks and inline code spans are skipped. The iterator is
/// consumed once; parse the body again to restart.
#[derive(Debug)]
pub struct WikiLinks<'a> {
    lines: Enumerate<Lines<'a>>,
    fences: FenceTracker,
    pending: std::vec::IntoIter<WikiLink>,
}

impl Iterator for WikiLinks<'_> {
    type Item = WikiLink;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(link) = self.pending.next() {
                return Some(link);
            }
            let (idx, line) = self.lines.next()?;
            if self.fences.is_code(line) {
                continue;
            }
            self.pending = links_in_line(line, idx + 1).into_iter();
        }
    }
}

/// Start scanning `body` for wikilinks.
#[must_use]
pub fn parse_wikilinks(body: &str) -> WikiLinks<'_> {
    WikiLinks {
        lines: body.lines().enumerate(),
        fences: FenceTracker::default(),
        pending: Vec::new().into_iter(),
    }
}
