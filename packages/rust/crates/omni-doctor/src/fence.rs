//! Fenced code block tracking shared by the link and heading scanners.
//!
//! A fence opens on a line indented by at most three spaces that starts with
//! three or more backticks or tildes, and closes only on a run of the same
//! character at least as long, with nothing but whitespace after it. An
//! unclosed fence runs to the end of the body.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: u8,
    len: usize,
}

/// Parse a fence run, returning it with the text after the run.
fn fence_run(line: &str) -> Option<(Fence, &str)> {
    let content = line.trim_end_matches(['\n', '\r']);
    let indent = content.len() - content.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &content[indent..];
    let marker = *rest.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = rest.bytes().take_while(|byte| *byte == marker).count();
    if len < 3 {
        return None;
    }
    Some((Fence { marker, len }, &rest[len..]))
}

/// Line-by-line fence state.
#[derive(Debug, Clone, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    /// Feed the next line. Returns `true` when the line is a fence delimiter
    /// or sits inside a fenced block.
    pub(crate) fn is_code(&mut self, line: &str) -> bool {
        let run = fence_run(line);
        match (self.open, run) {
            (Some(open), Some((fence, after)))
                if fence.marker == open.marker
                    && fence.len >= open.len
                    && after.trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            // Backtick fences cannot carry backticks in their info string.
            (None, Some((fence, info))) if fence.marker == b'`' && info.contains('`') => false,
            (None, Some((fence, _))) => {
                self.open = Some(fence);
                true
            }
            (None, None) => false,
        }
    }
}
