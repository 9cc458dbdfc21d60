//! Cursor-context enricher (C9)
//!
//! Given a 1-based position in a file, produces a small human-oriented
//! block: the line text, the identifier spanning the cursor (if any), and a
//! few lines of surrounding context. Best-effort: any failure (file
//! unreadable, position past EOF) yields `None` rather than propagating an
//! error, since this is supplementary information attached to `inspect`.

use serde::Serialize;

use crate::position::OneBasedPosition;

/// How many lines of context to include on each side of the cursor line.
const CONTEXT_RADIUS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorContext {
    pub line_text: String,
    pub symbol_name: Option<String>,
    pub context_lines: Vec<String>,
}

/// Build a [`CursorContext`] for `position` inside `text`. Returns `None`
/// if the position's line is out of range.
pub fn build_context(text: &str, position: OneBasedPosition) -> Option<CursorContext> {
    let lines: Vec<&str> = text.lines().collect();
    let line_index = position.line().checked_sub(1)?;
    let line_text = (*lines.get(line_index)?).to_string();

    let symbol_name = identifier_at(&line_text, position.character().saturating_sub(1));

    let start = line_index.saturating_sub(CONTEXT_RADIUS);
    let end = (line_index + CONTEXT_RADIUS + 1).min(lines.len());
    let context_lines = lines[start..end].iter().map(|l| l.to_string()).collect();

    Some(CursorContext { line_text, symbol_name, context_lines })
}

/// Find the identifier token spanning byte-ish column `column` in `line`,
/// using a whitespace/punctuation boundary rule: any character that is not
/// alphanumeric or `_` bounds the token.
fn identifier_at(line: &str, column: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return None;
    }
    let column = column.min(chars.len().saturating_sub(1));

    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    if !is_ident(chars[column]) {
        return None;
    }

    let mut start = column;
    while start > 0 && is_ident(chars[start - 1]) {
        start -= 1;
    }
    let mut end = column;
    while end + 1 < chars.len() && is_ident(chars[end + 1]) {
        end += 1;
    }

    Some(chars[start..=end].iter().collect())
}
