//! Request validation (C8)
//!
//! Three composable guards, applied in order: `workspace_ready` ->
//! `path_valid` -> `position_in_bounds`. Validation reads the filesystem
//! fresh at call time; the server sees whatever content Document lifecycle
//! captured at open time, so the two can race against external edits by
//! design (§4.8).

use std::path::{Path, PathBuf};

use symbols_core::{Error, Result};

use crate::position::OneBasedPosition;
use crate::stores::WorkspaceReadinessStore;

/// Fail fast with `WorkspaceLoadInProgress` unless the workspace is Ready.
/// Callers that don't need workspace-wide indexing simply don't invoke this
/// guard.
pub fn workspace_ready(store: &WorkspaceReadinessStore) -> Result<()> {
    if store.is_ready() {
        Ok(())
    } else {
        Err(Error::WorkspaceLoadInProgress)
    }
}

/// Absolutize `path`, and require it exists and is a regular file.
pub fn path_valid(path: &Path) -> Result<PathBuf> {
    let absolute = path
        .canonicalize()
        .map_err(|_| Error::FileNotFound { path: path.to_path_buf() })?;

    if !absolute.is_file() {
        return Err(Error::InvalidPath {
            path: absolute,
            reason: "not a regular file".to_string(),
        });
    }

    Ok(absolute)
}

/// Check that `position` lies within `text`: the line index must be in
/// `[0, lineCount)` and the character index in `[0, len(line)]` — the
/// character bound is inclusive to allow end-of-line positions (§4.8).
pub fn position_in_bounds(text: &str, position: OneBasedPosition) -> Result<()> {
    let zero = position.to_zero_based();
    let lines: Vec<&str> = text.lines().collect();

    let Some(line) = lines.get(zero.line()) else {
        return Err(Error::PositionOutOfBounds {
            line: position.line(),
            character: position.character(),
        });
    };

    let line_len = line.chars().count();
    if zero.character() > line_len {
        return Err(Error::PositionOutOfBounds {
            line: position.line(),
            character: position.character(),
        });
    }

    Ok(())
}

/// Run all three guards for an operation that touches a specific file and
/// position and requires workspace readiness. Returns the absolutized path
/// and the file's current content, since callers invariably need both next.
pub fn validate_workspace_file_position(
    workspace: &WorkspaceReadinessStore,
    path: &Path,
    position: OneBasedPosition,
) -> Result<(PathBuf, String)> {
    workspace_ready(workspace)?;
    let absolute = path_valid(path)?;
    let text = std::fs::read_to_string(&absolute)
        .map_err(|_| Error::FileNotFound { path: absolute.clone() })?;
    position_in_bounds(&text, position)?;
    Ok((absolute, text))
}

/// Run just the path and position guards, without requiring workspace
/// readiness (most C7 operations are file-scoped, not workspace-scoped).
pub fn validate_file_position(path: &Path, position: OneBasedPosition) -> Result<(PathBuf, String)> {
    let absolute = path_valid(path)?;
    let text = std::fs::read_to_string(&absolute)
        .map_err(|_| Error::FileNotFound { path: absolute.clone() })?;
    position_in_bounds(&text, position)?;
    Ok((absolute, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::WorkspaceState;
    use tempfile::NamedTempFile;

    #[test]
    fn rejects_missing_file() {
        let err = path_valid(Path::new("/no/such/file.rs")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn accepts_character_equal_to_line_length() {
        let text = "hello";
        let pos = OneBasedPosition::new(1, 6).unwrap(); // len("hello") + 1
        assert!(position_in_bounds(text, pos).is_ok());
    }

    #[test]
    fn rejects_character_past_line_length() {
        let text = "hello";
        let pos = OneBasedPosition::new(1, 7).unwrap();
        assert!(position_in_bounds(text, pos).is_err());
    }

    #[test]
    fn rejects_line_past_eof() {
        let text = "only one line";
        let pos = OneBasedPosition::new(5, 1).unwrap();
        assert!(position_in_bounds(text, pos).is_err());
    }

    #[test]
    fn workspace_ready_short_circuits_before_any_file_check() {
        let store = WorkspaceReadinessStore::new();
        assert!(matches!(
            workspace_ready(&store).unwrap_err(),
            Error::WorkspaceLoadInProgress
        ));
        store.transition(WorkspaceState::Ready, chrono::Utc::now());
        assert!(workspace_ready(&store).is_ok());
    }

    #[test]
    fn validate_file_position_reads_real_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fn main() {}\n").unwrap();
        let pos = OneBasedPosition::new(1, 1).unwrap();
        let (path, text) = validate_file_position(file.path(), pos).unwrap();
        assert!(path.is_absolute());
        assert_eq!(text, "fn main() {}\n");
    }
}
