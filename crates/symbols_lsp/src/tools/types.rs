//! Shared result shapes for the eight tool operations (C7)
//!
//! These are the canonical internal forms every duck-typed LSP response is
//! normalized into before it crosses back out to the agent (§9: "keep a
//! single canonical internal form after the boundary"). All positions are
//! [`OneBasedPosition`]/[`OneBasedRange`] — never the LSP wire's 0-based
//! coordinates — matching the agent-protocol argument/result shapes in §6.

use serde::Serialize;

use crate::position::OneBasedRange;

/// A location in a file, as returned by `definition`/`typeDefinition`/
/// `implementation`/`references`.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResult {
    pub uri: String,
    pub range: OneBasedRange,
}

/// A single-file text edit, as carried by completion `textEdit`s and by
/// `rename`'s per-URI change lists.
#[derive(Debug, Clone, Serialize)]
pub struct TextEditResult {
    pub range: OneBasedRange,
    pub new_text: String,
}

/// The result of `inspect`: hover plus the three location-returning
/// requests, fanned out independently, plus the best-effort cursor context.
#[derive(Debug, Clone, Serialize, Default)]
pub struct InspectResult {
    pub hover: Option<lsp_types::Hover>,
    pub definition: Vec<LocationResult>,
    pub type_definition: Vec<LocationResult>,
    pub implementation: Vec<LocationResult>,
    pub cursor_context: Option<crate::context::CursorContext>,
}

/// A single completion candidate, normalized from either `CompletionItem[]`
/// or `CompletionList.items` (§9: duck-typed response).
#[derive(Debug, Clone, Serialize)]
pub struct CompletionItemResult {
    pub label: String,
    pub kind: Option<lsp_types::CompletionItemKind>,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    pub insert_text: Option<String>,
    pub text_edit: Option<TextEditResult>,
}

/// A single `workspace/symbol` hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub kind: lsp_types::SymbolKind,
    pub uri: String,
    pub range: OneBasedRange,
    pub container_name: Option<String>,
}

/// A single outline entry, after flattening either `SymbolInformation[]` or
/// nested `DocumentSymbol[]` (§4.7, outline) by depth-first traversal.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineEntry {
    pub name: String,
    pub kind: lsp_types::SymbolKind,
    pub range: OneBasedRange,
    pub container_name: Option<String>,
    pub detail: Option<String>,
    pub deprecated: Option<bool>,
}

/// A single diagnostic, sorted per §4.7 (severity, then line, then
/// character) before being handed back.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticResult {
    pub severity: Option<u8>,
    pub code: Option<String>,
    pub source: Option<String>,
    pub message: String,
    pub range: OneBasedRange,
}

/// The result of `rename`: the raw `WorkspaceEdit` translated into 1-based
/// per-URI edit lists, unapplied — applying to disk is a separate utility
/// (§4.7: the core returns the edit map unchanged in structure).
#[derive(Debug, Clone, Serialize, Default)]
pub struct RenameResult {
    pub changes: std::collections::HashMap<String, Vec<TextEditResult>>,
    pub change_count: usize,
}

/// The outcome of applying one file's edits via [`crate::tools::rename::apply_workspace_edits`].
#[derive(Debug, Clone, Serialize)]
pub struct ApplyEditOutcome {
    pub uri: String,
    pub applied: usize,
    pub skipped: usize,
    pub written: bool,
}
