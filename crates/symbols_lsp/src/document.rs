//! Document lifecycle (C5)
//!
//! Open-with-strategy / close-with-strategy over the [`OpenDocumentTable`],
//! plus the `executeWithLifecycle` wrapper every C7 tool operation is built
//! on. This module never talks to the transport directly by constructing
//! JSON-RPC payloads itself; it is handed a small `Notifier` callback pair by
//! [`crate::session::Session`] so it stays transport-agnostic and testable
//! in isolation.

use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use symbols_core::{Error, Result};

use crate::stores::{OpenDocument, OpenDocumentTable};

/// The document-acquisition policy around a single tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Open for the operation, close on exit regardless of prior state.
    Temporary,
    /// Open and keep open until session end (used for preload).
    Persistent,
    /// If already open, leave it open on exit; otherwise open for the
    /// operation and close on exit.
    RespectExisting,
}

/// Characters the filesystem-URI encoder escapes beyond the default
/// unreserved set, matching what `file://` URIs require quoted.
const URI_FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`').add(b'#').add(b'?');

/// Render an absolute filesystem path as a canonical `file://` URI.
pub fn path_to_uri(path: &Path) -> String {
    let mut uri = String::from("file://");
    for component in path.components() {
        let piece = component.as_os_str().to_string_lossy();
        if piece == "/" {
            continue;
        }
        uri.push('/');
        uri.push_str(&utf8_percent_encode(&piece, URI_FRAGMENT).to_string());
    }
    uri
}

/// Resolve `path` (possibly relative) to an absolute path and its canonical
/// URI, without touching the filesystem beyond `canonicalize`.
pub fn canonicalize(path: &Path) -> Result<(PathBuf, String)> {
    let absolute = path
        .canonicalize()
        .map_err(|_| Error::FileNotFound { path: path.to_path_buf() })?;
    let uri = path_to_uri(&absolute);
    Ok((absolute, uri))
}

/// Outcome of the open step, handed to the wrapped operation.
pub struct Acquired {
    pub uri: String,
    pub was_already_open: bool,
    pub is_preloaded: bool,
}

/// Callbacks the document lifecycle uses to talk to the server. Kept
/// narrow and synchronous-in-spirit (each returns a future) so this module
/// has no direct dependency on the transport or a particular client type.
#[async_trait::async_trait]
pub trait DocumentNotifier: Send + Sync {
    async fn did_open(&self, uri: &str, language_id: &str, version: i32, text: &str) -> Result<()>;
    async fn did_close(&self, uri: &str) -> Result<()>;
}

/// Open `path` under `strategy`, returning the canonical URI and whether it
/// was already open / preloaded so `close_with_strategy` can later make the
/// correct decision.
pub async fn open_with_strategy(
    table: &OpenDocumentTable,
    notifier: &dyn DocumentNotifier,
    path: &Path,
    language_id: &str,
    strategy: Strategy,
) -> Result<Acquired> {
    let (absolute, uri) = canonicalize(path)?;

    let existing = table.get(&uri);
    let was_already_open = existing.as_ref().map(|d| d.is_open).unwrap_or(false);
    let is_preloaded = existing.as_ref().map(|d| d.preloaded).unwrap_or(false);

    // `RespectExisting` leaves a pre-existing document untouched by definition.
    // `Persistent` means "keep open" for every call that sees it, not just the
    // first: forcing a clean-slate reopen on a later Persistent acquisition
    // would re-`didOpen` a document callers were told stays open across calls.
    if was_already_open && strategy != Strategy::Temporary {
        return Ok(Acquired { uri, was_already_open, is_preloaded });
    }

    let text = match &existing {
        Some(doc) => doc.text.clone(),
        None => std::fs::read_to_string(&absolute)
            .map_err(|_| Error::FileNotFound { path: absolute.clone() })?,
    };

    if was_already_open {
        // Clean slate: eliminate stale server state before re-opening.
        notifier.did_close(&uri).await?;
        table.remove(&uri);
    }

    let version = table.next_version(&uri);
    notifier.did_open(&uri, language_id, version, &text).await?;
    table.put(OpenDocument {
        uri: uri.clone(),
        text,
        version,
        language_id: language_id.to_string(),
        is_open: true,
        preloaded: strategy == Strategy::Persistent,
    });

    Ok(Acquired { uri, was_already_open, is_preloaded })
}

/// Apply the close decision table for `strategy` given what `acquired`
/// recorded at open time. Close failures are logged by the caller, not
/// propagated, so a successful operation is never turned into a failure by
/// teardown.
pub async fn close_with_strategy(
    table: &OpenDocumentTable,
    notifier: &dyn DocumentNotifier,
    acquired: &Acquired,
    strategy: Strategy,
) {
    let should_close = match strategy {
        Strategy::Temporary => true,
        Strategy::Persistent => false,
        Strategy::RespectExisting => !acquired.was_already_open && !acquired.is_preloaded,
    };

    if !should_close {
        return;
    }

    if let Err(e) = notifier.did_close(&acquired.uri).await {
        tracing::warn!(uri = %acquired.uri, error = %e, "failed to close document after tool call");
    }
    table.remove(&acquired.uri);
}

/// Run `operation` with a document acquired under `strategy`, guaranteeing
/// the close decision runs on every exit path (success, error, or the
/// operation's own early return).
pub async fn execute_with_lifecycle<T, F, Fut>(
    table: &OpenDocumentTable,
    notifier: &dyn DocumentNotifier,
    path: &Path,
    language_id: &str,
    strategy: Strategy,
    operation: F,
) -> Result<T>
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let acquired = open_with_strategy(table, notifier, path, language_id, strategy).await?;
    let result = operation(acquired.uri.clone()).await;
    close_with_strategy(table, notifier, &acquired, strategy).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    struct RecordingNotifier {
        opens: AtomicUsize,
        closes: AtomicUsize,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self { opens: AtomicUsize::new(0), closes: AtomicUsize::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl DocumentNotifier for RecordingNotifier {
        async fn did_open(&self, _uri: &str, _language_id: &str, _version: i32, _text: &str) -> Result<()> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn did_close(&self, _uri: &str) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn temporary_strategy_always_closes() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fn main() {}").unwrap();

        let table = OpenDocumentTable::new();
        let notifier = RecordingNotifier::new();

        execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::Temporary, |_uri| async {
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

        assert_eq!(notifier.opens.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.closes.load(Ordering::SeqCst), 1);
        assert!(!table.has(&path_to_uri(&file.path().canonicalize().unwrap())));
    }

    #[tokio::test]
    async fn respect_existing_leaves_preexisting_open_document_alone() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fn main() {}").unwrap();

        let table = OpenDocumentTable::new();
        let notifier = RecordingNotifier::new();

        // Preload first (Persistent).
        execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::Persistent, |_uri| async {
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

        let (_, uri) = canonicalize(file.path()).unwrap();
        let version_before = table.get(&uri).unwrap().version;

        // A subsequent RespectExisting op must not close it nor re-open it.
        execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::RespectExisting, |_uri| async {
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

        assert!(table.has(&uri));
        assert_eq!(table.get(&uri).unwrap().version, version_before);
        assert_eq!(notifier.opens.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persistent_strategy_is_idempotent_across_repeated_acquisitions() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fn main() {}").unwrap();

        let table = OpenDocumentTable::new();
        let notifier = RecordingNotifier::new();

        execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::Persistent, |_uri| async {
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

        // A second Persistent acquisition of the same, still-open document
        // must not force a close-then-reopen: that would re-`didOpen` a
        // document callers rely on staying open across calls.
        execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::Persistent, |_uri| async {
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

        assert_eq!(notifier.opens.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn respect_existing_closes_when_it_had_to_open() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fn main() {}").unwrap();

        let table = OpenDocumentTable::new();
        let notifier = RecordingNotifier::new();

        execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::RespectExisting, |_uri| async {
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

        let (_, uri) = canonicalize(file.path()).unwrap();
        assert!(!table.has(&uri));
        assert_eq!(notifier.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_runs_even_when_operation_fails() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fn main() {}").unwrap();

        let table = OpenDocumentTable::new();
        let notifier = RecordingNotifier::new();

        let result = execute_with_lifecycle(&table, &notifier, file.path(), "rust", Strategy::Temporary, |_uri| async {
            Err::<(), _>(Error::Internal("boom".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(notifier.closes.load(Ordering::SeqCst), 1);
    }
}
