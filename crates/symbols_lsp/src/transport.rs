//! Framed JSON-RPC transport (C1)
//!
//! Implements the LSP base protocol: `Content-Length: N\r\n\r\n`-prefixed
//! UTF-8 JSON messages over a child process's stdio. Mirrors the predecessor
//! `LspClient`'s framing (a synchronous `BufReader`/`BufWriter` pair driven
//! from a background thread) but ported onto `tokio::process` so the read
//! loop is a spawned task rather than an OS thread, and so cancellation can
//! be expressed with `tokio::select!` instead of a blocking channel recv.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use symbols_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tracing::{debug, trace, warn};

use crate::cancel::CancelToken;

type NotificationHandler = Box<dyn Fn(Value) + Send + Sync>;
type RequestHandler = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Outcome of a completed JSON-RPC request.
type PendingSlot = oneshot::Sender<Result<Value>>;

type CloseHandler = Box<dyn Fn() + Send + Sync>;

struct Dispatch {
    notification_handlers: DashMap<String, NotificationHandler>,
    catch_all_notification: Mutex<Option<NotificationHandler>>,
    request_handlers: DashMap<String, RequestHandler>,
    close_handlers: Mutex<Vec<CloseHandler>>,
}

impl Dispatch {
    fn new() -> Self {
        Self {
            notification_handlers: DashMap::new(),
            catch_all_notification: Mutex::new(None),
            request_handlers: DashMap::new(),
            close_handlers: Mutex::new(Vec::new()),
        }
    }
}

/// A framed JSON-RPC transport over a language server's stdio.
///
/// Owns the subprocess streams and the pending-request table (§3,
/// Ownership). The writer is serialized behind a mutex so two concurrent
/// `sendRequest`/`sendNotification` calls never interleave their bytes on
/// the wire.
pub struct Transport {
    stdin: Arc<AsyncMutex<ChildStdin>>,
    pending: Arc<DashMap<i64, PendingSlot>>,
    next_id: AtomicI64,
    dispatch: Arc<Dispatch>,
    closed: Arc<std::sync::atomic::AtomicBool>,
    reader_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Transport {
    /// Take ownership of a child's stdin/stdout and start the reader loop.
    pub fn spawn(stdin: ChildStdin, stdout: ChildStdout) -> Arc<Self> {
        let pending = Arc::new(DashMap::new());
        let dispatch = Arc::new(Dispatch::new());
        let closed = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stdin = Arc::new(AsyncMutex::new(stdin));

        let transport = Arc::new(Self {
            stdin: stdin.clone(),
            pending: pending.clone(),
            next_id: AtomicI64::new(1),
            dispatch: dispatch.clone(),
            closed: closed.clone(),
            reader_task: Mutex::new(None),
        });

        let reader_task = tokio::spawn(Self::read_loop(stdout, stdin, pending, dispatch, closed));
        *transport.reader_task.lock() = Some(reader_task);

        transport
    }

    /// Whether the transport has observed EOF on the child's stdout.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register a handler for a notification method. Replaces any
    /// previously-registered handler for the same method.
    pub fn on_notification<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.dispatch
            .notification_handlers
            .insert(method.into(), Box::new(handler));
    }

    /// Register a fallback invoked for notifications with no specific
    /// handler registered.
    pub fn on_unhandled_notification<F>(&self, handler: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        *self.dispatch.catch_all_notification.lock() = Some(Box::new(handler));
    }

    /// Register a handler answering server-to-client requests (e.g.
    /// `client/registerCapability`). Unregistered methods get a tolerated
    /// `null` response (§6: catch-all responds with null).
    pub fn on_request<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.dispatch
            .request_handlers
            .insert(method.into(), Box::new(handler));
    }

    /// Register a handler invoked once, exactly when the reader loop
    /// observes EOF or a fatal parse error on the child's stdout. Lets
    /// [`crate::session::Session`] learn about an unexpected subprocess
    /// exit without polling `is_closed`.
    pub fn on_closed<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dispatch.close_handlers.lock().push(Box::new(handler));
    }

    /// Send a request and wait for the server's response, honoring
    /// cancellation. On cancellation, `$/cancelRequest` is sent for the
    /// allocated id and `Error::Cancelled` is returned; a response that
    /// arrives afterward is discarded as an unknown id.
    pub async fn send_request<P: Serialize>(
        &self,
        method: &str,
        params: P,
        cancel: &CancelToken,
    ) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::TransportClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        symbols_core::telemetry::metrics::PENDING_REQUESTS.increment();

        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        if let Err(e) = self.write_message(&message).await {
            self.pending.remove(&id);
            symbols_core::telemetry::metrics::PENDING_REQUESTS.decrement();
            return Err(e);
        }

        tokio::select! {
            result = rx => {
                symbols_core::telemetry::metrics::PENDING_REQUESTS.decrement();
                result.map_err(|_| Error::TransportClosed)?
            }
            _ = cancel.cancelled() => {
                self.pending.remove(&id);
                symbols_core::telemetry::metrics::PENDING_REQUESTS.decrement();
                let _ = self.send_notification("$/cancelRequest", json!({ "id": id })).await;
                Err(Error::Cancelled)
            }
        }
    }

    /// Fire-and-forget notification; never waits on a reply.
    pub async fn send_notification<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let message = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        self.write_message(&message).await
    }

    async fn write_message(&self, message: &Value) -> Result<()> {
        Self::write_message_to(&self.stdin, message).await
    }

    /// Serialize and write a single framed message. The stdin lock is a
    /// `tokio::sync::Mutex` rather than `parking_lot::Mutex`: it's held
    /// across the `write_all`/`flush` awaits below, and a `parking_lot`
    /// guard is `!Send`, which would make the reader loop's future (which
    /// reaches this function via `handle_inbound_request`) unable to cross
    /// the `tokio::spawn` boundary.
    async fn write_message_to(stdin: &Arc<AsyncMutex<ChildStdin>>, message: &Value) -> Result<()> {
        let body = serde_json::to_vec(message)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        let mut stdin = stdin.lock().await;
        stdin
            .write_all(header.as_bytes())
            .await
            .map_err(Error::Io)?;
        stdin.write_all(&body).await.map_err(Error::Io)?;
        stdin.flush().await.map_err(Error::Io)?;
        Ok(())
    }

    async fn read_loop(
        stdout: ChildStdout,
        stdin: Arc<AsyncMutex<ChildStdin>>,
        pending: Arc<DashMap<i64, PendingSlot>>,
        dispatch: Arc<Dispatch>,
        closed: Arc<std::sync::atomic::AtomicBool>,
    ) {
        let mut reader = BufReader::new(stdout);

        loop {
            match Self::read_one_message(&mut reader).await {
                Ok(Some(message)) => {
                    Self::dispatch_message(message, &stdin, &pending, &dispatch).await
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to parse LSP message, dropping connection");
                    break;
                }
            }
        }

        closed.store(true, Ordering::SeqCst);
        // Dropping the senders resolves every outstanding `send_request`'s
        // oneshot receiver with a `RecvError`, surfaced as `TransportClosed`.
        pending.clear();
        for handler in dispatch.close_handlers.lock().iter() {
            handler();
        }
        debug!("LSP transport reader loop ended");
    }

    async fn read_one_message(
        reader: &mut BufReader<ChildStdout>,
    ) -> std::io::Result<Option<Value>> {
        let mut content_length: Option<usize> = None;

        loop {
            let mut header_line = String::new();
            let bytes_read = reader.read_line(&mut header_line).await?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }

            let trimmed = header_line.trim_end();
            if trimmed.is_empty() {
                break; // blank line ends the header block
            }

            if let Some((name, value)) = trimmed.split_once(':') {
                if name.eq_ignore_ascii_case("Content-Length") {
                    content_length = value.trim().parse().ok();
                }
                // Other headers (e.g. Content-Type) are tolerated and ignored.
            }
        }

        let length = match content_length {
            Some(l) => l,
            None => return Ok(None),
        };

        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).await?;

        let value = serde_json::from_slice(&body)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Some(value))
    }

    async fn dispatch_message(
        message: Value,
        stdin: &Arc<AsyncMutex<ChildStdin>>,
        pending: &Arc<DashMap<i64, PendingSlot>>,
        dispatch: &Arc<Dispatch>,
    ) {
        if let Some(id) = message.get("id").and_then(|v| v.as_i64()) {
            if message.get("method").is_some() {
                // A request from the server to the client.
                Self::handle_inbound_request(id, message, stdin, dispatch).await;
                return;
            }

            // A response to one of our requests.
            let outcome = if let Some(error) = message.get("error") {
                let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
                let msg = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown LSP error")
                    .to_string();
                Err(Error::LspError { code, message: msg })
            } else {
                Ok(message.get("result").cloned().unwrap_or(Value::Null))
            };

            match pending.remove(&id) {
                Some((_, sender)) => {
                    let _ = sender.send(outcome);
                }
                None => trace!(id, "response for unknown or already-resolved request id"),
            }
            return;
        }

        if let Some(method) = message.get("method").and_then(|v| v.as_str()).map(str::to_string) {
            let params = message.get("params").cloned().unwrap_or(Value::Null);
            if let Some(handler) = dispatch.notification_handlers.get(&method) {
                handler(params);
            } else if let Some(handler) = dispatch.catch_all_notification.lock().as_ref() {
                handler(params);
            } else {
                trace!(method = %method, "unhandled LSP notification");
            }
        }
    }

    async fn handle_inbound_request(
        id: i64,
        message: Value,
        stdin: &Arc<AsyncMutex<ChildStdin>>,
        dispatch: &Arc<Dispatch>,
    ) {
        // Server-to-client requests are rare (registerCapability, work-done
        // progress creation, configuration). Handlers run synchronously and
        // return the JSON `result` value directly; unregistered methods get
        // a tolerated `null` response rather than an error (§6).
        let method = message
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        let result = match dispatch.request_handlers.get(&method) {
            Some(handler) => handler(params),
            None => Value::Null,
        };

        let response = json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result,
        });

        if let Err(e) = Self::write_message_to(stdin, &response).await {
            warn!(error = %e, method = %method, "failed to answer server-to-client request");
        }
    }
}
