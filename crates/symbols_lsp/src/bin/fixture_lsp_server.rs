//! A minimal framed JSON-RPC server used only by integration tests
//! (`tests/session.rs` and friends) as a stand-in for a real language
//! server. Never shipped or invoked outside the test harness. Behavior is
//! selected by the `FIXTURE_MODE` environment variable so one binary can
//! play several servers without a pile of near-identical fixtures.
//!
//! Deliberately synchronous: it only ever has one request in flight, so an
//! async runtime would add ceremony without buying anything.

use std::io::{BufRead, BufReader, Read, Stdin, Stdout, Write};

use serde_json::{json, Value};

fn main() {
    let mode = std::env::var("FIXTURE_MODE").unwrap_or_else(|_| "default".to_string());
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin);
    let stdout = std::io::stdout();

    loop {
        let Some(message) = read_message(&mut reader) else { break };
        let method = message.get("method").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let id = message.get("id").and_then(|v| v.as_i64());

        if mode == "crash_on_second_request" && method == "textDocument/hover" {
            // Simulate the subprocess dying mid-request: exit without
            // responding, closing the pipe out from under the transport.
            std::process::exit(1);
        }

        match (method.as_str(), id) {
            ("initialize", Some(id)) => {
                let result = json!({ "capabilities": {} });
                write_response(&stdout, id, result);
            }
            ("initialized", None) => {
                if mode == "roslyn_project_init" {
                    write_notification(&stdout, "workspace/projectInitializationComplete", json!({}));
                } else if mode == "roslyn_toast" {
                    write_notification(&stdout, "window/showMessage", json!({ "type": 3, "message": "C# solution loaded successfully" }));
                }
            }
            ("textDocument/didOpen", None) => {
                if mode == "push_diagnostics" {
                    let uri = message
                        .get("params")
                        .and_then(|p| p.get("textDocument"))
                        .and_then(|t| t.get("uri"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    write_notification(
                        &stdout,
                        "textDocument/publishDiagnostics",
                        json!({
                            "uri": uri,
                            "diagnostics": [{
                                "range": { "start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 3} },
                                "severity": 1,
                                "message": "fixture diagnostic",
                            }],
                        }),
                    );
                }
            }
            ("textDocument/hover", Some(id)) => {
                write_response(&stdout, id, json!({ "contents": "fixture hover text" }));
            }
            ("textDocument/definition", Some(id)) => {
                write_response(
                    &stdout,
                    id,
                    json!([{ "uri": "file:///fixture.rs", "range": { "start": {"line": 2, "character": 0}, "end": {"line": 2, "character": 5} } }]),
                );
            }
            ("textDocument/typeDefinition", Some(id)) | ("textDocument/implementation", Some(id)) => {
                write_response(&stdout, id, Value::Null);
            }
            ("textDocument/references", Some(id)) => {
                write_response(
                    &stdout,
                    id,
                    json!([
                        { "uri": "file:///fixture.rs", "range": { "start": {"line": 1, "character": 0}, "end": {"line": 1, "character": 3} } },
                        { "uri": "file:///fixture.rs", "range": { "start": {"line": 5, "character": 4}, "end": {"line": 5, "character": 7} } },
                    ]),
                );
            }
            ("textDocument/completion", Some(id)) => {
                write_response(
                    &stdout,
                    id,
                    json!({ "isIncomplete": false, "items": [{ "label": "fixture_completion" }] }),
                );
            }
            ("textDocument/documentSymbol", Some(id)) => {
                write_response(
                    &stdout,
                    id,
                    json!([{
                        "name": "Widget",
                        "kind": 23,
                        "range": { "start": {"line": 0, "character": 0}, "end": {"line": 4, "character": 1} },
                        "selectionRange": { "start": {"line": 0, "character": 7}, "end": {"line": 0, "character": 13} },
                        "children": [],
                    }]),
                );
            }
            ("workspace/symbol", Some(id)) => {
                write_response(
                    &stdout,
                    id,
                    json!([{
                        "name": "fixture_symbol",
                        "kind": 12,
                        "location": { "uri": "file:///fixture.rs", "range": { "start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 6} } },
                    }]),
                );
            }
            ("textDocument/rename", Some(id)) => {
                let uri = message
                    .get("params")
                    .and_then(|p| p.get("textDocument"))
                    .and_then(|t| t.get("uri"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("file:///fixture.rs")
                    .to_string();
                write_response(
                    &stdout,
                    id,
                    json!({ "changes": { uri: [{ "range": { "start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 3} }, "newText": "renamed" }] } }),
                );
            }
            ("textDocument/diagnostic", Some(id)) => {
                write_response(
                    &stdout,
                    id,
                    json!({
                        "kind": "full",
                        "items": [{
                            "range": { "start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 3} },
                            "severity": 2,
                            "message": "fixture pull diagnostic",
                        }],
                    }),
                );
            }
            ("shutdown", Some(id)) => {
                write_response(&stdout, id, Value::Null);
            }
            ("exit", None) => {
                break;
            }
            (_, Some(id)) => {
                write_response(&stdout, id, Value::Null);
            }
            _ => {}
        }
    }
}

fn read_message(reader: &mut BufReader<Stdin>) -> Option<Value> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).ok()?;
        if bytes == 0 {
            return None;
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.eq_ignore_ascii_case("Content-Length") {
                content_length = value.trim().parse().ok();
            }
        }
    }
    let length = content_length?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;
    serde_json::from_slice(&body).ok()
}

fn write_response(stdout: &Stdout, id: i64, result: Value) {
    write_message(stdout, &json!({ "jsonrpc": "2.0", "id": id, "result": result }));
}

fn write_notification(stdout: &Stdout, method: &str, params: Value) {
    write_message(stdout, &json!({ "jsonrpc": "2.0", "method": method, "params": params }));
}

fn write_message(stdout: &Stdout, message: &Value) {
    let body = serde_json::to_vec(message).unwrap();
    let mut handle = stdout.lock();
    let _ = write!(handle, "Content-Length: {}\r\n\r\n", body.len());
    let _ = handle.write_all(&body);
    let _ = handle.flush();
}
