//! In-process fake capsule server for integration tests.

#![allow(dead_code)]

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Sandbox {
    files: BTreeMap<String, Vec<u8>>,
}

#[derive(Default)]
struct Inner {
    sandboxes: HashMap<String, Sandbox>,
    created: u64,
    requests: Vec<Value>,
}

/// Shared view of the fake server's state.
#[derive(Clone, Default)]
pub struct FakeServer(Arc<Mutex<Inner>>);

impl FakeServer {
    /// Every envelope received on `/rpc`, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.0.lock().unwrap().requests.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.requests()
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect()
    }

    pub fn live_sandboxes(&self) -> usize {
        self.0.lock().unwrap().sandboxes.len()
    }
}

fn rpc_error(id: &Value, code: i64, message: &str, kind: &str, retryable: bool) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message, "data": {"type": kind, "retryable": retryable}}
    })
}

fn rpc_result(id: &Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

async fn handle_rpc(State(server): State<FakeServer>, Json(req): Json<Value>) -> Json<Value> {
    Json(dispatch(&server, req))
}

fn dispatch(server: &FakeServer, req: Value) -> Value {
    let mut inner = server.0.lock().unwrap();
    inner.requests.push(req.clone());

    let id = req["id"].clone();
    let params = &req["params"];
    let sandbox_id = params["id"].as_str().unwrap_or_default().to_string();

    match req["method"].as_str().unwrap_or_default() {
        "sandbox.v1.create" => match params["template"].as_str() {
            Some(template @ ("python" | "node" | "go")) => {
                inner.created += 1;
                let new_id = format!("sb-{}", inner.created);
                inner.sandboxes.insert(new_id.clone(), Sandbox::default());
                rpc_result(
                    &id,
                    json!({
                        "id": new_id,
                        "template": template,
                        "created_at": "2024-05-01T12:00:00Z",
                        "expires_at": "2024-05-01T12:10:00Z"
                    }),
                )
            }
            _ => rpc_error(&id, -32001, "invalid params", "INVALID_PARAMS", false),
        },

        "sandbox.v1.exec" => {
            if !inner.sandboxes.contains_key(&sandbox_id) {
                rpc_error(&id, -32005, "exec failed", "EXEC_FAILED", true)
            } else {
                let cmd: Vec<String> = params["cmd"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                    .unwrap_or_default();
                let exit_code = if cmd.first().map(String::as_str) == Some("false") { 1 } else { 0 };
                rpc_result(
                    &id,
                    json!({
                        "stdout": format!("{}\n", cmd.join(" ")),
                        "stderr": "",
                        "exit_code": exit_code,
                        "timed_out": false,
                        "stdout_truncated": false,
                        "stderr_truncated": false,
                        "duration_ms": 4
                    }),
                )
            }
        }

        "sandbox.v1.delete" => match inner.sandboxes.remove(&sandbox_id) {
            Some(_) => rpc_result(&id, json!({"ok": true})),
            None => rpc_error(&id, -32007, "delete failed", "DELETE_FAILED", true),
        },

        "sandbox.v1.writeFile" => {
            let path = params["path"].as_str().unwrap_or_default().to_string();
            let content = general_purpose::STANDARD
                .decode(params["content"].as_str().unwrap_or_default())
                .unwrap_or_default();
            match inner.sandboxes.get_mut(&sandbox_id) {
                Some(sandbox) => {
                    sandbox.files.insert(path, content);
                    rpc_result(&id, json!({"ok": true}))
                }
                None => rpc_error(&id, -32006, "write failed", "WRITE_FAILED", false),
            }
        }

        "sandbox.v1.readFile" => {
            let path = params["path"].as_str().unwrap_or_default();
            match inner
                .sandboxes
                .get(&sandbox_id)
                .and_then(|s| s.files.get(path))
            {
                Some(bytes) => rpc_result(
                    &id,
                    json!({"content": general_purpose::STANDARD.encode(bytes)}),
                ),
                None => rpc_error(&id, -32006, "read failed", "READ_FAILED", false),
            }
        }

        "sandbox.v1.listDir" => match inner.sandboxes.get(&sandbox_id) {
            Some(sandbox) => {
                let dir = params["path"].as_str().unwrap_or("/").trim_end_matches('/');
                let files: Vec<Value> = sandbox
                    .files
                    .iter()
                    .filter_map(|(path, bytes)| {
                        let name = path.strip_prefix(dir)?.strip_prefix('/')?;
                        Some(json!({"name": name, "path": path, "is_dir": false, "size": bytes.len()}))
                    })
                    .collect();
                if files.is_empty() {
                    rpc_result(&id, json!({}))
                } else {
                    rpc_result(&id, json!({"files": files}))
                }
            }
            None => rpc_error(&id, -32006, "list failed", "LIST_FAILED", false),
        },

        "test.notFound" => json!({"jsonrpc": "2.0", "id": id, "error": {"code": 404, "message": "not found"}}),

        "test.null" => json!({"jsonrpc": "2.0", "id": id, "result": null, "error": null}),

        other => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": format!("method not found: {other}")}
        }),
    }
}

/// Bind a router on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start the fake capsule server.
pub async fn start() -> (String, FakeServer) {
    let server = FakeServer::default();
    let app = Router::new()
        .route("/rpc", post(handle_rpc))
        .route("/health", get(|| async { "ok" }))
        .with_state(server.clone());
    (spawn(app).await, server)
}

/// Server whose `/rpc` always answers with `status`.
pub async fn start_failing(status: StatusCode) -> String {
    let app = Router::new().route("/rpc", post(move || async move { (status, "failure") }));
    spawn(app).await
}

/// Server whose `/rpc` answers only after `delay`.
pub async fn start_slow(delay: Duration) -> String {
    let app = Router::new().route(
        "/rpc",
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({"jsonrpc": "2.0", "id": 1, "result": null}))
        }),
    );
    spawn(app).await
}

/// A local address with nothing listening on it.
pub async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
