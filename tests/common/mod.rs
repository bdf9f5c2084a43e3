//! Shared test utilities for dashboard integration tests.
//!
//! Import via `mod common;` in integration test files:
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

// ============================================================================
// Fake demo-ui backend
// ============================================================================

/// What the fake server does for one route.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with a status line and body after an optional delay.
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    /// Close the connection without answering.
    HangUp,
}

type Routes = Arc<Mutex<HashMap<String, Reply>>>;

/// Minimal HTTP/1.1 server over a raw `TcpListener`.
///
/// Routes are matched on the exact request target, query string included.
/// Unknown targets answer 404.
pub struct FakeServer {
    addr: SocketAddr,
    routes: Routes,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeServer {
    /// Bind to a random local port and start serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind to random port");
        let addr = listener.local_addr().expect("should have local addr");

        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<String>>> = Arc::default();

        let (r, q) = (routes.clone(), requests.clone());
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle_connection(stream, r.clone(), q.clone()));
            }
        });

        Self {
            addr,
            routes,
            requests,
            task,
        }
    }

    /// Base URL to hand to `HttpBackend`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Serve `reply` for `target`.
    pub fn route(&self, target: impl Into<String>, reply: Reply) -> &Self {
        self.routes.lock().insert(target.into(), reply);
        self
    }

    /// Serve a 200 JSON body for `target`.
    pub fn json(&self, target: impl Into<String>, body: Value) -> &Self {
        self.route(
            target,
            Reply::Respond {
                status: 200,
                body: body.to_string(),
                delay: Duration::ZERO,
            },
        )
    }

    /// Serve a bare status with a small text body for `target`.
    pub fn status(&self, target: impl Into<String>, status: u16) -> &Self {
        self.route(
            target,
            Reply::Respond {
                status,
                body: "error".to_string(),
                delay: Duration::ZERO,
            },
        )
    }

    /// Request targets received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_connection(stream: TcpStream, routes: Routes, requests: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.is_err() {
        return;
    }
    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    // drain headers
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header).await {
            Ok(0) | Err(_) => return,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => {}
        }
    }

    requests.lock().push(target.clone());
    let reply = routes.lock().get(&target).cloned().unwrap_or(Reply::Respond {
        status: 404,
        body: "not found".to_string(),
        delay: Duration::ZERO,
    });

    let mut stream = reader.into_inner();
    match reply {
        Reply::HangUp => {
            let _ = stream.shutdown().await;
        }
        Reply::Respond {
            status,
            body,
            delay,
        } => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

/// A Prometheus instant-vector response with one sample.
#[allow(dead_code)]
pub fn prom_vector(value: &str) -> Value {
    serde_json::json!({
        "status": "success",
        "data": {"resultType": "vector", "result": [
            {"metric": {}, "value": [1714557600.0, value]}
        ]}
    })
}

/// A Prometheus instant-vector response with no samples.
#[allow(dead_code)]
pub fn prom_empty() -> Value {
    serde_json::json!({"status": "success", "data": {"resultType": "vector", "result": []}})
}

/// A local port with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind to random port");
    let port = listener.local_addr().expect("should have local addr").port();
    drop(listener);
    port
}
