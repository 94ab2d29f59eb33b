//! In-process HTTP endpoint that records every request it receives.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

struct Endpoint {
    status: StatusCode,
    reply: &'static str,
    seen: Mutex<Vec<CapturedRequest>>,
}

pub struct CaptureServer {
    pub base_url: String,
    endpoint: Arc<Endpoint>,
}

impl CaptureServer {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.endpoint.seen.lock().unwrap().clone()
    }
}

async fn record(
    State(endpoint): State<Arc<Endpoint>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    endpoint.seen.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        uri: uri.to_string(),
        headers,
        body,
    });
    (endpoint.status, endpoint.reply)
}

/// Start a server answering every request with `status` and `reply`.
pub async fn capture_server(status: StatusCode, reply: &'static str) -> CaptureServer {
    let endpoint = Arc::new(Endpoint {
        status,
        reply,
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .fallback(record)
        .with_state(endpoint.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    CaptureServer {
        base_url: format!("http://{addr}"),
        endpoint,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn ctx() -> smsfwd_core::ForwardContext {
    smsfwd_core::ForwardContext {
        sender: "+8613800000000".into(),
        time: "2024-05-01 13:37:00".into(),
        content: "Your code is 4821 & \"secret\"".into(),
        timestamp: 1_714_541_820,
    }
}
