//! In-process axum server for tests that exercise real `reqwest` round trips.
//!
//! Every request, whatever its path, is recorded and answered with the same canned response.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::Router;
use futures_util::{stream, StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the body of a [`MockResponse`] goes over the wire
#[derive(Debug, Clone, Copy)]
pub enum BodyMode {
    /// Complete body with a matching `Content-Length`
    Sized,
    /// Chunked transfer encoding, no `Content-Length`
    Chunked,
    /// Announces `Content-Length: announced`, sends the body, then drops the connection
    Truncated { announced: u64 },
    /// Sends the body, then neither sends more nor finishes
    Stalled,
}

/// Canned response served by [`MockServer`]
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub mode: BodyMode,
}

impl MockResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
            mode: BodyMode::Sized,
        }
    }

    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            ..Self::ok(body)
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn without_content_length(mut self) -> Self {
        self.mode = BodyMode::Chunked;
        self
    }

    pub fn truncated(mut self, announced: u64) -> Self {
        self.mode = BodyMode::Truncated { announced };
        self
    }

    pub fn stalled(mut self) -> Self {
        self.mode = BodyMode::Stalled;
        self
    }

    fn to_response(&self) -> Response {
        let mut builder = Response::builder()
            .status(StatusCode::from_u16(self.status).expect("mock status code"));
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let first = Bytes::from(self.body.clone());
        let body = match self.mode {
            BodyMode::Sized => Body::from(first),
            BodyMode::Chunked => Body::from_stream(stream::iter([Ok::<_, std::io::Error>(first)])),
            BodyMode::Truncated { announced } => {
                builder = builder.header(CONTENT_LENGTH, announced);
                Body::from_stream(stream::iter([
                    Ok(first),
                    Err(std::io::Error::new(std::io::ErrorKind::ConnectionAborted, "truncated")),
                ]))
            }
            BodyMode::Stalled => Body::from_stream(
                stream::iter([Ok::<_, std::io::Error>(first)]).chain(stream::pending()),
            ),
        };

        builder.body(body).expect("mock response")
    }
}

/// A request as the server received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

struct ServerState {
    response: MockResponse,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(response: MockResponse) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(ServerState {
            response,
            requests: Arc::clone(&requests),
        });
        let app = Router::new().fallback(respond).with_state(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock server error");
            }
        });

        Self { addr, requests, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// Records before responding so `requests()` is complete once the client has its answer.
async fn respond(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    state.requests.lock().expect("request log").push(RecordedRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body: body.to_vec(),
    });

    state.response.to_response()
}

/// An address nothing is listening on
pub async fn refused_url(path: &str) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{}{}", addr, path)
}
