//! Mock Anthropic Messages API for integration tests
//!
//! Replays scripted replies in order and records every request it receives

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use parley_anthropic::{AnthropicChatCompleter, AnthropicClient, ChatCompleterOptions, ClientOptions};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use url::Url;

/// API key the mock expects
pub const TEST_API_KEY: &str = "test-key";

/// One scripted reply
pub enum Reply {
    /// `200 OK` with a server-sent event body
    Sse(String),
    /// Error status with a JSON body
    Status(StatusCode, serde_json::Value),
}

/// Request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub api_key: Option<String>,
    pub version: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Anthropic server bound to a random local port
pub struct MockAnthropic {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockAnthropic {
    /// Start a server that answers with `replies`, one per request
    pub async fn start(replies: Vec<Reply>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        });

        let app = Router::new()
            .route("/v1/messages", routing::post(handle_messages))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including `/v1`, as the client appends `/messages`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// Completer talking to this mock
    pub fn completer(&self, options: ChatCompleterOptions) -> AnthropicChatCompleter {
        let client = AnthropicClient::new(ClientOptions {
            api_key: SecretString::from(TEST_API_KEY),
            base_url: Some(Url::parse(&self.base_url()).unwrap()),
        })
        .unwrap();

        client.chat_completer(options)
    }
}

impl Drop for MockAnthropic {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);

    state.requests.lock().unwrap().push(RecordedRequest {
        api_key: header("x-api-key"),
        version: header("anthropic-version"),
        body,
    });

    let reply = state.replies.lock().unwrap().pop_front();

    match reply {
        Some(Reply::Sse(body)) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
            body,
        )
            .into_response(),
        Some(Reply::Status(status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "type": "error",
                "error": {"type": "api_error", "message": "no scripted reply left"}
            })),
        )
            .into_response(),
    }
}
