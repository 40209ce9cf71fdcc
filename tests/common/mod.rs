#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ai_web_scraper::config::Config;
use ai_web_scraper::llm::GeminiClient;
use ai_web_scraper::scraper::ScrapeClient;
use ai_web_scraper::workflow::Workflow;

pub const SERPER_KEY: &str = "test-serper-key";
pub const GEMINI_KEY: &str = "test-gemini-key";
pub const MODEL: &str = "gemini-2.0-flash-exp";

/// Request bodies a mock service received, in arrival order.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Value>>>);

impl Recorder {
    pub fn bodies(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Value {
        self.bodies().pop().expect("no request recorded")
    }

    fn push(&self, body: Value) {
        self.0.lock().unwrap().push(body);
    }
}

#[derive(Clone)]
struct MockReply {
    status: StatusCode,
    body: Value,
    delay: Duration,
    recorder: Recorder,
}

pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An address nothing is listening on.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn scrape_handler(
    State(reply): State<MockReply>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    reply.recorder.push(body);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    if headers.get("X-API-KEY").and_then(|v| v.to_str().ok()) != Some(SERPER_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad key"})));
    }
    (reply.status, Json(reply.body))
}

async fn gemini_handler(
    State(reply): State<MockReply>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    reply.recorder.push(json!({"call": call, "body": body}));
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(GEMINI_KEY) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": {"message": "API key not valid"}})));
    }
    (reply.status, Json(reply.body))
}

pub async fn scrape_service(status: StatusCode, body: Value) -> (String, Recorder) {
    scrape_service_with_delay(status, body, Duration::ZERO).await
}

pub async fn scrape_service_with_delay(status: StatusCode, body: Value, delay: Duration) -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new().route("/", post(scrape_handler)).with_state(MockReply {
        status,
        body,
        delay,
        recorder: recorder.clone(),
    });
    (spawn(router).await, recorder)
}

pub async fn gemini_service(status: StatusCode, body: Value) -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/v1beta/models/:call", post(gemini_handler))
        .with_state(MockReply {
            status,
            body,
            delay: Duration::ZERO,
            recorder: recorder.clone(),
        });
    (spawn(router).await, recorder)
}

pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

pub fn scrape_client(base: &str) -> ScrapeClient {
    ScrapeClient::new(SERPER_KEY, format!("{}/", base), Duration::from_secs(5)).unwrap()
}

pub fn gemini_client(base: &str) -> GeminiClient {
    GeminiClient::new(GEMINI_KEY, base, MODEL)
}

pub fn workflow(scrape_base: &str, gemini_base: &str, max_chunk_length: usize) -> Workflow {
    Workflow::new(scrape_client(scrape_base), gemini_client(gemini_base), max_chunk_length)
}

pub fn config(scrape_base: &str, gemini_base: &str) -> Config {
    let scrape_url = format!("{}/", scrape_base);
    let gemini_base = gemini_base.to_string();
    Config::from_lookup(move |key| match key {
        "SERPER_API_KEY" => Some(SERPER_KEY.to_string()),
        "GEMINI_API_KEY" => Some(GEMINI_KEY.to_string()),
        "SERPER_SCRAPE_URL" => Some(scrape_url.clone()),
        "GEMINI_API_BASE" => Some(gemini_base.clone()),
        "SCRAPE_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

/// The prompt text sent in the most recent generation request.
pub fn sent_prompt(recorder: &Recorder) -> String {
    recorder.last()["body"]["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string()
}
