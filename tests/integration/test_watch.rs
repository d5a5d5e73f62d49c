//! End-to-end tests for the review-watch poll loop.
//!
//! Each test starts an in-process fake of both the homework status API and
//! the Telegram Bot API, then drives the real HTTP clients through
//! `Watcher::run_cycle_at` so cursor values are deterministic.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use review_watch::{Config, Credentials, CycleOutcome, PollState, Watcher};
use review_watch_http::{PracticumClient, TelegramNotifier};
use serde_json::{json, Value};

const HOMEWORK_PATH: &str = "/api/user_api/homework_statuses/";
const BOT_TOKEN: &str = "123456:bot-token";
const CHAT_ID: &str = "4242";

// ============================================================================
// Fake upstreams
// ============================================================================

/// One scripted answer of the fake homework API.
#[derive(Clone)]
struct Scripted {
    status: StatusCode,
    body: String,
    delay: Duration,
}

impl Scripted {
    fn json(body: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct FakeState {
    scripted: Mutex<VecDeque<Scripted>>,
    /// `(from_date, authorization header)` of every homework request.
    requests: Mutex<Vec<(String, String)>>,
    /// `(bot token path segment, chat_id, text)` of every delivered message.
    messages: Mutex<Vec<(String, String, String)>>,
    bot_failures_left: Mutex<u32>,
}

#[derive(Clone, Default)]
struct Fake(Arc<FakeState>);

impl Fake {
    fn script(&self, answer: Scripted) {
        self.0.scripted.lock().expect("lock").push_back(answer);
    }

    fn homeworks(&self, name: &str, status: &str) {
        self.script(Scripted::json(&json!({
            "homeworks": [{
                "id": 124,
                "homework_name": name,
                "status": status,
                "reviewer_comment": "",
                "lesson_name": "Final project",
            }],
            "current_date": 1_581_604_970,
        })));
    }

    fn fail_bot(&self, count: u32) {
        *self.0.bot_failures_left.lock().expect("lock") = count;
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.0.requests.lock().expect("lock").clone()
    }

    fn texts(&self) -> Vec<String> {
        self.0
            .messages
            .lock()
            .expect("lock")
            .iter()
            .map(|(_, _, text)| text.clone())
            .collect()
    }
}

async fn homework_statuses(
    State(fake): State<Fake>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let from_date = query.get("from_date").cloned().unwrap_or_default();
    fake.0
        .requests
        .lock()
        .expect("lock")
        .push((from_date, authorization));

    let answer = fake
        .0
        .scripted
        .lock()
        .expect("lock")
        .pop_front()
        .unwrap_or_else(|| Scripted::json(&json!({"homeworks": []})));

    if !answer.delay.is_zero() {
        tokio::time::sleep(answer.delay).await;
    }

    (
        answer.status,
        [("content-type", "application/json")],
        answer.body,
    )
        .into_response()
}

async fn send_message(
    State(fake): State<Fake>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    {
        let mut failures_left = fake.0.bot_failures_left.lock().expect("lock");
        if *failures_left > 0 {
            *failures_left -= 1;
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({"ok": false, "description": "Bad Gateway"})),
            )
                .into_response();
        }
    }

    let chat_id = body["chat_id"].as_str().unwrap_or_default().to_string();
    let text = body["text"].as_str().unwrap_or_default().to_string();
    fake.0
        .messages
        .lock()
        .expect("lock")
        .push((bot, chat_id, text));

    Json(json!({"ok": true, "result": {"message_id": 1}})).into_response()
}

/// Spawns the fake upstreams and returns their base URL.
async fn spawn_fake(fake: Fake) -> String {
    let router = Router::new()
        .route(HOMEWORK_PATH, get(homework_statuses))
        .route("/:bot/sendMessage", post(send_message))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}")
}

type HttpWatcher = Watcher<PracticumClient, TelegramNotifier>;

/// Builds a watcher wired to the fake upstreams with the cursor at 1000.
async fn watcher() -> (HttpWatcher, Fake) {
    let fake = Fake::default();
    let base = spawn_fake(fake.clone()).await;

    let credentials =
        Credentials::new("practicum-token", BOT_TOKEN, CHAT_ID).expect("valid credentials");
    let config = Config::new(credentials)
        .with_endpoint(format!("{base}{HOMEWORK_PATH}"))
        .with_telegram_api(base)
        .with_retry_period(Duration::from_secs(1))
        .with_request_timeout(Duration::from_secs(1));
    config.validate().expect("valid config");

    let source = PracticumClient::from_config(&config).expect("client");
    let notifier = TelegramNotifier::from_config(&config).expect("notifier");
    let watcher = Watcher::new(&config, source, notifier).with_state(PollState::new(1000));

    (watcher, fake)
}

// ============================================================================
// Tests
// ============================================================================

/// Notifies on each transition and stays quiet while the status holds.
#[tokio::test]
async fn test_status_transitions_are_notified_once() {
    let (mut watcher, fake) = watcher().await;
    fake.homeworks("Project1", "approved");
    fake.homeworks("Project1", "approved");
    fake.homeworks("Project1", "rejected");

    let first = watcher.run_cycle_at(2000).await;
    assert!(matches!(first, CycleOutcome::Notified { .. }), "{first:?}");
    assert_eq!(fake.texts().len(), 1);
    assert!(fake.texts()[0].contains("\"Project1\""));
    assert!(fake.texts()[0].contains("the reviewer liked everything"));
    assert_eq!(watcher.state().last_status.as_deref(), Some("approved"));

    let second = watcher.run_cycle_at(3000).await;
    assert!(matches!(second, CycleOutcome::Unchanged { .. }), "{second:?}");
    assert_eq!(fake.texts().len(), 1);

    let third = watcher.run_cycle_at(4000).await;
    assert!(matches!(third, CycleOutcome::Notified { .. }), "{third:?}");
    assert_eq!(fake.texts().len(), 2);
    assert!(fake.texts()[1].contains("the reviewer has remarks"));
    assert_eq!(watcher.state().last_status.as_deref(), Some("rejected"));
}

/// Sends the OAuth header and the cursor as `from_date`.
#[tokio::test]
async fn test_request_carries_token_and_cursor() {
    let (mut watcher, fake) = watcher().await;
    fake.script(Scripted::json(&json!({"homeworks": []})));
    fake.script(Scripted::raw(StatusCode::INTERNAL_SERVER_ERROR, "{}"));
    fake.script(Scripted::json(&json!({"homeworks": []})));

    watcher.run_cycle_at(2000).await;
    watcher.run_cycle_at(3000).await;
    watcher.run_cycle_at(4000).await;

    let requests = fake.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|(_, auth)| auth == "OAuth practicum-token"));

    let cursors: Vec<&str> = requests.iter().map(|(from, _)| from.as_str()).collect();
    assert_eq!(cursors, vec!["1000", "2000", "2000"]);
    assert_eq!(watcher.state().cursor, 4000);
}

/// Messages go to the configured chat through the configured bot.
#[tokio::test]
async fn test_messages_reach_configured_chat() {
    let (mut watcher, fake) = watcher().await;
    fake.homeworks("hw_bot", "reviewing");

    watcher.run_cycle_at(2000).await;

    let messages = fake.0.messages.lock().expect("lock").clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, format!("bot{BOT_TOKEN}"));
    assert_eq!(messages[0].1, CHAT_ID);
    assert_eq!(
        messages[0].2,
        "Status changed for review \"hw_bot\". The work has been taken for review."
    );
}

/// An HTTP error is reported once, then the loop recovers.
#[tokio::test]
async fn test_http_error_reported_once_then_recovers() {
    let (mut watcher, fake) = watcher().await;
    fake.script(Scripted::raw(StatusCode::SERVICE_UNAVAILABLE, "{}"));
    fake.script(Scripted::raw(StatusCode::SERVICE_UNAVAILABLE, "{}"));
    fake.homeworks("Project1", "approved");

    let first = watcher.run_cycle_at(2000).await;
    let second = watcher.run_cycle_at(3000).await;
    let third = watcher.run_cycle_at(4000).await;

    assert!(matches!(first, CycleOutcome::Failed { reported: true, .. }));
    assert!(matches!(second, CycleOutcome::Failed { reported: false, .. }));
    assert!(matches!(third, CycleOutcome::Notified { .. }));

    let texts = fake.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].starts_with("Program malfunction: "));
    assert!(texts[0].contains("HTTP 503"));
    assert!(texts[1].contains("\"Project1\""));
}

/// A body that is not JSON is a schema failure.
#[tokio::test]
async fn test_invalid_json_body_is_reported() {
    let (mut watcher, fake) = watcher().await;
    fake.script(Scripted::raw(StatusCode::OK, "<html>maintenance</html>"));

    let outcome = watcher.run_cycle_at(2000).await;

    assert!(matches!(outcome, CycleOutcome::Failed { reported: true, .. }));
    assert!(fake.texts()[0].contains("not valid JSON"));
    assert_eq!(watcher.state().cursor, 1000);
}

/// A wrong response shape is a schema failure.
#[tokio::test]
async fn test_wrong_shape_is_reported() {
    let (mut watcher, fake) = watcher().await;
    fake.script(Scripted::json(&json!({"homeworks": "none"})));

    watcher.run_cycle_at(2000).await;

    let texts = fake.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("expected an array"));
}

/// A hanging API call is cut off by the request timeout.
#[tokio::test]
async fn test_slow_api_times_out() {
    let (mut watcher, fake) = watcher().await;
    fake.script(Scripted::json(&json!({"homeworks": []})).delayed(Duration::from_secs(3)));

    let outcome = watcher.run_cycle_at(2000).await;

    assert!(matches!(outcome, CycleOutcome::Failed { reported: true, .. }));
    assert!(fake.texts()[0].contains("unreachable"));
}

/// A rejected status message is retried on the next cycle.
#[tokio::test]
async fn test_bot_rejection_is_retried() {
    let (mut watcher, fake) = watcher().await;
    fake.homeworks("hw", "approved");
    fake.homeworks("hw", "approved");
    fake.fail_bot(1);

    let first = watcher.run_cycle_at(2000).await;
    assert!(matches!(first, CycleOutcome::DeliveryFailed { .. }), "{first:?}");
    assert!(fake.texts().is_empty());
    assert!(watcher.state().last_status.is_none());

    let second = watcher.run_cycle_at(3000).await;
    assert!(matches!(second, CycleOutcome::Notified { .. }), "{second:?}");
    assert_eq!(fake.texts().len(), 1);
}

/// The run loop keeps going after failures.
#[tokio::test]
async fn test_run_survives_failures() {
    let (watcher, fake) = watcher().await;
    fake.script(Scripted::raw(StatusCode::BAD_REQUEST, "{}"));
    fake.homeworks("Project1", "reviewing");

    let handle = tokio::spawn(watcher.run());

    // Retry period is one second; wait for both cycles.
    let delivered = tokio::time::timeout(Duration::from_secs(5), async {
        while fake.texts().len() < 2 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    assert!(delivered.is_ok(), "texts: {:?}", fake.texts());
    assert!(!handle.is_finished());
    handle.abort();

    let texts = fake.texts();
    assert!(texts[0].contains("HTTP 400"));
    assert!(texts[1].contains("\"Project1\""));
}
