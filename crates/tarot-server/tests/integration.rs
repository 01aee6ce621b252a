//! End-to-end tests against a real listener.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use tarot_core::DeliveryMode;
use tarot_runtime::RelayConfig;
use tarot_server::{ServerConfig, TarotServer};
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn boot(mode: DeliveryMode, workflow_url: Option<String>) -> (String, TarotServer) {
    let config = ServerConfig {
        workflow_url,
        heartbeat_interval_secs: 1,
        ..ServerConfig::default()
    };
    let relay = RelayConfig {
        mode,
        ..RelayConfig::default()
    };
    let server = TarotServer::new(config, relay).unwrap();
    let addr: SocketAddr = server.listen().await.unwrap();
    (format!("http://{addr}"), server)
}

/// Reads `data:` payloads out of an SSE byte stream.
struct SseReader<S> {
    inner: S,
    buf: String,
}

impl<S> SseReader<S>
where
    S: futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
{
    fn new(inner: S) -> Self {
        Self {
            inner,
            buf: String::new(),
        }
    }

    /// Next data payload, skipping keep-alive comments. `None` at end of stream.
    async fn next_data(&mut self) -> Option<String> {
        loop {
            while let Some(end) = self.buf.find("\n\n") {
                let block: String = self.buf.drain(..end + 2).collect();
                let data: Vec<&str> = block
                    .lines()
                    .filter_map(|l| l.strip_prefix("data:"))
                    .map(str::trim_start)
                    .collect();
                if !data.is_empty() {
                    return Some(data.join("\n"));
                }
            }
            let chunk = timeout(TIMEOUT, self.inner.next()).await.ok()??.ok()?;
            self.buf.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

async fn open_events(
    base: &str,
    session: &str,
) -> SseReader<impl futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin> {
    let resp = reqwest::get(format!("{base}/events/{session}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/event-stream");
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    let mut reader = SseReader::new(Box::pin(resp.bytes_stream()));
    assert_eq!(reader.next_data().await.unwrap(), r#"{"status":"connected"}"#);
    reader
}

async fn push(base: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/push"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn push_mode_frame_reaches_only_its_session() {
    let (base, server) = boot(DeliveryMode::Push, None).await;
    let mut s = open_events(&base, "S").await;
    let mut other = open_events(&base, "T").await;

    let (status, body) = push(&base, json!({"sessionId": "S", "text": "hi"})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true}));

    assert_eq!(s.next_data().await.unwrap(), r#"{"sessionId":"S","text":"hi"}"#);

    let (status, _) = push(&base, json!({"sessionId": "T", "spread_html": "<p/>"})).await;
    assert_eq!(status, 200);
    assert_eq!(
        other.next_data().await.unwrap(),
        r#"{"sessionId":"T","spread_html":"<p/>"}"#
    );
    assert!(server.hub().messages("S").is_empty());
}

#[tokio::test]
async fn disconnect_unregisters_and_push_mode_then_404s() {
    let (base, server) = boot(DeliveryMode::Push, None).await;
    let reader = open_events(&base, "S").await;
    assert!(server.hub().registry().has("S"));

    drop(reader);
    let hub = server.hub().clone();
    wait_for(|| !hub.registry().has("S")).await;

    let (status, body) = push(&base, json!({"sessionId": "S", "text": "late"})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "No active client");
}

#[tokio::test]
async fn reconnect_supersedes_and_ends_old_stream() {
    let (base, server) = boot(DeliveryMode::Hybrid, None).await;
    let mut first = open_events(&base, "S").await;
    let mut second = open_events(&base, "S").await;

    assert!(first.next_data().await.is_none());
    assert_eq!(server.hub().registry().len(), 1);

    let _ = push(&base, json!({"sessionId": "S", "text": "fresh"})).await;
    assert_eq!(second.next_data().await.unwrap(), r#"{"sessionId":"S","text":"fresh"}"#);
    assert!(server.hub().registry().has("S"));
}

#[tokio::test]
async fn hybrid_pushes_and_polls() {
    let (base, _server) = boot(DeliveryMode::Hybrid, None).await;
    let mut reader = open_events(&base, "X").await;

    let _ = push(&base, json!({"sessionId": "X", "text": "Reply"})).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = push(&base, json!({"sessionId": "X", "spread_html": "<div>cards</div>"})).await;

    assert_eq!(reader.next_data().await.unwrap(), r#"{"sessionId":"X","text":"Reply"}"#);
    assert_eq!(
        reader.next_data().await.unwrap(),
        r#"{"sessionId":"X","spread_html":"<div>cards</div>"}"#
    );

    let body: Value = reqwest::get(format!("{base}/messages/X"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "Reply");
    assert_eq!(messages[0]["spread_html"], "<div>cards</div>");
}

#[tokio::test]
async fn mailbox_keeps_last_hundred() {
    let (base, _server) = boot(DeliveryMode::Poll, None).await;
    for i in 0..101 {
        let (status, _) = push(&base, json!({"sessionId": "M", "text": format!("m{i}")})).await;
        assert_eq!(status, 200);
    }
    let body: Value = reqwest::get(format!("{base}/messages?sessionId=M"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 100);
    assert_eq!(messages[0]["text"], "m1");
    assert_eq!(messages[99]["text"], "m100");
}

#[tokio::test]
async fn keep_alive_comments_flow() {
    let (base, _server) = boot(DeliveryMode::Hybrid, None).await;
    let resp = reqwest::get(format!("{base}/events/K")).await.unwrap();
    let mut stream = Box::pin(resp.bytes_stream());
    let mut seen = String::new();
    timeout(TIMEOUT, async {
        while !seen.contains("\n\n:") {
            let chunk = stream.next().await.unwrap().unwrap();
            seen.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await
    .unwrap();
    assert!(seen.starts_with("data: {\"status\":\"connected\"}"));
}

#[tokio::test]
async fn tarot_chat_proxies_to_workflow() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/tarot-chat"))
        .respond_with(ResponseTemplate::new(202).set_body_raw(r#"{"queued":true}"#, "application/json"))
        .expect(1)
        .mount(&upstream)
        .await;

    let url = format!("{}/webhook/tarot-chat", upstream.uri());
    let (base, _server) = boot(DeliveryMode::Hybrid, Some(url)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/webhook/tarot-chat"))
        .json(&json!({"body": {"question": "Will it rain?", "sessionId": "Q"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(resp.text().await.unwrap(), r#"{"queued":true}"#);
}

#[tokio::test]
async fn tarot_chat_unreachable_workflow_is_500() {
    let (base, _server) = boot(DeliveryMode::Hybrid, Some("http://127.0.0.1:9/hook".into())).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/webhook/tarot-chat"))
        .json(&json!({"body": {"question": "q", "sessionId": "Q"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Proxy error: "));
}

#[tokio::test]
async fn shutdown_ends_open_streams() {
    let (base, server) = boot(DeliveryMode::Hybrid, None).await;
    let mut reader = open_events(&base, "S").await;

    server.shutdown().graceful_shutdown(Some(Duration::from_secs(2))).await;
    assert!(reader.next_data().await.is_none());
    assert!(server.hub().registry().is_empty());
}
