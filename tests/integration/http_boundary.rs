//! Integration tests for the relay's HTTP surface.
//!
//! Covers the transport details browsers depend on rather than signaling
//! semantics: CORS preflight, method handling, body parsing and the
//! diagnostic endpoints.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use signalpost_relay::relay::RelayService;

async fn start_relay() -> (String, tokio::task::JoinHandle<()>) {
    let (addr, handle) = signalpost_relay::server::start_server("127.0.0.1:0")
        .await
        .expect("failed to start relay server");
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn preflight_is_permissive() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let resp = client
        .request(Method::OPTIONS, format!("{base}/"))
        .header("Origin", "https://app.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type, X-User-Id");
    assert_eq!(headers["access-control-max-age"], "86400");
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn every_reply_carries_cors_origin() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let ok = client
        .post(format!("{base}/"))
        .json(&json!({ "type": "join", "from": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.headers()["access-control-allow-origin"], "*");

    let bad = client
        .post(format!("{base}/"))
        .json(&json!({ "type": "bogus", "from": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bad.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn unsupported_methods_rejected() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
        let resp = client
            .request(method.clone(), format!("{base}/"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        if method != Method::HEAD {
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body, json!({ "error": "Method not allowed" }));
        }
    }
}

#[tokio::test]
async fn head_leaves_queue_intact() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let offer = json!({ "type": "offer", "from": "alice", "to": "bob", "data": { "sdp": "v=0" } });
    client
        .post(format!("{base}/"))
        .json(&offer)
        .send()
        .await
        .unwrap();

    let head = client
        .head(format!("{base}/?userId=bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(head.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body: Value = client
        .get(format!("{base}/?userId=bob"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "messages": [offer] }));
}

#[tokio::test]
async fn poll_without_user_id_rejected() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    for url in [format!("{base}/"), format!("{base}/?userId=")] {
        let resp = client.get(&url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "error": "userId required" }));
    }
}

#[tokio::test]
async fn repeated_user_id_rejected_as_json() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/?userId=a&userId=b"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Value = resp.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid query string")
    );
}

#[tokio::test]
async fn plain_text_body_is_parsed_as_json() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/"))
        .header("Content-Type", "text/plain")
        .body(r#"{"type":"join","from":"alice","roomId":"r1"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "participants": ["alice"] }));
}

#[tokio::test]
async fn malformed_json_rejected() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("invalid JSON body"));
}

#[tokio::test]
async fn empty_body_reports_missing_type() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    let resp = client.post(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "type required" }));
}

#[tokio::test]
async fn oversized_body_rejected() {
    let (addr, _handle) = signalpost_relay::server::start_server_with_state(
        "127.0.0.1:0",
        Arc::new(RelayService::new()),
        1024,
    )
    .await
    .unwrap();
    let client = reqwest::Client::new();

    let big = json!({
        "type": "offer",
        "from": "alice",
        "to": "bob",
        "data": "x".repeat(4096),
    });
    let resp = client
        .post(format!("http://{addr}/"))
        .json(&big)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let stats: Value = client
        .get(format!("http://{addr}/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["queued_envelopes"], 0);
}

#[tokio::test]
async fn stats_track_rooms_and_queues() {
    let (base, _handle) = start_relay().await;
    let client = reqwest::Client::new();

    for peer in ["alice", "bob"] {
        client
            .post(format!("{base}/"))
            .json(&json!({ "type": "join", "from": peer, "roomId": "r1" }))
            .send()
            .await
            .unwrap();
    }
    for i in 0..3 {
        client
            .post(format!("{base}/"))
            .json(&json!({ "type": "ice-candidate", "from": "alice", "to": "bob", "data": i }))
            .send()
            .await
            .unwrap();
    }

    let stats: Value = client
        .get(format!("{base}/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        stats,
        json!({
            "rooms": 1,
            "participants": 2,
            "largest_room": 2,
            "queues": 1,
            "queued_envelopes": 3,
            "largest_queue": 3,
        })
    );
}

#[tokio::test]
async fn health_check() {
    let (base, _handle) = start_relay().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}
