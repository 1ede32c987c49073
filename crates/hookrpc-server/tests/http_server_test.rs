//! HTTP Server Integration Tests
//!
//! Runs the HTTP adapter on an ephemeral port and talks to it with
//! reqwest.

use hookrpc_common::protocol::{CallArgs, RpcValue};
use hookrpc_server::{Dispatcher, HttpServer, MethodRegistry, Namespace, INTERNAL_ERROR_MESSAGE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn start_server() -> String {
    let mut methods = MethodRegistry::new();
    methods.register(
        "Text",
        Namespace::new().service_method("shout", |args: &CallArgs| {
            let text: String = args.arg_as(0, "text")?;
            Ok(RpcValue::from(text.to_uppercase()))
        }),
    );
    serve_methods(methods).await
}

async fn serve_methods(methods: MethodRegistry) -> String {
    let dispatcher = Arc::new(Dispatcher::new(methods));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(HttpServer::new(dispatcher).serve(listener));
    url
}

#[tokio::test]
async fn test_post_returns_envelope() {
    let url = start_server().await;
    let response = Client::new()
        .post(&url)
        .json(&json!({"jsonrpc": "2.0", "method": "Text.shout", "params": ["hi"], "id": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"jsonrpc": "2.0", "id": 1, "result": "HI"}));
}

#[tokio::test]
async fn test_notification_is_no_content() {
    let url = start_server().await;
    let response = Client::new()
        .post(&url)
        .json(&json!({"jsonrpc": "2.0", "method": "Text.shout", "params": ["hi"]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_is_rejected() {
    let url = start_server().await;
    let response = Client::new().get(&url).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], json!(-32600));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let url = start_server().await;
    let response = Client::new()
        .post(&url)
        .body("{\"jsonrpc\":")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], json!(-32700));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let url = start_server().await;
    let client = Client::new();

    let calls = (0..16).map(|i| {
        let client = client.clone();
        let url = url.clone();
        async move {
            let body: Value = client
                .post(&url)
                .json(&json!({"jsonrpc": "2.0", "method": "Text.shout",
                              "params": {"text": format!("m{i}")}, "id": i}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            (i, body)
        }
    });

    let handles: Vec<_> = calls.map(tokio::spawn).collect();
    for handle in handles {
        let (i, body) = handle.await.unwrap();
        assert_eq!(body["id"], json!(i));
        assert_eq!(body["result"], json!(format!("M{i}")));
    }
}

#[tokio::test]
async fn test_panicking_method_hides_payload() {
    let mut methods = MethodRegistry::new();
    methods.register_default(
        Namespace::new().service_method("boom", |_args: &CallArgs| -> anyhow::Result<RpcValue> {
            panic!("kaboom")
        }),
    );
    let url = serve_methods(methods).await;

    let response = Client::new()
        .post(&url)
        .json(&json!({"jsonrpc": "2.0", "method": "boom", "id": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = response.text().await.unwrap();
    assert!(!text.contains("kaboom"), "{text}");
    assert!(!text.contains("panicked"), "{text}");

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["code"], json!(-32603));
    assert_eq!(body["error"], json!(INTERNAL_ERROR_MESSAGE));
    assert!(body.get("data").is_none());
}
