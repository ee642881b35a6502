//! Integration tests for remote reply resolution.
//!
//! Runs the HTTP backend against mock servers and checks that every failure
//! mode degrades to the local catalog reply.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use dvnc_chat::{
    ChatBackend, ConversationSession, HttpChatBackend, RecordingDriver, RemoteResolutionError,
    ResolverConfig, ResponseCatalog, ResponseResolver, ResponseRule, SubmitOutcome,
};

fn catalog() -> ResponseCatalog {
    ResponseCatalog::new(
        vec![ResponseRule::new(["hello", "hi"], "Greetings!").unwrap()],
        "I don't understand.",
    )
    .unwrap()
}

fn resolver_for(server: &MockServer, timeout: Duration) -> ResponseResolver {
    let backend = HttpChatBackend::new(timeout).unwrap();
    ResponseResolver::new(catalog())
        .with_backend(Arc::new(backend))
        .with_timeout(timeout)
        .with_config(ResolverConfig::remote(&format!("{}/api/chat", server.uri())).unwrap())
}

#[tokio::test]
async fn test_remote_reply_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "message": "Hi there" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "X" })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, Duration::from_secs(5));
    assert_eq!(resolver.resolve("Hi there").await, "X");
}

#[tokio::test]
async fn test_http_500_falls_back_to_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, Duration::from_secs(5));
    assert_eq!(resolver.resolve("Hi there").await, "Greetings!");
    assert_eq!(
        resolver.resolve("What time is it?").await,
        "I don't understand."
    );
}

#[tokio::test]
async fn test_missing_response_field_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "X" })))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, Duration::from_secs(5));
    assert_eq!(resolver.resolve("hello").await, "Greetings!");
}

#[tokio::test]
async fn test_empty_response_field_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "" })))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, Duration::from_secs(5));
    assert_eq!(resolver.resolve("hello").await, "Greetings!");
}

#[tokio::test]
async fn test_malformed_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, Duration::from_secs(5));
    assert_eq!(resolver.resolve("hello").await, "Greetings!");
}

#[tokio::test]
async fn test_slow_endpoint_times_out_and_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let resolver = resolver_for(&server, Duration::from_millis(200));
    let start = std::time::Instant::now();
    assert_eq!(resolver.resolve("hello").await, "Greetings!");
    assert!(start.elapsed() < Duration::from_secs(5));
}

/// An address nothing listens on: bind an ephemeral port, then release it.
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/chat", port)
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    let backend = HttpChatBackend::new(Duration::from_secs(2)).unwrap();
    let result = backend.send(&closed_port_uri(), "hello").await;
    assert!(
        matches!(result, Err(RemoteResolutionError::Network(_))),
        "expected a network error, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_falls_back() {
    let backend = HttpChatBackend::new(Duration::from_secs(2)).unwrap();
    let resolver = ResponseResolver::new(catalog())
        .with_backend(Arc::new(backend))
        .with_config(ResolverConfig::remote(&closed_port_uri()).unwrap());

    assert_eq!(resolver.resolve("hello").await, "Greetings!");
}

#[tokio::test]
async fn test_session_uses_remote_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": "From the workshop." })),
        )
        .mount(&server)
        .await;

    let resolver = Arc::new(resolver_for(&server, Duration::from_secs(5)));
    let driver = Arc::new(RecordingDriver::new());
    let session = ConversationSession::new(resolver, driver.clone()).with_think_delay(Duration::ZERO);

    let outcome = session.submit("Tell me about flight").await.unwrap();
    match outcome {
        SubmitOutcome::Replied(message) => assert_eq!(message.text, "From the workshop."),
        SubmitOutcome::Discarded => panic!("reply should not be discarded"),
    }
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn test_switching_endpoint_at_runtime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "v2" })))
        .mount(&server)
        .await;

    let resolver = ResponseResolver::new(catalog())
        .with_backend(Arc::new(HttpChatBackend::new(Duration::from_secs(5)).unwrap()));
    assert_eq!(resolver.resolve("hello").await, "Greetings!");

    resolver
        .use_endpoint(&format!("{}/v2/chat", server.uri()))
        .unwrap();
    assert_eq!(resolver.resolve("hello").await, "v2");
}
