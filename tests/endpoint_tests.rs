//! Endpoint calls against a local mock server.

use std::time::{Duration, Instant};

use battle_client::harness::{run_chat, run_command, run_ollama_test};
use battle_client::Config;
use battle_client::transport::Transport;
use battle_client::{ChatReply, ClientError, Reporter, Scenario};
use mockito::Matcher;
use serde_json::json;
mod common;

#[ctor::ctor]
fn _init() { common::init(); }

fn buffers() -> Reporter<Vec<u8>, Vec<u8>> {
    Reporter::new(Vec::new(), Vec::new())
}

fn stderr_of(r: Reporter<Vec<u8>, Vec<u8>>) -> String {
    String::from_utf8(r.into_inner().1).unwrap()
}

#[test]
fn ollama_test_sends_encoded_prompt() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/ollama_test")
        .match_query(Matcher::UrlEncoded("prompt".into(), "적 전차 & 병사 #2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(common::response_body("hi"))
        .expect(1)
        .create();

    let mut reporter = buffers();
    let reply = run_ollama_test(
        &Transport::new(),
        &mut reporter,
        &server.url(),
        "적 전차 & 병사 #2",
        Duration::from_secs(30),
    )
    .unwrap();

    mock.assert();
    assert_eq!(reply, ChatReply::Text("hi".into()));
    let (out, err) = reporter.into_inner();
    assert!(String::from_utf8(out).unwrap().contains("hi"));
    assert!(err.is_empty());
}

#[test]
fn ollama_test_unwraps_fenced_reply() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/ollama_test")
        .match_query(Matcher::Any)
        .with_body(common::response_body("```json\n{\"robot1\":\"소총\"}\n```"))
        .create();

    let mut reporter = buffers();
    let reply = run_ollama_test(&Transport::new(), &mut reporter, &server.url(), "hi", Duration::from_secs(10)).unwrap();
    assert_eq!(reply, ChatReply::Json(json!({"robot1": "소총"})));
}

#[test]
fn chat_prints_body_verbatim() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/chat")
        .match_query(Matcher::UrlEncoded("prompt".into(), "just say hi".into()))
        .with_body("not json at all")
        .create();

    let mut reporter = buffers();
    let body = run_chat(&Transport::new(), &mut reporter, &server.url(), "just say hi", Duration::from_secs(10)).unwrap();
    assert_eq!(body, b"not json at all");
    let (out, _) = reporter.into_inner();
    assert!(String::from_utf8(out).unwrap().contains("not json at all"));
}

#[test]
fn command_posts_state_as_json() {
    let state = Scenario::Case2.battle_state();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/command")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "state": state })))
        .with_body(common::response_body(
            "```json\n{\"robot1\":\"소총\",\"robot2\":\"소총\",\"robot3\":\"대기\",\"description\":\"소규모\"}\n```",
        ))
        .expect(1)
        .create();

    let mut reporter = buffers();
    let decision = run_command(
        &Transport::new(),
        &mut reporter,
        &server.url(),
        "POST /command case 2",
        state,
        Duration::from_secs(30),
    )
    .unwrap();

    mock.assert();
    assert_eq!(decision.description(), Some("소규모"));
    assert_eq!(decision.actions().len(), 3);
    assert!(stderr_of(reporter).is_empty());
}

#[test]
fn command_plain_reply_is_inner_error_with_echo() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/command")
        .with_body(common::response_body("hello"))
        .create();

    let mut reporter = buffers();
    let err = run_command(
        &Transport::new(),
        &mut reporter,
        &server.url(),
        "POST /command case 1",
        Scenario::Case1.battle_state(),
        Duration::from_secs(30),
    )
    .unwrap_err();

    assert!(matches!(&err, ClientError::InnerParse { raw, .. } if raw == "hello"));
    let err_out = stderr_of(reporter);
    assert!(err_out.contains("inner_parse failed"));
    assert!(err_out.contains(r#"{"response":"hello"}"#));
}

#[test]
fn error_page_is_outer_error_and_not_retried() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/command")
        .with_status(502)
        .with_header("content-type", "text/html")
        .with_body("<html>Bad Gateway</html>")
        .expect(1)
        .create();

    let mut reporter = buffers();
    let err = run_command(
        &Transport::new(),
        &mut reporter,
        &server.url(),
        "POST /command case 1",
        Scenario::Case1.battle_state(),
        Duration::from_secs(30),
    )
    .unwrap_err();

    mock.assert();
    assert_eq!(err.stage(), "outer_parse");
    assert!(stderr_of(reporter).contains("<html>Bad Gateway</html>"));
}

#[test]
fn unreachable_host_fails_within_budget() {
    // 10.255.255.1 is non-routable: either the connect hangs until the
    // timeout or the network stack rejects it immediately.
    let timeout = Duration::from_secs(2);
    let started = Instant::now();
    let mut reporter = buffers();
    let err = run_chat(&Transport::new(), &mut reporter, "http://10.255.255.1:81", "hi", timeout).unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.stage(), "transport", "{err}");
    assert!(elapsed < timeout + Duration::from_secs(3), "took {elapsed:?}");
    assert!(stderr_of(reporter).contains("transport failed"));
}

#[test]
fn chat_gives_up_after_its_timeout() {
    let base = common::stalling_server();
    let timeout = Duration::from_secs(2);
    let started = Instant::now();
    let mut reporter = buffers();
    let err = run_chat(&Transport::new(), &mut reporter, &base, "hi", timeout).unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.stage(), "transport", "{err}");
    assert!(elapsed >= timeout, "returned early after {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_secs(3), "took {elapsed:?}");
}

#[test]
fn ollama_test_gives_up_after_its_timeout() {
    let base = common::stalling_server();
    let timeout = Duration::from_secs(1);
    let started = Instant::now();
    let mut reporter = buffers();
    let err = run_ollama_test(&Transport::new(), &mut reporter, &base, "hi", timeout).unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.stage(), "transport", "{err}");
    assert!(elapsed >= timeout, "returned early after {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_secs(3), "took {elapsed:?}");
}

#[test]
fn command_uses_configured_timeout() {
    let base = common::stalling_server();
    let config = Config { command_timeout_secs: 2, ..Config::default() };
    let started = Instant::now();
    let mut reporter = buffers();
    let err = run_command(
        &Transport::new(),
        &mut reporter,
        &base,
        "POST /command case 1",
        Scenario::Case1.battle_state(),
        config.command_timeout(),
    )
    .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.stage(), "transport", "{err}");
    assert!(elapsed >= config.command_timeout(), "returned early after {elapsed:?}");
    assert!(elapsed < config.command_timeout() + Duration::from_secs(3), "took {elapsed:?}");
    assert!(stderr_of(reporter).contains("transport failed"));
}
