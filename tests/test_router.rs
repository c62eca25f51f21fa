mod common;

use common::{closed_addr, spawn_fake_relay, test_config, test_state};
use postbox::config::Config;
use postbox::http::pages;
use postbox::http::request::{Method, Request};
use postbox::http::response::StatusCode;
use postbox::http::router::{not_found, route, AppState};
use postbox::http::writer::serialize_response;
use std::path::PathBuf;
use std::sync::Arc;

fn get(path: &str) -> Request {
    Request {
        method: Method::GET,
        path: path.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: vec![],
        body: vec![],
    }
}

fn post(path: &str, body: &str) -> Request {
    Request {
        method: Method::POST,
        path: path.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: vec![
            ("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
        body: body.as_bytes().to_vec(),
    }
}

#[tokio::test]
async fn test_index_aliases_are_byte_identical() {
    let state = test_state(closed_addr().await);

    let root = route(&get("/"), &state).await;
    let index = route(&get("/index.html"), &state).await;

    assert_eq!(root.status, StatusCode::Ok);
    assert_eq!(serialize_response(&root), serialize_response(&index));
}

#[tokio::test]
async fn test_message_form_aliases() {
    let state = test_state(closed_addr().await);

    let a = route(&get("/message"), &state).await;
    let b = route(&get("/message.html"), &state).await;

    assert_eq!(a.status, StatusCode::Ok);
    assert_eq!(a.header("Content-Type"), Some("text/html; charset=utf-8"));
    assert_eq!(a.body, b.body);
    assert!(String::from_utf8_lossy(&a.body).contains(r#"action="/message""#));
}

#[tokio::test]
async fn test_fixed_assets() {
    let state = test_state(closed_addr().await);

    let css = route(&get("/style.css"), &state).await;
    assert_eq!(css.status, StatusCode::Ok);
    assert_eq!(css.header("Content-Type"), Some("text/css; charset=utf-8"));

    let logo = route(&get("/logo.png"), &state).await;
    assert_eq!(logo.status, StatusCode::Ok);
    assert_eq!(logo.header("Content-Type"), Some("image/png"));
    assert!(logo.body.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn test_static_file() {
    let state = test_state(closed_addr().await);

    let js = route(&get("/static/app.js"), &state).await;

    assert_eq!(js.status, StatusCode::Ok);
    assert_eq!(js.header("Content-Type"), Some("application/javascript"));
    assert_eq!(js.header("Content-Length"), Some(js.body.len().to_string().as_str()));
}

#[tokio::test]
async fn test_static_missing_file() {
    let state = test_state(closed_addr().await);

    let response = route(&get("/static/nope.css"), &state).await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_static_directory_is_not_found() {
    let state = test_state(closed_addr().await);

    let response = route(&get("/static/"), &state).await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_static_parent_traversal_is_not_found() {
    let state = test_state(closed_addr().await);

    let response = route(&get("/static/../Cargo.toml"), &state).await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_unknown_path_uses_error_document() {
    let state = test_state(closed_addr().await);

    let response = route(&get("/nonexistent"), &state).await;
    let error_doc = std::fs::read(common::assets_root().join("templates/error.html")).unwrap();

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, error_doc);
    assert_eq!(response.header("Content-Length"), Some(error_doc.len().to_string().as_str()));
}

#[tokio::test]
async fn test_not_found_fallback_when_error_document_missing() {
    let mut cfg = Config::default();
    cfg.assets.root = PathBuf::from("/nonexistent/postbox-assets");

    let response = not_found(&cfg.assets).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, pages::NOT_FOUND_FALLBACK.as_bytes());
    assert_eq!(response.header("Content-Length"), Some("22"));
}

#[tokio::test]
async fn test_missing_fixed_asset_is_not_found() {
    let mut cfg = test_config(closed_addr().await);
    cfg.assets.root = PathBuf::from("/nonexistent/postbox-assets");
    let state = AppState::new(Arc::new(cfg));

    let response = route(&get("/"), &state).await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_other_methods_are_not_found() {
    let state = test_state(closed_addr().await);

    let mut req = get("/");
    req.method = Method::DELETE;
    assert_eq!(route(&req, &state).await.status, StatusCode::NotFound);

    req.method = Method::HEAD;
    assert_eq!(route(&req, &state).await.status, StatusCode::NotFound);

    // POST only routes /message.
    let response = route(&post("/index.html", "a=b"), &state).await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_paths_match_case_sensitively() {
    let state = test_state(closed_addr().await);

    let response = route(&get("/Index.html"), &state).await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_submit_success() {
    let state = test_state(spawn_fake_relay("SUCCESS").await);

    let response = route(&post("/message", "username=alice&message=hi"), &state).await;
    let body = String::from_utf8(response.body.clone()).unwrap();

    assert_eq!(response.status, StatusCode::Ok);
    assert!(body.contains(r#"<a href="/message">"#));
    assert_eq!(body, pages::SUBMIT_SUCCESS);
}

#[tokio::test]
async fn test_submit_rejected_by_peer() {
    let state = test_state(spawn_fake_relay("ERROR").await);

    let response = route(&post("/message", "username=alice&message=hi"), &state).await;

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.body, pages::SUBMIT_FAILURE.as_bytes());
}

#[tokio::test]
async fn test_submit_unknown_reply_is_failure() {
    let state = test_state(spawn_fake_relay("OK").await);

    let response = route(&post("/message", "username=alice&message=hi"), &state).await;
    assert_eq!(response.status, StatusCode::InternalServerError);
}

#[tokio::test]
async fn test_submit_peer_unreachable() {
    let state = test_state(closed_addr().await);

    let response = route(&post("/message", "username=alice&message=hi"), &state).await;

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.body, pages::SUBMIT_FAILURE.as_bytes());
}

#[tokio::test]
async fn test_submit_non_utf8_body_is_server_error() {
    let state = test_state(spawn_fake_relay("SUCCESS").await);

    let mut req = post("/message", "");
    req.body = b"username=\xff".to_vec();

    let response = route(&req, &state).await;

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.body, pages::SERVER_ERROR.as_bytes());
}

#[tokio::test]
async fn test_submit_empty_form_still_relays() {
    let state = test_state(spawn_fake_relay("SUCCESS").await);

    let response = route(&post("/message", ""), &state).await;
    assert_eq!(response.status, StatusCode::Ok);
}
