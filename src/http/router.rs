//! Maps method and decoded path to a handler.
//!
//! | Method | Path                            | Handler                    |
//! |--------|---------------------------------|----------------------------|
//! | GET    | `/`, `/index.html`              | `templates/index.html`     |
//! | GET    | `/message`, `/message.html`     | `templates/message.html`   |
//! | GET    | `/style.css`, `/logo.png`       | fixed assets               |
//! | GET    | `/static/<path>`                | file under `static/`       |
//! | POST   | `/message`                      | submit via relay           |
//! | *      | anything else                   | 404                        |

use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::Arc;

use crate::config::{AssetsConfig, Config};
use crate::http::mime;
use crate::http::pages;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::relay::{RelayClient, RelayEnvelope, RelayStatus};

/// Shared, read-only state handed to every connection.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: RelayClient,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let relay = RelayClient::from_config(&config.relay);
        Self { config, relay }
    }
}

/// Failures inside the submit handler; answered with the server-error page.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("form body is not valid UTF-8")]
    InvalidEncoding,
}

pub async fn route(req: &Request, state: &AppState) -> Response {
    let assets = &state.config.assets;

    match (&req.method, req.path.as_str()) {
        (Method::GET, "/" | "/index.html") => {
            serve_file(&assets.template("index.html"), "text/html", assets).await
        }
        (Method::GET, "/message" | "/message.html") => {
            serve_file(&assets.template("message.html"), "text/html", assets).await
        }
        (Method::GET, "/style.css") => serve_file(&assets.file("style.css"), "text/css", assets).await,
        (Method::GET, "/logo.png") => serve_file(&assets.file("logo.png"), "image/png", assets).await,
        (Method::GET, path) if path.starts_with("/static/") => serve_static(path, assets).await,
        (Method::POST, "/message") => submit(req, &state.relay).await,
        _ => not_found(assets).await,
    }
}

async fn serve_static(path: &str, assets: &AssetsConfig) -> Response {
    let relative = Path::new(path.trim_start_matches('/'));

    if relative.components().any(|c| matches!(c, Component::ParentDir)) {
        tracing::warn!(path = %path, "Rejected static path outside the static directory");
        return not_found(assets).await;
    }

    let file = assets.root.join(relative);
    serve_file(&file, mime::from_path(&file), assets).await
}

/// Sends a file with the given MIME type, or 404 if it cannot be read.
pub async fn serve_file(path: &Path, mime: &str, assets: &AssetsConfig) -> Response {
    match tokio::fs::read(path).await {
        Ok(body) => {
            tracing::info!(file = %path.display(), bytes = body.len(), "Serving file");
            Response::ok(mime, body)
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Failed to read file");
            not_found(assets).await
        }
    }
}

/// 404 with `templates/error.html`, or a minimal inline page if that
/// document cannot be read.
pub async fn not_found(assets: &AssetsConfig) -> Response {
    let error_page = assets.template("error.html");

    let body = match tokio::fs::read(&error_page).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(file = %error_page.display(), error = %e, "Failed to load 404 page");
            pages::NOT_FOUND_FALLBACK.as_bytes().to_vec()
        }
    };

    tracing::info!("Serving 404 page");
    Response::html(StatusCode::NotFound, body)
}

async fn submit(req: &Request, relay: &RelayClient) -> Response {
    let envelope = match extract_envelope(&req.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(error = %e, "Failed to process submission");
            return Response::html(StatusCode::InternalServerError, pages::SERVER_ERROR);
        }
    };

    tracing::info!(username = %envelope.username, "Relaying submitted message");

    match relay.send(&envelope).await {
        RelayStatus::Success => Response::html(StatusCode::Ok, pages::SUBMIT_SUCCESS),
        RelayStatus::Error => {
            tracing::error!(username = %envelope.username, "Message could not be stored");
            Response::html(StatusCode::InternalServerError, pages::SUBMIT_FAILURE)
        }
    }
}

/// Builds the envelope from a URL-encoded form body. Absent fields are
/// empty strings.
pub fn extract_envelope(body: &[u8]) -> Result<RelayEnvelope, SubmitError> {
    std::str::from_utf8(body).map_err(|_| SubmitError::InvalidEncoding)?;

    let mut fields = parse_form(body);
    Ok(RelayEnvelope::new(
        fields.remove("username").unwrap_or_default(),
        fields.remove("message").unwrap_or_default(),
    ))
}

/// Decodes `application/x-www-form-urlencoded` data.
///
/// Fields with blank values are skipped; a repeated field keeps its last
/// value.
pub fn parse_form(body: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(body)
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
