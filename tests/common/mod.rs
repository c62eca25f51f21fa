#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use postbox::config::Config;
use postbox::http::router::AppState;
use postbox::server::Listener;
use postbox::storage::{MessageStore, StoreError, StoredRecord};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

pub fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Config serving the repository's assets and relaying to `peer_addr`.
pub fn test_config(peer_addr: SocketAddr) -> Config {
    let mut cfg = Config::default();
    cfg.assets.root = assets_root();
    cfg.relay.peer_addr = peer_addr.to_string();
    cfg.relay.timeout_secs = 1;
    cfg
}

pub fn test_state(peer_addr: SocketAddr) -> AppState {
    AppState::new(Arc::new(test_config(peer_addr)))
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay peer that reads one chunk per connection and answers `reply`.
pub async fn spawn_fake_relay(reply: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(reply.as_bytes()).await;
            });
        }
    });

    addr
}

/// Relay peer that accepts and then never answers.
pub async fn spawn_silent_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(stream);
            });
        }
    });

    addr
}

pub async fn spawn_http(state: AppState) -> SocketAddr {
    let listener = Listener::bind("127.0.0.1:0", 16).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(postbox::http::serve(listener, Arc::new(state)));
    addr
}

/// Sends `raw` and reads until the server closes.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn parse_response(raw: &[u8]) -> RawResponse {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = std::str::from_utf8(&raw[..end]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    let status = status_line.split_whitespace().nth(1).unwrap().parse().unwrap();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body: raw[end + 4..].to_vec(),
    }
}

/// Store that keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    pub records: Arc<Mutex<Vec<StoredRecord>>>,
}

impl MessageStore for RecordingStore {
    async fn persist(&self, record: StoredRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

/// Store that rejects every record, counting the attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    pub attempts: Arc<Mutex<usize>>,
}

impl MessageStore for FailingStore {
    async fn persist(&self, _record: StoredRecord) -> Result<(), StoreError> {
        *self.attempts.lock().await += 1;
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "database offline");
        Err(StoreError::Connect(refused.into()))
    }
}
