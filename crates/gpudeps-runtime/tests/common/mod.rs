//! In-process HTTP fixture server for integration tests.
//!
//! Serves registered bodies on `127.0.0.1:<ephemeral>` and counts requests
//! per path so tests can assert that a cache hit never touched the network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::stream::{self, StreamExt};
use gpudeps_core::Library;
use gpudeps_core::hash::sha256_bytes;

#[derive(Clone)]
enum Fixture {
    Body(Vec<u8>),
    Status(u16),
    /// Sends the first chunk, then never finishes the body.
    Stall(Vec<u8>),
}

#[derive(Clone, Default)]
struct ServerState {
    fixtures: Arc<Mutex<HashMap<String, Fixture>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

pub struct TestServer {
    addr: SocketAddr,
    state: ServerState,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/*path", get(serve_fixture))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.insert(path, Fixture::Body(body.into()));
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.insert(path, Fixture::Status(status));
    }

    pub fn stall(&self, path: &str, first_chunk: impl Into<Vec<u8>>) {
        self.insert(path, Fixture::Stall(first_chunk.into()));
    }

    pub fn hits(&self, path: &str) -> usize {
        let key = path.trim_start_matches('/');
        self.state
            .hits
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    fn insert(&self, path: &str, fixture: Fixture) {
        self.state
            .fixtures
            .lock()
            .unwrap()
            .insert(path.trim_start_matches('/').to_string(), fixture);
    }
}

async fn serve_fixture(State(state): State<ServerState>, Path(path): Path<String>) -> Response {
    *state.hits.lock().unwrap().entry(path.clone()).or_default() += 1;
    let fixture = state.fixtures.lock().unwrap().get(&path).cloned();

    match fixture {
        Some(Fixture::Body(bytes)) => bytes.into_response(),
        Some(Fixture::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(Fixture::Stall(first)) => {
            let body = stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(first)) })
                .chain(stream::pending());
            Body::from_stream(body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A linux/amd64 catalog entry whose digest matches `content`.
pub fn library_for(name: &str, version: &str, content: &[u8], url: String) -> Library {
    Library {
        name: name.to_string(),
        version: version.to_string(),
        platform: "linux".into(),
        arch: "amd64".into(),
        url,
        sha256: sha256_bytes(content),
        size: content.len() as u64,
    }
}

/// Build a zip archive in memory. `None` content adds a directory entry.
pub fn zip_bytes(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        match content {
            Some(bytes) => {
                zip.start_file(*name, options).unwrap();
                zip.write_all(bytes).unwrap();
            }
            None => zip.add_directory(*name, options).unwrap(),
        }
    }
    zip.finish().unwrap().into_inner()
}
