//! HTTP plumbing shared by catalog sync, artifact downloads and archive fetches.

use std::path::Path;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use gpudeps_core::hash::READ_BUFFER_SIZE;
use gpudeps_core::{DepsError, DepsResult, Platform, Release, ReleaseSource, Settings};
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Build the shared HTTP client with the configured timeout and user agent.
pub fn build_client(settings: &Settings) -> DepsResult<Client> {
    Client::builder()
        .timeout(settings.effective_request_timeout())
        .user_agent(settings.effective_user_agent())
        .build()
        .map_err(|e| DepsError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Issue a GET and fail on anything but a 2xx status.
async fn get_checked(
    client: &Client,
    url: &str,
    cancel: &CancellationToken,
) -> DepsResult<reqwest::Response> {
    let response = tokio::select! {
        biased;

        () = cancel.cancelled() => return Err(DepsError::Cancelled),

        result = client.get(url).send() => result.map_err(|e| DepsError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(DepsError::network_with_status(
            format!("GET {url} returned HTTP {status}"),
            status.as_u16(),
        ));
    }
    Ok(response)
}

/// Stream `url` into a newly created file at `dest`.
///
/// The body is read through a [`READ_BUFFER_SIZE`] buffer and every filled
/// slice is handed to `on_chunk` together with the running byte count before
/// it is written. Returns the number of bytes written. The caller owns
/// cleanup of `dest` on error.
pub(crate) async fn stream_to_file<F>(
    client: &Client,
    url: &str,
    dest: &Path,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> DepsResult<u64>
where
    F: FnMut(&[u8], u64) + Send,
{
    let response = get_checked(client, url, cancel).await?;

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(stream);
    tokio::pin!(reader);

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| DepsError::io("create", dest, e))?;

    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut written: u64 = 0;

    loop {
        let n = tokio::select! {
            biased;

            () = cancel.cancelled() => return Err(DepsError::Cancelled),

            read = reader.read(&mut buffer) => read.map_err(|e| {
                DepsError::network(format!("Error reading response from {url}: {e}"))
            })?,
        };

        if n == 0 {
            break;
        }

        written += n as u64;
        on_chunk(&buffer[..n], written);
        file.write_all(&buffer[..n])
            .await
            .map_err(|e| DepsError::io("write", dest, e))?;
    }

    file.flush()
        .await
        .map_err(|e| DepsError::io("flush", dest, e))?;
    file.sync_all()
        .await
        .map_err(|e| DepsError::io("sync", dest, e))?;

    debug!(url, bytes = written, "Download stream complete");
    Ok(written)
}

/// [`ReleaseSource`] backed by a JSON release index over HTTP.
///
/// The endpoint receives `os` and `arch` query parameters and answers with
/// an array of releases:
///
/// ```json
/// [{ "vendor": "cuda-runtime", "version": "12.4.1",
///    "artifacts": [{ "name": "libcudart.so.12", "os": "linux", "arch": "amd64",
///                    "url": "...", "sha256": "...", "size": 123 }] }]
/// ```
pub struct HttpReleaseSource {
    client: Client,
    index_url: String,
}

impl HttpReleaseSource {
    pub fn new(client: Client, index_url: impl Into<String>) -> Self {
        Self {
            client,
            index_url: index_url.into(),
        }
    }
}

#[async_trait]
impl ReleaseSource for HttpReleaseSource {
    async fn list_releases(&self, platform: &Platform) -> DepsResult<Vec<Release>> {
        let response = self
            .client
            .get(&self.index_url)
            .query(&[("os", platform.os.as_str()), ("arch", platform.arch.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DepsError::Request {
                url: self.index_url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DepsError::network_with_status(
                format!("Release index returned HTTP {status}"),
                status.as_u16(),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DepsError::network(format!("Failed to read release index: {e}")))?;

        serde_json::from_slice(&body).map_err(|e| DepsError::decode("release index", e))
    }
}
