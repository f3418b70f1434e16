use crate::error::LitefetchError;
use reqwest::Client;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

/// Assumed upper bound on the transfer size, in bytes.
///
/// Compressed responses rarely carry a usable length, so progress is
/// measured against this constant instead of the advertised size.
pub const DEFAULT_ESTIMATED_TOTAL: u64 = 800_000_000;

/// Highest percentage reported while bytes are still arriving.
pub const IN_FLIGHT_CEILING: f64 = 99.0;

/// Upper bound on buffer pre-allocation taken from a size hint.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Custom response header carrying the uncompressed file size.
const FILE_SIZE_HEADER: &str = "x-file-size";

/// Byte count and progress for one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferState {
    bytes_received: u64,
    estimated_total: u64,
    progress_percent: f64,
}

impl TransferState {
    pub fn new(estimated_total: u64) -> Self {
        Self {
            bytes_received: 0,
            estimated_total: estimated_total.max(1),
            progress_percent: 0.0,
        }
    }

    /// Account for a received chunk and return the updated percentage.
    pub fn record_chunk(&mut self, len: usize) -> f64 {
        self.bytes_received += len as u64;
        let ratio = self.bytes_received as f64 / self.estimated_total as f64 * 100.0;
        self.progress_percent = self.progress_percent.max(ratio.min(IN_FLIGHT_CEILING));
        self.progress_percent
    }

    /// Mark the transfer finished; progress becomes exactly 100.
    pub fn complete(&mut self) -> f64 {
        self.progress_percent = 100.0;
        self.progress_percent
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub fn estimated_total(&self) -> u64 {
        self.estimated_total
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }
}

/// Streams a remote database image into memory.
pub struct Loader {
    client: Client,
    token: Option<SecretString>,
    estimated_total: u64,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            token: None,
            estimated_total: DEFAULT_ESTIMATED_TOTAL,
        }
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, headers).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Send `Authorization: Bearer <token>` with each request.
    pub fn with_token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    pub fn with_estimated_total(mut self, estimated_total: u64) -> Self {
        self.estimated_total = estimated_total;
        self
    }

    pub fn estimated_total(&self) -> u64 {
        self.estimated_total
    }

    /// Fetch `url` in full, calling `on_progress` after every chunk and
    /// once more with exactly 100 when the stream ends.
    ///
    /// There is no retry and no internal timeout. Callers wanting a
    /// deadline wrap the future.
    pub async fn load<F>(&self, url: &str, mut on_progress: F) -> Result<Vec<u8>, LitefetchError>
    where
        F: FnMut(f64),
    {
        let mut request = self.client.get(url).header(ACCEPT_ENCODING, "br");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let mut response = request.send().await.map_err(|e| LitefetchError::Transfer {
            message: format!("failed to open stream: {}", e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LitefetchError::Transfer {
                message: format!("HTTP error: {}", status.as_u16()),
            });
        }

        let hint = size_hint(response.headers());
        debug!(url, size_hint = ?hint, "stream opened");

        let capacity = hint
            .map(|h| usize::try_from(h).unwrap_or(usize::MAX).min(MAX_PREALLOCATION))
            .unwrap_or(0);
        let mut buffer = Vec::with_capacity(capacity);
        let mut state = TransferState::new(self.estimated_total);

        while let Some(chunk) = response.chunk().await.map_err(|e| LitefetchError::Transfer {
            message: format!("stream closed before completion: {}", e),
        })? {
            buffer.extend_from_slice(&chunk);
            on_progress(state.record_chunk(chunk.len()));
        }

        on_progress(state.complete());
        debug!(url, bytes = state.bytes_received(), "stream complete");
        Ok(buffer)
    }
}

/// Best-effort size from `x-file-size`, falling back to `Content-Length`.
pub fn size_hint(headers: &HeaderMap) -> Option<u64> {
    [FILE_SIZE_HEADER, CONTENT_LENGTH.as_str()]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.trim().parse::<u64>().ok())
        .find(|size| *size > 0)
}
