use std::future::Future;
use std::path::PathBuf;

use crate::foundation::error::{SeqError, SeqResult};

/// Result of one transport attempt.
#[derive(Clone, Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Byte transport used by [`crate::ResourceLoader`].
///
/// `Err` means the request never produced a response (connection refused, unreadable file).
/// Non-2xx responses are returned as `Ok` with their status so the loader can retry them.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = SeqResult<FetchResponse>> + Send;
}

/// Plain HTTP GET via `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> SeqResult<FetchResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SeqError::fetch(format!("GET {url}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| SeqError::fetch(format!("read body of {url}: {e}")))?;
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Reads local files; accepts bare paths and `file://` URLs.
///
/// Missing files map to a `404` response so they go through the same retry budget as HTTP.
#[derive(Clone, Debug, Default)]
pub struct FsFetcher {
    root: Option<PathBuf>,
}

impl FsFetcher {
    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let raw = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if raw.is_relative() => root.join(raw),
            _ => raw,
        }
    }
}

impl Fetcher for FsFetcher {
    async fn fetch(&self, url: &str) -> SeqResult<FetchResponse> {
        let path = self.resolve(url);
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse::status(404)),
            Err(e) => Err(SeqError::fetch(format!("read '{}': {e}", path.display()))),
        }
    }
}

/// Routes `http(s)://` URLs to [`HttpFetcher`] and everything else to [`FsFetcher`].
#[derive(Clone, Debug, Default)]
pub struct AnyFetcher {
    http: HttpFetcher,
    fs: FsFetcher,
}

impl AnyFetcher {
    pub fn new(http: HttpFetcher, fs: FsFetcher) -> Self {
        Self { http, fs }
    }
}

impl Fetcher for AnyFetcher {
    async fn fetch(&self, url: &str) -> SeqResult<FetchResponse> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url).await
        } else {
            self.fs.fetch(url).await
        }
    }
}
