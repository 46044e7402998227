//! Document sources for boundary and profile datasets.
//!
//! A source only transports bytes; status and content-type validation is the
//! loader's job, so every source reports "not found" as a 404 document rather
//! than an error. `Err` is reserved for transport failures.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::RwLock;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Transport-level failure (DNS, connection, I/O).
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(inner) => write!(f, "{}: {inner}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A fetched response, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedDocument {
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }

    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self::ok("application/json", body)
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: None,
            body: Vec::new(),
        }
    }
}

/// Trait for dataset document sources.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait DocumentSource: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedDocument, SourceError>>;
}

/// HTTP(S) source backed by `reqwest`.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource for HttpSource {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedDocument, SourceError>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::with_source("HTTP request failed", e))?;

            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = resp
                .bytes()
                .await
                .map_err(|e| SourceError::with_source("Failed to read response", e))?;

            Ok(FetchedDocument {
                status,
                content_type,
                body: body.to_vec(),
            })
        })
    }
}

/// Filesystem source; URLs are paths relative to `root` (a `file://` prefix is accepted).
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let rel = url.strip_prefix("file://").unwrap_or(url);
        let rel = rel.trim_start_matches('/');
        self.root.join(rel)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json" | "topojson") => "application/json",
        Some("geojson") => "application/geo+json",
        Some("html" | "htm") => "text/html",
        _ => "application/octet-stream",
    }
}

impl DocumentSource for FilesystemSource {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedDocument, SourceError>> {
        let path = self.resolve(url);
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(body) => Ok(FetchedDocument::ok(content_type_for(&path), body)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(FetchedDocument::not_found())
                }
                Err(e) => Err(SourceError::with_source(
                    format!("Failed to read {}", path.display()),
                    e,
                )),
            }
        })
    }
}

/// In-memory source for tests and embedded fixtures.
///
/// Unknown URLs answer 404; URLs registered with `fail` raise a transport error.
#[derive(Default)]
pub struct MemorySource {
    documents: RwLock<HashMap<String, Result<FetchedDocument, String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, doc: FetchedDocument) -> Self {
        self.documents.get_mut().insert(url.into(), Ok(doc));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.documents.get_mut().insert(url.into(), Err(message.into()));
        self
    }

    pub async fn insert(&self, url: impl Into<String>, doc: FetchedDocument) {
        self.documents.write().await.insert(url.into(), Ok(doc));
    }

    pub async fn remove(&self, url: &str) -> bool {
        self.documents.write().await.remove(url).is_some()
    }
}

impl DocumentSource for MemorySource {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedDocument, SourceError>> {
        Box::pin(async move {
            match self.documents.read().await.get(url) {
                Some(Ok(doc)) => Ok(doc.clone()),
                Some(Err(message)) => Err(SourceError::new(message.clone())),
                None => Ok(FetchedDocument::not_found()),
            }
        })
    }
}
