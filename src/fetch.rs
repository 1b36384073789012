//! Retrieval of icon markup from URLs and local paths.
//!
//! [`ContentFetcher`] memoizes by the exact source string, so an icon needed
//! for both its square and wide rendition is only read once per run. The
//! actual I/O sits behind the [`Retrieve`] trait.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use url::Url;

use crate::error::FetchError;

// ============================================================================
// SourceLocation
// ============================================================================

/// Where a piece of markup lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(Url),
    Local(PathBuf),
}

impl SourceLocation {
    /// Classifies a source string.
    ///
    /// Anything that parses as an absolute URL is remote, except single-letter
    /// schemes, which are Windows drive letters (`C:\icons`).
    pub fn classify(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if url.scheme().len() > 1 => Self::Remote(url),
            _ => Self::Local(PathBuf::from(source)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Returns true if `source` would be fetched over the network.
pub fn is_url(source: &str) -> bool {
    SourceLocation::classify(source).is_remote()
}

// ============================================================================
// Retrieve
// ============================================================================

/// Performs the actual I/O for a source.
#[async_trait]
pub trait Retrieve: Send + Sync {
    async fn retrieve(&self, location: &SourceLocation) -> Result<String, FetchError>;
}

/// Reads `http(s)` URLs with reqwest and paths or `file://` URLs from disk.
#[derive(Debug, Clone, Default)]
pub struct DefaultRetriever {
    client: reqwest::Client,
}

impl DefaultRetriever {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|source| FetchError::Request {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    /// Uses an already configured client for HTTP requests.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(request_error)
    }
}

#[async_trait]
impl Retrieve for DefaultRetriever {
    async fn retrieve(&self, location: &SourceLocation) -> Result<String, FetchError> {
        match location {
            SourceLocation::Remote(url) => match url.scheme() {
                "http" | "https" => self.get(url).await,
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|()| FetchError::UnsupportedScheme {
                            scheme: "file".into(),
                            url: url.to_string(),
                        })?;
                    read_file(path).await
                }
                scheme => Err(FetchError::UnsupportedScheme {
                    scheme: scheme.to_string(),
                    url: url.to_string(),
                }),
            },
            SourceLocation::Local(path) => read_file(path.clone()).await,
        }
    }
}

async fn read_file(path: PathBuf) -> Result<String, FetchError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound { path }),
        Err(source) => Err(FetchError::Io { path, source }),
    }
}

// ============================================================================
// ContentFetcher
// ============================================================================

/// Fetches markup with a run-scoped cache keyed by source string.
///
/// The cache only grows. Two tasks racing on the same uncached source may
/// both retrieve it; the entries are identical so either insert wins.
pub struct ContentFetcher {
    retriever: Arc<dyn Retrieve>,
    cache: DashMap<String, Arc<str>>,
}

impl ContentFetcher {
    pub fn new(retriever: Arc<dyn Retrieve>) -> Self {
        Self {
            retriever,
            cache: DashMap::new(),
        }
    }

    /// Creates a fetcher backed by [`DefaultRetriever`].
    pub fn with_default_retriever() -> Result<Self, FetchError> {
        Ok(Self::new(Arc::new(DefaultRetriever::new()?)))
    }

    /// Returns the markup at `source`.
    ///
    /// With `use_cache`, a source already fetched this run is returned
    /// without I/O and a fresh result is remembered. Without it the cache is
    /// neither consulted nor filled.
    pub async fn fetch(&self, source: &str, use_cache: bool) -> Result<Arc<str>, FetchError> {
        if use_cache && let Some(hit) = self.cache.get(source) {
            tracing::debug!(source, "cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        let location = SourceLocation::classify(source);
        tracing::debug!(source, remote = location.is_remote(), "retrieving");
        let text: Arc<str> = self.retriever.retrieve(&location).await?.into();

        if use_cache {
            self.cache.insert(source.to_string(), Arc::clone(&text));
        }
        Ok(text)
    }

    /// Number of cached sources.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
