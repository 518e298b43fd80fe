//! Where wage tables come from.
//!
//! - `DirectorySource`: `<root>/soc/<key>.json` on local disk
//! - `HttpSource`: `<base>/data/soc/<key>.json` over HTTP
//! - `MemorySource`: in-process tables, optionally delayed (tests, demos)

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use formats::parse_wage_table;
use scene::WageThresholdTable;
use tokio::sync::RwLock;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    InvalidKey,
    NotFound,
    Http(u16),
    Transport,
    Io,
    Parse,
    /// The fetch task ended without producing a result.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FetchErrorKind::Http(status) => write!(f, "HTTP {status}: {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for FetchError {}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Loads the wage table for one occupation parent key.
///
/// Methods return boxed futures so sources can sit behind `Arc<dyn _>`.
pub trait WageTableSource: Send + Sync {
    fn fetch<'a>(&'a self, key: &'a str)
        -> BoxFuture<'a, Result<WageThresholdTable, FetchError>>;
}

/// Occupation keys end up in paths and URLs; only `[A-Za-z0-9-]` is allowed.
pub fn validate_key(key: &str) -> Result<&str, FetchError> {
    let ok = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if ok {
        Ok(key)
    } else {
        Err(FetchError::new(
            FetchErrorKind::InvalidKey,
            format!("invalid occupation key {key:?}"),
        ))
    }
}

fn parse_payload(key: &str, payload: &str) -> Result<WageThresholdTable, FetchError> {
    parse_wage_table(payload)
        .map_err(|e| FetchError::new(FetchErrorKind::Parse, format!("{key}: {e}")))
}

/// Reads `<root>/soc/<key>.json`.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, key: &str) -> PathBuf {
        self.root.join("soc").join(format!("{key}.json"))
    }
}

impl WageTableSource for DirectorySource {
    fn fetch<'a>(
        &'a self,
        key: &'a str,
    ) -> BoxFuture<'a, Result<WageThresholdTable, FetchError>> {
        Box::pin(async move {
            let key = validate_key(key)?;
            let path = self.table_path(key);
            tracing::debug!(key, path = %path.display(), "reading wage table");
            let payload = match tokio::fs::read_to_string(&path).await {
                Ok(s) => s,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(FetchError::new(
                        FetchErrorKind::NotFound,
                        format!("no table at {}", path.display()),
                    ));
                }
                Err(e) => {
                    return Err(FetchError::new(
                        FetchErrorKind::Io,
                        format!("{}: {e}", path.display()),
                    ));
                }
            };
            parse_payload(key, &payload)
        })
    }
}

/// GETs `<base>/data/soc/<key>.json`. Any non-success status is a failure.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn table_url(&self, key: &str) -> String {
        format!("{}/data/soc/{key}.json", self.base_url)
    }
}

impl WageTableSource for HttpSource {
    fn fetch<'a>(
        &'a self,
        key: &'a str,
    ) -> BoxFuture<'a, Result<WageThresholdTable, FetchError>> {
        Box::pin(async move {
            let key = validate_key(key)?;
            let url = self.table_url(key);
            tracing::debug!(key, %url, "fetching wage table");
            let resp = self.client.get(&url).send().await.map_err(|e| {
                FetchError::new(FetchErrorKind::Transport, format!("GET {url}: {e}"))
            })?;

            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::new(FetchErrorKind::NotFound, format!("GET {url}")));
            }
            if !status.is_success() {
                tracing::warn!(key, %url, status = status.as_u16(), "wage table request failed");
                return Err(FetchError::new(
                    FetchErrorKind::Http(status.as_u16()),
                    format!("GET {url}"),
                ));
            }

            let payload = resp.text().await.map_err(|e| {
                FetchError::new(FetchErrorKind::Transport, format!("reading {url}: {e}"))
            })?;
            parse_payload(key, &payload)
        })
    }
}

/// In-memory source. Per-key delays let tests reorder arrivals.
#[derive(Default)]
pub struct MemorySource {
    tables: RwLock<HashMap<String, WageThresholdTable>>,
    delays: RwLock<HashMap<String, Duration>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_table(&self, key: impl Into<String>, table: WageThresholdTable) {
        self.tables.write().await.insert(key.into(), table);
    }

    pub async fn remove_table(&self, key: &str) -> Option<WageThresholdTable> {
        self.tables.write().await.remove(key)
    }

    pub async fn set_delay(&self, key: impl Into<String>, delay: Duration) {
        self.delays.write().await.insert(key.into(), delay);
    }
}

impl WageTableSource for MemorySource {
    fn fetch<'a>(
        &'a self,
        key: &'a str,
    ) -> BoxFuture<'a, Result<WageThresholdTable, FetchError>> {
        Box::pin(async move {
            let delay = self.delays.read().await.get(key).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.tables.read().await.get(key).cloned().ok_or_else(|| {
                FetchError::new(FetchErrorKind::NotFound, format!("no table for {key}"))
            })
        })
    }
}
