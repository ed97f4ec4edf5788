use async_trait::async_trait;
use crate::error::{CatalogError, Result};

/// Anything that can hand back the text stored at a location.
///
/// Futures are `?Send` because in the browser reqwest resolves on the
/// single JS thread.
#[async_trait(?Send)]
pub trait DataSource {
    async fn fetch_text(&self, location: &str) -> Result<String>;
}

/// Fetches locations as absolute URLs.
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl DataSource for HttpSource {
    async fn fetch_text(&self, location: &str) -> Result<String> {
        tracing::debug!("GET {}", location);
        let resp = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| CatalogError::fetch(location, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::fetch(location, format!("HTTP {}", status)));
        }

        resp.text().await.map_err(|e| CatalogError::fetch(location, e))
    }
}

/// Reads locations as paths below a root directory. Native builds only.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct DirSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl DataSource for DirSource {
    async fn fetch_text(&self, location: &str) -> Result<String> {
        let path = self.root.join(location.trim_start_matches('/'));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CatalogError::fetch(location, e))
    }
}
