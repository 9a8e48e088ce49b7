// ============================================================
// Layer 4 — Dataset Fetcher
// ============================================================
// Downloads the raw review dataset from a fixed URL and writes
// it to local disk, overwriting any previous copy.
//
// Failures (DNS, connection, non-2xx status, disk write) are
// propagated as-is; there is no retry.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::traits::DatasetSource;

/// Downloads the dataset over HTTP(S) with a blocking client.
pub struct HttpFetcher {
    url:    String,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url:    url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl DatasetSource for HttpFetcher {
    fn fetch(&self, dest: &Path) -> Result<()> {
        tracing::info!("Downloading dataset from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("Download request to '{}' failed", self.url))?
            .error_for_status()
            .with_context(|| format!("Remote '{}' refused the download", self.url))?;

        let bytes = response
            .bytes()
            .with_context(|| format!("Cannot read response body from '{}'", self.url))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        fs::write(dest, &bytes)
            .with_context(|| format!("Cannot write dataset to '{}'", dest.display()))?;

        tracing::debug!("Wrote {} bytes to '{}'", bytes.len(), dest.display());
        Ok(())
    }
}
