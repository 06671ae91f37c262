//! Fetching charts from a remote chart repository.
//!
//! A repository is a plain HTTP server exposing an `index.yaml` and the
//! packaged charts it references. Downloads are unpacked into a temporary
//! directory owned by [`ChartDownload`], which removes it when dropped.

pub mod index;

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

use crate::chart::archive::unpack_chart;
use crate::consts::REPO_INDEX_FILE;
use crate::util::hash::{digest_matches, hash_bytes};

pub use index::{ChartVersion, RepositoryIndex};

/// Errors talking to a chart repository.
#[derive(Debug, Error)]
pub enum RepoError {
  #[error("failed to fetch {url}: {message}")]
  Fetch { url: String, message: String },

  #[error("failed to parse repository index {url}: {source}")]
  Index {
    url: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("chart '{0}' not found in repository")]
  ChartNotFound(String),

  #[error("chart '{name}' has no version matching '{version}'")]
  VersionNotFound { name: String, version: String },

  #[error("chart '{name}' version {version} has no download URL")]
  NoDownloadUrl { name: String, version: String },

  #[error("digest mismatch for {url}: expected {expected}, got {actual}")]
  DigestMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("failed to unpack {url}: {source}")]
  Unpack {
    url: String,
    #[source]
    source: io::Error,
  },
}

/// A chart repository with its index loaded.
#[derive(Debug, Clone)]
pub struct ChartRepository {
  base_url: String,
  index: RepositoryIndex,
  client: reqwest::Client,
}

impl ChartRepository {
  /// Fetch and parse the repository index at `<url>/index.yaml`.
  pub async fn load(url: &str) -> Result<Self, RepoError> {
    let base_url = url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();
    let index_url = format!("{}/{}", base_url, REPO_INDEX_FILE);
    info!(url = %index_url, "loading repository index");

    let bytes = fetch(&client, &index_url).await?;
    let index: RepositoryIndex = serde_yaml::from_slice(&bytes).map_err(|source| RepoError::Index {
      url: index_url.clone(),
      source,
    })?;
    debug!(charts = index.entries.len(), "repository index loaded");

    Ok(Self { base_url, index, client })
  }

  pub fn index(&self) -> &RepositoryIndex {
    &self.index
  }

  /// Look up `name` at `version` (empty for the newest release).
  pub fn get_chart(&self, name: &str, version: &str) -> Result<&ChartVersion, RepoError> {
    if !self.index.entries.contains_key(name) {
      return Err(RepoError::ChartNotFound(name.to_string()));
    }
    self.index.find(name, version).ok_or_else(|| RepoError::VersionNotFound {
      name: name.to_string(),
      version: version.to_string(),
    })
  }

  /// Up to `limit` versions of `name`, newest first.
  pub fn versions(&self, name: &str, limit: usize) -> Result<Vec<&ChartVersion>, RepoError> {
    let mut versions = self
      .index
      .versions(name)
      .ok_or_else(|| RepoError::ChartNotFound(name.to_string()))?;
    versions.truncate(limit);
    Ok(versions)
  }

  /// Download and unpack `chart`.
  ///
  /// The archive digest is verified when the index carries one.
  pub async fn download(&self, chart: &ChartVersion) -> Result<ChartDownload, RepoError> {
    let url = chart
      .urls
      .first()
      .map(|url| self.resolve_url(url))
      .ok_or_else(|| RepoError::NoDownloadUrl {
        name: chart.metadata.name.clone(),
        version: chart.version().to_string(),
      })?;
    info!(chart = %chart.metadata.name, version = %chart.version(), url = %url, "downloading chart");

    let bytes = fetch(&self.client, &url).await?;

    if let Some(expected) = chart.digest.as_deref().filter(|d| !d.trim().is_empty()) {
      if !digest_matches(&bytes, expected) {
        return Err(RepoError::DigestMismatch {
          url,
          expected: expected.to_string(),
          actual: hash_bytes(&bytes),
        });
      }
    }

    let unpack_err = |source| RepoError::Unpack {
      url: url.clone(),
      source,
    };
    let dir = TempDir::new().map_err(unpack_err)?;
    let chart_path = unpack_chart(&bytes, dir.path()).map_err(unpack_err)?;
    info!(path = %chart_path.display(), size = bytes.len(), "download complete");

    Ok(ChartDownload { dir, chart_path })
  }

  /// Chart URLs in the index may be relative to the repository.
  fn resolve_url(&self, url: &str) -> String {
    if url.contains("://") {
      url.to_string()
    } else {
      format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }
  }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, RepoError> {
  let fetch_err = |message: String| RepoError::Fetch {
    url: url.to_string(),
    message,
  };

  let response = client.get(url).send().await.map_err(|e| fetch_err(e.to_string()))?;
  if !response.status().is_success() {
    return Err(fetch_err(format!("HTTP {}", response.status())));
  }

  let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
  Ok(bytes.to_vec())
}

/// A chart unpacked into a temporary directory.
///
/// The directory is removed when this value is dropped.
#[derive(Debug)]
pub struct ChartDownload {
  dir: TempDir,
  chart_path: PathBuf,
}

impl ChartDownload {
  /// The unpacked chart root.
  pub fn chart_path(&self) -> &Path {
    &self.chart_path
  }
}
