//! Loading configuration overlays from YAML files.
//!
//! Every overlay is read and parsed before any merging starts, so a missing or
//! malformed file aborts the pipeline without a partial result.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use super::{Values, kind_of};

/// Errors that can occur while loading an overlay file.
#[derive(Debug, Error)]
pub enum OverlayError {
  /// The file is missing or unreadable.
  #[error("failed to read values file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The file is not a YAML mapping.
  #[error("failed to parse {}: {reason}", path.display())]
  Parse { path: PathBuf, reason: String },
}

/// Load a single overlay file.
///
/// An empty file (or a bare `null` document) is an empty mapping.
pub fn load_overlay(path: &Path) -> Result<Values, OverlayError> {
  let content = fs::read_to_string(path).map_err(|source| OverlayError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let parsed: Value = serde_yaml::from_str(&content).map_err(|e| OverlayError::Parse {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;

  match parsed {
    Value::Null => Ok(Values::new()),
    Value::Mapping(values) => Ok(values),
    other => Err(OverlayError::Parse {
      path: path.to_path_buf(),
      reason: format!("top-level value must be a mapping, found {}", kind_of(&other)),
    }),
  }
}

/// Load overlay files in the order given.
pub fn load_overlays<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Values>, OverlayError> {
  paths
    .iter()
    .map(|path| {
      let path = path.as_ref();
      debug!(path = %path.display(), "loading values file");
      load_overlay(path)
    })
    .collect()
}

/// Name an overlay file for display, relative to the chart directory when it lives inside it.
pub fn display_overlay_name(chart_dir: &Path, file: &Path) -> String {
  let relative = file.strip_prefix(chart_dir).unwrap_or(file);
  let components: Vec<_> = relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .filter(|c| c != "/")
    .collect();
  components.join("/")
}
