//! Chart repository index (`index.yaml`).

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat};
use semver::{Version, VersionReq};
use serde::Deserialize;

use crate::chart::ChartMetadata;

/// The parsed `index.yaml` of a chart repository.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndex {
  #[serde(default)]
  pub api_version: String,
  #[serde(default)]
  pub entries: BTreeMap<String, Vec<ChartVersion>>,
}

/// One published version of a chart.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartVersion {
  #[serde(flatten)]
  pub metadata: ChartMetadata,
  #[serde(default)]
  pub urls: Vec<String>,
  #[serde(default)]
  pub created: Option<String>,
  #[serde(default)]
  pub digest: Option<String>,
}

impl ChartVersion {
  pub fn version(&self) -> &str {
    &self.metadata.version
  }

  fn semver(&self) -> Option<Version> {
    Version::parse(self.version().trim_start_matches('v')).ok()
  }

  /// `<version>` or `<version> [<created, RFC 3339>]`.
  pub fn listing(&self) -> String {
    let created = self
      .created
      .as_deref()
      .and_then(|created| DateTime::parse_from_rfc3339(created).ok())
      .map(|created| created.to_rfc3339_opts(SecondsFormat::Secs, true));
    match created {
      Some(created) => format!("{} [{}]", self.version(), created),
      None => self.version().to_string(),
    }
  }
}

impl RepositoryIndex {
  /// All versions of `name`, newest first.
  ///
  /// Semver versions sort by precedence and come before anything unparsable.
  pub fn versions(&self, name: &str) -> Option<Vec<&ChartVersion>> {
    let mut versions: Vec<&ChartVersion> = self.entries.get(name)?.iter().collect();
    versions.sort_by(|a, b| b.semver().cmp(&a.semver()));
    Some(versions)
  }

  /// Find a version of `name`.
  ///
  /// An empty `version` selects the newest release. Otherwise an exact match
  /// wins, then the newest version satisfying `version` as a constraint.
  pub fn find(&self, name: &str, version: &str) -> Option<&ChartVersion> {
    let versions = self.versions(name)?;
    let version = version.trim();

    if version.is_empty() {
      return versions
        .iter()
        .find(|v| v.semver().is_some_and(|s| s.pre.is_empty()))
        .or_else(|| versions.first())
        .copied();
    }

    if let Some(exact) = versions.iter().find(|v| v.version() == version).copied() {
      return Some(exact);
    }

    let req = VersionReq::parse(version).ok()?;
    versions
      .into_iter()
      .find(|v| v.semver().is_some_and(|s| req.matches(&s)))
  }
}
