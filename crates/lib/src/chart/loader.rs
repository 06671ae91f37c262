//! Loading a chart tree from disk.
//!
//! # Layout
//!
//! ```text
//! <chart>/
//! ├── Chart.yaml        # metadata (required)
//! ├── values.yaml       # default values (optional)
//! ├── templates/        # template files, walked recursively
//! └── charts/           # sub-charts, as directories or packaged .tgz archives
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::archive::unpack_chart;
use super::types::{Chart, ChartMetadata, Template};
use crate::consts::{CHART_FILE, CHARTS_DIR, TEMPLATES_DIR, VALUES_FILE};
use crate::values::{Values, kind_of};

/// Errors that can occur while loading a chart.
#[derive(Debug, Error)]
pub enum ChartLoadError {
  /// The chart path does not exist or is not a directory.
  #[error("chart path is not a directory: {}", .0.display())]
  NotADirectory(PathBuf),

  /// The chart directory has no `Chart.yaml`.
  #[error("Chart.yaml not found in {}", .0.display())]
  MissingChartFile(PathBuf),

  /// A chart file could not be read.
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A chart file is not valid YAML.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// The chart is structurally invalid.
  #[error("invalid chart at {}: {reason}", path.display())]
  Invalid { path: PathBuf, reason: String },

  /// Walking the templates directory failed.
  #[error("failed to walk {}: {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// A packaged sub-chart could not be unpacked.
  #[error("failed to unpack chart archive {}: {source}", path.display())]
  Archive {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Load the chart rooted at `path`, including all of its sub-charts.
pub fn load_chart(path: &Path) -> Result<Chart, ChartLoadError> {
  let chart = load_dir(path)?;
  info!(
    chart = %chart.name(),
    templates = chart.template_count(),
    dependencies = chart.dependencies().len(),
    "loaded chart"
  );
  Ok(chart)
}

/// Load a packaged chart archive.
///
/// The archive is unpacked into a temporary directory that is removed once
/// the chart is in memory.
pub fn load_archive(path: &Path) -> Result<Chart, ChartLoadError> {
  let bytes = fs::read(path).map_err(|source| ChartLoadError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let archive_err = |source| ChartLoadError::Archive {
    path: path.to_path_buf(),
    source,
  };
  let staging = TempDir::new().map_err(archive_err)?;
  let root = unpack_chart(&bytes, staging.path()).map_err(archive_err)?;
  load_dir(&root)
}

fn load_dir(path: &Path) -> Result<Chart, ChartLoadError> {
  if !path.is_dir() {
    return Err(ChartLoadError::NotADirectory(path.to_path_buf()));
  }

  let metadata = load_metadata(path)?;
  let values = load_values(&path.join(VALUES_FILE))?;
  let templates = load_templates(&path.join(TEMPLATES_DIR))?;
  debug!(chart = %metadata.name, templates = templates.len(), "loaded chart directory");

  let mut chart = Chart::new(metadata, values, templates);
  for sub in load_subcharts(&path.join(CHARTS_DIR))? {
    if chart.dependencies().iter().any(|c| c.name() == sub.name()) {
      return Err(ChartLoadError::Invalid {
        path: path.to_path_buf(),
        reason: format!("duplicate sub-chart '{}'", sub.name()),
      });
    }
    chart.add_dependency(sub);
  }

  Ok(chart)
}

fn load_metadata(dir: &Path) -> Result<ChartMetadata, ChartLoadError> {
  let path = dir.join(CHART_FILE);
  if !path.is_file() {
    return Err(ChartLoadError::MissingChartFile(dir.to_path_buf()));
  }

  let content = read(&path)?;
  let metadata: ChartMetadata = serde_yaml::from_str(&content).map_err(|source| ChartLoadError::Parse {
    path: path.clone(),
    source,
  })?;

  if metadata.name.trim().is_empty() {
    return Err(ChartLoadError::Invalid {
      path,
      reason: "chart name is required".to_string(),
    });
  }

  Ok(metadata)
}

fn load_values(path: &Path) -> Result<Values, ChartLoadError> {
  if !path.is_file() {
    return Ok(Values::new());
  }

  let content = read(path)?;
  let parsed: Value = serde_yaml::from_str(&content).map_err(|source| ChartLoadError::Parse {
    path: path.to_path_buf(),
    source,
  })?;

  match parsed {
    Value::Null => Ok(Values::new()),
    Value::Mapping(values) => Ok(values),
    other => Err(ChartLoadError::Invalid {
      path: path.to_path_buf(),
      reason: format!("default values must be a mapping, found {}", kind_of(&other)),
    }),
  }
}

fn load_templates(dir: &Path) -> Result<Vec<Template>, ChartLoadError> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut templates = Vec::new();
  let walker = WalkDir::new(dir)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

  for entry in walker {
    let entry = entry.map_err(|source| ChartLoadError::Walk {
      path: dir.to_path_buf(),
      source,
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
    let segments: Vec<_> = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy().into_owned())
      .collect();
    let name = format!("{}/{}", TEMPLATES_DIR, segments.join("/"));
    templates.push(Template::new(name, read(entry.path())?));
  }

  Ok(templates)
}

fn load_subcharts(dir: &Path) -> Result<Vec<Chart>, ChartLoadError> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut entries: Vec<PathBuf> = fs::read_dir(dir)
    .map_err(|source| ChartLoadError::Read {
      path: dir.to_path_buf(),
      source,
    })?
    .filter_map(Result::ok)
    .map(|entry| entry.path())
    .filter(|path| path.file_name().is_some_and(|name| !is_hidden(name)))
    .collect();
  entries.sort();

  let mut charts = Vec::new();
  for entry in entries {
    if entry.is_dir() {
      charts.push(load_dir(&entry)?);
    } else if entry.extension().is_some_and(|ext| ext == "tgz") {
      charts.push(load_archive(&entry)?);
    } else {
      debug!(path = %entry.display(), "ignoring non-chart file in charts directory");
    }
  }

  Ok(charts)
}

fn read(path: &Path) -> Result<String, ChartLoadError> {
  fs::read_to_string(path).map_err(|source| ChartLoadError::Read {
    path: path.to_path_buf(),
    source,
  })
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
  name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chart::archive::tests::build_archive;

  fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn loads_nested_chart_tree() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("app");
    write(&root, "Chart.yaml", "apiVersion: v2\nname: app\nversion: 0.1.0\n");
    write(&root, "values.yaml", "replicas: 1\n");
    write(&root, "templates/deployment.yaml", "kind: Deployment\n");
    write(&root, "templates/_helpers.tpl", "{% macro x() %}{% endmacro %}");
    write(&root, "templates/.hidden.yaml", "ignored");
    write(&root, "charts/db/Chart.yaml", "name: db\nversion: 1.0.0\n");
    write(&root, "charts/db/templates/secret.yaml", "kind: Secret\n");
    write(&root, "charts/db/charts/cache/Chart.yaml", "name: cache\nversion: 1.0.0\n");
    write(&root, "charts/db/charts/cache/templates/svc.yaml", "kind: Service\n");
    write(&root, "charts/README.md", "not a chart");

    let chart = load_chart(&root).unwrap();

    assert_eq!(chart.name(), "app");
    assert_eq!(chart.values.get("replicas"), Some(&Value::from(1)));
    let names: Vec<_> = chart.templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["templates/_helpers.tpl", "templates/deployment.yaml"]);

    let db = &chart.dependencies()[0];
    assert_eq!(db.full_path(), "app/charts/db");
    assert_eq!(db.dependencies()[0].full_path(), "app/charts/db/charts/cache");
    assert_eq!(chart.template_count(), 4);
  }

  #[test]
  fn nested_template_directories_keep_relative_names() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Chart.yaml", "name: app\n");
    write(temp.path(), "templates/rbac/role.yaml", "kind: Role\n");

    let chart = load_chart(temp.path()).unwrap();
    assert_eq!(chart.templates[0].name, "templates/rbac/role.yaml");
  }

  #[test]
  fn loads_packaged_subchart() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Chart.yaml", "name: app\n");
    let archive = build_archive(&[
      ("redis/Chart.yaml", "name: redis\nversion: 17.0.0\n"),
      ("redis/templates/svc.yaml", "kind: Service\n"),
    ]);
    fs::create_dir_all(temp.path().join("charts")).unwrap();
    fs::write(temp.path().join("charts/redis-17.0.0.tgz"), archive).unwrap();

    let chart = load_chart(temp.path()).unwrap();
    let redis = &chart.dependencies()[0];
    assert_eq!(redis.name(), "redis");
    assert_eq!(redis.templates[0].name, "templates/svc.yaml");
  }

  #[test]
  fn missing_chart_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = load_chart(temp.path()).unwrap_err();
    assert!(matches!(err, ChartLoadError::MissingChartFile(_)));
  }

  #[test]
  fn missing_directory_is_an_error() {
    let err = load_chart(Path::new("/nonexistent/chart")).unwrap_err();
    assert!(matches!(err, ChartLoadError::NotADirectory(_)));
  }

  #[test]
  fn chart_without_name_is_invalid() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Chart.yaml", "version: 1.0.0\n");
    let err = load_chart(temp.path()).unwrap_err();
    assert!(err.to_string().contains("chart name is required"));
  }

  #[test]
  fn scalar_values_file_is_invalid() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Chart.yaml", "name: app\n");
    write(temp.path(), "values.yaml", "just a string\n");
    let err = load_chart(temp.path()).unwrap_err();
    assert!(matches!(err, ChartLoadError::Invalid { .. }));
  }

  #[test]
  fn duplicate_subchart_names_are_rejected() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Chart.yaml", "name: app\n");
    write(temp.path(), "charts/db-a/Chart.yaml", "name: db\n");
    write(temp.path(), "charts/db-b/Chart.yaml", "name: db\n");

    let err = load_chart(temp.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate sub-chart 'db'"), "{err}");
  }
}
