//! Test utilities for chartpeek-lib.
//!
//! Builds throwaway chart directories on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A chart tree written into a temporary directory.
pub struct ChartDir {
  _temp: TempDir,
  root: PathBuf,
}

impl ChartDir {
  /// Create a chart named `name` with the given `values.yaml` content.
  pub fn new(name: &str, values: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join(name);
    let dir = Self { _temp: temp, root };
    dir.write("Chart.yaml", &format!("apiVersion: v2\nname: {}\nversion: 0.1.0\n", name));
    dir.write("values.yaml", values);
    dir
  }

  /// Write a file relative to the chart root, creating parent directories.
  pub fn write(&self, relative: &str, content: &str) -> &Self {
    let path = self.root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    self
  }

  /// Add a sub-chart under `charts/<path>` (nested paths like `db/charts/cache` work).
  pub fn subchart(&self, path: &str, values: &str) -> &Self {
    let name = path.rsplit('/').next().unwrap();
    self.write(
      &format!("charts/{}/Chart.yaml", path),
      &format!("name: {}\nversion: 1.0.0\n", name),
    );
    self.write(&format!("charts/{}/values.yaml", path), values)
  }

  pub fn path(&self) -> &Path {
    &self.root
  }
}
