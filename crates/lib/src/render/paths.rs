//! Display paths for every template in a chart tree.
//!
//! The walk is pre-order: a chart's own templates in declaration order, then
//! each sub-chart (and its sub-charts) in the order they appear on the chart.
//! The display path is the chain of chart names below the root joined by `/`,
//! followed by the template name without its `templates/` prefix:
//!
//! ```text
//! app/templates/pod.yaml                          -> pod.yaml
//! app/charts/db/templates/secret.yaml             -> db/secret.yaml
//! app/charts/db/charts/cache/templates/svc.yaml   -> db/cache/svc.yaml
//! ```

use std::slice;

use crate::chart::{Chart, Template};

/// A template located in the chart tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
  /// Template identifier used by the engine as its output key.
  pub full_path: String,
  /// Names of the owning chart and its ancestors below the root, parent first.
  pub path: Vec<String>,
  /// Name relative to the owning chart's template directory.
  pub filename: String,
}

impl ChartFile {
  pub fn display_path(&self) -> String {
    if self.path.is_empty() {
      self.filename.clone()
    } else {
      format!("{}/{}", self.path.join("/"), self.filename)
    }
  }
}

/// Iterator over every template of a chart tree. See [`resolve_paths`].
#[derive(Debug, Clone)]
pub struct ChartFiles<'a> {
  stack: Vec<Visit<'a>>,
}

#[derive(Debug, Clone)]
struct Visit<'a> {
  chart: &'a Chart,
  path: Vec<String>,
  base: String,
  templates: slice::Iter<'a, Template>,
}

impl<'a> Visit<'a> {
  fn new(chart: &'a Chart, path: Vec<String>) -> Self {
    Self {
      chart,
      path,
      base: chart.full_path(),
      templates: chart.templates.iter(),
    }
  }
}

impl Iterator for ChartFiles<'_> {
  type Item = ChartFile;

  fn next(&mut self) -> Option<ChartFile> {
    loop {
      let visit = self.stack.last_mut()?;
      if let Some(template) = visit.templates.next() {
        return Some(ChartFile {
          full_path: format!("{}/{}", visit.base, template.name),
          path: visit.path.clone(),
          filename: template.display_name().to_string(),
        });
      }

      let done = self.stack.pop()?;
      for dep in done.chart.dependencies().iter().rev() {
        let mut path = done.path.clone();
        path.push(dep.name().to_string());
        self.stack.push(Visit::new(dep, path));
      }
    }
  }
}

/// Walk the chart tree, yielding every template with its display path.
///
/// Each call starts a fresh walk; the iterator can also be cloned to restart
/// from its current position.
pub fn resolve_paths(root: &Chart) -> ChartFiles<'_> {
  ChartFiles {
    stack: vec![Visit::new(root, Vec::new())],
  }
}
