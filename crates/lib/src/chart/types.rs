//! Chart tree types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::consts::{CHARTS_DIR, TEMPLATES_DIR};
use crate::values::Values;

/// Contents of a chart's `Chart.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub api_version: String,
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub home: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sources: Vec<String>,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub keywords: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub maintainers: Vec<Maintainer>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub app_version: Option<String>,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub deprecated: bool,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub annotations: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kube_version: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependencies: Vec<Dependency>,
  #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
  pub chart_type: Option<String>,
}

impl ChartMetadata {
  /// The `Chart` object exposed to templates, keyed the way template authors expect
  /// (`Name`, `Version`, `AppVersion`, ...).
  pub fn to_template_object(&self) -> Value {
    let mut object = Values::new();
    object.insert("Name".into(), self.name.as_str().into());
    object.insert("Version".into(), self.version.as_str().into());
    object.insert("ApiVersion".into(), self.api_version.as_str().into());
    let optional = [
      ("AppVersion", &self.app_version),
      ("Description", &self.description),
      ("Home", &self.home),
      ("Type", &self.chart_type),
    ];
    for (key, value) in optional {
      if let Some(value) = value {
        object.insert(key.into(), value.as_str().into());
      }
    }
    if !self.keywords.is_empty() {
      object.insert(
        "Keywords".into(),
        Value::Sequence(self.keywords.iter().map(|k| k.as_str().into()).collect()),
      );
    }
    Value::Mapping(object)
  }
}

/// A chart maintainer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Maintainer {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

/// A sub-chart dependency declared in `Chart.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
  pub name: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub version: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub repository: String,
  /// Comma-separated value paths; the first one holding a boolean decides.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alias: Option<String>,
}

impl Dependency {
  /// Name the sub-chart takes in the tree once processed.
  pub fn effective_name(&self) -> &str {
    self.alias.as_deref().unwrap_or(&self.name)
  }
}

/// A raw template file belonging to one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  /// Path relative to the chart root, e.g. `templates/deployment.yaml`.
  pub name: String,
  pub data: String,
}

impl Template {
  pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      data: data.into(),
    }
  }

  /// File name relative to the chart's template directory.
  pub fn display_name(&self) -> &str {
    self
      .name
      .strip_prefix(TEMPLATES_DIR)
      .and_then(|rest| rest.strip_prefix('/'))
      .unwrap_or(&self.name)
  }

  /// Partials (`_helpers.tpl`) can be included by other templates but are never emitted.
  pub fn is_partial(&self) -> bool {
    self
      .name
      .rsplit('/')
      .next()
      .is_some_and(|base| base.starts_with('_'))
  }
}

/// One chart in the dependency tree.
///
/// Built once by the loader; after dependency processing it is treated as immutable.
#[derive(Debug, Clone, Default)]
pub struct Chart {
  pub metadata: ChartMetadata,
  /// Default values from `values.yaml`.
  pub values: Values,
  pub templates: Vec<Template>,
  dependencies: Vec<Chart>,
  /// Full path of the parent chart; `None` for the root.
  parent: Option<String>,
}

impl Chart {
  pub fn new(metadata: ChartMetadata, values: Values, templates: Vec<Template>) -> Self {
    Self {
      metadata,
      values,
      templates,
      dependencies: Vec::new(),
      parent: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.metadata.name
  }

  /// Full path of the parent chart, if any.
  pub fn parent_path(&self) -> Option<&str> {
    self.parent.as_deref()
  }

  /// Path identifying this chart inside the tree: `app` for the root,
  /// `app/charts/db` for its `db` sub-chart.
  pub fn full_path(&self) -> String {
    match self.parent_path() {
      Some(parent) => format!("{}/{}/{}", parent, CHARTS_DIR, self.name()),
      None => self.name().to_string(),
    }
  }

  /// Key the template engine uses for one of this chart's templates.
  pub fn template_id(&self, template: &Template) -> String {
    format!("{}/{}", self.full_path(), template.name)
  }

  pub fn dependencies(&self) -> &[Chart] {
    &self.dependencies
  }

  /// Attach a sub-chart, linking it (and its own sub-charts) to this chart.
  pub fn add_dependency(&mut self, mut child: Chart) {
    child.link_to(&self.full_path());
    self.dependencies.push(child);
  }

  /// Replace all sub-charts.
  pub fn set_dependencies(&mut self, children: Vec<Chart>) {
    self.dependencies.clear();
    for child in children {
      self.add_dependency(child);
    }
  }

  /// Remove and return all sub-charts; they keep their stale parent link until re-attached.
  pub(crate) fn take_dependencies(&mut self) -> Vec<Chart> {
    std::mem::take(&mut self.dependencies)
  }

  pub(crate) fn dependencies_mut(&mut self) -> &mut [Chart] {
    &mut self.dependencies
  }

  /// Rename the chart (used for dependency aliases).
  pub fn rename(&mut self, name: impl Into<String>) {
    self.metadata.name = name.into();
    self.relink_children();
  }

  /// Total number of templates in this chart and all sub-charts.
  pub fn template_count(&self) -> usize {
    self.templates.len() + self.dependencies.iter().map(Chart::template_count).sum::<usize>()
  }

  fn link_to(&mut self, parent: &str) {
    self.parent = Some(parent.to_string());
    self.relink_children();
  }

  fn relink_children(&mut self) {
    let own = self.full_path();
    for child in &mut self.dependencies {
      child.link_to(&own);
    }
  }
}
