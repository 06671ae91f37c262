//! The values tree seen by templates.
//!
//! Templates do not see the effective configuration directly. It is first
//! coalesced with the chart's own defaults (recursively, one scope per
//! sub-chart, with `global` values pushed down to every sub-chart) and then
//! wrapped together with release, chart and capability information:
//!
//! ```text
//! Values:        coalesced configuration
//! Release:       Name, Namespace, Revision, IsInstall, IsUpgrade, Service
//! Chart:         metadata of the root chart
//! Capabilities:  KubeVersion
//! ```

use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

use super::{Values, kind_of, merge};
use crate::chart::Chart;
use crate::consts::{DEFAULT_NAMESPACE, GLOBAL_KEY, KUBE_VERSION};

/// Errors that can occur while building the render values.
#[derive(Debug, Error)]
pub enum ValuesError {
  /// A sub-chart's scope holds something other than a mapping.
  #[error("values for sub-chart '{chart}' must be a mapping, found {found}")]
  SubchartNotMapping { chart: String, found: &'static str },

  /// The `global` key holds something other than a mapping.
  #[error("global values in chart '{chart}' must be a mapping, found {found}")]
  GlobalNotMapping { chart: String, found: &'static str },

  /// A release or capability object could not be converted to YAML.
  #[error("failed to convert {what} to values: {source}")]
  Convert {
    what: &'static str,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Release information exposed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseOptions {
  pub name: String,
  pub namespace: String,
  pub revision: u32,
  pub is_upgrade: bool,
  pub is_install: bool,
}

impl ReleaseOptions {
  /// Options for a first revision, installing unless `is_upgrade` is set.
  pub fn new(name: impl Into<String>, namespace: impl Into<String>, is_upgrade: bool) -> Self {
    Self {
      name: name.into(),
      namespace: namespace.into(),
      revision: 1,
      is_upgrade,
      is_install: !is_upgrade,
    }
  }
}

impl Default for ReleaseOptions {
  fn default() -> Self {
    Self::new("", DEFAULT_NAMESPACE, false)
  }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReleaseObject<'a> {
  #[serde(flatten)]
  options: &'a ReleaseOptions,
  service: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Capabilities {
  kube_version: KubeVersion,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct KubeVersion {
  version: &'static str,
  major: String,
  minor: String,
}

impl Capabilities {
  fn current() -> Self {
    let mut parts = KUBE_VERSION.trim_start_matches('v').split('.');
    Self {
      kube_version: KubeVersion {
        version: KUBE_VERSION,
        major: parts.next().unwrap_or_default().to_string(),
        minor: parts.next().unwrap_or_default().to_string(),
      },
    }
  }
}

/// Coalesce a chart's default values under the user configuration.
///
/// User values win over defaults. A key explicitly set to `null` by the user
/// removes the chart default. Each sub-chart gets the mapping stored under its
/// name, coalesced with its own defaults, and inherits the parent's `global`
/// values (parent wins over the sub-chart's own globals).
pub fn coalesce_values(chart: &Chart, user: &Values) -> Result<Values, ValuesError> {
  let mut values = coalesce_tables(&chart.values, user);

  let globals = scoped_table(&values, GLOBAL_KEY).map_err(|found| ValuesError::GlobalNotMapping {
    chart: chart.full_path(),
    found,
  })?;

  for dep in chart.dependencies() {
    let mut scoped = scoped_table(&values, dep.name()).map_err(|found| ValuesError::SubchartNotMapping {
      chart: dep.full_path(),
      found,
    })?;

    if !globals.is_empty() {
      let own = scoped_table(&scoped, GLOBAL_KEY).map_err(|found| ValuesError::GlobalNotMapping {
        chart: dep.full_path(),
        found,
      })?;
      scoped.insert(GLOBAL_KEY.into(), Value::Mapping(merge(&own, &globals)));
    }

    let coalesced = coalesce_values(dep, &scoped)?;
    values.insert(dep.name().into(), Value::Mapping(coalesced));
  }

  Ok(values)
}

/// Build the full values tree handed to the template engine.
pub fn to_render_values(chart: &Chart, values: &Values, options: &ReleaseOptions) -> Result<Values, ValuesError> {
  let release = ReleaseObject {
    options,
    service: "Helm",
  };

  let mut top = Values::new();
  top.insert("Capabilities".into(), convert("capabilities", &Capabilities::current())?);
  top.insert("Chart".into(), chart.metadata.to_template_object());
  top.insert("Release".into(), convert("release options", &release)?);
  top.insert("Values".into(), Value::Mapping(coalesce_values(chart, values)?));
  Ok(top)
}

fn convert<T: Serialize>(what: &'static str, value: &T) -> Result<Value, ValuesError> {
  serde_yaml::to_value(value).map_err(|source| ValuesError::Convert { what, source })
}

fn coalesce_tables(defaults: &Values, user: &Values) -> Values {
  let mut out = defaults.clone();

  for (key, value) in user {
    match (out.get(key), value) {
      (_, Value::Null) => {
        out.remove(key);
      }
      (Some(Value::Mapping(default_map)), Value::Mapping(user_map)) => {
        let coalesced = coalesce_tables(default_map, user_map);
        out.insert(key.clone(), Value::Mapping(coalesced));
      }
      _ => {
        out.insert(key.clone(), value.clone());
      }
    }
  }

  out
}

fn scoped_table(values: &Values, key: &str) -> Result<Values, &'static str> {
  match values.get(key) {
    None | Some(Value::Null) => Ok(Values::new()),
    Some(Value::Mapping(m)) => Ok(m.clone()),
    Some(other) => Err(kind_of(other)),
  }
}
