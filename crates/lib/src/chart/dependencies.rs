//! Dependency processing.
//!
//! Reconciles the dependencies a chart declares in `Chart.yaml` with the
//! sub-charts actually present under `charts/`:
//! - every declared dependency must be present, and satisfy its version constraint
//! - `condition` and `tags` are evaluated against the values to drop disabled sub-charts
//! - `alias` renames a sub-chart (one copy per alias)
//!
//! Sub-charts present on disk but not declared are always kept.

use semver::{Version, VersionReq};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{Chart, Dependency};
use crate::values::{Values, child_table, lookup, merge};

/// Errors that can occur while processing dependencies.
#[derive(Debug, Error)]
pub enum DependencyError {
  /// A declared dependency has no matching sub-chart.
  #[error("chart '{chart}' declares dependency '{dependency}' but it is missing from the charts directory")]
  Missing { chart: String, dependency: String },

  /// The sub-chart's version does not satisfy the declared constraint.
  #[error("dependency '{dependency}' of chart '{chart}' is version {found}, which does not satisfy '{constraint}'")]
  VersionMismatch {
    chart: String,
    dependency: String,
    constraint: String,
    found: String,
  },

  /// The declared version constraint cannot be parsed.
  #[error("dependency '{dependency}' of chart '{chart}' has an invalid version constraint '{constraint}': {source}")]
  InvalidConstraint {
    chart: String,
    dependency: String,
    constraint: String,
    #[source]
    source: semver::Error,
  },

  /// Two sub-charts end up with the same name.
  #[error("chart '{chart}' has more than one sub-chart named '{name}'")]
  Duplicate { chart: String, name: String },

  /// The values scope of a sub-chart is not a mapping.
  #[error("values for sub-chart '{chart}' must be a mapping")]
  ScopeNotMapping { chart: String },
}

/// Process the declared dependencies of `chart` and, recursively, of its sub-charts.
///
/// `values` is the configuration scoped to this chart; conditions are evaluated
/// against it coalesced over the chart's defaults. Tags are always read from
/// the top-level `tags` table, for sub-charts at any depth.
pub fn process_dependencies(chart: &mut Chart, values: &Values) -> Result<(), DependencyError> {
  let top = merge(&chart.values, values);
  process_scoped(chart, values, &top)
}

fn process_scoped(chart: &mut Chart, values: &Values, top: &Values) -> Result<(), DependencyError> {
  let effective = merge(&chart.values, values);
  let declared = chart.metadata.dependencies.clone();
  let chart_path = chart.full_path();

  let loaded = chart.take_dependencies();
  for dep in &declared {
    let found = loaded
      .iter()
      .find(|c| c.name() == dep.name)
      .ok_or_else(|| DependencyError::Missing {
        chart: chart_path.clone(),
        dependency: dep.name.clone(),
      })?;
    check_version(&chart_path, dep, found)?;
  }

  let mut children: Vec<Chart> = Vec::new();
  for sub in loaded {
    let declarations: Vec<&Dependency> = declared.iter().filter(|d| d.name == sub.name()).collect();
    if declarations.is_empty() {
      children.push(sub);
      continue;
    }

    for dep in declarations {
      if !is_enabled(dep, &effective, top) {
        info!(chart = %chart_path, dependency = %dep.effective_name(), "dependency disabled");
        continue;
      }
      let mut copy = sub.clone();
      if let Some(alias) = &dep.alias {
        debug!(chart = %chart_path, dependency = %dep.name, alias = %alias, "aliasing dependency");
        copy.rename(alias.as_str());
      }
      children.push(copy);
    }
  }

  for (i, child) in children.iter().enumerate() {
    if children[..i].iter().any(|c| c.name() == child.name()) {
      return Err(DependencyError::Duplicate {
        chart: chart_path,
        name: child.name().to_string(),
      });
    }
  }

  chart.set_dependencies(children);

  for child in chart.dependencies_mut() {
    let scoped = child_table(&effective, child.name()).ok_or_else(|| DependencyError::ScopeNotMapping {
      chart: child.full_path(),
    })?;
    process_scoped(child, &scoped, top)?;
  }

  Ok(())
}

fn check_version(chart: &str, dep: &Dependency, found: &Chart) -> Result<(), DependencyError> {
  let constraint = dep.version.trim();
  if constraint.is_empty() || constraint == "*" {
    return Ok(());
  }

  let req = VersionReq::parse(constraint).map_err(|source| DependencyError::InvalidConstraint {
    chart: chart.to_string(),
    dependency: dep.name.clone(),
    constraint: constraint.to_string(),
    source,
  })?;

  let found_version = found.metadata.version.trim().trim_start_matches('v');
  let Ok(version) = Version::parse(found_version) else {
    warn!(
      chart = %chart,
      dependency = %dep.name,
      version = %found.metadata.version,
      "sub-chart version is not semver, skipping constraint check"
    );
    return Ok(());
  };

  if req.matches(&version) {
    Ok(())
  } else {
    Err(DependencyError::VersionMismatch {
      chart: chart.to_string(),
      dependency: dep.name.clone(),
      constraint: constraint.to_string(),
      found: found.metadata.version.clone(),
    })
  }
}

/// A condition wins over tags: the first condition path holding a boolean
/// decides. Otherwise the dependency is enabled when any of its tags is
/// `true` in `top`, or when none of them is explicitly `false`.
fn is_enabled(dep: &Dependency, values: &Values, top: &Values) -> bool {
  if let Some(condition) = &dep.condition {
    for path in condition.split(',').map(str::trim).filter(|p| !p.is_empty()) {
      match lookup(values, path) {
        Some(Value::Bool(enabled)) => return *enabled,
        None | Some(Value::Null) => {}
        Some(_) => warn!(dependency = %dep.name, path = %path, "condition path is not a boolean, ignoring"),
      }
    }
  }

  if dep.tags.is_empty() {
    return true;
  }

  let mut any_true = false;
  let mut any_false = false;
  for tag in &dep.tags {
    match lookup(top, &format!("tags.{}", tag)) {
      Some(Value::Bool(true)) => any_true = true,
      Some(Value::Bool(false)) => any_false = true,
      _ => {}
    }
  }
  any_true || !any_false
}
