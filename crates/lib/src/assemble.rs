//! Render data assembly.
//!
//! Runs the whole pipeline for one request and packages the result as the
//! payload served on `/data`:
//!
//! 1. merge overlays into the effective configuration
//! 2. process chart dependencies against it
//! 3. build the values tree seen by templates
//! 4. render every template
//! 5. resolve display paths and format the preview
//! 6. render metadata, release options and values as YAML for display
//!
//! Any failure aborts the whole render; there is no partial preview.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::chart::{Chart, ChartLoadError, DependencyError, load_chart, process_dependencies};
use crate::render::{PreviewFile, RenderEngineError, TemplateEngine, format_preview, render_document, resolve_paths};
use crate::util::yaml::to_display_yaml;
use crate::values::{
  OverlayError, ReleaseOptions, Values, ValuesError, display_overlay_name, load_overlays, merge_all,
  to_render_values,
};

/// Errors that abort a render.
#[derive(Debug, Error)]
pub enum RenderError {
  /// An overlay file could not be loaded.
  #[error(transparent)]
  Overlay(#[from] OverlayError),

  /// The chart could not be loaded.
  #[error("error loading chart: {0}")]
  ChartLoad(#[from] ChartLoadError),

  /// Dependency processing failed.
  #[error("error processing dependencies: {0}")]
  Dependency(#[from] DependencyError),

  /// The values tree could not be built.
  #[error("error building render values: {0}")]
  Values(#[from] ValuesError),

  /// The template engine failed.
  #[error("cannot render template using engine: {0}")]
  RenderEngine(#[from] RenderEngineError),

  /// A display section could not be serialized.
  #[error("failed to serialize {what}: {source}")]
  Serialize {
    what: &'static str,
    #[source]
    source: serde_yaml::Error,
  },
}

/// The payload served on `/data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
  /// Chart metadata, optionally followed by `value_files` / `chart_versions` blocks.
  pub chart: String,
  pub release: String,
  /// The effective configuration, before chart defaults are applied.
  pub values: String,
  /// The `Values` tree as templates see it.
  pub full_values: String,
  /// Everything templates see: `Values`, `Release`, `Chart`, `Capabilities`.
  pub render_values: String,
  /// All previews concatenated into one document.
  pub preview: String,
  pub preview_files: Vec<PreviewFile>,
}

/// Render `chart` against `overlays` and assemble the response.
///
/// The chart itself is left untouched; dependency processing works on a copy.
pub fn assemble(
  chart: &Chart,
  overlays: &[Values],
  release: &ReleaseOptions,
  engine: &dyn TemplateEngine,
) -> Result<RenderResponse, RenderError> {
  let values = merge_all(overlays);
  info!(chart = %chart.name(), overlays = overlays.len(), "rendering chart");

  let mut processed = chart.clone();
  process_dependencies(&mut processed, &values)?;

  let render_values = to_render_values(&processed, &values, release)?;
  let rendered = engine.render(&processed, &render_values)?;
  debug!(files = rendered.len(), "template engine finished");

  let preview_files = format_preview(&rendered, resolve_paths(&processed));
  let preview = render_document(&preview_files);
  info!(files = preview_files.len(), "preview assembled");

  let full_values = render_values
    .get("Values")
    .cloned()
    .unwrap_or_else(|| Value::Mapping(Values::new()));

  Ok(RenderResponse {
    chart: display("chart metadata", &chart.metadata)?,
    release: display("release options", release)?,
    values: display("values", &values)?,
    full_values: display("full values", &full_values)?,
    render_values: display("render values", &render_values)?,
    preview,
    preview_files,
  })
}

fn display<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<String, RenderError> {
  to_display_yaml(value).map_err(|source| RenderError::Serialize { what, source })
}

/// Everything fixed at process start that a render needs.
///
/// The HTTP front door holds one of these and re-renders from it on every request.
#[derive(Debug, Clone)]
pub struct RenderSource {
  pub chart: Chart,
  pub overlays: Vec<Values>,
  /// Overlay file names as shown in the `value_files` block.
  pub overlay_names: Vec<String>,
  pub release: ReleaseOptions,
  /// Versions available in the repository the chart came from, newest first.
  pub chart_versions: Vec<String>,
}

impl RenderSource {
  pub fn new(chart: Chart, release: ReleaseOptions) -> Self {
    Self {
      chart,
      overlays: Vec::new(),
      overlay_names: Vec::new(),
      release,
      chart_versions: Vec::new(),
    }
  }

  /// Load a chart directory and its overlay files.
  ///
  /// Every overlay is read before anything else happens. An empty release
  /// name defaults to the chart name.
  pub fn load(chart_dir: &Path, overlay_files: &[PathBuf], mut release: ReleaseOptions) -> Result<Self, RenderError> {
    let overlays = load_overlays(overlay_files)?;
    let chart = load_chart(chart_dir)?;

    if release.name.trim().is_empty() {
      release.name = chart.name().to_string();
    }

    let overlay_names = overlay_files
      .iter()
      .map(|file| display_overlay_name(chart_dir, file))
      .collect();

    Ok(Self {
      overlays,
      overlay_names,
      ..Self::new(chart, release)
    })
  }

  pub fn with_overlays(mut self, names: Vec<String>, overlays: Vec<Values>) -> Self {
    self.overlay_names = names;
    self.overlays = overlays;
    self
  }

  pub fn with_chart_versions(mut self, versions: Vec<String>) -> Self {
    self.chart_versions = versions;
    self
  }

  /// Run the whole pipeline from scratch.
  pub fn render(&self, engine: &dyn TemplateEngine) -> Result<RenderResponse, RenderError> {
    let mut response = assemble(&self.chart, &self.overlays, &self.release, engine)?;
    response.chart.push_str(&self.listing());
    Ok(response)
  }

  fn listing(&self) -> String {
    let mut listing = String::new();
    let blocks = [("value_files", &self.overlay_names), ("chart_versions", &self.chart_versions)];
    for (key, items) in blocks {
      if items.is_empty() {
        continue;
      }
      listing.push_str(&format!("\n---\n{}:\n", key));
      for item in items {
        listing.push_str(&format!("- {}\n", item));
      }
    }
    listing
  }
}
