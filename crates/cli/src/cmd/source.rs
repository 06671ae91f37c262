//! Chart input flags shared by `chartpeek serve` and `chartpeek render`.
//!
//! Resolves the chart (local directory or repository download), the overlay
//! files and the release options into a [`RenderSource`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::{info, warn};

use chartpeek_lib::assemble::RenderSource;
use chartpeek_lib::consts::{DEFAULT_NAMESPACE, VERSION_LISTING_LIMIT};
use chartpeek_lib::render::JinjaEngine;
use chartpeek_lib::repo::{ChartDownload, ChartRepository};
use chartpeek_lib::values::ReleaseOptions;

#[derive(Debug, Args)]
pub struct ChartArgs {
  /// Folder containing a Chart.yaml file (the chart name when --repo is set)
  pub chart: String,

  /// Extra values file, applied in order (repeatable)
  #[arg(short = 'f', long = "values", value_name = "FILE")]
  pub value_files: Vec<PathBuf>,

  /// Release name (defaults to the chart name)
  #[arg(short, long)]
  pub release: Option<String>,

  /// Release namespace
  #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
  pub namespace: String,

  /// Render as an upgrade instead of an install
  #[arg(long)]
  pub is_upgrade: bool,

  /// Chart repository URL
  #[arg(long, value_name = "URL")]
  pub repo: Option<String>,

  /// Chart version to download (latest when omitted)
  #[arg(long, requires = "repo")]
  pub chart_version: Option<String>,

  /// Fail on undefined template values
  #[arg(long)]
  pub strict: bool,
}

impl ChartArgs {
  pub fn engine(&self) -> JinjaEngine {
    JinjaEngine::new().strict(self.strict)
  }

  fn release_options(&self) -> ReleaseOptions {
    ReleaseOptions::new(self.release.clone().unwrap_or_default(), &self.namespace, self.is_upgrade)
  }

  /// Load everything a render needs.
  ///
  /// A downloaded chart is only kept on disk until it is in memory.
  pub async fn load(&self) -> Result<RenderSource> {
    if self.chart.trim().is_empty() {
      bail!("chart folder is required");
    }

    let Some(repo_url) = &self.repo else {
      return load_dir(Path::new(&self.chart), &self.value_files, self.release_options());
    };

    let version = self.chart_version.as_deref().unwrap_or_default();
    info!(repo = %repo_url, chart = %self.chart, version = %version, "loading chart from repository");

    let repo = ChartRepository::load(repo_url)
      .await
      .with_context(|| format!("Failed to load repository: {}", repo_url))?;
    let chart = repo
      .get_chart(&self.chart, version)
      .with_context(|| format!("Failed to find chart '{}' in {}", self.chart, repo_url))?;
    let download: ChartDownload = repo
      .download(chart)
      .await
      .with_context(|| format!("Failed to download chart '{}'", self.chart))?;

    let versions = match repo.versions(&self.chart, VERSION_LISTING_LIMIT) {
      Ok(versions) => versions.iter().map(|v| v.listing()).collect(),
      Err(e) => {
        warn!(error = %e, "error listing chart versions");
        Vec::new()
      }
    };

    let source = load_dir(download.chart_path(), &self.value_files, self.release_options())?;
    Ok(source.with_chart_versions(versions))
  }
}

fn load_dir(dir: &Path, value_files: &[PathBuf], release: ReleaseOptions) -> Result<RenderSource> {
  // Canonical paths so value files inside the chart show up relative to it.
  let dir = canonical(dir);
  let value_files: Vec<PathBuf> = value_files.iter().map(|file| canonical(file)).collect();

  RenderSource::load(&dir, &value_files, release)
    .with_context(|| format!("Failed to load chart: {}", dir.display()))
}

fn canonical(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
