//! Implementation of the `chartpeek serve` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use chartpeek_lib::consts::DEV_HTTP_PORT;
use chartpeek_lib::server::{ServeOptions, serve};

use crate::cmd::ChartArgs;
use crate::output::{print_info, print_stat};

#[derive(Debug, Args)]
pub struct ServeArgs {
  #[command(flatten)]
  pub chart: ChartArgs,

  /// HTTP port (0 picks a free port and opens the browser)
  #[arg(short = 'p', long = "http-port", default_value_t = 0)]
  pub port: u16,

  /// Do not open the browser
  #[arg(long)]
  pub no_browser: bool,

  /// Listen on the fixed port the viewer's dev server talks to
  #[arg(long, hide = true)]
  pub dev_port: bool,
}

impl ServeArgs {
  fn options(&self) -> ServeOptions {
    ServeOptions {
      port: if self.dev_port { DEV_HTTP_PORT } else { self.port },
      open_browser: !self.no_browser,
    }
  }
}

pub fn cmd_serve(args: &ServeArgs) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  rt.block_on(async {
    let source = args.chart.load().await?;

    print_info(&format!("Serving chart {}", source.chart.name()));
    print_stat("Release", &format!("{} ({})", source.release.name, source.release.namespace));
    if !source.overlay_names.is_empty() {
      print_stat("Values", &source.overlay_names.join(", "));
    }

    serve(Arc::new(source), Arc::new(args.chart.engine()), args.options())
      .await
      .context("Server failed")
  })
}
