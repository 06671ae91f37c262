//! Implementation of the `chartpeek render` command.
//!
//! Renders the chart once and prints the preview document, or the whole
//! `/data` payload with `--format json`.

use anyhow::{Context, Result};

use crate::cmd::ChartArgs;
use crate::output::{OutputFormat, print_json};

pub fn cmd_render(args: &ChartArgs, format: OutputFormat) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let source = rt.block_on(args.load())?;

  let response = source.render(&args.engine()).context("Failed to render chart")?;

  if format.is_json() {
    print_json(&response)?;
  } else {
    print!("{}", response.preview);
  }

  Ok(())
}
