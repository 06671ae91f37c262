mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ChartArgs, ServeArgs, cmd_render, cmd_serve};
use output::{OutputFormat, error_chain, print_error};

/// chartpeek - render a chart and browse the result
#[derive(Parser)]
#[command(name = "chartpeek")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Render a chart and serve the preview over HTTP
  Serve(ServeArgs),

  /// Render a chart once and print the preview
  Render {
    #[command(flatten)]
    chart: ChartArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match &cli.command {
    Commands::Serve(args) => cmd_serve(args),
    Commands::Render { chart, format } => cmd_render(chart, *format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&error_chain(&e));
      ExitCode::FAILURE
    }
  }
}
