//! CLI output formatting utilities.
//!
//! Colored status messages on the terminal, JSON for machines.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  /// The concatenated preview document
  #[default]
  Text,
  /// The full render payload served on /data
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

/// Join an error and its causes with `: `.
///
/// Causes whose message is already part of the previous one are skipped, as
/// library errors often embed their source in their own message.
pub fn error_chain(error: &anyhow::Error) -> String {
  let mut out = String::new();
  let mut previous = String::new();
  for cause in error.chain() {
    let message = cause.to_string();
    if previous.contains(&message) {
      continue;
    }
    if !out.is_empty() {
      out.push_str(": ");
    }
    out.push_str(&message);
    previous = message;
  }
  out
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
