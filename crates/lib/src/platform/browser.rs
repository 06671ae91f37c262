//! Opening URLs in the user's default browser.

use std::io;
use std::process::{Command, Stdio};

use tracing::debug;

use super::os::{Os, is_wsl};

/// Open `url` in the default browser without waiting for it.
pub fn open_url(url: &str) -> io::Result<()> {
  let os = Os::current().unwrap_or(Os::Linux);
  let (program, args) = browser_command(os, is_wsl(), url);

  Command::new(program)
    .args(&args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .map(drop)
}

/// The launcher for `url` on `os`.
///
/// `start` treats its first quoted argument as a window title, hence the
/// empty string before the URL.
fn browser_command(os: Os, wsl: bool, url: &str) -> (&'static str, Vec<String>) {
  let (program, args): (&'static str, Vec<String>) = match os {
    Os::Windows => ("rundll32", vec!["url.dll,FileProtocolHandler".into(), url.into()]),
    Os::MacOs => ("open", vec![url.into()]),
    Os::Linux if wsl => ("cmd.exe", vec!["/c".into(), "start".into(), String::new(), url.into()]),
    Os::Linux => ("xdg-open", vec![url.into()]),
  };
  debug!(os = %os, wsl, program, ?args, "launching browser");
  (program, args)
}
