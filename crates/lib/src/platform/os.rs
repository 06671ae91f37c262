use std::fmt;
use std::fs;

/// Operating systems with a known way of opening a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Whether we are running under the Windows Subsystem for Linux.
///
/// WSL kernels carry "microsoft" in their release string.
pub fn is_wsl() -> bool {
  if Os::current() != Some(Os::Linux) {
    return false;
  }
  fs::read_to_string("/proc/sys/kernel/osrelease")
    .map(|release| is_wsl_release(&release))
    .unwrap_or(false)
}

fn is_wsl_release(release: &str) -> bool {
  release.to_lowercase().contains("microsoft")
}
