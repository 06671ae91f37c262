//! Unpacking packaged (`.tgz`) charts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use crate::consts::CHART_FILE;

/// Unpack a gzipped chart archive into `dest` and return the chart root.
///
/// Packaged charts contain a single top-level directory named after the chart;
/// the first top-level directory holding a `Chart.yaml` is returned.
pub fn unpack_chart(bytes: &[u8], dest: &Path) -> io::Result<PathBuf> {
  let mut archive = Archive::new(GzDecoder::new(bytes));
  archive.unpack(dest)?;

  let mut dirs: Vec<PathBuf> = fs::read_dir(dest)?
    .filter_map(Result::ok)
    .map(|entry| entry.path())
    .filter(|path| path.is_dir())
    .collect();
  dirs.sort();

  let root = dirs
    .into_iter()
    .find(|dir| dir.join(CHART_FILE).is_file())
    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("archive contains no {}", CHART_FILE)))?;

  debug!(path = %root.display(), "unpacked chart archive");
  Ok(root)
}
