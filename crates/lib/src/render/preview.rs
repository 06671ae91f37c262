//! Ordering and formatting of rendered files.
//!
//! The engine returns its results in no particular order. Previews are always
//! sorted by display path so both the structured list and the concatenated
//! document are byte-for-byte reproducible for the same inputs.
//!
//! # Document format
//!
//! ```text
//! # <display path>
//! <rendered body, newline terminated>
//! ---
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::RenderedFiles;
use super::paths::ChartFile;

const HEADER_PREFIX: &str = "# ";
const SEPARATOR: &str = "---";

/// A rendered file ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewFile {
  pub filename: String,
  pub preview: String,
}

/// Pair rendered bodies with their display paths, dropping empty output.
///
/// Files without rendered output (partials, for instance) are skipped, as are
/// bodies that are empty once whitespace is trimmed. The result is sorted by
/// display path.
pub fn format_preview<I>(rendered: &RenderedFiles, files: I) -> Vec<PreviewFile>
where
  I: IntoIterator<Item = ChartFile>,
{
  let mut entries: Vec<PreviewFile> = files
    .into_iter()
    .filter_map(|file| {
      let Some(body) = rendered.get(&file.full_path) else {
        debug!(template = %file.full_path, "no rendered output for template");
        return None;
      };
      if body.trim().is_empty() {
        debug!(template = %file.full_path, "skipping empty rendered output");
        return None;
      }
      Some(PreviewFile {
        filename: file.display_path(),
        preview: body.clone(),
      })
    })
    .collect();

  entries.sort_by(|a, b| a.filename.cmp(&b.filename));
  entries
}

/// Concatenate previews into a single document.
pub fn render_document(entries: &[PreviewFile]) -> String {
  let mut sorted: Vec<&PreviewFile> = entries.iter().filter(|e| !e.preview.trim().is_empty()).collect();
  sorted.sort_by(|a, b| a.filename.cmp(&b.filename));

  let mut doc = String::new();
  for entry in sorted {
    doc.push_str(HEADER_PREFIX);
    doc.push_str(&entry.filename);
    doc.push('\n');
    doc.push_str(&entry.preview);
    if !entry.preview.ends_with('\n') {
      doc.push('\n');
    }
    doc.push_str(SEPARATOR);
    doc.push('\n');
  }
  doc
}

/// Split a document produced by [`render_document`] back into its entries.
///
/// Entries are emitted sorted by filename, so a separator line only closes an
/// entry when it is the last line or is followed by a header whose filename
/// sorts strictly after the current one. Multi-document bodies and bodies
/// starting a document with a `# ` comment therefore survive.
///
/// A body that contains a `---` line followed by a `# <name>` comment where
/// `<name>` sorts after the entry's own filename is still read as a boundary:
/// such a document is byte-identical to one holding two separate entries.
pub fn split_document(doc: &str) -> Vec<PreviewFile> {
  let lines: Vec<&str> = doc.split_inclusive('\n').collect();
  let mut entries = Vec::new();
  let mut current: Option<PreviewFile> = None;

  for (i, line) in lines.iter().enumerate() {
    let content = line.trim_end_matches('\n');
    match current.as_mut() {
      None => {
        if let Some(filename) = content.strip_prefix(HEADER_PREFIX) {
          current = Some(PreviewFile {
            filename: filename.to_string(),
            preview: String::new(),
          });
        }
      }
      Some(entry) => {
        let closes = content == SEPARATOR
          && lines.get(i + 1).is_none_or(|next| {
            next
              .trim_end_matches('\n')
              .strip_prefix(HEADER_PREFIX)
              .is_some_and(|name| name > entry.filename.as_str())
          });
        if closes {
          entries.extend(current.take());
        } else {
          entry.preview.push_str(line);
        }
      }
    }
  }

  entries
}
