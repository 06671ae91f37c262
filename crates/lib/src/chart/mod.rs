//! Charts: the metadata, templates and nested sub-charts a preview is rendered from.
//!
//! A [`Chart`] owns its sub-charts; the upward link from a sub-chart to its
//! parent is kept as the parent's full path so the tree never holds a
//! reference cycle.

pub mod archive;
pub mod dependencies;
pub mod loader;
pub mod types;

pub use dependencies::{DependencyError, process_dependencies};
pub use loader::{ChartLoadError, load_chart};
pub use types::{Chart, ChartMetadata, Dependency, Maintainer, Template};
