//! Rendering: the template engine and the display-ready preview built from its output.

pub mod engine;
pub mod paths;
pub mod preview;

pub use engine::{JinjaEngine, RenderEngineError, RenderedFiles, TemplateEngine};
pub use paths::{ChartFile, ChartFiles, resolve_paths};
pub use preview::{PreviewFile, format_preview, render_document, split_document};
