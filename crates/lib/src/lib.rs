//! chartpeek-lib: render a chart and assemble a browsable preview.
//!
//! The crate is organised along the rendering pipeline:
//! - `values`: overlay loading, deep merge and the values tree seen by templates
//! - `chart`: the chart tree, its on-disk loader and dependency processing
//! - `render`: the template engine, display-path resolution and preview formatting
//! - `assemble`: the `/data` payload built from all of the above
//! - `server`: the HTTP front door serving the payload and the bundled viewer
//! - `repo`: fetching charts from a remote chart repository
//! - `platform`: handing the viewer URL to the user's browser

pub mod assemble;
pub mod chart;
pub mod consts;
pub mod platform;
pub mod render;
pub mod repo;
pub mod server;
pub mod util;
pub mod values;
