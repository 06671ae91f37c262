//! Integration tests for chartpeek-lib: whole charts on disk through the
//! full pipeline and over HTTP.

mod common;
mod http_tests;
mod pipeline_tests;
