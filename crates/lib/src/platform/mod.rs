//! Platform helpers.
//!
//! Only what the server needs to hand the viewer URL to the user's browser.

pub mod browser;
pub mod os;

pub use browser::open_url;
pub use os::{Os, is_wsl};
