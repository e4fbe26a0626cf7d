//! Utility functions and helpers.

pub mod html;
pub mod http;

pub use html::{escape_html, unescape_html};
