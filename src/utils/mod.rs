//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use url::build_search_url;
