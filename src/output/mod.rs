//! Output rendering: source links, issue URLs, text and JSON.
//!
//! Replaces the web front-end with terminal and JSON renderers; link
//! classification and the issue URL are shared by both.

pub mod issue;
pub mod json;
pub mod links;
pub mod text;

// Re-export main functions
pub use json::{to_json, write_json};
pub use links::{LinkResolver, LinkRule};
pub use text::render_text;
